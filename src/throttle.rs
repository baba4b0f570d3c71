//! Update Throttle
//!
//! Bounds the rate of color writes per target.
//!
//! ## Per-target State Machine
//! ```text
//!   Idle ──CAS──► InFlight ──write + cool-down──► Idle
//!                    │
//!                    └── concurrent try_apply ──► Busy (update dropped)
//! ```
//!
//! Losers are never queued and never wait: a burst of calls collapses into
//! roughly one write per cool-down window.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{ChromaError, Result};

/// What a color write is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Device(u32),
    Zone { device: u32, zone: u32 },
}

/// Per-target single-flight gate with a fixed cool-down
///
/// ## Concurrency:
/// - `slots`: held only long enough to find or create a target's flag
/// - Idle -> InFlight is a single `compare_exchange`, so two callers can
///   never both observe Idle
pub struct UpdateThrottle {
    cooldown: Duration,
    slots: Mutex<HashMap<Target, Arc<AtomicBool>>>,
}

impl UpdateThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, target: Target) -> Arc<AtomicBool> {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(target).or_default())
    }

    /// Run `write` unless another write to `target` is in flight
    ///
    /// The winner blocks for the write plus the cool-down; the target is
    /// released afterwards even if `write` fails or panics. Losers get
    /// `ChromaError::Busy` immediately and `write` is not called.
    pub fn try_apply<T>(&self, target: Target, write: impl FnOnce() -> Result<T>) -> Result<T> {
        let slot = self.slot(target);

        if slot
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!("{:?} busy, update dropped", target);
            return Err(ChromaError::Busy);
        }

        let _release = InFlight(&slot);
        let result = write();
        if !self.cooldown.is_zero() {
            thread::sleep(self.cooldown);
        }
        result
    }

    /// Whether a write to `target` is currently in flight
    pub fn is_in_flight(&self, target: Target) -> bool {
        self.slots
            .lock()
            .get(&target)
            .map(|slot| slot.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    /// Forget every idle target (device ids do not outlive a session)
    ///
    /// A write still in flight keeps its slot until it completes.
    pub fn reset(&self) {
        self.slots
            .lock()
            .retain(|_, slot| slot.load(Ordering::Acquire));
    }

    /// Number of targets currently tracked
    pub fn target_count(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

/// Returns the slot to Idle when dropped
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
