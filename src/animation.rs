//! Animation runner
//!
//! Drives a frame generator against one device on a dedicated thread.
//! Stopping is cooperative: the loop checks its stop channel once per frame
//! and a write already handed to the sink is never aborted. The thread is
//! always joined, either by [`Animation::stop`] or on drop.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError, Sender};

use crate::client::Client;
use crate::color::RgbColor;
use crate::error::{ChromaError, Result};

/// Produces the LED colors for each frame
pub trait FrameSource: Send + 'static {
    fn next_frame(&mut self, frame: u64) -> Vec<RgbColor>;
}

impl<F> FrameSource for F
where
    F: FnMut(u64) -> Vec<RgbColor> + Send + 'static,
{
    fn next_frame(&mut self, frame: u64) -> Vec<RgbColor> {
        self(frame)
    }
}

/// Where frames are written
pub trait ColorSink: Send + Sync + 'static {
    fn push(&self, device_id: u32, colors: &[RgbColor]) -> Result<()>;
}

impl ColorSink for Client {
    fn push(&self, device_id: u32, colors: &[RgbColor]) -> Result<()> {
        self.set_led_colors(device_id, colors)
    }
}

impl<S: ColorSink> ColorSink for std::sync::Arc<S> {
    fn push(&self, device_id: u32, colors: &[RgbColor]) -> Result<()> {
        (**self).push(device_id, colors)
    }
}

/// Outcome of a finished animation
#[derive(Debug, Default)]
pub struct AnimationReport {
    /// Frames generated
    pub frames: u64,

    /// Frames the sink accepted
    pub applied: u64,

    /// Frames dropped because the target was busy
    pub skipped: u64,

    /// Error that ended the loop early, if any
    pub error: Option<ChromaError>,
}

/// Handle to a running animation
pub struct Animation {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<AnimationReport>>,
}

impl Animation {
    /// Start generating frames every `interval` until stopped
    pub fn start<S, F>(sink: S, device_id: u32, interval: Duration, mut source: F) -> Result<Self>
    where
        S: ColorSink,
        F: FrameSource,
    {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name(format!("animation-{}", device_id))
            .spawn(move || {
                let mut report = AnimationReport::default();
                tracing::debug!("Animation on device {} started", device_id);

                loop {
                    let colors = source.next_frame(report.frames);
                    report.frames += 1;

                    match sink.push(device_id, &colors) {
                        Ok(()) => report.applied += 1,
                        Err(ChromaError::Busy) => report.skipped += 1,
                        Err(e) => {
                            tracing::warn!("Animation on device {} stopped: {}", device_id, e);
                            report.error = Some(e);
                            break;
                        }
                    }

                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                tracing::debug!(
                    "Animation on device {} finished after {} frames",
                    device_id,
                    report.frames
                );
                report
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Whether the frame loop has exited on its own
    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(true)
    }

    /// Signal the loop and wait for it to exit
    pub fn stop(mut self) -> AnimationReport {
        self.shutdown()
    }

    fn shutdown(&mut self) -> AnimationReport {
        if let Some(stop_tx) = self.stop_tx.take() {
            // Loop may already have exited on an error
            let _ = stop_tx.try_send(());
        }

        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(report)) => report,
            Some(Err(_)) => {
                tracing::error!("Animation thread panicked");
                AnimationReport::default()
            }
            None => AnimationReport::default(),
        }
    }
}

impl Drop for Animation {
    fn drop(&mut self) {
        self.shutdown();
    }
}
