//! Command definitions
//!
//! Command ids consumed by this client.

use crate::error::ProtocolError;

/// OpenRGB SDK command ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandId {
    RequestControllerCount = 0,
    RequestControllerData = 1,
    RequestProtocolVersion = 40,
    SetClientName = 50,
    ResizeZone = 1000,
    UpdateLeds = 1101,
    UpdateMode = 1102,
}

impl CommandId {
    /// Wire value of the command
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Whether the server answers this command with a packet
    pub fn expects_response(self) -> bool {
        matches!(
            self,
            CommandId::RequestControllerCount
                | CommandId::RequestControllerData
                | CommandId::RequestProtocolVersion
        )
    }
}

impl TryFrom<u32> for CommandId {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CommandId::RequestControllerCount),
            1 => Ok(CommandId::RequestControllerData),
            40 => Ok(CommandId::RequestProtocolVersion),
            50 => Ok(CommandId::SetClientName),
            1000 => Ok(CommandId::ResizeZone),
            1101 => Ok(CommandId::UpdateLeds),
            1102 => Ok(CommandId::UpdateMode),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }
}
