//! Error types for the room layer.

use typerace_protocol::RoomCode;

/// Errors that can occur during room operations.
///
/// The `Display` text of the first three variants is the reason string
/// clients see in an `error` event, so it is kept short and free of
/// internal detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("Room not found")]
    RoomNotFound(RoomCode),

    /// Every participant slot is taken.
    #[error("Room is full")]
    RoomFull(RoomCode),

    /// The room has left its lobby (racing or finished).
    #[error("Game already started")]
    RoomAlreadyRacing(RoomCode),

    /// The coordinator task has stopped and can't take commands.
    #[error("coordinator is unavailable")]
    CoordinatorUnavailable,
}

impl RoomError {
    /// The room the error refers to, if any.
    pub fn room(&self) -> Option<&RoomCode> {
        match self {
            Self::RoomNotFound(code) | Self::RoomFull(code) | Self::RoomAlreadyRacing(code) => {
                Some(code)
            }
            Self::CoordinatorUnavailable => None,
        }
    }
}
