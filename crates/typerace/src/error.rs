//! Unified error type for the Typerace server.

use typerace_protocol::ProtocolError;
use typerace_room::RoomError;
use typerace_solo::SoloError;
use typerace_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TyperaceError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error. In practice only `CoordinatorUnavailable`
    /// surfaces here; join rejections go to the client instead.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A solo-mode storage or validation error.
    #[error(transparent)]
    Solo(#[from] SoloError),

    /// Binding or serving the HTTP listener failed.
    #[error("http server error: {0}")]
    Http(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use typerace_protocol::RoomCode;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let typerace_err: TyperaceError = err.into();
        assert!(matches!(typerace_err, TyperaceError::Transport(_)));
        assert!(typerace_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let typerace_err: TyperaceError = err.into();
        assert!(matches!(typerace_err, TyperaceError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error_is_transparent() {
        let err = RoomError::RoomFull(RoomCode::from("ABC123"));
        let typerace_err: TyperaceError = err.into();
        assert!(matches!(typerace_err, TyperaceError::Room(_)));
        assert_eq!(typerace_err.to_string(), "Room is full");
    }

    #[test]
    fn test_from_solo_error() {
        let err = SoloError::Storage("disk full".into());
        let typerace_err: TyperaceError = err.into();
        assert!(matches!(typerace_err, TyperaceError::Solo(_)));
    }

    #[test]
    fn test_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
        let typerace_err: TyperaceError = err.into();
        assert!(matches!(typerace_err, TyperaceError::Http(_)));
    }
}
