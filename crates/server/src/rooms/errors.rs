//! Room error types

use gambit_protocol::{ErrorCode, RoomId};

/// Error types for room operations.
///
/// Request-style failures only. Connection loss is not an error value;
/// it is the asynchronous teardown path (`RoomRegistry::connection_lost`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// Unknown code, already-terminated room, or a room the requester
    /// is not a member of. Also returned for relay attempts outside
    /// `InProgress` so callers cannot probe state they should not see.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("room {0} already has two participants")]
    RoomFull(RoomId),

    #[error("room is not ready to start")]
    NotReady,

    #[error("active room ceiling reached, try again later")]
    CapacityExceeded,
}

impl RoomError {
    /// Wire classification for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::RoomNotFound(_) => ErrorCode::RoomNotFound,
            RoomError::RoomFull(_) => ErrorCode::RoomFull,
            RoomError::NotReady => ErrorCode::NotReady,
            RoomError::CapacityExceeded => ErrorCode::CapacityExceeded,
        }
    }
}
