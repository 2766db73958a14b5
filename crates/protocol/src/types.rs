//! Vocabulary types shared between coordinator and clients.

use serde::{Deserialize, Serialize};

/// Length of generated room codes.
pub const ROOM_CODE_LEN: usize = 6;

/// Bounds accepted for human-typed room codes. Generated codes are always
/// `ROOM_CODE_LEN`, but parsing is lenient so older/newer coordinators can
/// issue different lengths.
const MIN_CODE_LEN: usize = 4;
const MAX_CODE_LEN: usize = 12;

/// Maximum accepted display name length (matches the client input limit).
pub const MAX_DISPLAY_NAME_LEN: usize = 50;

/// Short, human-enterable room identifier.
///
/// Case-insensitive on input; stored and transmitted in uppercase. Unique
/// among active rooms for the lifetime of the room that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Parse and normalize a room code.
    ///
    /// Trims surrounding whitespace and uppercases. Rejects codes outside
    /// the accepted length bounds or containing non-alphanumeric bytes.
    pub fn parse(code: &str) -> Result<Self, RoomIdError> {
        let normalized = code.trim().to_ascii_uppercase();
        if normalized.len() < MIN_CODE_LEN || normalized.len() > MAX_CODE_LEN {
            return Err(RoomIdError::Length(normalized.len()));
        }
        if !normalized.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(RoomIdError::InvalidCharacter);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for RoomId {
    type Err = RoomIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomId {
    type Error = RoomIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

/// Errors from parsing a room code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomIdError {
    #[error("room code length {0} outside accepted bounds")]
    Length(usize),

    #[error("room code contains non-alphanumeric characters")]
    InvalidCharacter,
}

/// The two seats of a room.
///
/// `First` is the creator's seat, `Second` the joiner's. Game-level meaning
/// (white/black, host/guest) is the client's business; the coordinator only
/// uses roles to tell the two seats apart. Immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    First,
    Second,
}

impl ParticipantRole {
    /// The opposite seat.
    pub fn other(self) -> Self {
        match self {
            ParticipantRole::First => ParticipantRole::Second,
            ParticipantRole::Second => ParticipantRole::First,
        }
    }
}

/// Public information about one room participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub display_name: String,
    pub role: ParticipantRole,
}

/// Snapshot of a room's roster, returned on a successful join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub participants: Vec<ParticipantInfo>,
}
