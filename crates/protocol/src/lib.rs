//! Gambit Protocol - Shared types for coordinator-client communication
//!
//! This crate contains all types exchanged over the WebSocket connection
//! between the coordinator (server) and the two participants of a room:
//! - Vocabulary types (`RoomId`, `ParticipantRole`, roster DTOs)
//! - WebSocket message types (`ClientMessage`, `ServerMessage`)
//! - Wire error codes
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, and thiserror
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Opaque payloads** - Move/chat payloads are never interpreted here

pub mod messages;
pub mod types;

pub use messages::{ClientMessage, ErrorCode, ServerMessage};
pub use types::{
    ParticipantInfo, ParticipantRole, RoomId, RoomIdError, RoomSnapshot, MAX_DISPLAY_NAME_LEN,
    ROOM_CODE_LEN,
};
