//! WebSocket message types for coordinator-client communication
//!
//! These types are used by both sides: the coordinator receives
//! `ClientMessage` and sends `ServerMessage`; clients do the reverse.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Removing variants requires major version bump
//! - Renaming variants is a breaking change
//! - Unknown enum variants deserialize to `Unknown` for forward compatibility

use serde::{Deserialize, Serialize};

use crate::types::{ParticipantInfo, ParticipantRole, RoomId};

// =============================================================================
// Client Messages (Participant → Coordinator)
// =============================================================================

/// Messages from a participant to the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Create a new room; the sender becomes the `First` seat.
    CreateRoom { display_name: String },
    /// Join an existing room by code; the sender becomes the `Second` seat.
    ///
    /// The code is the one field a human types, so it stays a raw string
    /// here and is normalized/validated by the coordinator, which answers
    /// with a tagged error instead of a parse failure.
    JoinRoom {
        room_id: String,
        display_name: String,
    },
    /// Start the game. Only accepted from the `First` seat while the room
    /// is full and not yet started.
    StartGame { room_id: RoomId },
    /// A game event for the opponent. The payload is opaque to the
    /// coordinator; `seq` is the sender's own sequence hint, echoed as-is.
    Move {
        room_id: RoomId,
        payload: serde_json::Value,
        #[serde(default)]
        seq: u64,
    },
    /// A chat line for the opponent. Delivered like a move but on its own
    /// logical stream: chat and move ordering are independent.
    Chat { room_id: RoomId, text: String },
    /// Close the room. Legal from any state; idempotent.
    CloseRoom { room_id: RoomId },
    /// Heartbeat ping.
    Heartbeat,
    /// Unknown message type for forward compatibility.
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Server Messages (Coordinator → Participant)
// =============================================================================

/// Messages from the coordinator to a participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Reply to `CreateRoom`: the code to share with the opponent.
    RoomCreated {
        room_id: RoomId,
        role: ParticipantRole,
    },
    /// Reply to `JoinRoom`: the joiner learns the full roster.
    JoinedRoom {
        room_id: RoomId,
        participants: Vec<ParticipantInfo>,
    },
    /// Sent to the creator when the second seat fills.
    OpponentJoined {
        room_id: RoomId,
        participants: Vec<ParticipantInfo>,
    },
    /// Sent to both seats once the creator starts the game.
    StartedGame { room_id: RoomId },
    /// A relayed game event from the opponent.
    Move {
        room_id: RoomId,
        payload: serde_json::Value,
        seq: u64,
    },
    /// A relayed chat line from the opponent.
    Chat {
        room_id: RoomId,
        sender_name: String,
        text: String,
    },
    /// The room was closed by the other participant (or the coordinator).
    RoomClosed { room_id: RoomId },
    /// The other participant's connection was lost.
    PlayerDisconnected {
        room_id: RoomId,
        display_name: String,
    },
    /// A request failed; `code` classifies the failure.
    Error { code: ErrorCode, message: String },
    /// Heartbeat reply.
    Pong,
    /// Unknown message type for forward compatibility.
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Error Codes
// =============================================================================

/// Wire classification of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No active room has that code (or the room already terminated).
    RoomNotFound,
    /// The room already holds two participants.
    RoomFull,
    /// Start was requested before the second seat filled, or by the
    /// wrong seat.
    NotReady,
    /// The coordinator's room ceiling was reached; retry later.
    CapacityExceeded,
    /// The request was malformed (bad JSON, bad display name).
    ParseError,
    /// Unknown code for forward compatibility.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod serde_tests {
    use super::{ClientMessage, ErrorCode, ServerMessage};
    use crate::types::{ParticipantInfo, ParticipantRole, RoomId};

    fn room_id() -> RoomId {
        RoomId::parse("AB3X9K").expect("valid code")
    }

    #[test]
    fn client_messages_are_internally_tagged() {
        let msg = ClientMessage::CreateRoom {
            display_name: "alice".to_string(),
        };
        let json: serde_json::Value =
            serde_json::to_value(&msg).expect("serialize");
        assert_eq!(json["type"], "CreateRoom");
        assert_eq!(json["display_name"], "alice");
    }

    #[test]
    fn move_seq_defaults_to_zero() {
        let json = r#"{"type":"Move","room_id":"AB3X9K","payload":{"from":"e2","to":"e4"}}"#;
        let decoded: ClientMessage = serde_json::from_str(json).expect("deserialize");
        match decoded {
            ClientMessage::Move { seq, payload, .. } => {
                assert_eq!(seq, 0);
                assert_eq!(payload["from"], "e2");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn join_room_keeps_the_code_raw() {
        let json = r#"{"type":"JoinRoom","room_id":"ab3x9k","display_name":"bob"}"#;
        let decoded: ClientMessage = serde_json::from_str(json).expect("deserialize");
        match decoded {
            ClientMessage::JoinRoom { room_id, .. } => assert_eq!(room_id, "ab3x9k"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn error_codes_serialize_snake_case() {
        let msg = ServerMessage::Error {
            code: ErrorCode::RoomNotFound,
            message: "no such room".to_string(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(json["code"], "room_not_found");
    }

    #[test]
    fn unknown_client_variant_is_tolerated() {
        let json = r#"{"type":"SomeFutureThing","x":1}"#;
        let decoded: ClientMessage = serde_json::from_str(json).expect("deserialize");
        assert!(matches!(decoded, ClientMessage::Unknown));
    }

    #[test]
    fn roster_round_trips() {
        let msg = ServerMessage::JoinedRoom {
            room_id: room_id(),
            participants: vec![
                ParticipantInfo {
                    display_name: "alice".to_string(),
                    role: ParticipantRole::First,
                },
                ParticipantInfo {
                    display_name: "bob".to_string(),
                    role: ParticipantRole::Second,
                },
            ],
        };
        let json = serde_json::to_string(&msg).expect("serialize");
        let decoded: ServerMessage = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(format!("{:?}", decoded), format!("{:?}", msg));
    }
}
