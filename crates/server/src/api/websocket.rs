//! WebSocket handling for participant connections.
//!
//! One connection per participant: an ordered, bidirectional channel.
//! The read loop doubles as the membership monitor — socket close,
//! stream end, or an error all drive the same teardown path.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use gambit_protocol::{
    ClientMessage, ErrorCode, RoomId, ServerMessage, MAX_DISPLAY_NAME_LEN,
};

use super::AppState;
use crate::rooms::RoomError;

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// WebSocket upgrade handler - entry point for new connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Create a unique connection ID for this participant
    let connection_id = Uuid::new_v4();

    // Create a bounded channel for sending messages to this client
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CONNECTION_CHANNEL_BUFFER);

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    // Spawn a task to forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => {
                    if let Some(response) =
                        handle_message(msg, &state, connection_id, &tx).await
                    {
                        if tx.try_send(response).is_err() {
                            tracing::warn!(
                                connection_id = %connection_id,
                                "Failed to send response, channel full or closed"
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        error = %e,
                        "Failed to parse message"
                    );
                    let error = ServerMessage::Error {
                        code: ErrorCode::ParseError,
                        message: format!("Invalid message format: {}", e),
                    };
                    let _ = tx.try_send(error);
                }
            },
            Ok(Message::Ping(_)) => {
                let _ = tx.try_send(ServerMessage::Pong);
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Clean up: loss of the connection is terminal for its room
    if let Some((room_id, participant)) = state.rooms.connection_lost(connection_id).await {
        tracing::info!(
            connection_id = %connection_id,
            room_id = %room_id,
            display_name = %participant.display_name,
            "Disconnected participant removed from room"
        );
    }

    send_task.abort();

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

/// Dispatch a parsed client message to the appropriate registry call.
async fn handle_message(
    msg: ClientMessage,
    state: &AppState,
    connection_id: Uuid,
    sender: &mpsc::Sender<ServerMessage>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Heartbeat => Some(ServerMessage::Pong),

        ClientMessage::CreateRoom { display_name } => {
            let display_name = match validate_display_name(&display_name) {
                Ok(name) => name,
                Err(error) => return Some(error),
            };
            match state
                .rooms
                .create_room(connection_id, display_name, sender.clone())
                .await
            {
                Ok(room_id) => Some(ServerMessage::RoomCreated {
                    room_id,
                    role: gambit_protocol::ParticipantRole::First,
                }),
                Err(e) => Some(room_error(e)),
            }
        }

        ClientMessage::JoinRoom {
            room_id,
            display_name,
        } => {
            let display_name = match validate_display_name(&display_name) {
                Ok(name) => name,
                Err(error) => return Some(error),
            };
            // The code is human-typed; a malformed one gets the same
            // answer as a code that was never issued.
            let Ok(room_id) = RoomId::parse(&room_id) else {
                return Some(ServerMessage::Error {
                    code: ErrorCode::RoomNotFound,
                    message: format!("not a valid room code: {}", room_id),
                });
            };
            match state
                .rooms
                .join_room(&room_id, connection_id, display_name, sender.clone())
                .await
            {
                Ok(snapshot) => Some(ServerMessage::JoinedRoom {
                    room_id: snapshot.room_id,
                    participants: snapshot.participants,
                }),
                Err(e) => Some(room_error(e)),
            }
        }

        ClientMessage::StartGame { room_id } => {
            // Success is announced via the StartedGame broadcast to both seats.
            match state.rooms.start_game(&room_id, connection_id).await {
                Ok(()) => None,
                Err(e) => Some(room_error(e)),
            }
        }

        ClientMessage::Move {
            room_id,
            payload,
            seq,
        } => match state
            .rooms
            .relay_move(&room_id, connection_id, payload, seq)
            .await
        {
            Ok(()) => None,
            Err(e) => Some(room_error(e)),
        },

        ClientMessage::Chat { room_id, text } => {
            match state.rooms.relay_chat(&room_id, connection_id, text).await {
                Ok(()) => None,
                Err(e) => Some(room_error(e)),
            }
        }

        ClientMessage::CloseRoom { room_id } => {
            state.rooms.close_room(&room_id, connection_id).await;
            // Idempotent confirmation; the peer was notified by the registry.
            Some(ServerMessage::RoomClosed { room_id })
        }

        ClientMessage::Unknown => Some(ServerMessage::Error {
            code: ErrorCode::ParseError,
            message: "unrecognized message type".to_string(),
        }),
    }
}

fn room_error(e: RoomError) -> ServerMessage {
    ServerMessage::Error {
        code: e.code(),
        message: e.to_string(),
    }
}

/// Trim and bound a display name; matches the client input limits.
/// The limit counts characters, not bytes, so multibyte names fit.
fn validate_display_name(name: &str) -> Result<String, ServerMessage> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ServerMessage::Error {
            code: ErrorCode::ParseError,
            message: format!(
                "display name must be 1 to {} characters",
                MAX_DISPLAY_NAME_LEN
            ),
        });
    }
    Ok(trimmed.to_string())
}
