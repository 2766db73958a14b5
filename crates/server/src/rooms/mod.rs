//! Room management for active sessions.
//!
//! This module owns the mapping from room code to room, pairs joiners
//! with creators, relays opaque events between the two seats, and tears
//! rooms down on close or connection loss.

mod code;
mod errors;
mod room;

pub use errors::RoomError;
pub use room::{Participant, Room, RoomState};

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use gambit_protocol::{RoomId, RoomSnapshot, ServerMessage};

/// Default ceiling on simultaneously active rooms.
pub const DEFAULT_MAX_ROOMS: usize = 1024;

/// Owns all active rooms and the connection-to-room index.
///
/// All mutation happens under one write lock, which serializes
/// `create_room`/`join_room`/membership changes: two simultaneous joins
/// on the same room cannot both succeed. Room count stays small, so a
/// registry-wide lock is sufficient. Rooms never interact with each
/// other; there is no cross-room ordering to protect.
pub struct RoomRegistry {
    inner: RwLock<RegistryInner>,
    max_rooms: usize,
}

struct RegistryInner {
    /// Active rooms by code. A terminated room is removed immediately,
    /// which releases its code for reuse.
    rooms: HashMap<RoomId, Room>,
    /// Maps each connection to the one room it occupies. Keying by
    /// connection guarantees at most one active room per connection and
    /// makes disconnect teardown idempotent: the first signal removes
    /// the entry, later signals find nothing.
    connections: HashMap<Uuid, RoomId>,
}

impl RoomRegistry {
    pub fn new(max_rooms: usize) -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                rooms: HashMap::new(),
                connections: HashMap::new(),
            }),
            max_rooms,
        }
    }

    /// Create a room with the caller as the `First` seat.
    ///
    /// Returns immediately with the fresh code; the creator waits for
    /// an `OpponentJoined` notification, never inside this call. A
    /// connection already occupying a room leaves it first, with the
    /// same notify-and-terminate effect as a disconnect.
    pub async fn create_room(
        &self,
        connection_id: Uuid,
        display_name: String,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<RoomId, RoomError> {
        let mut inner = self.inner.write().await;

        detach_connection(&mut inner, connection_id);

        if inner.rooms.len() >= self.max_rooms {
            return Err(RoomError::CapacityExceeded);
        }

        let mut rng = rand::thread_rng();
        let room_id = loop {
            let candidate = code::generate(&mut rng);
            if !inner.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let room = Room::new(room_id.clone(), connection_id, display_name.clone(), sender);
        inner.connections.insert(connection_id, room_id.clone());
        inner.rooms.insert(room_id.clone(), room);

        tracing::info!(
            room_id = %room_id,
            connection_id = %connection_id,
            display_name = %display_name,
            "Room created"
        );
        Ok(room_id)
    }

    /// Join an existing room as the `Second` seat.
    ///
    /// On success the creator is notified with the updated roster and
    /// the joiner gets the same roster back as a snapshot. Exactly one
    /// of two simultaneous joins succeeds; the loser sees `RoomFull`.
    pub async fn join_room(
        &self,
        room_id: &RoomId,
        connection_id: Uuid,
        display_name: String,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<RoomSnapshot, RoomError> {
        let mut inner = self.inner.write().await;

        detach_connection(&mut inner, connection_id);

        let room = inner
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;

        room.add_joiner(connection_id, display_name.clone(), sender)?;
        let roster = room.roster();

        if let Some(creator) = room.other_participant(connection_id) {
            creator.send(ServerMessage::OpponentJoined {
                room_id: room_id.clone(),
                participants: roster.clone(),
            });
        }

        inner.connections.insert(connection_id, room_id.clone());

        tracing::info!(
            room_id = %room_id,
            connection_id = %connection_id,
            display_name = %display_name,
            "Participant joined room"
        );

        Ok(RoomSnapshot {
            room_id: room_id.clone(),
            participants: roster,
        })
    }

    /// Start the game. Only the `First` seat may start, and only once
    /// both seats are filled; a repeated start is a silent no-op. On the
    /// actual transition both seats receive `StartedGame`.
    pub async fn start_game(
        &self,
        room_id: &RoomId,
        connection_id: Uuid,
    ) -> Result<(), RoomError> {
        let mut inner = self.inner.write().await;

        let room = inner
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;

        // Non-members get the same answer as an unknown code.
        if room.participant(connection_id).is_none() {
            return Err(RoomError::RoomNotFound(room_id.clone()));
        }

        if room.start(connection_id)? {
            room.broadcast(&ServerMessage::StartedGame {
                room_id: room_id.clone(),
            });
            tracing::info!(room_id = %room_id, "Game started");
        }
        Ok(())
    }

    /// Relay an opaque game event to the other seat.
    ///
    /// Fire-and-forget: no acknowledgement is awaited, and channel loss
    /// surfaces through `connection_lost`, not here. Events outside
    /// `InProgress` are rejected, not queued. Per-sender order is
    /// preserved by the caller's sequential read loop.
    pub async fn relay_move(
        &self,
        room_id: &RoomId,
        connection_id: Uuid,
        payload: serde_json::Value,
        seq: u64,
    ) -> Result<(), RoomError> {
        let inner = self.inner.read().await;
        let (room, _sender) = relay_target(&inner, room_id, connection_id)?;

        if let Some(opponent) = room.other_participant(connection_id) {
            opponent.send(ServerMessage::Move {
                room_id: room_id.clone(),
                payload,
                seq,
            });
        }
        Ok(())
    }

    /// Relay a chat line to the other seat.
    ///
    /// Same delivery guarantee as moves, on its own logical stream:
    /// chat and move ordering are independent of each other.
    pub async fn relay_chat(
        &self,
        room_id: &RoomId,
        connection_id: Uuid,
        text: String,
    ) -> Result<(), RoomError> {
        let inner = self.inner.read().await;
        let (room, sender) = relay_target(&inner, room_id, connection_id)?;
        let sender_name = sender.display_name.clone();

        if let Some(opponent) = room.other_participant(connection_id) {
            opponent.send(ServerMessage::Chat {
                room_id: room_id.clone(),
                sender_name,
                text,
            });
        }
        Ok(())
    }

    /// Close a room. Idempotent: closing an unknown or already-closed
    /// code is a silent no-op, as is a close from a non-member. The
    /// other participant (if any) is notified once and the code is
    /// released.
    pub async fn close_room(&self, room_id: &RoomId, connection_id: Uuid) {
        let mut inner = self.inner.write().await;

        let is_member = inner
            .rooms
            .get(room_id)
            .is_some_and(|room| room.participant(connection_id).is_some());
        if !is_member {
            return;
        }

        // Membership checked above; the room is present.
        let Some(mut room) = inner.rooms.remove(room_id) else {
            return;
        };
        room.terminate();

        for participant in room.participants() {
            inner.connections.remove(&participant.connection_id);
            if participant.connection_id != connection_id {
                participant.send(ServerMessage::RoomClosed {
                    room_id: room_id.clone(),
                });
            }
        }

        tracing::info!(
            room_id = %room_id,
            connection_id = %connection_id,
            "Room closed"
        );
    }

    /// Handle loss of a connection.
    ///
    /// If the connection occupied a room in a non-terminal state, the
    /// remaining participant (if any) is notified exactly once with the
    /// departed display name, the room is terminated, and its code is
    /// released. No reconnection grace period: loss is terminal for the
    /// session. Repeated signals for the same connection are no-ops.
    pub async fn connection_lost(&self, connection_id: Uuid) -> Option<(RoomId, Participant)> {
        let mut inner = self.inner.write().await;
        detach_connection(&mut inner, connection_id)
    }

    /// Number of active rooms (health/diagnostics).
    pub async fn room_count(&self) -> usize {
        self.inner.read().await.rooms.len()
    }

    /// Current state of a room, if it is still active.
    pub async fn room_state(&self, room_id: &RoomId) -> Option<RoomState> {
        self.inner.read().await.rooms.get(room_id).map(Room::state)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROOMS)
    }
}

/// Resolve the room and sender seat for a relay request.
///
/// The claimed sender is validated against the recorded roster, and the
/// room must be `InProgress`; everything else answers `RoomNotFound` so
/// events before start or after termination are rejected, not queued.
fn relay_target<'a>(
    inner: &'a RegistryInner,
    room_id: &RoomId,
    connection_id: Uuid,
) -> Result<(&'a Room, &'a Participant), RoomError> {
    let room = inner
        .rooms
        .get(room_id)
        .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;

    let sender = room
        .participant(connection_id)
        .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;

    if room.state() != RoomState::InProgress {
        return Err(RoomError::RoomNotFound(room_id.clone()));
    }

    Ok((room, sender))
}

/// Remove a connection from whatever room it occupies, driving the
/// notify-and-terminate teardown. Returns the room code and departed
/// participant, or `None` if the connection was not in any room.
fn detach_connection(
    inner: &mut RegistryInner,
    connection_id: Uuid,
) -> Option<(RoomId, Participant)> {
    let room_id = inner.connections.remove(&connection_id)?;
    let mut room = inner.rooms.remove(&room_id)?;

    let departed = room.remove_participant(connection_id)?;

    if !room.is_terminal() {
        room.terminate();
        if let Some(remaining) = room.participants().first() {
            inner.connections.remove(&remaining.connection_id);
            remaining.send(ServerMessage::PlayerDisconnected {
                room_id: room_id.clone(),
                display_name: departed.display_name.clone(),
            });
        }
    }

    tracing::info!(
        room_id = %room_id,
        connection_id = %connection_id,
        display_name = %departed.display_name,
        "Participant left, room released"
    );

    Some((room_id, departed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gambit_protocol::ParticipantRole;

    fn channel() -> (
        mpsc::Sender<ServerMessage>,
        mpsc::Receiver<ServerMessage>,
    ) {
        mpsc::channel(64)
    }

    async fn create(
        registry: &RoomRegistry,
        name: &str,
    ) -> (Uuid, RoomId, mpsc::Receiver<ServerMessage>) {
        let conn = Uuid::new_v4();
        let (tx, rx) = channel();
        let room_id = registry
            .create_room(conn, name.to_string(), tx)
            .await
            .expect("create room");
        (conn, room_id, rx)
    }

    #[tokio::test]
    async fn create_assigns_first_seat_and_waiting_state() {
        let registry = RoomRegistry::default();
        let (_conn, room_id, _rx) = create(&registry, "alice").await;

        assert_eq!(
            registry.room_state(&room_id).await,
            Some(RoomState::WaitingForOpponent)
        );
        assert_eq!(registry.room_count().await, 1);
    }

    #[tokio::test]
    async fn join_fills_second_seat_and_notifies_creator() {
        let registry = RoomRegistry::default();
        let (_creator, room_id, mut creator_rx) = create(&registry, "alice").await;

        let joiner = Uuid::new_v4();
        let (tx, _joiner_rx) = channel();
        let snapshot = registry
            .join_room(&room_id, joiner, "bob".to_string(), tx)
            .await
            .expect("join room");

        assert_eq!(snapshot.participants.len(), 2);
        assert_eq!(snapshot.participants[1].role, ParticipantRole::Second);
        assert_eq!(registry.room_state(&room_id).await, Some(RoomState::Ready));

        match creator_rx.try_recv().expect("creator notified") {
            ServerMessage::OpponentJoined { participants, .. } => {
                assert_eq!(participants[1].display_name, "bob");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn join_unknown_code_fails() {
        let registry = RoomRegistry::default();
        let (tx, _rx) = channel();
        let bogus = RoomId::parse("ZZZZ99").expect("valid code");

        let result = registry
            .join_room(&bogus, Uuid::new_v4(), "bob".to_string(), tx)
            .await;
        assert!(matches!(result, Err(RoomError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn capacity_ceiling_rejects_creates_only() {
        let registry = RoomRegistry::new(1);
        let (_conn, room_id, _rx) = create(&registry, "alice").await;

        let (tx, _rx2) = channel();
        let result = registry
            .create_room(Uuid::new_v4(), "carol".to_string(), tx)
            .await;
        assert!(matches!(result, Err(RoomError::CapacityExceeded)));

        // Joining the existing room is unaffected by the ceiling.
        let (tx, _rx3) = channel();
        assert!(registry
            .join_room(&room_id, Uuid::new_v4(), "bob".to_string(), tx)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn creating_again_leaves_the_previous_room() {
        let registry = RoomRegistry::default();
        let (creator, first_room, _rx) = create(&registry, "alice").await;

        let joiner = Uuid::new_v4();
        let (tx, mut joiner_rx) = channel();
        registry
            .join_room(&first_room, joiner, "bob".to_string(), tx)
            .await
            .expect("join room");

        // Creator opens a fresh room; the old one is torn down and bob
        // is notified as if alice had dropped.
        let (tx, _rx2) = channel();
        let second_room = registry
            .create_room(creator, "alice".to_string(), tx)
            .await
            .expect("create second room");

        assert_ne!(first_room, second_room);
        assert!(registry.room_state(&first_room).await.is_none());
        // Bob's join reply was the snapshot return value, so the
        // disconnect notice is the only message on his channel.
        match joiner_rx.try_recv().expect("bob notified") {
            ServerMessage::PlayerDisconnected { display_name, .. } => {
                assert_eq!(display_name, "alice");
            }
            other => panic!("unexpected message: {other:?}"),
        }
        assert!(joiner_rx.try_recv().is_err(), "exactly one notification");
    }

    #[tokio::test]
    async fn relay_requires_in_progress() {
        let registry = RoomRegistry::default();
        let (creator, room_id, _rx) = create(&registry, "alice").await;

        // Before the opponent arrives: rejected, not queued.
        let result = registry
            .relay_move(&room_id, creator, serde_json::json!({"from": "e2"}), 1)
            .await;
        assert!(matches!(result, Err(RoomError::RoomNotFound(_))));

        let joiner = Uuid::new_v4();
        let (tx, _joiner_rx) = channel();
        registry
            .join_room(&room_id, joiner, "bob".to_string(), tx)
            .await
            .expect("join room");

        // Ready but not started: still rejected.
        let result = registry
            .relay_move(&room_id, creator, serde_json::json!({"from": "e2"}), 1)
            .await;
        assert!(matches!(result, Err(RoomError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn relay_rejects_impostor_senders() {
        let registry = RoomRegistry::default();
        let (creator, room_id, _rx) = create(&registry, "alice").await;
        let joiner = Uuid::new_v4();
        let (tx, _joiner_rx) = channel();
        registry
            .join_room(&room_id, joiner, "bob".to_string(), tx)
            .await
            .expect("join room");
        registry
            .start_game(&room_id, creator)
            .await
            .expect("start");

        let outsider = Uuid::new_v4();
        let result = registry
            .relay_move(&room_id, outsider, serde_json::json!({}), 1)
            .await;
        assert!(matches!(result, Err(RoomError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn close_is_idempotent_and_notifies_peer_once() {
        let registry = RoomRegistry::default();
        let (creator, room_id, _rx) = create(&registry, "alice").await;
        let joiner = Uuid::new_v4();
        let (tx, mut joiner_rx) = channel();
        registry
            .join_room(&room_id, joiner, "bob".to_string(), tx)
            .await
            .expect("join room");

        registry.close_room(&room_id, creator).await;
        registry.close_room(&room_id, creator).await;

        assert!(registry.room_state(&room_id).await.is_none());
        assert_eq!(registry.room_count().await, 0);

        let mut closed = 0;
        while let Ok(msg) = joiner_rx.try_recv() {
            if matches!(msg, ServerMessage::RoomClosed { .. }) {
                closed += 1;
            }
        }
        assert_eq!(closed, 1);
    }

    #[tokio::test]
    async fn close_from_non_member_is_a_silent_no_op() {
        let registry = RoomRegistry::default();
        let (_creator, room_id, _rx) = create(&registry, "alice").await;

        registry.close_room(&room_id, Uuid::new_v4()).await;
        assert!(registry.room_state(&room_id).await.is_some());
    }

    #[tokio::test]
    async fn disconnect_notifies_peer_once_and_is_idempotent() {
        let registry = RoomRegistry::default();
        let (creator, room_id, mut creator_rx) = create(&registry, "alice").await;
        let joiner = Uuid::new_v4();
        let (tx, _joiner_rx) = channel();
        registry
            .join_room(&room_id, joiner, "bob".to_string(), tx)
            .await
            .expect("join room");
        registry
            .start_game(&room_id, creator)
            .await
            .expect("start");

        let first = registry.connection_lost(joiner).await;
        assert!(first.is_some());
        let second = registry.connection_lost(joiner).await;
        assert!(second.is_none());

        assert!(registry.room_state(&room_id).await.is_none());

        let mut disconnects = 0;
        while let Ok(msg) = creator_rx.try_recv() {
            if let ServerMessage::PlayerDisconnected { display_name, .. } = msg {
                assert_eq!(display_name, "bob");
                disconnects += 1;
            }
        }
        assert_eq!(disconnects, 1);
    }

    #[tokio::test]
    async fn room_codes_are_distinct_while_active() {
        let registry = RoomRegistry::default();
        let mut codes = std::collections::HashSet::new();
        let mut receivers = Vec::new();
        for i in 0..32 {
            let (_conn, room_id, rx) = create(&registry, &format!("p{i}")).await;
            receivers.push(rx);
            assert!(codes.insert(room_id));
        }
        assert_eq!(registry.room_count().await, 32);
    }
}
