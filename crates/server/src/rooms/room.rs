//! Room state machine and participant bookkeeping.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use gambit_protocol::{ParticipantInfo, ParticipantRole, RoomId, ServerMessage};

use super::errors::RoomError;

/// One seat of a room.
#[derive(Debug, Clone)]
pub struct Participant {
    pub connection_id: Uuid,
    pub display_name: String,
    /// Immutable once assigned: `First` to the creator, `Second` to the joiner.
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
    /// Channel to this participant's WebSocket send task.
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Participant {
    /// Fire-and-forget delivery. A full or closed channel is logged and
    /// dropped; channel loss surfaces through the disconnect path, never
    /// as a synchronous relay error.
    pub fn send(&self, message: ServerMessage) {
        if let Err(e) = self.sender.try_send(message) {
            tracing::warn!(
                connection_id = %self.connection_id,
                error = %e,
                "Failed to send message to participant"
            );
        }
    }

    fn info(&self) -> ParticipantInfo {
        ParticipantInfo {
            display_name: self.display_name.clone(),
            role: self.role,
        }
    }
}

/// Lifecycle of a room.
///
/// Transitions are monotonic: `WaitingForOpponent → Ready → InProgress →
/// Terminated`, with `Terminated` reachable from any state via close or
/// disconnect. Nothing leaves `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    WaitingForOpponent,
    Ready,
    InProgress,
    Terminated,
}

/// A room pairing at most two participants for one live session.
#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    /// Creation order; the creator (`First`) is always index 0.
    participants: Vec<Participant>,
    state: RoomState,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Create a room holding only its creator, in `WaitingForOpponent`.
    pub fn new(
        id: RoomId,
        connection_id: Uuid,
        display_name: String,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Self {
        let creator = Participant {
            connection_id,
            display_name,
            role: ParticipantRole::First,
            joined_at: Utc::now(),
            sender,
        };
        Self {
            id,
            participants: vec![creator],
            state: RoomState::WaitingForOpponent,
            created_at: Utc::now(),
        }
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() == 2
    }

    pub fn is_terminal(&self) -> bool {
        self.state == RoomState::Terminated
    }

    /// Add the second participant and transition to `Ready`.
    pub fn add_joiner(
        &mut self,
        connection_id: Uuid,
        display_name: String,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<(), RoomError> {
        if self.is_full() {
            return Err(RoomError::RoomFull(self.id.clone()));
        }
        self.participants.push(Participant {
            connection_id,
            display_name,
            role: ParticipantRole::Second,
            joined_at: Utc::now(),
            sender,
        });
        self.state = RoomState::Ready;
        Ok(())
    }

    /// Handle a start request from `requester`.
    ///
    /// Returns `Ok(true)` when this call performed the `Ready →
    /// InProgress` transition, `Ok(false)` for a repeated start (no-op).
    /// Fails `NotReady` before the second seat fills or when the
    /// requester does not hold the `First` seat.
    pub fn start(&mut self, requester: Uuid) -> Result<bool, RoomError> {
        let participant = self
            .participant(requester)
            .ok_or_else(|| RoomError::RoomNotFound(self.id.clone()))?;

        match self.state {
            RoomState::InProgress => Ok(false),
            RoomState::Ready if participant.role == ParticipantRole::First => {
                self.state = RoomState::InProgress;
                Ok(true)
            }
            _ => Err(RoomError::NotReady),
        }
    }

    /// Final transition; safe to call repeatedly.
    pub fn terminate(&mut self) {
        self.state = RoomState::Terminated;
    }

    pub fn participant(&self, connection_id: Uuid) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.connection_id == connection_id)
    }

    /// The other seat, if occupied.
    pub fn other_participant(&self, connection_id: Uuid) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.connection_id != connection_id)
    }

    pub fn remove_participant(&mut self, connection_id: Uuid) -> Option<Participant> {
        let idx = self
            .participants
            .iter()
            .position(|p| p.connection_id == connection_id)?;
        Some(self.participants.remove(idx))
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Public roster for join replies and notifications.
    pub fn roster(&self) -> Vec<ParticipantInfo> {
        self.participants.iter().map(Participant::info).collect()
    }

    /// Send a message to every occupied seat.
    pub fn broadcast(&self, message: &ServerMessage) {
        for participant in &self.participants {
            participant.send(message.clone());
        }
    }
}
