//! The room model: participants, phase, and the race passage.
//!
//! A [`Room`] only enforces its own invariants (capacity, phase order).
//! It knows nothing about connections' outbound queues or timers; the
//! [`Coordinator`](crate::Coordinator) wires those around it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use typerace_protocol::{ConnectionId, Phase, PlayerSnapshot, RoomCode, RoomSnapshot};

use crate::{RaceConfig, RoomError};

/// Length of a generated room code.
pub const ROOM_CODE_LEN: usize = 6;

const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a random room code: six characters from `A–Z0–9`.
///
/// Uniqueness is the registry's job; this only draws characters.
pub fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..ROOM_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ROOM_CODE_CHARSET.len());
            ROOM_CODE_CHARSET[idx] as char
        })
        .collect();
    RoomCode::new(code)
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// One connection's membership in a room, plus its race progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// The owning connection. The slot is reclaimed when it disconnects.
    pub connection: ConnectionId,
    /// Display name supplied by the client.
    pub name: String,
    pub ready: bool,
    pub typed_text: String,
    pub cursor_index: usize,
    pub error_count: u32,
    /// Reserved for early completion; scoring doesn't look at it.
    pub finished: bool,
}

impl Participant {
    /// A fresh, not-ready participant.
    pub fn new(connection: ConnectionId, name: impl Into<String>) -> Self {
        Self {
            connection,
            name: name.into(),
            ready: false,
            typed_text: String::new(),
            cursor_index: 0,
            error_count: 0,
            finished: false,
        }
    }

    fn reset_progress(&mut self) {
        self.typed_text.clear();
        self.cursor_index = 0;
        self.error_count = 0;
        self.finished = false;
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.connection.to_string(),
            username: self.name.clone(),
            ready: self.ready,
            typed_text: self.typed_text.clone(),
            current_index: self.cursor_index,
            error_count: self.error_count,
            finished: self.finished,
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A race room.
///
/// Participants are kept in join order; the creator is always the first
/// one added. `text` and `duration` never change after creation.
#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    creator: String,
    participants: Vec<Participant>,
    capacity: usize,
    phase: Phase,
    text: String,
    started_at: Option<DateTime<Utc>>,
    duration: Duration,
}

impl Room {
    /// Creates a lobby room with `creator` as its only participant.
    pub fn new(
        code: RoomCode,
        creator: Participant,
        text: impl Into<String>,
        config: &RaceConfig,
    ) -> Self {
        Self {
            code,
            creator: creator.name.clone(),
            participants: vec![creator],
            capacity: config.capacity,
            phase: Phase::Lobby,
            text: text.into(),
            started_at: None,
            duration: config.duration,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The passage chosen at creation.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// When the race started, if it has.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Participants in join order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.capacity
    }

    /// Connections currently in the room, in join order.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.participants.iter().map(|p| p.connection)
    }

    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.participants.iter().any(|p| p.connection == connection)
    }

    pub fn participant(&self, connection: ConnectionId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.connection == connection)
    }

    pub fn participant_mut(&mut self, connection: ConnectionId) -> Option<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.connection == connection)
    }

    /// Returns `true` if the room has participants and all are ready.
    pub fn all_ready(&self) -> bool {
        !self.participants.is_empty() && self.participants.iter().all(|p| p.ready)
    }

    /// Checks whether a new participant could join right now.
    ///
    /// Capacity is checked before phase, so a full racing room reports
    /// [`RoomError::RoomFull`].
    pub fn check_joinable(&self) -> Result<(), RoomError> {
        if self.is_full() {
            return Err(RoomError::RoomFull(self.code.clone()));
        }
        if !self.phase.is_joinable() {
            return Err(RoomError::RoomAlreadyRacing(self.code.clone()));
        }
        Ok(())
    }

    /// Appends a participant. The room is untouched on error.
    pub fn add_participant(&mut self, participant: Participant) -> Result<(), RoomError> {
        self.check_joinable()?;
        self.participants.push(participant);
        Ok(())
    }

    /// Removes every participant owned by `connection`. Returns how many
    /// were removed (at most one unless a connection joined twice).
    pub fn remove_connection(&mut self, connection: ConnectionId) -> usize {
        let before = self.participants.len();
        self.participants.retain(|p| p.connection != connection);
        before - self.participants.len()
    }

    /// Moves Lobby → Racing, clearing all progress. Returns `false`
    /// (and changes nothing) if the room isn't in its lobby.
    pub fn begin_race(&mut self, now: DateTime<Utc>) -> bool {
        if !self.phase.can_transition_to(Phase::Racing) {
            return false;
        }
        self.phase = Phase::Racing;
        self.started_at = Some(now);
        for participant in &mut self.participants {
            participant.reset_progress();
        }
        true
    }

    /// Moves Racing → Finished. Returns `false` if the room isn't racing.
    pub fn finish_race(&mut self) -> bool {
        if !self.phase.can_transition_to(Phase::Finished) {
            return false;
        }
        self.phase = Phase::Finished;
        true
    }

    /// The wire view of this room.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            creator: self.creator.clone(),
            players: self.participants.iter().map(Participant::snapshot).collect(),
            max_players: self.capacity,
            phase: self.phase,
            game_started: self.phase.is_racing(),
            game_text: self.text.clone(),
            start_time: self.started_at.map(|t| t.timestamp_millis()),
            duration: self.duration.as_secs(),
        }
    }
}
