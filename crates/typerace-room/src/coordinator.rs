//! The session coordinator: the race state machine.
//!
//! ```text
//!   create_room ──► Lobby ──(everyone ready)──► Racing ──(deadline)──► Finished
//!                     ▲ join / set_ready          │ record_progress
//! ```
//!
//! The [`Coordinator`] owns the registry, the gateway and the map of
//! running races. Every method takes `&mut self` and runs to completion,
//! so each event sees the effects of all earlier ones. In the server it
//! lives inside the coordinator actor (see [`spawn_coordinator`]).
//!
//! [`spawn_coordinator`]: crate::spawn_coordinator

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use typerace_deadline::{DeadlineHandle, DeadlineId, DeadlineReceiver, Deadlines};
use typerace_protocol::{ConnectionId, RoomCode, ServerEvent};
use tracing::{debug, info};

use crate::gateway::{ClientReceiver, Gateway};
use crate::registry::RoomRegistry;
use crate::room::Participant;
use crate::{RoomError, scoring};

mod reconciler;

/// A race in progress: when it started and the deadline that ends it.
#[derive(Debug)]
struct ActiveRace {
    started_at: DateTime<Utc>,
    deadline: DeadlineHandle,
}

/// Owns all room state and applies client events to it.
#[derive(Debug)]
pub struct Coordinator {
    registry: RoomRegistry,
    gateway: Gateway,
    deadlines: Deadlines<RoomCode>,
    races: HashMap<RoomCode, ActiveRace>,
}

impl Coordinator {
    /// Creates a coordinator around `registry`.
    ///
    /// Returns the receiver race deadlines report on. The owner must feed
    /// every message from it back into
    /// [`deadline_elapsed`](Self::deadline_elapsed).
    pub fn new(registry: RoomRegistry) -> (Self, DeadlineReceiver<RoomCode>) {
        let (deadlines, expired) = Deadlines::channel();
        let coordinator = Self {
            registry,
            gateway: Gateway::new(),
            deadlines,
            races: HashMap::new(),
        };
        (coordinator, expired)
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Registers a connection and returns its outbound queue.
    pub fn connect(&mut self, connection: ConnectionId) -> ClientReceiver {
        debug!(%connection, "connection registered");
        self.gateway.register(connection)
    }

    // -----------------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------------

    /// Creates a room with the caller as its first participant and
    /// replies `roomCreated`.
    pub fn create_room(&mut self, connection: ConnectionId, username: &str) -> RoomCode {
        let room = self.registry.create(username, connection);
        let code = room.code().clone();
        self.gateway.to_one(
            connection,
            ServerEvent::RoomCreated {
                room_code: code.clone(),
                room: room.snapshot(),
            },
        );
        code
    }

    /// Adds the caller to a lobby.
    ///
    /// On success the room gets `roomUpdated` and the caller then gets
    /// `roomJoined`. On failure the caller gets an `error` event and the
    /// room is untouched.
    pub fn join(
        &mut self,
        code: &RoomCode,
        username: &str,
        connection: ConnectionId,
    ) -> Result<(), RoomError> {
        let result = self.try_join(code, username, connection);
        if let Err(err) = &result {
            debug!(room = %code, %connection, %err, "join rejected");
            self.gateway
                .to_one(connection, ServerEvent::Error(err.to_string()));
        }
        result
    }

    fn try_join(
        &mut self,
        code: &RoomCode,
        username: &str,
        connection: ConnectionId,
    ) -> Result<(), RoomError> {
        let room = self
            .registry
            .lookup_mut(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        room.add_participant(Participant::new(connection, username))?;

        info!(room = %code, %connection, username, players = room.len(), "player joined");

        let snapshot = room.snapshot();
        self.gateway
            .to_room(room, &ServerEvent::RoomUpdated(snapshot.clone()));
        self.gateway
            .to_one(connection, ServerEvent::RoomJoined(snapshot));
        Ok(())
    }

    /// Marks the caller ready. Starts the race once everyone is.
    ///
    /// Ignored for unknown rooms, rooms past their lobby, and callers
    /// who aren't in the room.
    pub fn set_ready(&mut self, code: &RoomCode, connection: ConnectionId) {
        let Some(room) = self.registry.lookup_mut(code) else {
            debug!(room = %code, %connection, "ready for unknown room ignored");
            return;
        };
        if !room.phase().is_joinable() {
            debug!(room = %code, %connection, phase = %room.phase(), "ready outside lobby ignored");
            return;
        }
        let Some(participant) = room.participant_mut(connection) else {
            debug!(room = %code, %connection, "ready from non-member ignored");
            return;
        };
        participant.ready = true;

        self.gateway
            .to_room(room, &ServerEvent::RoomUpdated(room.snapshot()));

        if room.all_ready() {
            self.start(code);
        }
    }

    // -----------------------------------------------------------------------
    // Race
    // -----------------------------------------------------------------------

    /// Moves a lobby into its race: broadcasts `gameStarted` and arms
    /// the deadline. Returns `false` if the room is missing or not in
    /// its lobby, so a second trigger does nothing.
    pub fn start(&mut self, code: &RoomCode) -> bool {
        let Some(room) = self.registry.lookup_mut(code) else {
            return false;
        };
        let now = Utc::now();
        if !room.begin_race(now) {
            debug!(room = %code, phase = %room.phase(), "start ignored");
            return false;
        }

        let duration = room.duration();
        self.gateway.to_room(
            room,
            &ServerEvent::GameStarted {
                text: room.text().to_string(),
                start_time: now.timestamp_millis(),
                duration: duration.as_secs(),
            },
        );
        info!(room = %code, players = room.len(), duration_secs = duration.as_secs(), "race started");

        let deadline = self.deadlines.schedule(code.clone(), duration);
        let race = ActiveRace {
            started_at: now,
            deadline,
        };
        if let Some(stale) = self.races.insert(code.clone(), race) {
            stale.deadline.cancel();
        }
        true
    }

    /// Stores the caller's progress and relays it to everyone else in
    /// the room. Ignored unless the room is racing and the caller is in
    /// it.
    pub fn record_progress(
        &mut self,
        code: &RoomCode,
        connection: ConnectionId,
        typed_text: String,
        cursor_index: usize,
        error_count: u32,
    ) {
        let Some(room) = self.registry.lookup_mut(code) else {
            debug!(room = %code, %connection, "progress for unknown room ignored");
            return;
        };
        if !room.phase().is_racing() {
            debug!(room = %code, %connection, phase = %room.phase(), "progress outside race ignored");
            return;
        }
        let Some(participant) = room.participant_mut(connection) else {
            debug!(room = %code, %connection, "progress from non-member ignored");
            return;
        };

        participant.typed_text = typed_text;
        participant.cursor_index = cursor_index;
        participant.error_count = error_count;

        let update = ServerEvent::PlayerTypingUpdate {
            player_id: connection.to_string(),
            username: participant.name.clone(),
            typed_text: participant.typed_text.clone(),
            current_index: cursor_index,
        };
        self.gateway.to_room_except(room, connection, &update);
    }

    /// Finishes a race: scores everyone and broadcasts `gameEnded`.
    /// Returns `false` if the room isn't racing.
    pub fn end(&mut self, code: &RoomCode) -> bool {
        let Some(room) = self.registry.lookup_mut(code) else {
            return false;
        };
        if !room.finish_race() {
            debug!(room = %code, phase = %room.phase(), "end ignored");
            return false;
        }
        if let Some(race) = self.races.remove(code) {
            race.deadline.cancel();
        }

        let results = scoring::rank(room.participants(), room.duration().as_secs());
        info!(
            room = %code,
            players = room.len(),
            winner = results.first().map(|r| r.username.as_str()).unwrap_or(""),
            "race ended"
        );
        self.gateway
            .to_room(room, &ServerEvent::GameEnded { results });
        true
    }

    /// Handles a fired deadline. Only ends the race if `id` is the
    /// deadline currently guarding `code`; anything else is stale.
    pub fn deadline_elapsed(&mut self, code: &RoomCode, id: DeadlineId) -> bool {
        let current = self.races.get(code).map(|race| race.deadline.id());
        if current != Some(id) {
            debug!(room = %code, deadline = %id, "stale deadline ignored");
            return false;
        }
        self.end(code)
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// The deadline guarding a running race.
    pub fn race_deadline(&self, code: &RoomCode) -> Option<DeadlineId> {
        self.races.get(code).map(|race| race.deadline.id())
    }

    /// When a running race started.
    pub fn race_started_at(&self, code: &RoomCode) -> Option<DateTime<Utc>> {
        self.races.get(code).map(|race| race.started_at)
    }

    /// Number of races currently running.
    pub fn active_races(&self) -> usize {
        self.races.len()
    }

    fn forget_race(&mut self, code: &RoomCode) {
        if let Some(race) = self.races.remove(code) {
            race.deadline.cancel();
            debug!(room = %code, deadline = %race.deadline.id(), "race deadline cancelled");
        }
    }

    /// Cancels every armed deadline. Called when the actor stops.
    pub fn cancel_all(&mut self) {
        for (_, race) in self.races.drain() {
            race.deadline.cancel();
        }
    }
}
