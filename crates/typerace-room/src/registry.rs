//! The room registry: every live room, keyed by code.

use std::collections::HashMap;
use std::fmt;

use typerace_protocol::{ConnectionId, RoomCode};

use crate::room::{Participant, Room, generate_room_code};
use crate::{Corpus, RaceConfig};

/// Source of candidate room codes. Swappable so tests can force
/// collisions.
type CodeSource = Box<dyn FnMut() -> RoomCode + Send>;

/// Owns all live rooms.
///
/// The registry has no locking of its own; it lives inside the
/// coordinator, which is the only thing that touches it.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    corpus: Corpus,
    config: RaceConfig,
    next_code: CodeSource,
}

impl RoomRegistry {
    /// Creates an empty registry. `config` is validated first.
    pub fn new(corpus: Corpus, config: RaceConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            corpus,
            config: config.validated(),
            next_code: Box::new(generate_room_code),
        }
    }

    /// Replaces the room code generator.
    pub fn with_code_source<F>(mut self, source: F) -> Self
    where
        F: FnMut() -> RoomCode + Send + 'static,
    {
        self.next_code = Box::new(source);
        self
    }

    /// The config new rooms are created with.
    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// The passages rooms draw from.
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Creates a lobby room with `creator_name` as its first participant.
    ///
    /// Draws codes until one isn't already live.
    pub fn create(&mut self, creator_name: &str, connection: ConnectionId) -> &Room {
        let code = self.unique_code();
        let creator = Participant::new(connection, creator_name);
        let room = Room::new(code.clone(), creator, self.corpus.pick(), &self.config);

        tracing::info!(room = %code, %connection, creator = creator_name, "room created");
        self.rooms.entry(code).or_insert(room)
    }

    fn unique_code(&mut self) -> RoomCode {
        let mut attempts = 0u32;
        loop {
            let code = (self.next_code)();
            if !self.rooms.contains_key(&code) {
                return code;
            }
            attempts += 1;
            tracing::debug!(room = %code, attempts, "room code collision, retrying");
        }
    }

    /// Returns the room with `code`, if it's live.
    pub fn lookup(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// Mutable variant of [`lookup`](Self::lookup).
    pub fn lookup_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// Removes a room. Idempotent; returns the room if it was live.
    pub fn delete(&mut self, code: &RoomCode) -> Option<Room> {
        let removed = self.rooms.remove(code);
        if removed.is_some() {
            tracing::info!(room = %code, rooms = self.rooms.len(), "room deleted");
        }
        removed
    }

    /// Codes of every live room, in no particular order.
    pub fn codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(Corpus::default(), RaceConfig::default())
    }
}

impl fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("rooms", &self.rooms.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use typerace_protocol::Phase;

    use super::*;

    fn conn(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    #[test]
    fn test_create_room() {
        let mut registry = RoomRegistry::new(Corpus::new(["go"]), RaceConfig::default());
        let room = registry.create("Ann", conn(1));

        assert_eq!(room.phase(), Phase::Lobby);
        assert_eq!(room.text(), "go");
        assert_eq!(room.capacity(), 5);
        assert_eq!(room.duration().as_secs(), 60);
        assert_eq!(room.participants()[0].name, "Ann");
        assert!(!room.participants()[0].ready);

        let code = room.code().clone();
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup(&code).is_some());
    }

    #[test]
    fn test_create_retries_until_code_is_unique() {
        let mut queue: VecDeque<RoomCode> = ["AAAAAA", "AAAAAA", "AAAAAA", "BBBBBB"]
            .into_iter()
            .map(RoomCode::from)
            .collect();
        let mut registry = RoomRegistry::default()
            .with_code_source(move || queue.pop_front().unwrap_or_else(|| "ZZZZZZ".into()));

        let first = registry.create("Ann", conn(1)).code().clone();
        let second = registry.create("Bob", conn(2)).code().clone();

        assert_eq!(first, RoomCode::from("AAAAAA"));
        assert_eq!(second, RoomCode::from("BBBBBB"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lookup_unknown_code() {
        let registry = RoomRegistry::default();
        assert!(registry.lookup(&RoomCode::from("NOPE00")).is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut registry = RoomRegistry::default();
        let code = registry.create("Ann", conn(1)).code().clone();

        assert!(registry.delete(&code).is_some());
        assert!(registry.delete(&code).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_lookup_mut_changes_are_visible() {
        let mut registry = RoomRegistry::default();
        let code = registry.create("Ann", conn(1)).code().clone();

        registry
            .lookup_mut(&code)
            .and_then(|room| room.participant_mut(conn(1)))
            .unwrap()
            .ready = true;

        assert!(registry.lookup(&code).unwrap().all_ready());
    }

    #[test]
    fn test_config_is_validated() {
        let registry = RoomRegistry::new(
            Corpus::default(),
            RaceConfig {
                capacity: 0,
                ..RaceConfig::default()
            },
        );
        assert_eq!(registry.config().capacity, 1);
    }
}
