//! Event and snapshot types for Typerace's wire format.
//!
//! Every type here is serialized to JSON and sent over a WebSocket, so
//! the serde attributes are part of the public contract: field names are
//! camelCase and events are adjacently tagged as
//! `{ "event": "<name>", "data": <payload> }`.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A room's join code, e.g. `"K3Q9ZA"`.
///
/// Serialized as a plain string (`#[serde(transparent)]`). Codes are
/// opaque to the protocol; the room layer decides their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps a raw code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Phase: the room lifecycle
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// Transitions are strictly ordered and never go backwards:
///
/// ```text
/// Lobby → Racing → Finished
/// ```
///
/// - **Lobby**: accepting joins and readiness signals.
/// - **Racing**: the passage is out and the deadline is armed. Only
///   progress messages are accepted.
/// - **Finished**: results have been broadcast. The room lingers until
///   its last participant disconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Lobby,
    Racing,
    Finished,
}

impl Phase {
    /// Returns `true` if the room accepts new participants and ready
    /// signals.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` while a race is running.
    pub fn is_racing(&self) -> bool {
        matches!(self, Self::Racing)
    }

    /// The phase that follows this one, or `None` for the terminal phase.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Lobby => Some(Self::Racing),
            Self::Racing => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if moving to `target` is a legal single step.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Racing => write!(f, "Racing"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One participant as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    /// The owning connection, rendered as a string (`"conn-7"`).
    pub id: String,
    pub username: String,
    pub ready: bool,
    pub typed_text: String,
    pub current_index: usize,
    pub error_count: u32,
    pub finished: bool,
}

/// The full state of a room, sent on create, join, and every membership
/// or readiness change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub creator: String,
    /// Participants in join order.
    pub players: Vec<PlayerSnapshot>,
    pub max_players: usize,
    pub phase: Phase,
    /// `true` exactly while the phase is `Racing`.
    pub game_started: bool,
    pub game_text: String,
    /// Race start as milliseconds since the Unix epoch, once racing.
    pub start_time: Option<i64>,
    /// Race length in seconds.
    pub duration: u64,
}

/// One line of the final ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResult {
    pub username: String,
    pub wpm: u32,
    /// Percentage, rounded. Negative when errors outnumber characters.
    pub accuracy: i64,
    pub error_count: u32,
    pub score: f64,
}

/// A finished solo attempt as submitted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoloSubmission {
    pub username: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub error_count: u32,
    /// Seconds the attempt took.
    pub time_elapsed: f64,
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client can ask of the server.
///
/// Disconnection is not an event: the server infers it from the socket
/// closing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Open a new room with the caller as its first participant.
    CreateRoom { username: String },

    /// Join an existing room in its lobby.
    JoinRoom { room_code: RoomCode, username: String },

    /// Mark the caller ready. When everyone is ready the race starts.
    PlayerReady { room_code: RoomCode },

    /// Live progress during a race.
    TypingProgress {
        room_code: RoomCode,
        typed_text: String,
        current_index: usize,
        error_count: u32,
    },

    /// Ask for a passage to practise alone.
    GetSoloText,

    /// Persist a finished solo attempt.
    SubmitSoloResult(SoloSubmission),
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Everything the server can push to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Reply to `createRoom`.
    RoomCreated { room_code: RoomCode, room: RoomSnapshot },

    /// Reply to a successful `joinRoom`.
    RoomJoined(RoomSnapshot),

    /// Membership or readiness changed.
    RoomUpdated(RoomSnapshot),

    /// A request was rejected. The payload is a human-readable reason.
    Error(String),

    /// The race is on.
    GameStarted {
        text: String,
        /// Milliseconds since the Unix epoch.
        start_time: i64,
        /// Seconds.
        duration: u64,
    },

    /// Another participant's progress (never echoed to its sender).
    PlayerTypingUpdate {
        player_id: String,
        username: String,
        typed_text: String,
        current_index: usize,
    },

    /// Final ranking, best score first.
    GameEnded { results: Vec<RaceResult> },

    /// Reply to `getSoloText`.
    SoloTextReceived { text: String },

    /// Reply to `submitSoloResult`.
    SoloResultSaved {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot() -> RoomSnapshot {
        RoomSnapshot {
            code: RoomCode::from("ABC123"),
            creator: "Ann".into(),
            players: vec![PlayerSnapshot {
                id: "conn-1".into(),
                username: "Ann".into(),
                ready: false,
                typed_text: String::new(),
                current_index: 0,
                error_count: 0,
                finished: false,
            }],
            max_players: 5,
            phase: Phase::Lobby,
            game_started: false,
            game_text: "The quick brown fox".into(),
            start_time: None,
            duration: 60,
        }
    }

    // =====================================================================
    // RoomCode / Phase
    // =====================================================================

    #[test]
    fn test_room_code_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomCode::from("K3Q9ZA")).unwrap();
        assert_eq!(json, "\"K3Q9ZA\"");
        assert_eq!(RoomCode::from("K3Q9ZA").to_string(), "K3Q9ZA");
    }

    #[test]
    fn test_phase_follows_strict_order() {
        assert_eq!(Phase::Lobby.next(), Some(Phase::Racing));
        assert_eq!(Phase::Racing.next(), Some(Phase::Finished));
        assert_eq!(Phase::Finished.next(), None);
    }

    #[test]
    fn test_phase_never_transitions_backwards() {
        assert!(Phase::Lobby.can_transition_to(Phase::Racing));
        assert!(!Phase::Lobby.can_transition_to(Phase::Finished));
        assert!(!Phase::Racing.can_transition_to(Phase::Lobby));
        assert!(!Phase::Finished.can_transition_to(Phase::Lobby));
        assert!(!Phase::Finished.can_transition_to(Phase::Racing));
    }

    #[test]
    fn test_phase_predicates() {
        assert!(Phase::Lobby.is_joinable());
        assert!(!Phase::Racing.is_joinable());
        assert!(!Phase::Finished.is_joinable());
        assert!(Phase::Racing.is_racing());
        assert!(!Phase::Finished.is_racing());
    }

    #[test]
    fn test_phase_serializes_camel_case() {
        assert_eq!(serde_json::to_value(Phase::Racing).unwrap(), json!("racing"));
        assert_eq!(Phase::Finished.to_string(), "Finished");
    }

    // =====================================================================
    // ClientEvent: the shapes browsers send
    // =====================================================================

    #[test]
    fn test_client_event_create_room() {
        let event: ClientEvent =
            serde_json::from_value(json!({"event": "createRoom", "data": {"username": "Ann"}}))
                .unwrap();
        assert_eq!(event, ClientEvent::CreateRoom { username: "Ann".into() });
    }

    #[test]
    fn test_client_event_typing_progress() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "typingProgress",
            "data": {
                "roomCode": "ABC123",
                "typedText": "The qu",
                "currentIndex": 6,
                "errorCount": 1
            }
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::TypingProgress {
                room_code: RoomCode::from("ABC123"),
                typed_text: "The qu".into(),
                current_index: 6,
                error_count: 1,
            }
        );
    }

    #[test]
    fn test_client_event_get_solo_text_needs_no_data() {
        let event: ClientEvent =
            serde_json::from_value(json!({"event": "getSoloText"})).unwrap();
        assert_eq!(event, ClientEvent::GetSoloText);
    }

    #[test]
    fn test_client_event_submit_solo_result() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "submitSoloResult",
            "data": {
                "username": "Ann",
                "wpm": 72,
                "accuracy": 96.5,
                "errorCount": 3,
                "timeElapsed": 41.2
            }
        }))
        .unwrap();
        let ClientEvent::SubmitSoloResult(sub) = event else {
            panic!("expected SubmitSoloResult");
        };
        assert_eq!(sub.username, "Ann");
        assert_eq!(sub.wpm, 72.0);
        assert_eq!(sub.error_count, 3);
    }

    #[test]
    fn test_client_event_unknown_name_is_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_value(json!({"event": "flyToMoon", "data": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_client_event_missing_field_is_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_value(json!({"event": "joinRoom", "data": {"roomCode": "X"}}));
        assert!(result.is_err());
    }

    // =====================================================================
    // ServerEvent: the shapes browsers receive
    // =====================================================================

    #[test]
    fn test_room_created_json_format() {
        let event = ServerEvent::RoomCreated {
            room_code: RoomCode::from("ABC123"),
            room: snapshot(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "roomCreated");
        assert_eq!(json["data"]["roomCode"], "ABC123");
        assert_eq!(json["data"]["room"]["maxPlayers"], 5);
        assert_eq!(json["data"]["room"]["gameStarted"], false);
        assert_eq!(json["data"]["room"]["players"][0]["typedText"], "");
        assert!(json["data"]["room"]["startTime"].is_null());
    }

    #[test]
    fn test_room_updated_carries_snapshot_directly() {
        let json = serde_json::to_value(ServerEvent::RoomUpdated(snapshot())).unwrap();
        assert_eq!(json["event"], "roomUpdated");
        assert_eq!(json["data"]["code"], "ABC123");
        assert_eq!(json["data"]["phase"], "lobby");
    }

    #[test]
    fn test_game_started_json_format() {
        let json = serde_json::to_value(ServerEvent::GameStarted {
            text: "abc".into(),
            start_time: 1_700_000_000_000,
            duration: 60,
        })
        .unwrap();
        assert_eq!(
            json,
            json!({
                "event": "gameStarted",
                "data": {"text": "abc", "startTime": 1_700_000_000_000_i64, "duration": 60}
            })
        );
    }

    #[test]
    fn test_player_typing_update_json_format() {
        let json = serde_json::to_value(ServerEvent::PlayerTypingUpdate {
            player_id: "conn-2".into(),
            username: "Bo".into(),
            typed_text: "The".into(),
            current_index: 3,
        })
        .unwrap();
        assert_eq!(json["data"]["playerId"], "conn-2");
        assert_eq!(json["data"]["currentIndex"], 3);
    }

    #[test]
    fn test_game_ended_json_format() {
        let json = serde_json::to_value(ServerEvent::GameEnded {
            results: vec![RaceResult {
                username: "Ann".into(),
                wpm: 10,
                accuracy: 100,
                error_count: 0,
                score: 10.0,
            }],
        })
        .unwrap();
        assert_eq!(json["event"], "gameEnded");
        assert_eq!(json["data"]["results"][0]["errorCount"], 0);
        assert_eq!(json["data"]["results"][0]["score"], 10.0);
    }

    #[test]
    fn test_solo_result_saved_omits_missing_error() {
        let ok = serde_json::to_value(ServerEvent::SoloResultSaved {
            success: true,
            error: None,
        })
        .unwrap();
        assert_eq!(ok, json!({"event": "soloResultSaved", "data": {"success": true}}));

        let failed = serde_json::to_value(ServerEvent::SoloResultSaved {
            success: false,
            error: Some("Database error".into()),
        })
        .unwrap();
        assert_eq!(failed["data"]["error"], "Database error");
    }
}
