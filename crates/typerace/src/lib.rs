//! # Typerace
//!
//! Real-time multiplayer typing races.
//!
//! Clients connect over WebSocket, create or join a room by its code,
//! signal readiness, and race against the clock on a shared passage.
//! When the race duration elapses the server scores every participant
//! and broadcasts the ranking. A small HTTP API serves solo-mode
//! results and the leaderboard.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use typerace::prelude::*;
//!
//! # async fn run() -> Result<(), TyperaceError> {
//! let server = TyperaceServer::builder()
//!     .ws_addr("0.0.0.0:5000")
//!     .http_addr("0.0.0.0:5001")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
pub mod http;
pub mod logging;
mod server;

pub use error::TyperaceError;
pub use server::{ServerConfig, TyperaceServer, TyperaceServerBuilder};

pub use typerace_protocol as protocol;
pub use typerace_room as room;
pub use typerace_solo as solo;
pub use typerace_transport as transport;

/// Re-exports everything a server binary or embedding needs.
pub mod prelude {
    pub use crate::logging::setup_logger;
    pub use crate::{ServerConfig, TyperaceError, TyperaceServer, TyperaceServerBuilder};

    pub use typerace_protocol::{
        ClientEvent, Codec, JsonCodec, Phase, RaceResult, RoomCode, RoomSnapshot, ServerEvent,
    };
    pub use typerace_room::{Corpus, RaceConfig, RoomError};
    pub use typerace_solo::{InMemorySoloStore, SoloError, SoloResult, SoloStore};
}
