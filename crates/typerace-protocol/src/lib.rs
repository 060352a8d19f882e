//! Wire protocol for Typerace.
//!
//! This crate defines the events clients and the server exchange:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`RoomSnapshot`],
//!   [`RaceResult`], etc.): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those events are
//!   converted to/from frames.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! Every frame is a JSON object `{ "event": <name>, "data": <payload> }`
//! with camelCase field names.
//!
//! ```text
//! Transport (frames) → Protocol (ClientEvent) → Room (coordinator)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, Phase, PlayerSnapshot, RaceResult, RoomCode, RoomSnapshot, ServerEvent,
    SoloSubmission,
};
pub use typerace_transport::ConnectionId;
