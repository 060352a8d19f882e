//! Rooms and race sessions for Typerace.
//!
//! All room state is owned by one [`Coordinator`], which runs inside a
//! single actor task. Events for every room are applied one at a time,
//! in arrival order, so a join, a ready signal, a disconnect and a race
//! deadline can never interleave halfway.
//!
//! # Key types
//!
//! - [`Coordinator`]: the race state machine (create, join, ready,
//!   start, progress, end, disconnect)
//! - [`CoordinatorHandle`]: sends commands to the running actor
//! - [`RoomRegistry`]: live rooms keyed by [`RoomCode`]
//! - [`Gateway`]: per-connection outbound event queues
//! - [`Corpus`]: the passages races are run on
//! - [`RaceConfig`]: capacity and race duration

mod actor;
mod config;
mod coordinator;
mod error;
mod gateway;
mod passage;
mod registry;
mod room;
pub mod scoring;

pub use actor::{CoordinatorHandle, CoordinatorStats, spawn_coordinator};
pub use config::RaceConfig;
pub use coordinator::Coordinator;
pub use error::RoomError;
pub use gateway::{ClientReceiver, ClientSender, Gateway};
pub use passage::Corpus;
pub use registry::RoomRegistry;
pub use room::{Participant, ROOM_CODE_LEN, Room, generate_room_code};

pub use typerace_protocol::{Phase, RoomCode};
