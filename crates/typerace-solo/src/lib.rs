//! Solo mode for Typerace.
//!
//! A solo player races against the clock alone: they fetch a passage,
//! type it, and submit their numbers. This crate owns what happens to
//! those numbers:
//!
//! 1. **Validation**: a raw [`SoloSubmission`] becomes a [`NewSoloResult`]
//! 2. **Storage**: the [`SoloStore`] trait, with [`InMemorySoloStore`]
//! 3. **Ranking**: the top-N query and the static [`leaderboard`]
//!
//! [`SoloSubmission`]: typerace_protocol::SoloSubmission

mod error;
mod leaderboard;
mod record;
mod store;

pub use error::SoloError;
pub use leaderboard::{LeaderboardEntry, leaderboard};
pub use record::{NewSoloResult, SoloResult};
pub use store::{InMemorySoloStore, SoloStore, TOP_RESULTS, rank_order};
