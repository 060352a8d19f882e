//! Cancellable one-shot deadlines for Typerace.
//!
//! A race ends when its duration elapses. Rather than running a callback
//! on some timer thread, each deadline is a small Tokio task that sleeps
//! and then posts an [`Expired`] message into the owner's queue. The
//! owner (the coordinator actor) handles that message like any other
//! event, so expiry is serialized with joins, ready signals and
//! disconnects.
//!
//! # Integration
//!
//! The receiver is designed to sit next to the command channel in the
//! owner's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* handle commands */ }
//!         Some(expired) = deadlines_rx.recv() => {
//!             coordinator.deadline_elapsed(expired.key, expired.id);
//!         }
//!     }
//! }
//! ```
//!
//! # Cancellation
//!
//! [`DeadlineHandle::cancel`] aborts the sleeping task. A deadline that
//! already fired may still have its message in flight, so owners must
//! compare [`Expired::id`] against the id they still hold and ignore
//! mismatches. Every deadline gets a fresh id, so a stale message can
//! never be mistaken for a live one.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Ids and messages
// ---------------------------------------------------------------------------

/// Identifies one scheduled deadline. Never reused by a [`Deadlines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeadlineId(u64);

impl DeadlineId {
    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeadlineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deadline-{}", self.0)
    }
}

/// Posted to the owner's queue when a deadline elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expired<K> {
    /// What the deadline was scheduled for (a room code, in practice).
    pub key: K,
    /// Which deadline fired.
    pub id: DeadlineId,
}

/// Receiving end of a [`Deadlines`] queue.
pub type DeadlineReceiver<K> = mpsc::UnboundedReceiver<Expired<K>>;

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// A pending deadline. Stored by the owner next to whatever it guards.
#[derive(Debug)]
pub struct DeadlineHandle {
    id: DeadlineId,
    at: Instant,
    task: AbortHandle,
}

impl DeadlineHandle {
    /// The id the matching [`Expired`] message will carry.
    pub fn id(&self) -> DeadlineId {
        self.id
    }

    /// When the deadline fires (Tokio clock).
    pub fn at(&self) -> Instant {
        self.at
    }

    /// Time left before the deadline fires, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Returns `true` once the timer task has fired or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the timer. Idempotent; a no-op if it already fired.
    pub fn cancel(&self) {
        if !self.task.is_finished() {
            trace!(id = %self.id, "deadline cancelled");
        }
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Schedules deadlines whose expiry is reported on a single queue.
///
/// One `Deadlines` per owner. Requires a Tokio runtime when
/// [`schedule`](Self::schedule) is called.
#[derive(Debug)]
pub struct Deadlines<K> {
    tx: mpsc::UnboundedSender<Expired<K>>,
    next_id: u64,
}

impl<K> Deadlines<K>
where
    K: fmt::Display + Send + 'static,
{
    /// Creates a scheduler and the receiver its expiries arrive on.
    pub fn channel() -> (Self, DeadlineReceiver<K>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, next_id: 1 }, rx)
    }

    /// Arms a deadline that reports `key` after `after` has elapsed.
    ///
    /// If the receiver has been dropped by then, the expiry is discarded.
    pub fn schedule(&mut self, key: K, after: Duration) -> DeadlineHandle {
        let id = DeadlineId(self.next_id);
        self.next_id += 1;

        let at = Instant::now() + after;
        debug!(%id, %key, after_ms = after.as_millis() as u64, "deadline armed");

        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(at).await;
            trace!(%id, %key, "deadline fired");
            let _ = tx.send(Expired { key, id });
        });

        DeadlineHandle {
            id,
            at,
            task: task.abort_handle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_id_display() {
        assert_eq!(DeadlineId(4).to_string(), "deadline-4");
        assert_eq!(DeadlineId(4).into_inner(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_are_never_reused() {
        let (mut deadlines, _rx) = Deadlines::<String>::channel();
        let a = deadlines.schedule("A".into(), Duration::from_secs(1));
        let b = deadlines.schedule("A".into(), Duration::from_secs(1));
        assert_ne!(a.id(), b.id());
    }
}
