//! Persistence for solo results.
//!
//! The server only needs two things from storage: append a result and
//! read the best ones back. [`SoloStore`] captures exactly that, so a
//! database-backed store can replace [`InMemorySoloStore`] without
//! touching the server.

use std::cmp::Ordering;
use std::future::Future;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::{NewSoloResult, SoloError, SoloResult};

/// How many results the results API returns.
pub const TOP_RESULTS: usize = 20;

/// Stores solo results.
///
/// `Send + Sync + 'static` because one store is shared by every
/// connection handler and the HTTP routes.
///
/// # Example
///
/// ```rust
/// use typerace_solo::{NewSoloResult, SoloError, SoloResult, SoloStore};
///
/// /// Refuses every write; handy for exercising error paths.
/// struct ReadOnlyStore;
///
/// impl SoloStore for ReadOnlyStore {
///     async fn save(&self, _result: NewSoloResult) -> Result<SoloResult, SoloError> {
///         Err(SoloError::Storage("read-only".into()))
///     }
///
///     async fn top(&self, _limit: usize) -> Result<Vec<SoloResult>, SoloError> {
///         Ok(Vec::new())
///     }
/// }
/// ```
pub trait SoloStore: Send + Sync + 'static {
    /// Persists a validated result, stamping it with an id and the
    /// current time.
    fn save(
        &self,
        result: NewSoloResult,
    ) -> impl Future<Output = Result<SoloResult, SoloError>> + Send;

    /// The best `limit` results: highest wpm first, then highest
    /// accuracy, then most recent.
    fn top(&self, limit: usize) -> impl Future<Output = Result<Vec<SoloResult>, SoloError>> + Send;
}

/// Orders results best first: wpm desc, accuracy desc, created_at desc.
pub fn rank_order(a: &SoloResult, b: &SoloResult) -> Ordering {
    b.wpm
        .total_cmp(&a.wpm)
        .then_with(|| b.accuracy.total_cmp(&a.accuracy))
        .then_with(|| b.created_at.cmp(&a.created_at))
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Inner {
    results: Vec<SoloResult>,
    next_id: u64,
}

/// A [`SoloStore`] that keeps everything in process memory.
///
/// Results are lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySoloStore {
    inner: Mutex<Inner>,
}

impl InMemorySoloStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored results.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.results.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl SoloStore for InMemorySoloStore {
    async fn save(&self, result: NewSoloResult) -> Result<SoloResult, SoloError> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let stored = result.into_result(inner.next_id, Utc::now());
        inner.results.push(stored.clone());
        tracing::debug!(id = stored.id, username = %stored.username, wpm = stored.wpm, "solo result stored");
        Ok(stored)
    }

    async fn top(&self, limit: usize) -> Result<Vec<SoloResult>, SoloError> {
        let inner = self.inner.lock().await;
        let mut results = inner.results.clone();
        results.sort_by(rank_order);
        results.truncate(limit);
        Ok(results)
    }
}
