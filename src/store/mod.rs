//! Reading storage abstraction.
//!
//! Handlers only see the [`ReadingStore`] trait; `main.rs` picks the backend
//! ([`MemoryStore`] or [`PgReadingStore`]) from configuration and injects it
//! into the router as state.

use std::{future::Future, sync::Mutex};

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;

use crate::models::{Reading, ReadingInput};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgReadingStore;

// ---

/// Number of readings returned when the caller does not ask for a limit.
pub const DEFAULT_LIMIT: usize = 20;

/// Upper bound on readings returned by a single query.
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    // ---
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Corrupt reading row: {0}")]
    CorruptRow(String),
}

/// Persistence capability shared by all storage backends.
///
/// Implementations are cheap handles (`Clone`) around shared state.
pub trait ReadingStore: Clone + Send + Sync + 'static {
    // ---
    /// Append a reading to its device's collection, creating the collection
    /// on first use. Assigns `id` and `server_timestamp`.
    fn store(
        &self,
        reading: ReadingInput,
    ) -> impl Future<Output = Result<Reading, StoreError>> + Send;

    /// Return at most `limit` (capped at [`MAX_LIMIT`]) of the most recently
    /// stored readings for `device_id`, newest first. Unknown devices yield
    /// an empty list.
    fn query(
        &self,
        device_id: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Reading>, StoreError>> + Send;
}

/// Resolve the `limit` query parameter.
///
/// Missing or non-integer values fall back to [`DEFAULT_LIMIT`]; values above
/// [`MAX_LIMIT`] are clamped; negative values return nothing.
pub fn resolve_limit(raw: Option<&str>) -> usize {
    // ---
    match raw.map(|s| s.trim().parse::<i64>()) {
        Some(Ok(n)) if n < 0 => 0,
        Some(Ok(n)) => usize::try_from(n).map_or(MAX_LIMIT, |n| n.min(MAX_LIMIT)),
        Some(Err(_)) | None => DEFAULT_LIMIT,
    }
}

/// Process-wide clock that never runs backwards.
///
/// Ticks are truncated to microseconds, the precision PostgreSQL keeps and
/// the precision of `received_timestamp`.
#[derive(Debug, Default)]
pub struct ServerClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl ServerClock {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) -> Result<DateTime<Utc>, StoreError> {
        // ---
        let mut last = self.last.lock().map_err(|_| StoreError::LockPoisoned)?;
        let now = Utc::now().trunc_subsecs(6);
        let ts = match *last {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        *last = Some(ts);
        Ok(ts)
    }
}
