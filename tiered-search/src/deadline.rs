//! Request deadlines threaded through every suspending engine call.
//!
//! A [`Deadline`] is a point in time, not a duration, so that nested calls
//! share one budget instead of each starting a fresh timer. Expiry drops the
//! wrapped future, which aborts whatever network or browser call it was
//! awaiting.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::SearchError;

/// An absolute cut-off for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// A deadline `ms` milliseconds from now.
    pub fn after_millis(ms: u64) -> Self {
        Self::after(Duration::from_millis(ms))
    }

    /// The earlier of two deadlines.
    pub fn earliest(self, other: Self) -> Self {
        self.min(other)
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Drive `fut` to completion unless the deadline passes first.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Timeout`] naming `what` if the deadline expires.
    pub async fn run<F, T>(self, what: &str, fut: F) -> Result<T, SearchError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout_at(self.at, fut)
            .await
            .map_err(|_| SearchError::Timeout(format!("{what} exceeded its deadline")))
    }
}
