//! Progress events and cancellation for audience collection.
//!
//! The library reports progress through an optional callback so the CLI
//! can render it however fits the terminal (bars on a TTY, structured
//! logs otherwise).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::relation::Relation;

/// Progress events emitted while collecting a repository's audience.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum FetchProgress {
    /// Starting to page through one relation's listing endpoint.
    FetchingRelation {
        relation: Relation,
        /// The total the repository metadata reports for this relation.
        expected_total: usize,
    },

    /// Fetched one page of a relation listing.
    FetchedPage {
        relation: Relation,
        /// Page number (1-indexed).
        page: u32,
        /// Usernames on this page.
        count: usize,
        /// Running total for this relation.
        total_so_far: usize,
    },

    /// Finished paging through one relation.
    RelationComplete { relation: Relation, total: usize },

    /// Starting profile resolution for the collected usernames.
    ResolvingProfiles { total: usize },

    /// Resolved one profile.
    ProfileResolved { username: String, from_cache: bool },

    /// Gave up on one profile after exhausting retries.
    ProfileUnresolved { username: String, error: String },

    /// Backing off before retrying a remote call.
    RetryBackoff {
        /// What is being retried (a username or relation label).
        subject: String,
        retry_after_ms: u64,
        attempt: u32,
    },

    /// Profile resolution finished.
    ResolutionComplete {
        resolved: usize,
        unresolved: usize,
        cache_hits: usize,
    },
}

/// Callback for receiving progress events.
pub type ProgressCallback = Box<dyn Fn(FetchProgress) + Send + Sync>;

/// Emit a progress event if a callback is present.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: FetchProgress) {
    if let Some(callback) = on_progress {
        callback(event);
    }
}

/// Cooperative cancellation flag threaded through fetch and resolve loops.
///
/// Checked between pages and between profile lookups, never inside a
/// cache upsert, so cancelling cannot leave a half-written record.
#[derive(Clone, Debug, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
