//! Progress reporting for audience collection.
//!
//! Two modes:
//! - Interactive mode (TTY): Animated progress bars using indicatif
//! - Logging mode (non-TTY): Structured logging using tracing
//!
//! Progress bars are organized as:
//! - One fetch bar per relation, showing page fetching progress
//! - One resolve bar for profile resolution

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use audience::{FetchProgress, ProgressCallback};
use console::Term;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress reporter that handles both interactive and logging modes.
pub enum ProgressReporter {
    /// Interactive progress bars for TTY.
    Interactive(InteractiveReporter),
    /// Structured logging for non-TTY (CI, pipes).
    Logging(LoggingReporter),
}

impl ProgressReporter {
    /// Create a new progress reporter, auto-detecting TTY mode.
    pub fn new() -> Self {
        if Term::stdout().is_term() {
            Self::Interactive(InteractiveReporter::new())
        } else {
            Self::Logging(LoggingReporter::new())
        }
    }

    /// Handle a progress event.
    pub fn handle(&self, event: FetchProgress) {
        match self {
            Self::Interactive(r) => r.handle(event),
            Self::Logging(r) => r.handle(event),
        }
    }

    /// Convert to a ProgressCallback for the library.
    pub fn as_callback(self: &Arc<Self>) -> ProgressCallback {
        let reporter = Arc::clone(self);
        Box::new(move |event| {
            reporter.handle(event);
        })
    }

    /// Finish all progress bars (interactive mode only).
    pub fn finish(&self) {
        if let Self::Interactive(r) = self {
            r.finish();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Consolidated progress state under a single lock.
#[derive(Default)]
struct ProgressState {
    /// Fetch progress bars by relation label.
    fetch_bars: HashMap<String, ProgressBar>,
    /// Single bar for profile resolution.
    resolve_bar: Option<ProgressBar>,
}

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// Handle a progress event.
    pub fn handle(&self, event: FetchProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            FetchProgress::FetchingRelation {
                relation,
                expected_total,
            } => {
                let expected_pages = expected_total.div_ceil(100).max(1);
                let pb = self.multi.add(ProgressBar::new(expected_pages as u64));
                pb.set_style(Self::bar_style());
                pb.set_prefix(format!("{:12}", relation.to_string()));
                pb.set_message(format!("Fetching {} users...", expected_total));
                state.fetch_bars.insert(relation.to_string(), pb);
            }

            FetchProgress::FetchedPage {
                relation,
                page,
                count: _,
                total_so_far,
            } => {
                if let Some(pb) = state.fetch_bars.get(&relation.to_string()) {
                    if let Some(len) = pb.length()
                        && page as u64 > len
                    {
                        pb.set_length(page as u64);
                    }
                    pb.set_position(page as u64);
                    pb.set_message(format!("Page {} ({} users)", page, total_so_far));
                }
            }

            FetchProgress::RelationComplete { relation, total } => {
                if let Some(pb) = state.fetch_bars.get(&relation.to_string()) {
                    pb.finish_with_message(format!("✓ {} users", total));
                }
            }

            FetchProgress::ResolvingProfiles { total } => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style());
                pb.set_prefix(format!("{:12}", "Resolving"));
                pb.set_message("Resolving profiles...");
                state.resolve_bar = Some(pb);
            }

            FetchProgress::ProfileResolved {
                username,
                from_cache,
            } => {
                if let Some(ref pb) = state.resolve_bar {
                    pb.inc(1);
                    let symbol = if from_cache { "·" } else { "✓" };
                    pb.set_message(format!("{} {}", symbol, username));
                }
            }

            FetchProgress::ProfileUnresolved { username, error } => {
                if let Some(ref pb) = state.resolve_bar {
                    pb.inc(1);
                    pb.set_message(format!("✗ {}: {}", username, error));
                }
            }

            FetchProgress::RetryBackoff {
                subject,
                retry_after_ms,
                attempt,
            } => {
                if let Some(ref pb) = state.resolve_bar {
                    pb.set_message(format!(
                        "⏳ {} failed, retry {} in {:.1}s",
                        subject,
                        attempt,
                        retry_after_ms as f64 / 1000.0
                    ));
                }
            }

            FetchProgress::ResolutionComplete {
                resolved,
                unresolved,
                cache_hits,
            } => {
                if let Some(ref pb) = state.resolve_bar {
                    let msg = if unresolved > 0 {
                        format!(
                            "✓ {} resolved ({} cached), {} unresolved",
                            resolved, cache_hits, unresolved
                        )
                    } else {
                        format!("✓ {} resolved ({} cached)", resolved, cache_hits)
                    };
                    pb.finish_with_message(msg);
                }
            }

            _ => {}
        }
    }

    /// Finish all progress bars.
    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for pb in state.fetch_bars.values() {
            if !pb.is_finished() {
                pb.finish();
            }
        }
        if let Some(ref pb) = state.resolve_bar
            && !pb.is_finished()
        {
            pb.finish();
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>4}/{len:4} {msg}")
            .expect("Invalid template")
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    /// Handle a progress event.
    pub fn handle(&self, event: FetchProgress) {
        match event {
            FetchProgress::FetchingRelation {
                relation,
                expected_total,
            } => {
                tracing::info!(relation = %relation, expected_total, "Fetching relation");
            }

            FetchProgress::FetchedPage {
                relation,
                page,
                count,
                total_so_far,
            } => {
                tracing::debug!(relation = %relation, page, count, total_so_far, "Fetched page");
            }

            FetchProgress::RelationComplete { relation, total } => {
                tracing::info!(relation = %relation, total, "Relation complete");
            }

            FetchProgress::ResolvingProfiles { total } => {
                tracing::info!(total, "Resolving profiles");
            }

            FetchProgress::ProfileResolved {
                username,
                from_cache,
            } => {
                tracing::debug!(username = %username, from_cache, "Profile resolved");
            }

            FetchProgress::ProfileUnresolved { username, error } => {
                tracing::warn!(username = %username, error = %error, "Profile unresolved");
            }

            FetchProgress::RetryBackoff {
                subject,
                retry_after_ms,
                attempt,
            } => {
                tracing::warn!(
                    subject = %subject,
                    retry_after_ms,
                    attempt,
                    "Transient failure, backing off"
                );
            }

            FetchProgress::ResolutionComplete {
                resolved,
                unresolved,
                cache_hits,
            } => {
                tracing::info!(resolved, unresolved, cache_hits, "Resolution complete");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
