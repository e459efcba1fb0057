//! Retry policy for remote calls.
//!
//! Every remote call that can fail transiently goes through [`with_retry`]
//! so page fetches and profile lookups share one backoff policy.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::progress::{FetchProgress, ProgressCallback};

/// Initial backoff delay.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Backoff delay ceiling.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Total attempts per remote call, including the first.
pub const MAX_ATTEMPTS: u32 = 3;

/// Configuration for retry operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retries after the first attempt.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: (MAX_ATTEMPTS - 1) as usize,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// The default exponential backoff strategy for remote calls.
#[must_use]
pub fn default_backoff() -> ExponentialBuilder {
    RetryConfig::default().into_backoff()
}

/// Execute an operation with automatic retry on transient errors.
///
/// Retries only errors the `is_transient` predicate accepts, backing off
/// exponentially with jitter. Each backoff emits a
/// [`FetchProgress::RetryBackoff`] event and a debug-level trace. The
/// final error is returned unchanged once attempts are exhausted.
///
/// # Arguments
///
/// * `operation` - The async operation to retry.
/// * `is_transient` - Predicate selecting which errors are retried.
/// * `short_message` - Extracts a short error message for reporting.
/// * `subject` - What is being retried, for progress reporting (a
///   username or a `repo relation` label).
/// * `on_progress` - Optional callback for reporting backoff progress.
pub async fn with_retry<T, E, F, Fut, IsTransient, ShortMsg>(
    mut operation: F,
    is_transient: IsTransient,
    short_message: ShortMsg,
    subject: &str,
    on_progress: Option<&ProgressCallback>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
    IsTransient: Fn(&E) -> bool + Send + Sync + 'static,
    ShortMsg: Fn(&E) -> String + Send + Sync + 'static,
{
    let subject_str = subject.to_string();

    // Track attempt number for progress reporting
    let attempt = AtomicU32::new(0);

    let retry_op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    retry_op
        .retry(default_backoff())
        .notify(|err, dur| {
            let current_attempt = attempt.load(Ordering::SeqCst);
            if let Some(cb) = on_progress {
                cb(FetchProgress::RetryBackoff {
                    subject: subject_str.clone(),
                    retry_after_ms: dur.as_millis() as u64,
                    attempt: current_attempt,
                });
            }
            tracing::debug!(
                "Transient failure on {}, retrying in {:?} (attempt {}): {}",
                subject_str,
                dur,
                current_attempt,
                short_message(err)
            );
        })
        .when(is_transient)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn default_config_allows_three_total_attempts() {
        let config = RetryConfig::default();

        assert_eq!(config.min_delay, Duration::from_millis(INITIAL_BACKOFF_MS));
        assert_eq!(config.max_delay, Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(config.max_retries, 2);
        assert!(config.with_jitter);
    }

    #[test]
    fn custom_config() {
        let config = RetryConfig::new(Duration::from_secs(2), Duration::from_secs(30), 3)
            .with_jitter(false);

        assert_eq!(config.min_delay, Duration::from_secs(2));
        assert_eq!(config.max_retries, 3);
        assert!(!config.with_jitter);
    }

    #[derive(Debug, Clone)]
    struct TestError {
        message: &'static str,
        transient: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.message)
        }
    }

    impl std::error::Error for TestError {}

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_and_emits_progress() {
        let calls = Arc::new(AtomicU32::new(0));

        let events: Arc<Mutex<Vec<FetchProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let events_capture = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            events_capture
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event);
        });

        // Fail twice with a transient error, then succeed.
        let calls_capture = Arc::clone(&calls);
        let mut operation = move || {
            let calls_capture = Arc::clone(&calls_capture);
            async move {
                let n = calls_capture.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(TestError {
                        message: "connection reset",
                        transient: true,
                    })
                } else {
                    Ok(42u32)
                }
            }
        };

        let advancer = tokio::spawn(async {
            for _ in 0..30 {
                tokio::time::advance(Duration::from_secs(60)).await;
                tokio::task::yield_now().await;
            }
        });

        let result = with_retry(
            &mut operation,
            |e: &TestError| e.transient,
            |e: &TestError| e.to_string(),
            "alice",
            Some(&callback),
        )
        .await;

        advancer.await.expect("advancer task");

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let events = events.lock().unwrap_or_else(|e| e.into_inner());
        assert!(
            events
                .iter()
                .any(|e| matches!(e, FetchProgress::RetryBackoff { .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_capture = Arc::clone(&calls);

        let mut operation = move || {
            let calls_capture = Arc::clone(&calls_capture);
            async move {
                calls_capture.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TestError {
                    message: "timeout",
                    transient: true,
                })
            }
        };

        let advancer = tokio::spawn(async {
            for _ in 0..30 {
                tokio::time::advance(Duration::from_secs(60)).await;
                tokio::task::yield_now().await;
            }
        });

        let err = with_retry(
            &mut operation,
            |e: &TestError| e.transient,
            |e: &TestError| e.to_string(),
            "alice",
            None,
        )
        .await
        .expect_err("expected error");

        advancer.await.expect("advancer task");

        assert_eq!(err.to_string(), "timeout");
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn does_not_retry_terminal_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_capture = Arc::clone(&calls);

        let mut operation = move || {
            let calls_capture = Arc::clone(&calls_capture);
            async move {
                calls_capture.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TestError {
                    message: "forbidden",
                    transient: false,
                })
            }
        };

        let err = with_retry(
            &mut operation,
            |e: &TestError| e.transient,
            |e: &TestError| e.to_string(),
            "alice",
            None,
        )
        .await
        .expect_err("expected error");

        assert_eq!(err.to_string(), "forbidden");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
