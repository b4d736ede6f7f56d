//! Bounded, fixed-delay retry around analysis calls.
//!
//! ## Retry Strategy
//!
//! Up to `max_retries` attempts in total. After a transport failure
//! ([`AnalysisError::is_transport`]) that is not the last attempt, sleep
//! `delay` and try again. There is no backoff and no jitter: the delay is
//! the same before every retry. Any other failure is returned immediately,
//! as is the last transport failure once attempts run out.

use crate::config::RetryPolicy;
use crate::error::AnalysisError;
use crate::pipeline::analyze::{AnalysisResult, DocumentAnalyzer};
use std::future::Future;
use std::path::Path;
use tokio::time::sleep;
use tracing::warn;

/// Run `op` under `policy`.
///
/// `on_retry(attempt, &error)` is invoked once per retry, before the sleep,
/// with the 1-indexed attempt that just failed.
pub async fn with_retry<T, F, Fut, R>(
    policy: &RetryPolicy,
    mut on_retry: R,
    mut op: F,
) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
    R: FnMut(u32, &AnalysisError),
{
    let max_attempts = policy.max_retries.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transport() && attempt < max_attempts => {
                warn!(
                    "Attempt {}/{} failed: {}; retrying in {}s",
                    attempt,
                    max_attempts,
                    e,
                    policy.delay.as_secs_f64()
                );
                on_retry(attempt, &e);
                sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Analyse `page_path` with `analyzer`, retrying transport failures.
///
/// # Returns
/// The result and the number of attempts made, or the final error and the
/// number of attempts made.
pub async fn analyze_with_retry<R>(
    analyzer: &dyn DocumentAnalyzer,
    page_path: &Path,
    policy: &RetryPolicy,
    on_retry: R,
) -> (Result<AnalysisResult, AnalysisError>, u32)
where
    R: FnMut(u32, &AnalysisError),
{
    let mut attempts = 0u32;
    let result = with_retry(policy, on_retry, || {
        attempts += 1;
        analyzer.analyze(page_path)
    })
    .await;
    (result, attempts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    /// Fails with `error` for the first `failures` calls, then succeeds.
    struct FlakyAnalyzer {
        failures: u32,
        error: AnalysisError,
        calls: AtomicU32,
    }

    impl FlakyAnalyzer {
        fn new(failures: u32, error: AnalysisError) -> Self {
            Self {
                failures,
                error,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentAnalyzer for FlakyAnalyzer {
        async fn analyze(&self, _page_path: &Path) -> Result<AnalysisResult, AnalysisError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(self.error.clone())
            } else {
                Ok(AnalysisResult::from_markdown("ok"))
            }
        }
    }

    fn network() -> AnalysisError {
        AnalysisError::Network {
            detail: "connection reset".into(),
        }
    }

    fn policy(max_retries: u32, secs: u64) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            delay: Duration::from_secs(secs),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let analyzer = FlakyAnalyzer::new(2, network());
        let mut sleeps = 0;
        let start = Instant::now();

        let (result, attempts) =
            analyze_with_retry(&analyzer, Path::new("p.pdf"), &policy(3, 5), |_, _| sleeps += 1)
                .await;

        assert_eq!(result.unwrap().markdown(), Some("ok"));
        assert_eq!(attempts, 3);
        assert_eq!(sleeps, 2);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(10) && waited < Duration::from_secs(11), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let analyzer = FlakyAnalyzer::new(u32::MAX, network());
        let mut sleeps = 0;
        let start = Instant::now();

        let (result, attempts) =
            analyze_with_retry(&analyzer, Path::new("p.pdf"), &policy(4, 5), |_, _| sleeps += 1)
                .await;

        assert!(matches!(result, Err(AnalysisError::Network { .. })));
        assert_eq!(attempts, 4);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 4);
        assert_eq!(sleeps, 3);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(15) && waited < Duration::from_secs(16), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_is_retried_like_any_transport_error() {
        let analyzer = FlakyAnalyzer::new(
            1,
            AnalysisError::RateLimited {
                detail: "quota".into(),
            },
        );
        let (result, attempts) =
            analyze_with_retry(&analyzer, Path::new("p.pdf"), &policy(3, 5), |_, _| {}).await;
        assert!(result.is_ok());
        assert_eq!(attempts, 2);
    }

    #[test]
    fn non_transport_failure_is_not_retried() {
        let analyzer = FlakyAnalyzer::new(
            u32::MAX,
            AnalysisError::InvalidResponse {
                detail: "expected value at line 1".into(),
            },
        );
        let mut sleeps = 0;
        let (result, attempts) = tokio_test::block_on(analyze_with_retry(
            &analyzer,
            Path::new("p.pdf"),
            &policy(3, 0),
            |_, _| sleeps += 1,
        ));
        assert!(matches!(result, Err(AnalysisError::InvalidResponse { .. })));
        assert_eq!(attempts, 1);
        assert_eq!(sleeps, 0);
    }

    #[test]
    fn retry_callback_sees_failed_attempt_numbers() {
        let mut seen = Vec::new();
        let mut calls = 0;
        let result: Result<(), _> = tokio_test::block_on(with_retry(
            &policy(3, 0),
            |attempt, _| seen.push(attempt),
            || {
                calls += 1;
                async { Err(network()) }
            },
        ));
        assert!(result.is_err());
        assert_eq!(calls, 3);
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let mut calls = 0;
        let result = tokio_test::block_on(with_retry(&policy(0, 0), |_, _| {}, || {
            calls += 1;
            async { Ok::<_, AnalysisError>(7) }
        }));
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 1);
    }
}
