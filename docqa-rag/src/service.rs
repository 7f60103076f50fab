//! Timeout and retry handling for calls to external services.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::{QaConfig, RetryPolicy};
use crate::error::{QaError, Result};

/// Wraps every call to an embedding or language model service.
///
/// Each attempt is bounded by `timeout`; an elapsed attempt becomes
/// [`QaError::ServiceTimeout`]. Transient failures are retried according to
/// the [`RetryPolicy`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServicePolicy {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl From<&QaConfig> for ServicePolicy {
    fn from(config: &QaConfig) -> Self {
        Self { timeout: config.service_timeout, retry: config.retry.clone() }
    }
}

impl ServicePolicy {
    /// Run `op` under this policy. `op` is invoked once per attempt.
    pub async fn call<T, F, Fut>(&self, service: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(QaError::ServiceTimeout {
                    service: service.to_string(),
                    timeout: self.timeout,
                }),
            };

            match result {
                Err(e) if e.is_transient() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(service, attempt = attempt + 1, ?delay, error = %e, "service call failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn policy(max_attempts: u32) -> ServicePolicy {
        ServicePolicy {
            timeout: Duration::from_secs(1),
            retry: RetryPolicy { max_attempts, ..Default::default() },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_call_becomes_service_timeout() {
        let result: Result<()> = policy(1)
            .call("llm", || async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;
        match result {
            Err(QaError::ServiceTimeout { service, timeout }) => {
                assert_eq!(service, "llm");
                assert_eq!(timeout, Duration::from_secs(1));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_up_to_the_cap() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = policy(3)
            .call("llm", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(QaError::service("llm", "rate limited"))
                } else {
                    Ok("done")
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn default_policy_does_not_retry() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = policy(1)
            .call("embedding", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(QaError::service("embedding", "unreachable"))
            })
            .await;
        assert!(matches!(result, Err(QaError::Service { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = policy(5)
            .call("index", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(QaError::VectorIndex("broken".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
