//! Rate-limited remote caller.
//!
//! Every call to the helpdesk or the LLM goes through a [`RemoteCaller`]. It
//! bounds the number of calls in flight with a counting semaphore, applies a
//! per-attempt timeout, retries transient failures with exponential backoff
//! and can pace successful calls with a fixed delay.
//!
//! A permit is held for one attempt only, so a call that is backing off does
//! not block its siblings. The permit is released when the attempt future is
//! dropped, whichever way it exits.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use triage_core::{Error, Limits, LlmSettings, Result};

/// How many times to retry a transient failure, and how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_limits(limits: &Limits) -> Self {
        Self::new(
            limits.max_retries,
            Duration::from_millis(limits.retry_base_delay_ms),
        )
    }

    /// Backoff before retry number `attempt + 1`: `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Concurrency gate plus retry wrapper for one remote system.
///
/// Clones share the same semaphore, so a limit set on one clone holds for
/// every stage that uses it.
#[derive(Debug, Clone)]
pub struct RemoteCaller {
    name: &'static str,
    semaphore: Arc<Semaphore>,
    policy: RetryPolicy,
    timeout: Duration,
    post_delay: Duration,
}

impl RemoteCaller {
    pub fn new(
        name: &'static str,
        max_concurrent: usize,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            name,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            policy,
            timeout,
            post_delay: Duration::ZERO,
        }
    }

    /// Sleep this long after each successful call, before releasing the slot.
    pub fn with_post_delay(mut self, delay: Duration) -> Self {
        self.post_delay = delay;
        self
    }

    /// Gate for helpdesk API calls.
    pub fn zendesk(limits: &Limits) -> Self {
        Self::new(
            "zendesk",
            limits.zendesk_max_concurrent,
            RetryPolicy::from_limits(limits),
            Duration::from_secs(limits.request_timeout_secs),
        )
    }

    /// Gate for LLM generation calls, shared by every analysis stage.
    pub fn llm(limits: &Limits, llm: &LlmSettings) -> Self {
        Self::new(
            "llm",
            limits.llm_max_concurrent,
            RetryPolicy::from_limits(limits),
            Duration::from_secs(llm.timeout_secs),
        )
        .with_post_delay(Duration::from_millis(limits.llm_request_delay_ms))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Free slots right now.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Run `op` through the gate, retrying retryable errors.
    ///
    /// `op` is called once per attempt. Errors for which
    /// [`Error::is_retryable`] is false (a missing ticket, bad credentials)
    /// are returned after the first attempt. After the last retry the final
    /// error is returned unchanged.
    pub async fn call<T, F, Fut>(&self, op: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match self.attempt(&mut f).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(
                            subsystem = "pipeline",
                            component = "gate",
                            gate = self.name,
                            op,
                            attempt,
                            "Remote call succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        subsystem = "pipeline",
                        component = "gate",
                        gate = self.name,
                        op,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Remote call failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        warn!(
                            subsystem = "pipeline",
                            component = "gate",
                            gate = self.name,
                            op,
                            attempts = attempt + 1,
                            error = %e,
                            "Remote call failed, giving up"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn attempt<T, F, Fut>(&self, f: &mut F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| Error::Internal(format!("{} gate is closed", self.name)))?;

        let value = match timeout(self.timeout, f()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Request(format!(
                    "{} call timed out after {}s",
                    self.name,
                    self.timeout.as_secs_f64()
                )))
            }
        };

        if !self.post_delay.is_zero() {
            sleep(self.post_delay).await;
        }
        Ok(value)
    }
}
