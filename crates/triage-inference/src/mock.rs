//! Mock generation backend for deterministic testing.
//!
//! Responses are scripted by prompt substring, so one mock can answer the
//! synthesis, categorization and diagnostics prompts of a whole pipeline run.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use triage_inference::mock::MockGenerationBackend;
//! use triage_core::GenerationBackend;
//!
//! #[tokio::test]
//! async fn test_with_mock_backend() {
//!     let backend = MockGenerationBackend::new()
//!         .with_response_mapping("Valid PODs", "**Primary POD:**\nGuidance")
//!         .with_fixed_response("**Summary:**\nfallback");
//!
//!     let text = backend.generate("... Valid PODs: ...").await.unwrap();
//!     assert!(text.contains("Guidance"));
//! }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use triage_core::{Error, GenerationBackend, Result};

/// Mock generation backend for testing.
#[derive(Clone)]
pub struct MockGenerationBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    /// Checked in insertion order; first substring match wins.
    response_mappings: Vec<(String, String)>,
    failure_triggers: Vec<String>,
    default_response: String,
    latency_ms: u64,
    failure_rate: f64,
    fail_first: usize,
}

#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
    pub timestamp: std::time::Instant,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            response_mappings: Vec::new(),
            failure_triggers: Vec::new(),
            default_response: "Mock response".to_string(),
            latency_ms: 0,
            failure_rate: 0.0,
            fail_first: 0,
        }
    }
}

impl MockGenerationBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Response for prompts that match no mapping.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Answer prompts containing `needle` with `output`.
    pub fn with_response_mapping(
        mut self,
        needle: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .response_mappings
            .push((needle.into(), output.into()));
        self
    }

    /// Fail every prompt containing `needle`.
    pub fn with_failure_on(mut self, needle: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .failure_triggers
            .push(needle.into());
        self
    }

    /// Set simulated latency for all operations.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Set failure rate (0.0 - 1.0) for testing error handling.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        Arc::make_mut(&mut self.config).failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Fail the first `n` calls, then behave normally.
    pub fn fail_first(mut self, n: usize) -> Self {
        Arc::make_mut(&mut self.config).fail_first = n;
        self
    }

    fn calls(&self) -> MutexGuard<'_, Vec<MockCall>> {
        self.call_log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls().clone()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.calls().clear()
    }

    /// Get number of generation calls.
    pub fn generate_call_count(&self) -> usize {
        self.calls().len()
    }

    /// Number of calls whose prompt contained `needle`.
    pub fn calls_containing(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.input.contains(needle)).count()
    }

    /// Highest number of calls observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Log the call and return its zero-based sequence number.
    fn log_call(&self, operation: &str, input: &str) -> usize {
        let mut calls = self.calls();
        calls.push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
            timestamp: std::time::Instant::now(),
        });
        calls.len() - 1
    }

    fn should_fail(&self, seq: usize, prompt: &str) -> bool {
        use rand::Rng;
        if seq < self.config.fail_first {
            return true;
        }
        if self
            .config
            .failure_triggers
            .iter()
            .any(|t| prompt.contains(t.as_str()))
        {
            return true;
        }
        self.config.failure_rate > 0.0 && rand::thread_rng().gen::<f64>() < self.config.failure_rate
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    async fn respond(&self, operation: &str, prompt: &str) -> Result<String> {
        let seq = self.log_call(operation, prompt);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        self.simulate_latency().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.should_fail(seq, prompt) {
            return Err(Error::Inference("Simulated failure for testing".to_string()));
        }

        let mapped = self
            .config
            .response_mappings
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone());
        Ok(mapped.unwrap_or_else(|| self.config.default_response.clone()))
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.respond("generate", prompt).await
    }

    async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
        self.respond("generate", prompt).await
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
