//! Retrying client for the semantic grading service.
//!
//! Wraps any [`SemanticGrader`] with a per-call timeout and bounded
//! exponential backoff. Failures never escape as errors: callers receive a
//! [`SemanticOutcome::Unavailable`] sentinel and must treat it as a
//! first-class result. The client holds no mutable state, so concurrent
//! grading calls share one instance freely.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::ServiceError;
use crate::traits::{AssessRequest, Assessment, SemanticGrader, SummaryRequest};

/// Timeout and retry policy for semantic grading calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each subsequent retry.
    pub initial_delay: Duration,
    /// Backoff cap.
    pub max_delay: Duration,
    /// Per-call timeout.
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of a semantic grading call.
#[derive(Debug, Clone)]
pub enum SemanticOutcome {
    /// The service produced a (sanitized) assessment.
    Graded(Assessment),
    /// The service could not produce one: timed out, exhausted retries, or
    /// failed permanently. Evaluators fall back to local heuristics or a
    /// manual-review marker.
    Unavailable { reason: String },
}

impl SemanticOutcome {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SemanticOutcome::Unavailable { .. })
    }
}

/// A [`SemanticGrader`] with timeout and retry applied to every call.
pub struct SemanticClient {
    grader: Arc<dyn SemanticGrader>,
    policy: RetryPolicy,
}

impl SemanticClient {
    pub fn new(grader: Arc<dyn SemanticGrader>, policy: RetryPolicy) -> Self {
        Self { grader, policy }
    }

    pub fn with_defaults(grader: Arc<dyn SemanticGrader>) -> Self {
        Self::new(grader, RetryPolicy::default())
    }

    /// The wrapped backend's name.
    pub fn name(&self) -> &str {
        self.grader.name()
    }

    /// Grade one answer. Never fails; unavailability is a value.
    pub async fn grade(&self, request: &AssessRequest) -> SemanticOutcome {
        match self
            .call_with_retry(|| self.grader.grade(request), "grade")
            .await
        {
            Ok(assessment) => SemanticOutcome::Graded(assessment.sanitize()),
            Err(reason) => SemanticOutcome::Unavailable { reason },
        }
    }

    /// Produce holistic overall feedback; `None` when unavailable.
    pub async fn summarize(&self, request: &SummaryRequest) -> Option<String> {
        match self
            .call_with_retry(|| self.grader.summarize(request), "summarize")
            .await
        {
            Ok(text) => Some(text),
            Err(reason) => {
                tracing::warn!("holistic summary unavailable: {reason}");
                None
            }
        }
    }

    /// Retry transient failures with exponential backoff; surface permanent
    /// ones immediately. Rate-limit responses override the backoff delay
    /// with the service's retry-after hint.
    async fn call_with_retry<T, F, Fut>(&self, mut call: F, what: &str) -> Result<T, String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut delay = self.policy.initial_delay;
        let mut last_reason = String::from("no attempts made");

        for attempt in 0..=self.policy.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    "semantic {what} failed ({last_reason}); retry {attempt} in {delay:?}"
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(self.policy.max_delay);
            }

            match timeout(self.policy.call_timeout, call()).await {
                Err(_) => {
                    last_reason =
                        format!("timed out after {}s", self.policy.call_timeout.as_secs());
                }
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    if let Some(service) = e.downcast_ref::<ServiceError>() {
                        if service.is_permanent() {
                            return Err(service.to_string());
                        }
                        if let Some(ms) = service.retry_after_ms() {
                            delay = Duration::from_millis(ms);
                        }
                    }
                    last_reason = format!("{e:#}");
                }
            }
        }

        Err(last_reason)
    }
}
