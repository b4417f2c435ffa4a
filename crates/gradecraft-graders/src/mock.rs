//! Mock grading backend for testing.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use gradecraft_core::error::ServiceError;
use gradecraft_core::traits::{AssessRequest, Assessment, SemanticGrader, SummaryRequest};

/// A mock semantic grader for testing the engine without real API calls.
///
/// Returns configurable assessments based on response-content matching, and
/// can be scripted to fail a number of times before succeeding.
pub struct MockGrader {
    /// Map of response substring → assessment.
    assessments: HashMap<String, Assessment>,
    /// Default assessment when no mapping matches.
    default_assessment: Assessment,
    /// Summary text returned by `summarize`.
    summary: String,
    /// Errors returned (in order) before any success.
    failures: Mutex<VecDeque<ServiceError>>,
    /// Number of calls made (grade and summarize combined).
    call_count: AtomicU32,
    /// Last grading request received.
    last_request: Mutex<Option<AssessRequest>>,
}

fn default_assessment() -> Assessment {
    Assessment {
        score_fraction: 0.5,
        feedback: "Partially addresses the question.".into(),
        strengths: vec![],
        weaknesses: vec![],
        suggestions: vec![],
        confidence: 0.75,
    }
}

impl MockGrader {
    /// Create a mock with the given response-substring → assessment mappings.
    pub fn new(assessments: HashMap<String, Assessment>) -> Self {
        Self {
            assessments,
            default_assessment: default_assessment(),
            summary: "Solid effort; review the weaker topics.".into(),
            failures: Mutex::new(VecDeque::new()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same assessment.
    pub fn with_fixed(assessment: Assessment) -> Self {
        Self {
            assessments: HashMap::new(),
            default_assessment: assessment,
            summary: "Solid effort; review the weaker topics.".into(),
            failures: Mutex::new(VecDeque::new()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Script errors to be returned before any success.
    pub fn with_failures(self, failures: Vec<ServiceError>) -> Self {
        *self.failures.lock().unwrap() = failures.into();
        self
    }

    /// Override the summary text.
    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    /// Number of calls made to this grader.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last grading request received.
    pub fn last_request(&self) -> Option<AssessRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn next_failure(&self) -> Option<ServiceError> {
        self.failures.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl SemanticGrader for MockGrader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn grade(&self, request: &AssessRequest) -> anyhow::Result<Assessment> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if let Some(failure) = self.next_failure() {
            return Err(failure.into());
        }

        let assessment = self
            .assessments
            .iter()
            .find(|(key, _)| request.response.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_assessment.clone());

        Ok(assessment)
    }

    async fn summarize(&self, _request: &SummaryRequest) -> anyhow::Result<String> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        if let Some(failure) = self.next_failure() {
            return Err(failure.into());
        }

        Ok(self.summary.clone())
    }
}
