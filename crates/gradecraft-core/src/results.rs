//! Grading result types.
//!
//! A `SubmissionResult`'s aggregate fields are derived from its question
//! results in exactly one place (`from_question_results`); nothing else
//! sets them, so the totals can never disagree with the breakdown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Question, Submission};

/// How a question's result came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    /// The response was evaluated normally.
    Graded,
    /// No response was given for this question.
    Unanswered,
    /// The evaluator failed; the result is zero-credit and the submission
    /// is flagged degraded.
    Error,
}

/// The outcome of evaluating one answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    /// Id of the evaluated question.
    pub question_id: String,
    /// The normalized response, when one was given.
    pub response: Option<String>,
    /// Points awarded, always within [0, points_possible].
    pub points_earned: f64,
    /// The question's point value.
    pub points_possible: f64,
    /// True only when full credit was awarded.
    pub correct: bool,
    /// Result marker.
    pub status: QuestionStatus,
    /// Always non-empty.
    pub feedback: String,
    /// Improvement suggestions for the student.
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Grader confidence; only meaningful for AI-assisted question types.
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl QuestionResult {
    /// Build a graded result, clamping points into [0, question.points] and
    /// deriving the correctness flag.
    pub fn graded(
        question: &Question,
        response: impl Into<String>,
        points_earned: f64,
        feedback: impl Into<String>,
    ) -> Self {
        let clamped = points_earned.clamp(0.0, question.points);
        Self {
            question_id: question.id.clone(),
            response: Some(response.into()),
            points_earned: clamped,
            points_possible: question.points,
            correct: (clamped - question.points).abs() < 1e-9,
            status: QuestionStatus::Graded,
            feedback: feedback.into(),
            suggestions: Vec::new(),
            confidence: None,
        }
    }

    /// Zero-credit result for a question with no response.
    pub fn unanswered(question: &Question) -> Self {
        Self {
            question_id: question.id.clone(),
            response: None,
            points_earned: 0.0,
            points_possible: question.points,
            correct: false,
            status: QuestionStatus::Unanswered,
            feedback: "No response provided.".into(),
            suggestions: Vec::new(),
            confidence: None,
        }
    }

    /// Zero-credit result recording an evaluator failure.
    pub fn failed(question: &Question, response: Option<&str>, reason: &str) -> Self {
        Self {
            question_id: question.id.clone(),
            response: response.map(str::to_string),
            points_earned: 0.0,
            points_possible: question.points,
            correct: false,
            status: QuestionStatus::Error,
            feedback: format!("Could not evaluate this answer: {reason}"),
            suggestions: Vec::new(),
            confidence: None,
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// Fraction of the available points earned.
    pub fn fraction(&self) -> f64 {
        if self.points_possible > 0.0 {
            self.points_earned / self.points_possible
        } else {
            0.0
        }
    }
}

/// Letter grade with fixed policy bands: A >= 90, B >= 80, C >= 70,
/// D >= 60, F otherwise.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// All grades in display order.
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Grade::A
        } else if percentage >= 80.0 {
            Grade::B
        } else if percentage >= 70.0 {
            Grade::C
        } else if percentage >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{letter}")
    }
}

/// The complete graded outcome for one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub student_id: String,
    pub student_name: String,
    pub exam_id: String,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: DateTime<Utc>,
    /// Per-question breakdown in exam question order.
    pub question_results: Vec<QuestionResult>,
    pub points_earned: f64,
    pub points_possible: f64,
    pub percentage: f64,
    pub grade: Grade,
    pub overall_feedback: String,
    /// True when at least one evaluator failed and its question was scored
    /// zero with an error marker.
    pub degraded: bool,
}

impl SubmissionResult {
    /// Derive a submission result from its question results. This is the
    /// only constructor; totals, percentage, grade, and the degraded flag
    /// are never set independently.
    pub fn from_question_results(
        submission: &Submission,
        question_results: Vec<QuestionResult>,
        overall_feedback: String,
    ) -> Self {
        let points_earned: f64 = question_results.iter().map(|r| r.points_earned).sum();
        let points_possible: f64 = question_results.iter().map(|r| r.points_possible).sum();
        let percentage = if points_possible > 0.0 {
            points_earned / points_possible * 100.0
        } else {
            0.0
        };
        let degraded = question_results
            .iter()
            .any(|r| r.status == QuestionStatus::Error);

        Self {
            student_id: submission.student_id.clone(),
            student_name: submission.student_name.clone(),
            exam_id: submission.exam_id.clone(),
            submitted_at: submission.submitted_at,
            graded_at: Utc::now(),
            question_results,
            points_earned,
            points_possible,
            percentage,
            grade: Grade::from_percentage(percentage),
            overall_feedback,
            degraded,
        }
    }

    /// Look up the result for a specific question.
    pub fn question_result(&self, question_id: &str) -> Option<&QuestionResult> {
        self.question_results
            .iter()
            .find(|r| r.question_id == question_id)
    }
}
