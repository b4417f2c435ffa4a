//! The semantic grading contract.
//!
//! This async trait is implemented by the `gradecraft-graders` crate for
//! real HTTP backends and by a deterministic mock. Evaluators never call a
//! backend directly; they go through [`crate::adapter::SemanticClient`],
//! which adds the timeout/retry policy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::model::QuestionKind;

/// A backend capable of rubric- and semantics-aware grading.
#[async_trait]
pub trait SemanticGrader: Send + Sync {
    /// Human-readable backend name (e.g. "openai").
    fn name(&self) -> &str;

    /// Grade one answer against its reference/rubric.
    async fn grade(&self, request: &AssessRequest) -> anyhow::Result<Assessment>;

    /// Produce holistic overall feedback for a graded submission.
    async fn summarize(&self, request: &SummaryRequest) -> anyhow::Result<String>;
}

/// Request to grade a single answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessRequest {
    /// The question prompt.
    pub question_text: String,
    /// Rubric text, or the correct answer for non-rubric kinds.
    pub reference: String,
    /// The student's response.
    pub response: String,
    /// Question type, for prompt framing.
    pub kind: QuestionKind,
    /// Maximum points for the question.
    pub points_possible: f64,
    /// Grading strictness in [0, 1].
    pub strictness: f64,
}

/// One line of the per-question summary context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryLine {
    pub question_id: String,
    pub correct: bool,
    pub points_earned: f64,
    pub points_possible: f64,
}

/// Request for holistic overall feedback on a graded submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub exam_title: String,
    pub points_earned: f64,
    pub points_possible: f64,
    pub lines: Vec<SummaryLine>,
}

/// A grading assessment returned by a semantic backend.
///
/// This mirrors the wire contract: `score_fraction` and `confidence` are
/// fractions in [0, 1]; the lists may be empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// Fraction of the available points the backend awards.
    pub score_fraction: f64,
    /// Narrative feedback for the student.
    pub feedback: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Backend-reported certainty in [0, 1].
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

impl Assessment {
    /// Clamp out-of-range score and confidence values. A backend that
    /// reports a score outside [0, 1] is not trusted blindly: the score is
    /// clamped and the confidence halved.
    pub fn sanitize(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.score_fraction) || !self.score_fraction.is_finite() {
            self.score_fraction = if self.score_fraction.is_finite() {
                self.score_fraction.clamp(0.0, 1.0)
            } else {
                0.0
            };
            self.confidence /= 2.0;
        }
        self.confidence = if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }
}

// ---------------------------------------------------------------------------
// Shared prompt construction
// ---------------------------------------------------------------------------

/// System prompt used by all grading backends.
pub const GRADER_SYSTEM_PROMPT: &str = "You are an expert exam grader. Provide fair, constructive feedback. Respond ONLY with a JSON object matching the requested schema.";

/// System prompt used for holistic summary generation.
pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are an encouraging educator providing constructive feedback.";

/// Describe a strictness value for the grading prompt.
pub fn strictness_label(strictness: f64) -> &'static str {
    if strictness > 0.8 {
        "very strict"
    } else if strictness > 0.6 {
        "strict"
    } else if strictness > 0.4 {
        "moderate"
    } else {
        "lenient"
    }
}

impl AssessRequest {
    /// Build the user prompt sent to a grading backend.
    pub fn grading_prompt(&self) -> String {
        format!(
            "Grade the following student answer.\n\n\
             QUESTION:\n{question}\n\n\
             QUESTION TYPE: {kind}\n\
             POINTS POSSIBLE: {points}\n\n\
             REFERENCE (rubric or correct answer):\n{reference}\n\n\
             STUDENT ANSWER:\n{response}\n\n\
             GRADING STRICTNESS: {label} ({strictness:.1}/1.0)\n\n\
             Respond with JSON using exactly these keys:\n\
             {{\n\
             \x20 \"score_fraction\": <number in [0, 1]>,\n\
             \x20 \"feedback\": \"<constructive feedback>\",\n\
             \x20 \"strengths\": [\"<what the student did well>\"],\n\
             \x20 \"weaknesses\": [\"<what needs improvement>\"],\n\
             \x20 \"suggestions\": [\"<specific suggestions>\"],\n\
             \x20 \"confidence\": <number in [0, 1]>\n\
             }}",
            question = self.question_text,
            kind = self.kind,
            points = self.points_possible,
            reference = self.reference,
            response = self.response,
            label = strictness_label(self.strictness),
            strictness = self.strictness,
        )
    }
}

impl SummaryRequest {
    /// Build the user prompt for holistic overall feedback.
    pub fn summary_prompt(&self) -> String {
        let mut lines = String::new();
        for line in &self.lines {
            lines.push_str(&format!(
                "- {}: {} ({:.1}/{:.1})\n",
                line.question_id,
                if line.correct { "correct" } else { "incorrect" },
                line.points_earned,
                line.points_possible,
            ));
        }
        let percentage = if self.points_possible > 0.0 {
            self.points_earned / self.points_possible * 100.0
        } else {
            0.0
        };
        format!(
            "Write encouraging, constructive overall feedback for a student \
             who completed an exam.\n\n\
             EXAM: {title}\n\
             SCORE: {earned:.1}/{possible:.1} ({percentage:.1}%)\n\n\
             QUESTION RESULTS:\n{lines}\n\
             Cover: performance summary, key strengths, main areas for \
             improvement, and study recommendations. Limit to two short \
             paragraphs of plain text.",
            title = self.exam_title,
            earned = self.points_earned,
            possible = self.points_possible,
        )
    }
}

// ---------------------------------------------------------------------------
// Assessment JSON extraction
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawAssessment {
    score_fraction: Option<f64>,
    #[serde(default)]
    feedback: Option<String>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Parse a backend's grading response into an [`Assessment`].
///
/// Handles responses wrapped in markdown code fences and responses with
/// prose around the JSON object. A response with no parseable JSON object
/// or no `score_fraction` field is a permanent
/// [`ServiceError::MalformedResponse`].
pub fn parse_assessment(content: &str) -> Result<Assessment, ServiceError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if e > s => &content[s..=e],
        _ => {
            return Err(ServiceError::MalformedResponse(
                "no JSON object in response".into(),
            ))
        }
    };

    let raw: RawAssessment = serde_json::from_str(json)
        .map_err(|e| ServiceError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let Some(score_fraction) = raw.score_fraction else {
        return Err(ServiceError::MalformedResponse(
            "missing score_fraction".into(),
        ));
    };

    Ok(Assessment {
        score_fraction,
        feedback: raw
            .feedback
            .unwrap_or_else(|| "No feedback provided.".into()),
        strengths: raw.strengths,
        weaknesses: raw.weaknesses,
        suggestions: raw.suggestions,
        confidence: raw.confidence.unwrap_or_else(default_confidence),
    }
    .sanitize())
}
