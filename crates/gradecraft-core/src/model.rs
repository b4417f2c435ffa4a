//! Core data model types for gradecraft.
//!
//! These are the fundamental types that the entire gradecraft system uses
//! to represent exams, questions, and student submissions. They are owned
//! by the authoring/storage layer and passed into the engine by reference;
//! the engine never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of question types the engine knows how to evaluate.
///
/// Adding a type is a deliberate change to the evaluator dispatch, not a
/// runtime extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    Numerical,
    ShortAnswer,
    Essay,
    Code,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "multiple_choice"),
            QuestionKind::TrueFalse => write!(f, "true_false"),
            QuestionKind::Numerical => write!(f, "numerical"),
            QuestionKind::ShortAnswer => write!(f, "short_answer"),
            QuestionKind::Essay => write!(f, "essay"),
            QuestionKind::Code => write!(f, "code"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiple_choice" | "mcq" => Ok(QuestionKind::MultipleChoice),
            "true_false" | "boolean" => Ok(QuestionKind::TrueFalse),
            "numerical" | "numeric" => Ok(QuestionKind::Numerical),
            "short_answer" => Ok(QuestionKind::ShortAnswer),
            "essay" => Ok(QuestionKind::Essay),
            "code" => Ok(QuestionKind::Code),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// The correct-answer reference attached to a question.
///
/// Which variant is valid depends on the question kind: literal keys for
/// choice and short-answer questions, numeric keys for numerical ones,
/// rubric keys for essay and code. Mismatches are reported by
/// [`crate::parser::validate_exam`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerKey {
    /// Canonical answer text plus accepted alternatives.
    Literal {
        value: String,
        #[serde(default)]
        accepted: Vec<String>,
    },
    /// Expected value with an optional relative-tolerance override.
    Numeric {
        value: f64,
        #[serde(default)]
        tolerance: Option<f64>,
    },
    /// Grading criteria handed to the semantic grading service.
    Rubric { text: String },
}

/// A single exam question. Immutable after exam creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within the exam.
    pub id: String,
    /// The question prompt shown to students.
    pub text: String,
    /// Question type, selecting the evaluator.
    pub kind: QuestionKind,
    /// Correct-answer reference.
    pub key: AnswerKey,
    /// Point value (must be positive).
    pub points: f64,
    /// Topic tags for per-topic reporting.
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Per-exam grading policy, passed explicitly through every grading call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    /// Leniency scalar in [0.0, 1.0]; higher is stricter.
    #[serde(default = "default_strictness")]
    pub strictness: f64,
    /// Whether tolerance/fuzzy evaluators may award partial credit.
    #[serde(default = "default_true")]
    pub partial_credit: bool,
    /// Whether essay/short-answer grading may call the semantic service.
    #[serde(default = "default_true")]
    pub ai_grading: bool,
}

fn default_strictness() -> f64 {
    0.7
}

fn default_true() -> bool {
    true
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            strictness: default_strictness(),
            partial_credit: true,
            ai_grading: true,
        }
    }
}

/// A complete exam definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    /// Unique exam identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Description of the exam.
    #[serde(default)]
    pub description: String,
    /// The questions, in presentation order.
    pub questions: Vec<Question>,
    /// Default grading policy for this exam.
    #[serde(default)]
    pub grading: GradingConfig,
    /// Passing threshold as a percentage.
    #[serde(default = "default_passing_score")]
    pub passing_score: f64,
}

fn default_passing_score() -> f64 {
    60.0
}

impl Exam {
    /// Sum of all question point values.
    pub fn total_points(&self) -> f64 {
        self.questions.iter().map(|q| q.points).sum()
    }

    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// A student's answer to one question. The response is always textual;
/// numeric answers are parsed at evaluation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Id of the question being answered.
    pub question_id: String,
    /// Raw response text.
    pub response: String,
}

/// A complete (possibly partial) exam submission from one student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Id of the exam this submission targets.
    pub exam_id: String,
    /// Student identifier.
    pub student_id: String,
    /// Student display name.
    pub student_name: String,
    /// Answers in submission order.
    pub answers: Vec<Answer>,
    /// When the submission was received.
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// Look up this student's answer for a question, if any.
    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_question(id: &str, value: f64, points: f64) -> Question {
        Question {
            id: id.into(),
            text: format!("What is {value}?"),
            kind: QuestionKind::Numerical,
            key: AnswerKey::Numeric {
                value,
                tolerance: None,
            },
            points,
            topics: vec![],
        }
    }

    #[test]
    fn kind_display_and_parse() {
        assert_eq!(QuestionKind::MultipleChoice.to_string(), "multiple_choice");
        assert_eq!(QuestionKind::Essay.to_string(), "essay");
        assert_eq!(
            "short_answer".parse::<QuestionKind>().unwrap(),
            QuestionKind::ShortAnswer
        );
        assert_eq!("MCQ".parse::<QuestionKind>().unwrap(), QuestionKind::MultipleChoice);
        assert_eq!("numeric".parse::<QuestionKind>().unwrap(), QuestionKind::Numerical);
        assert!("oral".parse::<QuestionKind>().is_err());
    }

    #[test]
    fn grading_config_default() {
        let config = GradingConfig::default();
        assert!((config.strictness - 0.7).abs() < f64::EPSILON);
        assert!(config.partial_credit);
        assert!(config.ai_grading);
    }

    #[test]
    fn exam_totals_and_lookup() {
        let exam = Exam {
            id: "midterm".into(),
            title: "Midterm".into(),
            description: String::new(),
            questions: vec![numeric_question("q1", 4.0, 5.0), numeric_question("q2", 7.0, 3.0)],
            grading: GradingConfig::default(),
            passing_score: 60.0,
        };
        assert!((exam.total_points() - 8.0).abs() < f64::EPSILON);
        assert!(exam.question("q2").is_some());
        assert!(exam.question("q9").is_none());
    }

    #[test]
    fn question_serde_roundtrip() {
        let question = Question {
            id: "q1".into(),
            text: "Capital of France?".into(),
            kind: QuestionKind::ShortAnswer,
            key: AnswerKey::Literal {
                value: "Paris".into(),
                accepted: vec!["paris, france".into()],
            },
            points: 2.0,
            topics: vec!["geography".into()],
        };
        let json = serde_json::to_string(&question).unwrap();
        let deserialized: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id, "q1");
        assert_eq!(deserialized.kind, QuestionKind::ShortAnswer);
        match deserialized.key {
            AnswerKey::Literal { value, accepted } => {
                assert_eq!(value, "Paris");
                assert_eq!(accepted.len(), 1);
            }
            other => panic!("unexpected key: {other:?}"),
        }
    }

    #[test]
    fn submission_answer_lookup() {
        let submission = Submission {
            exam_id: "midterm".into(),
            student_id: "s1".into(),
            student_name: "Ada".into(),
            answers: vec![Answer {
                question_id: "q1".into(),
                response: "4".into(),
            }],
            submitted_at: Utc::now(),
        };
        assert!(submission.answer("q1").is_some());
        assert!(submission.answer("q2").is_none());
    }
}
