//! TOML exam and submission parsing.
//!
//! Loads exam definitions and submission batches from TOML files and
//! validates them for the misconfigurations the grader would otherwise
//! reject at grading time.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{
    Answer, AnswerKey, Exam, GradingConfig, Question, QuestionKind, Submission,
};

/// Intermediate TOML structure for exam files.
#[derive(Debug, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    grading: Option<GradingConfig>,
    #[serde(default = "default_passing_score")]
    passing_score: f64,
}

fn default_passing_score() -> f64 {
    60.0
}

/// Flat question entry; which answer fields are required depends on `kind`.
#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    text: String,
    kind: String,
    points: f64,
    #[serde(default)]
    topics: Vec<String>,
    /// Canonical answer for choice/true-false/short-answer questions.
    #[serde(default)]
    answer: Option<String>,
    /// Accepted alternatives for short-answer questions.
    #[serde(default)]
    accepted: Vec<String>,
    /// Expected value for numerical questions.
    #[serde(default)]
    value: Option<f64>,
    /// Relative-tolerance override for numerical questions.
    #[serde(default)]
    tolerance: Option<f64>,
    /// Rubric text for essay (and optionally code) questions.
    #[serde(default)]
    rubric: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlSubmissionsFile {
    #[serde(default)]
    submissions: Vec<TomlSubmission>,
}

#[derive(Debug, Deserialize)]
struct TomlSubmission {
    student_id: String,
    student_name: String,
    exam_id: String,
    #[serde(default)]
    submitted_at: Option<String>,
    #[serde(default)]
    answers: Vec<TomlAnswer>,
}

#[derive(Debug, Deserialize)]
struct TomlAnswer {
    question_id: String,
    response: String,
}

/// Parse a single TOML file into an [`Exam`].
pub fn parse_exam(path: &Path) -> Result<Exam> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;
    parse_exam_str(&content, path)
}

/// Parse a TOML string into an [`Exam`] (useful for testing).
pub fn parse_exam_str(content: &str, source_path: &Path) -> Result<Exam> {
    let parsed: TomlExamFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let kind: QuestionKind = q
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question '{}': {}", q.id, e))?;

            let key = match kind {
                QuestionKind::MultipleChoice
                | QuestionKind::TrueFalse
                | QuestionKind::ShortAnswer => AnswerKey::Literal {
                    value: q.answer.ok_or_else(|| {
                        anyhow::anyhow!("question '{}': missing 'answer' for {kind}", q.id)
                    })?,
                    accepted: q.accepted,
                },
                QuestionKind::Numerical => AnswerKey::Numeric {
                    value: q.value.ok_or_else(|| {
                        anyhow::anyhow!("question '{}': missing 'value' for {kind}", q.id)
                    })?,
                    tolerance: q.tolerance,
                },
                QuestionKind::Essay => AnswerKey::Rubric {
                    text: q.rubric.ok_or_else(|| {
                        anyhow::anyhow!("question '{}': missing 'rubric' for {kind}", q.id)
                    })?,
                },
                QuestionKind::Code => AnswerKey::Rubric {
                    text: q.rubric.unwrap_or_default(),
                },
            };

            Ok(Question {
                id: q.id,
                text: q.text,
                kind,
                key,
                points: q.points,
                topics: q.topics,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Exam {
        id: parsed.exam.id,
        title: parsed.exam.title,
        description: parsed.exam.description,
        questions,
        grading: parsed.exam.grading.unwrap_or_default(),
        passing_score: parsed.exam.passing_score,
    })
}

/// Parse a single TOML file into a batch of [`Submission`]s.
pub fn parse_submissions(path: &Path) -> Result<Vec<Submission>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submissions file: {}", path.display()))?;
    parse_submissions_str(&content, path)
}

/// Parse a TOML string into submissions (useful for testing).
pub fn parse_submissions_str(content: &str, source_path: &Path) -> Result<Vec<Submission>> {
    let parsed: TomlSubmissionsFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    parsed
        .submissions
        .into_iter()
        .map(|s| {
            let submitted_at = match s.submitted_at {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .with_context(|| {
                        format!(
                            "submission '{}': invalid submitted_at '{raw}'",
                            s.student_id
                        )
                    })?,
                None => Utc::now(),
            };
            Ok(Submission {
                exam_id: s.exam_id,
                student_id: s.student_id,
                student_name: s.student_name,
                answers: s
                    .answers
                    .into_iter()
                    .map(|a| Answer {
                        question_id: a.question_id,
                        response: a.response,
                    })
                    .collect(),
                submitted_at,
            })
        })
        .collect()
}

/// Recursively load all `.toml` exam files from a directory.
pub fn load_exam_directory(dir: &Path) -> Result<Vec<Exam>> {
    let mut exams = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            exams.extend(load_exam_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_exam(&path) {
                Ok(exam) => exams.push(exam),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(exams)
}

/// A warning from exam validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question id (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

fn warn(question_id: Option<&str>, message: impl Into<String>) -> ValidationWarning {
    ValidationWarning {
        question_id: question_id.map(str::to_string),
        message: message.into(),
    }
}

fn key_matches(kind: QuestionKind, key: &AnswerKey) -> bool {
    matches!(
        (kind, key),
        (
            QuestionKind::MultipleChoice | QuestionKind::TrueFalse | QuestionKind::ShortAnswer,
            AnswerKey::Literal { .. }
        ) | (QuestionKind::Numerical, AnswerKey::Numeric { .. })
            | (QuestionKind::Essay | QuestionKind::Code, AnswerKey::Rubric { .. })
    )
}

/// Validate an exam for the problems that would surface during grading.
pub fn validate_exam(exam: &Exam) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if exam.questions.is_empty() {
        warnings.push(warn(None, "exam has no questions"));
    } else if exam.total_points() <= 0.0 {
        warnings.push(warn(None, "exam has zero total points"));
    }

    if !(0.0..=1.0).contains(&exam.grading.strictness) {
        warnings.push(warn(
            None,
            format!(
                "strictness {} is outside [0.0, 1.0]",
                exam.grading.strictness
            ),
        ));
    }
    if !(0.0..=100.0).contains(&exam.passing_score) {
        warnings.push(warn(
            None,
            format!("passing score {} is outside [0, 100]", exam.passing_score),
        ));
    }

    let mut seen_ids = std::collections::HashSet::new();
    for question in &exam.questions {
        if !seen_ids.insert(&question.id) {
            warnings.push(warn(
                Some(&question.id),
                format!("duplicate question id: {}", question.id),
            ));
        }
        if question.points <= 0.0 {
            warnings.push(warn(
                Some(&question.id),
                format!("points must be positive, got {}", question.points),
            ));
        }
        if !key_matches(question.kind, &question.key) {
            warnings.push(warn(
                Some(&question.id),
                format!("answer key does not match question kind '{}'", question.kind),
            ));
        }
        if question.kind == QuestionKind::TrueFalse {
            if let AnswerKey::Literal { value, .. } = &question.key {
                if crate::evaluate::parse_truthy(value).is_none() {
                    warnings.push(warn(
                        Some(&question.id),
                        format!("'{value}' is not a recognizable true/false answer"),
                    ));
                }
            }
        }
        if question.kind == QuestionKind::Essay {
            if let AnswerKey::Rubric { text } = &question.key {
                if text.trim().is_empty() {
                    warnings.push(warn(Some(&question.id), "essay rubric is empty"));
                }
            }
        }
    }

    warnings
}
