//! Per-question-type answer evaluators.
//!
//! Dispatch is a closed match on [`QuestionKind`]; adding a question type
//! means adding a variant and an arm here. Every evaluator upholds the same
//! contract: points are clamped to `[0, question.points]`, the correctness
//! flag is set iff full credit was awarded, and feedback is never empty.

use crate::adapter::{SemanticClient, SemanticOutcome};
use crate::model::{AnswerKey, GradingConfig, Question, QuestionKind};
use crate::results::QuestionResult;
use crate::traits::{AssessRequest, Assessment};

/// Default relative tolerance for numeric answers before strictness scaling.
pub const BASE_TOLERANCE: f64 = 0.05;

/// Relative error beyond which a numeric answer earns no credit.
pub const MAX_RELATIVE_ERROR: f64 = 0.5;

/// Similarity below which a short answer earns no credit.
const SIMILARITY_FLOOR: f64 = 0.4;

/// Full-credit similarity threshold at strictness 0; strictness raises it.
const FULL_CREDIT_FLOOR: f64 = 0.82;
const FULL_CREDIT_SPAN: f64 = 0.13;

/// Minimum adapter confidence for an AI score to override the lexical one.
const AI_CONFIDENCE_FLOOR: f64 = 0.5;

/// Code submissions shorter than this are rejected without a syntax check.
const MIN_CODE_LENGTH: usize = 10;

/// Lowercase and collapse runs of whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Interpret common spellings of a boolean answer.
pub fn parse_truthy(text: &str) -> Option<bool> {
    match normalize(text).as_str() {
        "true" | "t" | "yes" | "y" | "1" | "correct" => Some(true),
        "false" | "f" | "no" | "n" | "0" | "incorrect" => Some(false),
        _ => None,
    }
}

/// Character-level similarity ratio in [0, 1].
pub fn lexical_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    similar::TextDiff::from_chars(a, b).ratio() as f64
}

/// Evaluate one answer against its question.
///
/// `semantic` is consulted only for short-answer and essay questions, and
/// only when the config enables AI grading. A blank response is recorded as
/// unanswered rather than graded.
pub async fn evaluate_answer(
    question: &Question,
    response: &str,
    config: &GradingConfig,
    semantic: Option<&SemanticClient>,
) -> QuestionResult {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return QuestionResult::unanswered(question);
    }

    match question.kind {
        QuestionKind::MultipleChoice => choice(question, trimmed),
        QuestionKind::TrueFalse => true_false(question, trimmed),
        QuestionKind::Numerical => numerical(question, trimmed, config),
        QuestionKind::ShortAnswer => short_answer(question, trimmed, config, semantic).await,
        QuestionKind::Essay => essay(question, trimmed, config, semantic).await,
        QuestionKind::Code => code(question, trimmed),
    }
}

fn key_mismatch(question: &Question, response: &str) -> QuestionResult {
    QuestionResult::failed(
        question,
        Some(response),
        &format!(
            "answer key does not match question kind '{}'",
            question.kind
        ),
    )
}

fn choice(question: &Question, response: &str) -> QuestionResult {
    let AnswerKey::Literal { value, accepted } = &question.key else {
        return key_mismatch(question, response);
    };

    let normalized = normalize(response);
    let matched = std::iter::once(value.as_str())
        .chain(accepted.iter().map(String::as_str))
        .any(|candidate| normalize(candidate) == normalized);

    if matched {
        QuestionResult::graded(question, response, question.points, "Correct.")
    } else {
        QuestionResult::graded(
            question,
            response,
            0.0,
            format!("Incorrect. The correct answer is: {value}"),
        )
    }
}

fn true_false(question: &Question, response: &str) -> QuestionResult {
    let AnswerKey::Literal { value, .. } = &question.key else {
        return key_mismatch(question, response);
    };
    let Some(expected) = parse_truthy(value) else {
        return QuestionResult::failed(
            question,
            Some(response),
            "the answer key is not a recognizable true/false value",
        );
    };

    match parse_truthy(response) {
        None => QuestionResult::graded(
            question,
            response,
            0.0,
            "Could not interpret the response; answer true or false.",
        ),
        Some(given) if given == expected => {
            QuestionResult::graded(question, response, question.points, "Correct.")
        }
        Some(_) => QuestionResult::graded(
            question,
            response,
            0.0,
            format!("Incorrect. The correct answer is: {value}"),
        ),
    }
}

fn numerical(question: &Question, response: &str, config: &GradingConfig) -> QuestionResult {
    let AnswerKey::Numeric { value, tolerance } = &question.key else {
        return key_mismatch(question, response);
    };
    let value = *value;
    let tolerance_override = *tolerance;

    let Ok(student) = response.parse::<f64>() else {
        return QuestionResult::graded(
            question,
            response,
            0.0,
            "Non-numeric response; a numeric answer was expected.",
        );
    };

    // An exactly equal response is full credit no matter what the tolerance
    // or strictness say.
    if student == value {
        return QuestionResult::graded(question, response, question.points, "Correct.");
    }

    let scale = value.abs();
    let error = if scale > 0.0 {
        (student - value).abs() / scale
    } else {
        (student - value).abs()
    };
    let tolerance = tolerance_override
        .unwrap_or(BASE_TOLERANCE * (1.0 - config.strictness))
        .max(0.0);

    if error <= tolerance {
        return QuestionResult::graded(
            question,
            response,
            question.points,
            format!("Correct (within tolerance of {value})."),
        );
    }

    if config.partial_credit && error < MAX_RELATIVE_ERROR && tolerance < MAX_RELATIVE_ERROR {
        // Linear ramp from the tolerance boundary down to zero credit at
        // MAX_RELATIVE_ERROR.
        let fraction = 1.0 - (error - tolerance) / (MAX_RELATIVE_ERROR - tolerance);
        return QuestionResult::graded(
            question,
            response,
            question.points * fraction,
            format!("Close, but outside tolerance. The expected answer is {value}."),
        );
    }

    QuestionResult::graded(
        question,
        response,
        0.0,
        format!("Incorrect. The expected answer is {value}."),
    )
}

/// Map a similarity/score fraction to a credit fraction, gated by
/// strictness: higher strictness raises the full-credit threshold and
/// steepens the partial band.
fn credit_fraction(similarity: f64, config: &GradingConfig) -> f64 {
    let full_at = FULL_CREDIT_FLOOR + FULL_CREDIT_SPAN * config.strictness.clamp(0.0, 1.0);
    if similarity >= full_at {
        1.0
    } else if !config.partial_credit || similarity < SIMILARITY_FLOOR {
        0.0
    } else {
        (similarity - SIMILARITY_FLOOR) / (full_at - SIMILARITY_FLOOR)
    }
}

fn assessment_suggestions(assessment: &Assessment) -> Vec<String> {
    if !assessment.suggestions.is_empty() {
        assessment.suggestions.clone()
    } else {
        assessment.weaknesses.clone()
    }
}

fn assessment_feedback(assessment: &Assessment) -> String {
    if assessment.feedback.trim().is_empty() {
        "Graded by the semantic grading service.".into()
    } else {
        assessment.feedback.clone()
    }
}

async fn short_answer(
    question: &Question,
    response: &str,
    config: &GradingConfig,
    semantic: Option<&SemanticClient>,
) -> QuestionResult {
    let AnswerKey::Literal { value, accepted } = &question.key else {
        return key_mismatch(question, response);
    };

    let normalized = normalize(response);
    let lexical = std::iter::once(value.as_str())
        .chain(accepted.iter().map(String::as_str))
        .map(|candidate| lexical_similarity(&normalize(candidate), &normalized))
        .fold(0.0_f64, f64::max);

    let mut score = lexical;
    let mut assessment = None;

    if config.ai_grading {
        if let Some(client) = semantic {
            let reference = std::iter::once(value.as_str())
                .chain(accepted.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join("; ");
            let request = AssessRequest {
                question_text: question.text.clone(),
                reference,
                response: response.to_string(),
                kind: question.kind,
                points_possible: question.points,
                strictness: config.strictness,
            };
            match client.grade(&request).await {
                SemanticOutcome::Graded(a) => {
                    // The AI opinion takes precedence only when confident.
                    if a.confidence >= AI_CONFIDENCE_FLOOR {
                        score = a.score_fraction;
                    }
                    assessment = Some(a);
                }
                SemanticOutcome::Unavailable { reason } => {
                    tracing::warn!(
                        question = %question.id,
                        "semantic grading unavailable, using lexical score: {reason}"
                    );
                }
            }
        }
    }

    let fraction = credit_fraction(score, config);
    let feedback = match &assessment {
        Some(a) => assessment_feedback(a),
        None => {
            if fraction >= 1.0 {
                "Correct.".to_string()
            } else if fraction > 0.0 {
                format!("Partially correct; close to the expected answer \"{value}\".")
            } else {
                format!("Incorrect. Expected: {value}")
            }
        }
    };

    let mut result =
        QuestionResult::graded(question, response, question.points * fraction, feedback);
    if let Some(a) = assessment {
        result = result
            .with_suggestions(assessment_suggestions(&a))
            .with_confidence(a.confidence);
    }
    result
}

async fn essay(
    question: &Question,
    response: &str,
    config: &GradingConfig,
    semantic: Option<&SemanticClient>,
) -> QuestionResult {
    let AnswerKey::Rubric { text: rubric } = &question.key else {
        return key_mismatch(question, response);
    };

    // Never guess an essay grade: without the service, the answer is held
    // for manual review at zero points and zero confidence.
    let Some(client) = semantic.filter(|_| config.ai_grading) else {
        return QuestionResult::graded(
            question,
            response,
            0.0,
            "Essay grading requires manual review: AI grading is disabled.",
        )
        .with_confidence(0.0);
    };

    let request = AssessRequest {
        question_text: question.text.clone(),
        reference: rubric.clone(),
        response: response.to_string(),
        kind: question.kind,
        points_possible: question.points,
        strictness: config.strictness,
    };

    match client.grade(&request).await {
        SemanticOutcome::Graded(a) => QuestionResult::graded(
            question,
            response,
            question.points * a.score_fraction,
            assessment_feedback(&a),
        )
        .with_suggestions(assessment_suggestions(&a))
        .with_confidence(a.confidence),
        SemanticOutcome::Unavailable { reason } => {
            tracing::warn!(question = %question.id, "essay grading unavailable: {reason}");
            QuestionResult::graded(
                question,
                response,
                0.0,
                format!(
                    "Essay grading requires manual review: grading service unavailable ({reason})."
                ),
            )
            .with_confidence(0.0)
        }
    }
}

fn code(question: &Question, response: &str) -> QuestionResult {
    if response.len() < MIN_CODE_LENGTH {
        return QuestionResult::graded(
            question,
            response,
            0.0,
            "Code submission too short to evaluate.",
        );
    }

    match check_syntax(response) {
        Ok(()) => QuestionResult::graded(
            question,
            response,
            question.points,
            "Syntax check passed. Full evaluation requires test execution.",
        ),
        Err(diagnostic) => {
            QuestionResult::graded(question, response, 0.0, format!("Syntax error: {diagnostic}"))
        }
    }
}

/// Structural syntax check: balanced delimiters outside strings and
/// comments. A placeholder for execution-based checking, not a parser.
pub fn check_syntax(code: &str) -> Result<(), String> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut line = 1usize;
    let mut in_string: Option<char> = None;
    let mut in_line_comment = false;
    let mut chars = code.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
            in_line_comment = false;
            continue;
        }
        if in_line_comment {
            continue;
        }
        if let Some(quote) = in_string {
            if c == '\\' {
                chars.next();
            } else if c == quote {
                in_string = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => in_string = Some(c),
            '#' => in_line_comment = true,
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                in_line_comment = true;
            }
            '(' | '[' | '{' => stack.push((c, line)),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, open_line)) => {
                        return Err(format!(
                            "mismatched '{c}' on line {line} (unclosed '{open}' from line {open_line})"
                        ))
                    }
                    None => return Err(format!("unexpected '{c}' on line {line}")),
                }
            }
            _ => {}
        }
    }

    if in_string.is_some() {
        return Err("unterminated string literal".into());
    }
    if let Some((open, open_line)) = stack.pop() {
        return Err(format!("unclosed '{open}' from line {open_line}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::RetryPolicy;
    use crate::error::ServiceError;
    use crate::traits::{SemanticGrader, SummaryRequest};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    fn question(kind: QuestionKind, key: AnswerKey, points: f64) -> Question {
        Question {
            id: "q1".into(),
            text: "Test question".into(),
            kind,
            key,
            points,
            topics: vec![],
        }
    }

    fn config(strictness: f64, partial_credit: bool, ai_grading: bool) -> GradingConfig {
        GradingConfig {
            strictness,
            partial_credit,
            ai_grading,
        }
    }

    /// Always returns the same assessment.
    struct FixedGrader(Assessment);

    #[async_trait]
    impl SemanticGrader for FixedGrader {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn grade(&self, _request: &AssessRequest) -> anyhow::Result<Assessment> {
            Ok(self.0.clone())
        }

        async fn summarize(&self, _request: &SummaryRequest) -> anyhow::Result<String> {
            Ok("Keep it up.".into())
        }
    }

    /// Always fails with a permanent error.
    struct BrokenGrader;

    #[async_trait]
    impl SemanticGrader for BrokenGrader {
        fn name(&self) -> &str {
            "broken"
        }

        async fn grade(&self, _request: &AssessRequest) -> anyhow::Result<Assessment> {
            Err(ServiceError::AuthenticationFailed("no key".into()).into())
        }

        async fn summarize(&self, _request: &SummaryRequest) -> anyhow::Result<String> {
            Err(ServiceError::AuthenticationFailed("no key".into()).into())
        }
    }

    fn client(grader: impl SemanticGrader + 'static) -> SemanticClient {
        SemanticClient::new(
            Arc::new(grader),
            RetryPolicy {
                max_retries: 0,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(10),
                call_timeout: Duration::from_secs(5),
            },
        )
    }

    fn assessment(score: f64, confidence: f64) -> Assessment {
        Assessment {
            score_fraction: score,
            feedback: "Semantic feedback.".into(),
            strengths: vec!["clear".into()],
            weaknesses: vec!["shallow".into()],
            suggestions: vec![],
            confidence,
        }
    }

    #[test]
    fn normalize_collapses_case_and_whitespace() {
        assert_eq!(normalize("  The  Mitochondria\n"), "the mitochondria");
    }

    #[test]
    fn truthy_parsing() {
        assert_eq!(parse_truthy("Yes"), Some(true));
        assert_eq!(parse_truthy("1"), Some(true));
        assert_eq!(parse_truthy("no"), Some(false));
        assert_eq!(parse_truthy("0"), Some(false));
        assert_eq!(parse_truthy("maybe"), None);
    }

    #[tokio::test]
    async fn blank_response_is_unanswered() {
        let q = question(
            QuestionKind::MultipleChoice,
            AnswerKey::Literal {
                value: "B".into(),
                accepted: vec![],
            },
            2.0,
        );
        let result = evaluate_answer(&q, "   ", &config(0.7, true, false), None).await;
        assert_eq!(result.status, crate::results::QuestionStatus::Unanswered);
        assert_eq!(result.points_earned, 0.0);
    }

    #[tokio::test]
    async fn multiple_choice_is_case_insensitive_and_binary() {
        let q = question(
            QuestionKind::MultipleChoice,
            AnswerKey::Literal {
                value: "B".into(),
                accepted: vec![],
            },
            2.0,
        );
        let cfg = config(0.7, true, false);

        let right = evaluate_answer(&q, "b", &cfg, None).await;
        assert!(right.correct);
        assert!((right.points_earned - 2.0).abs() < f64::EPSILON);

        let wrong = evaluate_answer(&q, "c", &cfg, None).await;
        assert!(!wrong.correct);
        assert_eq!(wrong.points_earned, 0.0);
        assert!(wrong.feedback.contains("correct answer"));
    }

    #[tokio::test]
    async fn true_false_accepts_synonyms() {
        let q = question(
            QuestionKind::TrueFalse,
            AnswerKey::Literal {
                value: "true".into(),
                accepted: vec![],
            },
            1.0,
        );
        let cfg = config(0.7, true, false);

        for response in ["true", "T", "yes", "Y", "1"] {
            let result = evaluate_answer(&q, response, &cfg, None).await;
            assert!(result.correct, "response {response:?} should be correct");
        }
        for response in ["false", "no", "0"] {
            let result = evaluate_answer(&q, response, &cfg, None).await;
            assert!(!result.correct);
            assert_eq!(result.points_earned, 0.0);
        }

        let garbled = evaluate_answer(&q, "perhaps", &cfg, None).await;
        assert_eq!(garbled.points_earned, 0.0);
        assert!(garbled.feedback.contains("true or false"));
    }

    #[tokio::test]
    async fn numeric_exact_match_always_full_credit() {
        let q = question(
            QuestionKind::Numerical,
            AnswerKey::Numeric {
                value: 4.0,
                tolerance: Some(0.0),
            },
            5.0,
        );
        // Maximum strictness, zero tolerance: exact equality still wins.
        let result = evaluate_answer(&q, "4", &config(1.0, false, false), None).await;
        assert!(result.correct);
        assert!((result.points_earned - 5.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn numeric_non_numeric_response_scores_zero() {
        let q = question(
            QuestionKind::Numerical,
            AnswerKey::Numeric {
                value: 4.0,
                tolerance: None,
            },
            5.0,
        );
        let result = evaluate_answer(&q, "four", &config(0.7, true, false), None).await;
        assert_eq!(result.points_earned, 0.0);
        assert!(result.feedback.contains("Non-numeric"));
    }

    #[tokio::test]
    async fn numeric_within_derived_tolerance_is_full_credit() {
        let q = question(
            QuestionKind::Numerical,
            AnswerKey::Numeric {
                value: 100.0,
                tolerance: None,
            },
            5.0,
        );
        // strictness 0.5 => tolerance 0.025, so 102 (2% off) is inside.
        let result = evaluate_answer(&q, "102", &config(0.5, true, false), None).await;
        assert!(result.correct);
    }

    #[tokio::test]
    async fn numeric_partial_credit_between_zero_and_full() {
        let q = question(
            QuestionKind::Numerical,
            AnswerKey::Numeric {
                value: 4.0,
                tolerance: None,
            },
            5.0,
        );
        let result = evaluate_answer(&q, "4.5", &config(0.5, true, false), None).await;
        assert!(!result.correct);
        assert!(
            result.points_earned > 0.0 && result.points_earned < 5.0,
            "expected partial credit, got {}",
            result.points_earned
        );
    }

    #[tokio::test]
    async fn numeric_partial_credit_disabled_is_binary() {
        let q = question(
            QuestionKind::Numerical,
            AnswerKey::Numeric {
                value: 4.0,
                tolerance: None,
            },
            5.0,
        );
        let result = evaluate_answer(&q, "4.5", &config(0.5, false, false), None).await;
        assert_eq!(result.points_earned, 0.0);
    }

    #[tokio::test]
    async fn numeric_far_off_scores_zero() {
        let q = question(
            QuestionKind::Numerical,
            AnswerKey::Numeric {
                value: 4.0,
                tolerance: None,
            },
            5.0,
        );
        let result = evaluate_answer(&q, "40", &config(0.5, true, false), None).await;
        assert_eq!(result.points_earned, 0.0);
    }

    #[tokio::test]
    async fn short_answer_exact_match_full_credit() {
        let q = question(
            QuestionKind::ShortAnswer,
            AnswerKey::Literal {
                value: "Photosynthesis".into(),
                accepted: vec![],
            },
            3.0,
        );
        let result = evaluate_answer(&q, "photosynthesis", &config(1.0, true, false), None).await;
        assert!(result.correct);
    }

    #[tokio::test]
    async fn short_answer_strictness_gates_typos() {
        let q = question(
            QuestionKind::ShortAnswer,
            AnswerKey::Literal {
                value: "photosynthesis".into(),
                accepted: vec![],
            },
            3.0,
        );

        // One-letter typo: similarity ~0.93, above the lenient threshold
        // but below the strict one.
        let lenient = evaluate_answer(&q, "photosynthesys", &config(0.0, true, false), None).await;
        assert!(lenient.correct);

        let strict = evaluate_answer(&q, "photosynthesys", &config(1.0, true, false), None).await;
        assert!(!strict.correct);
        assert!(strict.points_earned > 0.0);
    }

    #[tokio::test]
    async fn short_answer_unrelated_scores_zero() {
        let q = question(
            QuestionKind::ShortAnswer,
            AnswerKey::Literal {
                value: "photosynthesis".into(),
                accepted: vec![],
            },
            3.0,
        );
        let result = evaluate_answer(&q, "gravity", &config(0.5, true, false), None).await;
        assert_eq!(result.points_earned, 0.0);
        assert!(result.feedback.contains("Expected"));
    }

    #[tokio::test]
    async fn short_answer_accepts_alternatives() {
        let q = question(
            QuestionKind::ShortAnswer,
            AnswerKey::Literal {
                value: "water".into(),
                accepted: vec!["h2o".into()],
            },
            3.0,
        );
        let result = evaluate_answer(&q, "H2O", &config(1.0, true, false), None).await;
        assert!(result.correct);
    }

    #[tokio::test]
    async fn short_answer_confident_ai_overrides_lexical() {
        let q = question(
            QuestionKind::ShortAnswer,
            AnswerKey::Literal {
                value: "the powerhouse of the cell".into(),
                accepted: vec![],
            },
            4.0,
        );
        // "mitochondria" is lexically far from the key but semantically right.
        let semantic = client(FixedGrader(assessment(1.0, 0.9)));
        let result =
            evaluate_answer(&q, "mitochondria", &config(0.5, true, true), Some(&semantic)).await;
        assert!(result.correct);
        assert_eq!(result.confidence, Some(0.9));
    }

    #[tokio::test]
    async fn short_answer_unconfident_ai_is_ignored() {
        let q = question(
            QuestionKind::ShortAnswer,
            AnswerKey::Literal {
                value: "photosynthesis".into(),
                accepted: vec![],
            },
            4.0,
        );
        // The AI says full marks but with low confidence; the lexical score
        // (exact match) would also be full, so use a wrong response.
        let semantic = client(FixedGrader(assessment(1.0, 0.1)));
        let result =
            evaluate_answer(&q, "gravity", &config(0.5, true, true), Some(&semantic)).await;
        assert_eq!(result.points_earned, 0.0);
    }

    #[tokio::test]
    async fn short_answer_falls_back_when_service_unavailable() {
        let q = question(
            QuestionKind::ShortAnswer,
            AnswerKey::Literal {
                value: "photosynthesis".into(),
                accepted: vec![],
            },
            4.0,
        );
        let semantic = client(BrokenGrader);
        let result = evaluate_answer(
            &q,
            "photosynthesis",
            &config(0.5, true, true),
            Some(&semantic),
        )
        .await;
        // Lexical exact match carries it despite the dead service.
        assert!(result.correct);
    }

    #[tokio::test]
    async fn essay_without_service_requires_manual_review() {
        let q = question(
            QuestionKind::Essay,
            AnswerKey::Rubric {
                text: "Award points for cause and effect.".into(),
            },
            10.0,
        );
        let result = evaluate_answer(
            &q,
            "The industrial revolution changed everything.",
            &config(0.5, true, false),
            None,
        )
        .await;
        assert_eq!(result.points_earned, 0.0);
        assert_eq!(result.confidence, Some(0.0));
        assert!(result.feedback.contains("manual review"));
    }

    #[tokio::test]
    async fn essay_scores_by_assessment_fraction() {
        let q = question(
            QuestionKind::Essay,
            AnswerKey::Rubric {
                text: "Award points for cause and effect.".into(),
            },
            10.0,
        );
        let semantic = client(FixedGrader(assessment(0.7, 0.85)));
        let result = evaluate_answer(
            &q,
            "Steam power reshaped labor and cities.",
            &config(0.5, true, true),
            Some(&semantic),
        )
        .await;
        assert!((result.points_earned - 7.0).abs() < 1e-9);
        assert!(!result.correct);
        assert_eq!(result.confidence, Some(0.85));
        assert_eq!(result.suggestions, vec!["shallow".to_string()]);
    }

    #[tokio::test]
    async fn essay_service_failure_requires_manual_review() {
        let q = question(
            QuestionKind::Essay,
            AnswerKey::Rubric {
                text: "Rubric.".into(),
            },
            10.0,
        );
        let semantic = client(BrokenGrader);
        let result = evaluate_answer(
            &q,
            "A long and thoughtful essay.",
            &config(0.5, true, true),
            Some(&semantic),
        )
        .await;
        assert_eq!(result.points_earned, 0.0);
        assert_eq!(result.confidence, Some(0.0));
        assert!(result.feedback.contains("manual review"));
    }

    #[tokio::test]
    async fn code_valid_syntax_full_credit() {
        let q = question(
            QuestionKind::Code,
            AnswerKey::Rubric {
                text: String::new(),
            },
            5.0,
        );
        let code = "def add(a, b):\n    return (a + b)\n";
        let result = evaluate_answer(&q, code, &config(0.5, true, false), None).await;
        assert!(result.correct);
    }

    #[tokio::test]
    async fn code_unbalanced_scores_zero() {
        let q = question(
            QuestionKind::Code,
            AnswerKey::Rubric {
                text: String::new(),
            },
            5.0,
        );
        let code = "def add(a, b:\n    return a + b\n";
        let result = evaluate_answer(&q, code, &config(0.5, true, false), None).await;
        assert_eq!(result.points_earned, 0.0);
        assert!(result.feedback.contains("Syntax error"));
    }

    #[tokio::test]
    async fn key_mismatch_is_contained_as_error() {
        let q = question(
            QuestionKind::Numerical,
            AnswerKey::Literal {
                value: "4".into(),
                accepted: vec![],
            },
            5.0,
        );
        let result = evaluate_answer(&q, "4", &config(0.5, true, false), None).await;
        assert_eq!(result.status, crate::results::QuestionStatus::Error);
        assert_eq!(result.points_earned, 0.0);
    }

    #[test]
    fn syntax_check_ignores_strings_and_comments() {
        assert!(check_syntax("print(\"(unbalanced in string\")  # ( comment\n").is_ok());
        assert!(check_syntax("let x = vec![1, 2, 3]; // trailing ( comment\n").is_ok());
        assert!(check_syntax("fn f() { (}) }").is_err());
        assert!(check_syntax("open(").is_err());
    }

    #[test]
    fn credit_fraction_is_monotonic_in_strictness() {
        let lenient = credit_fraction(0.85, &config(0.0, true, true));
        let strict = credit_fraction(0.85, &config(1.0, true, true));
        assert!(lenient >= strict);
        assert!((lenient - 1.0).abs() < f64::EPSILON);
        assert!(strict < 1.0);
    }
}
