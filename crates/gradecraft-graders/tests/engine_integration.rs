//! End-to-end grading through the engine with the mock backend.
//!
//! Exercises the full path: submission grader → retrying client → backend,
//! including holistic summaries and recovery from transient failures.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use gradecraft_core::adapter::{RetryPolicy, SemanticClient};
use gradecraft_core::error::ServiceError;
use gradecraft_core::grader::SubmissionGrader;
use gradecraft_core::model::{
    Answer, AnswerKey, Exam, GradingConfig, Question, QuestionKind, Submission,
};
use gradecraft_core::traits::Assessment;
use gradecraft_graders::mock::MockGrader;

fn exam() -> Exam {
    Exam {
        id: "hist-101".into(),
        title: "History 101 Final".into(),
        description: String::new(),
        questions: vec![
            Question {
                id: "q1".into(),
                text: "In what year did the French Revolution begin?".into(),
                kind: QuestionKind::Numerical,
                key: AnswerKey::Numeric {
                    value: 1789.0,
                    tolerance: Some(0.0),
                },
                points: 5.0,
                topics: vec!["revolutions".into()],
            },
            Question {
                id: "q2".into(),
                text: "Explain the causes of the French Revolution.".into(),
                kind: QuestionKind::Essay,
                key: AnswerKey::Rubric {
                    text: "Award points for fiscal crisis, social inequality, and Enlightenment ideas.".into(),
                },
                points: 10.0,
                topics: vec!["revolutions".into()],
            },
        ],
        grading: GradingConfig::default(),
        passing_score: 60.0,
    }
}

fn submission() -> Submission {
    Submission {
        exam_id: "hist-101".into(),
        student_id: "s-001".into(),
        student_name: "Ada Lovelace".into(),
        answers: vec![
            Answer {
                question_id: "q1".into(),
                response: "1789".into(),
            },
            Answer {
                question_id: "q2".into(),
                response: "Debt from wars and deep social inequality.".into(),
            },
        ],
        submitted_at: Utc.with_ymd_and_hms(2026, 5, 11, 9, 30, 0).unwrap(),
    }
}

fn assessment(score: f64) -> Assessment {
    Assessment {
        score_fraction: score,
        feedback: "Names the fiscal crisis and inequality; Enlightenment ideas missing.".into(),
        strengths: vec!["identifies fiscal crisis".into()],
        weaknesses: vec!["no Enlightenment context".into()],
        suggestions: vec!["connect philosophy to politics".into()],
        confidence: 0.85,
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        initial_delay: Duration::from_millis(50),
        max_delay: Duration::from_secs(1),
        call_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn essay_graded_via_mock_backend() {
    let mock = Arc::new(
        MockGrader::with_fixed(assessment(0.8)).with_summary("Strong start; study the Enlightenment."),
    );
    let grader =
        SubmissionGrader::with_semantic(SemanticClient::new(mock.clone(), fast_policy()));

    let exam = exam();
    let result = grader
        .grade_submission(&exam, &submission(), &exam.grading)
        .await
        .unwrap();

    assert!((result.points_earned - 13.0).abs() < 1e-9);
    assert_eq!(result.overall_feedback, "Strong start; study the Enlightenment.");

    let essay = result.question_result("q2").unwrap();
    assert!((essay.points_earned - 8.0).abs() < 1e-9);
    assert_eq!(essay.confidence, Some(0.85));
    assert_eq!(essay.suggestions, vec!["connect philosophy to politics"]);

    // One grading call for the essay, one summary call.
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn transient_backend_failures_are_survived() {
    let mock = Arc::new(MockGrader::with_fixed(assessment(0.8)).with_failures(vec![
        ServiceError::NetworkError("connection reset".into()),
        ServiceError::RateLimited { retry_after_ms: 20 },
    ]));
    let grader =
        SubmissionGrader::with_semantic(SemanticClient::new(mock.clone(), fast_policy()));

    let exam = exam();
    let result = grader
        .grade_submission(&exam, &submission(), &exam.grading)
        .await
        .unwrap();

    let essay = result.question_result("q2").unwrap();
    assert!((essay.points_earned - 8.0).abs() < 1e-9);
    assert!(!result.degraded);
}

#[tokio::test]
async fn dead_backend_holds_essay_for_manual_review() {
    let mock = Arc::new(MockGrader::with_fixed(assessment(0.8)).with_failures(vec![
        ServiceError::AuthenticationFailed("bad key".into()),
        ServiceError::AuthenticationFailed("bad key".into()),
    ]));
    let grader =
        SubmissionGrader::with_semantic(SemanticClient::new(mock.clone(), fast_policy()));

    let exam = exam();
    let result = grader
        .grade_submission(&exam, &submission(), &exam.grading)
        .await
        .unwrap();

    let essay = result.question_result("q2").unwrap();
    assert_eq!(essay.points_earned, 0.0);
    assert_eq!(essay.confidence, Some(0.0));
    assert!(essay.feedback.contains("manual review"));

    // The numerical question is untouched by the outage.
    assert!(result.question_result("q1").unwrap().correct);
    // Submission grading itself succeeded; unavailability is not an error.
    assert!((result.percentage - (5.0 / 15.0 * 100.0)).abs() < 1e-9);
}

#[tokio::test]
async fn ai_disabled_config_never_calls_backend() {
    let mock = Arc::new(MockGrader::with_fixed(assessment(0.8)));
    let grader =
        SubmissionGrader::with_semantic(SemanticClient::new(mock.clone(), fast_policy()));

    let exam = exam();
    let config = GradingConfig {
        ai_grading: false,
        ..exam.grading.clone()
    };
    let result = grader
        .grade_submission(&exam, &submission(), &config)
        .await
        .unwrap();

    assert_eq!(mock.call_count(), 0);
    assert_eq!(result.question_result("q2").unwrap().points_earned, 0.0);
}
