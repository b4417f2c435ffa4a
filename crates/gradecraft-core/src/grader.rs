//! Submission grading orchestration.
//!
//! Validates a submission against its exam, runs the per-question
//! evaluators in exam order, and aggregates the results. Grading one
//! submission is sequential across its questions; independent submissions
//! may be graded concurrently via [`SubmissionGrader::grade_batch`].

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::adapter::SemanticClient;
use crate::error::GradeError;
use crate::evaluate::evaluate_answer;
use crate::model::{Exam, GradingConfig, Submission};
use crate::results::{QuestionResult, QuestionStatus, SubmissionResult};
use crate::traits::{SummaryLine, SummaryRequest};

/// Tuning knobs for result synthesis.
#[derive(Debug, Clone)]
pub struct GraderOptions {
    /// How many of the weakest per-question feedback entries to fold into
    /// the overall feedback when no holistic summary is available.
    pub weakest_feedback: usize,
}

impl Default for GraderOptions {
    fn default() -> Self {
        Self {
            weakest_feedback: 3,
        }
    }
}

/// Grades submissions against an exam.
pub struct SubmissionGrader {
    semantic: Option<Arc<SemanticClient>>,
    options: GraderOptions,
}

impl Default for SubmissionGrader {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionGrader {
    /// A grader with no semantic backend: essay questions are held for
    /// manual review and short answers use lexical scoring only.
    pub fn new() -> Self {
        Self {
            semantic: None,
            options: GraderOptions::default(),
        }
    }

    pub fn with_semantic(client: SemanticClient) -> Self {
        Self {
            semantic: Some(Arc::new(client)),
            options: GraderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GraderOptions) -> Self {
        self.options = options;
        self
    }

    /// Grade one submission.
    ///
    /// Fails fast with [`GradeError::InvalidSubmission`] on referential
    /// integrity violations and [`GradeError::Configuration`] when the exam
    /// has zero total points; in both cases no evaluator runs. A single
    /// evaluator failure never aborts the submission: that question scores
    /// zero with an error marker and the result is flagged degraded.
    pub async fn grade_submission(
        &self,
        exam: &Exam,
        submission: &Submission,
        config: &GradingConfig,
    ) -> Result<SubmissionResult, GradeError> {
        validate_submission(exam, submission)?;

        let points_possible = exam.total_points();
        if points_possible <= 0.0 {
            return Err(GradeError::Configuration(format!(
                "exam '{}' has zero total points",
                exam.id
            )));
        }

        let mut question_results = Vec::with_capacity(exam.questions.len());
        for question in &exam.questions {
            let result = match submission.answer(&question.id) {
                None => QuestionResult::unanswered(question),
                Some(answer) => {
                    evaluate_answer(question, &answer.response, config, self.semantic.as_deref())
                        .await
                }
            };
            if result.status == QuestionStatus::Error {
                tracing::warn!(
                    student = %submission.student_id,
                    question = %question.id,
                    "evaluator failed, scoring zero: {}",
                    result.feedback
                );
            }
            question_results.push(result);
        }

        let points_earned: f64 = question_results.iter().map(|r| r.points_earned).sum();
        let overall_feedback = self
            .overall_feedback(exam, &question_results, points_earned, points_possible, config)
            .await;

        Ok(SubmissionResult::from_question_results(
            submission,
            question_results,
            overall_feedback,
        ))
    }

    /// Grade independent submissions concurrently, up to `parallelism` at a
    /// time. Output order matches input order; per-submission failures stay
    /// in their slot.
    pub async fn grade_batch(
        &self,
        exam: &Exam,
        submissions: &[Submission],
        config: &GradingConfig,
        parallelism: usize,
    ) -> Vec<Result<SubmissionResult, GradeError>> {
        let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
        let mut futures = FuturesUnordered::new();

        for (index, submission) in submissions.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore never closed");
                (index, self.grade_submission(exam, submission, config).await)
            });
        }

        let mut slots: Vec<Option<Result<SubmissionResult, GradeError>>> =
            (0..submissions.len()).map(|_| None).collect();
        while let Some((index, result)) = futures.next().await {
            slots[index] = Some(result);
        }
        slots
            .into_iter()
            .map(|slot| slot.expect("every submission graded"))
            .collect()
    }

    /// Overall feedback: a holistic semantic summary when available,
    /// otherwise the weakest-N per-question feedback entries.
    async fn overall_feedback(
        &self,
        exam: &Exam,
        results: &[QuestionResult],
        points_earned: f64,
        points_possible: f64,
        config: &GradingConfig,
    ) -> String {
        if config.ai_grading {
            if let Some(client) = &self.semantic {
                let request = SummaryRequest {
                    exam_title: exam.title.clone(),
                    points_earned,
                    points_possible,
                    lines: results
                        .iter()
                        .map(|r| SummaryLine {
                            question_id: r.question_id.clone(),
                            correct: r.correct,
                            points_earned: r.points_earned,
                            points_possible: r.points_possible,
                        })
                        .collect(),
                };
                if let Some(summary) = client.summarize(&request).await {
                    return summary;
                }
            }
        }

        weakest_feedback(
            results,
            self.options.weakest_feedback,
            points_earned,
            points_possible,
        )
    }
}

/// Referential-integrity checks: the submission must target this exam and
/// every answer must reference an existing question, at most once.
pub fn validate_submission(exam: &Exam, submission: &Submission) -> Result<(), GradeError> {
    if submission.exam_id != exam.id {
        return Err(GradeError::InvalidSubmission(format!(
            "submission targets exam '{}', not '{}'",
            submission.exam_id, exam.id
        )));
    }
    let mut seen = HashSet::new();
    for answer in &submission.answers {
        if exam.question(&answer.question_id).is_none() {
            return Err(GradeError::InvalidSubmission(format!(
                "answer references unknown question '{}'",
                answer.question_id
            )));
        }
        if !seen.insert(answer.question_id.as_str()) {
            return Err(GradeError::InvalidSubmission(format!(
                "duplicate answer for question '{}'",
                answer.question_id
            )));
        }
    }
    Ok(())
}

fn weakest_feedback(
    results: &[QuestionResult],
    count: usize,
    points_earned: f64,
    points_possible: f64,
) -> String {
    let percentage = points_earned / points_possible * 100.0;
    let mut text = format!(
        "Score: {points_earned:.1}/{points_possible:.1} ({percentage:.1}%)."
    );

    let mut weakest: Vec<&QuestionResult> = results.iter().filter(|r| !r.correct).collect();
    if weakest.is_empty() {
        text.push_str(" Full marks on every question.");
        return text;
    }
    weakest.sort_by(|a, b| {
        a.fraction()
            .partial_cmp(&b.fraction())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.question_id.cmp(&b.question_id))
    });

    text.push_str(" Focus areas:");
    for result in weakest.into_iter().take(count) {
        text.push_str(&format!(" [{}] {}", result.question_id, result.feedback));
    }
    text
}
