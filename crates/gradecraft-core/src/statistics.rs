//! Class-level statistics over graded submissions.
//!
//! Every function here is a pure reduction: identical output for the same
//! input set regardless of input order. Ties are broken deterministically
//! (timestamps, then ids) for the same reason.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evaluate::normalize;
use crate::model::Exam;
use crate::results::{Grade, QuestionStatus, SubmissionResult};

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median with linear interpolation (midpoint) for even counts.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Population standard deviation (not sample); 0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Count of submissions per letter grade, in display order A..F.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeBucket {
    pub grade: Grade,
    pub count: usize,
}

pub fn grade_histogram(results: &[SubmissionResult]) -> Vec<GradeBucket> {
    Grade::ALL
        .iter()
        .map(|&grade| GradeBucket {
            grade,
            count: results.iter().filter(|r| r.grade == grade).count(),
        })
        .collect()
}

/// Average fraction of a question's points earned, across submissions that
/// answered it. Lower means harder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDifficulty {
    pub question_id: String,
    /// Submissions that included a response for this question.
    pub respondents: usize,
    /// `None` when no submission answered the question — distinct from
    /// "everyone scored zero".
    pub difficulty: Option<f64>,
}

pub fn question_difficulty(exam: &Exam, results: &[SubmissionResult]) -> Vec<QuestionDifficulty> {
    exam.questions
        .iter()
        .map(|question| {
            let fractions: Vec<f64> = results
                .iter()
                .filter_map(|r| r.question_result(&question.id))
                .filter(|qr| qr.status != QuestionStatus::Unanswered)
                .map(|qr| qr.fraction())
                .collect();
            QuestionDifficulty {
                question_id: question.id.clone(),
                respondents: fractions.len(),
                difficulty: if fractions.is_empty() {
                    None
                } else {
                    Some(mean(&fractions))
                },
            }
        })
        .collect()
}

/// A distinct incorrect response and how often it occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MistakeCluster {
    pub response: String,
    pub count: usize,
}

/// Common mistakes for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionMistakes {
    pub question_id: String,
    pub mistakes: Vec<MistakeCluster>,
}

/// For each exam question, the `top_k` most frequent incorrect normalized
/// responses with their counts. Ties break alphabetically on the response.
pub fn common_mistakes(
    exam: &Exam,
    results: &[SubmissionResult],
    top_k: usize,
) -> Vec<QuestionMistakes> {
    exam.questions
        .iter()
        .map(|question| {
            let mut counts: HashMap<String, usize> = HashMap::new();
            for result in results {
                let Some(qr) = result.question_result(&question.id) else {
                    continue;
                };
                if qr.status != QuestionStatus::Graded || qr.correct {
                    continue;
                }
                let Some(response) = &qr.response else {
                    continue;
                };
                let normalized = normalize(response);
                if normalized.is_empty() {
                    continue;
                }
                *counts.entry(normalized).or_insert(0) += 1;
            }

            let mut mistakes: Vec<MistakeCluster> = counts
                .into_iter()
                .map(|(response, count)| MistakeCluster { response, count })
                .collect();
            mistakes.sort_by(|a, b| {
                b.count
                    .cmp(&a.count)
                    .then_with(|| a.response.cmp(&b.response))
            });
            mistakes.truncate(top_k);

            QuestionMistakes {
                question_id: question.id.clone(),
                mistakes,
            }
        })
        .collect()
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub student_id: String,
    pub student_name: String,
    pub percentage: f64,
    pub grade: Grade,
    pub submitted_at: DateTime<Utc>,
}

/// Top performers by percentage, descending; ties go to the earlier
/// submission, then to the lexicographically smaller student id so the
/// ordering is a pure function of the input set.
pub fn leaderboard(results: &[SubmissionResult], top_n: usize) -> Vec<LeaderboardEntry> {
    let mut sorted: Vec<&SubmissionResult> = results.iter().collect();
    sorted.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.submitted_at.cmp(&b.submitted_at))
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    sorted
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, r)| LeaderboardEntry {
            rank: i + 1,
            student_id: r.student_id.clone(),
            student_name: r.student_name.clone(),
            percentage: r.percentage,
            grade: r.grade,
            submitted_at: r.submitted_at,
        })
        .collect()
}
