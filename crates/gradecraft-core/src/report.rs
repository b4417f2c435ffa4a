//! Analytics report assembly and JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GradeError;
use crate::model::Exam;
use crate::results::SubmissionResult;
use crate::statistics::{
    common_mistakes, grade_histogram, leaderboard, mean, median, question_difficulty, std_dev,
    GradeBucket, LeaderboardEntry, QuestionDifficulty, QuestionMistakes,
};

/// Knobs for analytics assembly.
#[derive(Debug, Clone)]
pub struct AnalyticsOptions {
    /// Leaderboard length.
    pub top_performers: usize,
    /// Common-mistake clusters reported per question.
    pub common_mistakes: usize,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            top_performers: 10,
            common_mistakes: 3,
        }
    }
}

/// Class-level analytics for one exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    pub exam_id: String,
    pub submission_count: usize,
    pub mean_percentage: f64,
    pub median_percentage: f64,
    pub std_dev_percentage: f64,
    pub min_percentage: f64,
    pub max_percentage: f64,
    /// Percent of submissions at or above the exam's passing score.
    pub passing_rate: f64,
    pub grade_histogram: Vec<GradeBucket>,
    /// Per question, ascending difficulty = harder.
    pub question_difficulty: Vec<QuestionDifficulty>,
    pub common_mistakes: Vec<QuestionMistakes>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Reduce a batch of graded submissions into an [`AnalyticsReport`].
///
/// Fails with [`GradeError::EmptyBatch`] on zero results so callers can
/// distinguish "no submissions yet" from a report. The statistical content
/// is a pure function of the input set, independent of its order.
pub fn compute_analytics(
    exam: &Exam,
    results: &[SubmissionResult],
    options: &AnalyticsOptions,
) -> Result<AnalyticsReport, GradeError> {
    if results.is_empty() {
        return Err(GradeError::EmptyBatch);
    }

    let percentages: Vec<f64> = results.iter().map(|r| r.percentage).collect();
    let min_percentage = percentages.iter().copied().fold(f64::INFINITY, f64::min);
    let max_percentage = percentages
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let passing = percentages
        .iter()
        .filter(|&&p| p >= exam.passing_score)
        .count();

    Ok(AnalyticsReport {
        id: Uuid::new_v4(),
        generated_at: Utc::now(),
        exam_id: exam.id.clone(),
        submission_count: results.len(),
        mean_percentage: mean(&percentages),
        median_percentage: median(&percentages),
        std_dev_percentage: std_dev(&percentages),
        min_percentage,
        max_percentage,
        passing_rate: passing as f64 / results.len() as f64 * 100.0,
        grade_histogram: grade_histogram(results),
        question_difficulty: question_difficulty(exam, results),
        common_mistakes: common_mistakes(exam, results, options.common_mistakes),
        leaderboard: leaderboard(results, options.top_performers),
    })
}

impl AnalyticsReport {
    /// Save the report as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AnalyticsReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

/// Save a batch of graded submissions as pretty-printed JSON.
pub fn save_results_json(results: &[SubmissionResult], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results).context("failed to serialize results")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write results to {}", path.display()))?;
    Ok(())
}

/// Load a batch of graded submissions from a JSON file.
pub fn load_results_json(path: &Path) -> Result<Vec<SubmissionResult>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read results from {}", path.display()))?;
    let results: Vec<SubmissionResult> =
        serde_json::from_str(&content).context("failed to parse results JSON")?;
    Ok(results)
}
