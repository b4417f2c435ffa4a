//! Markdown report generator.

use std::path::Path;

use anyhow::Result;

use gradecraft_core::model::Exam;
use gradecraft_core::report::AnalyticsReport;
use gradecraft_core::results::{QuestionStatus, SubmissionResult};

/// Escape the characters that break Markdown table cells.
fn md_escape(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Render a class analytics report as Markdown.
pub fn render_analytics(exam: &Exam, report: &AnalyticsReport) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Exam analysis: {}\n\n", md_escape(&exam.title)));
    md.push_str(&format!(
        "Generated {} | {} submissions\n\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.submission_count
    ));

    md.push_str("## Class statistics\n\n");
    md.push_str("| Metric | Value |\n|--------|-------|\n");
    md.push_str(&format!("| Mean | {:.2}% |\n", report.mean_percentage));
    md.push_str(&format!("| Median | {:.2}% |\n", report.median_percentage));
    md.push_str(&format!(
        "| Std deviation | {:.2} |\n",
        report.std_dev_percentage
    ));
    md.push_str(&format!(
        "| Range | {:.2}% – {:.2}% |\n",
        report.min_percentage, report.max_percentage
    ));
    md.push_str(&format!(
        "| Passing rate | {:.1}% (threshold {:.0}%) |\n\n",
        report.passing_rate, exam.passing_score
    ));

    md.push_str("## Grade distribution\n\n");
    md.push_str("| Grade | Count |\n|-------|-------|\n");
    for bucket in &report.grade_histogram {
        md.push_str(&format!("| {} | {} |\n", bucket.grade, bucket.count));
    }
    md.push('\n');

    md.push_str("## Question difficulty (hardest first)\n\n");
    md.push_str("| Question | Respondents | Avg fraction earned |\n");
    md.push_str("|----------|-------------|---------------------|\n");
    let mut difficulty = report.question_difficulty.clone();
    difficulty.sort_by(|a, b| {
        let av = a.difficulty.unwrap_or(f64::INFINITY);
        let bv = b.difficulty.unwrap_or(f64::INFINITY);
        av.partial_cmp(&bv).unwrap_or(std::cmp::Ordering::Equal)
    });
    for entry in &difficulty {
        let value = match entry.difficulty {
            Some(d) => format!("{:.1}%", d * 100.0),
            None => "no respondents".to_string(),
        };
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            md_escape(&entry.question_id),
            entry.respondents,
            value
        ));
    }
    md.push('\n');

    let has_mistakes = report.common_mistakes.iter().any(|m| !m.mistakes.is_empty());
    if has_mistakes {
        md.push_str("## Common mistakes\n\n");
        for question in &report.common_mistakes {
            if question.mistakes.is_empty() {
                continue;
            }
            md.push_str(&format!("**{}**\n\n", md_escape(&question.question_id)));
            for mistake in &question.mistakes {
                md.push_str(&format!(
                    "- \"{}\" ({} students)\n",
                    md_escape(&mistake.response),
                    mistake.count
                ));
            }
            md.push('\n');
        }
    }

    md.push_str("## Top performers\n\n");
    md.push_str("| Rank | Student | Score | Grade |\n|------|---------|-------|-------|\n");
    for entry in &report.leaderboard {
        md.push_str(&format!(
            "| {} | {} | {:.2}% | {} |\n",
            entry.rank,
            md_escape(&entry.student_name),
            entry.percentage,
            entry.grade
        ));
    }

    md
}

/// Render an individual student's graded submission as Markdown.
pub fn render_submission(exam: &Exam, result: &SubmissionResult) -> String {
    let mut md = String::new();

    md.push_str(&format!(
        "# {} — {}\n\n",
        md_escape(&exam.title),
        md_escape(&result.student_name)
    ));
    md.push_str(&format!(
        "Score: **{:.1}/{:.1}** ({:.1}%, grade {})\n\n",
        result.points_earned, result.points_possible, result.percentage, result.grade
    ));
    if result.degraded {
        md.push_str("> Some answers could not be evaluated and were scored zero.\n\n");
    }
    md.push_str(&format!("{}\n\n", result.overall_feedback));

    md.push_str("## Breakdown\n\n");
    for (i, qr) in result.question_results.iter().enumerate() {
        let question_text = exam
            .question(&qr.question_id)
            .map(|q| q.text.as_str())
            .unwrap_or("");
        md.push_str(&format!(
            "### {}. {} ({:.1}/{:.1})\n\n",
            i + 1,
            md_escape(question_text),
            qr.points_earned,
            qr.points_possible
        ));
        let marker = match qr.status {
            QuestionStatus::Graded if qr.correct => "Correct",
            QuestionStatus::Graded => "Incorrect",
            QuestionStatus::Unanswered => "Unanswered",
            QuestionStatus::Error => "Not evaluated",
        };
        md.push_str(&format!("Status: {marker}\n\n"));
        if let Some(response) = &qr.response {
            md.push_str(&format!("Answer: {}\n\n", md_escape(response)));
        }
        md.push_str(&format!("{}\n\n", qr.feedback));
        if !qr.suggestions.is_empty() {
            md.push_str("Suggestions:\n");
            for suggestion in &qr.suggestions {
                md.push_str(&format!("- {}\n", md_escape(suggestion)));
            }
            md.push('\n');
        }
    }

    md
}

/// Write the analytics Markdown report to a file.
pub fn write_analytics_markdown(exam: &Exam, report: &AnalyticsReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_analytics(exam, report))?;
    Ok(())
}

/// Write one student's Markdown report to a file.
pub fn write_submission_markdown(
    exam: &Exam,
    result: &SubmissionResult,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_submission(exam, result))?;
    Ok(())
}
