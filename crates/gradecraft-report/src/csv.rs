//! CSV export of graded results.

use std::path::Path;

use anyhow::Result;

use gradecraft_core::model::Exam;
use gradecraft_core::results::SubmissionResult;

/// Quote a field when it contains a delimiter, quote, or newline.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_row(out: &mut String, fields: &[String]) {
    let escaped: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
    out.push_str(&escaped.join(","));
    out.push('\n');
}

/// One row per student: totals, percentage, grade.
pub fn results_summary_csv(results: &[SubmissionResult]) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        &[
            "student_id".into(),
            "student_name".into(),
            "points_earned".into(),
            "points_possible".into(),
            "percentage".into(),
            "grade".into(),
            "graded_at".into(),
        ],
    );

    for result in results {
        push_row(
            &mut out,
            &[
                result.student_id.clone(),
                result.student_name.clone(),
                format!("{:.2}", result.points_earned),
                format!("{:.2}", result.points_possible),
                format!("{:.2}", result.percentage),
                result.grade.to_string(),
                result.graded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        );
    }

    out
}

/// One row per student with a column per exam question.
pub fn results_detailed_csv(exam: &Exam, results: &[SubmissionResult]) -> String {
    let mut out = String::new();

    let mut header = vec!["student_id".to_string(), "student_name".to_string()];
    header.extend(exam.questions.iter().map(|q| q.id.clone()));
    header.extend([
        "points_earned".to_string(),
        "percentage".to_string(),
        "grade".to_string(),
    ]);
    push_row(&mut out, &header);

    for result in results {
        let mut row = vec![result.student_id.clone(), result.student_name.clone()];
        for question in &exam.questions {
            let cell = match result.question_result(&question.id) {
                Some(qr) => format!("{:.1}/{:.1}", qr.points_earned, qr.points_possible),
                None => String::new(),
            };
            row.push(cell);
        }
        row.extend([
            format!("{:.2}", result.points_earned),
            format!("{:.2}", result.percentage),
            result.grade.to_string(),
        ]);
        push_row(&mut out, &row);
    }

    out
}

/// Write the summary CSV to a file.
pub fn write_results_csv(results: &[SubmissionResult], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, results_summary_csv(results))?;
    Ok(())
}

/// Write the per-question detailed CSV to a file.
pub fn write_detailed_csv(exam: &Exam, results: &[SubmissionResult], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, results_detailed_csv(exam, results))?;
    Ok(())
}
