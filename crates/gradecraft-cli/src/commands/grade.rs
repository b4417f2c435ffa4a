//! The `gradecraft grade` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::Table;

use gradecraft_core::adapter::SemanticClient;
use gradecraft_core::grader::SubmissionGrader;
use gradecraft_core::parser;
use gradecraft_core::report::save_results_json;
use gradecraft_core::results::SubmissionResult;
use gradecraft_graders::{create_grader, load_config_from};
use gradecraft_report::{write_detailed_csv, write_results_csv, write_submission_markdown};

pub async fn execute(
    exam_path: PathBuf,
    submissions_path: PathBuf,
    output: PathBuf,
    format: String,
    parallelism: usize,
    no_ai: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    anyhow::ensure!(
        matches!(format.as_str(), "json" | "csv" | "markdown" | "all"),
        "unknown format '{format}' (expected json, csv, markdown, or all)"
    );

    let exam = parser::parse_exam(&exam_path)?;
    let warnings = parser::validate_exam(&exam);
    for w in &warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        eprintln!("{prefix} WARNING: {}", w.message);
    }

    let submissions = parser::parse_submissions(&submissions_path)?;
    anyhow::ensure!(!submissions.is_empty(), "no submissions to grade");

    let grader = match build_semantic_client(&exam, no_ai, config_path.as_deref())? {
        Some(client) => {
            eprintln!("AI grading enabled via '{}'", client.name());
            SubmissionGrader::with_semantic(client)
        }
        None => SubmissionGrader::new(),
    };

    eprintln!(
        "Grading {} submission(s) against '{}'...",
        submissions.len(),
        exam.title
    );

    let outcomes = grader
        .grade_batch(&exam, &submissions, &exam.grading, parallelism)
        .await;

    let mut results: Vec<SubmissionResult> = Vec::new();
    let mut failures = 0usize;
    for (submission, outcome) in submissions.iter().zip(outcomes) {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                eprintln!("  FAILED {}: {e}", submission.student_id);
                failures += 1;
            }
        }
    }

    print_summary_table(&results);
    eprintln!(
        "\nGraded {}/{} submission(s){}",
        results.len(),
        results.len() + failures,
        if failures > 0 {
            format!(", {failures} rejected")
        } else {
            String::new()
        }
    );

    let results_path = output.join(format!("{}_results.json", exam.id));
    save_results_json(&results, &results_path)?;
    println!("Results written to {}", results_path.display());

    if matches!(format.as_str(), "csv" | "all") {
        let summary_path = output.join(format!("{}_summary.csv", exam.id));
        write_results_csv(&results, &summary_path)?;
        let detailed_path = output.join(format!("{}_detailed.csv", exam.id));
        write_detailed_csv(&exam, &results, &detailed_path)?;
        println!(
            "CSV written to {} and {}",
            summary_path.display(),
            detailed_path.display()
        );
    }

    if matches!(format.as_str(), "markdown" | "all") {
        let student_dir = output.join(format!("{}_students", exam.id));
        for result in &results {
            let path = student_dir.join(format!("{}.md", result.student_id));
            write_submission_markdown(&exam, result, &path)?;
        }
        println!("Student reports written to {}", student_dir.display());
    }

    Ok(())
}

/// Wire up the semantic grading backend, or explain why grading proceeds
/// without one.
fn build_semantic_client(
    exam: &gradecraft_core::model::Exam,
    no_ai: bool,
    config_path: Option<&std::path::Path>,
) -> Result<Option<SemanticClient>> {
    if no_ai {
        return Ok(None);
    }
    if !exam.grading.ai_grading {
        return Ok(None);
    }

    let config = load_config_from(config_path)?;
    let Some(backend) = config.default_backend_config() else {
        eprintln!(
            "Warning: AI grading requested but backend '{}' is not configured; \
             essay questions will be held for manual review",
            config.default_backend
        );
        return Ok(None);
    };

    let has_key = match backend {
        gradecraft_graders::BackendConfig::OpenAi { api_key, .. } => !api_key.is_empty(),
        gradecraft_graders::BackendConfig::Anthropic { api_key, .. } => !api_key.is_empty(),
    };
    if !has_key {
        eprintln!(
            "Warning: AI grading requested but no API key is set for '{}'; \
             essay questions will be held for manual review",
            config.default_backend
        );
        return Ok(None);
    }

    let grader = create_grader(backend)?;
    Ok(Some(SemanticClient::new(
        Arc::from(grader),
        config.retry_policy(),
    )))
}

fn print_summary_table(results: &[SubmissionResult]) {
    let mut table = Table::new();
    table.set_header(vec![
        "Student", "ID", "Score", "Percent", "Grade", "Notes",
    ]);

    for result in results {
        let notes = if result.degraded {
            "degraded".to_string()
        } else {
            String::new()
        };
        table.add_row(vec![
            result.student_name.clone(),
            result.student_id.clone(),
            format!("{:.1}/{:.1}", result.points_earned, result.points_possible),
            format!("{:.1}%", result.percentage),
            result.grade.to_string(),
            notes,
        ]);
    }

    println!("{table}");
}
