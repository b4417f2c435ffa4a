//! The `gradecraft analyze` command.

use std::path::PathBuf;

use anyhow::Result;

use gradecraft_core::parser;
use gradecraft_core::report::{compute_analytics, load_results_json, AnalyticsOptions};
use gradecraft_report::markdown::render_analytics;

pub fn execute(
    exam_path: PathBuf,
    results_path: PathBuf,
    output: Option<PathBuf>,
    format: String,
    top: usize,
    mistakes: usize,
) -> Result<()> {
    anyhow::ensure!(
        matches!(format.as_str(), "markdown" | "json"),
        "unknown format '{format}' (expected markdown or json)"
    );

    let exam = parser::parse_exam(&exam_path)?;
    let results = load_results_json(&results_path)?;

    let options = AnalyticsOptions {
        top_performers: top,
        common_mistakes: mistakes,
    };
    let report = compute_analytics(&exam, &results, &options)?;

    match format.as_str() {
        "json" => {
            if let Some(path) = output {
                report.save_json(&path)?;
                println!("Report written to {}", path.display());
            } else {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        _ => {
            let markdown = render_analytics(&exam, &report);
            if let Some(path) = output {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, markdown)?;
                println!("Report written to {}", path.display());
            } else {
                println!("{markdown}");
            }
        }
    }

    Ok(())
}
