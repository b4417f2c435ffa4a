//! gradecraft CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gradecraft", version, about = "Exam grading and analytics engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a batch of submissions against an exam
    Grade {
        /// Path to the exam .toml file
        #[arg(long)]
        exam: PathBuf,

        /// Path to the submissions .toml file
        #[arg(long)]
        submissions: PathBuf,

        /// Output directory
        #[arg(long, default_value = "./gradecraft-results")]
        output: PathBuf,

        /// Output format: json, csv, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Max concurrently graded submissions
        #[arg(long, default_value = "4")]
        parallelism: usize,

        /// Disable AI grading regardless of the exam config
        #[arg(long)]
        no_ai: bool,

        /// Config file path (backends, retries)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compute class analytics from graded results
    Analyze {
        /// Path to the exam .toml file
        #[arg(long)]
        exam: PathBuf,

        /// Path to a results JSON file produced by `grade`
        #[arg(long)]
        results: PathBuf,

        /// Write the report here instead of printing it
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: markdown, json
        #[arg(long, default_value = "markdown")]
        format: String,

        /// Leaderboard length
        #[arg(long, default_value = "10")]
        top: usize,

        /// Common-mistake clusters per question
        #[arg(long, default_value = "3")]
        mistakes: usize,
    },

    /// Validate exam TOML files
    Validate {
        /// Path to an exam file or directory
        #[arg(long)]
        exam: PathBuf,
    },

    /// Create a starter config, exam, and submissions file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gradecraft=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            exam,
            submissions,
            output,
            format,
            parallelism,
            no_ai,
            config,
        } => {
            commands::grade::execute(exam, submissions, output, format, parallelism, no_ai, config)
                .await
        }
        Commands::Analyze {
            exam,
            results,
            output,
            format,
            top,
            mistakes,
        } => commands::analyze::execute(exam, results, output, format, top, mistakes),
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
