//! The `gradecraft init` command.

use anyhow::Result;

const SAMPLE_CONFIG: &str = r#"# gradecraft configuration
# API keys may reference environment variables with ${VAR_NAME}.

default_backend = "openai"
request_timeout_secs = 30
max_retries = 3
retry_delay_ms = 1000

[backends.openai]
type = "openai"
api_key = "${GRADECRAFT_OPENAI_KEY}"
model = "gpt-4o-mini"

[backends.anthropic]
type = "anthropic"
api_key = "${GRADECRAFT_ANTHROPIC_KEY}"
"#;

const SAMPLE_EXAM: &str = r#"[exam]
id = "sample-exam"
title = "Sample Exam"
description = "A small exam covering several question types"
passing_score = 60.0

[exam.grading]
strictness = 0.5
partial_credit = true
# Flip to true (and configure a backend) for AI-assisted grading.
ai_grading = false

[[questions]]
id = "q1"
text = "What is 12 * 12?"
kind = "numerical"
points = 5.0
value = 144.0
tolerance = 0.0
topics = ["arithmetic"]

[[questions]]
id = "q2"
text = "Which planet is closest to the sun? (a) Venus (b) Mercury (c) Mars"
kind = "multiple_choice"
points = 2.0
answer = "b"
accepted = ["mercury"]
topics = ["astronomy"]

[[questions]]
id = "q3"
text = "Water boils at 100 degrees Celsius at sea level."
kind = "true_false"
points = 1.0
answer = "true"
topics = ["physics"]

[[questions]]
id = "q4"
text = "Name the process plants use to convert light into chemical energy."
kind = "short_answer"
points = 3.0
answer = "photosynthesis"
topics = ["biology"]

[[questions]]
id = "q5"
text = "Write a function that returns the sum of a list of numbers."
kind = "code"
points = 4.0
rubric = "Any language; must define a function and return the sum."
topics = ["programming"]
"#;

const SAMPLE_SUBMISSIONS: &str = r#"[[submissions]]
student_id = "s-001"
student_name = "Ada Lovelace"
exam_id = "sample-exam"
submitted_at = "2026-05-11T09:30:00Z"

[[submissions.answers]]
question_id = "q1"
response = "144"

[[submissions.answers]]
question_id = "q2"
response = "Mercury"

[[submissions.answers]]
question_id = "q3"
response = "yes"

[[submissions.answers]]
question_id = "q4"
response = "photosynthesis"

[[submissions.answers]]
question_id = "q5"
response = "def total(xs):\n    return sum(xs)"

[[submissions]]
student_id = "s-002"
student_name = "Charles Babbage"
exam_id = "sample-exam"
submitted_at = "2026-05-11T09:45:00Z"

[[submissions.answers]]
question_id = "q1"
response = "150"

[[submissions.answers]]
question_id = "q2"
response = "a"

[[submissions.answers]]
question_id = "q3"
response = "no"

[[submissions.answers]]
question_id = "q4"
response = "photosinthesis"
"#;

pub fn execute() -> Result<()> {
    let files = [
        ("gradecraft.toml", SAMPLE_CONFIG),
        ("sample-exam.toml", SAMPLE_EXAM),
        ("sample-submissions.toml", SAMPLE_SUBMISSIONS),
    ];

    for (name, content) in files {
        let path = std::path::Path::new(name);
        if path.exists() {
            println!("Skipping {name} (already exists)");
            continue;
        }
        std::fs::write(path, content)?;
        println!("Created {name}");
    }

    println!("\nNext steps:");
    println!("  gradecraft validate --exam sample-exam.toml");
    println!("  gradecraft grade --exam sample-exam.toml --submissions sample-submissions.toml");
    println!("  gradecraft analyze --exam sample-exam.toml --results ./gradecraft-results/sample-exam_results.json");

    Ok(())
}
