//! The `quizgrade init` command.

use std::path::Path;

use anyhow::Result;

use super::Completion;

pub fn execute() -> Result<Completion> {
    std::fs::create_dir_all("question-banks")?;

    let files = [
        ("quizgrade.toml", SAMPLE_CONFIG),
        ("question-banks/example.toml", EXAMPLE_BANK),
        ("question-banks/example-submissions.json", EXAMPLE_SUBMISSIONS),
    ];
    for (path, content) in files {
        if Path::new(path).exists() {
            println!("{path} already exists, skipping.");
        } else {
            std::fs::write(path, content)?;
            println!("Created {path}");
        }
    }

    println!("\nNext steps:");
    println!("  1. Edit quizgrade.toml to point at your code-execution sandbox");
    println!("  2. Run: quizgrade validate --bank question-banks/example.toml");
    println!(
        "  3. Run: quizgrade grade --bank question-banks/example.toml \
         --submissions question-banks/example-submissions.json"
    );

    Ok(Completion::Done)
}

const SAMPLE_CONFIG: &str = r#"# quizgrade configuration

include_feedback = true
timeout_ms = 10000
parallelism = 4
max_retries = 2
retry_delay_ms = 500
output_dir = "./quizgrade-reports"

# Program submissions are held for manual review unless a sandbox is set.
# [sandbox]
# type = "http"
# base_url = "http://localhost:8088"
# api_key = "${QUIZGRADE_SANDBOX_KEY}"
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Bank"
description = "A small bank to get started"

[[questions]]
id = "capital"
title = "Capital of Italy"
questionType = "multiple_choice_single"
pointsPossible = 1

[questions.content]
correctAnswer = "rome"
options = [
    { id = "milan", text = "Milan" },
    { id = "rome", text = "Rome" },
]

[[questions]]
id = "seasons"
title = "Order the seasons starting from spring"
questionType = "ordering"
pointsPossible = 2

[questions.content]
correctOrder = ["spring", "summer", "autumn", "winter"]
partialCreditStrategy = "adjacent_pairs"

[[questions]]
id = "greeting"
title = "Say hello"
questionType = "program_submission"
pointsPossible = 4

[questions.content]
language = "python"
testCases = [
    { id = "hello", expectedOutput = "hello, world" },
]
"#;

const EXAMPLE_SUBMISSIONS: &str = r#"[
  {"questionId": "capital", "answer": "rome"},
  {"questionId": "seasons", "answer": ["spring", "autumn", "summer", "winter"]},
  {"questionId": "greeting", "answer": {"code": "print('hello, world')"}}
]
"#;
