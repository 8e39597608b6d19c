//! The `examforge init` command.

use std::path::Path;

use anyhow::{Context, Result};

const STARTER_CONFIG: &str = r#"# examforge configuration
#
# Uncomment and fill in to call a real question-generation service.
# Without one, `examforge generate` uses the deterministic template.
#
# [generator]
# base_url = "https://generation.example.com"
# api_key = "${EXAMFORGE_GENERATOR_KEY}"
# timeout_secs = 30
#
# [assist]
# base_url = "https://assist.example.com"
# api_key = "${EXAMFORGE_ASSIST_KEY}"

output_dir = "./examforge-results"
parallelism = 4
"#;

const EXAMPLE_EXAM: &str = r#"[exam]
id = "sample-math"
name = "Sample Math Exam"
subject = "math"
grade_level = "8"

[[questions]]
id = "q1"
text = "What is 2 + 2?"
type = "choice"
topic = "arithmetic"
difficulty = "easy"
marks = 5.0
options = ["3", "4", "5"]
correct_answer = "4"

[[questions]]
id = "q2"
text = "True or false: a square is a rectangle."
type = "boolean"
topic = "geometry"
difficulty = "medium"
marks = 5.0
correct_answer = "true"

[[questions]]
id = "q3"
text = "Explain why dividing by zero is undefined."
type = "long_text"
topic = "arithmetic"
difficulty = "hard"
marks = 10.0
grading_rubric = "mention that no number times zero gives a nonzero value"
"#;

pub fn execute() -> Result<()> {
    write_if_absent(Path::new("examforge.toml"), STARTER_CONFIG)?;
    write_if_absent(Path::new("exams/sample.toml"), EXAMPLE_EXAM)?;
    Ok(())
}

fn write_if_absent(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}
