//! The `examforge grade` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::Table;

use examforge_core::engine::assist_grade;
use examforge_core::parser;
use examforge_core::report::GradingReport;
use examforge_core::score::{aggregate, GradeTable};
use examforge_providers::config::{create_assist_grader, load_config_from};

pub async fn execute(
    questions_path: PathBuf,
    answers_path: PathBuf,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let set = parser::parse_question_set(&questions_path)?;
    let mut submission = parser::parse_submission(&answers_path)?;

    let config = load_config_from(config_path.as_deref())?;
    if let Some(grader) = create_assist_grader(&config) {
        let graded = assist_grade(
            Arc::new(grader),
            &set.questions,
            &mut submission.answers,
            config.parallelism,
        )
        .await;
        if graded > 0 {
            eprintln!("Assist service scored {graded} subjective answer(s)");
        }
    }

    let result = aggregate(&set.questions, &submission.answers, &GradeTable::default())?;

    let mut table = Table::new();
    table.set_header(vec!["Question", "Topic", "Type", "Score", "Outcome"]);
    for question in &set.questions {
        let score = result.question_scores.get(&question.id).copied().unwrap_or(0.0);
        let outcome = result
            .outcomes
            .get(&question.id)
            .map(|o| o.to_string())
            .unwrap_or_default();
        table.add_row(vec![
            question.id.clone(),
            question.topic.clone(),
            question.question_type.to_string(),
            format!("{score:.1}/{:.1}", question.marks),
            outcome,
        ]);
    }
    println!("{table}");

    println!(
        "\nTotal: {:.1}/{:.1} ({:.1}%), grade {}",
        result.total_score, result.max_score, result.percentage, result.grade
    );
    if !result.pending_review.is_empty() {
        println!(
            "Needs manual review: {} (grade is provisional)",
            result.pending_review.join(", ")
        );
    }

    if let Some(output) = output {
        let subject = if submission.subject.is_empty() {
            set.subject.clone()
        } else {
            submission.subject.clone()
        };
        let report = GradingReport::new(
            &submission.student_id,
            &subject,
            &submission.exam_id,
            result,
        );
        report.save_json(&output)?;
        println!("Report written to {}", output.display());
    }

    Ok(())
}
