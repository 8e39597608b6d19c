//! The `examforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(questions_path: PathBuf) -> Result<()> {
    let sets = if questions_path.is_dir() {
        examforge_core::parser::load_question_directory(&questions_path)?
    } else {
        vec![examforge_core::parser::parse_question_set(&questions_path)?]
    };

    for set in &sets {
        let objective = set
            .questions
            .iter()
            .filter(|q| q.question_type.is_objective())
            .count();
        println!(
            "Question set: {} ({} questions, {objective} auto-gradable)",
            set.name,
            set.questions.len()
        );
    }

    println!("All question sets valid.");
    Ok(())
}
