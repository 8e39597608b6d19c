//! The `examforge generate` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use examforge_core::adaptive::{build_generation_request, TargetDifficulty};
use examforge_core::engine::{ExamEngine, ExamSource, RetryPolicy};
use examforge_core::model::QuestionSet;
use examforge_core::parser;
use examforge_core::profile::{analyze, AnalysisThresholds};
use examforge_core::traits::{ProfileKey, ProfileStore, QuestionGenerator};
use examforge_providers::config::{create_generator, load_config_from};
use examforge_providers::TemplateGenerator;
use examforge_store::JsonFileProfileStore;

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    subject: String,
    grade_level: String,
    count: usize,
    difficulty: String,
    topics: Option<String>,
    attempts_path: Option<PathBuf>,
    student: String,
    store_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(count >= 1, "count must be at least 1");
    let target: TargetDifficulty = difficulty
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let attempts = match &attempts_path {
        Some(path) => parser::parse_attempts(path)?,
        None => Vec::new(),
    };

    let stored = match &store_path {
        Some(path) => JsonFileProfileStore::new(path)
            .fetch(&ProfileKey::new(&student, &subject))
            .await
            .map_err(|e| anyhow::anyhow!("profile store: {e}"))?
            .map(|row| row.profile),
        None => None,
    };

    let analysis = analyze(
        &student,
        &subject,
        stored.as_ref(),
        &attempts,
        &AnalysisThresholds::default(),
    );

    let focus_override = topics.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
    });
    let request =
        build_generation_request(&analysis, &grade_level, target, focus_override, count);

    eprintln!(
        "Generating {count} {} question(s) for {subject} ({})",
        request.difficulty, request.profile_summary
    );

    let config = load_config_from(config_path.as_deref())?;
    let fallback: Arc<dyn QuestionGenerator> = Arc::new(TemplateGenerator::new());
    let exam = match create_generator(&config) {
        Some(generator) => {
            let engine = ExamEngine::new(Arc::new(generator), fallback, RetryPolicy::default());
            let exam = engine.generate_exam(&request).await?;
            if exam.source == ExamSource::FallbackTemplate {
                eprintln!("Generation service unavailable; using template questions");
            }
            exam
        }
        None => {
            // No service configured: go straight to the template.
            eprintln!("No generation service configured; using template questions");
            let engine = ExamEngine::new(
                Arc::clone(&fallback),
                Arc::clone(&fallback),
                RetryPolicy::default(),
            );
            engine.generate_exam(&request).await?
        }
    };

    let set = QuestionSet {
        id: format!("{subject}-adaptive"),
        name: format!("Adaptive {subject} exam"),
        subject: subject.clone(),
        grade_level,
        questions: exam.questions,
    };
    let toml = parser::question_set_to_toml(&set)?;

    match output {
        Some(path) => {
            std::fs::write(&path, toml)
                .with_context(|| format!("failed to write exam to {}", path.display()))?;
            println!("Exam with {} question(s) written to {}", set.questions.len(), path.display());
        }
        None => println!("{toml}"),
    }

    Ok(())
}
