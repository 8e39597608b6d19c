//! The `examforge analyze` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::Table;

use examforge_core::parser;
use examforge_core::profile::{analyze, AnalysisThresholds};
use examforge_core::traits::{ProfileKey, ProfileStore};
use examforge_store::{JsonFileProfileStore, MasteryTracker};

pub async fn execute(
    attempts_path: PathBuf,
    student: String,
    subject: String,
    store_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let attempts = parser::parse_attempts(&attempts_path)?;

    let store = store_path.map(|path| Arc::new(JsonFileProfileStore::new(path)));
    let stored = match &store {
        Some(store) => store
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

    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Student".to_string(), analysis.student_id.clone()]);
    table.add_row(vec!["Subject".to_string(), analysis.subject.clone()]);
    table.add_row(vec![
        "Skill level".to_string(),
        format!("{}/10", analysis.skill_level),
    ]);
    table.add_row(vec![
        "Average score".to_string(),
        analysis
            .average_score
            .map(|s| format!("{s:.1}%"))
            .unwrap_or_else(|| "n/a".to_string()),
    ]);
    table.add_row(vec!["Trend".to_string(), analysis.trend.to_string()]);
    table.add_row(vec![
        "Recommended difficulty".to_string(),
        analysis.recommended_difficulty.to_string(),
    ]);
    table.add_row(vec![
        "Strengths".to_string(),
        join_or_dash(analysis.strengths.iter()),
    ]);
    table.add_row(vec![
        "Weaknesses".to_string(),
        join_or_dash(analysis.weaknesses.iter()),
    ]);
    let preferred: Vec<String> = analysis
        .preferred_question_types
        .iter()
        .map(|t| t.to_string())
        .collect();
    table.add_row(vec!["Preferred types".to_string(), join_or_dash(preferred.iter())]);
    println!("{table}");

    if let Some(store) = &store {
        let store: Arc<dyn ProfileStore> = store.clone();
        let tracker = MasteryTracker::new(store);
        let version = tracker
            .record(&analysis)
            .await
            .map_err(|e| anyhow::anyhow!("profile update failed: {e}"))?;
        println!("Profile stored (version {version})");
    }

    if let Some(output) = output {
        let json =
            serde_json::to_string_pretty(&analysis).context("failed to serialize analysis")?;
        std::fs::write(&output, json)
            .with_context(|| format!("failed to write analysis to {}", output.display()))?;
        println!("Analysis written to {}", output.display());
    }

    Ok(())
}

fn join_or_dash<'a, I, S>(items: I) -> String
where
    I: Iterator<Item = &'a S>,
    S: AsRef<str> + 'a,
{
    let joined: Vec<&str> = items.map(|s| s.as_ref()).collect();
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined.join(", ")
    }
}
