//! Grading report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ExamResult;

/// A persisted record of one graded attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub student_id: String,
    pub subject: String,
    pub exam_id: String,
    /// The aggregated result.
    pub result: ExamResult,
}

impl GradingReport {
    pub fn new(student_id: &str, subject: &str, exam_id: &str, result: ExamResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            student_id: student_id.to_string(),
            subject: subject.to_string(),
            exam_id: exam_id.to_string(),
            result,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradingReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// True while any question still awaits manual review.
    pub fn is_provisional(&self) -> bool {
        !self.result.pending_review.is_empty()
    }
}
