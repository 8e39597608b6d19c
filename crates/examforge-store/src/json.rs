//! JSON-file-backed profile store.
//!
//! Persists profile rows to a single JSON file so the CLI keeps mastery
//! state across invocations. The file is read and rewritten under one
//! process-wide lock per operation; the compare-and-swap contract is the
//! same as the in-memory store's.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use examforge_core::error::StoreError;
use examforge_core::model::PerformanceProfile;
use examforge_core::traits::{ProfileKey, ProfileStore, ProfileVersion, VersionedProfile};

/// A `ProfileStore` persisted as a JSON array of versioned rows.
pub struct JsonFileProfileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_rows(&self) -> Result<Vec<VersionedProfile>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Backend(format!("read {}: {e}", self.path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Backend(format!("parse {}: {e}", self.path.display())))
    }

    fn write_rows(&self, rows: &[VersionedProfile]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(rows)
            .map_err(|e| StoreError::Backend(format!("serialize profiles: {e}")))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Backend(format!("create {}: {e}", parent.display())))?;
        }
        std::fs::write(&self.path, json)
            .map_err(|e| StoreError::Backend(format!("write {}: {e}", self.path.display())))
    }

    fn matches(row: &VersionedProfile, key: &ProfileKey) -> bool {
        row.profile.student_id == key.student_id && row.profile.subject == key.subject
    }
}

#[async_trait]
impl ProfileStore for JsonFileProfileStore {
    async fn fetch(&self, key: &ProfileKey) -> Result<Option<VersionedProfile>, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Backend("profile store lock poisoned".into()))?;
        let rows = self.read_rows()?;
        Ok(rows.into_iter().find(|row| Self::matches(row, key)))
    }

    async fn store(
        &self,
        key: &ProfileKey,
        profile: PerformanceProfile,
        expected: Option<ProfileVersion>,
    ) -> Result<ProfileVersion, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Backend("profile store lock poisoned".into()))?;
        let mut rows = self.read_rows()?;

        let conflict = || StoreError::Conflict {
            student_id: key.student_id.clone(),
            subject: key.subject.clone(),
        };

        let existing = rows.iter_mut().find(|row| Self::matches(row, key));
        let new_version = match (existing, expected) {
            (None, None) => {
                rows.push(VersionedProfile {
                    version: 1,
                    profile,
                });
                1
            }
            (Some(row), Some(version)) if row.version == version => {
                row.version += 1;
                row.profile = profile;
                row.version
            }
            _ => return Err(conflict()),
        };

        self.write_rows(&rows)?;
        Ok(new_version)
    }
}
