//! In-memory versioned profile store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use examforge_core::error::StoreError;
use examforge_core::model::PerformanceProfile;
use examforge_core::traits::{ProfileKey, ProfileStore, ProfileVersion, VersionedProfile};

/// A `ProfileStore` backed by a mutex-guarded map. Used by tests and as
/// the reference implementation of the compare-and-swap contract.
#[derive(Default)]
pub struct MemoryProfileStore {
    rows: Mutex<HashMap<ProfileKey, VersionedProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn fetch(&self, key: &ProfileKey) -> Result<Option<VersionedProfile>, StoreError> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| StoreError::Backend("profile store lock poisoned".into()))?;
        Ok(rows.get(key).cloned())
    }

    async fn store(
        &self,
        key: &ProfileKey,
        profile: PerformanceProfile,
        expected: Option<ProfileVersion>,
    ) -> Result<ProfileVersion, StoreError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| StoreError::Backend("profile store lock poisoned".into()))?;

        let conflict = || StoreError::Conflict {
            student_id: key.student_id.clone(),
            subject: key.subject.clone(),
        };

        match (rows.get_mut(key), expected) {
            (None, None) => {
                rows.insert(
                    key.clone(),
                    VersionedProfile {
                        version: 1,
                        profile,
                    },
                );
                Ok(1)
            }
            (Some(row), Some(version)) if row.version == version => {
                row.version += 1;
                row.profile = profile;
                Ok(row.version)
            }
            // Create over an existing row, or an update against a stale
            // (or missing) version.
            _ => Err(conflict()),
        }
    }
}
