//! Mastery persistence.
//!
//! The one component of the engine that writes shared state. Upserts a
//! performance analysis into the profile store under optimistic
//! concurrency: read, merge, conditional write, retry on conflict. A bare
//! last-write-wins upsert is deliberately not possible here.

use std::sync::Arc;

use chrono::Utc;

use examforge_core::error::StoreError;
use examforge_core::model::PerformanceAnalysis;
use examforge_core::traits::{ProfileKey, ProfileStore, ProfileVersion};

const DEFAULT_MAX_RETRIES: u32 = 3;

/// Persists analyses keyed by (student_id, subject).
pub struct MasteryTracker {
    store: Arc<dyn ProfileStore>,
    max_retries: u32,
}

impl MasteryTracker {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(store: Arc<dyn ProfileStore>, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    /// Upsert the analysis into the profile store.
    ///
    /// Creates the row on first analysis; afterwards only the analytic
    /// fields are overwritten and the identity key is immutable. On a version
    /// conflict the row is re-read and the merge retried; when retries
    /// exhaust, the losing write is discarded with a warning and an
    /// explicit `Conflict` error rather than corrupting the stored profile.
    pub async fn record(
        &self,
        analysis: &PerformanceAnalysis,
    ) -> Result<ProfileVersion, StoreError> {
        let key = ProfileKey::new(&analysis.student_id, &analysis.subject);

        let mut attempt = 0;
        loop {
            let current = self.store.fetch(&key).await?;
            let (profile, expected) = match current {
                Some(row) => {
                    let mut profile = row.profile;
                    analysis.apply_to(&mut profile, Utc::now());
                    (profile, Some(row.version))
                }
                None => (analysis.to_profile(Utc::now()), None),
            };

            match self.store.store(&key, profile, expected).await {
                Ok(version) => return Ok(version),
                Err(StoreError::Conflict { .. }) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        student_id = %key.student_id,
                        subject = %key.subject,
                        attempt,
                        "profile update conflicted, retrying with a fresh read"
                    );
                }
                Err(err @ StoreError::Conflict { .. }) => {
                    tracing::warn!(
                        student_id = %key.student_id,
                        subject = %key.subject,
                        "discarding profile update after {} conflicting attempts",
                        attempt + 1
                    );
                    return Err(err);
                }
                Err(err) => return Err(err),
            }
        }
    }
}
