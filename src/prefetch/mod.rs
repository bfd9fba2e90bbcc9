//! Prefetch Module
//!
//! Warms the existence cache ahead of navigation (hover, pending route)
//! without duplicating work for the same target.

mod inflight;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::existence::ExistenceCache;
use crate::resolver::SlugResolver;
use crate::store::compose_key;

pub use inflight::{InflightGuard, INFLIGHT_WINDOW_MS};

/// Why a prefetch concluded the document does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// The project lookup found nothing or failed
    ProjectNotFound,
    /// Neither direct lookup nor the listing scan found the document
    DocumentNotFound,
}

/// Result of one prefetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// An identical prefetch holds the in-flight marker; nothing was done
    AlreadyInFlight,
    Exists { document_id: String },
    Missing(MissReason),
}

// == Prefetch Coordinator ==
pub struct PrefetchCoordinator {
    resolver: Arc<SlugResolver>,
    existence: ExistenceCache,
    guard: Arc<InflightGuard>,
}

impl PrefetchCoordinator {
    pub fn new(resolver: Arc<SlugResolver>, guard: Arc<InflightGuard>) -> Self {
        let existence = resolver.existence().clone();
        Self {
            resolver,
            existence,
            guard,
        }
    }

    /// In-flight key for a prefetch target.
    pub fn prefetch_key(project_id: &str, document: &str) -> String {
        compose_key(&[project_id, document])
    }

    pub fn guard(&self) -> &Arc<InflightGuard> {
        &self.guard
    }

    /// Fire-and-forget prefetch of `document` under `project_id`.
    ///
    /// Returns immediately. Duplicates of an in-flight target are dropped
    /// before any task is spawned. Never panics, never reports errors.
    pub fn prefetch(self: &Arc<Self>, project_id: &str, document: &str) {
        let key = Self::prefetch_key(project_id, document);
        if !self.guard.try_mark(&key) {
            debug!(key = %key, "Prefetch already in flight");
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(key = %key, "No async runtime, prefetch skipped");
            self.guard.release(&key);
            return;
        };

        let this = Arc::clone(self);
        let project_id = project_id.to_string();
        let document = document.to_string();
        runtime.spawn(async move {
            let outcome = this.execute(&project_id, &document).await;
            debug!(project_id = %project_id, document = %document, ?outcome, "Prefetch finished");
        });
    }

    /// Awaited prefetch, reporting what happened.
    pub async fn run_prefetch(&self, project_id: &str, document: &str) -> PrefetchOutcome {
        let key = Self::prefetch_key(project_id, document);
        if !self.guard.try_mark(&key) {
            debug!(key = %key, "Prefetch already in flight");
            return PrefetchOutcome::AlreadyInFlight;
        }
        self.execute(project_id, document).await
    }

    /// Project first, then the document inside it. The marker is left to expire.
    async fn execute(&self, project_id: &str, document: &str) -> PrefetchOutcome {
        let outcome = match self.resolver.fetch_project(project_id).await {
            None => PrefetchOutcome::Missing(MissReason::ProjectNotFound),
            Some(project) => {
                let company_id = project.owner_id.as_deref().unwrap_or_default();
                match self
                    .resolver
                    .resolve_document(company_id, &project.id, document)
                    .await
                    .into_entity()
                {
                    Some(found) => PrefetchOutcome::Exists {
                        document_id: found.id,
                    },
                    None => PrefetchOutcome::Missing(MissReason::DocumentNotFound),
                }
            }
        };

        let exists = matches!(outcome, PrefetchOutcome::Exists { .. });
        self.existence
            .record_existence(project_id, document, exists)
            .await;
        outcome
    }
}
