//! Resolver Module
//!
//! Maps human-friendly identifiers (canonical IDs, generated slugs, legacy
//! slugs) to canonical projects and documents.
//!
//! # Resolution order
//! 1. If the identifier has the canonical-ID shape, fetch it directly.
//! 2. Otherwise, or on a miss, list every candidate in the enclosing scope.
//! 3. The first candidate whose ID, basic slug, or navigation slug equals the
//!    identifier wins.
//!
//! Collaborator failures at any step are logged and treated as "nothing found
//! here", so resolution falls through instead of aborting.

mod catalog;
mod entity;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::BackendResult;
use crate::existence::ExistenceCache;
use crate::slug::slug_matches;

pub use catalog::InMemoryCatalog;
pub use entity::{IdShape, MatchKind, PathResolution, Resolution, ResolvedEntity};

// == Collaborators ==
/// Complete listings of entities within a scope.
///
/// Pagination, if the backend has any, stays behind this trait.
#[async_trait]
pub trait EntityListing: Send + Sync {
    async fn list_projects(&self, company_id: &str) -> BackendResult<Vec<ResolvedEntity>>;

    async fn list_documents(&self, project_id: &str) -> BackendResult<Vec<ResolvedEntity>>;
}

/// Fetches of single entities by canonical ID. A missing entity is `Ok(None)`.
#[async_trait]
pub trait DirectLookup: Send + Sync {
    async fn get_project_by_id(&self, id: &str) -> BackendResult<Option<ResolvedEntity>>;

    async fn get_document_by_id(
        &self,
        company_id: &str,
        project_id: &str,
        id: &str,
    ) -> BackendResult<Option<ResolvedEntity>>;
}

// == Slug Resolver ==
pub struct SlugResolver {
    listing: Arc<dyn EntityListing>,
    lookup: Arc<dyn DirectLookup>,
    existence: ExistenceCache,
    id_shape: IdShape,
}

impl SlugResolver {
    pub fn new(
        listing: Arc<dyn EntityListing>,
        lookup: Arc<dyn DirectLookup>,
        existence: ExistenceCache,
        id_shape: IdShape,
    ) -> Self {
        Self {
            listing,
            lookup,
            existence,
            id_shape,
        }
    }

    pub fn existence(&self) -> &ExistenceCache {
        &self.existence
    }

    // == Projects ==
    /// Resolves a project identifier within `company_id`.
    pub async fn resolve_project(&self, company_id: &str, identifier: &str) -> Resolution {
        if identifier.is_empty() {
            return Resolution::NotFound;
        }

        if self.id_shape.matches(identifier) {
            match self.fetch_project(identifier).await {
                Some(entity) if owned_by_company(&entity, company_id) => {
                    return found(entity, MatchKind::DirectId);
                }
                Some(entity) => debug!(
                    company_id,
                    project_id = %entity.id,
                    "Project belongs to another company"
                ),
                None => {}
            }
        }

        let candidates = match self.listing.list_projects(company_id).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(company_id, error = %err, "Project listing failed");
                return Resolution::NotFound;
            }
        };

        let resolution = first_match(identifier, candidates);
        if !resolution.is_found() {
            debug!(company_id, identifier, "No project matches identifier");
        }
        resolution
    }

    /// Fetches a project by canonical ID, without the shape check.
    ///
    /// Collaborator errors are logged and reported as a miss.
    pub async fn fetch_project(&self, project_id: &str) -> Option<ResolvedEntity> {
        match self.lookup.get_project_by_id(project_id).await {
            Ok(entity) => entity,
            Err(err) => {
                warn!(project_id, error = %err, "Direct project lookup failed");
                None
            }
        }
    }

    // == Documents ==
    /// Resolves a document identifier within a resolved project.
    ///
    /// On success the existence cache learns that both `identifier` and the
    /// document's canonical ID exist under `project_id`.
    pub async fn resolve_document(
        &self,
        company_id: &str,
        project_id: &str,
        identifier: &str,
    ) -> Resolution {
        if identifier.is_empty() {
            return Resolution::NotFound;
        }

        let mut resolution = Resolution::NotFound;
        if self.id_shape.matches(identifier) {
            if let Some(entity) = self.fetch_document(company_id, project_id, identifier).await {
                resolution = found(entity, MatchKind::DirectId);
            }
        }

        if !resolution.is_found() {
            resolution = match self.listing.list_documents(project_id).await {
                Ok(candidates) => first_match(identifier, candidates),
                Err(err) => {
                    warn!(project_id, error = %err, "Document listing failed");
                    Resolution::NotFound
                }
            };
        }

        match resolution.entity() {
            Some(entity) => self.remember(project_id, identifier, entity).await,
            None => debug!(project_id, identifier, "No document matches identifier"),
        }
        resolution
    }

    async fn fetch_document(
        &self,
        company_id: &str,
        project_id: &str,
        document_id: &str,
    ) -> Option<ResolvedEntity> {
        match self
            .lookup
            .get_document_by_id(company_id, project_id, document_id)
            .await
        {
            Ok(entity) => entity,
            Err(err) => {
                warn!(project_id, document_id, error = %err, "Direct document lookup failed");
                None
            }
        }
    }

    // == Paths ==
    /// Resolves `company/project/document`, project first.
    pub async fn resolve_path(
        &self,
        company_id: &str,
        project_identifier: &str,
        document_identifier: &str,
    ) -> PathResolution {
        let Some(project) = self
            .resolve_project(company_id, project_identifier)
            .await
            .into_entity()
        else {
            return PathResolution::ProjectNotFound;
        };

        match self
            .resolve_document(company_id, &project.id, document_identifier)
            .await
            .into_entity()
        {
            Some(document) => PathResolution::Resolved { project, document },
            None => PathResolution::DocumentNotFound { project },
        }
    }

    async fn remember(&self, project_id: &str, identifier: &str, entity: &ResolvedEntity) {
        let mut written = self.existence.record_existence(project_id, identifier, true).await;
        if entity.id != identifier {
            written &= self.existence.record_existence(project_id, &entity.id, true).await;
        }
        if !written {
            debug!(project_id, identifier, "Existence cache not updated");
        }
    }
}

/// An empty `company_id` or an entity without an owner is never a mismatch.
fn owned_by_company(entity: &ResolvedEntity, company_id: &str) -> bool {
    company_id.is_empty()
        || entity
            .owner_id
            .as_deref()
            .map_or(true, |owner| owner == company_id)
}

fn found(entity: ResolvedEntity, matched_by: MatchKind) -> Resolution {
    Resolution::Found { entity, matched_by }
}

/// First candidate in listing order matching `identifier`.
fn first_match(identifier: &str, candidates: Vec<ResolvedEntity>) -> Resolution {
    candidates
        .into_iter()
        .find_map(|candidate| {
            slug_matches(identifier, &candidate.id, &candidate.name)
                .map(|kind| found(candidate, kind.into()))
        })
        .unwrap_or(Resolution::NotFound)
}
