//! API Handlers
//!
//! HTTP request handlers for each endpoint of the resolution layer.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{ApiError, Result, StartupError};
use crate::existence::ExistenceCache;
use crate::models::{
    ExistenceResponse, HealthResponse, PathResponse, PrefetchRequest, PrefetchResponse,
    ProjectResponse, StatsResponse,
};
use crate::prefetch::{InflightGuard, PrefetchCoordinator};
use crate::resolver::{
    DirectLookup, EntityListing, IdShape, InMemoryCatalog, PathResolution, Resolution,
    SlugResolver,
};
use crate::store::{
    BoundedStore, FileBackend, MemoryBackend, SharedStore, StorageBackend, StoreOptions,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Bounded store backing the existence cache
    pub store: SharedStore,
    pub resolver: Arc<SlugResolver>,
    pub prefetcher: Arc<PrefetchCoordinator>,
}

impl AppState {
    pub fn new(
        store: SharedStore,
        resolver: Arc<SlugResolver>,
        prefetcher: Arc<PrefetchCoordinator>,
    ) -> Self {
        Self {
            store,
            resolver,
            prefetcher,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Persists to `config.storage_path` when set, otherwise keeps the store in
    /// memory. `catalog` answers both listings and direct lookups.
    pub fn from_config(
        config: &Config,
        catalog: InMemoryCatalog,
    ) -> std::result::Result<Self, StartupError> {
        let backend: Arc<dyn StorageBackend> = match &config.storage_path {
            Some(path) => Arc::new(FileBackend::open(path)?),
            None => Arc::new(MemoryBackend::new()),
        };
        Self::assemble(config, Arc::new(catalog), backend, Arc::new(SystemClock))
    }

    /// Wires every component over an arbitrary entity directory.
    pub fn assemble<D>(
        config: &Config,
        directory: Arc<D>,
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
    ) -> std::result::Result<Self, StartupError>
    where
        D: EntityListing + DirectLookup + 'static,
    {
        let id_shape = IdShape::new(&config.id_pattern)?;

        let store = BoundedStore::open(backend, clock.clone(), StoreOptions::from_config(config));
        let store: SharedStore = Arc::new(RwLock::new(store));

        let existence = ExistenceCache::new(store.clone(), clock.clone(), config.existence_ttl_ms());
        let resolver = Arc::new(SlugResolver::new(
            directory.clone(),
            directory,
            existence,
            id_shape,
        ));

        let guard = Arc::new(InflightGuard::new(clock, config.inflight_window_ms()));
        let prefetcher = Arc::new(PrefetchCoordinator::new(resolver.clone(), guard));

        Ok(Self::new(store, resolver, prefetcher))
    }
}

/// Handler for GET /resolve/:company/:project
pub async fn resolve_project_handler(
    State(state): State<AppState>,
    Path((company_id, project)): Path<(String, String)>,
) -> Result<Json<ProjectResponse>> {
    match state.resolver.resolve_project(&company_id, &project).await {
        Resolution::Found { entity, matched_by } => Ok(Json(ProjectResponse {
            project: entity,
            matched_by,
        })),
        Resolution::NotFound => Err(ApiError::NotFound(format!(
            "Project '{}' not found",
            project
        ))),
    }
}

/// Handler for GET /resolve/:company/:project/:document
///
/// Resolves the project first, then the document inside it.
pub async fn resolve_path_handler(
    State(state): State<AppState>,
    Path((company_id, project, document)): Path<(String, String, String)>,
) -> Result<Json<PathResponse>> {
    match state
        .resolver
        .resolve_path(&company_id, &project, &document)
        .await
    {
        PathResolution::Resolved { project, document } => {
            Ok(Json(PathResponse::new(project, document)))
        }
        PathResolution::ProjectNotFound => Err(ApiError::NotFound(format!(
            "Project '{}' not found",
            project
        ))),
        PathResolution::DocumentNotFound { project } => Err(ApiError::NotFound(format!(
            "Document '{}' not found in project '{}'",
            document, project.id
        ))),
    }
}

/// Handler for GET /exists/:project/:document
///
/// Answers from the existence cache only; `unknown` means "go resolve".
pub async fn existence_handler(
    State(state): State<AppState>,
    Path((project_id, document)): Path<(String, String)>,
) -> Json<ExistenceResponse> {
    let status = state
        .resolver
        .existence()
        .check_existence(&project_id, &document)
        .await;

    Json(ExistenceResponse::new(project_id, document, status))
}

/// Handler for POST /prefetch
///
/// Schedules a background prefetch and returns 202 right away. Duplicate
/// requests for a target already in flight are accepted and dropped.
pub async fn prefetch_handler(
    State(state): State<AppState>,
    Json(req): Json<PrefetchRequest>,
) -> Result<(StatusCode, Json<PrefetchResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    state.prefetcher.prefetch(&req.project_id, &req.document);
    let key = PrefetchCoordinator::prefetch_key(&req.project_id, &req.document);
    debug!(key = %key, "Prefetch accepted");

    Ok((StatusCode::ACCEPTED, Json(PrefetchResponse::accepted(key))))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.store.read().await.stats();
    let inflight = state.prefetcher.guard().len();

    Json(StatsResponse::new(&stats, inflight))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::existence::Existence;
    use crate::resolver::MatchKind;

    fn test_state() -> AppState {
        let catalog = InMemoryCatalog::new()
            .with_project("acme", "proj_abc", "Kitchen Renovation")
            .with_document("proj_abc", "doc_123", "Invoice March.pdf");
        AppState::from_config(&Config::default(), catalog).unwrap()
    }

    fn path2(a: &str, b: &str) -> Path<(String, String)> {
        Path((a.to_string(), b.to_string()))
    }

    #[tokio::test]
    async fn test_resolve_project_by_slug() {
        let state = test_state();

        let response = resolve_project_handler(State(state), path2("acme", "kitchen-renovation"))
            .await
            .unwrap();
        assert_eq!(response.project.id, "proj_abc");
        assert_eq!(response.matched_by, MatchKind::BasicSlug);
    }

    #[tokio::test]
    async fn test_resolve_project_not_found() {
        let state = test_state();

        let result = resolve_project_handler(State(state), path2("acme", "no-such-project")).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_path_records_existence() {
        let state = test_state();

        let response = resolve_path_handler(
            State(state.clone()),
            Path((
                "acme".to_string(),
                "kitchen-renovation".to_string(),
                "invoice-march-pdf".to_string(),
            )),
        )
        .await
        .unwrap();
        assert_eq!(response.document.id, "doc_123");

        let exists = existence_handler(State(state), path2("proj_abc", "doc_123")).await;
        assert_eq!(exists.status, Existence::Yes);
    }

    #[tokio::test]
    async fn test_resolve_path_document_not_found() {
        let state = test_state();

        let result = resolve_path_handler(
            State(state),
            Path((
                "acme".to_string(),
                "proj_abc".to_string(),
                "missing-doc".to_string(),
            )),
        )
        .await;
        match result {
            Err(ApiError::NotFound(msg)) => assert!(msg.contains("proj_abc")),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_existence_unknown_without_check() {
        let state = test_state();

        let response = existence_handler(State(state), path2("proj_abc", "doc_123")).await;
        assert_eq!(response.status, Existence::Unknown);
    }

    #[tokio::test]
    async fn test_prefetch_invalid_request() {
        let state = test_state();

        let req = PrefetchRequest {
            project_id: "".to_string(),
            document: "doc_123".to_string(),
        };
        let result = prefetch_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_prefetch_accepted_and_marked() {
        let state = test_state();

        let req = PrefetchRequest {
            project_id: "proj_abc".to_string(),
            document: "doc_123".to_string(),
        };
        let (status, body) = prefetch_handler(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body.key, "proj_abc:doc_123");
        assert!(state.prefetcher.guard().is_marked("proj_abc:doc_123"));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert_eq!(response.inflight_prefetches, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
