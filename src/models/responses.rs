//! Response DTOs for the HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::existence::Existence;
use crate::resolver::{MatchKind, ResolvedEntity};
use crate::store::StoreStats;

/// Response body for GET /resolve/:company/:project
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub project: ResolvedEntity,
    /// Which strategy matched the identifier
    pub matched_by: MatchKind,
}

/// Response body for GET /resolve/:company/:project/:document
#[derive(Debug, Clone, Serialize)]
pub struct PathResponse {
    pub project: ResolvedEntity,
    pub document: ResolvedEntity,
}

impl PathResponse {
    pub fn new(project: ResolvedEntity, document: ResolvedEntity) -> Self {
        Self { project, document }
    }
}

/// Response body for GET /exists/:project/:document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistenceResponse {
    pub project_id: String,
    pub document: String,
    /// `yes`, `no` or `unknown`
    pub status: Existence,
}

impl ExistenceResponse {
    pub fn new(project_id: impl Into<String>, document: impl Into<String>, status: Existence) -> Self {
        Self {
            project_id: project_id.into(),
            document: document.into(),
            status,
        }
    }
}

/// Response body for POST /prefetch
#[derive(Debug, Clone, Serialize)]
pub struct PrefetchResponse {
    /// Success message
    pub message: String,
    /// The in-flight key for the target
    pub key: String,
}

impl PrefetchResponse {
    /// Creates a new PrefetchResponse
    pub fn accepted(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Prefetch for '{}' accepted", key),
            key,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Number of store hits
    pub hits: u64,
    /// Number of store misses
    pub misses: u64,
    /// Number of LRU evictions
    pub evictions: u64,
    /// Number of entries dropped after their TTL
    pub expirations: u64,
    /// Number of writes that did not take place
    pub write_failures: u64,
    /// Number of emergency purges
    pub emergency_purges: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
    pub used_bytes: usize,
    pub capacity_bytes: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Prefetch markers currently held
    pub inflight_prefetches: usize,
}

impl StatsResponse {
    /// Creates a new StatsResponse from store statistics
    pub fn new(stats: &StoreStats, inflight_prefetches: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            write_failures: stats.write_failures,
            emergency_purges: stats.emergency_purges,
            total_entries: stats.total_entries,
            used_bytes: stats.used_bytes,
            capacity_bytes: stats.capacity_bytes,
            hit_rate: stats.hit_rate(),
            inflight_prefetches,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
