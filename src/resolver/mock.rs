//! Counting collaborator for resolver and prefetch tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::clock::SystemClock;
use crate::error::{BackendError, BackendResult};
use crate::existence::{ExistenceCache, EXISTENCE_TTL_MS};
use crate::resolver::{DirectLookup, EntityListing, InMemoryCatalog, ResolvedEntity};
use crate::store::{BoundedStore, MemoryBackend, StoreOptions};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CallCounts {
    pub project_listings: usize,
    pub document_listings: usize,
    pub project_lookups: usize,
    pub document_lookups: usize,
}

/// Wraps an [`InMemoryCatalog`], counting calls and optionally failing or stalling them.
#[derive(Debug, Default)]
pub(crate) struct MockDirectory {
    catalog: InMemoryCatalog,
    project_listings: AtomicUsize,
    document_listings: AtomicUsize,
    project_lookups: AtomicUsize,
    document_lookups: AtomicUsize,
    fail_listings: AtomicBool,
    fail_lookups: AtomicBool,
    delay: Option<Duration>,
}

impl MockDirectory {
    pub fn new(catalog: InMemoryCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_listings(&self, fail: bool) {
        self.fail_listings.store(fail, Ordering::SeqCst);
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            project_listings: self.project_listings.load(Ordering::SeqCst),
            document_listings: self.document_listings.load(Ordering::SeqCst),
            project_lookups: self.project_lookups.load(Ordering::SeqCst),
            document_lookups: self.document_lookups.load(Ordering::SeqCst),
        }
    }

    async fn enter(&self, counter: &AtomicUsize, fail: &AtomicBool) -> BackendResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if fail.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityListing for MockDirectory {
    async fn list_projects(&self, company_id: &str) -> BackendResult<Vec<ResolvedEntity>> {
        self.enter(&self.project_listings, &self.fail_listings).await?;
        self.catalog.list_projects(company_id).await
    }

    async fn list_documents(&self, project_id: &str) -> BackendResult<Vec<ResolvedEntity>> {
        self.enter(&self.document_listings, &self.fail_listings).await?;
        self.catalog.list_documents(project_id).await
    }
}

#[async_trait]
impl DirectLookup for MockDirectory {
    async fn get_project_by_id(&self, id: &str) -> BackendResult<Option<ResolvedEntity>> {
        self.enter(&self.project_lookups, &self.fail_lookups).await?;
        self.catalog.get_project_by_id(id).await
    }

    async fn get_document_by_id(
        &self,
        company_id: &str,
        project_id: &str,
        id: &str,
    ) -> BackendResult<Option<ResolvedEntity>> {
        self.enter(&self.document_lookups, &self.fail_lookups).await?;
        self.catalog.get_document_by_id(company_id, project_id, id).await
    }
}

/// Fresh existence cache over an in-memory store.
pub(crate) fn existence_cache() -> ExistenceCache {
    let clock = Arc::new(SystemClock);
    let store = Arc::new(RwLock::new(BoundedStore::open(
        Arc::new(MemoryBackend::new()),
        clock.clone(),
        StoreOptions::new(256 * 1024),
    )));
    ExistenceCache::new(store, clock, EXISTENCE_TTL_MS)
}
