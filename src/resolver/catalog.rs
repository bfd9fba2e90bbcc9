//! In-memory entity collaborator.
//!
//! Serves projects and documents from a fixed catalog, usually loaded from a
//! JSON file at startup. Listing order is catalog order.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::BackendResult;
use crate::resolver::{DirectLookup, EntityListing, ResolvedEntity};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    companies: Vec<CompanyRecord>,
}

#[derive(Debug, Deserialize)]
struct CompanyRecord {
    id: String,
    #[serde(default)]
    projects: Vec<ProjectRecord>,
}

#[derive(Debug, Deserialize)]
struct ProjectRecord {
    id: String,
    name: String,
    #[serde(default)]
    documents: Vec<DocumentRecord>,
}

#[derive(Debug, Deserialize)]
struct DocumentRecord {
    id: String,
    name: String,
}

/// Fixed set of projects and documents implementing both collaborator traits.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    projects: Vec<ResolvedEntity>,
    documents: Vec<ResolvedEntity>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(
        mut self,
        company_id: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.projects
            .push(ResolvedEntity::new(id, name).owned_by(company_id));
        self
    }

    pub fn with_document(
        mut self,
        project_id: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.documents
            .push(ResolvedEntity::new(id, name).owned_by(project_id));
        self
    }

    /// Parses a catalog of the form
    /// `{"companies": [{"id", "projects": [{"id", "name", "documents": [{"id", "name"}]}]}]}`.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        let mut catalog = Self::new();
        for company in file.companies {
            for project in company.projects {
                for document in project.documents {
                    catalog = catalog.with_document(project.id.clone(), document.id, document.name);
                }
                catalog = catalog.with_project(company.id.clone(), project.id, project.name);
            }
        }
        Ok(catalog)
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn owned<'a>(
        entities: &'a [ResolvedEntity],
        owner_id: &'a str,
    ) -> impl Iterator<Item = &'a ResolvedEntity> + 'a {
        entities
            .iter()
            .filter(move |e| e.owner_id.as_deref() == Some(owner_id))
    }
}

#[async_trait]
impl EntityListing for InMemoryCatalog {
    async fn list_projects(&self, company_id: &str) -> BackendResult<Vec<ResolvedEntity>> {
        Ok(Self::owned(&self.projects, company_id).cloned().collect())
    }

    async fn list_documents(&self, project_id: &str) -> BackendResult<Vec<ResolvedEntity>> {
        Ok(Self::owned(&self.documents, project_id).cloned().collect())
    }
}

#[async_trait]
impl DirectLookup for InMemoryCatalog {
    async fn get_project_by_id(&self, id: &str) -> BackendResult<Option<ResolvedEntity>> {
        Ok(self.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn get_document_by_id(
        &self,
        company_id: &str,
        project_id: &str,
        id: &str,
    ) -> BackendResult<Option<ResolvedEntity>> {
        // An empty company skips the ownership check
        let project_in_company = company_id.is_empty()
            || Self::owned(&self.projects, company_id).any(|p| p.id == project_id);
        if !project_in_company {
            return Ok(None);
        }
        Ok(Self::owned(&self.documents, project_id)
            .find(|d| d.id == id)
            .cloned())
    }
}
