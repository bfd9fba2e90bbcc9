//! Entities returned by collaborators and the outcomes of resolving them.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_ID_PATTERN;
use crate::slug::{basic_slug, SlugMatch};

/// A project or document as the backend describes it.
///
/// `slug` is always derived from `name`; `id` is the immutable backend key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEntity {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Owning company for a project, owning project for a document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl ResolvedEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            slug: basic_slug(&name),
            name,
            owner_id: None,
        }
    }

    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }
}

/// How an identifier was matched to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Fetched directly by canonical ID
    DirectId,
    /// Equal to a listed candidate's ID
    RawId,
    BasicSlug,
    NavigationSlug,
}

impl From<SlugMatch> for MatchKind {
    fn from(value: SlugMatch) -> Self {
        match value {
            SlugMatch::RawId => MatchKind::RawId,
            SlugMatch::BasicSlug => MatchKind::BasicSlug,
            SlugMatch::NavigationSlug => MatchKind::NavigationSlug,
        }
    }
}

/// Outcome of resolving a single identifier. `NotFound` is an ordinary result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found {
        entity: ResolvedEntity,
        matched_by: MatchKind,
    },
    NotFound,
}

impl Resolution {
    pub fn entity(&self) -> Option<&ResolvedEntity> {
        match self {
            Resolution::Found { entity, .. } => Some(entity),
            Resolution::NotFound => None,
        }
    }

    pub fn into_entity(self) -> Option<ResolvedEntity> {
        match self {
            Resolution::Found { entity, .. } => Some(entity),
            Resolution::NotFound => None,
        }
    }

    pub fn matched_by(&self) -> Option<MatchKind> {
        match self {
            Resolution::Found { matched_by, .. } => Some(*matched_by),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }
}

/// Outcome of resolving a `company/project/document` route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathResolution {
    Resolved {
        project: ResolvedEntity,
        document: ResolvedEntity,
    },
    ProjectNotFound,
    DocumentNotFound {
        project: ResolvedEntity,
    },
}

/// The shape of a canonical backend ID.
///
/// Identifiers with this shape are tried as direct lookups before any listing
/// is fetched.
#[derive(Debug, Clone)]
pub struct IdShape(Regex);

impl IdShape {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn matches(&self, identifier: &str) -> bool {
        self.0.is_match(identifier)
    }
}

impl Default for IdShape {
    fn default() -> Self {
        Self(Regex::new(DEFAULT_ID_PATTERN).expect("default ID pattern compiles"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_slug_derived_from_name() {
        let entity = ResolvedEntity::new("proj_abc", "Kitchen Renovation").owned_by("acme");
        assert_eq!(entity.slug, "kitchen-renovation");
        assert_eq!(entity.owner_id.as_deref(), Some("acme"));
    }

    #[test]
    fn test_entity_serializes_camel_case() {
        let entity = ResolvedEntity::new("doc_1", "A").owned_by("p1");
        let json = serde_json::to_string(&entity).unwrap();
        assert!(json.contains("\"ownerId\":\"p1\""));

        let bare = serde_json::to_string(&ResolvedEntity::new("doc_1", "A")).unwrap();
        assert!(!bare.contains("ownerId"));
    }

    #[test]
    fn test_default_id_shape() {
        let shape = IdShape::default();
        assert!(shape.matches("p1"));
        assert!(shape.matches("proj_abc"));
        assert!(shape.matches("doc_123"));
        assert!(!shape.matches("kitchen-reno"));
        assert!(!shape.matches("nonexistent"));
        assert!(!shape.matches("invoice-march-pdf"));
        assert!(!shape.matches(""));
    }

    #[test]
    fn test_custom_id_shape() {
        let shape = IdShape::new(r"^[0-9a-f]{8}$").unwrap();
        assert!(shape.matches("deadbeef"));
        assert!(!shape.matches("p1"));
        assert!(IdShape::new("(").is_err());
    }

    #[test]
    fn test_resolution_accessors() {
        let found = Resolution::Found {
            entity: ResolvedEntity::new("p1", "Kitchen Reno"),
            matched_by: MatchKind::BasicSlug,
        };
        assert!(found.is_found());
        assert_eq!(found.matched_by(), Some(MatchKind::BasicSlug));
        assert_eq!(found.entity().map(|e| e.id.as_str()), Some("p1"));
        assert_eq!(Resolution::NotFound.into_entity(), None);
    }
}
