//! Request DTOs for the HTTP API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Maximum accepted length of a project ID or document identifier
pub const MAX_IDENTIFIER_LENGTH: usize = 256;

/// Request body for POST /prefetch
///
/// # Fields
/// - `project_id`: Canonical ID of the project holding the document
/// - `document`: Document ID or slug the user is about to open
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefetchRequest {
    pub project_id: String,
    pub document: String,
}

impl PrefetchRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        for (field, value) in [("projectId", &self.project_id), ("document", &self.document)] {
            if value.trim().is_empty() {
                return Some(format!("{} cannot be empty", field));
            }
            if value.len() > MAX_IDENTIFIER_LENGTH {
                return Some(format!(
                    "{} exceeds maximum length of {} characters",
                    field, MAX_IDENTIFIER_LENGTH
                ));
            }
        }
        None
    }
}
