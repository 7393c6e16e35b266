//! Project lookup.

use serde::{Deserialize, Serialize};

/// A project visible to the current organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// The API sends ids as strings or bare numbers.
    #[serde(deserialize_with = "crate::record::string_or_number")]
    pub id: String,
    pub slug: String,
}

impl Project {
    pub fn new(id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
        }
    }
}

/// Slug of the project with `project_id`, if it is in `projects`.
pub fn find_project_slug(projects: &[Project], project_id: &str) -> Option<String> {
    projects
        .iter()
        .find(|p| p.id == project_id)
        .map(|p| p.slug.clone())
}
