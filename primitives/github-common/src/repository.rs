//! Repository records returned by the organization listing.

use serde::Deserialize;

/// A repository belonging to the target organization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryRecord {
    /// Short name, e.g. `api`.
    pub name: String,

    /// Owner-qualified name, e.g. `my-org/api`.
    #[serde(default)]
    pub full_name: String,
}

impl RepositoryRecord {
    pub fn new(org: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            full_name: format!("{org}/{name}"),
            name,
        }
    }

    /// Fills in `full_name` when the listing omitted it.
    pub(crate) fn qualify(mut self, org: &str) -> Self {
        if self.full_name.is_empty() {
            self.full_name = format!("{org}/{}", self.name);
        }
        self
    }

    /// Case-insensitive substring match on the short name.
    pub fn name_contains(&self, pattern: &str) -> bool {
        self.name.to_lowercase().contains(&pattern.to_lowercase())
    }
}
