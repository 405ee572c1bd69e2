use serde::{Deserialize, Serialize};

/// A record from the external agent directory, as cached locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryAgent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub online: bool,
    /// Capability tags, e.g. offering names.
    pub capabilities: Vec<String>,
}

impl RegistryAgent {
    /// Case-insensitive name hit.
    pub fn name_matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
    }

    /// Case-insensitive category or capability-tag hit.
    pub fn tag_matches(&self, needle: &str) -> bool {
        self.category.to_lowercase().contains(needle)
            || self
                .capabilities
                .iter()
                .any(|c| c.to_lowercase().contains(needle))
    }
}
