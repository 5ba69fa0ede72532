use serde::{Deserialize, Serialize};

/// One status in a workflow template. Becomes one board column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDefinition {
    /// Status key stored on tasks (unique within a template)
    pub key: String,
    /// Human-readable column title
    pub label: String,
    /// Column color as a `#rrggbb` string
    pub color: String,
    /// Approval-gated status
    #[serde(default)]
    pub special: bool,
    /// Number of approvals needed; only meaningful when `special` is set
    #[serde(default)]
    pub approval_required: u32,
    /// Free-text approval requirement shown for special statuses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
}

impl StatusDefinition {
    /// A plain (non-approval) status
    pub fn new(key: &str, label: &str, color: &str) -> Self {
        StatusDefinition {
            key: key.to_string(),
            label: label.to_string(),
            color: color.to_string(),
            special: false,
            approval_required: 0,
            requirement: None,
        }
    }

    /// An approval-gated status
    pub fn special(key: &str, label: &str, color: &str, approvals: u32, requirement: &str) -> Self {
        StatusDefinition {
            special: true,
            approval_required: approvals,
            requirement: Some(requirement.to_string()),
            ..StatusDefinition::new(key, label, color)
        }
    }
}

/// A named, ordered catalog of statuses. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTemplate {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    /// Statuses in column order (leftmost first)
    pub statuses: Vec<StatusDefinition>,
}

impl StatusTemplate {
    /// Whether `key` is one of this template's status keys
    pub fn has_key(&self, key: &str) -> bool {
        self.statuses.iter().any(|s| s.key == key)
    }

    /// The leftmost status, assigned to newly created tasks
    pub fn initial_status(&self) -> Option<&StatusDefinition> {
        self.statuses.first()
    }

    pub fn status(&self, key: &str) -> Option<&StatusDefinition> {
        self.statuses.iter().find(|s| s.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.statuses.iter().map(|s| s.key.as_str())
    }
}
