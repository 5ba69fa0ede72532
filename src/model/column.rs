use serde::Serialize;

use super::status::StatusDefinition;
use super::task::NEEDS_REDISTRIBUTION;

/// Title of the temporary column
pub const REDISTRIBUTION_TITLE: &str = "Needs Redistribution";
/// Color of the temporary column
pub const REDISTRIBUTION_COLOR: &str = "#95a5a6";

/// A board column. Always derived from the active template and the task set;
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Status key, or [`NEEDS_REDISTRIBUTION`] for the temporary column
    pub id: String,
    pub title: String,
    pub color: String,
    /// Synthetic quarantine column
    pub temporary: bool,
    pub special: bool,
    pub approval_required: u32,
}

impl Column {
    /// The synthetic column holding orphaned tasks
    pub fn redistribution() -> Self {
        Column {
            id: NEEDS_REDISTRIBUTION.to_string(),
            title: REDISTRIBUTION_TITLE.to_string(),
            color: REDISTRIBUTION_COLOR.to_string(),
            temporary: true,
            special: false,
            approval_required: 0,
        }
    }
}

impl From<&StatusDefinition> for Column {
    fn from(status: &StatusDefinition) -> Self {
        Column {
            id: status.key.clone(),
            title: status.label.clone(),
            color: status.color.clone(),
            temporary: false,
            special: status.special,
            approval_required: if status.special {
                status.approval_required
            } else {
                0
            },
        }
    }
}
