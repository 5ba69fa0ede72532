use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Status key of the quarantine column for tasks whose status is not part of
/// the active template.
pub const NEEDS_REDISTRIBUTION: &str = "needs_redistribution";

/// Backend-assigned task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('#').parse().map(TaskId)
    }
}

/// A checklist item under a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// A task on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Status key: a key of the active template, or [`NEEDS_REDISTRIBUTION`]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Member ids
    #[serde(default)]
    pub assignees: BTreeSet<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
    /// Comment thread, owned by the chat collaborator and carried as-is
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<serde_json::Value>,
}

impl Task {
    pub fn new(id: TaskId, title: impl Into<String>, status: impl Into<String>) -> Self {
        Task {
            id,
            title: title.into(),
            description: String::new(),
            status: status.into(),
            start_date: None,
            end_date: None,
            assignees: BTreeSet::new(),
            subtasks: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Whether this task sits in the temporary redistribution column
    pub fn needs_redistribution(&self) -> bool {
        self.status == NEEDS_REDISTRIBUTION
    }
}

/// Fields supplied when creating a task; the status is chosen by the board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignees: BTreeSet<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_parses_with_or_without_hash() {
        assert_eq!("42".parse::<TaskId>().unwrap(), TaskId(42));
        assert_eq!("#7".parse::<TaskId>().unwrap(), TaskId(7));
        assert!("abc".parse::<TaskId>().is_err());
    }

    #[test]
    fn task_serde_defaults_on_minimal_object() {
        let task: Task =
            serde_json::from_str(r#"{"id": 3, "title": "Write docs", "status": "to_do"}"#).unwrap();
        assert_eq!(task.id, TaskId(3));
        assert!(task.description.is_empty());
        assert!(task.start_date.is_none());
        assert!(task.assignees.is_empty());
        assert!(task.comments.is_empty());
    }

    #[test]
    fn comments_survive_round_trip_untouched() {
        let text = r#"{"id":1,"title":"t","status":"x","comments":[{"author":5,"body":"hi"}]}"#;
        let task: Task = serde_json::from_str(text).unwrap();
        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["comments"][0]["body"], "hi");
    }
}
