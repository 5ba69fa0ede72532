use serde::Serialize;

use crate::model::column::Column;
use crate::model::task::{NEEDS_REDISTRIBUTION, Task};

/// Why a status move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum MoveRejection {
    #[error("task is already in that column")]
    NoOpMove,
    #[error("tasks cannot be moved into the redistribution column")]
    InvalidDestination,
    #[error("no such column on this board")]
    UnknownColumn,
}

/// Serializable answer to a move request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveVerdict {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<MoveRejection>,
}

impl From<Result<(), MoveRejection>> for MoveVerdict {
    fn from(result: Result<(), MoveRejection>) -> Self {
        match result {
            Ok(()) => MoveVerdict {
                accepted: true,
                reason: None,
            },
            Err(reason) => MoveVerdict {
                accepted: false,
                reason: Some(reason),
            },
        }
    }
}

/// Check whether `task` may move from `from` to `to` on a board showing
/// `columns`. Rules apply in order; the first that fails decides.
pub fn can_move(_task: &Task, from: &str, to: &str, columns: &[Column]) -> Result<(), MoveRejection> {
    if from == to {
        return Err(MoveRejection::NoOpMove);
    }
    // The temporary column is filled only by reconciliation.
    if to == NEEDS_REDISTRIBUTION {
        return Err(MoveRejection::InvalidDestination);
    }
    if !columns.iter().any(|c| c.id == to) {
        return Err(MoveRejection::UnknownColumn);
    }
    Ok(())
}

/// Toast text after an accepted move
pub fn move_message(from: &Column, to: &Column) -> String {
    if from.temporary {
        format!("Task redistributed to \"{}\"", to.title)
    } else {
        format!("Task moved from \"{}\" to \"{}\"", from.title, to.title)
    }
}
