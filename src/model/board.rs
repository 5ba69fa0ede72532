use super::column::Column;
use super::status::StatusTemplate;
use super::task::{Task, TaskId};
use crate::ops::columns::derive_columns;

/// The task set of one board plus the template that currently shapes it.
///
/// Owned by a single [`BoardController`](crate::board::BoardController) and
/// threaded explicitly through the pure board functions.
#[derive(Debug, Clone)]
pub struct BoardContext {
    pub board_id: String,
    pub template: StatusTemplate,
    pub tasks: Vec<Task>,
}

impl BoardContext {
    pub fn new(board_id: impl Into<String>, template: StatusTemplate, tasks: Vec<Task>) -> Self {
        BoardContext {
            board_id: board_id.into(),
            template,
            tasks,
        }
    }

    /// Columns for the current template and tasks. Recomputed on every call.
    pub fn columns(&self) -> Vec<Column> {
        derive_columns(&self.template, &self.tasks)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}
