use crate::model::status::StatusTemplate;
use crate::model::task::{NewTask, Task, TaskId};

/// Error type for task operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("template {0} has no statuses")]
    EmptyTemplate(String),
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("no task ids left after {0}")]
    IdsExhausted(TaskId),
}

/// Build a task from `fields`, placed in the leftmost column of `template`.
pub fn new_task(id: TaskId, fields: NewTask, template: &StatusTemplate) -> Result<Task, TaskError> {
    let title = fields.title.trim();
    if title.is_empty() {
        return Err(TaskError::EmptyTitle);
    }
    let initial = template
        .initial_status()
        .ok_or_else(|| TaskError::EmptyTemplate(template.id.clone()))?;

    let mut task = Task::new(id, title, initial.key.clone());
    task.description = fields.description;
    task.start_date = fields.start_date;
    task.end_date = fields.end_date;
    task.assignees = fields.assignees;
    Ok(task)
}

/// Next free id after the highest one in `tasks`
pub fn next_task_id(tasks: &[Task]) -> Result<TaskId, TaskError> {
    let highest = tasks.iter().map(|t| t.id.0).max().unwrap_or(0);
    highest
        .checked_add(1)
        .map(TaskId)
        .ok_or(TaskError::IdsExhausted(TaskId(highest)))
}

/// Overwrite a task's status. Callers validate the move first.
pub fn set_status(tasks: &mut [Task], id: TaskId, status: &str) -> Result<(), TaskError> {
    let task = tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or(TaskError::NotFound(id))?;
    task.status = status.to_string();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::templates::StatusTemplateRegistry;

    #[test]
    fn new_task_lands_in_leftmost_column() {
        let reg = StatusTemplateRegistry::builtin();
        let agile = reg.get_template("agile").unwrap();
        let task = new_task(
            TaskId(9),
            NewTask {
                title: "  Ship login  ".into(),
                ..Default::default()
            },
            agile,
        )
        .unwrap();
        assert_eq!(task.status, "backlog");
        assert_eq!(task.title, "Ship login");
        assert_eq!(task.id, TaskId(9));
    }

    #[test]
    fn blank_title_rejected() {
        let reg = StatusTemplateRegistry::builtin();
        let err = new_task(TaskId(1), NewTask::default(), reg.active()).unwrap_err();
        assert_eq!(err, TaskError::EmptyTitle);
    }

    #[test]
    fn empty_template_rejected() {
        let mut empty = StatusTemplateRegistry::builtin().active().clone();
        empty.statuses.clear();
        let fields = NewTask {
            title: "x".into(),
            ..Default::default()
        };
        assert_eq!(
            new_task(TaskId(1), fields, &empty).unwrap_err(),
            TaskError::EmptyTemplate("default".into())
        );
    }

    #[test]
    fn next_id_follows_highest() {
        assert_eq!(next_task_id(&[]), Ok(TaskId(1)));
        let tasks = vec![Task::new(TaskId(4), "a", "x"), Task::new(TaskId(2), "b", "x")];
        assert_eq!(next_task_id(&tasks), Ok(TaskId(5)));
    }

    #[test]
    fn next_id_after_max_is_an_error() {
        let tasks = vec![Task::new(TaskId(u64::MAX), "last", "x")];
        assert_eq!(
            next_task_id(&tasks),
            Err(TaskError::IdsExhausted(TaskId(u64::MAX)))
        );
    }

    #[test]
    fn set_status_missing_task() {
        let mut tasks = vec![Task::new(TaskId(1), "a", "x")];
        set_status(&mut tasks, TaskId(1), "y").unwrap();
        assert_eq!(tasks[0].status, "y");
        assert_eq!(
            set_status(&mut tasks, TaskId(2), "y").unwrap_err(),
            TaskError::NotFound(TaskId(2))
        );
    }
}
