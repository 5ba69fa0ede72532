use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;

use serde::Serialize;

use crate::model::column::REDISTRIBUTION_TITLE;
use crate::model::status::StatusTemplate;
use crate::model::task::{NEEDS_REDISTRIBUTION, Task, TaskId};

/// A task whose sentinel status could not be written back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistFailure {
    pub task_id: TaskId,
    pub message: String,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Tasks moved to the sentinel status in memory
    pub migrated_count: usize,
    /// Tasks whose write-back failed. Their in-memory status is still the
    /// sentinel; retrying is up to the caller.
    pub failures: Vec<PersistFailure>,
}

impl Reconciliation {
    pub fn failed_ids(&self) -> Vec<TaskId> {
        self.failures.iter().map(|f| f.task_id).collect()
    }

    /// Toast text for this pass, if anything moved
    pub fn notification(&self) -> Option<String> {
        match self.migrated_count {
            0 => None,
            1 => Some(format!("1 task moved to \"{}\" column", REDISTRIBUTION_TITLE)),
            n => Some(format!("{} tasks moved to \"{}\" column", n, REDISTRIBUTION_TITLE)),
        }
    }
}

/// Ids of tasks whose status is neither a template key nor the sentinel.
pub fn orphaned_task_ids(template: &StatusTemplate, tasks: &[Task]) -> Vec<TaskId> {
    let valid: HashSet<&str> = template.keys().collect();
    tasks
        .iter()
        .filter(|t| is_orphan(&valid, t))
        .map(|t| t.id)
        .collect()
}

fn is_orphan(valid: &HashSet<&str>, task: &Task) -> bool {
    task.status != NEEDS_REDISTRIBUTION && !valid.contains(task.status.as_str())
}

/// Move every orphaned task to the sentinel status.
///
/// Each orphan is updated in memory first and then handed to `persist`.
/// A failing write is recorded and the batch keeps going, so one bad call
/// never undoes the tasks already migrated. Tasks already carrying the
/// sentinel are skipped, which makes a second pass a no-op.
pub async fn reconcile<F, Fut, E>(
    template: &StatusTemplate,
    tasks: &mut [Task],
    mut persist: F,
) -> Reconciliation
where
    F: FnMut(TaskId, String) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let valid: HashSet<&str> = template.keys().collect();
    let mut outcome = Reconciliation::default();

    for task in tasks.iter_mut() {
        if !is_orphan(&valid, task) {
            continue;
        }
        tracing::debug!(task = %task.id, from = %task.status, "quarantining orphaned task");
        task.status = NEEDS_REDISTRIBUTION.to_string();
        outcome.migrated_count += 1;

        if let Err(e) = persist(task.id, NEEDS_REDISTRIBUTION.to_string()).await {
            tracing::warn!(task = %task.id, error = %e, "failed to persist redistribution status");
            outcome.failures.push(PersistFailure {
                task_id: task.id,
                message: e.to_string(),
            });
        }
    }

    if outcome.migrated_count > 0 {
        tracing::info!(
            template = %template.id,
            migrated = outcome.migrated_count,
            failed = outcome.failures.len(),
            "reconciled orphaned tasks"
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::templates::StatusTemplateRegistry;
    use std::cell::RefCell;

    fn simple() -> StatusTemplate {
        StatusTemplateRegistry::builtin()
            .get_template("simple")
            .unwrap()
            .clone()
    }

    async fn always_ok(_: TaskId, _: String) -> Result<(), String> {
        Ok(())
    }

    #[test]
    fn orphaned_ids_skip_valid_and_sentinel() {
        let tasks = vec![
            Task::new(TaskId(1), "a", "to_do"),
            Task::new(TaskId(2), "b", "under_review"),
            Task::new(TaskId(3), "c", NEEDS_REDISTRIBUTION),
            Task::new(TaskId(4), "d", ""),
        ];
        assert_eq!(orphaned_task_ids(&simple(), &tasks), vec![TaskId(2), TaskId(4)]);
    }

    #[tokio::test]
    async fn migrates_only_orphans_and_persists_each() {
        let mut tasks = vec![
            Task::new(TaskId(1), "a", "to_do"),
            Task::new(TaskId(2), "b", "under_review"),
            Task::new(TaskId(3), "c", "code_review"),
        ];
        let written = RefCell::new(Vec::new());
        let result = reconcile(&simple(), &mut tasks, |id, status| {
            written.borrow_mut().push((id, status));
            async { Ok::<(), String>(()) }
        })
        .await;

        assert_eq!(result.migrated_count, 2);
        assert!(result.failures.is_empty());
        assert_eq!(tasks[0].status, "to_do");
        assert_eq!(tasks[1].status, NEEDS_REDISTRIBUTION);
        assert_eq!(tasks[2].status, NEEDS_REDISTRIBUTION);
        assert_eq!(
            written.into_inner(),
            vec![
                (TaskId(2), NEEDS_REDISTRIBUTION.to_string()),
                (TaskId(3), NEEDS_REDISTRIBUTION.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn failures_are_collected_and_do_not_abort() {
        let mut tasks = vec![
            Task::new(TaskId(1), "a", "gone"),
            Task::new(TaskId(2), "b", "gone"),
            Task::new(TaskId(3), "c", "gone"),
        ];
        let result = reconcile(&simple(), &mut tasks, |id, _| async move {
            if id == TaskId(2) {
                Err("backend unavailable".to_string())
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(result.migrated_count, 3);
        assert_eq!(result.failed_ids(), vec![TaskId(2)]);
        assert_eq!(result.failures[0].message, "backend unavailable");
        // In-memory status moves even when the write failed
        assert!(tasks.iter().all(|t| t.status == NEEDS_REDISTRIBUTION));
    }

    #[tokio::test]
    async fn second_pass_is_a_no_op() {
        let mut tasks = vec![
            Task::new(TaskId(1), "a", "to_do"),
            Task::new(TaskId(2), "b", "archived"),
        ];
        let template = simple();
        reconcile(&template, &mut tasks, always_ok).await;
        let after_first = tasks.clone();

        let calls = RefCell::new(0);
        let second = reconcile(&template, &mut tasks, |_, _| {
            *calls.borrow_mut() += 1;
            async { Ok::<(), String>(()) }
        })
        .await;

        assert_eq!(second, Reconciliation::default());
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(tasks, after_first);
    }

    #[tokio::test]
    async fn matching_board_is_untouched() {
        let mut tasks = vec![Task::new(TaskId(1), "a", "completed")];
        let result = reconcile(&simple(), &mut tasks, always_ok).await;
        assert_eq!(result.migrated_count, 0);
        assert!(result.notification().is_none());
    }

    #[test]
    fn notification_text_pluralizes() {
        let one = Reconciliation {
            migrated_count: 1,
            failures: vec![],
        };
        assert_eq!(
            one.notification().unwrap(),
            "1 task moved to \"Needs Redistribution\" column"
        );
        let many = Reconciliation {
            migrated_count: 4,
            failures: vec![],
        };
        assert_eq!(
            many.notification().unwrap(),
            "4 tasks moved to \"Needs Redistribution\" column"
        );
    }
}
