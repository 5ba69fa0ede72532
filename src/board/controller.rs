use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};

use super::events::{BoardEvent, CycleReason};
use super::guard::CycleGuard;
use crate::io::board_io::BoardIoError;
use crate::io::repository::{RepositoryError, TaskRepository};
use crate::model::board::BoardContext;
use crate::model::column::Column;
use crate::model::status::StatusTemplate;
use crate::model::task::{NewTask, Task, TaskId};
use crate::ops::moves::{self, MoveVerdict};
use crate::ops::reconcile::{Reconciliation, reconcile};
use crate::ops::templates::{RegistryError, StatusTemplateRegistry};

const EVENT_CAPACITY: usize = 64;

/// Error type for board controller operations
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("{operation} timed out after {after:?}; not retried")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Config(#[from] BoardIoError),
}

/// Result of asking for a reconcile cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle (and any follow-ups folded into it) ran; this is the last
    /// pass's reconciliation.
    Completed(Reconciliation),
    /// Another cycle was in flight; it will run once more when done.
    Queued,
}

/// Owns one board: its template registry, its task context and the task
/// store. All reconciliation goes through [`run_cycle`](Self::run_cycle).
pub struct BoardController {
    board_id: String,
    registry: RwLock<StatusTemplateRegistry>,
    context: Mutex<BoardContext>,
    repo: Arc<dyn TaskRepository>,
    guard: CycleGuard,
    events: broadcast::Sender<BoardEvent>,
    request_timeout: Duration,
    input_focused: AtomicBool,
}

impl BoardController {
    pub fn new(
        board_id: impl Into<String>,
        registry: StatusTemplateRegistry,
        repo: Arc<dyn TaskRepository>,
        request_timeout: Duration,
    ) -> Self {
        let board_id = board_id.into();
        let context = BoardContext::new(board_id.clone(), registry.active().clone(), Vec::new());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        BoardController {
            board_id,
            registry: RwLock::new(registry),
            context: Mutex::new(context),
            repo,
            guard: CycleGuard::new(),
            events,
            request_timeout,
            input_focused: AtomicBool::new(false),
        }
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    /// Stream of notifications. Subscribers only see events sent after
    /// subscribing.
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    pub fn templates(&self) -> Vec<StatusTemplate> {
        self.read_registry().list_templates().cloned().collect()
    }

    pub fn active_template_id(&self) -> String {
        self.read_registry().active_id().to_string()
    }

    /// Switch templates and reconcile. This is the only path from a template
    /// change to task migration.
    pub async fn activate_template(&self, id: &str) -> Result<CycleOutcome, BoardError> {
        {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            registry.set_active(id)?;
        }
        tracing::info!(board = %self.board_id, template = id, "activated status template");
        self.run_cycle(CycleReason::TemplateChanged).await
    }

    // -----------------------------------------------------------------------
    // Reconcile cycle
    // -----------------------------------------------------------------------

    /// Load tasks, reconcile them against the active template and publish the
    /// result. Single-flight: a call made while a cycle runs returns
    /// [`CycleOutcome::Queued`] and the running cycle repeats once.
    ///
    /// A queued follow-up runs even when the current cycle fails. The result
    /// is that of the last cycle run.
    pub async fn run_cycle(&self, reason: CycleReason) -> Result<CycleOutcome, BoardError> {
        let Some(permit) = self.guard.try_begin() else {
            tracing::debug!(board = %self.board_id, ?reason, "cycle in flight; queued follow-up");
            return Ok(CycleOutcome::Queued);
        };
        let mut reason = reason;
        loop {
            let result = self.cycle_once(reason).await;
            if !permit.take_rerun() {
                return result.map(CycleOutcome::Completed);
            }
            if let Err(e) = &result {
                tracing::warn!(board = %self.board_id, ?reason, error = %e, "cycle failed; running queued follow-up");
            }
            reason = CycleReason::Refresh;
        }
    }

    async fn cycle_once(&self, reason: CycleReason) -> Result<Reconciliation, BoardError> {
        let template = self.read_registry().active().clone();
        let mut context = self.context.lock().await;
        tracing::debug!(board = %self.board_id, ?reason, template = %template.id, "reconcile cycle");

        let mut tasks = self
            .bounded("load tasks", self.repo.load_tasks(&self.board_id))
            .await?;

        let repo = &*self.repo;
        let limit = self.request_timeout;
        let outcome = reconcile(&template, &mut tasks, move |id, status| async move {
            bounded(limit, "update task status", repo.update_task_status(id, &status)).await
        })
        .await;

        // Template and tasks change together, after reconciliation finished.
        context.template = template;
        context.tasks = tasks;

        let _ = self
            .events
            .send(BoardEvent::reconciled(reason, &context.template.id, &outcome));
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Rendering queries
    // -----------------------------------------------------------------------

    /// Columns for the current board, derived fresh on each call.
    pub async fn derive_columns(&self) -> Vec<Column> {
        self.context.lock().await.columns()
    }

    /// Copy of the current board state
    pub async fn snapshot(&self) -> BoardContext {
        self.context.lock().await.clone()
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Move a task to `target`. Rejections come back as a verdict; store
    /// failures and timeouts as errors, leaving the board unchanged.
    pub async fn attempt_move(&self, task_id: TaskId, target: &str) -> Result<MoveVerdict, BoardError> {
        let mut context = self.context.lock().await;
        let columns = context.columns();
        let task = context.task(task_id).ok_or(BoardError::TaskNotFound(task_id))?;
        let from = task.status.clone();

        if let Err(reason) = moves::can_move(task, &from, target, &columns) {
            tracing::debug!(task = %task_id, from = %from, to = target, %reason, "move rejected");
            return Ok(MoveVerdict::from(Err(reason)));
        }

        self.bounded("update task status", self.repo.update_task_status(task_id, target))
            .await?;
        if let Some(task) = context.task_mut(task_id) {
            task.status = target.to_string();
        }

        let message = match (
            columns.iter().find(|c| c.id == from),
            columns.iter().find(|c| c.id == target),
        ) {
            (Some(a), Some(b)) => moves::move_message(a, b),
            _ => format!("Task moved to \"{}\"", target),
        };
        tracing::info!(task = %task_id, from = %from, to = target, "task moved");
        let _ = self.events.send(BoardEvent::TaskMoved {
            task_id,
            from,
            to: target.to_string(),
            message,
        });
        Ok(MoveVerdict::from(Ok(())))
    }

    /// Create a task in the leftmost column of the board's current template.
    pub async fn create_task(&self, fields: NewTask) -> Result<Task, BoardError> {
        let mut context = self.context.lock().await;
        let task = self
            .bounded(
                "create task",
                self.repo.create_task(&self.board_id, fields, &context.template),
            )
            .await?;
        context.tasks.push(task.clone());
        Ok(task)
    }

    // -----------------------------------------------------------------------
    // Input focus (auto-refresh suppression)
    // -----------------------------------------------------------------------

    pub fn set_input_focus(&self, focused: bool) {
        self.input_focused.store(focused, Ordering::SeqCst);
    }

    pub fn input_focused(&self) -> bool {
        self.input_focused.load(Ordering::SeqCst)
    }

    fn read_registry(&self) -> std::sync::RwLockReadGuard<'_, StatusTemplateRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, BoardError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        bounded(self.request_timeout, operation, fut).await
    }
}

/// Run a store call with a deadline. Timeouts fail fast and are not retried.
async fn bounded<T, F>(limit: Duration, operation: &'static str, fut: F) -> Result<T, BoardError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            tracing::error!(operation, after = ?limit, "task store call timed out");
            Err(BoardError::Timeout {
                operation,
                after: limit,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::repository::MemoryRepository;
    use crate::model::task::NEEDS_REDISTRIBUTION;
    use crate::ops::moves::MoveRejection;

    fn controller(tasks: Vec<Task>) -> (BoardController, Arc<MemoryRepository>) {
        let repo = Arc::new(MemoryRepository::new(tasks));
        let ctl = BoardController::new(
            "board-1",
            StatusTemplateRegistry::builtin(),
            repo.clone(),
            Duration::from_secs(5),
        );
        (ctl, repo)
    }

    #[tokio::test]
    async fn load_cycle_quarantines_orphans() {
        let (ctl, repo) = controller(vec![
            Task::new(TaskId(1), "a", "in_progress"),
            Task::new(TaskId(2), "b", "deployed"),
        ]);
        let outcome = ctl.run_cycle(CycleReason::Load).await.unwrap();
        let CycleOutcome::Completed(rec) = outcome else {
            panic!("expected a completed cycle");
        };
        assert_eq!(rec.migrated_count, 1);
        assert_eq!(
            repo.status_writes(),
            vec![(TaskId(2), NEEDS_REDISTRIBUTION.to_string())]
        );
        assert_eq!(ctl.derive_columns().await[0].id, NEEDS_REDISTRIBUTION);
    }

    #[tokio::test]
    async fn activate_unknown_template_fails_without_cycle() {
        let (ctl, repo) = controller(vec![]);
        let err = ctl.activate_template("nope").await.unwrap_err();
        assert!(matches!(
            err,
            BoardError::Registry(RegistryError::TemplateNotFound(_))
        ));
        assert_eq!(repo.load_count(), 0);
        assert_eq!(ctl.active_template_id(), "default");
    }

    #[tokio::test]
    async fn reconciled_event_is_published() {
        let (ctl, _repo) = controller(vec![Task::new(TaskId(1), "a", "backlog")]);
        let mut rx = ctl.subscribe();
        ctl.run_cycle(CycleReason::Load).await.unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            BoardEvent::Reconciled {
                reason: CycleReason::Load,
                template: "default".into(),
                migrated_count: 1,
                failures: vec![],
            }
        );
    }

    #[tokio::test]
    async fn move_into_sentinel_is_rejected_and_nothing_written() {
        let (ctl, repo) = controller(vec![Task::new(TaskId(1), "a", "in_progress")]);
        ctl.run_cycle(CycleReason::Load).await.unwrap();
        let verdict = ctl.attempt_move(TaskId(1), NEEDS_REDISTRIBUTION).await.unwrap();
        assert_eq!(verdict.reason, Some(MoveRejection::InvalidDestination));
        assert!(repo.status_writes().is_empty());
    }

    #[tokio::test]
    async fn move_of_unknown_task_is_an_error() {
        let (ctl, _repo) = controller(vec![]);
        let err = ctl.attempt_move(TaskId(99), "completed").await.unwrap_err();
        assert!(matches!(err, BoardError::TaskNotFound(TaskId(99))));
    }

    #[tokio::test]
    async fn failed_move_write_leaves_task_in_place() {
        let (ctl, repo) = controller(vec![Task::new(TaskId(1), "a", "in_progress")]);
        ctl.run_cycle(CycleReason::Load).await.unwrap();
        repo.fail_writes_for(TaskId(1));
        assert!(ctl.attempt_move(TaskId(1), "completed").await.is_err());
        assert_eq!(ctl.snapshot().await.tasks[0].status, "in_progress");
    }

    #[tokio::test]
    async fn create_task_uses_leftmost_status() {
        let (ctl, repo) = controller(vec![]);
        ctl.activate_template("creative").await.unwrap();
        let task = ctl
            .create_task(NewTask {
                title: "Moodboard".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(task.status, "brief_review");
        assert_eq!(repo.tasks().len(), 1);
        assert_eq!(ctl.snapshot().await.tasks.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_times_out() {
        let repo = Arc::new(MemoryRepository::new(vec![]).with_delay(Duration::from_secs(60)));
        let ctl = BoardController::new(
            "b",
            StatusTemplateRegistry::builtin(),
            repo,
            Duration::from_secs(2),
        );
        let err = ctl.run_cycle(CycleReason::Refresh).await.unwrap_err();
        assert!(matches!(
            err,
            BoardError::Timeout {
                operation: "load tasks",
                ..
            }
        ));
        // The gate is free again after a failed cycle
        assert!(!ctl.guard.is_running());
    }

    #[test]
    fn input_focus_flag() {
        let (ctl, _repo) = controller(vec![]);
        assert!(!ctl.input_focused());
        ctl.set_input_focus(true);
        assert!(ctl.input_focused());
    }
}
