use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::io::board_io::{BoardIoError, BoardPaths};
use crate::io::lock::{BoardLock, DEFAULT_LOCK_WAIT, LockError};
use crate::io::store;
use crate::model::status::StatusTemplate;
use crate::model::task::{NewTask, Task, TaskId};
use crate::ops::task_ops::{self, TaskError};

/// Error type for task store calls
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("task store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Io(#[from] BoardIoError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("task store worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Backend holding the tasks of a board.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn load_tasks(&self, board_id: &str) -> Result<Vec<Task>, RepositoryError>;

    async fn update_task_status(&self, task_id: TaskId, status: &str) -> Result<(), RepositoryError>;

    /// Store a new task in the leftmost column of `template`, assigning its id.
    async fn create_task(
        &self,
        board_id: &str,
        fields: NewTask,
        template: &StatusTemplate,
    ) -> Result<Task, RepositoryError>;
}

// ---------------------------------------------------------------------------
// File-backed store (.taskboard/tasks.json)
// ---------------------------------------------------------------------------

/// Task store backed by `.taskboard/tasks.json`. Writes hold the board lock
/// for the whole read-modify-write.
#[derive(Debug, Clone)]
pub struct FileRepository {
    paths: BoardPaths,
    lock_wait: Duration,
}

impl FileRepository {
    pub fn new(paths: BoardPaths) -> Self {
        FileRepository {
            paths,
            lock_wait: DEFAULT_LOCK_WAIT,
        }
    }

    /// Run `f` on the task list under the board lock and write the result back.
    async fn modify<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Vec<Task>) -> Result<T, RepositoryError> + Send + 'static,
    {
        let paths = self.paths.clone();
        let wait = self.lock_wait;
        tokio::task::spawn_blocking(move || -> Result<T, RepositoryError> {
            let _lock = BoardLock::acquire(&paths.board_dir, wait)?;
            let mut file = store::read_task_file(&paths.tasks_file())?;
            let out = f(&mut file.tasks)?;
            store::write_task_file(&paths.tasks_file(), &file)?;
            Ok(out)
        })
        .await?
    }
}

#[async_trait]
impl TaskRepository for FileRepository {
    async fn load_tasks(&self, _board_id: &str) -> Result<Vec<Task>, RepositoryError> {
        let path = self.paths.tasks_file();
        let file = tokio::task::spawn_blocking(move || store::read_task_file(&path)).await??;
        Ok(file.tasks)
    }

    async fn update_task_status(&self, task_id: TaskId, status: &str) -> Result<(), RepositoryError> {
        let status = status.to_string();
        self.modify(move |tasks| {
            task_ops::set_status(tasks, task_id, &status).map_err(|_| RepositoryError::TaskNotFound(task_id))
        })
        .await
    }

    async fn create_task(
        &self,
        _board_id: &str,
        fields: NewTask,
        template: &StatusTemplate,
    ) -> Result<Task, RepositoryError> {
        let template = template.clone();
        self.modify(move |tasks| {
            let task = task_ops::new_task(task_ops::next_task_id(tasks)?, fields, &template)?;
            tasks.push(task.clone());
            Ok(task)
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// In-process store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryState {
    tasks: Vec<Task>,
    failing: HashSet<TaskId>,
    status_writes: Vec<(TaskId, String)>,
    loads: usize,
    failing_loads: usize,
}

/// Task store living in memory. Writes for ids registered with
/// [`fail_writes_for`](MemoryRepository::fail_writes_for) fail, and an
/// optional delay is applied before every call.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
    delay: Option<Duration>,
}

impl MemoryRepository {
    pub fn new(tasks: Vec<Task>) -> Self {
        MemoryRepository {
            state: Mutex::new(MemoryState {
                tasks,
                ..Default::default()
            }),
            delay: None,
        }
    }

    /// Delay every call by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make status writes for `id` fail
    pub fn fail_writes_for(&self, id: TaskId) {
        self.lock().failing.insert(id);
    }

    /// Make the next `count` loads fail
    pub fn fail_next_loads(&self, count: usize) {
        self.lock().failing_loads = count;
    }

    /// Stop failing writes for `id`
    pub fn heal(&self, id: TaskId) {
        self.lock().failing.remove(&id);
    }

    /// Replace the stored tasks, as another client would
    pub fn replace_tasks(&self, tasks: Vec<Task>) {
        self.lock().tasks = tasks;
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    /// Every successful status write, in order
    pub fn status_writes(&self) -> Vec<(TaskId, String)> {
        self.lock().status_writes.clone()
    }

    pub fn load_count(&self) -> usize {
        self.lock().loads
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a panicking test; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl TaskRepository for MemoryRepository {
    async fn load_tasks(&self, _board_id: &str) -> Result<Vec<Task>, RepositoryError> {
        self.pause().await;
        let mut state = self.lock();
        if state.failing_loads > 0 {
            state.failing_loads -= 1;
            return Err(RepositoryError::Unavailable("load rejected".into()));
        }
        state.loads += 1;
        Ok(state.tasks.clone())
    }

    async fn update_task_status(&self, task_id: TaskId, status: &str) -> Result<(), RepositoryError> {
        self.pause().await;
        let mut state = self.lock();
        if state.failing.contains(&task_id) {
            return Err(RepositoryError::Unavailable(format!(
                "write rejected for task {}",
                task_id
            )));
        }
        task_ops::set_status(&mut state.tasks, task_id, status)
            .map_err(|_| RepositoryError::TaskNotFound(task_id))?;
        state.status_writes.push((task_id, status.to_string()));
        Ok(())
    }

    async fn create_task(
        &self,
        _board_id: &str,
        fields: NewTask,
        template: &StatusTemplate,
    ) -> Result<Task, RepositoryError> {
        self.pause().await;
        let mut state = self.lock();
        let task = task_ops::new_task(task_ops::next_task_id(&state.tasks)?, fields, template)?;
        state.tasks.push(task.clone());
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::board_io::init_board;
    use crate::ops::templates::StatusTemplateRegistry;
    use tempfile::TempDir;

    fn fields(title: &str) -> NewTask {
        NewTask {
            title: title.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn file_repository_create_update_load() {
        let tmp = TempDir::new().unwrap();
        let paths = init_board(tmp.path(), "b", "simple", false).unwrap();
        let repo = FileRepository::new(paths);
        let reg = StatusTemplateRegistry::builtin();
        let simple = reg.get_template("simple").unwrap();

        let first = repo.create_task("b", fields("one"), simple).await.unwrap();
        let second = repo.create_task("b", fields("two"), simple).await.unwrap();
        assert_eq!((first.id, second.id), (TaskId(1), TaskId(2)));
        assert_eq!(first.status, "to_do");

        repo.update_task_status(TaskId(2), "completed").await.unwrap();
        let tasks = repo.load_tasks("b").await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].status, "completed");
    }

    #[tokio::test]
    async fn file_repository_unknown_task() {
        let tmp = TempDir::new().unwrap();
        let repo = FileRepository::new(init_board(tmp.path(), "b", "simple", false).unwrap());
        let err = repo.update_task_status(TaskId(7), "to_do").await.unwrap_err();
        assert!(matches!(err, RepositoryError::TaskNotFound(TaskId(7))));
    }

    #[tokio::test]
    async fn memory_repository_injected_failures() {
        let repo = MemoryRepository::new(vec![
            Task::new(TaskId(1), "a", "x"),
            Task::new(TaskId(2), "b", "x"),
        ]);
        repo.fail_writes_for(TaskId(2));
        repo.update_task_status(TaskId(1), "y").await.unwrap();
        assert!(repo.update_task_status(TaskId(2), "y").await.is_err());
        assert_eq!(repo.status_writes(), vec![(TaskId(1), "y".to_string())]);

        repo.heal(TaskId(2));
        repo.update_task_status(TaskId(2), "y").await.unwrap();
        assert!(repo.tasks().iter().all(|t| t.status == "y"));
    }

    #[tokio::test]
    async fn memory_repository_failed_loads_then_recovers() {
        let repo = MemoryRepository::new(vec![Task::new(TaskId(1), "a", "x")]);
        repo.fail_next_loads(1);
        assert!(matches!(
            repo.load_tasks("b").await,
            Err(RepositoryError::Unavailable(_))
        ));
        assert_eq!(repo.load_tasks("b").await.unwrap().len(), 1);
        assert_eq!(repo.load_count(), 1);
    }

    #[tokio::test]
    async fn create_task_reports_exhausted_ids() {
        let repo = MemoryRepository::new(vec![Task::new(TaskId(u64::MAX), "last", "to_do")]);
        let reg = StatusTemplateRegistry::builtin();
        let err = repo
            .create_task("b", fields("one more"), reg.active())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Task(TaskError::IdsExhausted(_))));
        assert_eq!(repo.tasks().len(), 1);
    }
}
