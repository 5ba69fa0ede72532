use std::path::{Path, PathBuf};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// A change to one of the board's data files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardFileEvent {
    pub paths: Vec<PathBuf>,
}

/// Watches `.taskboard/` for edits to tasks.json and board.toml made by
/// other processes.
pub struct BoardWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<BoardFileEvent>,
}

impl BoardWatcher {
    pub fn start(board_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();
        let board_dir_owned = board_dir.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else { return };
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                let paths: Vec<PathBuf> = event
                    .paths
                    .into_iter()
                    .filter(|p| p.starts_with(&board_dir_owned) && is_board_file(p))
                    .collect();
                if !paths.is_empty() {
                    let _ = tx.send(BoardFileEvent { paths });
                }
            },
            Config::default(),
        )?;

        watcher.watch(board_dir, RecursiveMode::NonRecursive)?;
        Ok(BoardWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Wait for the next change. `None` once the watcher is gone.
    pub async fn next(&mut self) -> Option<BoardFileEvent> {
        self.rx.recv().await
    }

    /// Discard changes already queued. Returns how many were dropped.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

/// tasks.json and board.toml; lock and temp files are noise.
fn is_board_file(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some("tasks.json") | Some("board.toml")
    )
}
