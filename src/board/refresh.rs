use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use super::controller::{BoardController, BoardError, CycleOutcome};
use super::events::CycleReason;
use crate::io::config_io;
use crate::io::watcher::BoardWatcher;

/// What one refresh trigger did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The user was typing; nothing was reloaded.
    Skipped,
    Ran(CycleOutcome),
}

/// Periodic board refresh. Ticks are dropped while the controller reports
/// input focus, and board file changes trigger an early refresh.
pub struct AutoRefresh<'a> {
    controller: &'a BoardController,
    interval: Duration,
    config_dir: Option<PathBuf>,
}

impl<'a> AutoRefresh<'a> {
    pub fn new(controller: &'a BoardController, interval: Duration) -> Self {
        AutoRefresh {
            controller,
            interval,
            config_dir: None,
        }
    }

    /// Re-read `board.toml` in `board_dir` before every refresh. When another
    /// process switched templates, the refresh becomes a template switch.
    pub fn follow_config(mut self, board_dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(board_dir.into());
        self
    }

    /// Handle one trigger.
    pub async fn tick(&self) -> Result<RefreshOutcome, BoardError> {
        if self.controller.input_focused() {
            tracing::debug!(board = %self.controller.board_id(), "input focused; skipping refresh");
            return Ok(RefreshOutcome::Skipped);
        }
        if let Some(dir) = &self.config_dir {
            // An unreadable config fails the tick; nothing is reconciled.
            let (config, _) = config_io::read_config(dir)?;
            let active = self.controller.active_template_id();
            if config.board.template != active {
                tracing::info!(
                    board = %self.controller.board_id(),
                    from = %active,
                    to = %config.board.template,
                    "board.toml names another template; switching"
                );
                let outcome = self.controller.activate_template(&config.board.template).await?;
                return Ok(RefreshOutcome::Ran(outcome));
            }
        }
        let outcome = self.controller.run_cycle(CycleReason::Refresh).await?;
        Ok(RefreshOutcome::Ran(outcome))
    }

    /// Refresh on every interval tick and file change until `shutdown`
    /// resolves. Each result is handed to `report`; errors do not stop the
    /// loop and are never retried early.
    pub async fn run_until<S, R>(self, mut watcher: Option<BoardWatcher>, shutdown: S, mut report: R)
    where
        S: Future<Output = ()>,
        R: FnMut(Result<RefreshOutcome, BoardError>),
    {
        let mut ticks = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticks.tick() => report(self.tick().await),
                changed = next_change(&mut watcher) => match changed {
                    Some(()) => report(self.tick().await),
                    None => watcher = None,
                },
            }
        }
    }
}

/// Next file change, folding any burst already queued into it. Pends
/// forever when there is no watcher.
async fn next_change(watcher: &mut Option<BoardWatcher>) -> Option<()> {
    match watcher {
        Some(w) => {
            let event = w.next().await?;
            tracing::debug!(paths = ?event.paths, "board files changed");
            w.drain();
            Some(())
        }
        None => std::future::pending().await,
    }
}
