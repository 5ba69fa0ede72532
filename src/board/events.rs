use serde::Serialize;

use crate::model::task::TaskId;
use crate::ops::reconcile::Reconciliation;

/// What started a reconcile cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleReason {
    Load,
    TemplateChanged,
    Refresh,
}

/// Notifications for the rendering layer (toasts, logs)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    /// Emitted after every completed reconciliation, even when nothing moved
    Reconciled {
        reason: CycleReason,
        template: String,
        migrated_count: usize,
        failures: Vec<TaskId>,
    },
    TaskMoved {
        task_id: TaskId,
        from: String,
        to: String,
        message: String,
    },
}

impl BoardEvent {
    pub(crate) fn reconciled(reason: CycleReason, template: &str, outcome: &Reconciliation) -> Self {
        BoardEvent::Reconciled {
            reason,
            template: template.to_string(),
            migrated_count: outcome.migrated_count,
            failures: outcome.failed_ids(),
        }
    }
}
