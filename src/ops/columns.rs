use serde::Serialize;

use crate::model::column::Column;
use crate::model::status::StatusTemplate;
use crate::model::task::Task;

/// Derive the board columns for `template` and `tasks`.
///
/// One column per status, in template order. The temporary
/// "Needs Redistribution" column is prepended exactly when some task carries
/// the sentinel status; nothing else decides whether it is shown.
pub fn derive_columns(template: &StatusTemplate, tasks: &[Task]) -> Vec<Column> {
    let mut columns = Vec::with_capacity(template.statuses.len() + 1);
    if tasks.iter().any(Task::needs_redistribution) {
        columns.push(Column::redistribution());
    }
    columns.extend(template.statuses.iter().map(Column::from));
    columns
}

/// A column together with the tasks filed under it
#[derive(Debug, Clone, Serialize)]
pub struct Lane<'a> {
    pub column: &'a Column,
    pub tasks: Vec<&'a Task>,
}

/// Group tasks under their columns, keeping task order within each lane.
/// Tasks whose status matches no column are left out.
pub fn lanes<'a>(columns: &'a [Column], tasks: &'a [Task]) -> Vec<Lane<'a>> {
    columns
        .iter()
        .map(|column| Lane {
            column,
            tasks: tasks.iter().filter(|t| t.status == column.id).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{NEEDS_REDISTRIBUTION, TaskId};
    use crate::ops::templates::StatusTemplateRegistry;
    use pretty_assertions::assert_eq;

    fn ids(columns: &[Column]) -> Vec<&str> {
        columns.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn columns_follow_template_order() {
        let reg = StatusTemplateRegistry::builtin();
        let simple = reg.get_template("simple").unwrap();
        let tasks = vec![Task::new(TaskId(1), "a", "completed")];
        let columns = derive_columns(simple, &tasks);
        assert_eq!(ids(&columns), vec!["to_do", "in_progress", "completed"]);
        assert!(columns.iter().all(|c| !c.temporary));
    }

    #[test]
    fn empty_board_has_only_template_columns() {
        let reg = StatusTemplateRegistry::builtin();
        let columns = derive_columns(reg.active(), &[]);
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[0].id, "not_started");
    }

    #[test]
    fn temporary_column_is_prepended_once() {
        let reg = StatusTemplateRegistry::builtin();
        let simple = reg.get_template("simple").unwrap();
        let tasks = vec![
            Task::new(TaskId(1), "a", NEEDS_REDISTRIBUTION),
            Task::new(TaskId(2), "b", "to_do"),
            Task::new(TaskId(3), "c", NEEDS_REDISTRIBUTION),
        ];
        let columns = derive_columns(simple, &tasks);
        assert_eq!(
            ids(&columns),
            vec![NEEDS_REDISTRIBUTION, "to_do", "in_progress", "completed"]
        );
        assert!(columns[0].temporary);
        assert_eq!(columns[0].title, "Needs Redistribution");
        assert_eq!(columns.iter().filter(|c| c.temporary).count(), 1);
    }

    #[test]
    fn orphan_without_sentinel_does_not_add_temporary_column() {
        // Only the sentinel status shows the column; reconciliation must run first.
        let reg = StatusTemplateRegistry::builtin();
        let simple = reg.get_template("simple").unwrap();
        let tasks = vec![Task::new(TaskId(1), "a", "under_review")];
        assert_eq!(derive_columns(simple, &tasks).len(), 3);
    }

    #[test]
    fn special_status_fields_carry_to_columns() {
        let reg = StatusTemplateRegistry::builtin();
        let columns = derive_columns(reg.active(), &[]);
        let review = columns.iter().find(|c| c.id == "under_review").unwrap();
        assert!(review.special);
        assert_eq!(review.approval_required, 2);
    }

    #[test]
    fn lanes_group_tasks_by_status() {
        let reg = StatusTemplateRegistry::builtin();
        let simple = reg.get_template("simple").unwrap();
        let tasks = vec![
            Task::new(TaskId(1), "a", "to_do"),
            Task::new(TaskId(2), "b", "completed"),
            Task::new(TaskId(3), "c", "to_do"),
            Task::new(TaskId(4), "d", "mystery"),
        ];
        let columns = derive_columns(simple, &tasks);
        let lanes = lanes(&columns, &tasks);
        let counts: Vec<usize> = lanes.iter().map(|l| l.tasks.len()).collect();
        assert_eq!(counts, vec![2, 0, 1]);
        assert_eq!(lanes[0].tasks[1].id, TaskId(3));
    }
}
