use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::column::Column;
use crate::model::status::StatusTemplate;
use crate::model::task::{Task, TaskId};
use crate::ops::columns::Lane;
use crate::ops::timeline::TimelineLayout;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: TaskId,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<u64>,
}

#[derive(Serialize)]
pub struct ColumnJson {
    #[serde(flatten)]
    pub column: Column,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct TemplateJson {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub active: bool,
    pub statuses: Vec<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id,
        title: task.title.clone(),
        status: task.status.clone(),
        description: task.description.clone(),
        start_date: task.start_date,
        end_date: task.end_date,
        assignees: task.assignees.iter().copied().collect(),
    }
}

pub fn lanes_to_json(lanes: &[Lane<'_>]) -> Vec<ColumnJson> {
    lanes
        .iter()
        .map(|lane| ColumnJson {
            column: lane.column.clone(),
            tasks: lane.tasks.iter().map(|t| task_to_json(t)).collect(),
        })
        .collect()
}

pub fn template_to_json(template: &StatusTemplate, active: bool) -> TemplateJson {
    TemplateJson {
        id: template.id.clone(),
        name: template.name.clone(),
        category: template.category.clone(),
        description: template.description.clone(),
        active,
        statuses: template.keys().map(str::to_string).collect(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

pub fn format_task_line(task: &Task) -> String {
    let mut line = format!("#{} {}", task.id, task.title);
    if let (Some(start), Some(end)) = (task.start_date, task.end_date) {
        let _ = write!(line, "  ({} → {})", start, end);
    }
    line
}

pub fn format_lanes(lanes: &[Lane<'_>]) -> String {
    let mut out = String::new();
    for lane in lanes {
        let mut header = format!("{} ({})", lane.column.title, lane.tasks.len());
        if lane.column.temporary {
            header.push_str(" [temporary]");
        }
        if lane.column.special {
            let _ = write!(header, " [needs {} approvals]", lane.column.approval_required);
        }
        let _ = writeln!(out, "{}", header);
        for task in &lane.tasks {
            let _ = writeln!(out, "  {}", format_task_line(task));
        }
    }
    out
}

pub fn format_template(template: &StatusTemplate, active: bool) -> String {
    let marker = if active { "*" } else { " " };
    let statuses: Vec<&str> = template.statuses.iter().map(|s| s.label.as_str()).collect();
    format!(
        "{} {:<14} {} ({})\n    {}",
        marker,
        template.id,
        template.name,
        template.category,
        statuses.join(" → ")
    )
}

pub fn format_timeline(layout: &TimelineLayout) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Timeline {} → {} ({} days, zoom {} = {}px/day, width {}px)",
        layout.range.start,
        layout.range.end,
        layout.range.total_days(),
        layout.zoom.level(),
        layout.day_width,
        layout.chart_width
    );
    match layout.today_offset {
        Some(offset) => {
            let _ = writeln!(out, "Today at {}px", offset);
        }
        None => {
            let _ = writeln!(out, "Today is outside the range");
        }
    }
    let title_width = layout
        .bars
        .iter()
        .map(|b| b.title.chars().count())
        .max()
        .unwrap_or(0);
    for bar in &layout.bars {
        let _ = writeln!(
            out,
            "  #{:<4} {:<width$}  {} → {}  left {:>6}  width {:>5}  {}",
            bar.task_id,
            bar.title,
            bar.start,
            bar.end,
            bar.geometry.left,
            bar.geometry.width,
            bar.color,
            width = title_width
        );
    }
    out
}
