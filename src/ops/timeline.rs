use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

use crate::model::task::{Task, TaskId};

/// Days before today always shown, whatever the tasks say
pub const LOOK_BEHIND_DAYS: u64 = 7;
/// Days after today always shown
pub const LOOK_AHEAD_DAYS: u64 = 21;
/// Extra days before the earliest start
pub const PAD_BEFORE_DAYS: u64 = 2;
/// Extra days after the latest end
pub const PAD_AFTER_DAYS: u64 = 7;

const BAR_PALETTE: [&str; 6] = ["#4a6fa5", "#e74c3c", "#2ecc71", "#f39c12", "#9b59b6", "#1abc9c"];

/// Error type for timeline operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    #[error("zoom level must be between 1 and 5, got {0}")]
    InvalidZoom(u8),
}

/// Discrete timeline zoom, 1 (widest view) to 5 (closest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ZoomLevel(u8);

impl ZoomLevel {
    pub const MIN: ZoomLevel = ZoomLevel(1);
    pub const MAX: ZoomLevel = ZoomLevel(5);

    pub fn new(level: u8) -> Result<Self, TimelineError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&level) {
            Ok(ZoomLevel(level))
        } else {
            Err(TimelineError::InvalidZoom(level))
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// Pixel width of one day at this zoom
    pub fn day_width(self) -> u32 {
        match self.0 {
            1 => 30,
            2 => 60,
            3 => 100,
            4 => 150,
            _ => 200,
        }
    }

    /// One step closer, stopping at the maximum
    pub fn zoom_in(self) -> Self {
        ZoomLevel((self.0 + 1).min(Self::MAX.0))
    }

    /// One step wider, stopping at the minimum
    pub fn zoom_out(self) -> Self {
        ZoomLevel((self.0 - 1).max(Self::MIN.0))
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        ZoomLevel(3)
    }
}

/// A task with both dates resolved. Borrowed view; the task is untouched.
#[derive(Debug, Clone, Copy)]
pub struct ScheduledTask<'a> {
    pub task: &'a Task,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Inclusive calendar window shown by the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Number of day cells, counting both ends
    pub fn total_days(&self) -> i64 {
        days_between(self.start, self.end) + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Horizontal placement of one bar, in pixels from the range start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BarGeometry {
    pub left: i64,
    pub width: i64,
}

/// One header cell of the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineDay {
    pub date: NaiveDate,
    pub weekend: bool,
    pub today: bool,
}

/// Signed whole days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Resolve missing dates: no start means today, no end means start plus
/// `default_duration_days`.
pub fn normalize_dates(tasks: &[Task], today: NaiveDate, default_duration_days: u32) -> Vec<ScheduledTask<'_>> {
    tasks
        .iter()
        .map(|task| {
            let start = task.start_date.unwrap_or(today);
            let end = task.end_date.unwrap_or_else(|| {
                start
                    .checked_add_days(Days::new(u64::from(default_duration_days)))
                    .unwrap_or(start)
            });
            ScheduledTask { task, start, end }
        })
        .collect()
}

/// Window covering every task and at least a week back and three weeks
/// ahead of `today`, padded on both sides.
pub fn compute_range(tasks: &[ScheduledTask<'_>], today: NaiveDate) -> DateRange {
    let mut earliest = back(today, LOOK_BEHIND_DAYS);
    let mut latest = ahead(today, LOOK_AHEAD_DAYS);
    for t in tasks {
        earliest = earliest.min(t.start);
        latest = latest.max(t.end);
    }
    DateRange {
        start: back(earliest, PAD_BEFORE_DAYS),
        end: ahead(latest, PAD_AFTER_DAYS),
    }
}

// Both saturate at the ends of the calendar.
fn back(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

fn ahead(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Bar placement for `task`. Width is at least one day, so same-day and
/// inverted ranges still draw.
pub fn layout_task(task: &ScheduledTask<'_>, range_start: NaiveDate, day_width: u32) -> BarGeometry {
    let w = i64::from(day_width);
    let duration = days_between(task.start, task.end).max(1);
    BarGeometry {
        left: days_between(range_start, task.start) * w,
        width: duration * w,
    }
}

/// Offset of the "today" marker, or `None` when today is outside the range.
pub fn today_marker_offset(range: &DateRange, today: NaiveDate, day_width: u32) -> Option<i64> {
    if range.contains(today) {
        Some(days_between(range.start, today) * i64::from(day_width))
    } else {
        None
    }
}

/// Header cells from range start to range end
pub fn timeline_days(range: &DateRange, today: NaiveDate) -> Vec<TimelineDay> {
    range
        .start
        .iter_days()
        .take_while(|d| *d <= range.end)
        .map(|date| TimelineDay {
            date,
            weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            today: date == today,
        })
        .collect()
}

pub fn chart_width(range: &DateRange, day_width: u32) -> i64 {
    range.total_days() * i64::from(day_width)
}

/// Fallback bar color for the task at `index`
pub fn bar_color(index: usize) -> &'static str {
    BAR_PALETTE[index % BAR_PALETTE.len()]
}

/// One positioned task bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskBar {
    pub task_id: TaskId,
    pub title: String,
    pub status: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(flatten)]
    pub geometry: BarGeometry,
    pub color: &'static str,
}

/// Complete timeline for a task set at one zoom level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineLayout {
    pub zoom: ZoomLevel,
    pub day_width: u32,
    pub range: DateRange,
    pub chart_width: i64,
    pub today_offset: Option<i64>,
    pub bars: Vec<TaskBar>,
}

pub fn layout_board(tasks: &[Task], today: NaiveDate, zoom: ZoomLevel, default_duration_days: u32) -> TimelineLayout {
    let scheduled = normalize_dates(tasks, today, default_duration_days);
    let range = compute_range(&scheduled, today);
    let day_width = zoom.day_width();
    let bars = scheduled
        .iter()
        .enumerate()
        .map(|(i, s)| TaskBar {
            task_id: s.task.id,
            title: s.task.title.clone(),
            status: s.task.status.clone(),
            start: s.start,
            end: s.end,
            geometry: layout_task(s, range.start, day_width),
            color: bar_color(i),
        })
        .collect();

    TimelineLayout {
        zoom,
        day_width,
        range,
        chart_width: chart_width(&range, day_width),
        today_offset: today_marker_offset(&range, today, day_width),
        bars,
    }
}
