//! Completion time and leaderboard points.
//!
//! Points for a completed task:
//! - Base: 100 points, scaled by priority (low 1.0, medium 1.5, high 2.0, urgent 3.0)
//! - Speed bonus: +50 within 1 day, +30 within 3 days, +10 within 7 days
//!
//! A task that is not completed is worth 0.

use serde::Serialize;

use crate::date_util::days_between;
use crate::model::{Priority, Task};

pub const BASE_POINTS: u32 = 100;

/// Whole days from creation to completion, or `None` while the task has no
/// completion timestamp. Negative if completion precedes creation.
pub fn completion_time(task: &Task) -> Option<i64> {
    let completed = task.completed_at?;
    Some(days_between(task.created_at, completed))
}

impl Priority {
    pub fn multiplier(&self) -> f64 {
        match self {
            Priority::Low => 1.0,
            Priority::Medium => 1.5,
            Priority::High => 2.0,
            Priority::Urgent => 3.0,
        }
    }
}

/// Bonus for fast completion. Thresholds are checked in ascending order.
pub fn speed_bonus(days: i64) -> u32 {
    if days <= 1 {
        50
    } else if days <= 3 {
        30
    } else if days <= 7 {
        10
    } else {
        0
    }
}

/// Points for a task completed in `days` at the given priority.
pub fn points_for(priority: Priority, days: i64) -> u32 {
    let raw = BASE_POINTS as f64 * priority.multiplier() + speed_bonus(days) as f64;
    raw.round() as u32
}

pub fn score(task: &Task) -> u32 {
    match completion_time(task) {
        Some(days) => points_for(task.priority, days),
        None => 0,
    }
}

/// A task paired with its completion time and points.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredTask<'a> {
    pub task: &'a Task,
    pub completion_days: Option<i64>,
    pub points: u32,
}

pub fn score_task(task: &Task) -> ScoredTask<'_> {
    let completion_days = completion_time(task);
    let points = completion_days.map_or(0, |days| points_for(task.priority, days));
    ScoredTask {
        task,
        completion_days,
        points,
    }
}
