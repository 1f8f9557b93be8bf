use serde::Serialize;

use crate::model::{Task, TaskStatus};

/// Tunables for the rollups and ranked lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsOptions {
    /// Divisor used for velocity (completed tasks per week).
    pub velocity_window_weeks: u32,
    /// Length of the "needs support" list.
    pub needs_support_limit: usize,
    /// Length of the dashboard "top performers" list.
    pub top_performers_limit: usize,
    /// Length of the fastest/slowest task lists.
    pub highlight_limit: usize,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self {
            velocity_window_weeks: 4,
            needs_support_limit: 5,
            top_performers_limit: 5,
            highlight_limit: 5,
        }
    }
}

/// Task counts per workflow column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub todo: u64,
    pub in_progress: u64,
    pub review: u64,
    pub done: u64,
}

impl StatusCounts {
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut counts = Self::default();
        for task in tasks {
            match task.status {
                TaskStatus::Todo => counts.todo += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Review => counts.review += 1,
                TaskStatus::Done => counts.done += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> u64 {
        self.todo + self.in_progress + self.review + self.done
    }
}

/// Rollup over every task assigned to one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssigneeStats {
    pub user_id: String,
    pub user_name: Option<String>,
    pub status_counts: StatusCounts,
    pub completed_count: u64,
    pub active_count: u64,
    pub overdue_count: u64,
    /// Mean completion time in days over completed tasks; 0 when there are none.
    pub avg_completion_time: f64,
    pub total_points: u64,
    /// Completed tasks per week.
    pub velocity: f64,
    /// Heuristic 0-100 blend of completion time and velocity.
    pub efficiency: u8,
}

/// One leaderboard row. Ranks start at 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub stats: AssigneeStats,
}

/// Rollup over every task in one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
    pub project_id: String,
    pub project_name: Option<String>,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    /// Percent complete, 0-100.
    pub progress: u8,
    pub overdue_count: u64,
    pub status_counts: StatusCounts,
}

/// Headline numbers across a whole task set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamOverview {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub in_progress_tasks: u64,
    pub overdue_tasks: u64,
    /// Tasks waiting on at least one other task.
    pub blocked_tasks: u64,
    /// Percentage of tasks that are done.
    pub completion_rate: f64,
}

/// A completed task singled out for being especially fast or slow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskHighlight {
    pub task_id: String,
    pub title: String,
    pub assignee_id: Option<String>,
    pub completion_days: i64,
    pub points: u32,
}
