pub mod types;

pub use types::*;

use chrono::{DateTime, Utc};

use crate::model::{Task, TaskStatus};
use crate::schedule::{blocked_tasks, is_overdue};
use crate::scoring::{completion_time, score};
use crate::storage::repository::{tasks_by_assignee, tasks_by_project};

/// Roll up every task assigned to `user_id` with the default options.
pub fn rollup_for_assignee(tasks: &[Task], user_id: &str, now: DateTime<Utc>) -> AssigneeStats {
    rollup_for_assignee_with(tasks, user_id, now, &MetricsOptions::default())
}

/// Roll up every task assigned to `user_id`.
///
/// A task counts once for each user it lists as an assignee.
pub fn rollup_for_assignee_with(
    tasks: &[Task],
    user_id: &str,
    now: DateTime<Utc>,
    options: &MetricsOptions,
) -> AssigneeStats {
    let assigned = tasks_by_assignee(tasks, user_id);
    let completed: Vec<&Task> = assigned.iter().copied().filter(|t| t.is_done()).collect();

    let status_counts = StatusCounts::tally(assigned.iter().copied());
    let completed_count = completed.len() as u64;
    let overdue_count = assigned.iter().filter(|t| is_overdue(t, now)).count() as u64;

    // A done task with no completion timestamp contributes 0 days.
    let avg_completion_time = if completed.is_empty() {
        0.0
    } else {
        let sum: i64 = completed
            .iter()
            .map(|t| completion_time(t).unwrap_or(0))
            .sum();
        sum as f64 / completed.len() as f64
    };

    let total_points: u64 = completed.iter().map(|t| score(t) as u64).sum();

    // Every completed task counts, regardless of when it was completed.
    let velocity = completed_count as f64 / options.velocity_window_weeks.max(1) as f64;

    AssigneeStats {
        user_id: user_id.to_string(),
        user_name: None,
        status_counts,
        completed_count,
        active_count: status_counts.in_progress,
        overdue_count,
        avg_completion_time,
        total_points,
        velocity,
        efficiency: efficiency(completed_count, avg_completion_time, velocity),
    }
}

fn efficiency(completed_count: u64, avg_completion_time: f64, velocity: f64) -> u8 {
    if completed_count == 0 {
        return 0;
    }
    let raw = ((100.0 - avg_completion_time * 5.0) + velocity * 10.0).round();
    raw.clamp(0.0, 100.0) as u8
}

/// Sort descending by total points. Ties keep their input order.
pub fn rank_assignees(mut stats: Vec<AssigneeStats>) -> Vec<AssigneeStats> {
    stats.sort_by(|a, b| b.total_points.cmp(&a.total_points));
    stats
}

/// Ranked leaderboard with 1-based positions.
pub fn leaderboard(stats: Vec<AssigneeStats>) -> Vec<LeaderboardEntry> {
    rank_assignees(stats)
        .into_iter()
        .enumerate()
        .map(|(i, stats)| LeaderboardEntry { rank: i + 1, stats })
        .collect()
}

/// Leaderboard position of `user_id`, if ranked.
pub fn rank_of(entries: &[LeaderboardEntry], user_id: &str) -> Option<usize> {
    entries
        .iter()
        .find(|e| e.stats.user_id == user_id)
        .map(|e| e.rank)
}

/// Leaderboard order, optionally truncated to the first `limit` entries.
pub fn top_performers(stats: &[AssigneeStats], limit: Option<usize>) -> Vec<AssigneeStats> {
    let ranked = rank_assignees(stats.to_vec());
    match limit {
        Some(n) => ranked.into_iter().take(n).collect(),
        None => ranked,
    }
}

/// Users with the slowest average completion time, slowest first.
/// Users with no measurable completion time are left out.
pub fn needs_support(stats: &[AssigneeStats], limit: usize) -> Vec<AssigneeStats> {
    let mut slow: Vec<AssigneeStats> = stats
        .iter()
        .filter(|s| s.avg_completion_time > 0.0)
        .cloned()
        .collect();
    slow.sort_by(|a, b| b.avg_completion_time.total_cmp(&a.avg_completion_time));
    slow.truncate(limit);
    slow
}

/// Roll up every task belonging to `project_id`.
pub fn rollup_for_project(tasks: &[Task], project_id: &str, now: DateTime<Utc>) -> ProjectStats {
    let project_tasks = tasks_by_project(tasks, project_id);
    let status_counts = StatusCounts::tally(project_tasks.iter().copied());
    let total_tasks = project_tasks.len() as u64;
    let completed_tasks = status_counts.done;

    ProjectStats {
        project_id: project_id.to_string(),
        project_name: None,
        total_tasks,
        completed_tasks,
        progress: percent(completed_tasks, total_tasks).round() as u8,
        overdue_count: project_tasks.iter().filter(|t| is_overdue(t, now)).count() as u64,
        status_counts,
    }
}

/// Headline counts across the whole task set.
pub fn team_overview(tasks: &[Task], now: DateTime<Utc>) -> TeamOverview {
    let counts = StatusCounts::tally(tasks);
    let total_tasks = tasks.len() as u64;
    TeamOverview {
        total_tasks,
        completed_tasks: counts.done,
        in_progress_tasks: counts.in_progress,
        overdue_tasks: tasks.iter().filter(|t| is_overdue(t, now)).count() as u64,
        blocked_tasks: blocked_tasks(tasks).len() as u64,
        completion_rate: percent(counts.done, total_tasks),
    }
}

/// Completed tasks finished within 1-3 days, fastest first.
pub fn fastest_tasks(tasks: &[Task], limit: usize) -> Vec<TaskHighlight> {
    let mut fast: Vec<TaskHighlight> = completed_highlights(tasks)
        .filter(|h| h.completion_days > 0 && h.completion_days <= 3)
        .collect();
    fast.sort_by_key(|h| h.completion_days);
    fast.truncate(limit);
    fast
}

/// Completed tasks that took more than a week, slowest first.
pub fn slowest_tasks(tasks: &[Task], limit: usize) -> Vec<TaskHighlight> {
    let mut slow: Vec<TaskHighlight> = completed_highlights(tasks)
        .filter(|h| h.completion_days > 7)
        .collect();
    slow.sort_by(|a, b| b.completion_days.cmp(&a.completion_days));
    slow.truncate(limit);
    slow
}

fn completed_highlights(tasks: &[Task]) -> impl Iterator<Item = TaskHighlight> + '_ {
    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .map(|t| TaskHighlight {
            task_id: t.id.clone(),
            title: t.title.clone(),
            assignee_id: t.primary_assignee().map(|s| s.to_string()),
            completion_days: completion_time(t).unwrap_or(0),
            points: score(t),
        })
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
