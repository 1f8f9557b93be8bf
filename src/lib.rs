pub mod date_util;
pub mod error;
pub mod metrics;
pub mod model;
pub mod query;
pub mod schedule;
pub mod scoring;
pub mod storage;

#[cfg(test)]
mod testing;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use error::{Error, Result};
pub use metrics::{
    AssigneeStats, LeaderboardEntry, MetricsOptions, ProjectStats, StatusCounts, TaskHighlight,
    TeamOverview,
};
pub use model::{Priority, Project, Role, Task, TaskStatus, User};
pub use query::builder::{TaskOrder, TaskQuery, TaskRow};
pub use query::window::DueWindow;
pub use schedule::DueBuckets;
pub use scoring::{completion_time, score, ScoredTask};
pub use storage::Snapshot;

use storage::repository;

/// Everything the analytics dashboard shows at once.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub overview: TeamOverview,
    pub top_performers: Vec<AssigneeStats>,
    pub needs_support: Vec<AssigneeStats>,
    pub fastest_tasks: Vec<TaskHighlight>,
    pub slowest_tasks: Vec<TaskHighlight>,
    pub projects: Vec<ProjectStats>,
}

/// Main entry point: a loaded snapshot evaluated at a fixed instant.
///
/// Every query answers against the same `now`, so repeated calls return the
/// same results.
pub struct Dashboard {
    snapshot: Snapshot,
    now: DateTime<Utc>,
    options: MetricsOptions,
}

impl Dashboard {
    pub fn new(snapshot: Snapshot, now: DateTime<Utc>) -> Self {
        Self::with_options(snapshot, now, MetricsOptions::default())
    }

    pub fn with_options(snapshot: Snapshot, now: DateTime<Utc>, options: MetricsOptions) -> Self {
        Self {
            snapshot,
            now,
            options,
        }
    }

    /// Access the snapshot (for direct queries in the CLI).
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn options(&self) -> &MetricsOptions {
        &self.options
    }

    /// Resolve a user id, email or display name.
    pub fn resolve_user(&self, identifier: &str) -> Result<&User> {
        repository::resolve_user_identifier(&self.snapshot, identifier)
            .ok_or_else(|| Error::NotFound(format!("user '{identifier}'")))
    }

    fn rollup(&self, user_id: &str) -> AssigneeStats {
        let mut stats = metrics::rollup_for_assignee_with(
            &self.snapshot.tasks,
            user_id,
            self.now,
            &self.options,
        );
        stats.user_name = repository::user_by_id(&self.snapshot, user_id).map(|u| u.name.clone());
        stats
    }

    pub fn assignee_stats(&self, identifier: &str) -> Result<AssigneeStats> {
        let user = self.resolve_user(identifier)?;
        Ok(self.rollup(&user.id))
    }

    /// Rollups for everyone on the leaderboard, in snapshot order.
    ///
    /// That is every developer, or every assignee seen on a task when the
    /// snapshot carries no user records.
    pub fn developer_stats(&self) -> Vec<AssigneeStats> {
        let ids: Vec<String> = if self.snapshot.users.is_empty() {
            let mut seen: Vec<String> = Vec::new();
            for id in self.snapshot.tasks.iter().flat_map(|t| &t.assignees) {
                if !seen.contains(id) {
                    seen.push(id.clone());
                }
            }
            seen
        } else {
            repository::developers(&self.snapshot)
                .into_iter()
                .map(|u| u.id.clone())
                .collect()
        };
        log::debug!("Rolling up {} assignees", ids.len());
        ids.iter().map(|id| self.rollup(id)).collect()
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        metrics::leaderboard(self.developer_stats())
    }

    pub fn project_stats(&self, project_id: &str) -> Result<ProjectStats> {
        let project = repository::project_by_id(&self.snapshot, project_id);
        if project.is_none() && !self.snapshot.tasks.iter().any(|t| t.project_id == project_id) {
            return Err(Error::NotFound(format!("project '{project_id}'")));
        }
        let mut stats = metrics::rollup_for_project(&self.snapshot.tasks, project_id, self.now);
        stats.project_name = project.map(|p| p.name.clone());
        Ok(stats)
    }

    pub fn all_project_stats(&self) -> Vec<ProjectStats> {
        self.snapshot
            .projects
            .iter()
            .map(|p| self.named_project_stats(p))
            .collect()
    }

    /// Rollups for the projects a user is a member of.
    pub fn member_project_stats(&self, identifier: &str) -> Result<Vec<ProjectStats>> {
        let user = self.resolve_user(identifier)?;
        Ok(repository::projects_for_member(&self.snapshot, &user.id)
            .into_iter()
            .map(|p| self.named_project_stats(p))
            .collect())
    }

    fn named_project_stats(&self, project: &Project) -> ProjectStats {
        let mut stats = metrics::rollup_for_project(&self.snapshot.tasks, &project.id, self.now);
        stats.project_name = Some(project.name.clone());
        stats
    }

    pub fn team_overview(&self) -> TeamOverview {
        metrics::team_overview(&self.snapshot.tasks, self.now)
    }

    pub fn schedule(&self) -> DueBuckets<'_> {
        schedule::bucket_by_due_window(&self.snapshot.tasks, self.now)
    }

    pub fn blocked_tasks(&self) -> Vec<&Task> {
        schedule::blocked_tasks(&self.snapshot.tasks)
    }

    pub fn needs_attention(&self) -> Vec<&Task> {
        schedule::needs_attention(&self.snapshot.tasks, self.now)
    }

    pub fn focus(&self, identifier: &str, limit: usize) -> Result<Vec<&Task>> {
        let user = self.resolve_user(identifier)?;
        Ok(schedule::focus_tasks(&self.snapshot.tasks, &user.id, limit))
    }

    pub fn score_task(&self, task_id: &str) -> Result<ScoredTask<'_>> {
        let task = repository::task_by_id(&self.snapshot, task_id)
            .ok_or_else(|| Error::NotFound(format!("task '{task_id}'")))?;
        Ok(scoring::score_task(task))
    }

    pub fn analytics(&self) -> AnalyticsReport {
        let stats = self.developer_stats();
        let tasks = &self.snapshot.tasks;
        AnalyticsReport {
            overview: self.team_overview(),
            top_performers: metrics::top_performers(&stats, Some(self.options.top_performers_limit)),
            needs_support: metrics::needs_support(&stats, self.options.needs_support_limit),
            fastest_tasks: metrics::fastest_tasks(tasks, self.options.highlight_limit),
            slowest_tasks: metrics::slowest_tasks(tasks, self.options.highlight_limit),
            projects: self.all_project_stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ts, TaskBuilder};

    fn dashboard() -> Dashboard {
        let snapshot =
            Snapshot::from_json(include_str!("../data/sample_snapshot.json")).unwrap();
        Dashboard::new(snapshot, ts("2025-11-12T10:00:00Z"))
    }

    fn task_ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_leaderboard_over_developers() {
        let dw = dashboard();
        let board = dw.leaderboard();
        let ids: Vec<&str> = board.iter().map(|e| e.stats.user_id.as_str()).collect();
        assert_eq!(ids, vec!["user-2", "user-3", "user-6", "user-7", "user-9"]);
        assert_eq!(board[0].stats.total_points, 610);
        assert_eq!(board[0].stats.user_name.as_deref(), Some("Alex Rivera"));
        assert_eq!(board[1].stats.total_points, 300);
        assert_eq!(metrics::rank_of(&board, "user-9"), Some(5));
        // Designers are not ranked
        assert_eq!(metrics::rank_of(&board, "user-5"), None);
    }

    #[test]
    fn test_assignee_stats_by_email() {
        let dw = dashboard();
        let s = dw.assignee_stats("ALEX@devize.com").unwrap();
        assert_eq!(s.user_id, "user-2");
        assert_eq!(s.completed_count, 3);
        assert_eq!(s.active_count, 3);
        assert_eq!(s.overdue_count, 0);
        assert!((s.avg_completion_time - 31.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.velocity, 0.75);
        assert_eq!(s.efficiency, 56);

        let marcus = dw.assignee_stats("user-3").unwrap();
        assert_eq!(marcus.overdue_count, 1);
        assert_eq!(marcus.efficiency, 13);
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let dw = dashboard();
        assert!(matches!(dw.assignee_stats("nobody"), Err(Error::NotFound(_))));
        assert!(matches!(dw.focus("nobody", 3), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_project_stats() {
        let dw = dashboard();
        let p = dw.project_stats("proj-1").unwrap();
        assert_eq!(p.project_name.as_deref(), Some("Devize Platform"));
        assert_eq!(p.total_tasks, 8);
        assert_eq!(p.completed_tasks, 1);
        assert_eq!(p.progress, 13);
        assert_eq!(p.overdue_count, 2);
        assert!(matches!(dw.project_stats("proj-404"), Err(Error::NotFound(_))));
        assert_eq!(dw.all_project_stats().len(), 5);
    }

    #[test]
    fn test_member_project_stats() {
        let dw = dashboard();
        let projects = dw.member_project_stats("james@devize.com").unwrap();
        let ids: Vec<&str> = projects.iter().map(|p| p.project_id.as_str()).collect();
        assert_eq!(ids, vec!["proj-2", "proj-5"]);
        assert_eq!(projects[0].project_name.as_deref(), Some("Mobile App"));
        assert_eq!(projects[0].total_tasks, 3);
        assert!(matches!(dw.member_project_stats("nobody"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_blocked_tasks_in_overview() {
        let dw = dashboard();
        assert_eq!(task_ids(&dw.blocked_tasks()), vec!["TASK-5"]);
        assert_eq!(dw.team_overview().blocked_tasks, 1);
        assert_eq!(dw.analytics().overview.blocked_tasks, 1);
    }

    #[test]
    fn test_analytics_report() {
        let dw = dashboard();
        let report = dw.analytics();
        assert_eq!(report.overview.total_tasks, 20);
        assert_eq!(report.overview.completed_tasks, 5);
        assert_eq!(report.overview.in_progress_tasks, 6);
        assert_eq!(report.overview.overdue_tasks, 3);
        assert_eq!(report.overview.completion_rate, 25.0);

        let support: Vec<&str> = report.needs_support.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(support, vec!["user-3", "user-2"]);
        assert_eq!(report.top_performers.len(), 5);

        assert!(report.fastest_tasks.is_empty());
        let slow: Vec<&str> = report.slowest_tasks.iter().map(|h| h.task_id.as_str()).collect();
        assert_eq!(slow, vec!["TASK-16", "TASK-3", "TASK-14", "TASK-15"]);
    }

    #[test]
    fn test_schedule_and_attention() {
        let dw = dashboard();
        let buckets = dw.schedule();
        assert_eq!(task_ids(&buckets.today), vec!["TASK-2"]);
        assert_eq!(
            task_ids(&buckets.this_week),
            vec!["TASK-1", "TASK-2", "TASK-5", "TASK-7", "TASK-10", "TASK-11", "TASK-17"]
        );
        assert_eq!(buckets.this_month.len(), 13);
        assert_eq!(
            task_ids(&dw.needs_attention()),
            vec!["TASK-1", "TASK-2", "TASK-5", "TASK-6", "TASK-7", "TASK-11", "TASK-17"]
        );
        assert_eq!(task_ids(&dw.focus("Alex Rivera", 3).unwrap()), vec!["TASK-1", "TASK-7"]);
    }

    #[test]
    fn test_score_task_lookup() {
        let dw = dashboard();
        let scored = dw.score_task("TASK-3").unwrap();
        assert_eq!(scored.completion_days, Some(16));
        assert_eq!(scored.points, 300);
        assert_eq!(dw.score_task("TASK-1").unwrap().points, 0);
        assert!(dw.score_task("TASK-99").is_err());
    }

    #[test]
    fn test_snapshot_without_users_ranks_every_assignee() {
        let snapshot = Snapshot {
            tasks: vec![
                TaskBuilder::new("a").assignee("x").completed("2025-01-02T00:00:00Z").build(),
                TaskBuilder::new("b").assignee("y").assignee("x").build(),
            ],
            ..Snapshot::default()
        };
        let dw = Dashboard::new(snapshot, ts("2025-02-01"));
        let ids: Vec<String> = dw.leaderboard().into_iter().map(|e| e.stats.user_id).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn test_velocity_window_option() {
        let snapshot =
            Snapshot::from_json(include_str!("../data/sample_snapshot.json")).unwrap();
        let options = MetricsOptions {
            velocity_window_weeks: 1,
            ..MetricsOptions::default()
        };
        let dw = Dashboard::with_options(snapshot, ts("2025-11-12T10:00:00Z"), options);
        assert_eq!(dw.assignee_stats("user-2").unwrap().velocity, 3.0);
    }
}
