//! Due-date tracking: overdue detection, calendar buckets, and the short
//! "needs attention" / "today's focus" lists shown on the dashboards.
//!
//! Calendar comparisons use UTC dates.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::date_util::days_between;
use crate::model::Task;
use crate::query::window::DueWindow;

/// True when the task has a due date strictly before `now` and is not done.
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    match task.due_date {
        Some(due) => !task.is_done() && due < now,
        None => false,
    }
}

/// Whole days from `now` until the due date (negative once past due).
pub fn days_until_due(task: &Task, now: DateTime<Utc>) -> Option<i64> {
    task.due_date.map(|due| days_between(now, due))
}

/// Incomplete tasks with a due date, grouped by calendar window.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DueBuckets<'a> {
    pub today: Vec<&'a Task>,
    pub this_week: Vec<&'a Task>,
    pub this_month: Vec<&'a Task>,
}

impl<'a> DueBuckets<'a> {
    pub fn get(&self, window: DueWindow) -> &[&'a Task] {
        match window {
            DueWindow::Today => &self.today,
            DueWindow::ThisWeek => &self.this_week,
            DueWindow::ThisMonth => &self.this_month,
        }
    }
}

pub fn bucket_by_due_window(tasks: &[Task], now: DateTime<Utc>) -> DueBuckets<'_> {
    let today = now.date_naive();
    let mut buckets = DueBuckets::default();
    for task in tasks {
        let due = match task.due_date {
            Some(due) if !task.is_done() => due.date_naive(),
            _ => continue,
        };
        if DueWindow::Today.contains(today, due) {
            buckets.today.push(task);
        }
        if DueWindow::ThisWeek.contains(today, due) {
            buckets.this_week.push(task);
        }
        if DueWindow::ThisMonth.contains(today, due) {
            buckets.this_month.push(task);
        }
    }
    buckets
}

/// Incomplete tasks due inside a single window.
pub fn tasks_due_within(tasks: &[Task], window: DueWindow, now: DateTime<Utc>) -> Vec<&Task> {
    let today = now.date_naive();
    tasks
        .iter()
        .filter(|t| !t.is_done())
        .filter(|t| {
            t.due_date
                .is_some_and(|due| window.contains(today, due.date_naive()))
        })
        .collect()
}

/// Open tasks a project manager should look at: anything urgent or high
/// priority, plus anything overdue.
pub fn needs_attention(tasks: &[Task], now: DateTime<Utc>) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| !t.is_done() && (t.priority.is_pressing() || is_overdue(t, now)))
        .collect()
}

/// Tasks waiting on at least one other task, in snapshot order. Done tasks
/// are included while they still list a blocker.
pub fn blocked_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|t| !t.blocked_by.is_empty()).collect()
}

/// A user's open urgent/high tasks in snapshot order, capped at `limit`.
pub fn focus_tasks<'a>(tasks: &'a [Task], user_id: &str, limit: usize) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.is_assigned_to(user_id) && !t.is_done() && t.priority.is_pressing())
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{rollup_for_assignee, rollup_for_project};
    use crate::model::{Priority, TaskStatus};
    use crate::testing::{ts, TaskBuilder};

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_is_overdue() {
        let now = ts("2025-11-12T10:00:00Z");
        let late = TaskBuilder::new("a")
            .status(TaskStatus::InProgress)
            .due("2025-11-11T00:00:00Z")
            .build();
        let done_late = TaskBuilder::new("b")
            .due("2025-11-11T00:00:00Z")
            .completed("2025-11-12T00:00:00Z")
            .build();
        let no_due = TaskBuilder::new("c").build();
        let future = TaskBuilder::new("d").due("2025-11-13T00:00:00Z").build();

        assert!(is_overdue(&late, now));
        assert!(!is_overdue(&done_late, now));
        assert!(!is_overdue(&no_due, now));
        assert!(!is_overdue(&future, now));
    }

    #[test]
    fn test_due_exactly_now_is_not_overdue() {
        let now = ts("2025-11-12T00:00:00Z");
        let t = TaskBuilder::new("a").due("2025-11-12T00:00:00Z").build();
        assert!(!is_overdue(&t, now));
    }

    #[test]
    fn test_days_until_due() {
        let now = ts("2025-11-12T00:00:00Z");
        let soon = TaskBuilder::new("a").due("2025-11-15T00:00:00Z").build();
        let past = TaskBuilder::new("b").due("2025-11-10T00:00:00Z").build();
        assert_eq!(days_until_due(&soon, now), Some(3));
        assert_eq!(days_until_due(&past, now), Some(-2));
        assert_eq!(days_until_due(&TaskBuilder::new("c").build(), now), None);
    }

    #[test]
    fn test_buckets_overlap() {
        // Wednesday; week is Nov 9 - Nov 16
        let now = ts("2025-11-12T10:00:00Z");
        let tasks = vec![
            TaskBuilder::new("today").due("2025-11-12T23:00:00Z").build(),
            TaskBuilder::new("sat").due("2025-11-15T00:00:00Z").build(),
            TaskBuilder::new("later").due("2025-11-28T00:00:00Z").build(),
            TaskBuilder::new("next-month").due("2025-12-02T00:00:00Z").build(),
            TaskBuilder::new("no-due").build(),
            TaskBuilder::new("done")
                .due("2025-11-12T12:00:00Z")
                .completed("2025-11-11T00:00:00Z")
                .build(),
        ];
        let buckets = bucket_by_due_window(&tasks, now);
        assert_eq!(ids(&buckets.today), vec!["today"]);
        assert_eq!(ids(&buckets.this_week), vec!["today", "sat"]);
        assert_eq!(ids(&buckets.this_month), vec!["today", "sat", "later"]);
        assert_eq!(ids(buckets.get(DueWindow::ThisWeek)), vec!["today", "sat"]);
    }

    #[test]
    fn test_overdue_task_outside_windows_is_in_no_bucket() {
        // Sunday Mar 1: week and month both start today, so Feb 28 is in no window
        let now = ts("2026-03-01T10:00:00Z");
        let tasks = vec![TaskBuilder::new("late")
            .project("p1")
            .assignee("u1")
            .status(TaskStatus::InProgress)
            .due("2026-02-28T00:00:00Z")
            .build()];
        assert!(is_overdue(&tasks[0], now));
        let buckets = bucket_by_due_window(&tasks, now);
        assert!(buckets.today.is_empty());
        assert!(buckets.this_week.is_empty());
        assert!(buckets.this_month.is_empty());

        assert_eq!(rollup_for_project(&tasks, "p1", now).overdue_count, 1);
        assert_eq!(rollup_for_assignee(&tasks, "u1", now).overdue_count, 1);
    }

    #[test]
    fn test_blocked_tasks() {
        let tasks = vec![
            TaskBuilder::new("a").build(),
            TaskBuilder::new("b").blocked_by("a").build(),
            TaskBuilder::new("c")
                .blocked_by("a")
                .completed("2025-01-03T00:00:00Z")
                .build(),
        ];
        assert_eq!(ids(&blocked_tasks(&tasks)), vec!["b", "c"]);
        assert!(blocked_tasks(&[]).is_empty());
    }

    #[test]
    fn test_tasks_due_within_matches_bucket() {
        let now = ts("2025-11-12T10:00:00Z");
        let tasks = vec![
            TaskBuilder::new("a").due("2025-11-16T00:00:00Z").build(),
            TaskBuilder::new("b").due("2025-11-17T00:00:00Z").build(),
        ];
        let buckets = bucket_by_due_window(&tasks, now);
        for window in DueWindow::ALL {
            assert_eq!(
                ids(&tasks_due_within(&tasks, window, now)),
                ids(buckets.get(window))
            );
        }
    }

    #[test]
    fn test_empty_task_list() {
        let buckets = bucket_by_due_window(&[], ts("2025-11-12T10:00:00Z"));
        assert!(buckets.today.is_empty() && buckets.this_week.is_empty());
        assert!(needs_attention(&[], ts("2025-11-12T10:00:00Z")).is_empty());
    }

    #[test]
    fn test_needs_attention() {
        let now = ts("2025-11-12T10:00:00Z");
        let tasks = vec![
            TaskBuilder::new("urgent").priority(Priority::Urgent).build(),
            TaskBuilder::new("low-overdue")
                .priority(Priority::Low)
                .due("2025-11-01T00:00:00Z")
                .build(),
            TaskBuilder::new("medium").build(),
            TaskBuilder::new("high-done")
                .priority(Priority::High)
                .completed("2025-11-02T00:00:00Z")
                .build(),
        ];
        assert_eq!(
            ids(&needs_attention(&tasks, now)),
            vec!["urgent", "low-overdue"]
        );
    }

    #[test]
    fn test_focus_tasks_limit_and_owner() {
        let tasks = vec![
            TaskBuilder::new("a").priority(Priority::High).assignee("u1").build(),
            TaskBuilder::new("b").priority(Priority::Low).assignee("u1").build(),
            TaskBuilder::new("c").priority(Priority::Urgent).assignee("u2").build(),
            TaskBuilder::new("d").priority(Priority::Urgent).assignee("u1").build(),
            TaskBuilder::new("e").priority(Priority::High).assignee("u1").build(),
            TaskBuilder::new("f").priority(Priority::High).assignee("u1").build(),
        ];
        assert_eq!(ids(&focus_tasks(&tasks, "u1", 3)), vec!["a", "d", "e"]);
        assert!(focus_tasks(&tasks, "u3", 3).is_empty());
    }
}
