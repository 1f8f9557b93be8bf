use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Priority, Task, TaskStatus};
use crate::schedule::is_overdue;
use crate::scoring::score_task;
use crate::storage::repository;
use crate::storage::Snapshot;

/// A row from a task query, with the derived fields filled in.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRow {
    pub task_id: String,
    pub title: String,
    pub project_id: String,
    pub project_name: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee_ids: Vec<String>,
    pub assignee_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_overdue: bool,
    pub completion_days: Option<i64>,
    pub points: u32,
    pub labels: Vec<String>,
}

/// Sort key for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrder {
    Created,
    Due,
    Completed,
    Points,
    CompletionTime,
    Priority,
}

impl TaskOrder {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "created" | "created-at" => Ok(TaskOrder::Created),
            "due" | "due-date" => Ok(TaskOrder::Due),
            "completed" | "completed-at" => Ok(TaskOrder::Completed),
            "points" | "score" => Ok(TaskOrder::Points),
            "completion-time" | "days" => Ok(TaskOrder::CompletionTime),
            "priority" => Ok(TaskOrder::Priority),
            other => Err(Error::Other(format!("unknown sort field: {other}"))),
        }
    }
}

/// Builder for filtering and sorting the tasks of a snapshot.
///
/// Results keep snapshot order unless `order_by` is set. Sorting is
/// stable, and tasks missing the sort field come first in ascending order.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    project_id: Option<String>,
    assignee_id: Option<String>,
    status: Option<TaskStatus>,
    priority: Option<Priority>,
    completed: Option<bool>,
    overdue: Option<bool>,
    created_after: Option<DateTime<Utc>>,
    created_before: Option<DateTime<Utc>>,
    due_after: Option<DateTime<Utc>>,
    due_before: Option<DateTime<Utc>>,
    has_assignee: Option<bool>,
    label: Option<String>,
    limit: Option<usize>,
    order_by: Option<TaskOrder>,
    order_desc: bool,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(mut self, id: &str) -> Self {
        self.project_id = Some(id.to_string());
        self
    }

    pub fn assignee(mut self, id: &str) -> Self {
        self.assignee_id = Some(id.to_string());
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn completed(mut self, val: bool) -> Self {
        self.completed = Some(val);
        self
    }

    pub fn overdue(mut self, val: bool) -> Self {
        self.overdue = Some(val);
        self
    }

    pub fn created_after(mut self, at: DateTime<Utc>) -> Self {
        self.created_after = Some(at);
        self
    }

    pub fn created_before(mut self, at: DateTime<Utc>) -> Self {
        self.created_before = Some(at);
        self
    }

    pub fn due_after(mut self, at: DateTime<Utc>) -> Self {
        self.due_after = Some(at);
        self
    }

    pub fn due_before(mut self, at: DateTime<Utc>) -> Self {
        self.due_before = Some(at);
        self
    }

    pub fn has_assignee(mut self, val: bool) -> Self {
        self.has_assignee = Some(val);
        self
    }

    pub fn label(mut self, name: &str) -> Self {
        self.label = Some(name.to_string());
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn order_by(mut self, order: TaskOrder) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn descending(mut self) -> Self {
        self.order_desc = true;
        self
    }

    fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if let Some(ref id) = self.project_id {
            if &task.project_id != id {
                return false;
            }
        }
        if let Some(ref id) = self.assignee_id {
            if !task.is_assigned_to(id) {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if self.completed.is_some_and(|c| c != task.is_done()) {
            return false;
        }
        if self.overdue.is_some_and(|o| o != is_overdue(task, now)) {
            return false;
        }
        if self.created_after.is_some_and(|at| task.created_at < at) {
            return false;
        }
        if self.created_before.is_some_and(|at| task.created_at > at) {
            return false;
        }
        // Date bounds on the due date exclude tasks without one
        if let Some(at) = self.due_after {
            if !task.due_date.is_some_and(|due| due >= at) {
                return false;
            }
        }
        if let Some(at) = self.due_before {
            if !task.due_date.is_some_and(|due| due <= at) {
                return false;
            }
        }
        if self
            .has_assignee
            .is_some_and(|has| has == task.assignees.is_empty())
        {
            return false;
        }
        if let Some(ref label) = self.label {
            if !task.labels.iter().any(|l| l.eq_ignore_ascii_case(label)) {
                return false;
            }
        }
        true
    }

    fn to_row(snapshot: &Snapshot, task: &Task, now: DateTime<Utc>) -> TaskRow {
        let scored = score_task(task);
        TaskRow {
            task_id: task.id.clone(),
            title: task.title.clone(),
            project_id: task.project_id.clone(),
            project_name: repository::project_by_id(snapshot, &task.project_id)
                .map(|p| p.name.clone()),
            status: task.status,
            priority: task.priority,
            assignee_ids: task.assignees.clone(),
            assignee_names: task
                .assignees
                .iter()
                .filter_map(|id| repository::user_by_id(snapshot, id))
                .map(|u| u.name.clone())
                .collect(),
            created_at: task.created_at,
            completed_at: task.completed_at,
            due_date: task.due_date,
            is_overdue: is_overdue(task, now),
            completion_days: scored.completion_days,
            points: scored.points,
            labels: task.labels.clone(),
        }
    }

    /// Run the query, returning task rows.
    pub fn tasks(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<TaskRow> {
        let mut rows: Vec<TaskRow> = snapshot
            .tasks
            .iter()
            .filter(|t| self.matches(t, now))
            .map(|t| Self::to_row(snapshot, t, now))
            .collect();

        if let Some(order) = self.order_by {
            rows.sort_by(|a, b| {
                let ord = match order {
                    TaskOrder::Created => a.created_at.cmp(&b.created_at),
                    TaskOrder::Due => a.due_date.cmp(&b.due_date),
                    TaskOrder::Completed => a.completed_at.cmp(&b.completed_at),
                    TaskOrder::Points => a.points.cmp(&b.points),
                    TaskOrder::CompletionTime => a.completion_days.cmp(&b.completion_days),
                    TaskOrder::Priority => a.priority.cmp(&b.priority),
                };
                if self.order_desc {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        log::debug!("task query matched {} rows", rows.len());
        rows
    }

    /// Run the query, returning a count of matching tasks.
    pub fn count(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> u64 {
        let matched = snapshot
            .tasks
            .iter()
            .filter(|t| self.matches(t, now))
            .count();
        self.limit.map_or(matched, |l| matched.min(l)) as u64
    }

    /// Run the query, returning results as JSON.
    pub fn to_json(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Result<String> {
        let rows = self.tasks(snapshot, now);
        Ok(serde_json::to_string_pretty(&rows)?)
    }

    /// Run the query, returning results as CSV. Multi-valued columns are
    /// joined with `;`.
    pub fn to_csv(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> String {
        let rows = self.tasks(snapshot, now);
        let mut out = String::new();
        out.push_str("task_id,title,project_id,project_name,status,priority,assignee_ids,assignee_names,created_at,completed_at,due_date,is_overdue,completion_days,points,labels\n");
        for row in &rows {
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
                csv_escape(&row.task_id),
                csv_escape(&row.title),
                csv_escape(&row.project_id),
                csv_escape(row.project_name.as_deref().unwrap_or("")),
                row.status,
                row.priority,
                csv_escape(&row.assignee_ids.join(";")),
                csv_escape(&row.assignee_names.join(";")),
                row.created_at.to_rfc3339(),
                row.completed_at.map_or(String::new(), |d| d.to_rfc3339()),
                row.due_date.map_or(String::new(), |d| d.to_rfc3339()),
                row.is_overdue,
                row.completion_days.map_or(String::new(), |d| d.to_string()),
                row.points,
                csv_escape(&row.labels.join(";")),
            ));
        }
        out
    }
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
