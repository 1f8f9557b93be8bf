use chrono::{DateTime, Utc};

use crate::date_util::parse_timestamp;
use crate::model::{Priority, Task, TaskStatus};

pub fn ts(s: &str) -> DateTime<Utc> {
    parse_timestamp(s).unwrap()
}

/// Builds tasks for tests. Defaults to an unassigned medium-priority todo in
/// project `p1`, created 2025-01-01.
pub struct TaskBuilder(Task);

impl TaskBuilder {
    pub fn new(id: &str) -> Self {
        Self(Task {
            id: id.to_string(),
            project_id: "p1".to_string(),
            title: format!("Task {id}"),
            description: None,
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            assignees: Vec::new(),
            created_at: ts("2025-01-01T00:00:00Z"),
            updated_at: None,
            completed_at: None,
            due_date: None,
            labels: Vec::new(),
            blocked_by: Vec::new(),
        })
    }

    pub fn project(mut self, project_id: &str) -> Self {
        self.0.project_id = project_id.to_string();
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.0.status = status;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.0.priority = priority;
        self
    }

    pub fn assignee(mut self, user_id: &str) -> Self {
        self.0.assignees.push(user_id.to_string());
        self
    }

    pub fn created(mut self, at: &str) -> Self {
        self.0.created_at = ts(at);
        self
    }

    /// Marks the task done at the given time.
    pub fn completed(mut self, at: &str) -> Self {
        self.0.status = TaskStatus::Done;
        self.0.completed_at = Some(ts(at));
        self
    }

    pub fn due(mut self, at: &str) -> Self {
        self.0.due_date = Some(ts(at));
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.0.labels.push(label.to_string());
        self
    }

    pub fn blocked_by(mut self, task_id: &str) -> Self {
        self.0.blocked_by.push(task_id.to_string());
        self
    }

    pub fn build(self) -> Task {
        self.0
    }
}
