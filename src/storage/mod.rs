pub mod repository;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Project, Task, TaskStatus, User};

/// Environment variable that overrides the default snapshot location.
pub const SNAPSHOT_ENV: &str = "DEVIZE_SNAPSHOT";

/// An immutable view of every user, project and task the analytics run over.
///
/// Analytics never read global state: callers load a snapshot once and pass
/// it (or slices of it) to the pure functions in `scoring`, `metrics` and
/// `schedule`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Snapshot {
    /// Open the snapshot at `$DEVIZE_SNAPSHOT`, or `~/.devize/snapshot.json`.
    pub fn open() -> Result<Self> {
        Self::open_at(default_path()?)
    }

    /// Open the snapshot at the given path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Opening snapshot at {}", path.display());
        let json = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json(&json)?;
        log::debug!(
            "Loaded snapshot from {}: {} users, {} projects, {} tasks",
            path.display(),
            snapshot.users.len(),
            snapshot.projects.len(),
            snapshot.tasks.len()
        );
        Ok(snapshot)
    }

    /// Parse a snapshot document and report (but keep) inconsistent records.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        for anomaly in snapshot.anomalies() {
            log::warn!("{anomaly}");
        }
        Ok(snapshot)
    }

    /// Records that break the assumptions the analytics make about the data.
    /// None of these are fatal; the analytics treat them as documented
    /// pass-through cases.
    pub fn anomalies(&self) -> Vec<String> {
        let user_ids: HashSet<&str> = self.users.iter().map(|u| u.id.as_str()).collect();
        let project_ids: HashSet<&str> = self.projects.iter().map(|p| p.id.as_str()).collect();

        let mut out = Vec::new();
        for task in &self.tasks {
            match (task.status, task.completed_at) {
                (TaskStatus::Done, None) => {
                    out.push(format!("Task {} is done but has no completed_at", task.id))
                }
                (status, Some(_)) if status != TaskStatus::Done => out.push(format!(
                    "Task {} has completed_at but status is {status}",
                    task.id
                )),
                (_, Some(completed)) if completed < task.created_at => out.push(format!(
                    "Task {} was completed before it was created",
                    task.id
                )),
                _ => {}
            }
            if !self.projects.is_empty() && !project_ids.contains(task.project_id.as_str()) {
                out.push(format!(
                    "Task {} references unknown project {}",
                    task.id, task.project_id
                ));
            }
            if !self.users.is_empty() {
                for assignee in &task.assignees {
                    if !user_ids.contains(assignee.as_str()) {
                        out.push(format!(
                            "Task {} is assigned to unknown user {assignee}",
                            task.id
                        ));
                    }
                }
            }
        }
        out
    }
}

/// Resolve the snapshot path from the environment or the home directory.
pub fn default_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(SNAPSHOT_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let dir = dirs::home_dir()
        .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
        .join(".devize");
    Ok(dir.join("snapshot.json"))
}
