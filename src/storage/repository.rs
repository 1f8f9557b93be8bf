use crate::model::{Project, Role, Task, User};
use crate::storage::Snapshot;

// ── Users ──────────────────────────────────────────────────────────

pub fn user_by_id<'a>(snapshot: &'a Snapshot, user_id: &str) -> Option<&'a User> {
    snapshot.users.iter().find(|u| u.id == user_id)
}

/// Resolve a user identifier to a user.
/// Tries the id first, then the email address, then the display name
/// (both case-insensitive). Returns None if nothing matches.
pub fn resolve_user_identifier<'a>(snapshot: &'a Snapshot, identifier: &str) -> Option<&'a User> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return None;
    }
    if let Some(user) = user_by_id(snapshot, identifier) {
        return Some(user);
    }
    let needle = identifier.to_lowercase();
    snapshot
        .users
        .iter()
        .find(|u| u.email.as_deref().map(str::to_lowercase).as_deref() == Some(needle.as_str()))
        .or_else(|| snapshot.users.iter().find(|u| u.name.to_lowercase() == needle))
}

pub fn users_with_role<'a>(snapshot: &'a Snapshot, role: &Role) -> Vec<&'a User> {
    snapshot.users.iter().filter(|u| &u.role == role).collect()
}

/// Leaderboards and team analytics rank developers only.
pub fn developers(snapshot: &Snapshot) -> Vec<&User> {
    users_with_role(snapshot, &Role::Developer)
}

// ── Projects ───────────────────────────────────────────────────────

pub fn project_by_id<'a>(snapshot: &'a Snapshot, project_id: &str) -> Option<&'a Project> {
    snapshot.projects.iter().find(|p| p.id == project_id)
}

pub fn projects_for_member<'a>(snapshot: &'a Snapshot, user_id: &str) -> Vec<&'a Project> {
    snapshot
        .projects
        .iter()
        .filter(|p| p.members.iter().any(|m| m == user_id))
        .collect()
}

// ── Tasks ──────────────────────────────────────────────────────────

pub fn task_by_id<'a>(snapshot: &'a Snapshot, task_id: &str) -> Option<&'a Task> {
    snapshot.tasks.iter().find(|t| t.id == task_id)
}

/// Every task listing `user_id` among its assignees, in snapshot order.
pub fn tasks_by_assignee<'a>(tasks: &'a [Task], user_id: &str) -> Vec<&'a Task> {
    tasks.iter().filter(|t| t.is_assigned_to(user_id)).collect()
}

pub fn tasks_by_project<'a>(tasks: &'a [Task], project_id: &str) -> Vec<&'a Task> {
    tasks.iter().filter(|t| t.project_id == project_id).collect()
}
