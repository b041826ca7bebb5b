//! Count and summary computation for list, dashboard and user endpoints.
//!
//! Counts are computed as independent passes over the task set, each with
//! its own predicate, mirroring how the API has always run one count query
//! per bucket. In particular `StatusSummary.all` respects the explicit
//! status filter while the per-status buckets do not (see the tests).

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{Status, Task};
use crate::policy::Scope;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub all: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

fn count_where(tasks: &[Task], scope: &Scope, status: Option<Status>) -> usize {
    tasks
        .iter()
        .filter(|task| scope.permits(task))
        .filter(|task| status.map_or(true, |s| task.status == s))
        .count()
}

// `all` combines the scope with the caller's explicit status filter; the
// three status buckets combine the scope with their own status only. With
// an explicit filter the buckets are deliberately not subsets of `all`.
pub fn status_summary(tasks: &[Task], scope: &Scope, explicit: Option<Status>) -> StatusSummary {
    StatusSummary {
        all: count_where(tasks, scope, explicit),
        pending: count_where(tasks, scope, Some(Status::Pending)),
        in_progress: count_where(tasks, scope, Some(Status::InProgress)),
        completed: count_where(tasks, scope, Some(Status::Completed)),
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

pub fn dashboard_counts(tasks: &[Task]) -> DashboardCounts {
    DashboardCounts {
        total: tasks.len(),
        pending: count_where(tasks, &Scope::All, Some(Status::Pending)),
        in_progress: count_where(tasks, &Scope::All, Some(Status::InProgress)),
        completed: count_where(tasks, &Scope::All, Some(Status::Completed)),
    }
}

pub fn clamp_recent_limit(requested: Option<i64>) -> usize {
    requested.unwrap_or(10).clamp(1, 50) as usize
}

// The N most recently created tasks, newest first.
pub fn recent_tasks(tasks: &[Task], limit: usize) -> Vec<&Task> {
    let mut recent: Vec<&Task> = tasks.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(limit);
    recent
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserDashboardCounts {
    pub assigned: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

pub fn user_dashboard_counts(tasks: &[Task], user_id: &str) -> UserDashboardCounts {
    let scope = Scope::AssignedTo(user_id.to_string());
    UserDashboardCounts {
        assigned: count_where(tasks, &scope, None),
        pending: count_where(tasks, &scope, Some(Status::Pending)),
        in_progress: count_where(tasks, &scope, Some(Status::InProgress)),
        completed: count_where(tasks, &scope, Some(Status::Completed)),
    }
}

// Up to ten of the actor's tasks due within the next seven days, soonest
// first. Tasks without a due date never qualify.
pub fn upcoming_tasks<'a>(tasks: &'a [Task], user_id: &str, now: DateTime<Utc>) -> Vec<&'a Task> {
    let horizon = now + Duration::days(7);
    let mut upcoming: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.is_assigned_to(user_id))
        .filter(|task| {
            task.due_date
                .is_some_and(|due| due >= now && due <= horizon)
        })
        .collect();
    upcoming.sort_by_key(|task| task.due_date);
    upcoming.truncate(10);
    upcoming
}

// Per-user buckets shown in user listings and profiles.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserTaskCounts {
    pub pending_tasks: usize,
    pub in_progress_tasks: usize,
    pub completed_tasks: usize,
}

pub fn user_task_counts(tasks: &[Task], user_id: &str) -> UserTaskCounts {
    let scope = Scope::AssignedTo(user_id.to_string());
    UserTaskCounts {
        pending_tasks: count_where(tasks, &scope, Some(Status::Pending)),
        in_progress_tasks: count_where(tasks, &scope, Some(Status::InProgress)),
        completed_tasks: count_where(tasks, &scope, Some(Status::Completed)),
    }
}
