use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::str::FromStr;
use super::user::User;

// Define task status enum. Wire names match the historical API values,
// including the embedded space in "In Progress".
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Status::Pending),
            "In Progress" => Ok(Status::InProgress),
            "Completed" => Ok(Status::Completed),
            _ => Err(()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ChecklistItem {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

// Creator reference. New records are written with a single id, but
// historical documents stored the creator as an array of ids, so
// deserialization has to tolerate both shapes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum CreatorRef {
    One(String),
    Many(Vec<String>),
}

impl CreatorRef {
    pub fn ids(&self) -> &[String] {
        match self {
            CreatorRef::One(id) => std::slice::from_ref(id),
            CreatorRef::Many(ids) => ids,
        }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.ids().iter().any(|id| id == user_id)
    }

    // The semantically-single creator: first id in whatever shape we read.
    pub fn primary(&self) -> Option<&str> {
        self.ids().first().map(String::as_str)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub created_by: Option<CreatorRef>,
    #[serde(default)]
    pub todo_checklist: Vec<ChecklistItem>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    // Derived on every read, never stored.
    pub fn completed_todo_count(&self) -> usize {
        self.todo_checklist.iter().filter(|item| item.completed).count()
    }

    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assigned_to.iter().any(|id| id == user_id)
    }
}

// Short user record embedded in task responses in place of bare ids.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_image_url: Option<String>,
}

impl From<&User> for AssigneeView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            profile_image_url: user.profile_image_url.clone(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Vec<AssigneeView>,
    pub created_by: Option<AssigneeView>,
    pub todo_checklist: Vec<ChecklistItem>,
    pub attachments: Vec<String>,
    pub progress: u8,
    pub completed_todo_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskView {
    // Resolve assignee and creator ids against the user map. Dangling ids
    // are skipped; deletion does not cascade, so they can occur.
    pub fn build(task: &Task, users: &HashMap<String, User>) -> Self {
        let assigned_to = task
            .assigned_to
            .iter()
            .filter_map(|id| users.get(id).map(AssigneeView::from))
            .collect();
        let created_by = task
            .created_by
            .as_ref()
            .and_then(CreatorRef::primary)
            .and_then(|id| users.get(id).map(AssigneeView::from));

        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            status: task.status,
            due_date: task.due_date,
            assigned_to,
            created_by,
            todo_checklist: task.todo_checklist.clone(),
            attachments: task.attachments.clone(),
            progress: task.progress,
            completed_todo_count: task.completed_todo_count(),
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}
