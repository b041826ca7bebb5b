use serde::{Deserialize, Deserializer, Serialize};
use chrono::{DateTime, Utc};
use serde_json::Value;
use super::task::{ChecklistItem, Priority, Status};
use super::user::Role;

// Distinguishes "field absent" from "field explicitly set to null" in
// partial-update bodies. Missing => outer None, null => Some(None).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub admin_invite_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_image_url: Option<String>,
    pub token: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    // null clears the image, absence leaves it untouched
    #[serde(default, deserialize_with = "double_option")]
    pub profile_image_url: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    // Kept raw: a non-array shape is a validation error on create
    #[serde(default)]
    pub assigned_to: Option<Value>,
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
    // Kept raw: a non-array shape is coerced to an empty checklist
    #[serde(default)]
    pub todo_checklist: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    // Kept raw: a malformed shape is skipped while other fields still apply
    #[serde(default)]
    pub assigned_to: Option<Value>,
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
    #[serde(default)]
    pub todo_checklist: Option<Vec<ChecklistItem>>,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub status: Option<Status>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Status,
}

// Body of PUT /api/tasks/:id/todo. Either a full checklist replacement or
// a single {itemIndex, completed} toggle.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChecklistRequest {
    #[serde(default)]
    pub todo_checklist: Option<Value>,
    #[serde(default)]
    pub item_index: Option<i64>,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TaskListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DashboardQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_update_distinguishes_null_from_absent() {
        let absent: UpdateProfileRequest = serde_json::from_str(r#"{"name":"A"}"#).unwrap();
        assert_eq!(absent.profile_image_url, None);

        let cleared: UpdateProfileRequest =
            serde_json::from_str(r#"{"profileImageUrl":null}"#).unwrap();
        assert_eq!(cleared.profile_image_url, Some(None));

        let set: UpdateProfileRequest =
            serde_json::from_str(r#"{"profileImageUrl":"http://x/y.png"}"#).unwrap();
        assert_eq!(set.profile_image_url, Some(Some("http://x/y.png".into())));
    }

    #[test]
    fn update_task_keeps_assigned_to_raw() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"assignedTo":"not-an-array","title":"New"}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("New"));
        assert!(req.assigned_to.as_ref().unwrap().is_string());
    }
}
