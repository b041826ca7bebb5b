use axum::{
    extract::{Extension, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::{Task, User};
use crate::policy;
use crate::services::RedisService;

// "Name (email)" per assignee, comma-joined; "Unassigned" when the set is
// empty or every reference dangles.
pub(crate) fn assignee_column(task: &Task, users: &HashMap<String, User>) -> String {
    let names: Vec<String> = task
        .assigned_to
        .iter()
        .filter_map(|id| users.get(id))
        .map(|user| format!("{} ({})", user.name, user.email))
        .collect();
    if names.is_empty() {
        "Unassigned".to_string()
    } else {
        names.join(", ")
    }
}

pub(crate) fn due_date_column(task: &Task) -> String {
    task.due_date
        .map(|due| due.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn csv_attachment(filename: &str, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> AppResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV flush failed: {}", e)))
}

// GET /api/reports/export/tasks (admin only)
pub async fn export_tasks(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
) -> AppResult<Response> {
    policy::admin_only(&actor).require()?;

    let tasks = redis_service.list_tasks().await?;
    let users: HashMap<String, User> = redis_service
        .list_users()
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Task ID",
        "Title",
        "Description",
        "Priority",
        "Status",
        "Due Date",
        "Assigned To",
    ])?;
    for task in &tasks {
        writer.write_record([
            task.id.as_str(),
            task.title.as_str(),
            task.description.as_str(),
            task.priority.as_str(),
            task.status.as_str(),
            &due_date_column(task),
            &assignee_column(task, &users),
        ])?;
    }

    tracing::info!("Exported {} tasks to CSV", tasks.len());
    Ok(csv_attachment("tasks_report.csv", finish(writer)?))
}

// GET /api/reports/export/users (admin only)
pub async fn export_users(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
) -> AppResult<Response> {
    policy::admin_only(&actor).require()?;

    let users = redis_service.list_users().await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["User ID", "Name", "Email", "Role"])?;
    for user in &users {
        writer.write_record([
            user.id.as_str(),
            user.name.as_str(),
            user.email.as_str(),
            user.role.as_str(),
        ])?;
    }

    tracing::info!("Exported {} users to CSV", users.len());
    Ok(csv_attachment("users_report.csv", finish(writer)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Status};
    use chrono::{TimeZone, Utc};

    fn user(id: &str, name: &str, email: &str) -> User {
        User {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            password_hash: String::new(),
            role: crate::models::Role::Member,
            profile_image_url: None,
            created_at: Utc::now(),
        }
    }

    fn task(assigned: &[&str]) -> Task {
        Task {
            id: "t1".into(),
            title: "T".into(),
            description: String::new(),
            priority: Priority::Low,
            status: Status::Pending,
            due_date: None,
            assigned_to: assigned.iter().map(|s| s.to_string()).collect(),
            created_by: None,
            todo_checklist: vec![],
            attachments: vec![],
            progress: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn assignee_column_joins_name_and_email() {
        let mut users = HashMap::new();
        users.insert("u1".to_string(), user("u1", "Alice", "alice@example.com"));
        users.insert("u2".to_string(), user("u2", "Bob", "bob@example.com"));

        let t = task(&["u1", "u2"]);
        assert_eq!(
            assignee_column(&t, &users),
            "Alice (alice@example.com), Bob (bob@example.com)"
        );

        assert_eq!(assignee_column(&task(&[]), &users), "Unassigned");
        // Dangling references are skipped, not rendered
        assert_eq!(assignee_column(&task(&["gone"]), &users), "Unassigned");
    }

    #[test]
    fn due_date_renders_date_only_or_empty() {
        let mut t = task(&[]);
        assert_eq!(due_date_column(&t), "");

        t.due_date = Some(Utc.with_ymd_and_hms(2026, 3, 9, 17, 30, 0).unwrap());
        assert_eq!(due_date_column(&t), "2026-03-09");
    }
}
