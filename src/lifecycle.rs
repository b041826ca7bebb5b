//! Task lifecycle engine.
//!
//! Pure mutations over [`Task`]: creation, whitelisted partial update,
//! status transitions and checklist edits. Handlers do the store reads and
//! writes; everything here only validates and transforms the record.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{ChecklistItem, CreateTaskRequest, CreatorRef, Status, Task, UpdateTaskRequest};

// A well-formed assignee set is a JSON array of string ids. Returns None for
// any other shape; callers decide whether that is an error (create) or a
// silent skip (partial update).
pub fn assignee_ids(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

// Coerce arbitrary JSON into a checklist: each entry becomes
// {text: string default "", completed: bool default false}.
pub fn normalize_checklist(value: &Value) -> Vec<ChecklistItem> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| ChecklistItem {
            text: item
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            completed: item
                .get("completed")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
        .collect()
}

pub fn new_task(req: CreateTaskRequest, creator_id: &str, now: DateTime<Utc>) -> AppResult<Task> {
    let title = req.title.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let assigned_to = match &req.assigned_to {
        Some(value) => assignee_ids(value).ok_or_else(|| {
            AppError::Validation("assignedTo must be an array of user IDs".to_string())
        })?,
        None => Vec::new(),
    };

    let todo_checklist = req
        .todo_checklist
        .as_ref()
        .map(normalize_checklist)
        .unwrap_or_default();

    Ok(Task {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        description: req.description.unwrap_or_default(),
        priority: req.priority.unwrap_or_default(),
        status: Status::Pending,
        due_date: req.due_date,
        assigned_to,
        created_by: Some(CreatorRef::One(creator_id.to_string())),
        todo_checklist,
        attachments: req.attachments.unwrap_or_default(),
        progress: 0,
        created_at: now,
        updated_at: now,
    })
}

// Applies only the whitelisted fields present in the request. A malformed
// assignedTo is skipped without failing the rest of the update.
pub fn apply_update(task: &mut Task, req: UpdateTaskRequest, now: DateTime<Utc>) {
    if let Some(title) = req.title {
        task.title = title;
    }
    if let Some(description) = req.description {
        task.description = description;
    }
    if let Some(priority) = req.priority {
        task.priority = priority;
    }
    if let Some(due_date) = req.due_date {
        task.due_date = due_date;
    }
    if let Some(value) = &req.assigned_to {
        if let Some(ids) = assignee_ids(value) {
            task.assigned_to = ids;
        }
    }
    if let Some(attachments) = req.attachments {
        task.attachments = attachments;
    }
    if let Some(todo_checklist) = req.todo_checklist {
        task.todo_checklist = todo_checklist;
    }
    if let Some(progress) = req.progress {
        task.progress = progress.min(100);
    }
    if let Some(status) = req.status {
        set_status(task, status, now);
        return;
    }
    task.updated_at = now;
}

// Every status-setting transition runs through here: Completed forces
// progress to 100; leaving Completed does not reset it.
pub fn set_status(task: &mut Task, status: Status, now: DateTime<Utc>) {
    task.status = status;
    if status == Status::Completed {
        task.progress = 100;
    }
    task.updated_at = now;
}

pub fn replace_checklist(task: &mut Task, items: &Value, now: DateTime<Utc>) {
    task.todo_checklist = normalize_checklist(items);
    task.updated_at = now;
}

pub fn toggle_checklist_item(
    task: &mut Task,
    index: i64,
    completed: bool,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if index < 0 || index as usize >= task.todo_checklist.len() {
        return Err(AppError::Validation("Invalid itemIndex".to_string()));
    }
    task.todo_checklist[index as usize].completed = completed;
    task.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use serde_json::json;

    fn create(title: Option<&str>) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn create_defaults_to_pending_with_zero_progress() {
        let now = Utc::now();
        let task = new_task(
            CreateTaskRequest {
                title: Some("T".into()),
                priority: Some(Priority::High),
                due_date: Some(now),
                ..Default::default()
            },
            "u1",
            now,
        )
        .unwrap();

        assert_eq!(task.title, "T");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.progress, 0);
        assert_eq!(task.completed_todo_count(), 0);
        assert!(task.created_by.unwrap().contains("u1"));
    }

    #[test]
    fn create_rejects_empty_title() {
        let now = Utc::now();
        assert!(matches!(
            new_task(create(None), "u1", now),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            new_task(create(Some("   ")), "u1", now),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn create_rejects_non_array_assignees() {
        let now = Utc::now();
        let req = CreateTaskRequest {
            title: Some("T".into()),
            assigned_to: Some(json!("u1")),
            ..Default::default()
        };
        assert!(matches!(
            new_task(req, "u1", now),
            Err(AppError::Validation(_))
        ));

        let req = CreateTaskRequest {
            title: Some("T".into()),
            assigned_to: Some(json!(["u1", 7])),
            ..Default::default()
        };
        assert!(matches!(
            new_task(req, "u1", now),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn update_skips_malformed_assignees_but_applies_rest() {
        let now = Utc::now();
        let mut task = new_task(create(Some("Old")), "u1", now).unwrap();
        task.assigned_to = vec!["u2".into()];

        let req: UpdateTaskRequest =
            serde_json::from_value(json!({ "assignedTo": "not-an-array", "title": "New" }))
                .unwrap();
        apply_update(&mut task, req, now);

        assert_eq!(task.title, "New");
        assert_eq!(task.assigned_to, vec!["u2".to_string()]);
    }

    #[test]
    fn update_applies_well_formed_assignees() {
        let now = Utc::now();
        let mut task = new_task(create(Some("T")), "u1", now).unwrap();

        let req: UpdateTaskRequest =
            serde_json::from_value(json!({ "assignedTo": ["u5", "u6"] })).unwrap();
        apply_update(&mut task, req, now);

        assert_eq!(task.assigned_to, vec!["u5".to_string(), "u6".to_string()]);
    }

    #[test]
    fn completing_forces_progress_and_reopening_keeps_it() {
        let now = Utc::now();
        let mut task = new_task(create(Some("T")), "u1", now).unwrap();
        task.progress = 40;

        set_status(&mut task, Status::Completed, now);
        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.progress, 100);

        set_status(&mut task, Status::InProgress, now);
        assert_eq!(task.status, Status::InProgress);
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn completing_via_partial_update_forces_progress() {
        let now = Utc::now();
        let mut task = new_task(create(Some("T")), "u1", now).unwrap();

        let req: UpdateTaskRequest =
            serde_json::from_value(json!({ "status": "Completed" })).unwrap();
        apply_update(&mut task, req, now);

        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn set_status_is_idempotent() {
        let now = Utc::now();
        let mut once = new_task(create(Some("T")), "u1", now).unwrap();
        set_status(&mut once, Status::Pending, now);

        let mut twice = new_task(create(Some("T")), "u1", now).unwrap();
        twice.id = once.id.clone();
        set_status(&mut twice, Status::Pending, now);
        set_status(&mut twice, Status::Pending, now);

        assert_eq!(once.status, twice.status);
        assert_eq!(once.progress, twice.progress);
        assert_eq!(once.updated_at, twice.updated_at);
    }

    #[test]
    fn normalize_checklist_fills_defaults() {
        let items = json!([
            { "text": "write docs", "completed": true },
            { "completed": "yes" },
            {},
            "junk"
        ]);
        let checklist = normalize_checklist(&items);
        assert_eq!(checklist.len(), 4);
        assert_eq!(checklist[0].text, "write docs");
        assert!(checklist[0].completed);
        // Non-boolean completed and non-object entries coerce to defaults
        assert!(!checklist[1].completed);
        assert_eq!(checklist[2], ChecklistItem::default());
        assert_eq!(checklist[3], ChecklistItem::default());

        assert!(normalize_checklist(&json!("nope")).is_empty());
    }

    #[test]
    fn toggle_out_of_bounds_leaves_checklist_unmodified() {
        let now = Utc::now();
        let mut task = new_task(create(Some("T")), "u1", now).unwrap();
        replace_checklist(&mut task, &json!([{ "text": "a" }, { "text": "b" }]), now);
        let before = task.todo_checklist.clone();

        assert!(toggle_checklist_item(&mut task, 2, true, now).is_err());
        assert!(toggle_checklist_item(&mut task, -1, true, now).is_err());
        assert_eq!(task.todo_checklist, before);

        toggle_checklist_item(&mut task, 1, true, now).unwrap();
        assert!(task.todo_checklist[1].completed);
        assert_eq!(task.completed_todo_count(), 1);
    }
}
