use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;

use crate::aggregate;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::lifecycle;
use crate::middleware::CurrentUser;
use crate::models::{
    CreateTaskRequest, Status, Task, TaskListQuery, TaskView, UpdateChecklistRequest,
    UpdateStatusRequest, UpdateTaskRequest, User,
};
use crate::policy;
use crate::services::RedisService;

async fn user_map(redis_service: &RedisService) -> AppResult<HashMap<String, User>> {
    let users = redis_service.list_users().await?;
    Ok(users.into_iter().map(|u| (u.id.clone(), u)).collect())
}

async fn fetch_task(redis_service: &RedisService, task_id: &str) -> AppResult<Task> {
    redis_service
        .get_task(task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
}

async fn task_view(redis_service: &RedisService, task: &Task) -> AppResult<TaskView> {
    let users = user_map(redis_service).await?;
    Ok(TaskView::build(task, &users))
}

// GET /api/tasks
// Admin sees all tasks, everyone else their assignments; ?status= narrows
// the list. statusSummary is computed alongside (see aggregate module for
// its filter semantics).
pub async fn list_tasks(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Query(query): Query<TaskListQuery>,
) -> AppResult<Response> {
    let explicit = match query.status.as_deref() {
        Some(raw) => Some(
            raw.parse::<Status>()
                .map_err(|_| AppError::Validation("Invalid status filter".to_string()))?,
        ),
        None => None,
    };

    let scope = policy::list_scope(&actor);
    let tasks = redis_service.list_tasks().await?;
    let users = user_map(&redis_service).await?;

    let views: Vec<TaskView> = tasks
        .iter()
        .filter(|task| scope.permits(task))
        .filter(|task| explicit.map_or(true, |s| task.status == s))
        .map(|task| TaskView::build(task, &users))
        .collect();
    let status_summary = aggregate::status_summary(&tasks, &scope, explicit);

    Ok(Json(json!({
        "tasks": views,
        "statusSummary": status_summary,
    }))
    .into_response())
}

// GET /api/tasks/:id — any authenticated user may read any task by id.
pub async fn get_task(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Path(task_id): Path<String>,
) -> AppResult<Json<TaskView>> {
    let task = fetch_task(&redis_service, &task_id).await?;
    Ok(Json(task_view(&redis_service, &task).await?))
}

pub async fn create_task(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    ValidJson(req): ValidJson<CreateTaskRequest>,
) -> AppResult<Response> {
    let task = lifecycle::new_task(req, &actor.id, Utc::now())?;
    redis_service.save_task(&task).await?;

    tracing::info!("Task {} created by {}", task.id, actor.id);

    let view = task_view(&redis_service, &task).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Task created successfully", "task": view })),
    )
        .into_response())
}

pub async fn update_task(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(task_id): Path<String>,
    ValidJson(req): ValidJson<UpdateTaskRequest>,
) -> AppResult<Response> {
    let mut task = fetch_task(&redis_service, &task_id).await?;
    policy::can_update_task(&task, &actor).require()?;

    lifecycle::apply_update(&mut task, req, Utc::now());
    redis_service.save_task(&task).await?;

    let view = task_view(&redis_service, &task).await?;
    Ok(Json(json!({ "message": "Task updated", "task": view })).into_response())
}

// DELETE /api/tasks/:id — no cascade: assignee references elsewhere are
// left dangling and tolerated on read.
pub async fn delete_task(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(task_id): Path<String>,
) -> AppResult<Response> {
    let task = fetch_task(&redis_service, &task_id).await?;
    policy::can_delete_task(&task, &actor).require()?;

    redis_service.delete_task(&task.id).await?;
    tracing::info!("Task {} deleted by {}", task.id, actor.id);

    Ok(Json(json!({ "message": "Task deleted successfully" })).into_response())
}

pub async fn update_status(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(task_id): Path<String>,
    ValidJson(req): ValidJson<UpdateStatusRequest>,
) -> AppResult<Response> {
    let mut task = fetch_task(&redis_service, &task_id).await?;
    policy::can_set_status(&task, &actor).require()?;

    lifecycle::set_status(&mut task, req.status, Utc::now());
    redis_service.save_task(&task).await?;

    let view = task_view(&redis_service, &task).await?;
    Ok(Json(json!({ "message": "Status updated", "task": view })).into_response())
}

// PUT /api/tasks/:id/todo — body carries either a full checklist
// replacement or an {itemIndex, completed} toggle.
pub async fn update_checklist(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(task_id): Path<String>,
    ValidJson(req): ValidJson<UpdateChecklistRequest>,
) -> AppResult<Response> {
    let mut task = fetch_task(&redis_service, &task_id).await?;
    policy::can_edit_checklist(&task, &actor).require()?;

    let message = match (&req.todo_checklist, req.item_index) {
        (Some(items), _) if items.is_array() => {
            lifecycle::replace_checklist(&mut task, items, Utc::now());
            "Checklist replaced"
        }
        (_, Some(index)) => {
            lifecycle::toggle_checklist_item(
                &mut task,
                index,
                req.completed.unwrap_or(false),
                Utc::now(),
            )?;
            "Checklist item updated"
        }
        _ => {
            return Err(AppError::Validation(
                "Invalid payload. Send todoChecklist array or itemIndex + completed".to_string(),
            ))
        }
    };

    redis_service.save_task(&task).await?;
    let view = task_view(&redis_service, &task).await?;
    Ok(Json(json!({ "message": message, "task": view })).into_response())
}
