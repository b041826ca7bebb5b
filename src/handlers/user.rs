use axum::{
    extract::{Extension, Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::aggregate::{self, UserTaskCounts};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::{ListUsersQuery, User, UserView};
use crate::policy;
use crate::services::RedisService;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithCounts {
    #[serde(flatten)]
    user: UserView,
    #[serde(flatten)]
    counts: UserTaskCounts,
}

fn matches_search(user: &User, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    user.name.to_lowercase().contains(&needle) || user.email.to_lowercase().contains(&needle)
}

// ?page defaults to 1, ?limit to 20 capped at 100; both floor at 1.
fn page_params(query: &ListUsersQuery) -> (usize, usize) {
    let page = query.page.unwrap_or(1).max(1) as usize;
    let limit = query.limit.unwrap_or(20).clamp(1, 100) as usize;
    (page, limit)
}

// Role filter (members by default), optional name/email search, newest
// first. Pagination slices the result afterwards.
fn filter_users(users: Vec<User>, query: &ListUsersQuery) -> Vec<User> {
    let role_filter = query.role.clone().unwrap_or_else(|| "member".to_string());
    let mut users: Vec<User> = users
        .into_iter()
        .filter(|user| user.role.as_str() == role_filter)
        .filter(|user| {
            query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map_or(true, |needle| matches_search(user, needle))
        })
        .collect();
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    users
}

fn page_count(total: usize, limit: usize) -> usize {
    total.div_ceil(limit)
}

// GET /api/users (admin only)
// Paginated listing with per-user task counts. Without an explicit role
// filter only members are listed.
pub async fn list_users(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Response> {
    policy::admin_only(&actor).require()?;

    let (page, limit) = page_params(&query);
    let users = filter_users(redis_service.list_users().await?, &query);

    let total = users.len();
    let pages = page_count(total, limit);
    let tasks = redis_service.list_tasks().await?;

    let data: Vec<UserWithCounts> = users
        .iter()
        .skip((page - 1) * limit)
        .take(limit)
        .map(|user| UserWithCounts {
            user: UserView::from(user),
            counts: aggregate::user_task_counts(&tasks, &user.id),
        })
        .collect();

    Ok(Json(json!({
        "meta": { "total": total, "page": page, "limit": limit, "pages": pages },
        "data": data,
    }))
    .into_response())
}

// GET /api/users/:id — plain auth, returns the user plus task counts.
pub async fn get_user(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserWithCounts>> {
    let user = redis_service
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let tasks = redis_service.list_tasks().await?;
    Ok(Json(UserWithCounts {
        user: UserView::from(&user),
        counts: aggregate::user_task_counts(&tasks, &user.id),
    }))
}

// DELETE /api/users/:id (admin only; admin targets are refused)
pub async fn delete_user(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(user_id): Path<String>,
) -> AppResult<Response> {
    let target = redis_service
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    policy::can_delete_user(&target, &actor).require()?;

    // Tasks assigned to the user are left as-is; dangling assignee ids are
    // skipped when views are built.
    redis_service.delete_user(&target).await?;
    tracing::info!("User {} deleted by {}", target.id, actor.id);

    Ok(Json(json!({ "message": "User deleted successfully" })).into_response())
}
