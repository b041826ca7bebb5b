use axum::{
    extract::{Extension, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

use crate::aggregate;
use crate::config::Config;
use crate::errors::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{DashboardQuery, Status, Task, TaskView, User};
use crate::policy;
use crate::services::RedisService;

// GET /api/tasks/dashboard (admin only)
// Unscoped counts plus the N most recently created tasks with assignee and
// creator names resolved. N = clamp(?limit, 1, 50), default 10.
pub async fn admin_dashboard(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Response> {
    policy::admin_only(&actor).require()?;

    let tasks = redis_service.list_tasks().await?;
    let user_map: HashMap<String, User> = redis_service
        .list_users()
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();

    let counts = aggregate::dashboard_counts(&tasks);
    let limit = aggregate::clamp_recent_limit(query.limit);
    let recent: Vec<TaskView> = aggregate::recent_tasks(&tasks, limit)
        .into_iter()
        .map(|task| TaskView::build(task, &user_map))
        .collect();

    Ok(Json(json!({ "counts": counts, "recent": recent })).into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpcomingView {
    id: String,
    title: String,
    due_date: Option<DateTime<Utc>>,
    status: Status,
    assigned_to: Vec<String>,
}

impl From<&Task> for UpcomingView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            due_date: task.due_date,
            status: task.status,
            assigned_to: task.assigned_to.clone(),
        }
    }
}

// GET /api/tasks/user-dashboard
// Counts scoped to the actor's assignments plus up to ten tasks due in the
// next seven days, soonest first.
pub async fn user_dashboard(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
) -> AppResult<Response> {
    let tasks = redis_service.list_tasks().await?;

    let counts = aggregate::user_dashboard_counts(&tasks, &actor.id);
    let upcoming: Vec<UpcomingView> = aggregate::upcoming_tasks(&tasks, &actor.id, Utc::now())
        .into_iter()
        .map(UpcomingView::from)
        .collect();

    Ok(Json(json!({ "counts": counts, "upcoming": upcoming })).into_response())
}
