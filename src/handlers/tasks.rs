use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::Task;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub completed: bool,
    pub archived: bool,
    pub assignee_ids: Vec<Uuid>,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            status: task.status,
            completed: task.completed,
            archived: task.archived,
            assignee_ids: task.assignee_ids,
        }
    }
}

/// GET /api/v1/tasks/:task_id
pub async fn task_get(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<TaskView> {
    let task = state
        .tasks
        .find_by_id(task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    Ok(ApiResponse::success(task.into()))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// PUT /api/v1/tasks/:task_id/status
pub async fn task_status_put(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> ApiResult<TaskView> {
    let task = state
        .tasks
        .set_status(task_id, &payload.status)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    Ok(ApiResponse::success(task.into()))
}
