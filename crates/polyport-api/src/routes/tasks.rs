//! Task state polling

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use polyport_importer::TaskState;

use crate::auth::Requester;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /polygon/tasks/{id} - current state of an import task
pub async fn task_status(
    State(state): State<AppState>,
    _requester: Requester,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskState>> {
    state
        .dispatcher
        .task_state(&task_id)
        .map(Json)
        .ok_or(ApiError::NotFound)
}
