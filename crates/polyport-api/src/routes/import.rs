//! Import creation and re-triggering

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use polyport_judge::{JudgeClient as _, ProblemId};
use polyport_meta_data::{ProblemSource, SourceRepository as _};

use crate::auth::Requester;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub polygon_id: i64,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub source_id: Uuid,
    pub task_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ReimportResponse {
    pub task_id: Uuid,
}

pub(crate) async fn require_import_permission(
    state: &AppState,
    requester: Requester,
) -> ApiResult<()> {
    if state.judge.has_import_permission(requester.0).await? {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Whether any judge problem or import target already claims this code
pub(crate) async fn code_taken(state: &AppState, code: &str) -> ApiResult<bool> {
    Ok(state.judge.problem_exists(code).await? || state.sources.code_in_use(code).await?)
}

/// POST /polygon/import - register a source and start its first import
pub async fn create_import(
    State(state): State<AppState>,
    requester: Requester,
    Json(request): Json<ImportRequest>,
) -> ApiResult<Json<ImportResponse>> {
    require_import_permission(&state, requester).await?;

    polyport_importer::job::validate_problem_code(&request.code)
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;
    if code_taken(&state, &request.code).await? {
        return Err(ApiError::BadRequest("Problem exists".to_string()));
    }

    let source = state
        .sources
        .create_source(request.polygon_id, requester.0 .0, &request.code)
        .await?;
    let task_id = state.dispatcher.dispatch(source.id, requester.0)?;

    Ok(Json(ImportResponse {
        source_id: source.id,
        task_id,
    }))
}

/// Creator-only until a problem exists; problem editors afterwards
async fn require_source_access(
    state: &AppState,
    requester: Requester,
    source: &ProblemSource,
) -> ApiResult<()> {
    match source.problem_id {
        None if source.author_id == requester.0 .0 => Ok(()),
        None => Err(ApiError::Forbidden),
        Some(problem_id) => {
            if state
                .judge
                .is_problem_editor(requester.0, ProblemId(problem_id))
                .await?
            {
                Ok(())
            } else {
                Err(ApiError::Forbidden)
            }
        }
    }
}

/// POST /polygon/sources/{id}/import - re-run the import for a source
pub async fn reimport(
    State(state): State<AppState>,
    requester: Requester,
    Path(source_id): Path<Uuid>,
) -> ApiResult<Json<ReimportResponse>> {
    require_import_permission(&state, requester).await?;

    let source = state
        .sources
        .get_source(&source_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    require_source_access(&state, requester, &source).await?;

    let task_id = state.dispatcher.dispatch(source.id, requester.0)?;
    Ok(Json(ReimportResponse { task_id }))
}
