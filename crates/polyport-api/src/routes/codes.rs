//! Problem-code helpers
//!
//! Suggests an unused code from the Polygon problem name and validates
//! candidates before the import form submits.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use polyport_importer::job::{validate_problem_code, MAX_CODE_LENGTH};

use crate::auth::Requester;
use crate::error::{ApiError, ApiResult};
use crate::routes::import::{code_taken, require_import_permission};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SuggestCodeRequest {
    pub polygon_id: i64,
}

#[derive(Debug, Serialize)]
pub struct SuggestCodeResponse {
    pub suggested_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckCodeRequest {
    pub code: String,
}

/// Squeeze a Polygon problem name into the code character class
fn squeeze_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Candidate `idx`: the base itself first, then a numeric suffix with the
/// base cut to keep the total within the length cap
fn numbered_code(base: &str, idx: usize) -> String {
    if idx == 1 {
        return base.to_string();
    }
    let suffix = idx.to_string();
    let keep = MAX_CODE_LENGTH.saturating_sub(suffix.len());
    let mut code: String = base.chars().take(keep).collect();
    code.push_str(&suffix);
    code
}

/// POST /polygon/problems/suggest-code - derive an unused code from the
/// problem's name; gives up after 99 attempts
pub async fn suggest_code(
    State(state): State<AppState>,
    requester: Requester,
    Json(request): Json<SuggestCodeRequest>,
) -> ApiResult<Json<SuggestCodeResponse>> {
    require_import_permission(&state, requester).await?;

    let problem = state.polygon.problem(request.polygon_id).await?;
    let base = squeeze_name(&problem.name);
    if base.is_empty() {
        return Ok(Json(SuggestCodeResponse {
            suggested_code: None,
        }));
    }
    let base: String = base.chars().take(MAX_CODE_LENGTH).collect();

    for idx in 1..100 {
        let candidate = numbered_code(&base, idx);
        if !code_taken(&state, &candidate).await? {
            return Ok(Json(SuggestCodeResponse {
                suggested_code: Some(candidate),
            }));
        }
    }

    Ok(Json(SuggestCodeResponse {
        suggested_code: None,
    }))
}

/// POST /polygon/problems/check-code - 200 when the candidate is usable
pub async fn check_code(
    State(state): State<AppState>,
    requester: Requester,
    Json(request): Json<CheckCodeRequest>,
) -> ApiResult<StatusCode> {
    require_import_permission(&state, requester).await?;

    validate_problem_code(&request.code)
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;
    if code_taken(&state, &request.code).await? {
        return Err(ApiError::BadRequest("Problem exists".to_string()));
    }

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_squeeze_to_the_code_character_class() {
        assert_eq!(squeeze_name("A plus B!"), "aplusb");
        assert_eq!(squeeze_name("Дерево"), "");
        assert_eq!(squeeze_name("Graph-2.0"), "graph20");
    }

    #[test]
    fn numbered_codes_respect_the_length_cap() {
        assert_eq!(numbered_code("aplusb", 1), "aplusb");
        assert_eq!(numbered_code("aplusb", 2), "aplusb2");
        let long = "a".repeat(20);
        assert_eq!(numbered_code(&long, 1).len(), 20);
        let capped = numbered_code(&long, 12);
        assert_eq!(capped.len(), 20);
        assert!(capped.ends_with("12"));
    }
}
