//! Route modules

pub mod codes;
pub mod import;
pub mod tasks;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// All importer endpoints, mounted under `/polygon`
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest(
            "/polygon",
            Router::new()
                .route("/import", post(import::create_import))
                .route("/sources/{id}/import", post(import::reimport))
                .route("/tasks/{id}", get(tasks::task_status))
                .route("/problems/suggest-code", post(codes::suggest_code))
                .route("/problems/check-code", post(codes::check_code)),
        )
        .with_state(state)
}
