//! Import request API
//!
//! Axum endpoints for creating and re-triggering import jobs, polling their
//! task state, and helping users pick a free problem code. The host judge
//! links this router into its server and supplies the `JudgeClient` /
//! `MediaStore` implementations via [`bootstrap::start`].

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod routes;
pub mod state;

pub use bootstrap::{serve, start, start_from_env, Bootstrap};
pub use error::{ApiError, ApiResult};
pub use state::AppState;
