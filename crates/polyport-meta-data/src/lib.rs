//! Polyport data layer for `PostgreSQL` state management
//!
//! Persists the import targets (`ProblemSource`) and the per-attempt audit
//! rows (`ProblemSourceImport`) behind the `SourceRepository` trait so the
//! importer and the API never touch `sqlx` directly.

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod repository;
pub mod traits;

pub mod mock;
pub use mock::MockSourceRepository;

// Public exports
pub use error::{DatabaseError, DatabaseErrorExt, DatabaseResult};
pub use migrations::run_migrations;
pub use models::{ImportStatus, ProblemSource, ProblemSourceImport};
pub use polyport_config::DatabaseConfig;
pub use pool::{create_pool, initialize_database};
pub use repository::DbSourceRepository;
pub use traits::SourceRepository;
