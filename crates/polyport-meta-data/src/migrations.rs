//! Embedded schema migrations

use sqlx::PgPool;

use crate::error::DatabaseResult;

/// Apply all pending migrations from the crate's `migrations/` directory
pub async fn run_migrations(pool: &PgPool) -> DatabaseResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
