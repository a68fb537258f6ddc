//! Database module
//!
//! Connection pool and schema utilities for the PostgreSQL backend.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::state::postgres::SCHEMA;

/// Open a connection pool
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Create the world-state table and version sequence if missing
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("World state schema ready");
    Ok(())
}

/// Check if the world-state table exists
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = 'world_state'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !exists {
        tracing::error!("Required table 'world_state' does not exist");
    }

    Ok(exists)
}
