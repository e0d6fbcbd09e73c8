//! Database migrations.
//!
//! Applies `crates/storefront/migrations/` and then creates the
//! `tower_sessions` table used by the session layer.

use karya_storefront::middleware::session::session_store;

use super::{CommandError, connect};

/// Run all migrations against `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error if the connection or any migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session table...");
    session_store(&pool)
        .migrate()
        .await
        .map_err(|e| CommandError::SessionStore(e.to_string()))?;

    tracing::info!("Migrations complete!");
    Ok(())
}
