//! Startup wiring shared by the worker and API binaries.

use std::sync::Arc;

use anyhow::Context;
use wardwatch_core::store::{InMemoryPatientStore, PatientStore};
use wardwatch_db::PgPatientStore;

/// Connect the patient store.
///
/// With `DATABASE_URL` set this connects to PostgreSQL, checks the
/// connection and applies migrations. Without it the process runs against
/// an in-memory store that is lost on exit.
pub async fn connect_store() -> anyhow::Result<Arc<dyn PatientStore>> {
    let Some(database_url) = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()) else {
        tracing::warn!("DATABASE_URL not set, using in-memory patient store");
        return Ok(Arc::new(InMemoryPatientStore::new()));
    };

    let pool = wardwatch_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    wardwatch_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    wardwatch_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(Arc::new(PgPatientStore::new(pool)))
}
