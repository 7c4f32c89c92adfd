//! Embedded schema migrations from `migrations/`, applied through sqlx's
//! migrator (which serializes concurrent runners with an advisory lock).

use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tracing::info;

use crate::error::{TrackerError, TrackerResult};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub struct DatabaseMigrations;

impl DatabaseMigrations {
    /// Apply every outstanding migration
    pub async fn run_all(pool: &PgPool) -> TrackerResult<()> {
        MIGRATOR
            .run(pool)
            .await
            .map_err(|e| TrackerError::RegistryError(format!("Migration failed: {e}")))?;

        info!(
            migrations = MIGRATOR.iter().count(),
            "💾 Database migrations applied"
        );
        Ok(())
    }
}
