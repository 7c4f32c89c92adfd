use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::error::{TrackerError, TrackerResult};
use crate::models::{
    ExecutionRef, NewOperation, Operation, OperationExtra, ResolutionChannel, TerminalTransition,
};
use crate::registry::OperationRegistry;
use crate::state_machine::OperationStatus;

const OPERATION_COLUMNS: &str = "correlation_key, kind, owner_ref, status, extra, resolved_by, \
     registered_at, updated_at, completed_at";

/// Operation registry persisted in `tracked_operations`
///
/// The terminal compare-and-set is a single conditional `UPDATE`; PostgreSQL's
/// row lock makes exactly one concurrent caller see the row as updated.
#[derive(Debug, Clone)]
pub struct PgOperationRegistry {
    pool: PgPool,
}

impl PgOperationRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn operation_from_row(row: &PgRow) -> TrackerResult<Operation> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OperationStatus>()
            .map_err(TrackerError::RegistryError)?;

        let extra: Option<serde_json::Value> = row.try_get("extra")?;
        let extra = extra
            .map(serde_json::from_value::<OperationExtra>)
            .transpose()?;

        let resolved_by: Option<String> = row.try_get("resolved_by")?;
        let resolved_by = match resolved_by.as_deref() {
            None => None,
            Some("push") => Some(ResolutionChannel::Push),
            Some("poll") => Some(ResolutionChannel::Poll),
            Some(other) => {
                return Err(TrackerError::RegistryError(format!(
                    "Invalid resolved_by in database: {other}"
                )))
            }
        };

        let owner: String = row.try_get("owner_ref")?;
        let registered_at: DateTime<Utc> = row.try_get("registered_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
        let completed_at: Option<DateTime<Utc>> = row.try_get("completed_at")?;

        Ok(Operation {
            correlation_key: row.try_get("correlation_key")?,
            kind: row.try_get("kind")?,
            owner: ExecutionRef::new(owner),
            status,
            extra,
            resolved_by,
            registered_at,
            updated_at,
            completed_at,
        })
    }
}

#[async_trait]
impl OperationRegistry for PgOperationRegistry {
    async fn register(&self, new_operation: NewOperation) -> TrackerResult<Operation> {
        // Insert, or take over a row whose previous operation already finished
        let sql = format!(
            r#"
            INSERT INTO tracked_operations (correlation_key, kind, owner_ref, status)
            VALUES ($1, $2, $3, 'pending')
            ON CONFLICT (correlation_key) DO UPDATE
               SET kind = EXCLUDED.kind,
                   owner_ref = EXCLUDED.owner_ref,
                   status = 'pending',
                   extra = NULL,
                   resolved_by = NULL,
                   registered_at = now(),
                   updated_at = now(),
                   completed_at = NULL
             WHERE tracked_operations.status IN ('succeeded', 'failed', 'stopped')
            RETURNING {OPERATION_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(&new_operation.correlation_key)
            .bind(&new_operation.kind)
            .bind(new_operation.owner.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::operation_from_row(&row),
            None => Err(TrackerError::DuplicateCorrelationKey(
                new_operation.correlation_key,
            )),
        }
    }

    async fn find_by_correlation_key(
        &self,
        correlation_key: &str,
    ) -> TrackerResult<Option<Operation>> {
        let sql = format!(
            "SELECT {OPERATION_COLUMNS} FROM tracked_operations WHERE correlation_key = $1"
        );

        sqlx::query(&sql)
            .bind(correlation_key)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::operation_from_row)
            .transpose()
    }

    async fn try_apply_terminal(
        &self,
        correlation_key: &str,
        transition: &TerminalTransition,
    ) -> TrackerResult<bool> {
        let status = OperationStatus::from(transition.status);
        let extra = serde_json::to_value(transition.extra())?;

        let updated = sqlx::query(
            r#"
            UPDATE tracked_operations
               SET status = $2,
                   extra = $3,
                   resolved_by = $4,
                   updated_at = now(),
                   completed_at = now()
             WHERE correlation_key = $1
               AND status IN ('pending', 'in_progress')
            RETURNING correlation_key
            "#,
        )
        .bind(correlation_key)
        .bind(status.as_str())
        .bind(extra)
        .bind(transition.resolved_by.as_str())
        .fetch_optional(&self.pool)
        .await?;

        debug!(
            correlation_key = %correlation_key,
            status = %status,
            applied = updated.is_some(),
            "💾 Terminal transition attempted"
        );

        Ok(updated.is_some())
    }

    async fn mark_in_progress(&self, correlation_key: &str) -> TrackerResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tracked_operations
               SET status = 'in_progress', updated_at = now()
             WHERE correlation_key = $1 AND status = 'pending'
            "#,
        )
        .bind(correlation_key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, correlation_key: &str) -> TrackerResult<Option<Operation>> {
        let sql = format!(
            "DELETE FROM tracked_operations WHERE correlation_key = $1 RETURNING {OPERATION_COLUMNS}"
        );

        sqlx::query(&sql)
            .bind(correlation_key)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::operation_from_row)
            .transpose()
    }
}
