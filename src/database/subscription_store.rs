use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::TrackerResult;
use crate::models::{SubscriptionKey, SubscriptionRecord};
use crate::registry::SubscriptionStore;

/// Subscription records persisted in `node_subscriptions`
#[derive(Debug, Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn record_from_row(row: &PgRow) -> TrackerResult<SubscriptionRecord> {
        Ok(SubscriptionRecord {
            region: row.try_get("region")?,
            event_source: row.try_get("event_source")?,
            detail_type: row.try_get("detail_type")?,
            subscription_id: row.try_get("subscription_id")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn load(&self, key: &SubscriptionKey) -> TrackerResult<Option<SubscriptionRecord>> {
        sqlx::query(
            r#"
            SELECT region, event_source, detail_type, subscription_id, updated_at
              FROM node_subscriptions
             WHERE node_id = $1 AND detail_type = $2
            "#,
        )
        .bind(&key.node_id)
        .bind(&key.detail_type)
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(Self::record_from_row)
        .transpose()
    }

    async fn store(&self, key: &SubscriptionKey, record: SubscriptionRecord) -> TrackerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO node_subscriptions
                (node_id, detail_type, region, event_source, subscription_id, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (node_id, detail_type) DO UPDATE
               SET region = EXCLUDED.region,
                   event_source = EXCLUDED.event_source,
                   subscription_id = EXCLUDED.subscription_id,
                   updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&key.node_id)
        .bind(&key.detail_type)
        .bind(&record.region)
        .bind(&record.event_source)
        .bind(&record.subscription_id)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self, key: &SubscriptionKey) -> TrackerResult<Option<SubscriptionRecord>> {
        sqlx::query(
            r#"
            DELETE FROM node_subscriptions
             WHERE node_id = $1 AND detail_type = $2
            RETURNING region, event_source, detail_type, subscription_id, updated_at
            "#,
        )
        .bind(&key.node_id)
        .bind(&key.detail_type)
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(Self::record_from_row)
        .transpose()
    }
}
