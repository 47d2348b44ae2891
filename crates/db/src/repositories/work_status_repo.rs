//! Repository for the `work_statuses` table.

use sqlx::PgPool;
use shopfloor_core::identity::Actor;
use shopfloor_core::lifecycle::LifecycleStatus;
use shopfloor_core::store::WorkKey;

use crate::models::work_status::{code_kind, WorkStatusRow};

const COLUMNS: &str = "id, stage_id, work_order_id, code_kind, work_code, current_status, \
    updated_by, created_at, updated_at";

/// Provides data access for work item statuses.
pub struct WorkStatusRepo;

impl WorkStatusRepo {
    /// Create the status row for `key` unless it already exists.
    ///
    /// A single conditional insert against `uq_work_statuses_key`, so two
    /// concurrent additions of the same work create exactly one row.
    /// Returns `true` when this call created it.
    pub async fn ensure(
        pool: &PgPool,
        key: &WorkKey,
        initial: LifecycleStatus,
        actor: &Actor,
    ) -> Result<bool, sqlx::Error> {
        let created = sqlx::query_scalar::<_, i64>(
            "INSERT INTO work_statuses \
                (stage_id, work_order_id, code_kind, work_code, current_status, updated_by, \
                 created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             ON CONFLICT ON CONSTRAINT uq_work_statuses_key DO NOTHING \
             RETURNING id",
        )
        .bind(key.stage_id)
        .bind(key.work_order_id)
        .bind(code_kind(&key.work_code))
        .bind(key.work_code.as_str())
        .bind(initial.as_str())
        .bind(actor.id())
        .bind(actor.at_time())
        .fetch_optional(pool)
        .await?;
        Ok(created.is_some())
    }

    /// Set the status for `key`, creating the row if needed.
    pub async fn upsert(
        pool: &PgPool,
        key: &WorkKey,
        status: LifecycleStatus,
        actor: &Actor,
    ) -> Result<WorkStatusRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO work_statuses \
                (stage_id, work_order_id, code_kind, work_code, current_status, updated_by, \
                 created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             ON CONFLICT ON CONSTRAINT uq_work_statuses_key \
             DO UPDATE SET current_status = EXCLUDED.current_status, \
                           updated_by = EXCLUDED.updated_by, \
                           updated_at = EXCLUDED.updated_at \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkStatusRow>(&query)
            .bind(key.stage_id)
            .bind(key.work_order_id)
            .bind(code_kind(&key.work_code))
            .bind(key.work_code.as_str())
            .bind(status.as_str())
            .bind(actor.id())
            .bind(actor.at_time())
            .fetch_one(pool)
            .await
    }

    pub async fn find(pool: &PgPool, key: &WorkKey) -> Result<Option<WorkStatusRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_statuses \
             WHERE stage_id = $1 AND work_order_id = $2 AND code_kind = $3 AND work_code = $4"
        );
        sqlx::query_as::<_, WorkStatusRow>(&query)
            .bind(key.stage_id)
            .bind(key.work_order_id)
            .bind(code_kind(&key.work_code))
            .bind(key.work_code.as_str())
            .fetch_optional(pool)
            .await
    }
}
