//! Repository for the `work_plannings` table.

use chrono::NaiveDateTime;
use sqlx::PgPool;
use shopfloor_core::booking::Assignment;
use shopfloor_core::identity::Actor;
use shopfloor_core::lifecycle::PlanningStatus;
use shopfloor_core::store::WorkKey;
use shopfloor_core::types::DbId;

use crate::models::planning::{
    AssignmentRow, CreatePlanning, PlannedWork, PlanningKeyRow, WorkPlanning,
};
use crate::models::work_status::code_column;

/// Column list shared across queries.
const COLUMNS: &str = "id, stage_id, work_order_id, work_order_detail_id, derived_code, \
    other_code, standard_code, standard_work_name, other_description, type_description, \
    work_order_number, production_work_order_number, skill_code, worker_ids, from_time, \
    to_time, status, record_state, notes, cancellation_reason, created_by, updated_by, \
    created_at, updated_at";

/// Same columns qualified with the `p` alias, for joins.
const P_COLUMNS: &str = "p.id, p.stage_id, p.work_order_id, p.work_order_detail_id, \
    p.derived_code, p.other_code, p.standard_code, p.standard_work_name, \
    p.other_description, p.type_description, p.work_order_number, \
    p.production_work_order_number, p.skill_code, p.worker_ids, p.from_time, p.to_time, \
    p.status, p.record_state, p.notes, p.cancellation_reason, p.created_by, p.updated_by, \
    p.created_at, p.updated_at";

/// Provides data access for work plannings.
pub struct PlanningRepo;

impl PlanningRepo {
    /// Insert a new planning, returning the created row.
    ///
    /// The caller validates the payload and checks for double-booking first.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePlanning,
        actor: &Actor,
    ) -> Result<WorkPlanning, sqlx::Error> {
        let query = format!(
            "INSERT INTO work_plannings (stage_id, work_order_id, work_order_detail_id, \
                derived_code, other_code, standard_code, standard_work_name, \
                other_description, type_description, work_order_number, \
                production_work_order_number, skill_code, worker_ids, from_time, to_time, \
                status, notes, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                $16, $17, $18, $19, $19) \
             RETURNING {COLUMNS}"
        );
        let status = input.status.unwrap_or(PlanningStatus::Draft);
        sqlx::query_as::<_, WorkPlanning>(&query)
            .bind(input.stage_id)
            .bind(input.work_order_id)
            .bind(input.work_order_detail_id)
            .bind(&input.derived_code)
            .bind(&input.other_code)
            .bind(&input.standard_code)
            .bind(&input.standard_work_name)
            .bind(&input.other_description)
            .bind(&input.type_description)
            .bind(&input.work_order_number)
            .bind(&input.production_work_order_number)
            .bind(input.skill_code.trim())
            .bind(&input.worker_ids)
            .bind(input.from_time)
            .bind(input.to_time)
            .bind(status.as_str())
            .bind(&input.notes)
            .bind(actor.id())
            .bind(actor.at_time())
            .fetch_one(pool)
            .await
    }

    /// Find an active planning by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WorkPlanning>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_plannings WHERE id = $1 AND record_state = 'active'"
        );
        sqlx::query_as::<_, WorkPlanning>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active plannings of a stage, each with the current status of its work item.
    pub async fn list_planned_works(
        pool: &PgPool,
        stage_id: DbId,
    ) -> Result<Vec<PlannedWork>, sqlx::Error> {
        let query = format!(
            "SELECT {P_COLUMNS}, ws.current_status \
             FROM work_plannings p \
             LEFT JOIN work_statuses ws \
                ON ws.stage_id = p.stage_id \
               AND ws.work_order_id = p.work_order_id \
               AND ws.code_kind = CASE WHEN p.other_code IS NOT NULL \
                                       THEN 'other' ELSE 'standard' END \
               AND ws.work_code = COALESCE(p.other_code, p.derived_code) \
             WHERE p.stage_id = $1 AND p.record_state = 'active' \
             ORDER BY p.work_order_id, p.id"
        );
        sqlx::query_as::<_, PlannedWork>(&query)
            .bind(stage_id)
            .fetch_all(pool)
            .await
    }

    /// Ids of active plannings for a work item.
    pub async fn active_ids_for_key(pool: &PgPool, key: &WorkKey) -> Result<Vec<DbId>, sqlx::Error> {
        let column = code_column(&key.work_code);
        let query = format!(
            "SELECT id FROM work_plannings \
             WHERE stage_id = $1 AND work_order_id = $2 AND {column} = $3 \
               AND record_state = 'active' \
             ORDER BY id"
        );
        sqlx::query_scalar::<_, DbId>(&query)
            .bind(key.stage_id)
            .bind(key.work_order_id)
            .bind(key.work_code.as_str())
            .fetch_all(pool)
            .await
    }

    /// Statuses of the plannings that count towards a work item: the active
    /// ones plus the cancelled ones, which are soft-deleted.
    pub async fn statuses_for_key(
        pool: &PgPool,
        key: &WorkKey,
    ) -> Result<Vec<PlanningStatus>, sqlx::Error> {
        let column = code_column(&key.work_code);
        let query = format!(
            "SELECT status FROM work_plannings \
             WHERE stage_id = $1 AND work_order_id = $2 AND {column} = $3 \
               AND (record_state = 'active' OR status = 'cancelled') \
             ORDER BY id"
        );
        let raw = sqlx::query_scalar::<_, String>(&query)
            .bind(key.stage_id)
            .bind(key.work_order_id)
            .bind(key.work_code.as_str())
            .fetch_all(pool)
            .await?;
        Ok(raw.iter().filter_map(|s| s.parse().ok()).collect())
    }

    /// Assignments of the given workers on active, non-cancelled plannings
    /// overlapping `[from, to)`.
    pub async fn overlapping_assignments(
        pool: &PgPool,
        worker_ids: &[DbId],
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Assignment>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            "SELECT p.id AS planning_id, w.worker_id, p.from_time, p.to_time \
             FROM work_plannings p \
             CROSS JOIN LATERAL unnest(p.worker_ids) AS w(worker_id) \
             WHERE p.record_state = 'active' \
               AND p.status <> 'cancelled' \
               AND w.worker_id = ANY($1) \
               AND p.from_time < $3 AND $2 < p.to_time \
             ORDER BY p.id, w.worker_id",
        )
        .bind(worker_ids)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    /// Soft-delete the given plannings. Returns the number of rows changed.
    pub async fn soft_delete_many(
        pool: &PgPool,
        ids: &[DbId],
        actor: &Actor,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE work_plannings \
             SET record_state = 'deleted', updated_by = $2, updated_at = $3 \
             WHERE id = ANY($1) AND record_state = 'active'",
        )
        .bind(ids)
        .bind(actor.id())
        .bind(actor.at_time())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Cancel and soft-delete the approved, active plannings among `ids`.
    /// Others are left as they are.
    ///
    /// Returns the work key of each cancelled row, so the caller can refresh
    /// the affected statuses.
    pub async fn cancel_approved(
        pool: &PgPool,
        ids: &[DbId],
        reason: &str,
        actor: &Actor,
    ) -> Result<Vec<WorkKey>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PlanningKeyRow>(
            "UPDATE work_plannings \
             SET status = 'cancelled', record_state = 'deleted', cancellation_reason = $2, \
                 updated_by = $3, updated_at = $4 \
             WHERE id = ANY($1) AND status = 'approved' AND record_state = 'active' \
             RETURNING stage_id, work_order_id, derived_code, other_code",
        )
        .bind(ids)
        .bind(reason)
        .bind(actor.id())
        .bind(actor.at_time())
        .fetch_all(pool)
        .await?;
        Ok(rows.iter().filter_map(PlanningKeyRow::key).collect())
    }
}
