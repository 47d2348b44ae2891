//! Repository for `work_reports` and its child tables.

use chrono::NaiveDateTime;
use sqlx::types::Json;
use sqlx::PgPool;
use shopfloor_core::deviation::DeviationType;
use shopfloor_core::identity::Actor;
use shopfloor_core::lifecycle::CompletionStatus;
use shopfloor_core::lost_time::chunks_to_save;
use shopfloor_core::store::WorkKey;
use shopfloor_core::types::DbId;

use crate::models::report::{
    CreateReport, LostTimeChunkRow, ReportedWork, WorkReport, WorkReportDeviation,
};
use crate::models::work_status::code_column;

const COLUMNS: &str = "id, planning_id, stage_id, work_order_id, derived_code, other_code, \
    worker_id, from_time, to_time, completion_status, lt_minutes_total, created_by, created_at";

const R_COLUMNS: &str = "r.id, r.planning_id, r.stage_id, r.work_order_id, r.derived_code, \
    r.other_code, r.worker_id, r.from_time, r.to_time, r.completion_status, \
    r.lt_minutes_total, r.created_by, r.created_at";

const CHUNK_COLUMNS: &str =
    "id, report_id, minutes, reason_id, is_payable, cost, worker_costs, created_at";

const DEVIATION_COLUMNS: &str =
    "id, report_id, planning_id, deviation_type, justification, created_by, created_at";

/// Provides data access for work reports.
pub struct ReportRepo;

impl ReportRepo {
    /// Insert a report with its lost-time chunks and deviations in one
    /// transaction.
    ///
    /// The form must already have passed `validate_save`, so every chunk
    /// carries a reason. Chunks are only written when the form reports lost
    /// time.
    pub async fn create(
        pool: &PgPool,
        input: &CreateReport,
        window: (NaiveDateTime, NaiveDateTime),
        deviations: &[(DeviationType, String)],
        actor: &Actor,
    ) -> Result<WorkReport, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO work_reports (planning_id, stage_id, work_order_id, derived_code, \
                other_code, worker_id, from_time, to_time, completion_status, \
                lt_minutes_total, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        let report = sqlx::query_as::<_, WorkReport>(&query)
            .bind(input.planning_id)
            .bind(input.stage_id)
            .bind(input.work_order_id)
            .bind(&input.derived_code)
            .bind(&input.other_code)
            .bind(input.form.worker_id)
            .bind(window.0)
            .bind(window.1)
            .bind(input.completion_status.as_str())
            .bind(input.form.total_lost_time_minutes)
            .bind(actor.id())
            .bind(actor.at_time())
            .fetch_one(&mut *tx)
            .await?;

        for chunk in chunks_to_save(&input.form) {
            sqlx::query(
                "INSERT INTO lost_time_chunks \
                    (report_id, minutes, reason_id, is_payable, cost, worker_costs, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(report.id)
            .bind(chunk.minutes)
            .bind(chunk.reason_id)
            .bind(chunk.is_payable)
            .bind(chunk.cost)
            .bind(Json(&chunk.worker_costs))
            .bind(actor.at_time())
            .execute(&mut *tx)
            .await?;
        }

        for (kind, justification) in deviations {
            sqlx::query(
                "INSERT INTO work_report_deviations \
                    (report_id, planning_id, deviation_type, justification, created_by, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(report.id)
            .bind(input.planning_id)
            .bind(kind.as_str())
            .bind(justification.trim())
            .bind(actor.id())
            .bind(actor.at_time())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(report)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WorkReport>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_reports WHERE id = $1");
        sqlx::query_as::<_, WorkReport>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Reports of a stage joined with the display fields of their planning.
    pub async fn list_reported_works(
        pool: &PgPool,
        stage_id: DbId,
    ) -> Result<Vec<ReportedWork>, sqlx::Error> {
        let query = format!(
            "SELECT {R_COLUMNS}, p.standard_work_name, p.other_description, \
                p.type_description, p.work_order_number, p.production_work_order_number \
             FROM work_reports r \
             LEFT JOIN work_plannings p ON p.id = r.planning_id \
             WHERE r.stage_id = $1 \
             ORDER BY r.work_order_id, r.id"
        );
        sqlx::query_as::<_, ReportedWork>(&query)
            .bind(stage_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_chunks(
        pool: &PgPool,
        report_id: DbId,
    ) -> Result<Vec<LostTimeChunkRow>, sqlx::Error> {
        let query = format!(
            "SELECT {CHUNK_COLUMNS} FROM lost_time_chunks WHERE report_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, LostTimeChunkRow>(&query)
            .bind(report_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_deviations(
        pool: &PgPool,
        report_id: DbId,
    ) -> Result<Vec<WorkReportDeviation>, sqlx::Error> {
        let query = format!(
            "SELECT {DEVIATION_COLUMNS} FROM work_report_deviations \
             WHERE report_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, WorkReportDeviation>(&query)
            .bind(report_id)
            .fetch_all(pool)
            .await
    }

    /// Whether any report on the given plannings is marked not completed.
    pub async fn has_non_completed(pool: &PgPool, planning_ids: &[DbId]) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                SELECT 1 FROM work_reports \
                WHERE planning_id = ANY($1) AND completion_status = 'NC' \
             )",
        )
        .bind(planning_ids)
        .fetch_one(pool)
        .await
    }

    /// Completion flags of every report on a work item.
    pub async fn completions_for_key(
        pool: &PgPool,
        key: &WorkKey,
    ) -> Result<Vec<CompletionStatus>, sqlx::Error> {
        let column = code_column(&key.work_code);
        let query = format!(
            "SELECT completion_status FROM work_reports \
             WHERE stage_id = $1 AND work_order_id = $2 AND {column} = $3"
        );
        let raw = sqlx::query_scalar::<_, String>(&query)
            .bind(key.stage_id)
            .bind(key.work_order_id)
            .bind(key.work_code.as_str())
            .fetch_all(pool)
            .await?;
        Ok(raw.iter().filter_map(|s| s.parse().ok()).collect())
    }
}
