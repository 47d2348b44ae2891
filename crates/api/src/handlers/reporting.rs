//! Handlers for work reports and their lost time.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use indexmap::IndexMap;
use serde::Serialize;
use shopfloor_core::booking::validate_window;
use shopfloor_core::deviation::{detect_deviations, validate_deviations, DeviationType};
use shopfloor_core::error::CoreError;
use shopfloor_core::grouping::{group_works, WorkGroup};
use shopfloor_core::lifecycle::LifecycleStatus;
use shopfloor_core::lost_time::{
    apply_equal_shares, chunks_to_save, validate_save, FormValidation, LostTimeCost, ReportForm,
};
use shopfloor_core::status_sync::{project_status, refresh_status, PendingRows};
use shopfloor_core::store::WorkKey;
use shopfloor_core::types::DbId;
use shopfloor_db::models::report::{CreateReport, ReportedWork, WorkReport};
use shopfloor_db::repositories::{PlanningRepo, ReportRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreatedReport {
    pub report: WorkReport,
    pub deviations: Vec<DeviationType>,
    pub lost_time_cost: LostTimeCost,
    /// `None` if the status could not be refreshed after the report was saved.
    pub lifecycle_status: Option<LifecycleStatus>,
}

/// GET /api/v1/stages/{stage_id}/reports
pub async fn list_reports(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(stage_id): Path<DbId>,
) -> AppResult<Json<DataResponse<IndexMap<String, WorkGroup<ReportedWork>>>>> {
    let reports = ReportRepo::list_reported_works(&state.pool, stage_id).await?;
    Ok(Json(DataResponse {
        data: group_works(reports),
    }))
}

/// POST /api/v1/reports/validate
///
/// Always 200; the body says whether the form may be saved.
pub async fn validate_form(
    _user: AuthUser,
    Json(form): Json<ReportForm>,
) -> AppResult<Json<DataResponse<FormValidation>>> {
    Ok(Json(DataResponse {
        data: validate_save(&form),
    }))
}

/// POST /api/v1/reports
///
/// Chunk costs without a per-worker split are shared equally between the
/// planned workers, or charged to the reporting worker when there is no
/// planning. Rejects the report with 409 if the work item's status could
/// not move to the one it implies.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut input): Json<CreateReport>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedReport>>)> {
    let work_code = input.work_code().map_err(CoreError::Validation)?;

    let validation = validate_save(&input.form);
    if !validation.is_valid {
        let message = validation
            .first_error()
            .unwrap_or("Report form is invalid")
            .to_string();
        return Err(CoreError::Validation(message).into());
    }

    let window = input.window().ok_or_else(|| {
        AppError::BadRequest("Report window is incomplete".to_string())
    })?;
    validate_window(window.0, window.1).map_err(CoreError::Validation)?;

    let detected = input
        .observation
        .as_ref()
        .map(detect_deviations)
        .unwrap_or_default();
    validate_deviations(&detected, &input.justifications).map_err(CoreError::Validation)?;
    let deviations: Vec<(DeviationType, String)> = detected
        .iter()
        .filter_map(|kind| {
            input
                .justifications
                .get(kind)
                .map(|text| (*kind, text.clone()))
        })
        .collect();

    let mut workers: Vec<DbId> = input.form.worker_id.into_iter().collect();
    if let Some(planning_id) = input.planning_id {
        let planning = PlanningRepo::find_by_id(&state.pool, planning_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Planning",
                id: planning_id,
            })?;
        if !planning.worker_ids.is_empty() {
            workers = planning.worker_ids;
        }
    }

    let key = WorkKey {
        stage_id: input.stage_id,
        work_order_id: input.work_order_id,
        work_code,
    };
    project_status(&state.store, &key, PendingRows::report(input.completion_status)).await?;

    apply_equal_shares(&mut input.form.chunks, &workers);
    let lost_time_cost = LostTimeCost::of(chunks_to_save(&input.form));

    let actor = user.actor()?;
    let report = ReportRepo::create(&state.pool, &input, window, &deviations, &actor).await?;

    let lifecycle_status = match refresh_status(&state.store, &key, &actor).await {
        Ok(status) => Some(status),
        Err(err) => {
            tracing::error!(report_id = report.id, error = %err, "Status refresh after report failed");
            None
        }
    };

    tracing::info!(
        actor = actor.id(),
        report_id = report.id,
        work_code = %key.work_code,
        deviations = detected.len(),
        lost_time = report.lt_minutes_total,
        "Report saved"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedReport {
                report,
                deviations: detected,
                lost_time_cost,
                lifecycle_status,
            },
        }),
    ))
}
