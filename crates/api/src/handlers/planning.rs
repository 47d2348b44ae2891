//! Handlers for planned work on a stage.

use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use shopfloor_core::booking::find_conflicts;
use shopfloor_core::error::CoreError;
use shopfloor_core::grouping::{
    are_all_skills_reported, group_works, has_reported_skills_selected, WorkGroup,
};
use shopfloor_core::lifecycle::{LifecycleStatus, PlanningStatus};
use shopfloor_core::status_sync::{project_status, refresh_status, PendingRows};
use shopfloor_core::store::WorkKey;
use shopfloor_core::types::DbId;
use shopfloor_core::work_changes::{cancel_plannings, CancellationRequest, ChangeReport};
use shopfloor_db::models::planning::{CreatePlanning, PlannedWork, WorkPlanning};
use shopfloor_db::repositories::PlanningRepo;

use crate::error::AppResult;
use crate::handlers::work_changes::change_response;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReportedCheck {
    pub work_code: String,
    pub all_reported: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectionCheckRequest {
    pub selected_ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct SelectionCheck {
    pub has_reported_selected: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatedPlanning {
    pub planning: WorkPlanning,
    pub lifecycle_status: LifecycleStatus,
}

/// GET /api/v1/stages/{stage_id}/planned-works
pub async fn list_planned_works(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(stage_id): Path<DbId>,
) -> AppResult<Json<DataResponse<IndexMap<String, WorkGroup<PlannedWork>>>>> {
    let works = PlanningRepo::list_planned_works(&state.pool, stage_id).await?;
    Ok(Json(DataResponse {
        data: group_works(works),
    }))
}

/// GET /api/v1/stages/{stage_id}/planned-works/{work_code}/reported
pub async fn work_reported(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((stage_id, work_code)): Path<(DbId, String)>,
) -> AppResult<Json<DataResponse<ReportedCheck>>> {
    let works = PlanningRepo::list_planned_works(&state.pool, stage_id).await?;
    let all_reported = are_all_skills_reported(&work_code, &works);
    Ok(Json(DataResponse {
        data: ReportedCheck {
            work_code,
            all_reported,
        },
    }))
}

/// POST /api/v1/stages/{stage_id}/planned-works/selection-check
pub async fn selection_check(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(stage_id): Path<DbId>,
    Json(input): Json<SelectionCheckRequest>,
) -> AppResult<Json<DataResponse<SelectionCheck>>> {
    let works = PlanningRepo::list_planned_works(&state.pool, stage_id).await?;
    let selected: HashSet<DbId> = input.selected_ids.into_iter().collect();
    Ok(Json(DataResponse {
        data: SelectionCheck {
            has_reported_selected: has_reported_skills_selected(&selected, &works),
        },
    }))
}

/// POST /api/v1/plannings
///
/// Rejects the planning with 409 if any of its workers is already booked in
/// an overlapping window, or if the work item's status could not move to
/// the one the new planning implies.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreatePlanning>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedPlanning>>)> {
    let work_code = input.validate().map_err(CoreError::Validation)?;
    let actor = user.actor()?;

    let proposed = input.proposed_assignments();
    if !proposed.is_empty() {
        let workers: Vec<DbId> = proposed.iter().map(|a| a.worker_id).collect();
        let existing = PlanningRepo::overlapping_assignments(
            &state.pool,
            &workers,
            input.from_time,
            input.to_time,
        )
        .await?;
        if let Some(conflict) = find_conflicts(&proposed, &existing).first() {
            return Err(CoreError::Conflict(conflict.describe()).into());
        }
    }

    let key = WorkKey {
        stage_id: input.stage_id,
        work_order_id: input.work_order_id,
        work_code,
    };
    let pending = PendingRows::planning(input.status.unwrap_or(PlanningStatus::Draft));
    project_status(&state.store, &key, pending).await?;

    let planning = PlanningRepo::create(&state.pool, &input, &actor).await?;
    let lifecycle_status = refresh_status(&state.store, &key, &actor).await?;

    tracing::info!(
        actor = actor.id(),
        planning_id = planning.id,
        work_code = %key.work_code,
        status = %lifecycle_status,
        "Planning created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedPlanning {
                planning,
                lifecycle_status,
            },
        }),
    ))
}

/// POST /api/v1/plannings/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CancellationRequest>,
) -> AppResult<Json<DataResponse<ChangeReport>>> {
    let actor = user.actor()?;
    let report = cancel_plannings(&state.store, &input, &actor).await?;
    change_response(report)
}
