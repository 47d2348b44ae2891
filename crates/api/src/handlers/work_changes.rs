//! Handlers for adding and removing work on a stage.

use axum::extract::State;
use axum::Json;
use shopfloor_core::work_changes::{
    add_work, remove_work, AdditionRequest, ChangeReport, RemovalRequest,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Turn a sequence outcome into a response.
///
/// A failed primary step is an error whose body still lists the steps; a
/// change whose secondary steps failed is returned with 200 and its step
/// list shows what did not apply.
pub(crate) fn change_response(report: ChangeReport) -> AppResult<Json<DataResponse<ChangeReport>>> {
    if !report.success {
        return Err(AppError::ChangeFailed(Box::new(report)));
    }
    if report.is_partial() {
        tracing::warn!(
            failure = report.first_failure().unwrap_or_default(),
            "Work change partially applied"
        );
    }
    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/work-additions
pub async fn create_addition(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<AdditionRequest>,
) -> AppResult<Json<DataResponse<ChangeReport>>> {
    let actor = user.actor()?;
    let report = add_work(&state.store, &input, &actor).await?;
    change_response(report)
}

/// POST /api/v1/work-removals
pub async fn create_removal(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<RemovalRequest>,
) -> AppResult<Json<DataResponse<ChangeReport>>> {
    let actor = user.actor()?;
    let report = remove_work(&state.store, &input, &actor).await?;
    change_response(report)
}
