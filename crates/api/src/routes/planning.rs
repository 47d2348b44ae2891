//! Route definitions for plannings.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::planning;
use crate::state::AppState;

/// Routes nested under `/stages/{stage_id}`.
///
/// ```text
/// GET    /planned-works                          -> list_planned_works
/// GET    /planned-works/{work_code}/reported     -> work_reported
/// POST   /planned-works/selection-check          -> selection_check
/// ```
pub fn stage_router() -> Router<AppState> {
    Router::new()
        .route("/planned-works", get(planning::list_planned_works))
        .route(
            "/planned-works/{work_code}/reported",
            get(planning::work_reported),
        )
        .route(
            "/planned-works/selection-check",
            post(planning::selection_check),
        )
}

/// Routes mounted at `/plannings`.
///
/// ```text
/// POST   /          -> create
/// POST   /cancel    -> cancel
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(planning::create))
        .route("/cancel", post(planning::cancel))
}
