//! Route definitions for reports.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::reporting;
use crate::state::AppState;

/// Routes nested under `/stages/{stage_id}`.
pub fn stage_router() -> Router<AppState> {
    Router::new().route("/reports", get(reporting::list_reports))
}

/// Routes mounted at `/reports`.
///
/// ```text
/// POST   /            -> create
/// POST   /validate    -> validate_form
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(reporting::create))
        .route("/validate", post(reporting::validate_form))
}
