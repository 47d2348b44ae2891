use axum::routing::post;
use axum::Router;

use crate::handlers::work_changes;
use crate::state::AppState;

/// Work addition and removal, merged at the API root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/work-additions", post(work_changes::create_addition))
        .route("/work-removals", post(work_changes::create_removal))
}
