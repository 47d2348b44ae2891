use axum::routing::{get, post};
use axum::Router;

use crate::handlers::allocation;
use crate::state::AppState;

/// Routes mounted at `/allocation-pattern`.
///
/// ```text
/// GET    /?rate=      -> get_pattern
/// POST   /validate    -> validate
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(allocation::get_pattern))
        .route("/validate", post(allocation::validate))
}
