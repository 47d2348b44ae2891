pub mod allocation;
pub mod health;
pub mod planning;
pub mod reporting;
pub mod work_changes;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /stages/{stage_id}/planned-works                          grouped plannings
/// /stages/{stage_id}/planned-works/{work_code}/reported     all skills reported?
/// /stages/{stage_id}/planned-works/selection-check          reported rows selected?
/// /stages/{stage_id}/reports                                grouped reports
///
/// /plannings                                                create (POST)
/// /plannings/cancel                                         bulk cancel (POST)
///
/// /reports                                                  submit (POST)
/// /reports/validate                                         form check (POST)
///
/// /work-additions                                           add work (POST)
/// /work-removals                                            remove work (POST)
///
/// /allocation-pattern                                       calculate (GET ?rate=)
/// /allocation-pattern/validate                              check (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/stages/{stage_id}", planning::stage_router().merge(reporting::stage_router()))
        .nest("/plannings", planning::router())
        .nest("/reports", reporting::router())
        .merge(work_changes::router())
        .nest("/allocation-pattern", allocation::router())
}
