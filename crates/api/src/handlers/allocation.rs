//! Handlers for the allocation pattern calculator.

use axum::extract::Query;
use axum::Json;
use serde::{Deserialize, Serialize};
use shopfloor_core::error::CoreError;
use shopfloor_core::pattern::{
    calculate_pattern, check_rate, validate_pattern, AllocationPattern,
};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;

#[derive(Debug, Deserialize)]
pub struct RateQuery {
    pub rate: f64,
}

#[derive(Debug, Serialize)]
pub struct PatternValidity {
    pub is_valid: bool,
    pub total: i64,
}

/// GET /api/v1/allocation-pattern?rate=
///
/// Rates above the supported maximum are rejected with 400.
pub async fn get_pattern(
    _user: AuthUser,
    Query(query): Query<RateQuery>,
) -> AppResult<Json<DataResponse<AllocationPattern>>> {
    check_rate(query.rate).map_err(CoreError::Validation)?;
    Ok(Json(DataResponse {
        data: calculate_pattern(query.rate),
    }))
}

/// POST /api/v1/allocation-pattern/validate
pub async fn validate(
    _user: AuthUser,
    Json(input): Json<AllocationPattern>,
) -> AppResult<Json<DataResponse<PatternValidity>>> {
    validate_pattern(&input).map_err(CoreError::Validation)?;
    Ok(Json(DataResponse {
        data: PatternValidity {
            is_valid: true,
            total: input.total(),
        },
    }))
}
