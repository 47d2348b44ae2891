//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shopfloor_core::error::CoreError;
use shopfloor_core::identity::Actor;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Operator extracted from a JWT Bearer token in the `Authorization` header.
///
/// Mutating handlers take this extractor and call [`AuthUser::actor`] to get
/// the identity stamped on their writes.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Operator identifier (from `claims.sub`).
    pub operator_id: String,
}

impl AuthUser {
    /// Resolve the acting operator, stamped with the current time.
    pub fn actor(&self) -> Result<Actor, AppError> {
        Ok(Actor::new(self.operator_id.clone())?)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            operator_id: claims.sub,
        })
    }
}
