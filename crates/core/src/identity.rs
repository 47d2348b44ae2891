//! Operator identity attached to every mutation.
//!
//! An [`Actor`] can only be built from a non-empty identifier, so holding one
//! proves an authenticated context exists. Mutating operations take `&Actor`
//! and therefore cannot start without it.

use chrono::Utc;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;

/// The operator performing an action and the instant it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    id: String,
    at: Timestamp,
}

impl Actor {
    /// Resolve an actor stamped with the current time.
    ///
    /// Fails with [`CoreError::Unauthorized`] when `id` is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        Self::at(id, Utc::now())
    }

    /// Resolve an actor with an explicit timestamp.
    pub fn at(id: impl Into<String>, at: Timestamp) -> Result<Self, CoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::Unauthorized(
                "No authenticated operator available".into(),
            ));
        }
        Ok(Self { id, at })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn at_time(&self) -> Timestamp {
        self.at
    }
}
