//! Current lifecycle status per work item.

use serde::Serialize;
use sqlx::FromRow;
use shopfloor_core::lifecycle::LifecycleStatus;
use shopfloor_core::types::{DbId, Timestamp};
use shopfloor_core::work_code::WorkCode;

/// Value of `code_kind` for standard catalog codes.
pub const KIND_STANDARD: &str = "standard";
/// Value of `code_kind` for non-standard codes.
pub const KIND_OTHER: &str = "other";

/// A row from the `work_statuses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkStatusRow {
    pub id: DbId,
    pub stage_id: DbId,
    pub work_order_id: DbId,
    pub code_kind: String,
    pub work_code: String,
    pub current_status: String,
    pub updated_by: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkStatusRow {
    /// Parsed status. `None` only if the column holds a value the CHECK
    /// constraint would have rejected.
    pub fn status(&self) -> Option<LifecycleStatus> {
        self.current_status.parse().ok()
    }
}

pub fn code_kind(code: &WorkCode) -> &'static str {
    match code {
        WorkCode::Standard(_) => KIND_STANDARD,
        WorkCode::Other(_) => KIND_OTHER,
    }
}

/// Split a code into its `(derived_code, other_code)` column values.
pub fn code_columns(code: &WorkCode) -> (Option<&str>, Option<&str>) {
    match code {
        WorkCode::Standard(c) => (Some(c.as_str()), None),
        WorkCode::Other(c) => (None, Some(c.as_str())),
    }
}

/// Column on plannings/reports that carries this kind of code.
pub fn code_column(code: &WorkCode) -> &'static str {
    match code {
        WorkCode::Standard(_) => "derived_code",
        WorkCode::Other(_) => "other_code",
    }
}
