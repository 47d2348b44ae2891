//! Addition and removal audit records. Both tables are append-only.

use serde::Serialize;
use sqlx::FromRow;
use shopfloor_core::types::{DbId, Timestamp};

/// A row from the `work_additions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkAdditionRecord {
    pub id: DbId,
    pub stage_id: DbId,
    pub work_order_id: DbId,
    pub work_order_detail_id: Option<DbId>,
    pub derived_code: Option<String>,
    pub other_code: Option<String>,
    pub other_description: Option<String>,
    pub skill_code: Option<String>,
    pub estimated_minutes: Option<i64>,
    pub addition_reason: String,
    pub created_by: String,
    pub created_at: Timestamp,
}

/// A row from the `work_removals` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkRemovalRecord {
    pub id: DbId,
    pub stage_id: DbId,
    pub work_order_id: DbId,
    pub work_order_detail_id: DbId,
    pub derived_code: Option<String>,
    pub other_code: Option<String>,
    pub removal_reason: String,
    pub created_by: String,
    pub created_at: Timestamp,
}
