//! Record store capabilities needed by the work-change sequences.
//!
//! The `db` crate implements this against PostgreSQL. Each method is a single
//! independent write or read; there is no transaction spanning several calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::Actor;
use crate::lifecycle::{CompletionStatus, LifecycleStatus, PlanningStatus};
use crate::types::DbId;
use crate::work_changes::{ValidatedAddition, ValidatedRemoval};
use crate::work_code::WorkCode;

/// Identity of a work status row: one per (stage, work order, work code).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkKey {
    pub stage_id: DbId,
    pub work_order_id: DbId,
    pub work_code: WorkCode,
}

#[async_trait]
pub trait WorkStore: Send + Sync {
    /// Append an addition record, returning its id.
    async fn insert_addition(
        &self,
        addition: &ValidatedAddition,
        actor: &Actor,
    ) -> Result<DbId, CoreError>;

    /// Create the status row for `key` with `initial` unless one exists.
    ///
    /// Must be a single atomic conditional insert. Returns `true` when a row
    /// was created.
    async fn ensure_status(
        &self,
        key: &WorkKey,
        initial: LifecycleStatus,
        actor: &Actor,
    ) -> Result<bool, CoreError>;

    /// Stored status of `key`, if a status row exists.
    async fn current_status(&self, key: &WorkKey) -> Result<Option<LifecycleStatus>, CoreError>;

    /// Statuses of the plannings that count towards `key`: every active
    /// planning plus every cancelled one, even though cancelled rows are
    /// soft-deleted.
    async fn planning_statuses(&self, key: &WorkKey) -> Result<Vec<PlanningStatus>, CoreError>;

    /// Completion flags of every report on `key`.
    async fn report_completions(&self, key: &WorkKey) -> Result<Vec<CompletionStatus>, CoreError>;

    /// Set the status row for `key`, creating it if needed.
    async fn set_status(
        &self,
        key: &WorkKey,
        status: LifecycleStatus,
        actor: &Actor,
    ) -> Result<(), CoreError>;

    /// Append an immutable removal audit record, returning its id.
    async fn insert_removal(
        &self,
        removal: &ValidatedRemoval,
        actor: &Actor,
    ) -> Result<DbId, CoreError>;

    /// Ids of active (not soft-deleted) planning rows for `key`.
    async fn active_planning_ids(&self, key: &WorkKey) -> Result<Vec<DbId>, CoreError>;

    /// Whether any report on the given plannings is marked not completed.
    async fn has_non_completed_report(&self, planning_ids: &[DbId]) -> Result<bool, CoreError>;

    /// Soft-delete the given plannings. Returns the number of rows changed.
    async fn soft_delete_plannings(
        &self,
        planning_ids: &[DbId],
        actor: &Actor,
    ) -> Result<u64, CoreError>;

    /// Cancel and soft-delete the given plannings that are approved and
    /// active, storing the reason. Rows failing that precondition are left
    /// untouched. Returns the work key of every cancelled row.
    async fn cancel_approved_plannings(
        &self,
        planning_ids: &[DbId],
        reason: &str,
        actor: &Actor,
    ) -> Result<Vec<WorkKey>, CoreError>;
}
