//! Keeping the stored work status in step with plannings and reports.
//!
//! The status row of a work item is derived from its rows with
//! [`derive_status`]. A new status is only written when the lifecycle allows
//! it to follow the stored one; see [`validate_progress`].

use crate::error::CoreError;
use crate::identity::Actor;
use crate::lifecycle::{
    derive_status, validate_progress, CompletionStatus, LifecycleStatus, PlanningStatus,
};
use crate::store::{WorkKey, WorkStore};

/// Rows about to be written that a status projection should include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingRows {
    pub planning: Option<PlanningStatus>,
    pub report: Option<CompletionStatus>,
}

impl PendingRows {
    pub fn planning(status: PlanningStatus) -> Self {
        Self {
            planning: Some(status),
            report: None,
        }
    }

    pub fn report(completion: CompletionStatus) -> Self {
        Self {
            planning: None,
            report: Some(completion),
        }
    }
}

/// Status `key` would take once `pending` is written.
///
/// Fails with [`CoreError::Conflict`] when the stored status cannot move
/// there, so callers can refuse a write before making it.
pub async fn project_status<S: WorkStore + ?Sized>(
    store: &S,
    key: &WorkKey,
    pending: PendingRows,
) -> Result<LifecycleStatus, CoreError> {
    let mut plans = store.planning_statuses(key).await?;
    plans.extend(pending.planning);
    let mut reports = store.report_completions(key).await?;
    reports.extend(pending.report);

    let next = derive_status(&plans, &reports);
    let current = store.current_status(key).await?;
    validate_progress(current, next).map_err(CoreError::Conflict)?;
    Ok(next)
}

/// Recompute the status of `key` from its rows and store it.
///
/// Leaves the row untouched when the status is unchanged.
pub async fn refresh_status<S: WorkStore + ?Sized>(
    store: &S,
    key: &WorkKey,
    actor: &Actor,
) -> Result<LifecycleStatus, CoreError> {
    let plans = store.planning_statuses(key).await?;
    let reports = store.report_completions(key).await?;
    let next = derive_status(&plans, &reports);

    let current = store.current_status(key).await?;
    if current == Some(next) {
        return Ok(next);
    }
    validate_progress(current, next).map_err(CoreError::Conflict)?;
    store.set_status(key, next, actor).await?;

    tracing::debug!(
        stage_id = key.stage_id,
        work_order_id = key.work_order_id,
        work_code = %key.work_code,
        from = ?current,
        to = %next,
        "Work status refreshed"
    );
    Ok(next)
}
