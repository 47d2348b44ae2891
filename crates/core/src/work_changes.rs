//! Adding, removing and cancelling work on a production stage.
//!
//! Requests are validated first; a validation failure never reaches the
//! store. The store sequences that follow are best-effort: every step is an
//! independent write, failures are logged and recorded in the returned
//! [`ChangeReport`], and only a failure of the primary step marks the whole
//! change as unsuccessful.

use std::collections::BTreeSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::Actor;
use crate::lifecycle::{status_after_removal, LifecycleStatus};
use crate::status_sync::refresh_status;
use crate::store::{WorkKey, WorkStore};
use crate::types::DbId;
use crate::work_code::WorkCode;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Raw addition request as submitted by the planning screen.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdditionRequest {
    pub stage_id: DbId,
    pub work_order_id: DbId,
    pub work_order_detail_id: Option<DbId>,
    pub derived_code: Option<String>,
    pub other_code: Option<String>,
    pub other_description: Option<String>,
    pub skill_code: Option<String>,
    pub estimated_minutes: Option<i64>,
    pub addition_reason: Option<String>,
}

/// A complete addition payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkAddition {
    Standard {
        derived_code: String,
        addition_reason: String,
    },
    NonStandard {
        code: String,
        description: String,
        skill_code: String,
        estimated_minutes: i64,
        addition_reason: String,
    },
}

impl WorkAddition {
    pub fn work_code(&self) -> WorkCode {
        match self {
            Self::Standard { derived_code, .. } => WorkCode::Standard(derived_code.clone()),
            Self::NonStandard { code, .. } => WorkCode::Other(code.clone()),
        }
    }

    pub fn addition_reason(&self) -> &str {
        match self {
            Self::Standard {
                addition_reason, ..
            }
            | Self::NonStandard {
                addition_reason, ..
            } => addition_reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedAddition {
    pub key: WorkKey,
    pub work_order_detail_id: Option<DbId>,
    pub work: WorkAddition,
}

/// Raw removal request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemovalRequest {
    pub stage_id: DbId,
    pub work_order_id: DbId,
    pub work_order_detail_id: Option<DbId>,
    pub derived_code: Option<String>,
    pub other_code: Option<String>,
    pub removal_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedRemoval {
    pub stage_id: DbId,
    pub work_order_id: DbId,
    pub work_order_detail_id: DbId,
    /// `None` when the request named no work code; the status update is then skipped.
    pub work_code: Option<WorkCode>,
    pub removal_reason: String,
}

impl ValidatedRemoval {
    pub fn key(&self) -> Option<WorkKey> {
        self.work_code.clone().map(|work_code| WorkKey {
            stage_id: self.stage_id,
            work_order_id: self.work_order_id,
            work_code,
        })
    }
}

/// Bulk cancellation of approved plannings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancellationRequest {
    pub planning_ids: Vec<DbId>,
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn required(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate an addition request into a complete standard or non-standard payload.
pub fn validate_addition(request: &AdditionRequest) -> Result<ValidatedAddition, CoreError> {
    let derived = required(request.derived_code.as_deref());
    let other = required(request.other_code.as_deref());
    let reason = required(request.addition_reason.as_deref());

    let work = match (derived, other) {
        (Some(_), Some(_)) => {
            return Err(CoreError::Validation(
                "Provide either a standard work code or an other-work code, not both".into(),
            ))
        }
        (Some(derived_code), None) => {
            let addition_reason = reason.ok_or_else(|| {
                CoreError::Validation(
                    "Incomplete standard work payload: addition reason is required".into(),
                )
            })?;
            WorkAddition::Standard {
                derived_code,
                addition_reason,
            }
        }
        (None, Some(code)) => {
            let description = required(request.other_description.as_deref());
            let skill_code = required(request.skill_code.as_deref());
            let estimated_minutes = request.estimated_minutes.filter(|m| *m > 0);

            let mut missing = Vec::new();
            if description.is_none() {
                missing.push("description");
            }
            if skill_code.is_none() {
                missing.push("skill code");
            }
            if estimated_minutes.is_none() {
                missing.push("estimated minutes");
            }
            if reason.is_none() {
                missing.push("addition reason");
            }
            match (description, skill_code, estimated_minutes, reason) {
                (Some(description), Some(skill_code), Some(estimated_minutes), Some(reason)) => {
                    WorkAddition::NonStandard {
                        code,
                        description,
                        skill_code,
                        estimated_minutes,
                        addition_reason: reason,
                    }
                }
                _ => {
                    return Err(CoreError::Validation(format!(
                        "Incomplete non-standard work payload: missing {}",
                        missing.join(", ")
                    )))
                }
            }
        }
        (None, None) => {
            return Err(CoreError::Validation(
                "Either a standard work code or a complete non-standard work payload is required"
                    .into(),
            ))
        }
    };

    Ok(ValidatedAddition {
        key: WorkKey {
            stage_id: request.stage_id,
            work_order_id: request.work_order_id,
            work_code: work.work_code(),
        },
        work_order_detail_id: request.work_order_detail_id,
        work,
    })
}

/// Validate a removal request.
pub fn validate_removal(request: &RemovalRequest) -> Result<ValidatedRemoval, CoreError> {
    let removal_reason = required(request.removal_reason.as_deref())
        .ok_or_else(|| CoreError::Validation("Removal reason is required".into()))?;
    let work_order_detail_id = request.work_order_detail_id.ok_or_else(|| {
        CoreError::Validation("Work order detail reference is required".into())
    })?;
    let work_code = WorkCode::from_parts(
        request.derived_code.as_deref(),
        request.other_code.as_deref(),
    )
    .map_err(CoreError::Validation)?;

    Ok(ValidatedRemoval {
        stage_id: request.stage_id,
        work_order_id: request.work_order_id,
        work_order_detail_id,
        work_code,
        removal_reason,
    })
}

/// Validate a cancellation request, returning the deduplicated ids and reason.
pub fn validate_cancellation(
    request: &CancellationRequest,
) -> Result<(Vec<DbId>, String), CoreError> {
    let reason = required(request.reason.as_deref())
        .ok_or_else(|| CoreError::Validation("Cancellation reason is required".into()))?;
    let ids: BTreeSet<DbId> = request.planning_ids.iter().copied().collect();
    if ids.is_empty() {
        return Err(CoreError::Validation(
            "Select at least one planning to cancel".into(),
        ));
    }
    Ok((ids.into_iter().collect(), reason))
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStep {
    RecordAddition,
    EnsureStatus,
    RecordRemoval,
    FindActivePlannings,
    CheckPartialReports,
    SoftDeletePlannings,
    UpdateStatus,
    CancelPlannings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Done,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: ChangeStep,
    pub outcome: StepOutcome,
    pub detail: Option<String>,
}

/// Result of a work-change sequence, step by step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    /// Whether the primary step succeeded.
    pub success: bool,
    /// Id of the record written by the primary step.
    pub record_id: Option<DbId>,
    /// Status the work item was left in, when one was written.
    pub resulting_status: Option<LifecycleStatus>,
    /// Rows changed by bulk steps.
    pub affected_rows: u64,
    pub steps: Vec<StepRecord>,
}

impl ChangeReport {
    fn new() -> Self {
        Self {
            success: false,
            record_id: None,
            resulting_status: None,
            affected_rows: 0,
            steps: Vec::new(),
        }
    }

    fn done(&mut self, step: ChangeStep, detail: Option<String>) {
        self.steps.push(StepRecord {
            step,
            outcome: StepOutcome::Done,
            detail,
        });
    }

    fn skipped(&mut self, step: ChangeStep, detail: impl Into<String>) {
        self.steps.push(StepRecord {
            step,
            outcome: StepOutcome::Skipped,
            detail: Some(detail.into()),
        });
    }

    fn failed(&mut self, step: ChangeStep, err: &CoreError) {
        tracing::error!(step = ?step, error = %err, "Work change step failed");
        self.steps.push(StepRecord {
            step,
            outcome: StepOutcome::Failed,
            detail: Some(err.to_string()),
        });
    }

    pub fn outcome_of(&self, step: ChangeStep) -> Option<StepOutcome> {
        self.steps.iter().find(|s| s.step == step).map(|s| s.outcome)
    }

    /// Whether any step failed (the change may be partially applied).
    pub fn is_partial(&self) -> bool {
        self.steps.iter().any(|s| s.outcome == StepOutcome::Failed)
    }

    /// Detail of the first failed step.
    pub fn first_failure(&self) -> Option<&str> {
        self.steps
            .iter()
            .find(|s| s.outcome == StepOutcome::Failed)
            .and_then(|s| s.detail.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

/// Add work to a stage and make sure its status row exists.
///
/// The status row is created as `To Be Planned` through an atomic
/// conditional insert, so repeating the addition never creates a second row.
pub async fn add_work<S: WorkStore + ?Sized>(
    store: &S,
    request: &AdditionRequest,
    actor: &Actor,
) -> Result<ChangeReport, CoreError> {
    let addition = validate_addition(request)?;
    let mut report = ChangeReport::new();

    match store.insert_addition(&addition, actor).await {
        Ok(id) => {
            report.success = true;
            report.record_id = Some(id);
            report.done(ChangeStep::RecordAddition, None);
        }
        Err(err) => {
            report.failed(ChangeStep::RecordAddition, &err);
            report.skipped(ChangeStep::EnsureStatus, "Addition was not recorded");
            return Ok(report);
        }
    }

    match store
        .ensure_status(&addition.key, LifecycleStatus::ToBePlanned, actor)
        .await
    {
        Ok(created) => {
            if created {
                report.resulting_status = Some(LifecycleStatus::ToBePlanned);
            }
            let detail = if created {
                "Status created"
            } else {
                "Status already present"
            };
            report.done(ChangeStep::EnsureStatus, Some(detail.to_string()));
        }
        Err(err) => report.failed(ChangeStep::EnsureStatus, &err),
    }

    tracing::info!(
        actor = actor.id(),
        stage_id = addition.key.stage_id,
        work_order_id = addition.key.work_order_id,
        work_code = %addition.key.work_code,
        partial = report.is_partial(),
        "Work added"
    );
    Ok(report)
}

/// Remove work from a stage.
///
/// Steps: record the removal, find active plannings for the code, check them
/// for non-completed reports, soft-delete them, then reset the status to
/// `In Progress` (partial work reported) or `To Be Planned`. Every step runs
/// even if an earlier one failed, except where it depends on data the failed
/// step should have produced.
pub async fn remove_work<S: WorkStore + ?Sized>(
    store: &S,
    request: &RemovalRequest,
    actor: &Actor,
) -> Result<ChangeReport, CoreError> {
    let removal = validate_removal(request)?;
    let mut report = ChangeReport::new();

    match store.insert_removal(&removal, actor).await {
        Ok(id) => {
            report.success = true;
            report.record_id = Some(id);
            report.done(ChangeStep::RecordRemoval, None);
        }
        Err(err) => report.failed(ChangeStep::RecordRemoval, &err),
    }

    let Some(key) = removal.key() else {
        tracing::warn!(
            actor = actor.id(),
            stage_id = removal.stage_id,
            work_order_id = removal.work_order_id,
            "Removal without work code, status update skipped"
        );
        for step in [
            ChangeStep::FindActivePlannings,
            ChangeStep::CheckPartialReports,
            ChangeStep::SoftDeletePlannings,
            ChangeStep::UpdateStatus,
        ] {
            report.skipped(step, "No work code supplied");
        }
        return Ok(report);
    };

    let planning_ids = match store.active_planning_ids(&key).await {
        Ok(ids) => {
            report.done(
                ChangeStep::FindActivePlannings,
                Some(format!("{} active planning(s)", ids.len())),
            );
            Some(ids)
        }
        Err(err) => {
            report.failed(ChangeStep::FindActivePlannings, &err);
            None
        }
    };

    let has_partial = match planning_ids.as_deref() {
        None => {
            report.skipped(ChangeStep::CheckPartialReports, "Plannings unknown");
            None
        }
        Some([]) => {
            report.skipped(ChangeStep::CheckPartialReports, "No active plannings");
            Some(false)
        }
        Some(ids) => match store.has_non_completed_report(ids).await {
            Ok(found) => {
                report.done(ChangeStep::CheckPartialReports, None);
                Some(found)
            }
            Err(err) => {
                report.failed(ChangeStep::CheckPartialReports, &err);
                None
            }
        },
    };

    match planning_ids.as_deref() {
        None => report.skipped(ChangeStep::SoftDeletePlannings, "Plannings unknown"),
        Some([]) => report.skipped(ChangeStep::SoftDeletePlannings, "No active plannings"),
        Some(ids) => match store.soft_delete_plannings(ids, actor).await {
            Ok(count) => {
                report.affected_rows = count;
                report.done(ChangeStep::SoftDeletePlannings, None);
            }
            Err(err) => report.failed(ChangeStep::SoftDeletePlannings, &err),
        },
    }

    match has_partial {
        // Writing a guessed status could erase an in-progress signal.
        None => report.skipped(
            ChangeStep::UpdateStatus,
            "Report state unknown, status left unchanged",
        ),
        Some(has_partial) => {
            let status = status_after_removal(has_partial);
            match store.set_status(&key, status, actor).await {
                Ok(()) => {
                    report.resulting_status = Some(status);
                    report.done(ChangeStep::UpdateStatus, None);
                }
                Err(err) => report.failed(ChangeStep::UpdateStatus, &err),
            }
        }
    }

    tracing::info!(
        actor = actor.id(),
        stage_id = removal.stage_id,
        work_order_id = removal.work_order_id,
        work_code = %key.work_code,
        status = ?report.resulting_status,
        partial = report.is_partial(),
        "Work removed"
    );
    Ok(report)
}

/// Cancel approved, active plannings in bulk.
///
/// Plannings that are not approved or already deleted are silently left
/// alone; `affected_rows` reports how many were cancelled. The status of
/// every work item that lost a planning is then refreshed, one
/// `update_status` step per item. `resulting_status` is set only when a
/// single work item was affected.
pub async fn cancel_plannings<S: WorkStore + ?Sized>(
    store: &S,
    request: &CancellationRequest,
    actor: &Actor,
) -> Result<ChangeReport, CoreError> {
    let (ids, reason) = validate_cancellation(request)?;
    let mut report = ChangeReport::new();

    let keys = match store.cancel_approved_plannings(&ids, &reason, actor).await {
        Ok(keys) => {
            let count = keys.len() as u64;
            report.success = true;
            report.affected_rows = count;
            report.done(
                ChangeStep::CancelPlannings,
                Some(format!("{count} of {} planning(s) cancelled", ids.len())),
            );
            tracing::info!(
                actor = actor.id(),
                requested = ids.len(),
                cancelled = count,
                "Plannings cancelled"
            );
            keys.into_iter().collect::<IndexSet<WorkKey>>()
        }
        Err(err) => {
            report.failed(ChangeStep::CancelPlannings, &err);
            return Ok(report);
        }
    };

    let mut statuses = Vec::with_capacity(keys.len());
    for key in &keys {
        match refresh_status(store, key, actor).await {
            Ok(status) => {
                statuses.push(status);
                report.done(
                    ChangeStep::UpdateStatus,
                    Some(format!("{}: {status}", key.work_code)),
                );
            }
            Err(CoreError::Conflict(msg)) => {
                tracing::warn!(work_code = %key.work_code, reason = %msg, "Status kept after cancellation");
                report.skipped(ChangeStep::UpdateStatus, format!("{}: {msg}", key.work_code));
            }
            Err(err) => report.failed(ChangeStep::UpdateStatus, &err),
        }
    }
    if let [status] = statuses.as_slice() {
        if keys.len() == 1 {
            report.resulting_status = Some(*status);
        }
    }
    Ok(report)
}
