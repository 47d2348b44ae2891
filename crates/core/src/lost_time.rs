//! Lost-time reconciliation for report submission.
//!
//! A report carries an aggregate lost-time figure and an itemised list of
//! reason-coded chunks. Before a report is saved the chunks must add up to
//! the aggregate exactly and every reason may appear only once.
//!
//! Validation runs in three stages and stops at the first failing stage:
//!
//! 1. basic fields (worker, the from/to date and time, a non-negative total),
//! 2. allocation completeness (only when lost time is reported),
//! 3. chunk integrity (only when lost time is reported).
//!
//! Chunks left on a form that reports no lost time are never saved; see
//! [`chunks_to_save`].

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::types::DbId;

// Field keys used in `FormValidation::errors`.
pub const FIELD_WORKER: &str = "worker";
pub const FIELD_FROM_DATE: &str = "from_date";
pub const FIELD_FROM_TIME: &str = "from_time";
pub const FIELD_TO_DATE: &str = "to_date";
pub const FIELD_TO_TIME: &str = "to_time";
pub const FIELD_LOST_TIME: &str = "lost_time";
pub const FIELD_LOST_TIME_REASON: &str = "lost_time_reason";

/// One itemised block of lost time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LostTimeChunk {
    pub minutes: i64,
    /// Lost-time reason; `None` or `0` means not chosen yet.
    pub reason_id: Option<DbId>,
    #[serde(default)]
    pub is_payable: bool,
    /// Cost computed by the caller for this chunk.
    #[serde(default)]
    pub cost: Option<f64>,
    /// Per-worker share of `cost`, keyed by worker id.
    #[serde(default)]
    pub worker_costs: BTreeMap<DbId, f64>,
}

/// A report as entered on the reporting form, before it is saved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportForm {
    pub worker_id: Option<DbId>,
    pub from_date: Option<NaiveDate>,
    pub from_time: Option<NaiveTime>,
    pub to_date: Option<NaiveDate>,
    pub to_time: Option<NaiveTime>,
    #[serde(default)]
    pub total_lost_time_minutes: i64,
    #[serde(default)]
    pub chunks: Vec<LostTimeChunk>,
}

/// Field-keyed validation outcome returned to the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormValidation {
    pub is_valid: bool,
    pub errors: BTreeMap<&'static str, String>,
}

impl FormValidation {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: BTreeMap::new(),
        }
    }

    fn from_errors(errors: BTreeMap<&'static str, String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    fn single(field: &'static str, message: String) -> Self {
        Self::from_errors(BTreeMap::from([(field, message)]))
    }

    /// First error message, for callers that show one line.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.values().next().map(String::as_str)
    }
}

/// Stage 1: worker and both ends of the reporting window are present, and
/// the lost-time total is not negative.
///
/// Collects every missing field rather than stopping at the first.
pub fn validate_stage1(form: &ReportForm) -> FormValidation {
    let mut errors = BTreeMap::new();
    if form.worker_id.is_none() {
        errors.insert(FIELD_WORKER, "Please select a worker".to_string());
    }
    if form.from_date.is_none() {
        errors.insert(FIELD_FROM_DATE, "From date is required".to_string());
    }
    if form.from_time.is_none() {
        errors.insert(FIELD_FROM_TIME, "From time is required".to_string());
    }
    if form.to_date.is_none() {
        errors.insert(FIELD_TO_DATE, "To date is required".to_string());
    }
    if form.to_time.is_none() {
        errors.insert(FIELD_TO_TIME, "To time is required".to_string());
    }
    if form.total_lost_time_minutes < 0 {
        errors.insert(FIELD_LOST_TIME, "Lost time cannot be negative".to_string());
    }
    FormValidation::from_errors(errors)
}

/// Stage 2: the chunks account for the reported lost time exactly.
///
/// Passes trivially when no lost time is reported.
pub fn validate_stage2(total_lost_time_minutes: i64, chunks: &[LostTimeChunk]) -> FormValidation {
    if total_lost_time_minutes <= 0 {
        return FormValidation::valid();
    }
    if chunks.is_empty() {
        return FormValidation::single(
            FIELD_LOST_TIME,
            format!(
                "Lost time of {total_lost_time_minutes} minutes must be allocated to at least one reason"
            ),
        );
    }

    let allocated = allocated_minutes(chunks);
    if allocated < total_lost_time_minutes {
        FormValidation::single(
            FIELD_LOST_TIME,
            format!(
                "Lost time allocation incomplete. Total: {total_lost_time_minutes}, Allocated: {allocated}, Remaining: {}",
                total_lost_time_minutes.saturating_sub(allocated)
            ),
        )
    } else if allocated > total_lost_time_minutes {
        FormValidation::single(
            FIELD_LOST_TIME,
            format!(
                "Lost time over-allocated. Total: {total_lost_time_minutes}, Allocated: {allocated}, Excess: {}",
                allocated.saturating_sub(total_lost_time_minutes)
            ),
        )
    } else {
        FormValidation::valid()
    }
}

/// Stage 3: every chunk has a reason and a positive duration, and no reason
/// is used twice.
pub fn validate_stage3(chunks: &[LostTimeChunk]) -> FormValidation {
    let reasons: Vec<DbId> = chunks
        .iter()
        .filter_map(|c| c.reason_id.filter(|id| *id != 0))
        .collect();

    if reasons.len() != chunks.len() {
        return FormValidation::single(
            FIELD_LOST_TIME_REASON,
            "Every lost time entry must have a reason".to_string(),
        );
    }

    if chunks.iter().any(|c| c.minutes <= 0) {
        return FormValidation::single(
            FIELD_LOST_TIME,
            "Every lost time entry must be longer than zero minutes".to_string(),
        );
    }

    let distinct: HashSet<DbId> = reasons.iter().copied().collect();
    if distinct.len() != reasons.len() {
        return FormValidation::single(
            FIELD_LOST_TIME_REASON,
            "Each lost time reason can only be used once".to_string(),
        );
    }
    FormValidation::valid()
}

/// Run all stages in order and return the first failure.
///
/// Stages 2 and 3 only run when the form reports lost time.
pub fn validate_save(form: &ReportForm) -> FormValidation {
    let basic = validate_stage1(form);
    if !basic.is_valid {
        return basic;
    }
    if form.total_lost_time_minutes <= 0 {
        return FormValidation::valid();
    }

    let allocation = validate_stage2(form.total_lost_time_minutes, &form.chunks);
    if !allocation.is_valid {
        return allocation;
    }
    validate_stage3(&form.chunks)
}

/// Total minutes itemised across chunks, saturating at the `i64` bounds.
pub fn allocated_minutes(chunks: &[LostTimeChunk]) -> i64 {
    chunks
        .iter()
        .fold(0_i64, |total, c| total.saturating_add(c.minutes))
}

/// Chunks that are saved with the report.
///
/// Empty when the form reports no lost time, so the saved chunks always add
/// up to the saved total.
pub fn chunks_to_save(form: &ReportForm) -> &[LostTimeChunk] {
    if form.total_lost_time_minutes > 0 {
        &form.chunks
    } else {
        &[]
    }
}

/// Sum of the stored chunk costs. Chunks without a cost count as zero.
pub fn total_chunk_cost(chunks: &[LostTimeChunk]) -> f64 {
    chunks.iter().filter_map(|c| c.cost).sum()
}

/// Split `cost` equally among `workers` (deduplicated, ascending id order).
///
/// Returns an empty map when there are no workers.
pub fn equal_share(cost: f64, workers: &[DbId]) -> BTreeMap<DbId, f64> {
    let unique: std::collections::BTreeSet<DbId> = workers.iter().copied().collect();
    if unique.is_empty() {
        return BTreeMap::new();
    }
    let share = cost / unique.len() as f64;
    unique.into_iter().map(|id| (id, share)).collect()
}

/// Give every costed chunk without a per-worker split an equal share for
/// each of `workers`. Chunks that already carry a split keep it.
pub fn apply_equal_shares(chunks: &mut [LostTimeChunk], workers: &[DbId]) {
    for chunk in chunks.iter_mut().filter(|c| c.worker_costs.is_empty()) {
        if let Some(cost) = chunk.cost {
            chunk.worker_costs = equal_share(cost, workers);
        }
    }
}

/// Cost of the lost time on one report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LostTimeCost {
    pub total_cost: f64,
    pub worker_totals: BTreeMap<DbId, f64>,
}

impl LostTimeCost {
    pub fn of(chunks: &[LostTimeChunk]) -> Self {
        Self {
            total_cost: total_chunk_cost(chunks),
            worker_totals: aggregate_worker_totals(chunks),
        }
    }
}

/// Accumulate per-worker costs across every chunk of a form.
pub fn aggregate_worker_totals(chunks: &[LostTimeChunk]) -> BTreeMap<DbId, f64> {
    let mut totals = BTreeMap::new();
    for (worker_id, cost) in chunks.iter().flat_map(|c| c.worker_costs.iter()) {
        *totals.entry(*worker_id).or_insert(0.0) += cost;
    }
    totals
}
