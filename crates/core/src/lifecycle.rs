//! Work lifecycle states, planning/report status values and the state machine.
//!
//! Status values are stored as TEXT in the database; the `as_str` / `FromStr`
//! pairs here are the single source of truth for the wire names.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Lifecycle status
// ---------------------------------------------------------------------------

/// Progress state of a work item for one (stage, work order, work code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleStatus {
    #[serde(rename = "To Be Planned")]
    ToBePlanned,
    #[serde(rename = "Draft Plan")]
    DraftPlan,
    #[serde(rename = "Plan Pending Approval")]
    PlanPendingApproval,
    #[serde(rename = "Planned")]
    Planned,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Cancelled")]
    Cancelled,
}

impl LifecycleStatus {
    pub const ALL: [LifecycleStatus; 7] = [
        Self::ToBePlanned,
        Self::DraftPlan,
        Self::PlanPendingApproval,
        Self::Planned,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToBePlanned => "To Be Planned",
            Self::DraftPlan => "Draft Plan",
            Self::PlanPendingApproval => "Plan Pending Approval",
            Self::Planned => "Planned",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Statuses reachable from `self` through normal progress.
    ///
    /// Removal is not a transition; see [`status_after_removal`].
    pub fn valid_transitions(self) -> &'static [LifecycleStatus] {
        use LifecycleStatus::*;
        match self {
            ToBePlanned => &[DraftPlan, PlanPendingApproval],
            DraftPlan => &[PlanPendingApproval, Planned],
            PlanPendingApproval => &[Planned],
            Planned => &[InProgress, Cancelled],
            InProgress => &[Completed],
            Cancelled => &[ToBePlanned],
            Completed => &[],
        }
    }

    pub fn can_transition(self, to: LifecycleStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Whether `to` can be reached from `self` through one or more transitions.
    pub fn can_reach(self, to: LifecycleStatus) -> bool {
        let mut seen = vec![self];
        let mut frontier = vec![self];
        while let Some(status) = frontier.pop() {
            for next in status.valid_transitions() {
                if *next == to {
                    return true;
                }
                if !seen.contains(next) {
                    seen.push(*next);
                    frontier.push(*next);
                }
            }
        }
        false
    }

    /// Whether the item has progressed past pure planning (reported on).
    pub fn is_reported(self) -> bool {
        self != Self::Planned
    }
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown lifecycle status '{s}'"))
    }
}

/// Validate a lifecycle transition, returning a descriptive message otherwise.
pub fn validate_transition(from: LifecycleStatus, to: LifecycleStatus) -> Result<(), String> {
    if from.can_transition(to) {
        Ok(())
    } else {
        Err(format!("Invalid transition: {from} -> {to}"))
    }
}

/// Check that a stored status may be replaced by a freshly derived one.
///
/// A single refresh can cover several transitions (an approved planning takes
/// a new item straight to `Planned`), so `next` only has to be reachable from
/// `current`. A work item without a stored status may take any status.
pub fn validate_progress(
    current: Option<LifecycleStatus>,
    next: LifecycleStatus,
) -> Result<(), String> {
    match current {
        None => Ok(()),
        Some(current) if current == next || current.can_reach(next) => Ok(()),
        Some(current) => Err(format!(
            "Work status cannot move from {current} to {next}"
        )),
    }
}

/// Status a work item falls back to once it has been removed from a plan.
///
/// A removal after a non-completed (`NC`) report keeps the item in progress
/// so the partial work is not lost; otherwise it goes back to planning.
pub fn status_after_removal(has_non_completed_report: bool) -> LifecycleStatus {
    if has_non_completed_report {
        LifecycleStatus::InProgress
    } else {
        LifecycleStatus::ToBePlanned
    }
}

// ---------------------------------------------------------------------------
// Planning / report / record state
// ---------------------------------------------------------------------------

/// Approval state of a planning record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningStatus {
    Draft,
    Pending,
    Approved,
    Cancelled,
}

impl PlanningStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for PlanningStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("Unknown planning status '{other}'")),
        }
    }
}

/// Completion flag recorded on a report: completed (`C`) or not (`NC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionStatus {
    #[serde(rename = "C")]
    Completed,
    #[serde(rename = "NC")]
    NotCompleted,
}

impl CompletionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "C",
            Self::NotCompleted => "NC",
        }
    }
}

impl FromStr for CompletionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" => Ok(Self::Completed),
            "NC" => Ok(Self::NotCompleted),
            other => Err(format!("Unknown completion status '{other}'")),
        }
    }
}

/// Soft-delete state. Rows are never physically removed; every active read
/// path filters on [`RecordState::Active`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Active,
    Deleted,
}

impl RecordState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deleted => "deleted",
        }
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive the lifecycle status of a work item from its rows.
///
/// `plans` holds the status of every planning row seen for the item
/// (including cancelled ones); `reports` the completion flag of every report.
pub fn derive_status(plans: &[PlanningStatus], reports: &[CompletionStatus]) -> LifecycleStatus {
    if !reports.is_empty() {
        return if reports.iter().all(|r| *r == CompletionStatus::Completed) {
            LifecycleStatus::Completed
        } else {
            LifecycleStatus::InProgress
        };
    }

    let active: Vec<PlanningStatus> = plans
        .iter()
        .copied()
        .filter(|p| *p != PlanningStatus::Cancelled)
        .collect();

    if active.is_empty() {
        return if plans.is_empty() {
            LifecycleStatus::ToBePlanned
        } else {
            LifecycleStatus::Cancelled
        };
    }

    if active.contains(&PlanningStatus::Draft) {
        LifecycleStatus::DraftPlan
    } else if active.contains(&PlanningStatus::Pending) {
        LifecycleStatus::PlanPendingApproval
    } else {
        LifecycleStatus::Planned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::LifecycleStatus::*;

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    #[test]
    fn to_be_planned_moves_into_planning() {
        assert!(ToBePlanned.can_transition(DraftPlan));
        assert!(ToBePlanned.can_transition(PlanPendingApproval));
        assert!(!ToBePlanned.can_transition(Planned));
    }

    #[test]
    fn planned_moves_to_in_progress_or_cancelled() {
        assert!(Planned.can_transition(InProgress));
        assert!(Planned.can_transition(Cancelled));
    }

    #[test]
    fn cancellation_only_from_planned() {
        for status in LifecycleStatus::ALL {
            let allowed = status.can_transition(Cancelled);
            assert_eq!(allowed, status == Planned, "{status} -> Cancelled");
        }
    }

    #[test]
    fn completed_is_terminal() {
        assert!(Completed.valid_transitions().is_empty());
    }

    #[test]
    fn cancelled_can_be_replanned() {
        assert!(Cancelled.can_transition(ToBePlanned));
    }

    #[test]
    fn validate_transition_names_both_states() {
        let err = validate_transition(Completed, InProgress).unwrap_err();
        assert!(err.contains("Completed"));
        assert!(err.contains("In Progress"));
        assert!(validate_transition(InProgress, Completed).is_ok());
    }

    #[test]
    fn in_progress_only_reaches_completed() {
        for status in LifecycleStatus::ALL {
            assert_eq!(InProgress.can_reach(status), status == Completed, "{status}");
        }
    }

    #[test]
    fn planning_states_reach_planned_in_one_refresh() {
        assert!(ToBePlanned.can_reach(Planned));
        assert!(Cancelled.can_reach(DraftPlan));
        assert!(Planned.can_reach(Completed));
    }

    #[test]
    fn progress_from_completed_is_refused() {
        let err = validate_progress(Some(Completed), DraftPlan).unwrap_err();
        assert_eq!(err, "Work status cannot move from Completed to Draft Plan");
        assert!(validate_progress(Some(InProgress), DraftPlan).is_err());
    }

    #[test]
    fn progress_allows_unchanged_and_unknown() {
        assert!(validate_progress(Some(Completed), Completed).is_ok());
        assert!(validate_progress(None, InProgress).is_ok());
        assert!(validate_progress(Some(ToBePlanned), Planned).is_ok());
    }

    // -----------------------------------------------------------------------
    // Wire names
    // -----------------------------------------------------------------------

    #[test]
    fn lifecycle_names_parse_back() {
        for status in LifecycleStatus::ALL {
            assert_eq!(status.as_str().parse::<LifecycleStatus>(), Ok(status));
        }
        assert!("planned".parse::<LifecycleStatus>().is_err());
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&PlanPendingApproval).unwrap();
        assert_eq!(json, "\"Plan Pending Approval\"");
        let json = serde_json::to_string(&CompletionStatus::NotCompleted).unwrap();
        assert_eq!(json, "\"NC\"");
    }

    #[test]
    fn planning_status_rejects_unknown() {
        assert_eq!("approved".parse(), Ok(PlanningStatus::Approved));
        assert!("APPROVED".parse::<PlanningStatus>().is_err());
    }

    // -----------------------------------------------------------------------
    // Removal reconciliation
    // -----------------------------------------------------------------------

    #[test]
    fn removal_after_partial_report_stays_in_progress() {
        assert_eq!(status_after_removal(true), InProgress);
    }

    #[test]
    fn removal_without_partial_report_returns_to_planning() {
        assert_eq!(status_after_removal(false), ToBePlanned);
    }

    // -----------------------------------------------------------------------
    // Derivation
    // -----------------------------------------------------------------------

    #[test]
    fn derive_without_rows_is_to_be_planned() {
        assert_eq!(derive_status(&[], &[]), ToBePlanned);
    }

    #[test]
    fn derive_prefers_least_advanced_plan() {
        let (draft, pending, approved) = (
            PlanningStatus::Draft,
            PlanningStatus::Pending,
            PlanningStatus::Approved,
        );
        assert_eq!(derive_status(&[approved, draft], &[]), DraftPlan);
        assert_eq!(derive_status(&[approved, pending], &[]), PlanPendingApproval);
        assert_eq!(
            derive_status(&[approved, PlanningStatus::Cancelled], &[]),
            Planned
        );
    }

    #[test]
    fn derive_all_cancelled_is_cancelled() {
        assert_eq!(derive_status(&[PlanningStatus::Cancelled], &[]), Cancelled);
    }

    #[test]
    fn derive_from_reports() {
        let plans = [PlanningStatus::Approved];
        let done = CompletionStatus::Completed;
        let partial = CompletionStatus::NotCompleted;
        assert_eq!(derive_status(&plans, &[done]), Completed);
        assert_eq!(derive_status(&plans, &[done, partial]), InProgress);
    }
}
