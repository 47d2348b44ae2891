//! Worker double-booking detection.
//!
//! A worker may not be assigned to two plannings whose time windows overlap.
//! Windows are half-open (`[from, to)`), so back-to-back assignments are fine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// A worker booked for a time window, optionally on an existing planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub worker_id: DbId,
    pub planning_id: Option<DbId>,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

/// Two assignments of the same worker with overlapping windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConflict {
    pub worker_id: DbId,
    pub proposed: Assignment,
    pub existing: Assignment,
}

impl BookingConflict {
    pub fn describe(&self) -> String {
        let existing = match self.existing.planning_id {
            Some(id) => format!("planning {id}"),
            None => "another assignment in this request".to_string(),
        };
        format!(
            "Worker {} is already booked from {} to {} on {existing}",
            self.worker_id, self.existing.from, self.existing.to
        )
    }
}

/// Validate that a window ends after it starts.
pub fn validate_window(from: NaiveDateTime, to: NaiveDateTime) -> Result<(), String> {
    if to <= from {
        return Err(format!(
            "End time {to} must be after start time {from}"
        ));
    }
    Ok(())
}

/// Whether two half-open windows overlap.
pub fn windows_overlap(
    a_from: NaiveDateTime,
    a_to: NaiveDateTime,
    b_from: NaiveDateTime,
    b_to: NaiveDateTime,
) -> bool {
    a_from < b_to && b_from < a_to
}

/// Find every overlap for the proposed assignments.
///
/// Checks each proposal against the existing active assignments and against
/// the other proposals in the same request. An existing assignment on the
/// same planning as the proposal is not a conflict (re-saving a planning).
pub fn find_conflicts(proposed: &[Assignment], existing: &[Assignment]) -> Vec<BookingConflict> {
    let mut conflicts = Vec::new();

    for (i, p) in proposed.iter().enumerate() {
        for e in existing {
            let same_planning = p.planning_id.is_some() && p.planning_id == e.planning_id;
            if p.worker_id == e.worker_id
                && !same_planning
                && windows_overlap(p.from, p.to, e.from, e.to)
            {
                conflicts.push(BookingConflict {
                    worker_id: p.worker_id,
                    proposed: p.clone(),
                    existing: e.clone(),
                });
            }
        }

        for other in &proposed[i + 1..] {
            if p.worker_id == other.worker_id && windows_overlap(p.from, p.to, other.from, other.to)
            {
                conflicts.push(BookingConflict {
                    worker_id: p.worker_id,
                    proposed: other.clone(),
                    existing: p.clone(),
                });
            }
        }
    }

    conflicts
}
