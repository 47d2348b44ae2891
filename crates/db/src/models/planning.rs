//! Work planning rows and DTOs.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use shopfloor_core::booking::{validate_window, Assignment};
use shopfloor_core::grouping::WorkRecord;
use shopfloor_core::lifecycle::{LifecycleStatus, PlanningStatus};
use shopfloor_core::store::WorkKey;
use shopfloor_core::types::{DbId, Timestamp};
use shopfloor_core::work_code::WorkCode;

/// A row from the `work_plannings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkPlanning {
    pub id: DbId,
    pub stage_id: DbId,
    pub work_order_id: DbId,
    pub work_order_detail_id: DbId,
    pub derived_code: Option<String>,
    pub other_code: Option<String>,
    pub standard_code: Option<String>,
    pub standard_work_name: Option<String>,
    pub other_description: Option<String>,
    pub type_description: Option<String>,
    pub work_order_number: Option<String>,
    pub production_work_order_number: Option<String>,
    pub skill_code: String,
    pub worker_ids: Vec<DbId>,
    pub from_time: NaiveDateTime,
    pub to_time: NaiveDateTime,
    pub status: String,
    pub record_state: String,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkPlanning {
    pub fn planning_status(&self) -> Option<PlanningStatus> {
        self.status.parse().ok()
    }

    /// One assignment per planned worker.
    pub fn assignments(&self) -> Vec<Assignment> {
        self.worker_ids
            .iter()
            .map(|&worker_id| Assignment {
                worker_id,
                planning_id: Some(self.id),
                from: self.from_time,
                to: self.to_time,
            })
            .collect()
    }
}

impl WorkRecord for WorkPlanning {
    fn record_id(&self) -> DbId {
        self.id
    }
    fn other_work_code(&self) -> Option<&str> {
        self.other_code.as_deref()
    }
    fn derived_standard_code(&self) -> Option<&str> {
        self.derived_code.as_deref()
    }
    fn standard_code(&self) -> Option<&str> {
        self.standard_code.as_deref()
    }
    fn other_work_description(&self) -> Option<&str> {
        self.other_description.as_deref()
    }
    fn standard_work_name(&self) -> Option<&str> {
        self.standard_work_name.as_deref()
    }
    fn type_description(&self) -> Option<&str> {
        self.type_description.as_deref()
    }
    fn work_order_number(&self) -> Option<&str> {
        self.work_order_number.as_deref()
    }
    fn production_work_order_number(&self) -> Option<&str> {
        self.production_work_order_number.as_deref()
    }
}

/// The work item columns of a planning, as returned by bulk updates.
#[derive(Debug, Clone, FromRow)]
pub struct PlanningKeyRow {
    pub stage_id: DbId,
    pub work_order_id: DbId,
    pub derived_code: Option<String>,
    pub other_code: Option<String>,
}

impl PlanningKeyRow {
    /// `None` if the row carries no usable code.
    pub fn key(&self) -> Option<WorkKey> {
        let work_code =
            WorkCode::from_parts(self.derived_code.as_deref(), self.other_code.as_deref())
                .ok()
                .flatten()?;
        Some(WorkKey {
            stage_id: self.stage_id,
            work_order_id: self.work_order_id,
            work_code,
        })
    }
}

/// An active planning joined with the current status of its work item.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlannedWork {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub planning: WorkPlanning,
    /// `None` when no status row exists yet for the work item.
    pub current_status: Option<String>,
}

impl WorkRecord for PlannedWork {
    fn record_id(&self) -> DbId {
        self.planning.id
    }
    fn other_work_code(&self) -> Option<&str> {
        self.planning.other_work_code()
    }
    fn derived_standard_code(&self) -> Option<&str> {
        self.planning.derived_standard_code()
    }
    fn standard_code(&self) -> Option<&str> {
        self.planning.standard_code()
    }
    fn other_work_description(&self) -> Option<&str> {
        self.planning.other_work_description()
    }
    fn standard_work_name(&self) -> Option<&str> {
        self.planning.standard_work_name()
    }
    fn type_description(&self) -> Option<&str> {
        self.planning.type_description()
    }
    fn work_order_number(&self) -> Option<&str> {
        self.planning.work_order_number()
    }
    fn production_work_order_number(&self) -> Option<&str> {
        self.planning.production_work_order_number()
    }
    fn lifecycle_status(&self) -> Option<LifecycleStatus> {
        self.current_status.as_deref().and_then(|s| s.parse().ok())
    }
}

/// A single worker assignment on an active planning, unnested from `worker_ids`.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub planning_id: DbId,
    pub worker_id: DbId,
    pub from_time: NaiveDateTime,
    pub to_time: NaiveDateTime,
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        Assignment {
            worker_id: row.worker_id,
            planning_id: Some(row.planning_id),
            from: row.from_time,
            to: row.to_time,
        }
    }
}

/// DTO for creating a planning.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanning {
    pub stage_id: DbId,
    pub work_order_id: DbId,
    pub work_order_detail_id: DbId,
    pub derived_code: Option<String>,
    pub other_code: Option<String>,
    pub standard_code: Option<String>,
    pub standard_work_name: Option<String>,
    pub other_description: Option<String>,
    pub type_description: Option<String>,
    pub work_order_number: Option<String>,
    pub production_work_order_number: Option<String>,
    pub skill_code: String,
    #[serde(default)]
    pub worker_ids: Vec<DbId>,
    pub from_time: NaiveDateTime,
    pub to_time: NaiveDateTime,
    /// Defaults to `draft` if omitted.
    pub status: Option<PlanningStatus>,
    pub notes: Option<String>,
}

impl CreatePlanning {
    /// Check the payload and resolve its work code.
    pub fn validate(&self) -> Result<WorkCode, String> {
        let code = WorkCode::from_parts(self.derived_code.as_deref(), self.other_code.as_deref())?
            .ok_or_else(|| "A planning needs a standard or other-work code".to_string())?;
        if self.skill_code.trim().is_empty() {
            return Err("Skill code is required".to_string());
        }
        validate_window(self.from_time, self.to_time)?;
        Ok(code)
    }

    /// Assignments this planning would create, one per distinct worker.
    pub fn proposed_assignments(&self) -> Vec<Assignment> {
        let mut workers = self.worker_ids.clone();
        workers.sort_unstable();
        workers.dedup();
        workers
            .into_iter()
            .map(|worker_id| Assignment {
                worker_id,
                planning_id: None,
                from: self.from_time,
                to: self.to_time,
            })
            .collect()
    }
}
