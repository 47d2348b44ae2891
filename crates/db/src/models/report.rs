//! Work reports, their lost-time chunks and deviations.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use shopfloor_core::deviation::{DeviationType, ReportObservation};
use shopfloor_core::grouping::WorkRecord;
use shopfloor_core::lifecycle::CompletionStatus;
use shopfloor_core::lost_time::ReportForm;
use shopfloor_core::types::{DbId, Timestamp};
use shopfloor_core::work_code::WorkCode;

/// A row from the `work_reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkReport {
    pub id: DbId,
    pub planning_id: Option<DbId>,
    pub stage_id: DbId,
    pub work_order_id: DbId,
    pub derived_code: Option<String>,
    pub other_code: Option<String>,
    pub worker_id: Option<DbId>,
    pub from_time: NaiveDateTime,
    pub to_time: NaiveDateTime,
    pub completion_status: String,
    pub lt_minutes_total: i64,
    pub created_by: String,
    pub created_at: Timestamp,
}

impl WorkReport {
    pub fn completion(&self) -> Option<CompletionStatus> {
        self.completion_status.parse().ok()
    }
}

/// A report joined with the display fields of its planning.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportedWork {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub report: WorkReport,
    pub standard_work_name: Option<String>,
    pub other_description: Option<String>,
    pub type_description: Option<String>,
    pub work_order_number: Option<String>,
    pub production_work_order_number: Option<String>,
}

impl WorkRecord for ReportedWork {
    fn record_id(&self) -> DbId {
        self.report.id
    }
    fn other_work_code(&self) -> Option<&str> {
        self.report.other_code.as_deref()
    }
    fn derived_standard_code(&self) -> Option<&str> {
        self.report.derived_code.as_deref()
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
    fn lost_time_minutes(&self) -> i64 {
        self.report.lt_minutes_total
    }
}

/// A row from the `lost_time_chunks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LostTimeChunkRow {
    pub id: DbId,
    pub report_id: DbId,
    pub minutes: i64,
    pub reason_id: DbId,
    pub is_payable: bool,
    pub cost: Option<f64>,
    pub worker_costs: Json<BTreeMap<DbId, f64>>,
    pub created_at: Timestamp,
}

/// A row from the `work_report_deviations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkReportDeviation {
    pub id: DbId,
    pub report_id: DbId,
    pub planning_id: Option<DbId>,
    pub deviation_type: String,
    pub justification: String,
    pub created_by: String,
    pub created_at: Timestamp,
}

/// DTO for submitting a report from the reporting form.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReport {
    pub planning_id: Option<DbId>,
    pub stage_id: DbId,
    pub work_order_id: DbId,
    pub derived_code: Option<String>,
    pub other_code: Option<String>,
    pub completion_status: CompletionStatus,
    pub form: ReportForm,
    /// How the report compares with its plan; no deviations are checked when absent.
    pub observation: Option<ReportObservation>,
    #[serde(default)]
    pub justifications: BTreeMap<DeviationType, String>,
}

impl CreateReport {
    pub fn work_code(&self) -> Result<WorkCode, String> {
        WorkCode::from_parts(self.derived_code.as_deref(), self.other_code.as_deref())?
            .ok_or_else(|| "A report needs a standard or other-work code".to_string())
    }

    /// Start and end of the reported work. `None` while any part is missing.
    pub fn window(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let form = &self.form;
        let from = form.from_date?.and_time(form.from_time?);
        let to = form.to_date?.and_time(form.to_time?);
        Some((from, to))
    }
}
