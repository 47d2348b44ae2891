//! Grouping of planning/report rows by work code and reported-state checks.
//!
//! Rows come from different tables with different shapes. Grouping only
//! needs a handful of fields, exposed through [`WorkRecord`], so any row type
//! can be grouped without being converted first.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::lifecycle::LifecycleStatus;
use crate::types::DbId;
use crate::work_code::{grouping_key, order_ref, work_name};

/// The fields grouping and status checks read from a row.
pub trait WorkRecord {
    fn record_id(&self) -> DbId;

    /// Non-standard work code.
    fn other_work_code(&self) -> Option<&str>;

    /// Standard code derived from the catalog.
    fn derived_standard_code(&self) -> Option<&str>;

    /// Raw standard code as entered on the row, if it differs from the derived one.
    fn standard_code(&self) -> Option<&str> {
        None
    }

    fn other_work_description(&self) -> Option<&str> {
        None
    }

    fn standard_work_name(&self) -> Option<&str> {
        None
    }

    fn type_description(&self) -> Option<&str> {
        None
    }

    fn work_order_number(&self) -> Option<&str> {
        None
    }

    fn production_work_order_number(&self) -> Option<&str> {
        None
    }

    fn lifecycle_status(&self) -> Option<LifecycleStatus> {
        None
    }

    /// Aggregate lost time reported on the row, in minutes.
    fn lost_time_minutes(&self) -> i64 {
        0
    }

    /// Grouping key of this row.
    fn work_key(&self) -> String {
        grouping_key(
            self.other_work_code(),
            self.derived_standard_code(),
            self.standard_code(),
        )
    }
}

/// All rows of one work code, with display fields taken from the first row.
#[derive(Debug, Clone, Serialize)]
pub struct WorkGroup<R> {
    pub work_code: String,
    pub work_name: String,
    pub work_order_ref: String,
    pub production_work_order_ref: String,
    pub has_lost_time: bool,
    pub total_lost_time: i64,
    pub items: Vec<R>,
}

impl<R: WorkRecord> WorkGroup<R> {
    fn open(work_code: String, first: &R) -> Self {
        let work_name = work_name(
            first.other_work_code(),
            first.other_work_description(),
            first.standard_work_name(),
            first.type_description(),
        )
        .unwrap_or_else(|| work_code.clone());

        Self {
            work_name,
            work_order_ref: order_ref(first.work_order_number()),
            production_work_order_ref: order_ref(first.production_work_order_number()),
            work_code,
            has_lost_time: false,
            total_lost_time: 0,
            items: Vec::new(),
        }
    }

    fn push(&mut self, record: R) {
        let lost = record.lost_time_minutes();
        if lost > 0 {
            self.has_lost_time = true;
        }
        self.total_lost_time += lost;
        self.items.push(record);
    }
}

/// Partition rows by work code.
///
/// Every row lands in exactly one group. Groups keep first-seen order and
/// rows keep input order within their group.
pub fn group_works<R, I>(records: I) -> IndexMap<String, WorkGroup<R>>
where
    R: WorkRecord,
    I: IntoIterator<Item = R>,
{
    let mut groups: IndexMap<String, WorkGroup<R>> = IndexMap::new();
    for record in records {
        let key = record.work_key();
        groups
            .entry(key.clone())
            .or_insert_with(|| WorkGroup::open(key, &record))
            .push(record);
    }
    groups
}

/// Whether every planned skill of `work_code` has been reported on.
///
/// False when nothing matches the code. Otherwise every matching row must
/// have a status and that status must not be `Planned`.
pub fn are_all_skills_reported<R: WorkRecord>(work_code: &str, planned_works: &[R]) -> bool {
    let mut matching = planned_works
        .iter()
        .filter(|r| r.work_key() == work_code)
        .peekable();

    if matching.peek().is_none() {
        return false;
    }
    matching.all(|r| r.lifecycle_status().is_some_and(LifecycleStatus::is_reported))
}

/// Whether any of the selected rows has already been reported on.
///
/// Used to block bulk actions (cancel, re-plan) on rows with progress.
pub fn has_reported_skills_selected<R: WorkRecord>(
    selected_ids: &HashSet<DbId>,
    planned_works: &[R],
) -> bool {
    if selected_ids.is_empty() {
        return false;
    }
    planned_works
        .iter()
        .filter(|r| selected_ids.contains(&r.record_id()))
        .any(|r| r.lifecycle_status().is_some_and(LifecycleStatus::is_reported))
}
