//! Repository and store tests against a real database.
//!
//! Verifies that:
//! - Status creation is idempotent on the unique work key
//! - Soft-deleted plannings disappear from active reads
//! - Cancellation only touches approved, active plannings and soft-deletes them
//! - A report is saved with its chunks and deviations, or not at all
//! - The addition, removal and cancellation sequences run through `PgWorkStore`

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::PgPool;
use shopfloor_core::deviation::DeviationType;
use shopfloor_core::identity::Actor;
use shopfloor_core::lifecycle::{CompletionStatus, LifecycleStatus, PlanningStatus};
use shopfloor_core::lost_time::{LostTimeChunk, ReportForm};
use shopfloor_core::store::WorkKey;
use shopfloor_core::work_changes::{
    add_work, cancel_plannings, remove_work, AdditionRequest, CancellationRequest, ChangeStep,
    RemovalRequest, StepOutcome,
};
use shopfloor_core::work_code::WorkCode;
use shopfloor_db::models::planning::CreatePlanning;
use shopfloor_db::models::report::CreateReport;
use shopfloor_db::repositories::{PlanningRepo, ReportRepo, WorkChangeRepo, WorkStatusRepo};
use shopfloor_db::PgWorkStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn actor() -> Actor {
    Actor::new("op-17").unwrap()
}

fn at(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn standard_key(code: &str) -> WorkKey {
    WorkKey {
        stage_id: 1,
        work_order_id: 100,
        work_code: WorkCode::Standard(code.to_string()),
    }
}

fn new_planning(code: &str, workers: Vec<i64>, status: PlanningStatus) -> CreatePlanning {
    CreatePlanning {
        stage_id: 1,
        work_order_id: 100,
        work_order_detail_id: 1000,
        derived_code: Some(code.to_string()),
        other_code: None,
        standard_code: None,
        standard_work_name: Some("Hull welding".to_string()),
        other_description: None,
        type_description: Some("Structural".to_string()),
        work_order_number: Some("WO-100".to_string()),
        production_work_order_number: Some("PWO-7".to_string()),
        skill_code: "WELD".to_string(),
        worker_ids: workers,
        from_time: at(8),
        to_time: at(12),
        status: Some(status),
        notes: None,
    }
}

fn new_report(planning_id: i64, code: &str, completion: CompletionStatus) -> CreateReport {
    CreateReport {
        planning_id: Some(planning_id),
        stage_id: 1,
        work_order_id: 100,
        derived_code: Some(code.to_string()),
        other_code: None,
        completion_status: completion,
        form: ReportForm {
            worker_id: Some(7),
            from_date: Some(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()),
            from_time: Some(NaiveTime::from_hms_opt(8, 0, 0).unwrap()),
            to_date: Some(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()),
            to_time: Some(NaiveTime::from_hms_opt(12, 0, 0).unwrap()),
            total_lost_time_minutes: 30,
            chunks: vec![
                LostTimeChunk {
                    minutes: 20,
                    reason_id: Some(3),
                    is_payable: true,
                    cost: Some(40.0),
                    worker_costs: BTreeMap::from([(7, 40.0)]),
                },
                LostTimeChunk {
                    minutes: 10,
                    reason_id: Some(4),
                    ..Default::default()
                },
            ],
        },
        observation: None,
        justifications: BTreeMap::new(),
    }
}

// ---------------------------------------------------------------------------
// Work status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ensure_status_creates_once(pool: PgPool) {
    let key = standard_key("W-1");

    let first = WorkStatusRepo::ensure(&pool, &key, LifecycleStatus::ToBePlanned, &actor())
        .await
        .unwrap();
    let second = WorkStatusRepo::ensure(&pool, &key, LifecycleStatus::Planned, &actor())
        .await
        .unwrap();

    assert!(first, "first ensure should create the row");
    assert!(!second, "second ensure should leave the existing row");

    let row = WorkStatusRepo::find(&pool, &key).await.unwrap().unwrap();
    assert_eq!(row.status(), Some(LifecycleStatus::ToBePlanned));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_status_key_separates_code_kinds(pool: PgPool) {
    let standard = standard_key("W-1");
    let other = WorkKey {
        work_code: WorkCode::Other("W-1".to_string()),
        ..standard.clone()
    };

    assert!(WorkStatusRepo::ensure(&pool, &standard, LifecycleStatus::ToBePlanned, &actor())
        .await
        .unwrap());
    assert!(WorkStatusRepo::ensure(&pool, &other, LifecycleStatus::ToBePlanned, &actor())
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_overwrites_status(pool: PgPool) {
    let key = standard_key("W-1");
    WorkStatusRepo::upsert(&pool, &key, LifecycleStatus::Planned, &actor())
        .await
        .unwrap();
    let row = WorkStatusRepo::upsert(&pool, &key, LifecycleStatus::InProgress, &actor())
        .await
        .unwrap();
    assert_eq!(row.status(), Some(LifecycleStatus::InProgress));
    assert_eq!(row.updated_by, "op-17");
}

// ---------------------------------------------------------------------------
// Plannings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_planned_works_join_status(pool: PgPool) {
    let planning = PlanningRepo::create(
        &pool,
        &new_planning("W-1", vec![7], PlanningStatus::Approved),
        &actor(),
    )
    .await
    .unwrap();
    WorkStatusRepo::upsert(&pool, &standard_key("W-1"), LifecycleStatus::Planned, &actor())
        .await
        .unwrap();

    let works = PlanningRepo::list_planned_works(&pool, 1).await.unwrap();
    assert_eq!(works.len(), 1);
    assert_eq!(works[0].planning.id, planning.id);
    assert_eq!(works[0].current_status.as_deref(), Some("Planned"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_soft_delete_hides_planning(pool: PgPool) {
    let planning = PlanningRepo::create(
        &pool,
        &new_planning("W-1", vec![7], PlanningStatus::Draft),
        &actor(),
    )
    .await
    .unwrap();

    let deleted = PlanningRepo::soft_delete_many(&pool, &[planning.id], &actor())
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    assert!(PlanningRepo::find_by_id(&pool, planning.id)
        .await
        .unwrap()
        .is_none());
    assert!(PlanningRepo::active_ids_for_key(&pool, &standard_key("W-1"))
        .await
        .unwrap()
        .is_empty());

    let again = PlanningRepo::soft_delete_many(&pool, &[planning.id], &actor())
        .await
        .unwrap();
    assert_eq!(again, 0, "soft delete should not touch deleted rows");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cancel_only_touches_approved(pool: PgPool) {
    let approved = PlanningRepo::create(
        &pool,
        &new_planning("W-1", vec![7], PlanningStatus::Approved),
        &actor(),
    )
    .await
    .unwrap();
    let draft = PlanningRepo::create(
        &pool,
        &new_planning("W-2", vec![8], PlanningStatus::Draft),
        &actor(),
    )
    .await
    .unwrap();

    let cancelled =
        PlanningRepo::cancel_approved(&pool, &[approved.id, draft.id], "Material late", &actor())
            .await
            .unwrap();
    assert_eq!(cancelled, vec![standard_key("W-1")]);

    assert!(
        PlanningRepo::find_by_id(&pool, approved.id).await.unwrap().is_none(),
        "cancelled planning should be soft-deleted"
    );
    let (status, state, reason): (String, String, Option<String>) = sqlx::query_as(
        "SELECT status, record_state, cancellation_reason FROM work_plannings WHERE id = $1",
    )
    .bind(approved.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(status, "cancelled");
    assert_eq!(state, "deleted");
    assert_eq!(reason.as_deref(), Some("Material late"));

    let draft = PlanningRepo::find_by_id(&pool, draft.id).await.unwrap().unwrap();
    assert_eq!(draft.planning_status(), Some(PlanningStatus::Draft));

    let again = PlanningRepo::cancel_approved(&pool, &[approved.id], "Again", &actor())
        .await
        .unwrap();
    assert!(again.is_empty(), "cancelled plannings are not cancelled twice");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cancelled_plannings_still_count_for_status(pool: PgPool) {
    let approved = PlanningRepo::create(
        &pool,
        &new_planning("W-1", vec![7], PlanningStatus::Approved),
        &actor(),
    )
    .await
    .unwrap();
    let removed = PlanningRepo::create(
        &pool,
        &new_planning("W-1", vec![8], PlanningStatus::Draft),
        &actor(),
    )
    .await
    .unwrap();
    PlanningRepo::soft_delete_many(&pool, &[removed.id], &actor())
        .await
        .unwrap();
    PlanningRepo::cancel_approved(&pool, &[approved.id], "Material late", &actor())
        .await
        .unwrap();

    let statuses = PlanningRepo::statuses_for_key(&pool, &standard_key("W-1"))
        .await
        .unwrap();
    assert_eq!(statuses, vec![PlanningStatus::Cancelled]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_overlapping_assignments(pool: PgPool) {
    let planning = PlanningRepo::create(
        &pool,
        &new_planning("W-1", vec![7, 8], PlanningStatus::Approved),
        &actor(),
    )
    .await
    .unwrap();

    let overlapping = PlanningRepo::overlapping_assignments(&pool, &[7], at(11), at(13))
        .await
        .unwrap();
    assert_eq!(overlapping.len(), 1);
    assert_eq!(overlapping[0].worker_id, 7);
    assert_eq!(overlapping[0].planning_id, Some(planning.id));

    let touching = PlanningRepo::overlapping_assignments(&pool, &[7, 8], at(12), at(14))
        .await
        .unwrap();
    assert!(touching.is_empty());
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_report_saved_with_children(pool: PgPool) {
    let planning = PlanningRepo::create(
        &pool,
        &new_planning("W-1", vec![7], PlanningStatus::Approved),
        &actor(),
    )
    .await
    .unwrap();
    let input = new_report(planning.id, "W-1", CompletionStatus::NotCompleted);
    let deviations = vec![(DeviationType::ExceedsStdTime, "Rework".to_string())];

    let report = ReportRepo::create(&pool, &input, (at(8), at(12)), &deviations, &actor())
        .await
        .unwrap();

    assert_eq!(report.lt_minutes_total, 30);
    assert_eq!(report.completion(), Some(CompletionStatus::NotCompleted));

    let chunks = ReportRepo::list_chunks(&pool, report.id).await.unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].worker_costs.0.get(&7), Some(&40.0));

    let stored = ReportRepo::list_deviations(&pool, report.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].deviation_type, "exceeds_std_time");

    assert!(ReportRepo::has_non_completed(&pool, &[planning.id]).await.unwrap());

    let listed = ReportRepo::list_reported_works(&pool, 1).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].work_order_number.as_deref(), Some("WO-100"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_report_with_duplicate_reason_is_rolled_back(pool: PgPool) {
    let planning = PlanningRepo::create(
        &pool,
        &new_planning("W-1", vec![7], PlanningStatus::Approved),
        &actor(),
    )
    .await
    .unwrap();
    let mut input = new_report(planning.id, "W-1", CompletionStatus::Completed);
    input.form.chunks[1].reason_id = Some(3);

    let result = ReportRepo::create(&pool, &input, (at(8), at(12)), &[], &actor()).await;
    assert!(result.is_err(), "duplicate reason should violate the unique constraint");

    let listed = ReportRepo::list_reported_works(&pool, 1).await.unwrap();
    assert!(listed.is_empty(), "no partial report should remain");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_report_without_lost_time_drops_leftover_chunks(pool: PgPool) {
    let planning = PlanningRepo::create(
        &pool,
        &new_planning("W-1", vec![7], PlanningStatus::Approved),
        &actor(),
    )
    .await
    .unwrap();
    let mut input = new_report(planning.id, "W-1", CompletionStatus::Completed);
    input.form.total_lost_time_minutes = 0;

    let report = ReportRepo::create(&pool, &input, (at(8), at(12)), &[], &actor())
        .await
        .unwrap();

    assert_eq!(report.lt_minutes_total, 0);
    assert!(ReportRepo::list_chunks(&pool, report.id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Store sequences
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_addition_through_store(pool: PgPool) {
    let store = PgWorkStore::new(pool.clone());
    let request = AdditionRequest {
        stage_id: 1,
        work_order_id: 100,
        other_code: Some("X-9".to_string()),
        other_description: Some("Extra bracket".to_string()),
        skill_code: Some("FIT".to_string()),
        estimated_minutes: Some(45),
        addition_reason: Some("Customer change".to_string()),
        ..Default::default()
    };

    let report = add_work(&store, &request, &actor()).await.unwrap();
    assert!(report.success);
    assert_eq!(report.resulting_status, Some(LifecycleStatus::ToBePlanned));

    let again = add_work(&store, &request, &actor()).await.unwrap();
    assert!(again.success);
    assert_eq!(again.resulting_status, None, "status row already existed");

    let additions = WorkChangeRepo::list_additions(&pool, 1, 100).await.unwrap();
    assert_eq!(additions.len(), 2);
    assert_eq!(additions[0].estimated_minutes, Some(45));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_removal_through_store(pool: PgPool) {
    let store = PgWorkStore::new(pool.clone());
    let planning = PlanningRepo::create(
        &pool,
        &new_planning("W-1", vec![7], PlanningStatus::Approved),
        &actor(),
    )
    .await
    .unwrap();
    let input = new_report(planning.id, "W-1", CompletionStatus::NotCompleted);
    ReportRepo::create(&pool, &input, (at(8), at(12)), &[], &actor())
        .await
        .unwrap();

    let request = RemovalRequest {
        stage_id: 1,
        work_order_id: 100,
        work_order_detail_id: Some(1000),
        derived_code: Some("W-1".to_string()),
        other_code: None,
        removal_reason: Some("Scope cut".to_string()),
    };
    let report = remove_work(&store, &request, &actor()).await.unwrap();

    assert!(report.success);
    assert_eq!(report.resulting_status, Some(LifecycleStatus::InProgress));
    assert!(PlanningRepo::find_by_id(&pool, planning.id)
        .await
        .unwrap()
        .is_none());

    let status = WorkStatusRepo::find(&pool, &standard_key("W-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.status(), Some(LifecycleStatus::InProgress));

    let removals = WorkChangeRepo::list_removals(&pool, 1, 100).await.unwrap();
    assert_eq!(removals.len(), 1);
    assert_eq!(removals[0].removal_reason, "Scope cut");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cancellation_through_store(pool: PgPool) {
    let store = PgWorkStore::new(pool.clone());
    let key = standard_key("W-1");
    let planning = PlanningRepo::create(
        &pool,
        &new_planning("W-1", vec![7], PlanningStatus::Approved),
        &actor(),
    )
    .await
    .unwrap();
    WorkStatusRepo::upsert(&pool, &key, LifecycleStatus::Planned, &actor())
        .await
        .unwrap();

    let request = CancellationRequest {
        planning_ids: vec![planning.id],
        reason: Some("Material late".to_string()),
    };
    let report = cancel_plannings(&store, &request, &actor()).await.unwrap();

    assert!(report.success);
    assert_eq!(report.affected_rows, 1);
    assert_eq!(report.outcome_of(ChangeStep::UpdateStatus), Some(StepOutcome::Done));
    assert_eq!(report.resulting_status, Some(LifecycleStatus::Cancelled));

    assert!(PlanningRepo::list_planned_works(&pool, 1).await.unwrap().is_empty());
    assert!(PlanningRepo::active_ids_for_key(&pool, &key).await.unwrap().is_empty());

    let status = WorkStatusRepo::find(&pool, &key).await.unwrap().unwrap();
    assert_eq!(status.status(), Some(LifecycleStatus::Cancelled));
}
