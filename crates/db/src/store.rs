//! [`WorkStore`] backed by PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;
use shopfloor_core::error::CoreError;
use shopfloor_core::identity::Actor;
use shopfloor_core::lifecycle::{CompletionStatus, LifecycleStatus, PlanningStatus};
use shopfloor_core::store::{WorkKey, WorkStore};
use shopfloor_core::types::DbId;
use shopfloor_core::work_changes::{ValidatedAddition, ValidatedRemoval};

use crate::repositories::{PlanningRepo, ReportRepo, WorkChangeRepo, WorkStatusRepo};

/// Runs each store call as its own statement on the pool.
#[derive(Debug, Clone)]
pub struct PgWorkStore {
    pool: PgPool,
}

impl PgWorkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_err(err: sqlx::Error) -> CoreError {
    CoreError::Store(err.to_string())
}

#[async_trait]
impl WorkStore for PgWorkStore {
    async fn insert_addition(
        &self,
        addition: &ValidatedAddition,
        actor: &Actor,
    ) -> Result<DbId, CoreError> {
        let record = WorkChangeRepo::insert_addition(&self.pool, addition, actor)
            .await
            .map_err(store_err)?;
        Ok(record.id)
    }

    async fn ensure_status(
        &self,
        key: &WorkKey,
        initial: LifecycleStatus,
        actor: &Actor,
    ) -> Result<bool, CoreError> {
        WorkStatusRepo::ensure(&self.pool, key, initial, actor)
            .await
            .map_err(store_err)
    }

    async fn current_status(&self, key: &WorkKey) -> Result<Option<LifecycleStatus>, CoreError> {
        let row = WorkStatusRepo::find(&self.pool, key)
            .await
            .map_err(store_err)?;
        Ok(row.and_then(|row| row.status()))
    }

    async fn planning_statuses(&self, key: &WorkKey) -> Result<Vec<PlanningStatus>, CoreError> {
        PlanningRepo::statuses_for_key(&self.pool, key)
            .await
            .map_err(store_err)
    }

    async fn report_completions(&self, key: &WorkKey) -> Result<Vec<CompletionStatus>, CoreError> {
        ReportRepo::completions_for_key(&self.pool, key)
            .await
            .map_err(store_err)
    }

    async fn set_status(
        &self,
        key: &WorkKey,
        status: LifecycleStatus,
        actor: &Actor,
    ) -> Result<(), CoreError> {
        WorkStatusRepo::upsert(&self.pool, key, status, actor)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn insert_removal(
        &self,
        removal: &ValidatedRemoval,
        actor: &Actor,
    ) -> Result<DbId, CoreError> {
        let record = WorkChangeRepo::insert_removal(&self.pool, removal, actor)
            .await
            .map_err(store_err)?;
        Ok(record.id)
    }

    async fn active_planning_ids(&self, key: &WorkKey) -> Result<Vec<DbId>, CoreError> {
        PlanningRepo::active_ids_for_key(&self.pool, key)
            .await
            .map_err(store_err)
    }

    async fn has_non_completed_report(&self, planning_ids: &[DbId]) -> Result<bool, CoreError> {
        ReportRepo::has_non_completed(&self.pool, planning_ids)
            .await
            .map_err(store_err)
    }

    async fn soft_delete_plannings(
        &self,
        planning_ids: &[DbId],
        actor: &Actor,
    ) -> Result<u64, CoreError> {
        PlanningRepo::soft_delete_many(&self.pool, planning_ids, actor)
            .await
            .map_err(store_err)
    }

    async fn cancel_approved_plannings(
        &self,
        planning_ids: &[DbId],
        reason: &str,
        actor: &Actor,
    ) -> Result<Vec<WorkKey>, CoreError> {
        PlanningRepo::cancel_approved(&self.pool, planning_ids, reason, actor)
            .await
            .map_err(store_err)
    }
}
