//! Repository for the `work_additions` and `work_removals` audit tables.

use sqlx::PgPool;
use shopfloor_core::identity::Actor;
use shopfloor_core::types::DbId;
use shopfloor_core::work_changes::{ValidatedAddition, ValidatedRemoval, WorkAddition};

use crate::models::work_change::{WorkAdditionRecord, WorkRemovalRecord};
use crate::models::work_status::code_columns;

const ADDITION_COLUMNS: &str = "id, stage_id, work_order_id, work_order_detail_id, \
    derived_code, other_code, other_description, skill_code, estimated_minutes, \
    addition_reason, created_by, created_at";

const REMOVAL_COLUMNS: &str = "id, stage_id, work_order_id, work_order_detail_id, \
    derived_code, other_code, removal_reason, created_by, created_at";

pub struct WorkChangeRepo;

impl WorkChangeRepo {
    pub async fn insert_addition(
        pool: &PgPool,
        addition: &ValidatedAddition,
        actor: &Actor,
    ) -> Result<WorkAdditionRecord, sqlx::Error> {
        let (derived_code, other_code) = code_columns(&addition.key.work_code);
        let (description, skill_code, estimated_minutes) = match &addition.work {
            WorkAddition::Standard { .. } => (None, None, None),
            WorkAddition::NonStandard {
                description,
                skill_code,
                estimated_minutes,
                ..
            } => (
                Some(description.as_str()),
                Some(skill_code.as_str()),
                Some(*estimated_minutes),
            ),
        };

        let query = format!(
            "INSERT INTO work_additions (stage_id, work_order_id, work_order_detail_id, \
                derived_code, other_code, other_description, skill_code, estimated_minutes, \
                addition_reason, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {ADDITION_COLUMNS}"
        );
        sqlx::query_as::<_, WorkAdditionRecord>(&query)
            .bind(addition.key.stage_id)
            .bind(addition.key.work_order_id)
            .bind(addition.work_order_detail_id)
            .bind(derived_code)
            .bind(other_code)
            .bind(description)
            .bind(skill_code)
            .bind(estimated_minutes)
            .bind(addition.work.addition_reason())
            .bind(actor.id())
            .bind(actor.at_time())
            .fetch_one(pool)
            .await
    }

    pub async fn insert_removal(
        pool: &PgPool,
        removal: &ValidatedRemoval,
        actor: &Actor,
    ) -> Result<WorkRemovalRecord, sqlx::Error> {
        let (derived_code, other_code) = removal
            .work_code
            .as_ref()
            .map(code_columns)
            .unwrap_or((None, None));

        let query = format!(
            "INSERT INTO work_removals (stage_id, work_order_id, work_order_detail_id, \
                derived_code, other_code, removal_reason, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {REMOVAL_COLUMNS}"
        );
        sqlx::query_as::<_, WorkRemovalRecord>(&query)
            .bind(removal.stage_id)
            .bind(removal.work_order_id)
            .bind(removal.work_order_detail_id)
            .bind(derived_code)
            .bind(other_code)
            .bind(&removal.removal_reason)
            .bind(actor.id())
            .bind(actor.at_time())
            .fetch_one(pool)
            .await
    }

    /// Additions recorded on a work order, oldest first.
    pub async fn list_additions(
        pool: &PgPool,
        stage_id: DbId,
        work_order_id: DbId,
    ) -> Result<Vec<WorkAdditionRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {ADDITION_COLUMNS} FROM work_additions \
             WHERE stage_id = $1 AND work_order_id = $2 ORDER BY id"
        );
        sqlx::query_as::<_, WorkAdditionRecord>(&query)
            .bind(stage_id)
            .bind(work_order_id)
            .fetch_all(pool)
            .await
    }

    /// Removals recorded on a work order, oldest first.
    pub async fn list_removals(
        pool: &PgPool,
        stage_id: DbId,
        work_order_id: DbId,
    ) -> Result<Vec<WorkRemovalRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {REMOVAL_COLUMNS} FROM work_removals \
             WHERE stage_id = $1 AND work_order_id = $2 ORDER BY id"
        );
        sqlx::query_as::<_, WorkRemovalRecord>(&query)
            .bind(stage_id)
            .bind(work_order_id)
            .fetch_all(pool)
            .await
    }
}
