// src/db/stage_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::StageRepository,
    models::stage::{Stage, StageFilter, StagePayload},
};

#[derive(Clone)]
pub struct PgStageRepository {
    pool: PgPool,
}

impl PgStageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StageRepository for PgStageRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Stage>, AppError> {
        let stage = sqlx::query_as::<_, Stage>("SELECT * FROM stage WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(stage)
    }

    async fn find_all(&self, filter: StageFilter) -> Result<Vec<Stage>, AppError> {
        // `$1 IS NULL` deixa o filtro opcional sem montar SQL dinâmico
        let stages = sqlx::query_as::<_, Stage>(
            r#"
            SELECT * FROM stage
            WHERE ($1::int IS NULL OR unit_id = $1)
            ORDER BY id
            "#,
        )
        .bind(filter.unit_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stages)
    }

    async fn create(&self, input: &StagePayload) -> Result<Stage, AppError> {
        let stage = sqlx::query_as::<_, Stage>(
            "INSERT INTO stage (name, unit_id, duration) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&input.name)
        .bind(input.unit_id)
        .bind(input.duration)
        .fetch_one(&self.pool)
        .await?;
        Ok(stage)
    }

    async fn update(&self, id: i32, input: &StagePayload) -> Result<Option<Stage>, AppError> {
        let stage = sqlx::query_as::<_, Stage>(
            r#"
            UPDATE stage
            SET name = $1, unit_id = $2, duration = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(input.unit_id)
        .bind(input.duration)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stage)
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM stage WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
