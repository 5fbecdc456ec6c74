// src/db/unit_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::{map_unique_violation, AppError},
    db::UnitRepository,
    models::unit::{Unit, UnitPayload},
};

const UNIQUE_FIELDS: &[(&str, &str)] = &[("unit_name_key", "Já existe uma unidade com esse nome.")];

#[derive(Clone)]
pub struct PgUnitRepository {
    pool: PgPool,
}

impl PgUnitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitRepository for PgUnitRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Unit>, AppError> {
        let unit = sqlx::query_as::<_, Unit>("SELECT * FROM unit WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(unit)
    }

    async fn find_all(&self) -> Result<Vec<Unit>, AppError> {
        let units = sqlx::query_as::<_, Unit>("SELECT * FROM unit ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(units)
    }

    async fn create(&self, input: &UnitPayload) -> Result<Unit, AppError> {
        sqlx::query_as::<_, Unit>("INSERT INTO unit (name) VALUES ($1) RETURNING *")
            .bind(&input.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, UNIQUE_FIELDS))
    }

    async fn update(&self, id: i32, input: &UnitPayload) -> Result<Option<Unit>, AppError> {
        sqlx::query_as::<_, Unit>(
            "UPDATE unit SET name = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(&input.name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, UNIQUE_FIELDS))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM unit WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
