// src/db/role_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::{map_unique_violation, AppError},
    db::RoleRepository,
    models::role::{Role, RolePayload},
};

const UNIQUE_FIELDS: &[(&str, &str)] = &[("role_name_key", "Já existe um cargo com esse nome.")];

#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM role WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn find_all(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM role ORDER BY access_level DESC, name")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    async fn create(&self, input: &RolePayload) -> Result<Role, AppError> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO role (name, access_level) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.name)
        .bind(input.access_level)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, UNIQUE_FIELDS))
    }

    async fn update(&self, id: i32, input: &RolePayload) -> Result<Option<Role>, AppError> {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE role
            SET name = $1, access_level = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(input.access_level)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, UNIQUE_FIELDS))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM role WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
