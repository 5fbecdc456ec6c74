// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::{map_unique_violation, AppError},
    db::UserRepository,
    models::auth::{NewUser, UpdateUserPayload, User, UserFilter},
};

// Nome das constraints do Postgres -> mensagem específica do campo
const UNIQUE_FIELDS: &[(&str, &str)] = &[
    ("users_pkey", "Este CPF já está cadastrado."),
    ("users_email_key", "Este e-mail já está em uso."),
];

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, cpf: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE cpf = $1")
            .bind(cpf)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    async fn find_all(&self, filter: UserFilter) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::int IS NULL OR unit_id = $1)
              AND ($2::bool IS NULL OR accepted = $2)
            ORDER BY full_name
            "#,
        )
        .bind(filter.unit_id)
        .bind(filter.accepted)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    // Cria um novo usuário; CPF ou e-mail duplicado vira erro de campo.
    async fn create(&self, input: &NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (cpf, full_name, email, password, unit_id, role_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&input.cpf)
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.unit_id)
        .bind(input.role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, UNIQUE_FIELDS))
    }

    async fn update(&self, cpf: &str, input: &UpdateUserPayload) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = $1, email = $2, unit_id = $3, role_id = $4, updated_at = NOW()
            WHERE cpf = $5
            RETURNING *
            "#,
        )
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(input.unit_id)
        .bind(input.role_id)
        .bind(cpf)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, UNIQUE_FIELDS))
    }

    async fn set_accepted(&self, cpf: &str, accepted: bool) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET accepted = $1, updated_at = NOW() WHERE cpf = $2 RETURNING *",
        )
        .bind(accepted)
        .bind(cpf)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete(&self, cpf: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE cpf = $1")
            .bind(cpf)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
