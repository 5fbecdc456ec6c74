// src/models/role.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i32,
    pub name: String,
    // Quanto maior, mais privilégios (ex: 1 = servidor, 5 = administrador)
    pub access_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RolePayload {
    #[validate(length(min = 1, message = "O nome do cargo é obrigatório."))]
    pub name: String,
    #[validate(range(min = 0, message = "O nível de acesso não pode ser negativo."))]
    pub access_level: i32,
}
