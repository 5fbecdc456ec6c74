// src/models/stage.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// Etapa: uma unidade de trabalho com prazo (em dias)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: i32,
    pub name: String,
    pub unit_id: i32,
    pub duration: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StagePayload {
    #[validate(length(min = 1, message = "O nome da etapa é obrigatório."))]
    pub name: String,
    pub unit_id: i32,
    #[validate(range(min = 0, message = "A duração não pode ser negativa."))]
    pub duration: i32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFilter {
    pub unit_id: Option<i32>,
}
