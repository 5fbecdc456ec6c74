// src/models/note.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// Anotação livre vinculada a um processo (e opcionalmente a uma etapa)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i32,
    pub process_record: String,
    pub stage_id: Option<i32>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotePayload {
    #[validate(length(min = 1, message = "O registro do processo é obrigatório."))]
    pub process_record: String,
    pub stage_id: Option<i32>,
    #[validate(length(min = 1, message = "A anotação não pode ser vazia."))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotePayload {
    #[validate(length(min = 1, message = "A anotação não pode ser vazia."))]
    pub content: String,
}
