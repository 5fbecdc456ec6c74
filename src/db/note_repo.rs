// src/db/note_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::NoteRepository,
    models::note::{CreateNotePayload, Note},
};

#[derive(Clone)]
pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Note>, AppError> {
        let note = sqlx::query_as::<_, Note>("SELECT * FROM note WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(note)
    }

    async fn find_by_process(&self, record: &str) -> Result<Vec<Note>, AppError> {
        let notes = sqlx::query_as::<_, Note>(
            "SELECT * FROM note WHERE process_record = $1 ORDER BY created_at",
        )
        .bind(record)
        .fetch_all(&self.pool)
        .await?;
        Ok(notes)
    }

    async fn create(&self, input: &CreateNotePayload) -> Result<Note, AppError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO note (process_record, stage_id, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&input.process_record)
        .bind(input.stage_id)
        .bind(&input.content)
        .fetch_one(&self.pool)
        .await?;
        Ok(note)
    }

    async fn update(&self, id: i32, content: &str) -> Result<Option<Note>, AppError> {
        let note = sqlx::query_as::<_, Note>(
            "UPDATE note SET content = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(content)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(note)
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
