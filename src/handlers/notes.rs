// src/handlers/notes.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::note::{CreateNotePayload, UpdateNotePayload},
};

// GET /api/processes/{record}/notes
pub async fn list_process_notes(
    State(app_state): State<AppState>,
    Path(record): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // 404 se o processo não existe, lista vazia se só não tem notas
    app_state.process_service.get_process(&record).await?;
    let notes = app_state.repos.notes.find_by_process(&record).await?;
    Ok(Json(notes))
}

pub async fn get_note(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let note = app_state
        .repos
        .notes
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Nota {}", id)))?;
    Ok(Json(note))
}

// POST /api/notes
pub async fn create_note(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateNotePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    app_state.process_service.get_process(&payload.process_record).await?;
    if let Some(stage_id) = payload.stage_id {
        if app_state.repos.stages.find_by_id(stage_id).await?.is_none() {
            return Err(AppError::not_found(format!("Etapa {}", stage_id)));
        }
    }
    let note = app_state.repos.notes.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateNotePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let note = app_state
        .repos
        .notes
        .update(id, &payload.content)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Nota {}", id)))?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if !app_state.repos.notes.delete(id).await? {
        return Err(AppError::not_found(format!("Nota {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
