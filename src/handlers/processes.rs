// src/handlers/processes.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::process::{
        AdvanceStagePayload, ArchivePayload, CreateProcessPayload, ProcessFilter,
        UpdateObservationPayload, UpdateProcessPayload,
    },
};

// GET /api/processes?flowId=1&archived=false
pub async fn list_processes(
    State(app_state): State<AppState>,
    Query(filter): Query<ProcessFilter>,
) -> Result<impl IntoResponse, AppError> {
    let processes = app_state.process_service.list_processes(filter).await?;
    Ok(Json(processes))
}

pub async fn get_process(
    State(app_state): State<AppState>,
    Path(record): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let process = app_state.process_service.get_process(&record).await?;
    Ok(Json(process))
}

// POST /api/processes
pub async fn create_process(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateProcessPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let process = app_state.process_service.create_process(&payload).await?;
    Ok((StatusCode::CREATED, Json(process)))
}

pub async fn update_process(
    State(app_state): State<AppState>,
    Path(record): Path<String>,
    Json(payload): Json<UpdateProcessPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let process = app_state
        .process_service
        .update_nickname(&record, payload.nickname.as_deref())
        .await?;
    Ok(Json(process))
}

pub async fn delete_process(
    State(app_state): State<AppState>,
    Path(record): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state.process_service.delete_process(&record).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/processes/{record}/advance
pub async fn advance_process(
    State(app_state): State<AppState>,
    Path(record): Path<String>,
    Json(payload): Json<AdvanceStagePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let process = app_state.process_service.advance(&record, payload).await?;
    Ok(Json(process))
}

// PUT /api/processes/{record}/observation
pub async fn update_observation(
    State(app_state): State<AppState>,
    Path(record): Path<String>,
    Json(payload): Json<UpdateObservationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let process = app_state
        .process_service
        .update_observation(&record, payload.stage_id_to, payload.observation)
        .await?;
    Ok(Json(process))
}

// PUT /api/processes/{record}/archive
pub async fn set_archived(
    State(app_state): State<AppState>,
    Path(record): Path<String>,
    Json(payload): Json<ArchivePayload>,
) -> Result<impl IntoResponse, AppError> {
    let process = app_state
        .process_service
        .set_archived(&record, payload.archived)
        .await?;
    Ok(Json(process))
}
