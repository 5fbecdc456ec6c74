// src/handlers/stages.rs

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
    models::stage::{StageFilter, StagePayload},
};

// GET /api/stages?unitId=1
pub async fn list_stages(
    State(app_state): State<AppState>,
    Query(filter): Query<StageFilter>,
) -> Result<impl IntoResponse, AppError> {
    let stages = app_state.repos.stages.find_all(filter).await?;
    Ok(Json(stages))
}

pub async fn get_stage(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let stage = app_state
        .repos
        .stages
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Etapa {}", id)))?;
    Ok(Json(stage))
}

pub async fn create_stage(
    State(app_state): State<AppState>,
    Json(payload): Json<StagePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if app_state.repos.units.find_by_id(payload.unit_id).await?.is_none() {
        return Err(AppError::not_found(format!("Unidade {}", payload.unit_id)));
    }
    let stage = app_state.repos.stages.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(stage)))
}

pub async fn update_stage(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<StagePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if app_state.repos.units.find_by_id(payload.unit_id).await?.is_none() {
        return Err(AppError::not_found(format!("Unidade {}", payload.unit_id)));
    }
    let stage = app_state
        .repos
        .stages
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Etapa {}", id)))?;
    Ok(Json(stage))
}

pub async fn delete_stage(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if !app_state.repos.stages.delete(id).await? {
        return Err(AppError::not_found(format!("Etapa {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
