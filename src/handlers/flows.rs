// src/handlers/flows.rs

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
    models::flow::{FlowFilter, FlowPayload, NotifyUserPayload},
};

// GET /api/flows?unitId=1
pub async fn list_flows(
    State(app_state): State<AppState>,
    Query(filter): Query<FlowFilter>,
) -> Result<impl IntoResponse, AppError> {
    let flows = app_state.flow_service.list_flows(filter).await?;
    Ok(Json(flows))
}

pub async fn get_flow(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let flow = app_state.flow_service.get_flow(id).await?;
    Ok(Json(flow))
}

// POST /api/flows
pub async fn create_flow(
    State(app_state): State<AppState>,
    Json(payload): Json<FlowPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let flow = app_state.flow_service.create_flow(payload).await?;
    Ok((StatusCode::CREATED, Json(flow)))
}

pub async fn update_flow(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<FlowPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let flow = app_state.flow_service.update_flow(id, payload).await?;
    Ok(Json(flow))
}

pub async fn delete_flow(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.flow_service.delete_flow(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/flows/{id}/sequences
pub async fn list_sequences(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let sequences = app_state.flow_service.list_sequences(id).await?;
    Ok(Json(sequences))
}

// DELETE /api/flows/{id}/stages/{stage_id}
pub async fn remove_stage(
    State(app_state): State<AppState>,
    Path((id, stage_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    app_state.flow_service.remove_stage(id, stage_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/flows/{id}/notify-users
pub async fn add_notify_user(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<NotifyUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let flow = app_state.flow_service.add_notify_user(id, &payload.cpf).await?;
    Ok(Json(flow))
}

pub async fn remove_notify_user(
    State(app_state): State<AppState>,
    Path((id, cpf)): Path<(i32, String)>,
) -> Result<impl IntoResponse, AppError> {
    app_state.flow_service.remove_notify_user(id, &cpf).await?;
    Ok(StatusCode::NO_CONTENT)
}
