// src/handlers/roles.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{common::error::AppError, config::AppState, models::role::RolePayload};

// GET /api/roles
pub async fn list_roles(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let roles = app_state.repos.roles.find_all().await?;
    Ok(Json(roles))
}

pub async fn get_role(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let role = app_state
        .repos
        .roles
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Cargo {}", id)))?;
    Ok(Json(role))
}

// POST /api/roles
pub async fn create_role(
    State(app_state): State<AppState>,
    Json(payload): Json<RolePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let role = app_state.repos.roles.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update_role(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<RolePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let role = app_state
        .repos
        .roles
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Cargo {}", id)))?;
    Ok(Json(role))
}

pub async fn delete_role(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if !app_state.repos.roles.delete(id).await? {
        return Err(AppError::not_found(format!("Cargo {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
