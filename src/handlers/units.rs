// src/handlers/units.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{common::error::AppError, config::AppState, models::unit::UnitPayload};

pub async fn list_units(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let units = app_state.repos.units.find_all().await?;
    Ok(Json(units))
}

pub async fn get_unit(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let unit = app_state
        .repos
        .units
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Unidade {}", id)))?;
    Ok(Json(unit))
}

pub async fn create_unit(
    State(app_state): State<AppState>,
    Json(payload): Json<UnitPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let unit = app_state.repos.units.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

pub async fn update_unit(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UnitPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let unit = app_state
        .repos
        .units
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Unidade {}", id)))?;
    Ok(Json(unit))
}

pub async fn delete_unit(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if !app_state.repos.units.delete(id).await? {
        return Err(AppError::not_found(format!("Unidade {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
