// src/handlers/users.rs

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
    models::auth::{UpdateUserPayload, UserFilter},
};

// GET /api/users?unitId=1&accepted=false
pub async fn list_users(
    State(app_state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.repos.users.find_all(filter).await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(app_state): State<AppState>,
    Path(cpf): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = app_state
        .repos
        .users
        .find_by_id(&cpf)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Usuário {}", cpf)))?;
    Ok(Json(user))
}

pub async fn update_user(
    State(app_state): State<AppState>,
    Path(cpf): Path<String>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if app_state.repos.units.find_by_id(payload.unit_id).await?.is_none() {
        return Err(AppError::not_found(format!("Unidade {}", payload.unit_id)));
    }
    if app_state.repos.roles.find_by_id(payload.role_id).await?.is_none() {
        return Err(AppError::not_found(format!("Cargo {}", payload.role_id)));
    }
    let user = app_state
        .repos
        .users
        .update(&cpf, &payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Usuário {}", cpf)))?;
    Ok(Json(user))
}

// PUT /api/users/{cpf}/accept : libera o login de um cadastro pendente
pub async fn accept_user(
    State(app_state): State<AppState>,
    Path(cpf): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = app_state
        .repos
        .users
        .set_accepted(&cpf, true)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Usuário {}", cpf)))?;
    tracing::info!("Usuário {} aceito", cpf);
    Ok(Json(user))
}

pub async fn delete_user(
    State(app_state): State<AppState>,
    Path(cpf): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !app_state.repos.users.delete(&cpf).await? {
        return Err(AppError::not_found(format!("Usuário {}", cpf)));
    }
    Ok(StatusCode::NO_CONTENT)
}
