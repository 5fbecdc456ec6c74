// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AuthResponse, LoginUserPayload, RegisterUserPayload, User},
};

// POST /api/auth/register
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state.auth_service.register_user(&payload).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

// POST /api/auth/login
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let token = app_state
        .auth_service
        .login_user(&payload.login, &payload.password)
        .await?;

    Ok(Json(AuthResponse { token }))
}

// GET /api/users/me
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}
