// src/handlers/notifications.rs

use axum::{extract::State, Json};

use crate::{common::error::AppError, config::AppState, models::digest::DigestOutcome};

// POST /api/notifications/overdue
// Disparado por um agendador externo (cron) ou manualmente.
pub async fn send_overdue_digest(
    State(app_state): State<AppState>,
) -> Result<Json<DigestOutcome>, AppError> {
    let outcome = app_state.digest_service.send_overdue_digest().await?;
    Ok(Json(outcome))
}
