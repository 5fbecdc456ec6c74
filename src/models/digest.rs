// src/models/digest.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Uma linha "achatada" processo × etapa × fluxo × destinatário.
/// O mesmo processo aparece uma vez para cada usuário notificado do fluxo.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OverdueRow {
    pub record: String,
    pub nickname: Option<String>,
    pub stage_name: String,
    pub flow_name: String,
    pub duration: i32,
    pub entered_at: DateTime<Utc>,
    pub email: String,
    pub full_name: String,
}

impl OverdueRow {
    /// Dias além do prazo da etapa (nunca negativo).
    pub fn days_late(&self, now: DateTime<Utc>) -> i64 {
        ((now - self.entered_at).num_days() - i64::from(self.duration)).max(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestOutcome {
    pub sent: bool,
    pub recipients: usize,
    pub processes: usize,
}
