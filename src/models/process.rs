// src/models/process.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Uma passagem de etapa registrada no histórico do processo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTransition {
    pub stage_id_from: Option<i32>,
    pub stage_id_to: i32,
    pub observation: Option<String>,
    pub created_at: DateTime<Utc>,
}

// O histórico vive numa coluna JSONB: o processo continua sendo um "documento".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: Uuid,
    pub record: String,
    pub nickname: Option<String>,
    pub current_stage_id: Option<i32>,
    pub archived: bool,
    #[sqlx(json)]
    pub stage_history: Vec<StageTransition>,
    pub flow_id: i32,
    pub unit_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Appended,
    Annotated,
}

/// Alteração do histórico aplicada pelo repositório sobre a versão atual da linha.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryChange {
    Advance {
        to: i32,
        from: Option<i32>,
        observation: Option<String>,
        at: DateTime<Utc>,
    },
    Observation {
        stage_id_to: i32,
        observation: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct HistoryUpdate {
    pub process: Process,
    // None = passagem pela etapa inexistente; nada foi gravado
    pub outcome: Option<TransitionOutcome>,
}

impl Process {
    /// Move o processo para `to`. Se já existe entrada no histórico com esse
    /// destino, só a observação é sobrescrita (sem novo timestamp); senão,
    /// uma nova entrada é adicionada. Nunca duplica destinos.
    pub fn advance_or_annotate(
        &mut self,
        to: i32,
        from: Option<i32>,
        observation: Option<String>,
        now: DateTime<Utc>,
    ) -> TransitionOutcome {
        let outcome = match self.history_entry_mut(to) {
            Some(entry) => {
                entry.observation = observation;
                TransitionOutcome::Annotated
            }
            None => {
                self.stage_history.push(StageTransition {
                    stage_id_from: from,
                    stage_id_to: to,
                    observation,
                    created_at: now,
                });
                TransitionOutcome::Appended
            }
        };
        self.current_stage_id = Some(to);
        outcome
    }

    pub fn apply(&mut self, change: HistoryChange) -> Option<TransitionOutcome> {
        match change {
            HistoryChange::Advance { to, from, observation, at } => {
                Some(self.advance_or_annotate(to, from, observation, at))
            }
            HistoryChange::Observation { stage_id_to, observation } => {
                let entry = self.history_entry_mut(stage_id_to)?;
                entry.observation = observation;
                Some(TransitionOutcome::Annotated)
            }
        }
    }

    pub fn history_entry_mut(&mut self, to: i32) -> Option<&mut StageTransition> {
        self.stage_history.iter_mut().find(|h| h.stage_id_to == to)
    }

    /// Momento em que o processo entrou na etapa atual.
    pub fn entered_current_stage_at(&self) -> DateTime<Utc> {
        self.current_stage_id
            .and_then(|current| {
                self.stage_history
                    .iter()
                    .find(|h| h.stage_id_to == current)
                    .map(|h| h.created_at)
            })
            .unwrap_or(self.created_at)
    }
}

// Dados para abrir um processo. A etapa inicial vem do fluxo.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcessPayload {
    #[validate(length(min = 1, message = "O registro do processo é obrigatório."))]
    pub record: String,
    pub nickname: Option<String>,
    pub flow_id: i32,
    pub unit_id: i32,
}

#[derive(Debug, Clone)]
pub struct NewProcess {
    pub record: String,
    pub nickname: Option<String>,
    pub current_stage_id: Option<i32>,
    pub flow_id: i32,
    pub unit_id: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProcessPayload {
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceStagePayload {
    pub to: i32,
    pub from: Option<i32>,
    #[validate(length(max = 2000, message = "A observação deve ter no máximo 2000 caracteres."))]
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateObservationPayload {
    pub stage_id_to: i32,
    #[validate(length(max = 2000, message = "A observação deve ter no máximo 2000 caracteres."))]
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivePayload {
    pub archived: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessFilter {
    pub flow_id: Option<i32>,
    pub unit_id: Option<i32>,
    pub archived: Option<bool>,
}
