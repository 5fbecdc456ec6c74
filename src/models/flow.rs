// src/models/flow.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Linha da tabela `flow`, sem as associações.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FlowRow {
    pub id: i32,
    pub name: String,
    pub unit_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fluxo completo: etapas na ordem em que o processo deve percorrê-las
/// e os usuários que recebem o resumo de atrasos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(flatten)]
    pub header: FlowRow,
    pub stages: Vec<i32>,
    pub notify_users: Vec<String>,
}

impl Flow {
    pub fn id(&self) -> i32 {
        self.header.id
    }

    pub fn sequences(&self) -> Vec<Sequence> {
        sequences(&self.stages)
    }

    pub fn first_stage(&self) -> Option<i32> {
        self.stages.first().copied()
    }
}

/// Par adjacente de etapas de um fluxo (uma transição "esperada").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub from: i32,
    pub to: i32,
}

/// Deriva as sequências a partir da lista ordenada de etapas.
/// Serve só para exibição/validação: transições fora da ordem não são bloqueadas.
pub fn sequences(stages: &[i32]) -> Vec<Sequence> {
    stages
        .windows(2)
        .map(|pair| Sequence { from: pair[0], to: pair[1] })
        .collect()
}

// Resposta do GET /flows/{id}: fluxo + sequências calculadas
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDetail {
    #[serde(flatten)]
    pub flow: Flow,
    pub sequences: Vec<Sequence>,
}

impl From<Flow> for FlowDetail {
    fn from(flow: Flow) -> Self {
        let sequences = flow.sequences();
        Self { flow, sequences }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FlowPayload {
    #[validate(length(min = 1, message = "O nome do fluxo é obrigatório."))]
    pub name: String,
    pub unit_id: i32,
    #[validate(length(min = 2, message = "Um fluxo precisa de pelo menos duas etapas."))]
    pub stages: Vec<i32>,
    #[serde(default)]
    pub notify_users: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowFilter {
    pub unit_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotifyUserPayload {
    #[validate(length(equal = 11, message = "O CPF deve ter 11 dígitos."))]
    pub cpf: String,
}
