// src/services/process_service.rs

use chrono::Utc;
use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::{FlowRepository, ProcessRepository, StageRepository, UnitRepository},
    models::process::{
        AdvanceStagePayload, CreateProcessPayload, HistoryChange, NewProcess, Process,
        ProcessFilter, TransitionOutcome,
    },
};

#[derive(Clone)]
pub struct ProcessService {
    processes: Arc<dyn ProcessRepository>,
    flows: Arc<dyn FlowRepository>,
    stages: Arc<dyn StageRepository>,
    units: Arc<dyn UnitRepository>,
}

impl ProcessService {
    pub fn new(
        processes: Arc<dyn ProcessRepository>,
        flows: Arc<dyn FlowRepository>,
        stages: Arc<dyn StageRepository>,
        units: Arc<dyn UnitRepository>,
    ) -> Self {
        Self { processes, flows, stages, units }
    }

    /// Abre o processo na primeira etapa do fluxo, com histórico vazio.
    pub async fn create_process(&self, payload: &CreateProcessPayload) -> Result<Process, AppError> {
        let flow = self
            .flows
            .find_by_id(payload.flow_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Fluxo {}", payload.flow_id)))?;
        if self.units.find_by_id(payload.unit_id).await?.is_none() {
            return Err(AppError::not_found(format!("Unidade {}", payload.unit_id)));
        }
        if flow.header.unit_id != payload.unit_id {
            return Err(AppError::InvalidInput(format!(
                "O fluxo {} não pertence à unidade {}.",
                payload.flow_id, payload.unit_id
            )));
        }

        let process = self
            .processes
            .create(&NewProcess {
                record: payload.record.clone(),
                nickname: payload.nickname.clone(),
                current_stage_id: flow.first_stage(),
                flow_id: payload.flow_id,
                unit_id: payload.unit_id,
            })
            .await?;

        tracing::info!("Processo {} aberto no fluxo {}", process.record, flow.id());
        Ok(process)
    }

    pub async fn get_process(&self, record: &str) -> Result<Process, AppError> {
        self.processes
            .find_by_record(record)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Processo {}", record)))
    }

    pub async fn list_processes(&self, filter: ProcessFilter) -> Result<Vec<Process>, AppError> {
        self.processes.find_all(filter).await
    }

    /// Avança (ou anota) o processo. Qualquer etapa existente é aceita:
    /// não há bloqueio para voltar ou pular etapas.
    pub async fn advance(
        &self,
        record: &str,
        payload: AdvanceStagePayload,
    ) -> Result<Process, AppError> {
        if self.stages.find_by_id(payload.to).await?.is_none() {
            return Err(AppError::not_found(format!("Etapa {}", payload.to)));
        }

        let change = HistoryChange::Advance {
            to: payload.to,
            from: payload.from,
            observation: payload.observation,
            at: Utc::now(),
        };
        let update = self
            .processes
            .modify_history(record, change)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Processo {}", record)))?;

        match update.outcome {
            Some(TransitionOutcome::Appended) => {
                tracing::info!("Processo {} avançou para a etapa {}", record, payload.to)
            }
            _ => tracing::info!("Processo {}: observação da etapa {} atualizada", record, payload.to),
        }
        Ok(update.process)
    }

    /// Edita só a observação de uma passagem já registrada.
    pub async fn update_observation(
        &self,
        record: &str,
        stage_id_to: i32,
        observation: Option<String>,
    ) -> Result<Process, AppError> {
        let update = self
            .processes
            .modify_history(record, HistoryChange::Observation { stage_id_to, observation })
            .await?
            .ok_or_else(|| AppError::not_found(format!("Processo {}", record)))?;

        if update.outcome.is_none() {
            return Err(AppError::not_found(format!(
                "Passagem pela etapa {} no processo {}",
                stage_id_to, record
            )));
        }
        Ok(update.process)
    }

    pub async fn update_nickname(
        &self,
        record: &str,
        nickname: Option<&str>,
    ) -> Result<Process, AppError> {
        self.processes
            .update_nickname(record, nickname)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Processo {}", record)))
    }

    pub async fn set_archived(&self, record: &str, archived: bool) -> Result<Process, AppError> {
        self.processes
            .set_archived(record, archived)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Processo {}", record)))
    }

    pub async fn delete_process(&self, record: &str) -> Result<(), AppError> {
        if !self.processes.delete(record).await? {
            return Err(AppError::not_found(format!("Processo {}", record)));
        }
        tracing::warn!("Processo {} removido", record);
        Ok(())
    }
}
