// src/services/flow_service.rs

use std::{collections::HashSet, sync::Arc};

use crate::{
    common::error::AppError,
    db::{FlowRepository, StageRepository, UnitRepository, UserRepository},
    models::flow::{Flow, FlowDetail, FlowFilter, FlowPayload, Sequence},
};

#[derive(Clone)]
pub struct FlowService {
    flows: Arc<dyn FlowRepository>,
    stages: Arc<dyn StageRepository>,
    units: Arc<dyn UnitRepository>,
    users: Arc<dyn UserRepository>,
}

impl FlowService {
    pub fn new(
        flows: Arc<dyn FlowRepository>,
        stages: Arc<dyn StageRepository>,
        units: Arc<dyn UnitRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { flows, stages, units, users }
    }

    pub async fn create_flow(&self, payload: FlowPayload) -> Result<FlowDetail, AppError> {
        let payload = self.check_payload(payload).await?;
        let flow = self.flows.create(&payload).await?;
        tracing::info!("Fluxo {} criado com {} etapas", flow.id(), flow.stages.len());
        Ok(flow.into())
    }

    pub async fn update_flow(&self, id: i32, payload: FlowPayload) -> Result<FlowDetail, AppError> {
        let payload = self.check_payload(payload).await?;
        self.flows
            .update(id, &payload)
            .await?
            .map(FlowDetail::from)
            .ok_or_else(|| AppError::not_found(format!("Fluxo {}", id)))
    }

    pub async fn get_flow(&self, id: i32) -> Result<FlowDetail, AppError> {
        Ok(self.find(id).await?.into())
    }

    pub async fn list_flows(&self, filter: FlowFilter) -> Result<Vec<FlowDetail>, AppError> {
        let flows = self.flows.find_all(filter).await?;
        Ok(flows.into_iter().map(FlowDetail::from).collect())
    }

    pub async fn list_sequences(&self, id: i32) -> Result<Vec<Sequence>, AppError> {
        Ok(self.find(id).await?.sequences())
    }

    pub async fn delete_flow(&self, id: i32) -> Result<(), AppError> {
        if !self.flows.delete(id).await? {
            return Err(AppError::not_found(format!("Fluxo {}", id)));
        }
        Ok(())
    }

    /// Remove a etapa do fluxo. Associação inexistente = 404, nunca erro interno.
    /// O fluxo continua com pelo menos duas etapas.
    pub async fn remove_stage(&self, flow_id: i32, stage_id: i32) -> Result<(), AppError> {
        let flow = self.find(flow_id).await?;
        if !flow.stages.contains(&stage_id) {
            return Err(missing_stage(flow_id, stage_id));
        }
        if flow.stages.len() <= 2 {
            return Err(AppError::InvalidInput(
                "Um fluxo precisa de pelo menos duas etapas.".into(),
            ));
        }

        if !self.flows.remove_stage(flow_id, stage_id).await? {
            return Err(missing_stage(flow_id, stage_id));
        }
        tracing::info!("Etapa {} removida do fluxo {}", stage_id, flow_id);
        Ok(())
    }

    pub async fn add_notify_user(&self, flow_id: i32, cpf: &str) -> Result<FlowDetail, AppError> {
        self.find(flow_id).await?;
        if self.users.find_by_id(cpf).await?.is_none() {
            return Err(AppError::not_found(format!("Usuário {}", cpf)));
        }
        self.flows.add_notify_user(flow_id, cpf).await?;
        self.get_flow(flow_id).await
    }

    pub async fn remove_notify_user(&self, flow_id: i32, cpf: &str) -> Result<(), AppError> {
        if !self.flows.remove_notify_user(flow_id, cpf).await? {
            return Err(AppError::not_found(format!(
                "Usuário {} no fluxo {}",
                cpf, flow_id
            )));
        }
        Ok(())
    }

    async fn find(&self, id: i32) -> Result<Flow, AppError> {
        self.flows
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Fluxo {}", id)))
    }

    // Regras que o `validator` não cobre: etapas repetidas e ids inexistentes.
    async fn check_payload(&self, mut payload: FlowPayload) -> Result<FlowPayload, AppError> {
        if payload.stages.len() < 2 {
            return Err(AppError::InvalidInput(
                "Um fluxo precisa de pelo menos duas etapas.".into(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(repeated) = payload.stages.iter().find(|id| !seen.insert(**id)) {
            return Err(AppError::InvalidInput(format!(
                "A etapa {} aparece mais de uma vez no fluxo.",
                repeated
            )));
        }

        if self.units.find_by_id(payload.unit_id).await?.is_none() {
            return Err(AppError::not_found(format!("Unidade {}", payload.unit_id)));
        }
        for stage_id in &payload.stages {
            if self.stages.find_by_id(*stage_id).await?.is_none() {
                return Err(AppError::not_found(format!("Etapa {}", stage_id)));
            }
        }

        payload.notify_users.sort();
        payload.notify_users.dedup();
        for cpf in &payload.notify_users {
            if self.users.find_by_id(cpf).await?.is_none() {
                return Err(AppError::not_found(format!("Usuário {}", cpf)));
            }
        }

        Ok(payload)
    }
}

fn missing_stage(flow_id: i32, stage_id: i32) -> AppError {
    AppError::not_found(format!("Etapa {} no fluxo {}", stage_id, flow_id))
}
