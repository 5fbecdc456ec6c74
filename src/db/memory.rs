// src/db/memory.rs
//
// Implementação em memória de todos os repositórios, usada nos testes.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        FlowRepository, NoteRepository, ProcessRepository, Repositories, RoleRepository,
        StageRepository, UnitRepository, UserRepository,
    },
    models::{
        auth::{NewUser, UpdateUserPayload, User, UserFilter},
        digest::OverdueRow,
        flow::{Flow, FlowFilter, FlowPayload, FlowRow},
        note::{CreateNotePayload, Note},
        process::{HistoryChange, HistoryUpdate, NewProcess, Process, ProcessFilter},
        role::{Role, RolePayload},
        stage::{Stage, StageFilter, StagePayload},
        unit::{Unit, UnitPayload},
    },
};

#[derive(Default)]
struct State {
    next_id: i32,
    units: Vec<Unit>,
    roles: Vec<Role>,
    users: Vec<User>,
    stages: Vec<Stage>,
    flows: Vec<Flow>,
    processes: Vec<Process>,
    notes: Vec<Note>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            units: Arc::new(self.clone()),
            roles: Arc::new(self.clone()),
            users: Arc::new(self.clone()),
            stages: Arc::new(self.clone()),
            flows: Arc::new(self.clone()),
            processes: Arc::new(self.clone()),
            notes: Arc::new(self.clone()),
        }
    }

    /// Sobrescreve um processo inteiro (útil para "envelhecer" datas nos testes).
    pub async fn put_process(&self, process: Process) {
        let mut state = self.state.write().await;
        state.processes.retain(|p| p.record != process.record);
        state.processes.push(process);
    }
}

fn duplicated(message: &str) -> AppError {
    AppError::UniqueConstraintViolation(message.to_string())
}

#[async_trait]
impl UnitRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Unit>, AppError> {
        Ok(self.state.read().await.units.iter().find(|u| u.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Unit>, AppError> {
        Ok(self.state.read().await.units.clone())
    }

    async fn create(&self, input: &UnitPayload) -> Result<Unit, AppError> {
        let mut state = self.state.write().await;
        if state.units.iter().any(|u| u.name == input.name) {
            return Err(duplicated("Já existe uma unidade com esse nome."));
        }
        let now = Utc::now();
        let unit = Unit { id: state.next_id(), name: input.name.clone(), created_at: now, updated_at: now };
        state.units.push(unit.clone());
        Ok(unit)
    }

    async fn update(&self, id: i32, input: &UnitPayload) -> Result<Option<Unit>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.units.iter_mut().find(|u| u.id == id).map(|u| {
            u.name = input.name.clone();
            u.updated_at = Utc::now();
            u.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.units.len();
        state.units.retain(|u| u.id != id);
        Ok(state.units.len() != before)
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Role>, AppError> {
        Ok(self.state.read().await.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Role>, AppError> {
        Ok(self.state.read().await.roles.clone())
    }

    async fn create(&self, input: &RolePayload) -> Result<Role, AppError> {
        let mut state = self.state.write().await;
        if state.roles.iter().any(|r| r.name == input.name) {
            return Err(duplicated("Já existe um cargo com esse nome."));
        }
        let now = Utc::now();
        let role = Role {
            id: state.next_id(),
            name: input.name.clone(),
            access_level: input.access_level,
            created_at: now,
            updated_at: now,
        };
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn update(&self, id: i32, input: &RolePayload) -> Result<Option<Role>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.roles.iter_mut().find(|r| r.id == id).map(|r| {
            r.name = input.name.clone();
            r.access_level = input.access_level;
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.roles.len();
        state.roles.retain(|r| r.id != id);
        Ok(state.roles.len() != before)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, cpf: &str) -> Result<Option<User>, AppError> {
        Ok(self.state.read().await.users.iter().find(|u| u.cpf == cpf).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.state.read().await.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_all(&self, filter: UserFilter) -> Result<Vec<User>, AppError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .iter()
            .filter(|u| filter.unit_id.is_none_or(|id| u.unit_id == id))
            .filter(|u| filter.accepted.is_none_or(|a| u.accepted == a))
            .cloned()
            .collect())
    }

    async fn create(&self, input: &NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.cpf == input.cpf) {
            return Err(duplicated("Este CPF já está cadastrado."));
        }
        if state.users.iter().any(|u| u.email == input.email) {
            return Err(duplicated("Este e-mail já está em uso."));
        }
        let now = Utc::now();
        let user = User {
            cpf: input.cpf.clone(),
            full_name: input.full_name.clone(),
            email: input.email.clone(),
            password: input.password_hash.clone(),
            accepted: false,
            unit_id: input.unit_id,
            role_id: input.role_id,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, cpf: &str, input: &UpdateUserPayload) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == input.email && u.cpf != cpf) {
            return Err(duplicated("Este e-mail já está em uso."));
        }
        Ok(state.users.iter_mut().find(|u| u.cpf == cpf).map(|u| {
            u.full_name = input.full_name.clone();
            u.email = input.email.clone();
            u.unit_id = input.unit_id;
            u.role_id = input.role_id;
            u.updated_at = Utc::now();
            u.clone()
        }))
    }

    async fn set_accepted(&self, cpf: &str, accepted: bool) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.users.iter_mut().find(|u| u.cpf == cpf).map(|u| {
            u.accepted = accepted;
            u.clone()
        }))
    }

    async fn delete(&self, cpf: &str) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.users.len();
        state.users.retain(|u| u.cpf != cpf);
        for flow in state.flows.iter_mut() {
            flow.notify_users.retain(|c| c != cpf);
        }
        Ok(state.users.len() != before)
    }
}

#[async_trait]
impl StageRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Stage>, AppError> {
        Ok(self.state.read().await.stages.iter().find(|s| s.id == id).cloned())
    }

    async fn find_all(&self, filter: StageFilter) -> Result<Vec<Stage>, AppError> {
        Ok(self
            .state
            .read()
            .await
            .stages
            .iter()
            .filter(|s| filter.unit_id.is_none_or(|id| s.unit_id == id))
            .cloned()
            .collect())
    }

    async fn create(&self, input: &StagePayload) -> Result<Stage, AppError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let stage = Stage {
            id: state.next_id(),
            name: input.name.clone(),
            unit_id: input.unit_id,
            duration: input.duration,
            created_at: now,
            updated_at: now,
        };
        state.stages.push(stage.clone());
        Ok(stage)
    }

    async fn update(&self, id: i32, input: &StagePayload) -> Result<Option<Stage>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.stages.iter_mut().find(|s| s.id == id).map(|s| {
            s.name = input.name.clone();
            s.unit_id = input.unit_id;
            s.duration = input.duration;
            s.updated_at = Utc::now();
            s.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.stages.len();
        state.stages.retain(|s| s.id != id);
        Ok(state.stages.len() != before)
    }
}

#[async_trait]
impl FlowRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Flow>, AppError> {
        Ok(self.state.read().await.flows.iter().find(|f| f.id() == id).cloned())
    }

    async fn find_all(&self, filter: FlowFilter) -> Result<Vec<Flow>, AppError> {
        Ok(self
            .state
            .read()
            .await
            .flows
            .iter()
            .filter(|f| filter.unit_id.is_none_or(|id| f.header.unit_id == id))
            .cloned()
            .collect())
    }

    async fn create(&self, input: &FlowPayload) -> Result<Flow, AppError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let flow = Flow {
            header: FlowRow {
                id: state.next_id(),
                name: input.name.clone(),
                unit_id: input.unit_id,
                created_at: now,
                updated_at: now,
            },
            stages: input.stages.clone(),
            notify_users: input.notify_users.clone(),
        };
        state.flows.push(flow.clone());
        Ok(flow)
    }

    async fn update(&self, id: i32, input: &FlowPayload) -> Result<Option<Flow>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.flows.iter_mut().find(|f| f.id() == id).map(|f| {
            f.header.name = input.name.clone();
            f.header.unit_id = input.unit_id;
            f.header.updated_at = Utc::now();
            f.stages = input.stages.clone();
            f.notify_users = input.notify_users.clone();
            f.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.flows.len();
        state.flows.retain(|f| f.id() != id);
        Ok(state.flows.len() != before)
    }

    async fn remove_stage(&self, flow_id: i32, stage_id: i32) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let Some(flow) = state.flows.iter_mut().find(|f| f.id() == flow_id) else {
            return Ok(false);
        };
        if flow.stages.len() <= 2 {
            return Ok(false);
        }
        let before = flow.stages.len();
        flow.stages.retain(|s| *s != stage_id);
        Ok(flow.stages.len() != before)
    }

    async fn add_notify_user(&self, flow_id: i32, cpf: &str) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if let Some(flow) = state.flows.iter_mut().find(|f| f.id() == flow_id) {
            if !flow.notify_users.iter().any(|c| c == cpf) {
                flow.notify_users.push(cpf.to_string());
            }
        }
        Ok(())
    }

    async fn remove_notify_user(&self, flow_id: i32, cpf: &str) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let Some(flow) = state.flows.iter_mut().find(|f| f.id() == flow_id) else {
            return Ok(false);
        };
        let before = flow.notify_users.len();
        flow.notify_users.retain(|c| c != cpf);
        Ok(flow.notify_users.len() != before)
    }
}

#[async_trait]
impl ProcessRepository for MemoryStore {
    async fn find_by_record(&self, record: &str) -> Result<Option<Process>, AppError> {
        Ok(self.state.read().await.processes.iter().find(|p| p.record == record).cloned())
    }

    async fn find_all(&self, filter: ProcessFilter) -> Result<Vec<Process>, AppError> {
        Ok(self
            .state
            .read()
            .await
            .processes
            .iter()
            .filter(|p| filter.flow_id.is_none_or(|id| p.flow_id == id))
            .filter(|p| filter.unit_id.is_none_or(|id| p.unit_id == id))
            .filter(|p| filter.archived.is_none_or(|a| p.archived == a))
            .cloned()
            .collect())
    }

    async fn create(&self, input: &NewProcess) -> Result<Process, AppError> {
        let mut state = self.state.write().await;
        if state.processes.iter().any(|p| p.record == input.record) {
            return Err(duplicated("Já existe um processo com esse registro."));
        }
        let now = Utc::now();
        let process = Process {
            id: Uuid::new_v4(),
            record: input.record.clone(),
            nickname: input.nickname.clone(),
            current_stage_id: input.current_stage_id,
            archived: false,
            stage_history: vec![],
            flow_id: input.flow_id,
            unit_id: input.unit_id,
            created_at: now,
            updated_at: now,
        };
        state.processes.push(process.clone());
        Ok(process)
    }

    async fn update_nickname(
        &self,
        record: &str,
        nickname: Option<&str>,
    ) -> Result<Option<Process>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.processes.iter_mut().find(|p| p.record == record).map(|p| {
            p.nickname = nickname.map(str::to_string);
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn modify_history(
        &self,
        record: &str,
        change: HistoryChange,
    ) -> Result<Option<HistoryUpdate>, AppError> {
        // A trava de escrita cobre leitura e gravação
        let mut state = self.state.write().await;
        let Some(process) = state.processes.iter_mut().find(|p| p.record == record) else {
            return Ok(None);
        };
        let outcome = process.apply(change);
        if outcome.is_some() {
            process.updated_at = Utc::now();
        }
        Ok(Some(HistoryUpdate { process: process.clone(), outcome }))
    }

    async fn set_archived(&self, record: &str, archived: bool) -> Result<Option<Process>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.processes.iter_mut().find(|p| p.record == record).map(|p| {
            p.archived = archived;
            p.clone()
        }))
    }

    async fn delete(&self, record: &str) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.processes.len();
        state.processes.retain(|p| p.record != record);
        state.notes.retain(|n| n.process_record != record);
        Ok(state.processes.len() != before)
    }

    async fn find_overdue(&self) -> Result<Vec<OverdueRow>, AppError> {
        let state = self.state.read().await;
        let now = Utc::now();
        let mut rows = Vec::new();

        for process in state.processes.iter().filter(|p| !p.archived) {
            let Some(stage) = process
                .current_stage_id
                .and_then(|id| state.stages.iter().find(|s| s.id == id))
            else {
                continue;
            };
            let Some(flow) = state.flows.iter().find(|f| f.id() == process.flow_id) else {
                continue;
            };
            let entered_at = process.entered_current_stage_at();
            if entered_at + chrono::Duration::days(i64::from(stage.duration)) >= now {
                continue;
            }
            for user in flow
                .notify_users
                .iter()
                .filter_map(|cpf| state.users.iter().find(|u| &u.cpf == cpf))
            {
                rows.push(OverdueRow {
                    record: process.record.clone(),
                    nickname: process.nickname.clone(),
                    stage_name: stage.name.clone(),
                    flow_name: flow.header.name.clone(),
                    duration: stage.duration,
                    entered_at,
                    email: user.email.clone(),
                    full_name: user.full_name.clone(),
                });
            }
        }
        // mesma ordem do ORDER BY u.email, c.entered_at
        rows.sort_by(|a, b| a.email.cmp(&b.email).then(a.entered_at.cmp(&b.entered_at)));
        Ok(rows)
    }
}

#[async_trait]
impl NoteRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Note>, AppError> {
        Ok(self.state.read().await.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn find_by_process(&self, record: &str) -> Result<Vec<Note>, AppError> {
        Ok(self
            .state
            .read()
            .await
            .notes
            .iter()
            .filter(|n| n.process_record == record)
            .cloned()
            .collect())
    }

    async fn create(&self, input: &CreateNotePayload) -> Result<Note, AppError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let note = Note {
            id: state.next_id(),
            process_record: input.process_record.clone(),
            stage_id: input.stage_id,
            content: input.content.clone(),
            created_at: now,
            updated_at: now,
        };
        state.notes.push(note.clone());
        Ok(note)
    }

    async fn update(&self, id: i32, content: &str) -> Result<Option<Note>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.notes.iter_mut().find(|n| n.id == id).map(|n| {
            n.content = content.to_string();
            n.updated_at = Utc::now();
            n.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.notes.len();
        state.notes.retain(|n| n.id != id);
        Ok(state.notes.len() != before)
    }
}
