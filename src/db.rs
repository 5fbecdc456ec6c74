//! Repositórios: um trait por entidade, independente do banco.
//!
//! As implementações `Pg*` usam o `PgPool` criado uma única vez no startup.
//! Nos testes, `memory::MemoryStore` implementa todos os traits em memória.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    common::error::AppError,
    models::{
        auth::{NewUser, UpdateUserPayload, User, UserFilter},
        digest::OverdueRow,
        flow::{Flow, FlowFilter, FlowPayload},
        note::{CreateNotePayload, Note},
        process::{HistoryChange, HistoryUpdate, NewProcess, Process, ProcessFilter},
        role::{Role, RolePayload},
        stage::{Stage, StageFilter, StagePayload},
        unit::{Unit, UnitPayload},
    },
};

pub mod flow_repo;
pub mod note_repo;
pub mod process_repo;
pub mod role_repo;
pub mod stage_repo;
pub mod unit_repo;
pub mod user_repo;

#[cfg(test)]
pub mod memory;

pub use flow_repo::PgFlowRepository;
pub use note_repo::PgNoteRepository;
pub use process_repo::PgProcessRepository;
pub use role_repo::PgRoleRepository;
pub use stage_repo::PgStageRepository;
pub use unit_repo::PgUnitRepository;
pub use user_repo::PgUserRepository;

// `update` e `delete` devolvem None/false quando o id não existe;
// quem chama decide como transformar isso em 404.

#[async_trait]
pub trait UnitRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Unit>, AppError>;
    async fn find_all(&self) -> Result<Vec<Unit>, AppError>;
    async fn create(&self, input: &UnitPayload) -> Result<Unit, AppError>;
    async fn update(&self, id: i32, input: &UnitPayload) -> Result<Option<Unit>, AppError>;
    async fn delete(&self, id: i32) -> Result<bool, AppError>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Role>, AppError>;
    async fn find_all(&self) -> Result<Vec<Role>, AppError>;
    async fn create(&self, input: &RolePayload) -> Result<Role, AppError>;
    async fn update(&self, id: i32, input: &RolePayload) -> Result<Option<Role>, AppError>;
    async fn delete(&self, id: i32) -> Result<bool, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, cpf: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_all(&self, filter: UserFilter) -> Result<Vec<User>, AppError>;
    async fn create(&self, input: &NewUser) -> Result<User, AppError>;
    async fn update(&self, cpf: &str, input: &UpdateUserPayload) -> Result<Option<User>, AppError>;
    async fn set_accepted(&self, cpf: &str, accepted: bool) -> Result<Option<User>, AppError>;
    async fn delete(&self, cpf: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait StageRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Stage>, AppError>;
    async fn find_all(&self, filter: StageFilter) -> Result<Vec<Stage>, AppError>;
    async fn create(&self, input: &StagePayload) -> Result<Stage, AppError>;
    async fn update(&self, id: i32, input: &StagePayload) -> Result<Option<Stage>, AppError>;
    async fn delete(&self, id: i32) -> Result<bool, AppError>;
}

#[async_trait]
pub trait FlowRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Flow>, AppError>;
    async fn find_all(&self, filter: FlowFilter) -> Result<Vec<Flow>, AppError>;
    /// Grava o fluxo e as associações (etapas na ordem, usuários) de uma vez.
    async fn create(&self, input: &FlowPayload) -> Result<Flow, AppError>;
    async fn update(&self, id: i32, input: &FlowPayload) -> Result<Option<Flow>, AppError>;
    async fn delete(&self, id: i32) -> Result<bool, AppError>;
    async fn remove_stage(&self, flow_id: i32, stage_id: i32) -> Result<bool, AppError>;
    async fn add_notify_user(&self, flow_id: i32, cpf: &str) -> Result<(), AppError>;
    async fn remove_notify_user(&self, flow_id: i32, cpf: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ProcessRepository: Send + Sync {
    async fn find_by_record(&self, record: &str) -> Result<Option<Process>, AppError>;
    async fn find_all(&self, filter: ProcessFilter) -> Result<Vec<Process>, AppError>;
    async fn create(&self, input: &NewProcess) -> Result<Process, AppError>;
    async fn update_nickname(
        &self,
        record: &str,
        nickname: Option<&str>,
    ) -> Result<Option<Process>, AppError>;
    /// Lê, altera e grava o histórico de forma atômica. `None` = processo inexistente.
    async fn modify_history(
        &self,
        record: &str,
        change: HistoryChange,
    ) -> Result<Option<HistoryUpdate>, AppError>;
    async fn set_archived(&self, record: &str, archived: bool) -> Result<Option<Process>, AppError>;
    async fn delete(&self, record: &str) -> Result<bool, AppError>;
    /// Processos não arquivados que estouraram o prazo da etapa atual,
    /// uma linha por destinatário do fluxo.
    async fn find_overdue(&self) -> Result<Vec<OverdueRow>, AppError>;
}

#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Note>, AppError>;
    async fn find_by_process(&self, record: &str) -> Result<Vec<Note>, AppError>;
    async fn create(&self, input: &CreateNotePayload) -> Result<Note, AppError>;
    async fn update(&self, id: i32, content: &str) -> Result<Option<Note>, AppError>;
    async fn delete(&self, id: i32) -> Result<bool, AppError>;
}

/// Conjunto de repositórios injetado no `AppState`.
#[derive(Clone)]
pub struct Repositories {
    pub units: Arc<dyn UnitRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub users: Arc<dyn UserRepository>,
    pub stages: Arc<dyn StageRepository>,
    pub flows: Arc<dyn FlowRepository>,
    pub processes: Arc<dyn ProcessRepository>,
    pub notes: Arc<dyn NoteRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            units: Arc::new(PgUnitRepository::new(pool.clone())),
            roles: Arc::new(PgRoleRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            stages: Arc::new(PgStageRepository::new(pool.clone())),
            flows: Arc::new(PgFlowRepository::new(pool.clone())),
            processes: Arc::new(PgProcessRepository::new(pool.clone())),
            notes: Arc::new(PgNoteRepository::new(pool)),
        }
    }
}
