// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, path::PathBuf, sync::Arc, time::Duration};

use crate::{
    db::Repositories,
    services::{
        auth::AuthService,
        digest_service::DigestService,
        flow_service::FlowService,
        mail::{MailTransport, SmtpMailer},
        process_service::ProcessService,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub smtp: Option<SmtpConfig>,
    pub mail_assets_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let mail_assets_dir = env::var("MAIL_ASSETS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("assets/email"));

        // Sem senha do remetente, o resumo de atrasos fica desligado.
        let smtp = match env::var("SMTP_PASSWORD").ok().filter(|p| !p.is_empty()) {
            Some(password) => {
                let user = env::var("SMTP_USER").context("SMTP_USER deve ser definido junto com SMTP_PASSWORD")?;
                Some(SmtpConfig {
                    host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
                    from: env::var("MAIL_FROM").unwrap_or_else(|_| user.clone()),
                    user,
                    password,
                })
            }
            None => None,
        };

        Ok(Self { database_url, jwt_secret, bind_addr, smtp, mail_assets_dir })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub auth_service: AuthService,
    pub flow_service: FlowService,
    pub process_service: ProcessService,
    pub digest_service: DigestService,
}

impl AppState {
    /// Conecta ao banco e monta o gráfico de dependências de produção.
    pub async fn connect(config: &Config) -> anyhow::Result<(Self, PgPool)> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let mailer: Option<Arc<dyn MailTransport>> = match &config.smtp {
            Some(smtp) => {
                let mailer = SmtpMailer::new(&smtp.host, &smtp.user, &smtp.password, &smtp.from)?;
                Some(Arc::new(mailer) as Arc<dyn MailTransport>)
            }
            None => {
                tracing::warn!("SMTP_PASSWORD não definida: resumo de atrasos desativado");
                None
            }
        };

        let state = Self::from_parts(
            Repositories::postgres(db_pool.clone()),
            config.jwt_secret.clone(),
            mailer,
            config.mail_assets_dir.clone(),
        );
        Ok((state, db_pool))
    }

    pub fn from_parts(
        repos: Repositories,
        jwt_secret: String,
        mailer: Option<Arc<dyn MailTransport>>,
        mail_assets_dir: PathBuf,
    ) -> Self {
        let auth_service = AuthService::new(
            repos.users.clone(),
            repos.units.clone(),
            repos.roles.clone(),
            jwt_secret,
        );
        let flow_service = FlowService::new(
            repos.flows.clone(),
            repos.stages.clone(),
            repos.units.clone(),
            repos.users.clone(),
        );
        let process_service = ProcessService::new(
            repos.processes.clone(),
            repos.flows.clone(),
            repos.stages.clone(),
            repos.units.clone(),
        );
        let digest_service = DigestService::new(repos.processes.clone(), mailer, mail_assets_dir);

        Self { repos, auth_service, flow_service, process_service, digest_service }
    }
}
