//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use processos::{
    config::{AppState, Config},
    routes::build_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let (app_state, db_pool) = AppState::connect(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = build_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
