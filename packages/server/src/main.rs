use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use server::config::AppConfig;
use server::sandbox::SandboxClient;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = server::database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected");

    let executor = Arc::new(SandboxClient::new(config.sandbox.clone()));
    info!(sandbox_url = %config.sandbox.url, "Sandbox client ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        executor,
        config,
    };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
