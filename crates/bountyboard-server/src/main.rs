use tracing_subscriber::EnvFilter;

use bountyboard_server::config::ServerConfig;
use bountyboard_server::handlers;
use bountyboard_server::state::AppState;
use bountyboard_server::tasks;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        bind_addr = %config.bind_addr,
        registry_url = %config.registry_url,
        "starting bountyboard"
    );

    let state = AppState::new(config.clone())?;
    tasks::spawn(&state);

    let app = handlers::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
