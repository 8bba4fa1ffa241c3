use anyhow::Context;
use group_stage::server::{AppState, ServiceConfig, build_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "group_stage=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env().context("reading configuration")?;
    match &config.state_dir {
        Some(dir) => tracing::info!(state_dir = %dir.display(), "Sessions are file-backed"),
        None => tracing::info!("Sessions are held in memory only"),
    }

    let app = build_router(AppState::from_config(&config));

    tracing::info!("listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    axum::serve(listener, app).await.context("serving HTTP")?;

    Ok(())
}
