use anyhow::Context;
use farefinder_api::{airlines::AirlineLookup, app, sessions::SessionRegistry, AppState};
use farefinder_infra::app_config::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "farefinder_api=debug,farefinder_search=debug,farefinder_infra=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting FareFinder API on port {}", config.server.port);

    let providers = farefinder_infra::flight_providers(&config).context("Failed to build flight providers")?;
    let directory = farefinder_infra::airline_directory(&config).context("Failed to build airline directory")?;

    let idle_ttl = config
        .sessions
        .idle_ttl()
        .with_context(|| format!("sessions.idle_ttl_seconds out of range: {}", config.sessions.idle_ttl_seconds))?;
    let sessions = Arc::new(SessionRegistry::new(providers, idle_ttl).context("Failed to create session registry")?);

    // Background idle-session sweeper
    sessions
        .clone()
        .spawn_sweeper(Duration::from_secs(config.sessions.sweep_interval_seconds.max(1)));

    let app_state = AppState {
        sessions,
        airlines: Arc::new(AirlineLookup::new(directory)),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
