use anyhow::Result;
use course_advisor::commands;
use course_advisor::config::{AppConfig, LogFormat};
use course_advisor::state::AppState;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.trim().to_ascii_lowercase()));

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(None)?;
    init_logging(&config);

    let state = AppState::init(&config)?;
    let shutdown = state.shutdown.clone();

    let address = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        model = %config.model.model_id,
        session_backend = ?config.session.backend,
        "course advisor listening"
    );

    axum::serve(listener, commands::router(state))
        .with_graceful_shutdown(async move {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(
                    event_name = "system.server.signal_error",
                    error = %error,
                    "failed to listen for shutdown signal"
                );
            }
            tracing::info!(event_name = "system.server.stopping", "course advisor stopping");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
