// src/main.rs

use tokio::net::TcpListener;
use tracing::{info, warn};

use uniai_bff::{build_app, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal in deployed environments.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let config = config::Config::from_env()?;

    if config.key_set.jwks_uri.is_none() {
        warn!("SUPABASE_JWKS_URL is not set; authenticated requests will fail");
    }
    if config.llm.api_key.is_none() {
        warn!("GROQ_API_KEY is not set; AI endpoints will return fallback answers");
    }
    if config.storage.is_none() {
        warn!("SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY is not set; signed uploads are disabled");
    }

    info!(
        model = %config.llm.model,
        llm_base = %config.llm.api_base,
        jwks_ttl_secs = config.key_set.freshness_window.as_secs(),
        "Starting uniai-bff"
    );

    let http_client = reqwest::Client::builder().build()?;
    let app = build_app(AppState::from_config(&config, http_client));

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("Listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
