//! ollama-relay binary: supervise Ollama and serve the relay API.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use ollama_relay::config::{Cli, Config};
use ollama_relay::metrics::RelayMetrics;
use ollama_relay::relay::{Backend, OllamaClient};
use ollama_relay::server::api::{build_router, AppState};
use ollama_relay::supervisor::Supervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "ollama_relay=debug,tower_http=debug"
    } else {
        "ollama_relay=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("ollama-relay v{}", env!("CARGO_PKG_VERSION"));

    // Resolve configuration once: file, then environment, then CLI.
    let mut config = Config::load(&cli.config)?;
    config.apply_env();
    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }
    if cli.no_spawn {
        config.supervisor.enabled = false;
    }
    config.validate()?;

    info!(
        backend = %config.backend.base_url,
        model = %config.backend.generate_model,
        request_timeout_secs = config.backend.request_timeout_secs,
        spawn = config.supervisor.enabled,
        "Configuration loaded"
    );

    let client = OllamaClient::new(&config.backend)?;

    // Start the backing server. Failure aborts before anything is bound.
    let supervisor = Supervisor::new(config.supervisor.clone(), client.clone());
    let backend_process = supervisor
        .start()
        .await
        .context("Ollama server failed to start")?;

    if let Some(model) = &config.backend.preload_model {
        if let Err(e) = client.pull(model).await {
            warn!(model = %model, error = %e, "Model preload failed, continuing");
        }
    }

    let state = Arc::new(AppState::new(
        Arc::new(client),
        RelayMetrics::new()?,
        config.server.docs_path.clone(),
    ));
    let app = build_router(state);

    let listen_addr = config.server.listen;
    info!(addr = %listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(process) = backend_process {
        if let Err(e) = process.shutdown().await {
            error!(error = %e, "Failed to stop backing server");
        }
    }

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
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
