//! Backing server process supervision.
//!
//! One-shot: the supervisor launches the backing server once at startup and
//! waits for it to become ready. It never watches or restarts the child
//! afterwards.
//!
//! - [`process`]: child process handle
//! - [`readiness`]: fixed-delay or polling readiness handshake

pub mod process;
pub mod readiness;

use std::process::ExitStatus;

use thiserror::Error;
use tracing::{error, info};

use crate::config::SupervisorConfig;
use crate::relay::OllamaClient;

pub use process::BackendProcess;
pub use readiness::wait_ready;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Failed to launch backing server {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Backing server not ready after {attempts} probes")]
    NotReady { attempts: u32 },

    #[error("Backing server exited before becoming ready: {0}")]
    Exited(ExitStatus),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Starts the backing server and performs the readiness handshake.
#[derive(Debug)]
pub struct Supervisor {
    config: SupervisorConfig,
    client: OllamaClient,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, client: OllamaClient) -> Self {
        Self { config, client }
    }

    /// Launch the backing server (unless disabled) and wait until it is ready.
    ///
    /// Returns the child handle, or `None` when spawning is disabled. On a
    /// readiness failure the child is stopped before the error is returned.
    pub async fn start(&self) -> Result<Option<BackendProcess>, SupervisorError> {
        if !self.config.enabled {
            info!(url = self.client.base_url(), "Spawning disabled, using existing backing server");
            wait_ready(&self.config.readiness, &self.client, None)
                .await
                .inspect_err(|e| error!(error = %e, "Backing server unavailable"))?;
            return Ok(None);
        }

        info!(command = %self.config.command, "Starting backing server");
        let mut process = BackendProcess::spawn(&self.config.command, &self.config.args)
            .inspect_err(|e| error!(error = %e, "Failed to start backing server"))?;

        let ready = wait_ready(&self.config.readiness, &self.client, Some(&mut process)).await;
        if let Err(e) = ready {
            error!(error = %e, "Backing server failed readiness check");
            if let Err(stop_err) = process.shutdown().await {
                error!(error = %stop_err, "Failed to stop backing server");
            }
            return Err(e);
        }

        info!(pid = process.id(), "Backing server started");
        Ok(Some(process))
    }
}
