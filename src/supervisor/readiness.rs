//! Readiness handshake with the backing server.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::Readiness;
use crate::relay::OllamaClient;
use crate::supervisor::process::BackendProcess;
use crate::supervisor::SupervisorError;

/// Block until the backing server is considered ready.
///
/// `process` is the child we launched, if any. With a fixed delay and no
/// child there is nothing to wait for.
pub async fn wait_ready(
    readiness: &Readiness,
    client: &OllamaClient,
    mut process: Option<&mut BackendProcess>,
) -> Result<(), SupervisorError> {
    match *readiness {
        Readiness::FixedDelay { secs } => {
            if process.is_none() {
                return Ok(());
            }
            info!(secs, "Waiting fixed grace period for backing server");
            tokio::time::sleep(Duration::from_secs(secs)).await;
            Ok(())
        }
        Readiness::Poll {
            interval_ms,
            max_attempts,
            probe_timeout_ms,
        } => {
            let interval = Duration::from_millis(interval_ms);
            let probe_timeout = Duration::from_millis(probe_timeout_ms);

            for attempt in 1..=max_attempts {
                if let Some(child) = process.as_mut() {
                    if let Some(status) = child.try_exit_status()? {
                        return Err(SupervisorError::Exited(status));
                    }
                }

                match client.probe(probe_timeout).await {
                    Ok(()) => {
                        info!(attempt, url = client.base_url(), "Backing server is ready");
                        return Ok(());
                    }
                    Err(e) => debug!(attempt, error = %e, "Backing server not ready yet"),
                }

                if attempt < max_attempts {
                    tokio::time::sleep(interval).await;
                }
            }

            Err(SupervisorError::NotReady {
                attempts: max_attempts,
            })
        }
    }
}
