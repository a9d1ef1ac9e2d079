//! Handle to the launched backing server process.

use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{info, trace, warn};

use crate::supervisor::SupervisorError;

/// A backing server child process.
///
/// stdout/stderr are piped and drained into `trace` logs so the child never
/// blocks on a full pipe. Dropping the handle kills the child.
#[derive(Debug)]
pub struct BackendProcess {
    child: Child,
    command: String,
}

impl BackendProcess {
    /// Launch `command args...`.
    pub fn spawn(command: &str, args: &[String]) -> Result<Self, SupervisorError> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(drain(stdout, "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain(stderr, "stderr"));
        }

        info!(pid = child.id(), command, ?args, "Backing server spawned");

        Ok(Self {
            child,
            command: command.to_string(),
        })
    }

    /// OS process id, `None` once the child has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Exit status if the child has already terminated.
    pub fn try_exit_status(&mut self) -> Result<Option<ExitStatus>, SupervisorError> {
        Ok(self.child.try_wait()?)
    }

    /// Kill and reap the child. A child that already exited is left as is.
    pub async fn shutdown(mut self) -> Result<(), SupervisorError> {
        if let Some(status) = self.child.try_wait()? {
            warn!(command = %self.command, %status, "Backing server had already exited");
            return Ok(());
        }

        info!(pid = self.child.id(), command = %self.command, "Stopping backing server");
        self.child.kill().await?;
        Ok(())
    }
}

/// Forward raw output lines until EOF. Bytes are logged lossily, never parsed,
/// and the read end stays open for the child's whole life.
async fn drain<R>(reader: R, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                trace!(target: "ollama_relay::backend", stream, "{}", line.trim_end());
            }
            Err(e) => {
                warn!(stream, error = %e, "Failed to read backing server output");
                if e.kind() != std::io::ErrorKind::Interrupted {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                }
            }
        }
    }
}
