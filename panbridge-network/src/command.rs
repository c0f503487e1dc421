use panbridge_core::{PanBridgeError, Result};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Runs external tools with a deadline so one hung command cannot stall
/// the reconcile loop.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn output(&self, operation: &str, program: &str, args: &[&str]) -> Result<Output> {
        debug!("Running {} {}", program, args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| PanBridgeError::network(operation, e)),
            Err(_) => Err(PanBridgeError::Timeout {
                operation: operation.to_string(),
                seconds: self.timeout.as_secs(),
            }),
        }
    }

    /// Returns stdout, failing on a non-zero exit.
    pub async fn run(&self, operation: &str, program: &str, args: &[&str]) -> Result<String> {
        let output = self.output(operation, program, args).await?;

        if !output.status.success() {
            return Err(PanBridgeError::network(
                operation,
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Like [`run`](Self::run), but a failure whose stderr contains one of
    /// `tolerated` yields `None` instead of an error.
    pub async fn run_tolerant(
        &self,
        operation: &str,
        program: &str,
        args: &[&str],
        tolerated: &[&str],
    ) -> Result<Option<String>> {
        let output = self.output(operation, program, args).await?;

        if output.status.success() {
            return Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if tolerated.iter().any(|t| stderr.contains(t)) {
            debug!("{}: {}", operation, stderr.trim());
            return Ok(None);
        }

        Err(PanBridgeError::network(operation, stderr.trim()))
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}
