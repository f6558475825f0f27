//! External process seam.
//!
//! Every subprocess the inventory spawns (PowerShell, `wslpath`, the
//! per-host fallback script) goes through [`CommandRunner`], so the loader
//! can be exercised without a Windows host.

use async_trait::async_trait;
use hvinv_core::error::{InventoryError, InventoryResult};
use log::{debug, trace};
use std::time::Duration;
use tokio::process::Command;

/// Captured result of one process invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout as UTF-8; invalid sequences are an error attributed to `source`.
    pub fn stdout_text(&self, source: &str) -> InventoryResult<String> {
        String::from_utf8(self.stdout.clone()).map_err(|e| InventoryError::decode(source, e))
    }

    /// Stderr is only ever shown to humans, so decode it lossily.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs an executable to completion and captures its output.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> InventoryResult<CommandOutput>;
}

// ─── Tokio implementation ────────────────────────────────────────────

/// Spawns real processes with `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct TokioRunner {
    timeout: Option<Duration>,
}

impl TokioRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the child if it runs longer than `seconds`.
    pub fn with_timeout(seconds: Option<u64>) -> Self {
        Self {
            timeout: seconds.map(Duration::from_secs),
        }
    }
}

#[async_trait]
impl CommandRunner for TokioRunner {
    async fn run(&self, program: &str, args: &[String]) -> InventoryResult<CommandOutput> {
        debug!("exec {} {}", program, args.join(" "));

        let child = Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| InventoryError::launch(program, e))?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| InventoryError::timeout(program, limit.as_secs()))?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| InventoryError::launch(program, e))?;

        let result = CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code().unwrap_or(-1),
        };

        trace!("{} exited {} ({} bytes stdout)", program, result.exit_code, result.stdout.len());
        // Callers decide whether stderr is shown to the user.
        if !result.stderr.is_empty() {
            debug!("{} stderr: {}", program, result.stderr_text().trim_end());
        }
        Ok(result)
    }
}
