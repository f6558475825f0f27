//! PowerShell execution for the inventory.
//!
//! Invokes `powershell.exe` through a [`CommandRunner`] with a fixed set of
//! flags. The target is either an expression (`$env:TEMP`) or the path of a
//! generated script file.

use crate::runner::{CommandOutput, CommandRunner};
use hvinv_core::error::{InventoryError, InventoryResult};
use log::{debug, trace};
use std::sync::Arc;

/// Flags passed before the target on every invocation.
pub const PS_FLAGS: [&str; 4] = ["-NoProfile", "-NoLogo", "-ExecutionPolicy", "Unrestricted"];

/// PowerShell executor.
pub struct PsExecutor {
    runner: Arc<dyn CommandRunner>,
    powershell_path: String,
}

impl PsExecutor {
    pub fn new(runner: Arc<dyn CommandRunner>, powershell_path: &str) -> Self {
        Self {
            runner,
            powershell_path: powershell_path.to_string(),
        }
    }

    fn args_for(target: &str) -> Vec<String> {
        PS_FLAGS
            .iter()
            .map(|s| s.to_string())
            .chain(std::iter::once(target.to_string()))
            .collect()
    }

    /// Run `target` and return raw output, whatever the exit code.
    pub async fn run(&self, target: &str) -> InventoryResult<CommandOutput> {
        trace!("PS target: {}", target);
        self.runner
            .run(&self.powershell_path, &Self::args_for(target))
            .await
    }

    /// Run and assert exit 0; a failure carries the captured stderr.
    pub async fn run_ok(&self, target: &str) -> InventoryResult<CommandOutput> {
        let output = self.run(target).await?;
        if !output.success() {
            let stderr = output.stderr_text();
            let msg = if stderr.trim().is_empty() {
                format!("exited with code {}", output.exit_code)
            } else {
                stderr
            };
            return Err(InventoryError::exit(&self.powershell_path, &msg));
        }
        Ok(output)
    }

    /// The Windows-side `%TEMP%` directory, as Windows reports it.
    pub async fn temp_dir(&self) -> InventoryResult<String> {
        let output = self.run_ok("$env:TEMP").await?;
        let dir = output
            .stdout_text(&self.powershell_path)?
            .trim_end_matches(['\r', '\n'])
            .to_string();
        if dir.is_empty() {
            return Err(InventoryError::structure(
                "problem looking up temp var (empty $env:TEMP)",
            ));
        }
        debug!("TEMP: {}", dir);
        Ok(dir)
    }
}

// ─── Script Builders ─────────────────────────────────────────────────

/// Helpers for building PowerShell script fragments.
pub struct PsScripts;

impl PsScripts {
    /// Escape a string value for embedding inside single-quoted PS strings.
    pub fn escape(s: &str) -> String {
        s.replace('\'', "''")
    }

    /// A `ConvertTo-Json` pipeline stage with the given depth.
    pub fn to_json(depth: u32) -> String {
        format!("| ConvertTo-Json -Depth {}", depth)
    }
}
