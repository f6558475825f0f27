//! Per-host fallback: `<script> --host <name>`.
//!
//! Only used when the inventory document carried no `_meta.hostvars`.

use crate::runner::CommandRunner;
use hvinv_core::error::{InventoryError, InventoryResult};
use hvinv_core::types::VarMap;
use log::debug;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

pub struct HostVarsLookup {
    runner: Arc<dyn CommandRunner>,
    script: PathBuf,
}

impl HostVarsLookup {
    pub fn new(runner: Arc<dyn CommandRunner>, script: PathBuf) -> Self {
        Self { runner, script }
    }

    /// Variables the script reports for `host`. Blank output means none.
    pub async fn lookup(&self, host: &str) -> InventoryResult<VarMap> {
        let program = self.script.to_string_lossy().into_owned();
        let args = vec!["--host".to_string(), host.to_string()];
        debug!("Looking up variables for {}", host);

        let output = self.runner.run(&program, &args).await?;
        if !output.success() {
            return Err(InventoryError::exit(&program, &output.stderr_text()));
        }

        let out = output.stdout_text(&program)?;
        if out.trim().is_empty() {
            return Ok(VarMap::new());
        }
        match serde_json::from_str::<Value>(&out) {
            Ok(Value::Object(vars)) => Ok(vars),
            _ => Err(InventoryError::parse(format!(
                "could not parse post variable response: {} --host {}, {}",
                program, host, out
            ))),
        }
    }
}
