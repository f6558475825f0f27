//! Path translation between the Windows host and a WSL environment.

use crate::runner::CommandRunner;
use hvinv_core::config::InventoryConfig;
use hvinv_core::error::{InventoryError, InventoryResult};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Converts paths with `wslpath`, or passes them through when disabled.
pub struct PathTranslator {
    runner: Arc<dyn CommandRunner>,
    wslpath: String,
    enabled: bool,
}

impl PathTranslator {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &InventoryConfig) -> Self {
        Self {
            runner,
            wslpath: config.wslpath_path.clone(),
            enabled: config.translate_paths,
        }
    }

    async fn wslpath(&self, args: Vec<String>) -> InventoryResult<String> {
        let output = self.runner.run(&self.wslpath, &args).await?;
        if !output.success() {
            return Err(InventoryError::exit(&self.wslpath, &output.stderr_text()));
        }
        let text = output.stdout_text(&self.wslpath)?;
        let resolved = text.trim_end_matches(['\r', '\n']);
        if resolved.is_empty() {
            return Err(InventoryError::structure(format!(
                "{} returned no path for {}",
                self.wslpath,
                args.join(" ")
            )));
        }
        Ok(resolved.to_string())
    }

    /// Windows path → local path.
    pub async fn to_local(&self, windows_path: &str) -> InventoryResult<PathBuf> {
        if !self.enabled {
            return Ok(PathBuf::from(windows_path));
        }
        let local = self.wslpath(vec![windows_path.to_string()]).await?;
        debug!("Resolved {} -> {}", windows_path, local);
        Ok(PathBuf::from(local))
    }

    /// Local path → Windows path, in the form PowerShell expects.
    pub async fn to_windows(&self, local_path: &Path) -> InventoryResult<String> {
        let local = local_path.to_string_lossy().into_owned();
        if !self.enabled {
            return Ok(local);
        }
        let windows = self.wslpath(vec!["-w".to_string(), local.clone()]).await?;
        debug!("Resolved {} -> {}", local, windows);
        Ok(windows)
    }
}
