//! Plugin configuration: the YAML file an inventory run is pointed at.

use crate::error::{InventoryError, InventoryResult};
use crate::types::normalize_group_name;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identifier a config file's `plugin` key must carry to be claimed.
pub const PLUGIN_NAME: &str = "ahaydon.hyperv.vm";

/// File name suffixes claimed without looking at the content.
pub const CONFIG_SUFFIXES: [&str; 2] = ["hyperv.yaml", "hyperv.yml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default)]
    pub plugin: String,
    /// Echo the inventory script's stderr even when it succeeded.
    #[serde(default)]
    pub always_show_stderr: bool,
    #[serde(default = "default_pwsh_path")]
    pub powershell_path: String,
    #[serde(default = "default_wslpath")]
    pub wslpath_path: String,
    /// Translate paths between the Windows host and WSL with `wslpath`.
    #[serde(default = "default_translate")]
    pub translate_paths: bool,
    /// Local directory for the generated script; skips the `$env:TEMP` lookup.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Hyper-V VM group to enumerate (default: current directory name).
    #[serde(default)]
    pub group_name: Option<String>,
    /// Executable queried with `--host <name>` when no `_meta.hostvars` is returned.
    #[serde(default)]
    pub host_script: Option<PathBuf>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_pwsh_path() -> String {
    "powershell.exe".to_string()
}
fn default_wslpath() -> String {
    "wslpath".to_string()
}
fn default_translate() -> bool {
    true
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            plugin: PLUGIN_NAME.to_string(),
            always_show_stderr: false,
            powershell_path: default_pwsh_path(),
            wslpath_path: default_wslpath(),
            translate_paths: true,
            temp_dir: None,
            group_name: None,
            host_script: None,
            timeout_seconds: None,
        }
    }
}

impl InventoryConfig {
    /// Parse a config document. An empty document yields the defaults.
    pub fn from_yaml_str(raw: &str) -> InventoryResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
            .map_err(|e| InventoryError::config(format!("invalid plugin config: {}", e)))
    }

    pub fn load(path: &Path) -> InventoryResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            InventoryError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml_str(&raw)?;
        debug!("Loaded inventory config from {}", path.display());
        Ok(config)
    }

    /// The Hyper-V group tag the generated script filters on.
    pub fn group_tag(&self) -> InventoryResult<String> {
        let name = match self.group_name {
            Some(ref n) => n.clone(),
            None => {
                let cwd = std::env::current_dir()
                    .map_err(|e| InventoryError::io("cannot determine working directory", e))?;
                cwd.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            }
        };
        Ok(normalize_group_name(&name))
    }

    /// Executable used for per-host fallback lookups.
    pub fn host_script_for(&self, config_path: &Path) -> PathBuf {
        self.host_script
            .clone()
            .unwrap_or_else(|| config_path.to_path_buf())
    }
}

/// Whether `path` is a config file this plugin should consume.
///
/// Missing files and non-files are rejected; a recognised suffix is accepted
/// without reading; anything else is accepted only when its `plugin` key
/// names [`PLUGIN_NAME`]. Unparseable YAML is an error, not a rejection.
pub fn is_plugin_config(path: &Path) -> InventoryResult<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    let name = path.to_string_lossy();
    if CONFIG_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        return Ok(true);
    }

    let raw = std::fs::read_to_string(path).map_err(|e| {
        InventoryError::config(format!("cannot read {}: {}", path.display(), e))
    })?;
    let doc: serde_yaml::Value = serde_yaml::from_str(&raw).map_err(|e| {
        InventoryError::config(format!("{}: {}", path.display(), e))
    })?;
    Ok(doc.get("plugin").and_then(|v| v.as_str()) == Some(PLUGIN_NAME))
}
