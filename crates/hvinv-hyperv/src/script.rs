//! The generated inventory script and the temp file that carries it.

use crate::powershell::PsScripts;
use hvinv_core::error::{InventoryError, InventoryResult};
use log::{debug, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

const GROUP_PLACEHOLDER: &str = "{group}";
const JSON_PLACEHOLDER: &str = "{to_json}";

/// Enumerates running VMs in one Hyper-V group and prints an inventory
/// document: `_meta.hostvars` plus one `{hosts: [...]}` entry per VM group.
/// VM names are expected to be `<group>_<host>`.
const INVENTORY_SCRIPT: &str = r#"#!/usr/bin/env powershell.exe
$GroupName = '{group}'
$vms = Get-VM |
    Where-Object { $_.State -eq 'Running' -And $_.Groups.Name -eq $GroupName } |
    Add-Member -Passthru -MemberType ScriptProperty -Name Hostname -Value {
        $this.VMName.SubString($GroupName.Length + 1)
    }

$groups = $vms.Groups.Name | Sort-Object -Unique

$hostvars = @{}
foreach ($vmhost in $vms) {
    $hostvars.Add($vmhost.Hostname, [PSCustomObject]@{
        ansible_host = $vmhost.NetworkAdapters[0].IPAddresses[0]
    })
}

$result = @{
    _meta = @{
        hostvars = $hostvars
    }
}

foreach ($group in $groups) {
    $members = $vms |
        Where-Object { $_.Groups.Name -eq $group } |
        Select-Object -ExpandProperty Hostname
    $result.Add($group, @{hosts = @($members)})
}

$result {to_json}
"#;

/// Depth passed to `ConvertTo-Json`; deep enough for `_meta.hostvars.<host>.<var>`.
pub const JSON_DEPTH: u32 = 5;

/// Render the inventory script for `group_tag`.
pub fn inventory_script(group_tag: &str) -> String {
    INVENTORY_SCRIPT
        .replace(GROUP_PLACEHOLDER, &PsScripts::escape(group_tag))
        .replace(JSON_PLACEHOLDER, &PsScripts::to_json(JSON_DEPTH))
}

// ─── Temp script file ────────────────────────────────────────────────

/// A generated `.ps1` file that is deleted when dropped.
#[derive(Debug)]
pub struct ScriptFile {
    file: NamedTempFile,
}

impl ScriptFile {
    /// Write `body` to a new executable `.ps1` file inside `dir`.
    pub fn create(dir: &Path, body: &str) -> InventoryResult<Self> {
        let mut file = Builder::new()
            .prefix("hvinv-")
            .suffix(".ps1")
            .tempfile_in(dir)
            .map_err(|e| {
                InventoryError::io(&format!("cannot create script in {}", dir.display()), e)
            })?;
        file.write_all(body.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| InventoryError::io("cannot write inventory script", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            debug!("Making script executable");
            std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o755))
                .map_err(|e| InventoryError::io("cannot mark script executable", e))?;
        }

        debug!("Wrote inventory script {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Fully resolved path of the script.
    pub fn absolute_path(&self) -> InventoryResult<PathBuf> {
        self.file
            .path()
            .canonicalize()
            .map_err(|e| InventoryError::io("cannot resolve script path", e))
    }

    /// Delete the file now. A failure is logged; the load result stands.
    pub fn remove(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}
