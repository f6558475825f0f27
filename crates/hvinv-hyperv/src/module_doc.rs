//! Documentation for the `hyperv_vm` module.
//!
//! The module itself runs on the Windows host as a PowerShell script; this
//! side only carries its documentation, examples, metadata and the typed
//! shape of its arguments.

use hvinv_core::error::{InventoryError, InventoryResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DOCUMENTATION: &str = r#"
module: hyperv_vm
version_added: "2.4"
short_description: Adds, deletes and performs power functions on Hyper-V VM's.
description:
  - Adds, deletes and performs power functions on Hyper-V VM's.
options:
  name:
    description:
      - Name of VM
    required: true
  state:
    description:
      - State of VM
    required: false
    choices:
      - present
      - absent
      - running
      - stopped
      - poweroff
    default: present
  cpu:
    description:
      - Sets the number of vCPUs to assign to the VM
    required: false
    default: 1
  memory:
    description:
      - Sets the amount of memory for the VM
    required: false
    default: 512MB
  generation:
    description:
      - Specifies the generation of the VM
    required: false
    default: 2
  network_switch:
    description:
      - Specifies a network adapter for the VM
    required: false
  vhd_path:
    description:
      - Specify path of VHD/VHDX file for VM
      - If the file exists it will be attached, if not then a new one will be created
    required: false
  vhd_parent_path:
    description:
      - Specifies the path of a parent image for a differencing disk
    required: false
  vhd_size_bytes:
    description:
      - Specifies the size of the disk to create
    required: false
    default: 40GB
  group_names:
    description:
      - Specifies a list of groups the VM should be added to
    required: false
    default: []
"#;

pub const EXAMPLES: &str = r#"
- name: Create VM
  hyperv_vm:
    name: Test

- name: Delete a VM
  hyperv_vm:
    name: Test
    state: absent

- name: Create VM with 256MB memory
  hyperv_vm:
    name: Test
    memory: 256MB

- name: Create generation 1 VM with 256MB memory and a network adapter
  hyperv_vm:
    name: Test
    generation: 1
    memory: 256MB
    network_switch: WAN1
"#;

// ─── Documentation types ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleOption {
    pub description: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDocumentation {
    pub module: String,
    pub version_added: String,
    pub short_description: String,
    pub description: Vec<String>,
    pub options: BTreeMap<String, ModuleOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub status: Vec<String>,
    pub supported_by: String,
    pub metadata_version: String,
}

/// One entry of [`EXAMPLES`].
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleExample {
    pub name: String,
    pub hyperv_vm: HypervVmArgs,
}

pub fn documentation() -> InventoryResult<ModuleDocumentation> {
    serde_yaml::from_str(DOCUMENTATION)
        .map_err(|e| InventoryError::parse(format!("hyperv_vm documentation: {}", e)))
}

pub fn examples() -> InventoryResult<Vec<ModuleExample>> {
    serde_yaml::from_str(EXAMPLES)
        .map_err(|e| InventoryError::parse(format!("hyperv_vm examples: {}", e)))
}

pub fn metadata() -> ModuleMetadata {
    ModuleMetadata {
        status: vec!["preview".to_string()],
        supported_by: "community".to_string(),
        metadata_version: "1.1".to_string(),
    }
}

// ─── Arguments ───────────────────────────────────────────────────────

/// Desired VM state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmDesiredState {
    #[default]
    Present,
    Absent,
    Running,
    Stopped,
    Poweroff,
}

/// Arguments accepted by `hyperv_vm`, with the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HypervVmArgs {
    pub name: String,
    #[serde(default)]
    pub state: VmDesiredState,
    #[serde(default = "default_cpu")]
    pub cpu: u32,
    #[serde(default = "default_memory")]
    pub memory: String,
    #[serde(default = "default_generation")]
    pub generation: u8,
    #[serde(default)]
    pub network_switch: Option<String>,
    #[serde(default)]
    pub vhd_path: Option<String>,
    #[serde(default)]
    pub vhd_parent_path: Option<String>,
    #[serde(default = "default_vhd_size")]
    pub vhd_size_bytes: String,
    #[serde(default)]
    pub group_names: Vec<String>,
}

fn default_cpu() -> u32 {
    1
}
fn default_memory() -> String {
    "512MB".to_string()
}
fn default_generation() -> u8 {
    2
}
fn default_vhd_size() -> String {
    "40GB".to_string()
}

impl HypervVmArgs {
    pub fn from_value(value: Value) -> InventoryResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| InventoryError::parse(format!("invalid hyperv_vm arguments: {}", e)))
    }
}
