//! # Hyper-V Inventory – Core
//!
//! Backend-agnostic pieces of the dynamic inventory:
//!
//! - **Topology** – groups, hosts, variables and the `--list` rendering
//! - **Config** – the YAML plugin file and applicability check
//! - **Errors** – the shared error taxonomy
//! - **Source** – the `verify` / `load` contract backends implement

pub mod config;
pub mod error;
pub mod source;
pub mod types;

pub use config::{is_plugin_config, InventoryConfig, PLUGIN_NAME};
pub use error::{InventoryError, InventoryErrorKind, InventoryResult};
pub use source::InventorySource;
pub use types::{Group, Host, Topology, VarMap};
