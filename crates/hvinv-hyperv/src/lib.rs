//! # Hyper-V Inventory – Hyper-V backend
//!
//! Discovers running Hyper-V virtual machines by generating a PowerShell
//! script, running it on the Windows host (directly or from WSL) and
//! turning the JSON it prints into a [`hvinv_core::Topology`]:
//!
//! - **Runner** – the subprocess seam and its tokio implementation
//! - **PowerShell** – executor with fixed flags, temp-dir lookup
//! - **Paths** – `wslpath` translation between Windows and WSL
//! - **Script** – the generated inventory script and its temp file
//! - **Parser** – inventory document → topology
//! - **Host vars** – `--host <name>` fallback lookups
//! - **Inventory** – the `InventorySource` implementation tying it together
//! - **Module doc** – documentation stub for the `hyperv_vm` module

pub mod hostvars;
pub mod inventory;
pub mod module_doc;
pub mod parser;
pub mod paths;
pub mod powershell;
pub mod runner;
pub mod script;

pub use inventory::HyperVInventory;
pub use runner::{CommandOutput, CommandRunner, TokioRunner};
