//! Dynamic inventory script for running Hyper-V virtual machines.
//!
//! Speaks the inventory-script protocol (`--list`, `--host <name>`) on top of
//! any [`InventorySource`]; the binary wires in [`HyperVInventory`].

pub mod cli;
pub mod logging;


use anyhow::Context;
use cli::{Action, CommandLine};
use hvinv_core::source::InventorySource;
use serde_json::{json, Value};
use tracing::debug;

pub use hvinv_hyperv::HyperVInventory;

/// Rendered result of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub output: String,
    pub success: bool,
}

fn render(value: &Value, pretty: bool) -> anyhow::Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

/// The hyperv_vm documentation, examples and metadata as one JSON document.
pub fn module_doc_json() -> anyhow::Result<Value> {
    use hvinv_hyperv::module_doc;
    let documentation = module_doc::documentation()?;
    Ok(json!({
        "documentation": documentation,
        "examples": module_doc::EXAMPLES.trim(),
        "metadata": module_doc::metadata(),
    }))
}

/// Run the action `cmd` selects against `source`.
pub async fn execute<S: InventorySource>(source: &S, cmd: &CommandLine) -> anyhow::Result<Outcome> {
    let path = cmd.inventory.as_path();
    let action = cmd.action();
    debug!("{} {:?} on {}", source.name(), action, path.display());

    let (value, success) = match action {
        Action::Verify => {
            let ok = source
                .verify(path)
                .with_context(|| format!("cannot verify {}", path.display()))?;
            (Value::Bool(ok), ok)
        }
        Action::ModuleDoc => (module_doc_json()?, true),
        Action::List => {
            let topology = source
                .load(path)
                .await
                .with_context(|| format!("failed to load inventory from {}", path.display()))?;
            (topology.to_inventory_json(), true)
        }
        Action::Host(ref host) => {
            let topology = source
                .load(path)
                .await
                .with_context(|| format!("failed to load inventory from {}", path.display()))?;
            (topology.host_vars_json(host), true)
        }
    };

    Ok(Outcome {
        output: render(&value, cmd.pretty)?,
        success,
    })
}
