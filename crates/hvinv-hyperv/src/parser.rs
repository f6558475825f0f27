//! Inventory document → [`Topology`].
//!
//! The document is a JSON object keyed by group name. A group payload is
//! either a host list, an object with any of `hosts` / `vars` / `children`,
//! or a bare variable object. The reserved `_meta` key may carry
//! `hostvars`, a host → variables mapping.

use hvinv_core::error::{InventoryError, InventoryErrorKind, InventoryResult};
use hvinv_core::types::{Topology, VarMap, HOSTVARS_KEY, META_KEY};
use log::trace;
use serde_json::{Map, Value};

const GROUP_KEYS: [&str; 3] = ["hosts", "vars", "children"];

/// Groups and hosts from one document, before host variables are resolved.
#[derive(Debug, Default)]
pub struct ParsedInventory {
    pub topology: Topology,
    /// `_meta.hostvars` as supplied, if the document had one.
    pub hostvars: Option<Value>,
}

/// Parse a decoded inventory document produced by the script at `source`.
///
/// `stderr` is attached to structural errors so the cause is visible.
pub fn parse_document(source: &str, doc: Value, stderr: &str) -> InventoryResult<ParsedInventory> {
    let Value::Object(entries) = doc else {
        return Err(InventoryError::with_details(
            InventoryErrorKind::Structure,
            format!(
                "failed to parse executable inventory script results from {}: needs to be a json dict",
                source
            ),
            stderr.to_string(),
        ));
    };

    let mut parsed = ParsedInventory::default();
    for (name, payload) in entries {
        if name == META_KEY {
            if let Value::Object(mut meta) = payload {
                // A null hostvars means "not supplied": hosts fall back to `--host`.
                if let Some(hostvars) = meta.remove(HOSTVARS_KEY).filter(|v| !v.is_null()) {
                    parsed.hostvars = Some(hostvars);
                }
            }
        } else {
            parse_group(&mut parsed.topology, &name, payload)?;
        }
    }
    Ok(parsed)
}

/// Fold one group payload into `topology`.
pub fn parse_group(topology: &mut Topology, name: &str, payload: Value) -> InventoryResult<()> {
    let group = topology.add_group(name);

    let data: Map<String, Value> = match payload {
        Value::Object(map) if GROUP_KEYS.iter().any(|k| map.contains_key(*k)) => map,
        Value::Object(vars) => {
            let mut map = Map::new();
            map.insert("hosts".into(), Value::Array(vec![Value::String(group.clone())]));
            map.insert("vars".into(), Value::Object(vars));
            map
        }
        other => {
            let mut map = Map::new();
            map.insert("hosts".into(), other);
            map
        }
    };

    if let Some(hosts) = data.get("hosts") {
        let bad_hosts = || {
            InventoryError::structure(format!(
                "You defined a group '{}' with bad data for the host list:\n {}",
                group,
                Value::Object(data.clone())
            ))
        };
        let Value::Array(hosts) = hosts else {
            return Err(bad_hosts());
        };
        for host in hosts {
            let host = host.as_str().ok_or_else(bad_hosts)?;
            trace!("group {} <- host {}", group, host);
            topology.add_host(host, &group);
            topology.set_connection_vars(host);
        }
    }

    if let Some(vars) = data.get("vars") {
        let Value::Object(vars) = vars else {
            return Err(InventoryError::structure(format!(
                "You defined a group '{}' with bad data for variables:\n {}",
                group,
                Value::Object(data.clone())
            )));
        };
        for (k, v) in vars {
            topology.set_group_var(&group, k, v.clone());
        }
    }

    if let Some(children) = data.get("children") {
        let bad_children = || {
            InventoryError::structure(format!(
                "You defined a group '{}' with bad data for children:\n {}",
                group,
                Value::Object(data.clone())
            ))
        };
        let Value::Array(children) = children else {
            return Err(bad_children());
        };
        for child in children {
            let child = child.as_str().ok_or_else(bad_children)?;
            topology.add_child(&group, child);
        }
    }

    Ok(())
}

/// Variables `_meta.hostvars` supplies for `host`; absent hosts get none.
pub fn meta_vars_for(hostvars: &Value, host: &str) -> InventoryResult<VarMap> {
    let improper = |what: &str| {
        InventoryError::structure(format!(
            "Improperly formatted host information for {}: {}",
            host, what
        ))
    };
    let Value::Object(all) = hostvars else {
        return Err(improper("hostvars is not a mapping"));
    };
    match all.get(host) {
        None => Ok(VarMap::new()),
        Some(Value::Object(vars)) => Ok(vars.clone()),
        Some(_) => Err(improper("variables are not a mapping")),
    }
}
