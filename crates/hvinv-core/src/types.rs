//! Inventory topology: groups, hosts and their variables.
//!
//! A [`Topology`] is the transient result of one inventory load. Maps and
//! sets are ordered so that `--list` output is stable between runs.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Variable name → value.
pub type VarMap = Map<String, Value>;

/// Reserved top-level key carrying pre-supplied host variables.
pub const META_KEY: &str = "_meta";
/// Key inside [`META_KEY`] mapping host name → variables.
pub const HOSTVARS_KEY: &str = "hostvars";

/// Connection variables injected on every discovered host.
pub const CONNECTION_VARS: [(&str, &str); 3] = [
    ("ansible_connection", "psrp"),
    ("ansible_psrp_auth", "basic"),
    ("ansible_psrp_cert_validation", "ignore"),
];

/// Normalise a group name the way the automation engine expects.
pub fn normalize_group_name(name: &str) -> String {
    name.replace('-', "_")
}

// ─── Group / Host ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub hosts: BTreeSet<String>,
    #[serde(default)]
    pub vars: VarMap,
    #[serde(default)]
    pub children: BTreeSet<String>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub name: String,
    #[serde(default)]
    pub vars: VarMap,
    /// Groups this host was listed in.
    #[serde(default)]
    pub groups: BTreeSet<String>,
}

impl Host {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

// ─── Topology ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    groups: BTreeMap<String, Group>,
    hosts: BTreeMap<String, Host>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the group if missing and return its normalised name.
    pub fn add_group(&mut self, name: &str) -> String {
        let name = normalize_group_name(name);
        self.groups
            .entry(name.clone())
            .or_insert_with(|| Group::new(name.clone()));
        name
    }

    /// Add `host` to `group`, creating either as needed.
    pub fn add_host(&mut self, host: &str, group: &str) {
        let group = self.add_group(group);
        if let Some(g) = self.groups.get_mut(&group) {
            g.hosts.insert(host.to_string());
        }
        self.hosts
            .entry(host.to_string())
            .or_insert_with(|| Host::new(host))
            .groups
            .insert(group);
    }

    /// Attach `child` under `parent`, creating both groups as needed.
    pub fn add_child(&mut self, parent: &str, child: &str) {
        let parent = self.add_group(parent);
        let child = self.add_group(child);
        if let Some(g) = self.groups.get_mut(&parent) {
            g.children.insert(child);
        }
    }

    pub fn set_host_var(&mut self, host: &str, key: &str, value: Value) {
        self.hosts
            .entry(host.to_string())
            .or_insert_with(|| Host::new(host))
            .vars
            .insert(key.to_string(), value);
    }

    pub fn set_group_var(&mut self, group: &str, key: &str, value: Value) {
        let group = self.add_group(group);
        if let Some(g) = self.groups.get_mut(&group) {
            g.vars.insert(key.to_string(), value);
        }
    }

    /// Merge `vars` over the host's existing variables.
    pub fn merge_host_vars(&mut self, host: &str, vars: &VarMap) {
        for (k, v) in vars {
            self.set_host_var(host, k, v.clone());
        }
    }

    /// Set the fixed PSRP connection variables on `host`.
    pub fn set_connection_vars(&mut self, host: &str) {
        for (k, v) in CONNECTION_VARS {
            self.set_host_var(host, k, Value::String(v.to_string()));
        }
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(&normalize_group_name(name))
    }

    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.get(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    pub fn host_names(&self) -> Vec<String> {
        self.hosts.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.hosts.is_empty()
    }

    /// Render the document a dynamic inventory script prints for `--list`.
    pub fn to_inventory_json(&self) -> Value {
        let mut out = Map::new();
        for g in self.groups.values() {
            let mut body = Map::new();
            body.insert("hosts".into(), json!(g.hosts));
            if !g.vars.is_empty() {
                body.insert("vars".into(), Value::Object(g.vars.clone()));
            }
            if !g.children.is_empty() {
                body.insert("children".into(), json!(g.children));
            }
            out.insert(g.name.clone(), Value::Object(body));
        }
        let hostvars: VarMap = self
            .hosts
            .values()
            .map(|h| (h.name.clone(), Value::Object(h.vars.clone())))
            .collect();
        let mut meta = Map::new();
        meta.insert(HOSTVARS_KEY.into(), Value::Object(hostvars));
        out.insert(META_KEY.into(), Value::Object(meta));
        Value::Object(out)
    }

    /// Render the document printed for `--host <name>`; unknown hosts yield `{}`.
    pub fn host_vars_json(&self, name: &str) -> Value {
        self.hosts
            .get(name)
            .map(|h| Value::Object(h.vars.clone()))
            .unwrap_or_else(|| json!({}))
    }
}
