//! Hyper-V inventory source.
//!
//! A load runs strictly in sequence: look up the Windows temp directory,
//! write the generated script there, translate its path, run it, parse the
//! JSON it prints, then resolve host variables. The script file is removed
//! on every exit path.

use crate::hostvars::HostVarsLookup;
use crate::parser::{meta_vars_for, parse_document};
use crate::paths::PathTranslator;
use crate::powershell::PsExecutor;
use crate::runner::{CommandRunner, TokioRunner};
use crate::script::{inventory_script, ScriptFile};
use async_trait::async_trait;
use hvinv_core::config::{is_plugin_config, InventoryConfig};
use hvinv_core::error::{InventoryError, InventoryErrorKind, InventoryResult};
use hvinv_core::source::InventorySource;
use hvinv_core::types::Topology;
use log::{debug, error, info};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct HyperVInventory {
    /// Fixed runner; when unset, a [`TokioRunner`] is built per load from config.
    runner: Option<Arc<dyn CommandRunner>>,
}

impl Default for HyperVInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperVInventory {
    pub fn new() -> Self {
        Self { runner: None }
    }

    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner: Some(runner),
        }
    }

    fn runner_for(&self, config: &InventoryConfig) -> Arc<dyn CommandRunner> {
        match self.runner {
            Some(ref r) => r.clone(),
            None => Arc::new(TokioRunner::with_timeout(config.timeout_seconds)),
        }
    }

    /// Load using an already-parsed config; `path` names the inventory source.
    pub async fn load_with_config(
        &self,
        config: &InventoryConfig,
        path: &Path,
    ) -> InventoryResult<Topology> {
        let runner = self.runner_for(config);
        let ps = PsExecutor::new(runner.clone(), &config.powershell_path);
        let paths = PathTranslator::new(runner.clone(), config);

        let temp_dir: PathBuf = match config.temp_dir {
            Some(ref dir) => dir.clone(),
            None => {
                debug!("Looking up temp path");
                let windows_temp = ps.temp_dir().await?;
                debug!("Resolving TEMP path");
                paths.to_local(&windows_temp).await?
            }
        };

        let group_tag = config.group_tag()?;
        debug!("Creating temp script file for group '{}'", group_tag);
        let script = ScriptFile::create(&temp_dir, &inventory_script(&group_tag))?;

        let result = self
            .collect(config, path, &ps, &paths, &script, runner)
            .await;
        script.remove();
        result
    }

    async fn collect(
        &self,
        config: &InventoryConfig,
        path: &Path,
        ps: &PsExecutor,
        paths: &PathTranslator,
        script: &ScriptFile,
        runner: Arc<dyn CommandRunner>,
    ) -> InventoryResult<Topology> {
        let source = path.display().to_string();

        debug!("Resolving script path");
        let target = paths.to_windows(&script.absolute_path()?).await?;

        debug!("Collecting inventory");
        let output = ps.run(&target).await?;
        debug!("Collection complete");

        let stderr = output.stderr_text();
        if !output.success() {
            return Err(InventoryError::exit(&source, &stderr));
        }

        let data = output.stdout_text(&source)?;
        let doc: Value = serde_json::from_str(&data).map_err(|e| {
            InventoryError::with_details(
                InventoryErrorKind::Parse,
                format!(
                    "failed to parse executable inventory script results from {}: {}",
                    source, e
                ),
                stderr.clone(),
            )
        })?;

        if !stderr.is_empty() && config.always_show_stderr {
            error!("{}", stderr.trim_end());
        }

        let parsed = parse_document(&source, doc, &stderr)?;
        let mut topology = parsed.topology;

        let lookup = HostVarsLookup::new(runner, config.host_script_for(path));
        for host in topology.host_names() {
            let vars = match parsed.hostvars {
                Some(ref meta) => meta_vars_for(meta, &host)?,
                None => lookup.lookup(&host).await?,
            };
            topology.merge_host_vars(&host, &vars);
        }

        info!(
            "Inventory loaded: {} groups, {} hosts",
            topology.groups().count(),
            topology.hosts().count()
        );
        Ok(topology)
    }
}

#[async_trait]
impl InventorySource for HyperVInventory {
    fn name(&self) -> &str {
        hvinv_core::PLUGIN_NAME
    }

    fn verify(&self, path: &Path) -> InventoryResult<bool> {
        is_plugin_config(path)
    }

    async fn load(&self, path: &Path) -> InventoryResult<Topology> {
        let config = InventoryConfig::load(path)?;
        self.load_with_config(&config, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CommandOutput, MockCommandRunner};
    use mockall::Sequence;
    use serde_json::json;
    use std::sync::Mutex;

    fn local_config(dir: &Path) -> InventoryConfig {
        InventoryConfig {
            temp_dir: Some(dir.to_path_buf()),
            translate_paths: false,
            group_name: Some("lab".into()),
            ..Default::default()
        }
    }

    /// Runner that answers the script invocation with `output` and records
    /// the script path it was handed.
    fn script_runner(output: CommandOutput, seen: Arc<Mutex<Option<PathBuf>>>) -> MockCommandRunner {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|program, _| program.to_string() == "powershell.exe")
            .times(1)
            .returning(move |_, args| {
                let script = PathBuf::from(args.last().unwrap().clone());
                assert!(script.exists(), "script must exist while it runs");
                let body = std::fs::read_to_string(&script).unwrap();
                assert!(body.contains("$GroupName = 'lab'"));
                *seen.lock().unwrap() = Some(script);
                Ok(output.clone())
            });
        runner
    }

    fn two_group_doc() -> String {
        json!({
            "_meta": { "hostvars": {
                "vm1": { "ansible_host": "10.0.0.1" },
                "vm2": { "ansible_host": "10.0.0.2" },
                "vm3": { "ansible_host": "10.0.0.3" }
            }},
            "lab-web": { "hosts": ["vm1", "vm2"] },
            "lab-db": { "hosts": ["vm2", "vm3"] }
        })
        .to_string()
    }

    #[tokio::test]
    async fn hostvars_merged_with_connection_vars() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Arc::new(Mutex::new(None));
        let runner = script_runner(CommandOutput::new(0, two_group_doc(), ""), seen.clone());
        let inv = HyperVInventory::with_runner(Arc::new(runner));

        let topo = inv
            .load_with_config(&local_config(dir.path()), Path::new("hyperv.yml"))
            .await
            .unwrap();

        assert_eq!(topo.host_names(), vec!["vm1", "vm2", "vm3"]);
        for host in topo.hosts() {
            assert_eq!(host.vars.len(), 4, "{}", host.name);
            assert_eq!(host.vars["ansible_connection"], "psrp");
            assert_eq!(host.vars["ansible_psrp_auth"], "basic");
            assert_eq!(host.vars["ansible_psrp_cert_validation"], "ignore");
        }
        assert_eq!(topo.host("vm2").unwrap().vars["ansible_host"], "10.0.0.2");
        assert_eq!(topo.host("vm2").unwrap().groups.len(), 2);
        assert!(topo.group("lab_web").is_some());
        assert!(topo.group("lab_db").is_some());

        let script = seen.lock().unwrap().clone().unwrap();
        assert!(!script.exists());
    }

    #[tokio::test]
    async fn shared_host_is_looked_up_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut seq = Sequence::new();
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|program, _| program.to_string() == "powershell.exe")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                let doc = json!({ "a": ["vm1"], "b": ["vm1"] }).to_string();
                Ok(CommandOutput::new(0, doc, ""))
            });
        runner
            .expect_run()
            .withf(|program, args| {
                program.to_string() == "/inv/hosts.sh"
                    && args.to_vec() == vec!["--host".to_string(), "vm1".to_string()]
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CommandOutput::new(0, r#"{"ansible_host":"10.9.9.9"}"#, "")));

        let config = InventoryConfig {
            host_script: Some(PathBuf::from("/inv/hosts.sh")),
            ..local_config(dir.path())
        };
        let inv = HyperVInventory::with_runner(Arc::new(runner));
        let topo = inv.load_with_config(&config, Path::new("hyperv.yml")).await.unwrap();

        assert_eq!(topo.hosts().count(), 1);
        let vars = &topo.host("vm1").unwrap().vars;
        assert_eq!(vars["ansible_host"], "10.9.9.9");
        assert_eq!(vars.len(), 4);
    }

    #[tokio::test]
    async fn non_zero_exit_reports_stderr_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Arc::new(Mutex::new(None));
        let runner = script_runner(
            CommandOutput::new(1, "", "Get-VM : You do not have the required permission"),
            seen.clone(),
        );
        let inv = HyperVInventory::with_runner(Arc::new(runner));

        let err = inv
            .load_with_config(&local_config(dir.path()), Path::new("hyperv.yml"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, InventoryErrorKind::Exit);
        assert!(err.message.contains("Inventory script (hyperv.yml) had an execution error"));
        assert!(err.message.contains("required permission"));

        let script = seen.lock().unwrap().clone().unwrap();
        assert!(!script.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn invalid_json_is_a_parse_error_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Arc::new(Mutex::new(None));
        let runner = script_runner(CommandOutput::new(0, "WARNING: not json", "warn text"), seen.clone());
        let inv = HyperVInventory::with_runner(Arc::new(runner));

        let err = inv
            .load_with_config(&local_config(dir.path()), Path::new("hyperv.yml"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, InventoryErrorKind::Parse);
        assert_eq!(err.details.as_deref(), Some("warn text"));
        assert!(!seen.lock().unwrap().clone().unwrap().exists());
    }

    #[tokio::test]
    async fn undecodable_output_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Arc::new(Mutex::new(None));
        let runner = script_runner(CommandOutput::new(0, vec![0xfe_u8, 0xff], ""), seen);
        let inv = HyperVInventory::with_runner(Arc::new(runner));

        let err = inv
            .load_with_config(&local_config(dir.path()), Path::new("hyperv.yml"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, InventoryErrorKind::Decode);
    }

    #[tokio::test]
    async fn bad_hostvars_entry_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        let doc = json!({ "_meta": { "hostvars": { "vm1": "oops" } }, "g": ["vm1"] }).to_string();
        let runner = script_runner(CommandOutput::new(0, doc, ""), Arc::new(Mutex::new(None)));
        let inv = HyperVInventory::with_runner(Arc::new(runner));

        let err = inv
            .load_with_config(&local_config(dir.path()), Path::new("hyperv.yml"))
            .await
            .unwrap_err();
        assert!(err.message.contains("Improperly formatted host information for vm1"));
    }

    #[tokio::test]
    async fn null_hostvars_falls_back_to_host_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut seq = Sequence::new();
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|program, _| program.to_string() == "powershell.exe")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                let doc = json!({ "_meta": { "hostvars": null }, "g": ["vm1"] }).to_string();
                Ok(CommandOutput::new(0, doc, ""))
            });
        runner
            .expect_run()
            .withf(|program, args| {
                program.to_string() == "/inv/hosts.sh"
                    && args.to_vec() == vec!["--host".to_string(), "vm1".to_string()]
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CommandOutput::new(0, r#"{"ansible_host":"1.2.3.4"}"#, "")));

        let config = InventoryConfig {
            host_script: Some(PathBuf::from("/inv/hosts.sh")),
            ..local_config(dir.path())
        };
        let inv = HyperVInventory::with_runner(Arc::new(runner));
        let topo = inv.load_with_config(&config, Path::new("hyperv.yml")).await.unwrap();

        let vars = &topo.host("vm1").unwrap().vars;
        assert_eq!(vars["ansible_host"], "1.2.3.4");
        assert_eq!(vars.len(), 4);
    }

    #[tokio::test]
    async fn script_stderr_is_hidden_unless_always_shown() {
        crate::test_log::install();
        let doc = json!({ "_meta": { "hostvars": {} }, "g": ["vm1"] }).to_string();

        let dir = tempfile::tempdir().unwrap();
        let runner = script_runner(
            CommandOutput::new(0, doc.clone(), "WARNING: quiet-stderr-41c9"),
            Arc::new(Mutex::new(None)),
        );
        HyperVInventory::with_runner(Arc::new(runner))
            .load_with_config(&local_config(dir.path()), Path::new("hyperv.yml"))
            .await
            .unwrap();
        assert!(crate::test_log::matching(log::Level::Warn, "quiet-stderr-41c9").is_empty());

        let runner = script_runner(
            CommandOutput::new(0, doc, "WARNING: loud-stderr-41c9"),
            Arc::new(Mutex::new(None)),
        );
        let config = InventoryConfig {
            always_show_stderr: true,
            ..local_config(dir.path())
        };
        HyperVInventory::with_runner(Arc::new(runner))
            .load_with_config(&config, Path::new("hyperv.yml"))
            .await
            .unwrap();
        let shown = crate::test_log::matching(log::Level::Error, "loud-stderr-41c9");
        assert_eq!(shown.len(), 1);
    }

    #[tokio::test]
    async fn wsl_flow_translates_paths() {
        let dir = tempfile::tempdir().unwrap();
        let local_temp = dir.path().to_string_lossy().into_owned();
        let mut seq = Sequence::new();
        let mut runner = MockCommandRunner::new();

        runner
            .expect_run()
            .withf(|program, args| {
                program.to_string() == "powershell.exe" && args.last().map(|a| a.as_str()) == Some("$env:TEMP")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CommandOutput::new(0, "C:\\Temp\r\n", "")));
        let answer = local_temp.clone();
        runner
            .expect_run()
            .withf(|program, args| program.to_string() == "wslpath" && args.to_vec() == vec!["C:\\Temp".to_string()])
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _| Ok(CommandOutput::new(0, format!("{}\n", answer), "")));
        runner
            .expect_run()
            .withf(|program, args| program.to_string() == "wslpath" && args.first().map(|a| a.as_str()) == Some("-w"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CommandOutput::new(0, "C:\\Temp\\hvinv-x.ps1\n", "")));
        runner
            .expect_run()
            .withf(|program, args| {
                program.to_string() == "powershell.exe"
                    && args.last().map(|a| a.as_str()) == Some("C:\\Temp\\hvinv-x.ps1")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                let doc = json!({ "_meta": { "hostvars": {} }, "lab": { "hosts": ["vm1"] } });
                Ok(CommandOutput::new(0, doc.to_string(), ""))
            });

        let config = InventoryConfig {
            group_name: Some("lab".into()),
            ..Default::default()
        };
        let inv = HyperVInventory::with_runner(Arc::new(runner));
        let topo = inv.load_with_config(&config, Path::new("hyperv.yml")).await.unwrap();

        assert_eq!(topo.host("vm1").unwrap().vars.len(), 3);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn load_reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("lab.hyperv.yml");
        let scripts = dir.path().join("scripts");
        std::fs::create_dir(&scripts).unwrap();
        std::fs::write(
            &config_path,
            format!(
                "plugin: ahaydon.hyperv.vm\ntranslate_paths: false\ngroup_name: lab\ntemp_dir: {}\n",
                scripts.display()
            ),
        )
        .unwrap();

        let runner = script_runner(
            CommandOutput::new(0, json!({ "_meta": { "hostvars": {} } }).to_string(), ""),
            Arc::new(Mutex::new(None)),
        );
        let inv = HyperVInventory::with_runner(Arc::new(runner));
        assert!(inv.verify(&config_path).unwrap());
        let topo = inv.load(&config_path).await.unwrap();
        assert!(topo.is_empty());
        assert_eq!(std::fs::read_dir(&scripts).unwrap().count(), 0);
    }
}
