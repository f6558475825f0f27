use clap::{ArgAction, ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hyperv-inventory")]
#[command(about = "Dynamic inventory of running Hyper-V virtual machines.")]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["list", "host", "verify", "module_doc"])
))]
pub struct CommandLine {
    /// Plugin config file
    #[arg(short = 'i', long = "inventory", default_value = "hyperv.yml")]
    pub inventory: PathBuf,

    /// Print every group and host as inventory JSON
    #[arg(long)]
    pub list: bool,

    /// Print the variables of one host
    #[arg(long, value_name = "NAME")]
    pub host: Option<String>,

    /// Check whether the config file belongs to this plugin
    #[arg(long)]
    pub verify: bool,

    /// Print the hyperv_vm module documentation
    #[arg(long)]
    pub module_doc: bool,

    /// Indent JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    Host(String),
    Verify,
    ModuleDoc,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn action(&self) -> Action {
        if let Some(ref host) = self.host {
            Action::Host(host.clone())
        } else if self.verify {
            Action::Verify
        } else if self.module_doc {
            Action::ModuleDoc
        } else {
            Action::List
        }
    }
}
