use hyperv_inventory::cli::CommandLine;
use hyperv_inventory::{execute, logging, HyperVInventory};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = CommandLine::parse_args();
    logging::init(cmd.verbose)?;

    let source = HyperVInventory::new();
    let outcome = execute(&source, &cmd).await?;
    println!("{}", outcome.output);

    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
