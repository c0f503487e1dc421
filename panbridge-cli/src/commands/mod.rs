mod cleanup;
mod run;
mod status;

use clap::Subcommand;
use panbridge_core::{Config, Result};

use crate::output::OutputFormat;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rebuild the bridge and keep its membership reconciled until killed
    Run,

    /// Show interfaces, bridge ports, Bluetooth adapters and connectivity
    Status,

    /// Stop PAN listeners and the DHCP server and delete every bridge
    Cleanup,
}

pub async fn execute(command: Command, config: Config, format: OutputFormat) -> Result<()> {
    match command {
        Command::Run => run::execute(config).await,
        Command::Status => status::execute(config, format).await,
        Command::Cleanup => cleanup::execute(config).await,
    }
}
