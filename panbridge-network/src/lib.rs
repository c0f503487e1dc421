//! Linux implementations of the PanBridge collaborators, built on
//! iproute2, iptables, hciconfig, `/proc` and `/sys`.

pub mod bluetooth;
pub mod bridge;
pub mod command;
pub mod connectivity;
pub mod dhcp;
pub mod inventory;
pub mod iptables;
pub mod process;

#[cfg(test)]
mod tests;

pub use bluetooth::LinuxRadio;
pub use bridge::LinuxBridge;
pub use command::CommandRunner;
pub use connectivity::HttpProbe;
pub use dhcp::LinuxDhcpServer;
pub use inventory::LinuxInventory;
pub use iptables::LinuxNat;

use panbridge_core::{Collaborators, Config, Result};
use std::sync::Arc;

pub fn linux_collaborators(config: &Config) -> Result<Collaborators> {
    let runner = CommandRunner::new(config.command_timeout());
    let inventory = LinuxInventory::new(runner.clone());

    Ok(Collaborators {
        inventory: Arc::new(inventory.clone()),
        bridge: Arc::new(LinuxBridge::new(runner.clone(), inventory.clone())),
        radio: Arc::new(LinuxRadio::new(runner.clone(), config.bluetooth.clone())),
        probe: Arc::new(HttpProbe::new(&config.connectivity)?),
        nat: Arc::new(LinuxNat::new(runner)),
        dhcp: Arc::new(LinuxDhcpServer::new(inventory, config.dhcp.clone())),
    })
}
