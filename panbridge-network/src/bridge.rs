use crate::command::CommandRunner;
use crate::inventory::{LinuxInventory, parse_links};
use async_trait::async_trait;
use panbridge_core::{BridgeController, InterfaceSet, Result, address};
use tracing::{debug, info};

const MISSING_DEVICE: &[&str] = &["Cannot find device", "does not exist"];

pub struct LinuxBridge {
    runner: CommandRunner,
    inventory: LinuxInventory,
}

impl LinuxBridge {
    pub fn new(runner: CommandRunner, inventory: LinuxInventory) -> Self {
        Self { runner, inventory }
    }

    async fn ip(&self, operation: &str, args: &[&str]) -> Result<()> {
        self.runner.run(operation, "ip", args).await.map(|_| ())
    }
}

#[async_trait]
impl BridgeController for LinuxBridge {
    async fn list_bridges(&self) -> Result<InterfaceSet> {
        Ok(self
            .inventory
            .snapshot()
            .await?
            .into_iter()
            .filter(|l| l.is_bridge())
            .map(|l| l.ifname)
            .collect())
    }

    async fn ports_of(&self, bridge: &str) -> Result<InterfaceSet> {
        let stdout = self
            .runner
            .run_tolerant(
                "list bridge ports",
                "ip",
                &["-j", "link", "show", "master", bridge],
                MISSING_DEVICE,
            )
            .await?;

        match stdout {
            Some(json) => Ok(parse_links(&json)?.into_iter().map(|l| l.ifname).collect()),
            None => Ok(InterfaceSet::new()),
        }
    }

    async fn create_bridge(&self, name: &str, network: &str) -> Result<()> {
        let gateway = address::gateway(network)?;
        info!("Creating bridge: {} ({})", name, gateway);

        if self
            .runner
            .run_tolerant(
                "create bridge",
                "ip",
                &["link", "add", "name", name, "type", "bridge"],
                &["File exists"],
            )
            .await?
            .is_none()
        {
            debug!("Bridge {} already exists", name);
        }

        // No spanning tree, forward immediately
        self.ip(
            "configure bridge",
            &[
                "link", "set", "dev", name, "type", "bridge", "stp_state", "0",
                "forward_delay", "0",
            ],
        )
        .await?;

        self.runner
            .run_tolerant(
                "configure bridge IP",
                "ip",
                &["addr", "add", &gateway, "dev", name],
                &["File exists"],
            )
            .await?;

        self.ip("bring up bridge", &["link", "set", "dev", name, "up"])
            .await
    }

    async fn delete_bridge(&self, name: &str) -> Result<()> {
        info!("Deleting bridge: {}", name);

        self.runner
            .run_tolerant(
                "bring down bridge",
                "ip",
                &["link", "set", "dev", name, "down"],
                MISSING_DEVICE,
            )
            .await?;
        self.runner
            .run_tolerant(
                "delete bridge",
                "ip",
                &["link", "delete", name],
                MISSING_DEVICE,
            )
            .await?;

        Ok(())
    }

    async fn attach_port(&self, bridge: &str, iface: &str) -> Result<()> {
        debug!("Adding {} to bridge {}", iface, bridge);

        self.ip("bring up interface", &["link", "set", "dev", iface, "up"])
            .await?;
        self.ip(
            "add port to bridge",
            &["link", "set", "dev", iface, "master", bridge],
        )
        .await
    }

    async fn detach_port(&self, bridge: &str, iface: &str) -> Result<()> {
        debug!("Removing {} from bridge {}", iface, bridge);

        self.ip(
            "remove port from bridge",
            &["link", "set", "dev", iface, "nomaster"],
        )
        .await
    }
}
