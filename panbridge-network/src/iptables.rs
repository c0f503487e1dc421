use crate::command::CommandRunner;
use async_trait::async_trait;
use panbridge_core::{NatManager, PanBridgeError, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const TABLES: [&str; 3] = ["filter", "nat", "mangle"];

#[derive(Debug, Deserialize)]
struct Route {
    #[serde(default)]
    dev: Option<String>,
}

/// Device of the first route in `ip -j route show default` output.
pub fn parse_default_route(json: &str) -> Result<Option<String>> {
    if json.trim().is_empty() {
        return Ok(None);
    }
    let routes: Vec<Route> = serde_json::from_str(json)?;
    Ok(routes.into_iter().find_map(|r| r.dev))
}

pub struct LinuxNat {
    runner: CommandRunner,
    ip_forward: PathBuf,
}

impl LinuxNat {
    pub fn new(runner: CommandRunner) -> Self {
        Self {
            runner,
            ip_forward: PathBuf::from("/proc/sys/net/ipv4/ip_forward"),
        }
    }

    async fn default_route_device(&self) -> Result<Option<String>> {
        let stdout = self
            .runner
            .run("read default route", "ip", &["-j", "route", "show", "default"])
            .await?;
        parse_default_route(&stdout)
    }
}

#[async_trait]
impl NatManager for LinuxNat {
    async fn reset_firewall(&self) -> Result<()> {
        info!("Flushing firewall rules");

        for table in TABLES {
            self.runner
                .run("flush firewall chains", "iptables", &["-t", table, "-F"])
                .await?;
            self.runner
                .run("delete firewall chains", "iptables", &["-t", table, "-X"])
                .await?;
        }

        // Enable IP forwarding
        tokio::fs::write(&self.ip_forward, "1")
            .await
            .map_err(|e| PanBridgeError::network("enable IP forwarding", e))?;

        Ok(())
    }

    async fn enable_masquerade(&self) -> Result<()> {
        let Some(dev) = self.default_route_device().await? else {
            warn!("No default route, skipping masquerade");
            return Ok(());
        };

        info!("Masquerading outbound traffic on {}", dev);
        self.runner
            .run(
                "add MASQUERADE rule",
                "iptables",
                &["-t", "nat", "-A", "POSTROUTING", "-o", &dev, "-j", "MASQUERADE"],
            )
            .await?;
        debug!("MASQUERADE rule added for {}", dev);

        Ok(())
    }
}
