use crate::process;
use async_trait::async_trait;
use panbridge_core::{
    DhcpConfig, DhcpManager, NetworkInventory, PanBridgeError, Result, address,
};
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use tempfile::TempPath;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Renders a udhcpd configuration serving leases on `bridge`, whose own
/// address is `bridge_address` (`address/prefix`).
pub fn render_config(bridge: &str, bridge_address: &str, settings: &DhcpConfig) -> Result<String> {
    let start = address::host_at(bridge_address, u32::from(settings.range_start_host))?;

    Ok(format!(
        "interface {bridge}\n\
         start {start}\n\
         end {end}\n\
         opt dns {dns}\n\
         opt router {router}\n\
         opt subnet {subnet}\n\
         opt lease {lease}\n",
        end = address::host_max(bridge_address)?,
        dns = settings.dns_servers.join(" "),
        router = address::host_min(bridge_address)?,
        subnet = address::netmask(bridge_address)?,
        lease = settings.lease_secs,
    ))
}

/// Writes `contents` to a fresh temporary file, removed when the returned
/// path is dropped.
pub fn write_config(contents: &str) -> Result<TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix("panbridge-dhcpd-")
        .suffix(".conf")
        .tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file.into_temp_path())
}

struct RunningServer {
    child: Child,
    _config: TempPath,
}

pub struct LinuxDhcpServer<I> {
    inventory: I,
    settings: DhcpConfig,
    running: Mutex<Option<RunningServer>>,
}

impl<I: NetworkInventory> LinuxDhcpServer<I> {
    pub fn new(inventory: I, settings: DhcpConfig) -> Self {
        Self {
            inventory,
            settings,
            running: Mutex::new(None),
        }
    }

    fn program_name(&self) -> &str {
        Path::new(&self.settings.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.settings.program)
    }
}

#[async_trait]
impl<I: NetworkInventory> DhcpManager for LinuxDhcpServer<I> {
    async fn start_dhcp(&self, bridge: &str) -> Result<()> {
        let Ok(binary) = which::which(&self.settings.program) else {
            info!("{} not installed, not serving DHCP", self.settings.program);
            return Ok(());
        };

        let bridge_address = self.inventory.ip_of(bridge).await?.ok_or_else(|| {
            PanBridgeError::network("start DHCP server", format!("{bridge} has no IPv4 address"))
        })?;

        self.stop_dhcp().await?;

        let contents = render_config(bridge, &bridge_address, &self.settings)?;
        let config = write_config(&contents)?;
        debug!("DHCP configuration at {}:\n{}", config.display(), contents);

        let child = Command::new(&binary)
            .arg("-f")
            .arg(&*config)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PanBridgeError::process("spawn DHCP server", e))?;

        info!("Serving DHCP on {} (pid {:?})", bridge, child.id());
        *self.running.lock().await = Some(RunningServer {
            child,
            _config: config,
        });

        Ok(())
    }

    async fn stop_dhcp(&self) -> Result<()> {
        let running = self.running.lock().await.take();
        if let Some(mut server) = running {
            debug!("Stopping DHCP server");
            if let Err(e) = server.child.kill().await {
                debug!("DHCP server already gone: {}", e);
            }
        }

        process::kill_program(self.program_name()).await?;
        Ok(())
    }
}
