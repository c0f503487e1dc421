use crate::command::CommandRunner;
use crate::process;
use async_trait::async_trait;
use panbridge_core::{
    BluetoothConfig, InterfaceSet, MacFilter, PanBridgeError, RadioController, Result,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Extracts the `BD Address:` field from `hciconfig <adapter>` output.
pub fn parse_bd_address(output: &str) -> Option<String> {
    output
        .split("BD Address:")
        .nth(1)?
        .split_whitespace()
        .next()
        .map(str::to_string)
}

/// Adapter named by a PAN listener's `--device`/`-i` argument.
pub fn listener_device(argv: &[String]) -> Option<&str> {
    argv.iter().enumerate().find_map(|(i, arg)| {
        if let Some(device) = arg.strip_prefix("--device=") {
            return Some(device);
        }
        match arg.as_str() {
            "--device" | "-i" => argv.get(i + 1).map(String::as_str),
            _ => None,
        }
    })
}

pub fn listener_args<'a>(adapter: &'a str, bridge: &'a str) -> [&'a str; 4] {
    ["--device", adapter, "server", bridge]
}

pub fn is_adapter_name(name: &str) -> bool {
    name.strip_prefix("hci")
        .is_some_and(|unit| !unit.is_empty() && unit.chars().all(|c| c.is_ascii_digit()))
}

/// HCI adapters under a `/sys/class/bluetooth`-style directory.
pub fn adapters_in(dir: &Path) -> Result<InterfaceSet> {
    let mut adapters = InterfaceSet::new();
    if !dir.exists() {
        return Ok(adapters);
    }

    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name();
        if let Some(name) = name.to_str().filter(|n| is_adapter_name(n)) {
            adapters.insert(name.to_string());
        }
    }

    Ok(adapters)
}

/// Drives HCI adapters through `hciconfig` and owns one PAN listener
/// process per adapter.
pub struct LinuxRadio {
    runner: CommandRunner,
    settings: BluetoothConfig,
    class_dir: PathBuf,
    listeners: Mutex<HashMap<String, Child>>,
}

impl LinuxRadio {
    pub fn new(runner: CommandRunner, settings: BluetoothConfig) -> Self {
        Self {
            runner,
            settings,
            class_dir: PathBuf::from("/sys/class/bluetooth"),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    async fn hciconfig(&self, adapter: &str, args: &[&str]) -> Result<()> {
        let mut full = vec![adapter];
        full.extend_from_slice(args);
        self.runner
            .run(&format!("hciconfig {}", args.join(" ")), "hciconfig", &full)
            .await
            .map(|_| ())
    }

    async fn stop_listener(&self, adapter: &str) -> Result<()> {
        let registered = self.listeners.lock().await.remove(adapter);
        if let Some(mut child) = registered {
            debug!("Stopping PAN listener for {}", adapter);
            if let Err(e) = child.kill().await {
                debug!("PAN listener for {} already gone: {}", adapter, e);
            }
        }

        // Listeners not started by this process
        let program = self.settings.listener_program.clone();
        let device = adapter.to_string();
        process::kill_matching(move |p| {
            process::runs_program(&p.argv, &program)
                && listener_device(&p.argv) == Some(device.as_str())
        })
        .await?;

        Ok(())
    }

    fn spawn_listener(&self, adapter: &str, bridge: &str) -> Result<Child> {
        Command::new(&self.settings.listener_program)
            .args(listener_args(adapter, bridge))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PanBridgeError::process("spawn PAN listener", e))
    }
}

#[async_trait]
impl RadioController for LinuxRadio {
    async fn list_adapters(&self, filter: &MacFilter) -> Result<InterfaceSet> {
        let mut matching = InterfaceSet::new();
        for adapter in adapters_in(&self.class_dir)? {
            match self.mac_of(&adapter).await {
                Ok(mac) if filter.matches(mac.as_deref()) => {
                    matching.insert(adapter);
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to read address of {}: {}", adapter, e),
            }
        }
        Ok(matching)
    }

    async fn mac_of(&self, adapter: &str) -> Result<Option<String>> {
        let stdout = self
            .runner
            .run("read adapter address", "hciconfig", &[adapter])
            .await?;
        Ok(parse_bd_address(&stdout))
    }

    async fn list_active_pan_adapters(&self) -> Result<InterfaceSet> {
        let mut listeners = self.listeners.lock().await;
        listeners.retain(|adapter, child| match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                info!("PAN listener for {} exited: {}", adapter, status);
                false
            }
            Err(e) => {
                warn!("Failed to poll PAN listener for {}: {}", adapter, e);
                false
            }
        });
        Ok(listeners.keys().cloned().collect())
    }

    async fn bring_up_for_pan(
        &self,
        adapter: &str,
        bridge: &str,
        bluetooth_name: &str,
    ) -> Result<()> {
        info!("Preparing {} for PAN on {}", adapter, bridge);
        self.stop_listener(adapter).await?;

        let name = format!("{bluetooth_name}-{adapter}");
        self.hciconfig(adapter, &["up"]).await?;
        self.hciconfig(adapter, &["reset"]).await?;
        self.hciconfig(adapter, &["name", &name]).await?;
        self.hciconfig(adapter, &["class", &self.settings.device_class])
            .await?;
        self.hciconfig(adapter, &["lm", "master,accept"]).await?;
        self.hciconfig(adapter, &["piscan"]).await?;

        let child = self.spawn_listener(adapter, bridge)?;
        info!(
            "Started {} for {} (pid {:?}) as '{}'",
            self.settings.listener_program,
            adapter,
            child.id(),
            name
        );
        self.listeners.lock().await.insert(adapter.to_string(), child);

        Ok(())
    }

    async fn stop_all_listeners(&self) -> Result<()> {
        let adapters: Vec<String> = self.listeners.lock().await.keys().cloned().collect();
        for adapter in adapters {
            self.stop_listener(&adapter).await?;
        }

        process::kill_program(&self.settings.listener_program).await?;
        Ok(())
    }
}

/// Adapters with a running `program` listener, found by scanning `/proc`.
/// Used where no in-process registry exists, such as one-shot status.
pub async fn running_listener_devices(program: &str) -> Result<InterfaceSet> {
    Ok(process::scan_processes()
        .await?
        .iter()
        .filter(|p| process::runs_program(&p.argv, program))
        .filter_map(|p| listener_device(&p.argv).map(str::to_string))
        .collect())
}
