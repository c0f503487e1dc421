use crate::{MacFilter, PanBridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SYSTEM_CONFIG: &str = "/etc/panbridge/config.yaml";

/// Bridge network value that requests free subnet discovery.
pub const AUTO_NETWORK: &str = "auto";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bluetooth_name: String,
    pub bridge_name: String,
    pub bridge_dhcp: bool,
    pub mac_filter: String,
    pub bridge_network: String,
    pub tick_interval_ms: u64,
    pub command_timeout_secs: u64,
    pub reserved_port_pattern: String,
    pub connectivity: ConnectivityConfig,
    pub nat: NatConfig,
    pub dhcp: DhcpConfig,
    pub bluetooth: BluetoothConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NatConfig {
    pub on_disconnect: DisconnectPolicy,
}

/// What the NAT manager does when internet access is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectPolicy {
    /// Flush and re-add masquerade for whatever holds the default route.
    Reprogram,
    /// Flush rules and leave masquerade off.
    Flush,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DhcpConfig {
    pub program: String,
    pub dns_servers: Vec<String>,
    pub lease_secs: u64,
    pub range_start_host: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    pub listener_program: String,
    pub device_class: String,
}

impl Config {
    /// Loads the first config file found, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| PanBridgeError::ConfigError(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("panbridge").join("config.yaml"));
        }
        paths.push(PathBuf::from(SYSTEM_CONFIG));
        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.bridge_name.is_empty() {
            return Err(PanBridgeError::ConfigError(
                "bridge_name must not be empty".to_string(),
            ));
        }
        self.mac_filter()?;
        regex::Regex::new(&self.reserved_port_pattern).map_err(|e| {
            PanBridgeError::ConfigError(format!("invalid reserved_port_pattern: {e}"))
        })?;
        if self.bridge_network != AUTO_NETWORK {
            crate::address::parse(&self.bridge_network)?;
            if self.bridge_dhcp {
                crate::address::host_at(
                    &self.bridge_network,
                    u32::from(self.dhcp.range_start_host),
                )?;
            }
        }
        if self.connectivity.attempts == 0 {
            return Err(PanBridgeError::ConfigError(
                "connectivity.attempts must be at least 1".to_string(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(PanBridgeError::ConfigError(
                "tick_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.command_timeout_secs == 0 {
            return Err(PanBridgeError::ConfigError(
                "command_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn mac_filter(&self) -> Result<MacFilter> {
        MacFilter::new(&self.mac_filter)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bluetooth_name: "panbridge".to_string(),
            bridge_name: "br0".to_string(),
            bridge_dhcp: false,
            mac_filter: ".*".to_string(),
            bridge_network: "10.0.0.0/24".to_string(),
            tick_interval_ms: 1000,
            command_timeout_secs: 10,
            reserved_port_pattern: "^bnep[0-9]+$".to_string(),
            connectivity: ConnectivityConfig::default(),
            nat: NatConfig::default(),
            dhcp: DhcpConfig::default(),
            bluetooth: BluetoothConfig::default(),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            url: "http://www.google.com/".to_string(),
            timeout_secs: 5,
            attempts: 3,
        }
    }
}

impl Default for NatConfig {
    fn default() -> Self {
        Self {
            on_disconnect: DisconnectPolicy::Reprogram,
        }
    }
}

impl Default for DhcpConfig {
    fn default() -> Self {
        Self {
            program: "udhcpd".to_string(),
            dns_servers: vec!["8.8.8.8".to_string(), "8.8.4.4".to_string()],
            lease_secs: 86400,
            range_start_host: 100,
        }
    }
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            listener_program: "bt-pan".to_string(),
            device_class: "0x020300".to_string(),
        }
    }
}
