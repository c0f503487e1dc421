use crate::command::CommandRunner;
use async_trait::async_trait;
use panbridge_core::{InterfaceSet, MacFilter, NetworkInventory, PanBridgeError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One entry of `ip -j -d addr show`.
#[derive(Debug, Clone, Deserialize)]
pub struct IpLink {
    pub ifname: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub master: Option<String>,
    #[serde(default)]
    pub operstate: Option<String>,
    #[serde(default)]
    pub linkinfo: Option<LinkInfo>,
    #[serde(default)]
    pub addr_info: Vec<AddrInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkInfo {
    #[serde(default)]
    pub info_kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddrInfo {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub local: Option<String>,
    #[serde(default)]
    pub prefixlen: Option<u8>,
}

impl IpLink {
    pub fn is_loopback(&self) -> bool {
        self.link_type.as_deref() == Some("loopback")
    }

    pub fn is_bridge(&self) -> bool {
        self.linkinfo
            .as_ref()
            .and_then(|info| info.info_kind.as_deref())
            == Some("bridge")
    }

    pub fn is_up(&self) -> bool {
        self.operstate.as_deref() == Some("UP")
    }

    /// First IPv4 address as `address/prefix`.
    pub fn ipv4(&self) -> Option<String> {
        self.ipv4_all().into_iter().next()
    }

    pub fn ipv4_all(&self) -> Vec<String> {
        self.addr_info
            .iter()
            .filter(|a| a.family.as_deref() == Some("inet"))
            .filter_map(|a| Some(format!("{}/{}", a.local.as_ref()?, a.prefixlen?)))
            .collect()
    }
}

pub fn parse_links(json: &str) -> Result<Vec<IpLink>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(json)?)
}

/// Manageable interfaces: not loopback, not a bridge, MAC accepted by `filter`.
pub fn select_interfaces(links: &[IpLink], filter: &MacFilter) -> InterfaceSet {
    links
        .iter()
        .filter(|l| !l.is_loopback() && !l.is_bridge())
        .filter(|l| filter.matches(l.address.as_deref()))
        .map(|l| l.ifname.clone())
        .collect()
}

/// Interfaces under a `/sys/class/net`-style directory with wireless
/// extensions or an 802.11 PHY.
pub fn wireless_in(dir: &Path) -> Result<InterfaceSet> {
    let mut wireless = InterfaceSet::new();
    if !dir.exists() {
        return Ok(wireless);
    }

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.join("wireless").exists() || path.join("phy80211").exists() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                wireless.insert(name.to_string());
            }
        }
    }

    Ok(wireless)
}

#[derive(Debug, Clone)]
pub struct LinuxInventory {
    runner: CommandRunner,
    net_class: PathBuf,
}

impl LinuxInventory {
    pub fn new(runner: CommandRunner) -> Self {
        Self {
            runner,
            net_class: PathBuf::from("/sys/class/net"),
        }
    }

    pub async fn snapshot(&self) -> Result<Vec<IpLink>> {
        let stdout = self
            .runner
            .run("list interfaces", "ip", &["-j", "-d", "addr", "show"])
            .await?;
        parse_links(&stdout).map_err(|e| PanBridgeError::network("parse interface list", e))
    }
}

#[async_trait]
impl NetworkInventory for LinuxInventory {
    async fn list_interfaces(&self, filter: &MacFilter) -> Result<InterfaceSet> {
        Ok(select_interfaces(&self.snapshot().await?, filter))
    }

    async fn wireless_interfaces(&self) -> Result<InterfaceSet> {
        wireless_in(&self.net_class)
    }

    async fn ip_of(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .snapshot()
            .await?
            .into_iter()
            .find(|l| l.ifname == name)
            .and_then(|l| l.ipv4()))
    }

    async fn all_addresses(&self) -> Result<Vec<String>> {
        Ok(self
            .snapshot()
            .await?
            .iter()
            .flat_map(IpLink::ipv4_all)
            .collect())
    }

    async fn connected_interfaces(&self, filter: &MacFilter) -> Result<InterfaceSet> {
        let links = self.snapshot().await?;
        let manageable = select_interfaces(&links, filter);
        Ok(links
            .into_iter()
            .filter(|l| manageable.contains(&l.ifname) && l.ipv4().is_some())
            .map(|l| l.ifname)
            .collect())
    }
}
