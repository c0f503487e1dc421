//! Interfaces to the external subsystems the engine drives.
//!
//! Each trait is implemented for Linux in `panbridge-network` and by
//! in-memory fakes in the engine tests.

use crate::{InterfaceSet, MacFilter, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait NetworkInventory: Send + Sync {
    /// Interfaces whose MAC matches `filter`, excluding loopback and bridges.
    async fn list_interfaces(&self, filter: &MacFilter) -> Result<InterfaceSet>;
    async fn wireless_interfaces(&self) -> Result<InterfaceSet>;
    /// IPv4 `address/prefix` of `name`, if one is assigned.
    async fn ip_of(&self, name: &str) -> Result<Option<String>>;
    /// Every IPv4 `address/prefix` on the host, bridges included.
    async fn all_addresses(&self) -> Result<Vec<String>>;

    async fn wired_interfaces(&self, filter: &MacFilter) -> Result<InterfaceSet> {
        let all = self.list_interfaces(filter).await?;
        let wireless = self.wireless_interfaces().await?;
        Ok(all.difference(&wireless).cloned().collect())
    }

    async fn connected_interfaces(&self, filter: &MacFilter) -> Result<InterfaceSet> {
        let mut connected = InterfaceSet::new();
        for name in self.list_interfaces(filter).await? {
            if self.ip_of(&name).await?.is_some() {
                connected.insert(name);
            }
        }
        Ok(connected)
    }
}

#[async_trait]
pub trait BridgeController: Send + Sync {
    async fn list_bridges(&self) -> Result<InterfaceSet>;
    async fn ports_of(&self, bridge: &str) -> Result<InterfaceSet>;
    /// Creates `name` with STP off, zero forward delay and the first host
    /// of `network` as its address, then brings it up.
    async fn create_bridge(&self, name: &str, network: &str) -> Result<()>;
    /// Succeeds when the bridge does not exist.
    async fn delete_bridge(&self, name: &str) -> Result<()>;
    async fn attach_port(&self, bridge: &str, iface: &str) -> Result<()>;
    async fn detach_port(&self, bridge: &str, iface: &str) -> Result<()>;
}

#[async_trait]
pub trait RadioController: Send + Sync {
    async fn list_adapters(&self, filter: &MacFilter) -> Result<InterfaceSet>;
    async fn mac_of(&self, adapter: &str) -> Result<Option<String>>;
    /// Adapters with a live PAN listener.
    async fn list_active_pan_adapters(&self) -> Result<InterfaceSet>;
    /// Restarts the adapter and its PAN listener. Safe to repeat.
    async fn bring_up_for_pan(&self, adapter: &str, bridge: &str, bluetooth_name: &str)
    -> Result<()>;
    /// Kills every PAN listener, including ones left by an earlier run.
    async fn stop_all_listeners(&self) -> Result<()>;
}

#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Never fails; an unreachable or slow host is simply `false`.
    async fn is_internet_reachable(&self) -> bool;
}

#[async_trait]
pub trait NatManager: Send + Sync {
    /// Flushes filter, nat and mangle tables and enables IPv4 forwarding.
    async fn reset_firewall(&self) -> Result<()>;
    /// Masquerades outbound traffic on the first default-route interface.
    async fn enable_masquerade(&self) -> Result<()>;
}

#[async_trait]
pub trait DhcpManager: Send + Sync {
    /// No-op when no DHCP server binary is installed.
    async fn start_dhcp(&self, bridge: &str) -> Result<()>;
    async fn stop_dhcp(&self) -> Result<()>;
}

/// Handles to every collaborator the engine needs.
#[derive(Clone)]
pub struct Collaborators {
    pub inventory: Arc<dyn NetworkInventory>,
    pub bridge: Arc<dyn BridgeController>,
    pub radio: Arc<dyn RadioController>,
    pub probe: Arc<dyn ConnectivityProbe>,
    pub nat: Arc<dyn NatManager>,
    pub dhcp: Arc<dyn DhcpManager>,
}
