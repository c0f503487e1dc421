use crate::{
    BridgeController, Collaborators, ConnectivityProbe, DhcpManager, InterfaceSet, MacFilter,
    NatManager, NetworkInventory, PanBridgeError, RadioController, Result,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct FakeInterface {
    pub mac: Option<String>,
    pub wireless: bool,
    pub ip: Option<String>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub interfaces: BTreeMap<String, FakeInterface>,
    pub bridges: BTreeMap<String, InterfaceSet>,
    pub bridge_networks: BTreeMap<String, String>,
    pub adapters: BTreeMap<String, String>,
    pub active_pan: InterfaceSet,
    pub reachable: bool,
    pub firewall_resets: usize,
    pub masquerades: usize,
    pub dhcp_running: Option<String>,
    pub dhcp_stops: usize,
    pub listener_stops: usize,
    pub attach_calls: Vec<String>,
    pub detach_calls: Vec<String>,
    pub pan_calls: Vec<(String, String, String)>,
    pub failing: InterfaceSet,
}

/// In-memory host implementing every collaborator trait.
#[derive(Default)]
pub struct FakeSystem {
    pub state: Mutex<FakeState>,
}

impl FakeSystem {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            inventory: self.clone(),
            bridge: self.clone(),
            radio: self.clone(),
            probe: self.clone(),
            nat: self.clone(),
            dhcp: self.clone(),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn add_wired(&self, name: &str, mac: &str) {
        self.with(|s| {
            s.interfaces.insert(
                name.to_string(),
                FakeInterface {
                    mac: Some(mac.to_string()),
                    ..Default::default()
                },
            );
        });
    }

    pub fn add_wireless(&self, name: &str, mac: &str) {
        self.with(|s| {
            s.interfaces.insert(
                name.to_string(),
                FakeInterface {
                    mac: Some(mac.to_string()),
                    wireless: true,
                    ip: None,
                },
            );
        });
    }

    pub fn add_adapter(&self, name: &str, mac: &str) {
        self.with(|s| {
            s.adapters.insert(name.to_string(), mac.to_string());
        });
    }

    pub fn set_ip(&self, name: &str, ip: &str) {
        self.with(|s| {
            if let Some(iface) = s.interfaces.get_mut(name) {
                iface.ip = Some(ip.to_string());
            }
        });
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.with(|s| s.reachable = reachable);
    }

    pub fn ports(&self, bridge: &str) -> InterfaceSet {
        self.with(|s| s.bridges.get(bridge).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl NetworkInventory for FakeSystem {
    async fn list_interfaces(&self, filter: &MacFilter) -> Result<InterfaceSet> {
        Ok(self.with(|s| {
            s.interfaces
                .iter()
                .filter(|(_, iface)| filter.matches(iface.mac.as_deref()))
                .map(|(name, _)| name.clone())
                .collect()
        }))
    }

    async fn wireless_interfaces(&self) -> Result<InterfaceSet> {
        Ok(self.with(|s| {
            s.interfaces
                .iter()
                .filter(|(_, iface)| iface.wireless)
                .map(|(name, _)| name.clone())
                .collect()
        }))
    }

    async fn ip_of(&self, name: &str) -> Result<Option<String>> {
        Ok(self.with(|s| s.interfaces.get(name).and_then(|i| i.ip.clone())))
    }

    async fn all_addresses(&self) -> Result<Vec<String>> {
        Ok(self.with(|s| s.interfaces.values().filter_map(|i| i.ip.clone()).collect()))
    }
}

#[async_trait]
impl BridgeController for FakeSystem {
    async fn list_bridges(&self) -> Result<InterfaceSet> {
        Ok(self.with(|s| s.bridges.keys().cloned().collect()))
    }

    async fn ports_of(&self, bridge: &str) -> Result<InterfaceSet> {
        Ok(self.ports(bridge))
    }

    async fn create_bridge(&self, name: &str, network: &str) -> Result<()> {
        self.with(|s| {
            s.bridges.insert(name.to_string(), InterfaceSet::new());
            s.bridge_networks
                .insert(name.to_string(), network.to_string());
        });
        Ok(())
    }

    async fn delete_bridge(&self, name: &str) -> Result<()> {
        self.with(|s| {
            s.bridges.remove(name);
            s.bridge_networks.remove(name);
        });
        Ok(())
    }

    async fn attach_port(&self, bridge: &str, iface: &str) -> Result<()> {
        self.with(|s| {
            s.attach_calls.push(iface.to_string());
            if s.failing.contains(iface) {
                return Err(PanBridgeError::network("attach port", "injected failure"));
            }
            s.bridges
                .entry(bridge.to_string())
                .or_default()
                .insert(iface.to_string());
            Ok(())
        })
    }

    async fn detach_port(&self, bridge: &str, iface: &str) -> Result<()> {
        self.with(|s| {
            s.detach_calls.push(iface.to_string());
            if let Some(ports) = s.bridges.get_mut(bridge) {
                ports.remove(iface);
            }
        });
        Ok(())
    }
}

#[async_trait]
impl RadioController for FakeSystem {
    async fn list_adapters(&self, filter: &MacFilter) -> Result<InterfaceSet> {
        Ok(self.with(|s| {
            s.adapters
                .iter()
                .filter(|(_, mac)| filter.matches(Some(mac.as_str())))
                .map(|(name, _)| name.clone())
                .collect()
        }))
    }

    async fn mac_of(&self, adapter: &str) -> Result<Option<String>> {
        Ok(self.with(|s| s.adapters.get(adapter).cloned()))
    }

    async fn list_active_pan_adapters(&self) -> Result<InterfaceSet> {
        Ok(self.with(|s| s.active_pan.clone()))
    }

    async fn bring_up_for_pan(
        &self,
        adapter: &str,
        bridge: &str,
        bluetooth_name: &str,
    ) -> Result<()> {
        self.with(|s| {
            s.pan_calls.push((
                adapter.to_string(),
                bridge.to_string(),
                bluetooth_name.to_string(),
            ));
            if s.failing.contains(adapter) {
                return Err(PanBridgeError::process("start PAN listener", "injected failure"));
            }
            s.active_pan.insert(adapter.to_string());
            Ok(())
        })
    }

    async fn stop_all_listeners(&self) -> Result<()> {
        self.with(|s| {
            s.active_pan.clear();
            s.listener_stops += 1;
        });
        Ok(())
    }
}

#[async_trait]
impl ConnectivityProbe for FakeSystem {
    async fn is_internet_reachable(&self) -> bool {
        self.with(|s| s.reachable)
    }
}

#[async_trait]
impl NatManager for FakeSystem {
    async fn reset_firewall(&self) -> Result<()> {
        self.with(|s| s.firewall_resets += 1);
        Ok(())
    }

    async fn enable_masquerade(&self) -> Result<()> {
        self.with(|s| s.masquerades += 1);
        Ok(())
    }
}

#[async_trait]
impl DhcpManager for FakeSystem {
    async fn start_dhcp(&self, bridge: &str) -> Result<()> {
        self.with(|s| s.dhcp_running = Some(bridge.to_string()));
        Ok(())
    }

    async fn stop_dhcp(&self) -> Result<()> {
        self.with(|s| {
            s.dhcp_running = None;
            s.dhcp_stops += 1;
        });
        Ok(())
    }
}
