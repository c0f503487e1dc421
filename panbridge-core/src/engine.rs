use crate::address;
use crate::config::{AUTO_NETWORK, Config, DisconnectPolicy};
use crate::connectivity::{ConnectivityState, Transition};
use crate::system::Collaborators;
use crate::{InterfaceKind, InterfaceSet, MacFilter, PanBridgeError, ReconcileReport, Result};
use regex::Regex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Interfaces that should be bridge ports: wired interfaces plus Bluetooth
/// adapters still lacking a PAN listener, minus anything already addressed
/// when `addressed` is given (DHCP mode).
pub fn eligible_interfaces(
    wired: &InterfaceSet,
    adapters: &InterfaceSet,
    active_pan: &InterfaceSet,
    addressed: Option<&InterfaceSet>,
) -> InterfaceSet {
    let mut eligible: InterfaceSet = wired.clone();
    eligible.extend(adapters.difference(active_pan).cloned());

    if let Some(addressed) = addressed {
        eligible.retain(|name| !addressed.contains(name));
    }

    eligible
}

/// Ports to detach: attached but undesired, skipping PAN virtual ports
/// which their listener manages.
pub fn detach_candidates(
    ports: &InterfaceSet,
    desired: &InterfaceSet,
    reserved: &Regex,
) -> InterfaceSet {
    ports
        .difference(desired)
        .filter(|port| !reserved.is_match(port))
        .cloned()
        .collect()
}

/// Keeps the managed bridge's membership in line with live inventory and
/// reprograms NAT on connectivity edges.
pub struct Reconciler {
    config: Config,
    system: Collaborators,
    filter: MacFilter,
    reserved: Regex,
    connectivity: ConnectivityState,
}

impl Reconciler {
    pub fn new(config: Config, system: Collaborators) -> Result<Self> {
        config.validate()?;
        let filter = config.mac_filter()?;
        let reserved = Regex::new(&config.reserved_port_pattern)
            .map_err(|e| PanBridgeError::ConfigError(e.to_string()))?;

        Ok(Self {
            config,
            system,
            filter,
            reserved,
            connectivity: ConnectivityState::default(),
        })
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.connectivity
    }

    /// Stops leftover listeners and DHCP servers and deletes every bridge.
    pub async fn cleanup(&self) -> Result<()> {
        if let Err(e) = self.system.radio.stop_all_listeners().await {
            warn!("Failed to stop PAN listeners: {}", e);
        }
        if let Err(e) = self.system.dhcp.stop_dhcp().await {
            warn!("Failed to stop DHCP server: {}", e);
        }

        for bridge in self.system.bridge.list_bridges().await? {
            info!("Removing bridge {}", bridge);
            self.system.bridge.delete_bridge(&bridge).await?;
        }

        Ok(())
    }

    /// Brings the host to a known-clean state and creates the bridge.
    pub async fn startup(&self) -> Result<()> {
        self.cleanup().await?;

        let network = self.bridge_network().await?;
        info!("Creating bridge {} on {}", self.config.bridge_name, network);
        self.system
            .bridge
            .create_bridge(&self.config.bridge_name, &network)
            .await?;

        if self.config.bridge_dhcp {
            info!("Starting DHCP server on {}", self.config.bridge_name);
            self.system.dhcp.start_dhcp(&self.config.bridge_name).await?;
        }

        Ok(())
    }

    async fn bridge_network(&self) -> Result<String> {
        if self.config.bridge_network != AUTO_NETWORK {
            return address::network(&self.config.bridge_network);
        }

        let observed = self.system.inventory.all_addresses().await?;
        address::next_free_subnet(observed.iter().map(String::as_str))
    }

    /// One loop iteration: connectivity first, then membership.
    pub async fn tick(&mut self) -> Result<ReconcileReport> {
        self.handle_connectivity().await;
        self.reconcile().await
    }

    pub async fn handle_connectivity(&mut self) -> Option<Transition> {
        let reachable = self.system.probe.is_internet_reachable().await;
        let transition = self.connectivity.observe(reachable)?;

        match transition {
            Transition::Connected => {
                info!("Internet connectivity established, enabling NAT");
                self.program_nat(true).await;
            }
            Transition::Disconnected => {
                info!("Internet connectivity lost, reprogramming NAT");
                let masquerade = self.config.nat.on_disconnect == DisconnectPolicy::Reprogram;
                self.program_nat(masquerade).await;
            }
        }

        Some(transition)
    }

    async fn program_nat(&self, masquerade: bool) {
        if let Err(e) = self.system.nat.reset_firewall().await {
            error!("Failed to reset firewall: {}", e);
            return;
        }
        if masquerade {
            if let Err(e) = self.system.nat.enable_masquerade().await {
                error!("Failed to enable masquerade: {}", e);
            }
        }
    }

    pub async fn desired_interfaces(&self) -> Result<InterfaceSet> {
        let inventory = &self.system.inventory;
        let radio = &self.system.radio;

        let wired = inventory.wired_interfaces(&self.filter).await?;
        let adapters = radio.list_adapters(&self.filter).await?;
        let active = radio.list_active_pan_adapters().await?;
        let addressed = if self.config.bridge_dhcp {
            Some(inventory.connected_interfaces(&self.filter).await?)
        } else {
            None
        };

        Ok(eligible_interfaces(
            &wired,
            &adapters,
            &active,
            addressed.as_ref(),
        ))
    }

    /// Detaches undesired ports, then brings up missing ones. Failures on
    /// one interface are logged and do not stop the others.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let bridge = &self.config.bridge_name;
        let desired = self.desired_interfaces().await?;
        let ports = self.system.bridge.ports_of(bridge).await?;
        let mut report = ReconcileReport::default();

        for port in detach_candidates(&ports, &desired, &self.reserved) {
            match self.system.bridge.detach_port(bridge, &port).await {
                Ok(()) => {
                    info!("Removed {} from {}", port, bridge);
                    report.detached.insert(port);
                }
                Err(e) => {
                    warn!("Failed to remove {} from {}: {}", port, bridge, e);
                    report.failed.insert(port);
                }
            }
        }

        for iface in desired.difference(&ports) {
            let kind = InterfaceKind::classify(iface);
            debug!("Bringing up {} ({})", iface, kind);

            match self.bring_up(kind, iface).await {
                Ok(()) => {
                    match kind {
                        InterfaceKind::Wired => {
                            info!("Bridged {} to {}", iface, bridge);
                            report.attached.insert(iface.clone());
                        }
                        InterfaceKind::Bluetooth => {
                            info!("Started PAN listener on {} for {}", iface, bridge);
                            report.pan_started.insert(iface.clone());
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to bridge {}: {}", iface, e);
                    report.failed.insert(iface.clone());
                }
            }
        }

        Ok(report)
    }

    /// Bluetooth adapters join indirectly: the PAN listener attaches its
    /// virtual port once a peer connects.
    async fn bring_up(&self, kind: InterfaceKind, iface: &str) -> Result<()> {
        let bridge = &self.config.bridge_name;
        match kind {
            InterfaceKind::Wired => self.system.bridge.attach_port(bridge, iface).await,
            InterfaceKind::Bluetooth => {
                self.system
                    .radio
                    .bring_up_for_pan(iface, bridge, &self.config.bluetooth_name)
                    .await
            }
        }
    }

    /// Runs startup, then ticks forever at the configured period.
    pub async fn run(&mut self) -> Result<()> {
        self.startup().await?;
        info!(
            "Reconciling {} every {:?}",
            self.config.bridge_name,
            self.config.tick_interval()
        );

        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;

            match self.tick().await {
                Ok(report) if !report.is_noop() => debug!("Reconcile pass: {:?}", report),
                Ok(_) => {}
                Err(e) => error!("Reconcile pass failed: {}", e),
            }
        }
    }
}
