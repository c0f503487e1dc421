use crate::output::{OutputFormat, OutputFormatter, print_info, print_success, print_warning};
use colored::*;
use panbridge_core::{
    BridgeController, Config, ConnectivityProbe, InterfaceSet, NetworkInventory, RadioController,
    Result, eligible_interfaces,
};
use panbridge_network::bluetooth::running_listener_devices;
use panbridge_network::inventory::IpLink;
use panbridge_network::{CommandRunner, HttpProbe, LinuxBridge, LinuxInventory, LinuxRadio};
use serde::Serialize;
use tabled::Tabled;

#[derive(Serialize, Tabled)]
struct InterfaceStatus {
    name: String,
    kind: String,
    mac: String,
    ipv4: String,
    state: String,
    bridged: String,
}

#[derive(Serialize)]
struct StatusReport {
    bridge: String,
    bridge_address: Option<String>,
    ports: InterfaceSet,
    eligible: InterfaceSet,
    active_pan: InterfaceSet,
    internet: bool,
    interfaces: Vec<InterfaceStatus>,
}

fn yes_no(flag: bool) -> String {
    if flag {
        "yes".green().to_string()
    } else {
        "no".normal().to_string()
    }
}

fn link_state(link: &IpLink) -> String {
    if link.is_up() {
        return "up".to_string();
    }
    link.operstate
        .as_deref()
        .map_or_else(|| "-".to_string(), str::to_lowercase)
}

pub async fn execute(config: Config, format: OutputFormat) -> Result<()> {
    if !matches!(format, OutputFormat::Table) {
        colored::control::set_override(false);
    }

    let runner = CommandRunner::new(config.command_timeout());
    let inventory = LinuxInventory::new(runner.clone());
    let bridge = LinuxBridge::new(runner.clone(), inventory.clone());
    let radio = LinuxRadio::new(runner, config.bluetooth.clone());
    let probe = HttpProbe::new(&config.connectivity)?;
    let filter = config.mac_filter()?;

    let links = inventory.snapshot().await?;
    let wireless = inventory.wireless_interfaces().await?;
    let wired = inventory.wired_interfaces(&filter).await?;
    let adapters = radio.list_adapters(&filter).await?;
    let active_pan = running_listener_devices(&config.bluetooth.listener_program).await?;
    let addressed = if config.bridge_dhcp {
        Some(inventory.connected_interfaces(&filter).await?)
    } else {
        None
    };
    let eligible = eligible_interfaces(&wired, &adapters, &active_pan, addressed.as_ref());
    let ports = bridge.ports_of(&config.bridge_name).await?;
    let internet = probe.is_internet_reachable().await;

    let mut interfaces: Vec<InterfaceStatus> = links
        .iter()
        .filter(|l| !l.is_loopback() && !l.is_bridge())
        .map(|l| InterfaceStatus {
            name: l.ifname.clone(),
            kind: if wireless.contains(&l.ifname) {
                "wireless".to_string()
            } else {
                "wired".to_string()
            },
            mac: l.address.clone().unwrap_or_else(|| "-".to_string()),
            ipv4: l.ipv4().unwrap_or_else(|| "-".to_string()),
            state: link_state(l),
            bridged: yes_no(ports.contains(&l.ifname)),
        })
        .collect();

    for adapter in &adapters {
        interfaces.push(InterfaceStatus {
            name: adapter.clone(),
            kind: "bluetooth".to_string(),
            mac: radio
                .mac_of(adapter)
                .await?
                .unwrap_or_else(|| "-".to_string()),
            ipv4: "-".to_string(),
            state: if active_pan.contains(adapter) {
                "listening".to_string()
            } else {
                "idle".to_string()
            },
            bridged: yes_no(active_pan.contains(adapter)),
        });
    }

    let bridge_address = links
        .iter()
        .find(|l| l.ifname == config.bridge_name)
        .and_then(|l| l.ipv4());

    match format {
        OutputFormat::Table => {
            println!("{}", format.format_table(interfaces));
            match &bridge_address {
                Some(addr) => print_info(&format!(
                    "Bridge {} at {} with {} port(s)",
                    config.bridge_name,
                    addr,
                    ports.len()
                )),
                None => print_warning(&format!("Bridge {} is not configured", config.bridge_name)),
            }
            let pending: Vec<&str> = eligible
                .difference(&ports)
                .map(String::as_str)
                .collect();
            if !pending.is_empty() {
                print_info(&format!("Waiting to bridge: {}", pending.join(", ")));
            }
            if internet {
                print_success("Internet reachable");
            } else {
                print_warning("Internet unreachable");
            }
        }
        _ => {
            let report = StatusReport {
                bridge: config.bridge_name.clone(),
                bridge_address,
                ports,
                eligible,
                active_pan,
                internet,
                interfaces,
            };
            println!("{}", format.format(report));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(json: &str) -> IpLink {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_link_state_column() {
        assert_eq!(link_state(&link(r#"{"ifname":"eth0","operstate":"UP"}"#)), "up");
        assert_eq!(link_state(&link(r#"{"ifname":"eth1","operstate":"DOWN"}"#)), "down");
        assert_eq!(
            link_state(&link(r#"{"ifname":"wlan0","operstate":"DORMANT"}"#)),
            "dormant"
        );
        assert_eq!(link_state(&link(r#"{"ifname":"usb0"}"#)), "-");
    }
}
