use crate::dhcp::{render_config, write_config};
use panbridge_core::{DhcpConfig, PanBridgeError, Result};

#[test]
fn test_render_config_for_default_bridge() -> Result<()> {
    let config = render_config("br0", "10.0.0.1/24", &DhcpConfig::default())?;
    assert_eq!(
        config,
        "interface br0\n\
         start 10.0.0.100\n\
         end 10.0.0.254\n\
         opt dns 8.8.8.8 8.8.4.4\n\
         opt router 10.0.0.1\n\
         opt subnet 255.255.255.0\n\
         opt lease 86400\n"
    );
    Ok(())
}

#[test]
fn test_render_config_uses_settings() -> Result<()> {
    let settings = DhcpConfig {
        dns_servers: vec!["1.1.1.1".to_string()],
        lease_secs: 3600,
        range_start_host: 50,
        ..DhcpConfig::default()
    };
    let config = render_config("pan-br", "192.168.4.1/24", &settings)?;

    assert!(config.starts_with("interface pan-br\nstart 192.168.4.50\nend 192.168.4.254\n"));
    assert!(config.contains("opt dns 1.1.1.1\n"));
    assert!(config.contains("opt lease 3600\n"));
    Ok(())
}

#[test]
fn test_render_config_rejects_bad_address() {
    assert!(render_config("br0", "10.0.0.1", &DhcpConfig::default()).is_err());
}

#[test]
fn test_config_file_is_removed_on_drop() -> Result<()> {
    let path = write_config("interface br0\n")?;
    let stored = path.to_path_buf();
    assert_eq!(std::fs::read_to_string(&stored)?, "interface br0\n");
    assert!(
        stored
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("panbridge-dhcpd-") && n.ends_with(".conf"))
    );

    drop(path);
    assert!(!stored.exists());
    Ok(())
}

#[test]
fn test_render_config_for_wider_and_narrower_bridges() -> Result<()> {
    let config = render_config("br0", "10.0.0.1/16", &DhcpConfig::default())?;
    assert!(config.contains("start 10.0.0.100\nend 10.0.255.254\n"));
    assert!(config.contains("opt subnet 255.255.0.0\n"));

    let config = render_config("br0", "10.0.0.1/8", &DhcpConfig::default())?;
    assert!(config.contains("start 10.0.0.100\nend 10.255.255.254\n"));

    let config = render_config("br0", "10.0.0.129/25", &DhcpConfig::default())?;
    assert!(config.contains("start 10.0.0.228\nend 10.0.0.254\n"));
    assert!(config.contains("opt router 10.0.0.129\n"));
    Ok(())
}

#[test]
fn test_render_config_rejects_start_outside_network() {
    let result = render_config("br0", "10.0.0.1/26", &DhcpConfig::default());
    assert!(matches!(result, Err(PanBridgeError::InvalidAddress { .. })));
}
