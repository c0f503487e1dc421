use crate::bluetooth::{
    adapters_in, is_adapter_name, listener_args, listener_device, parse_bd_address,
};
use panbridge_core::Result;

const HCICONFIG: &str = "hci0:\tType: Primary  Bus: UART\n\
\tBD Address: B8:27:EB:4F:21:07  ACL MTU: 1021:8  SCO MTU: 64:1\n\
\tUP RUNNING PSCAN ISCAN\n\
\tRX bytes:1540 acl:0 sco:0 events:95 errors:0\n";

fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

#[test]
fn test_parse_bd_address() {
    assert_eq!(
        parse_bd_address(HCICONFIG).as_deref(),
        Some("B8:27:EB:4F:21:07")
    );
    assert_eq!(parse_bd_address("hci0:\tType: Primary\n"), None);
}

#[test]
fn test_listener_device_argument() {
    let python = argv(&[
        "/usr/bin/python3",
        "/usr/local/bin/bt-pan",
        "--device",
        "hci1",
        "server",
        "br0",
    ]);
    assert_eq!(listener_device(&python), Some("hci1"));

    let short = argv(&["bt-pan", "-i", "hci0", "server", "br0"]);
    assert_eq!(listener_device(&short), Some("hci0"));

    let joined = argv(&["bt-pan", "--device=hci2", "server", "br0"]);
    assert_eq!(listener_device(&joined), Some("hci2"));

    let missing = argv(&["bt-pan", "server", "br0", "--device"]);
    assert_eq!(listener_device(&missing), None);
}

#[test]
fn test_listener_args_round_trip_device() {
    let args = argv(&listener_args("hci0", "br0"));
    assert_eq!(listener_device(&args), Some("hci0"));
    assert_eq!(args.last().map(String::as_str), Some("br0"));
}

#[test]
fn test_adapter_names() {
    assert!(is_adapter_name("hci0"));
    assert!(is_adapter_name("hci10"));
    assert!(!is_adapter_name("hci"));
    assert!(!is_adapter_name("hci0:12"));
    assert!(!is_adapter_name("eth0"));
}

#[test]
fn test_adapters_from_sysfs() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::create_dir_all(dir.path().join("hci0"))?;
    std::fs::create_dir_all(dir.path().join("hci1"))?;
    std::fs::create_dir_all(dir.path().join("hci0:11"))?;

    let adapters = adapters_in(dir.path())?;
    let names: Vec<&str> = adapters.iter().map(String::as_str).collect();
    assert_eq!(names, vec!["hci0", "hci1"]);
    Ok(())
}
