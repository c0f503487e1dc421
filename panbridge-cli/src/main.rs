mod commands;
mod output;

use clap::Parser;
use panbridge_core::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "panbridge")]
#[command(about = "PanBridge - keeps a network bridge in sync with wired and Bluetooth PAN interfaces", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    #[arg(short, long, global = true, help = "Verbose output")]
    verbose: bool,

    #[arg(short, long, global = true, help = "Quiet output")]
    quiet: bool,

    #[arg(
        long,
        global = true,
        help = "Output format",
        value_enum,
        default_value = "table"
    )]
    format: output::OutputFormat,

    #[arg(short, long, global = true, env = "PANBRIDGE_CONFIG", help = "Path to config.yaml")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Name of the managed bridge")]
    bridge_name: Option<String>,

    #[arg(long, global = true, help = "Base name advertised by Bluetooth adapters")]
    bluetooth_name: Option<String>,

    #[arg(long, global = true, help = "Serve DHCP on the bridge")]
    dhcp: bool,

    #[arg(long, global = true, help = "Regex over MAC addresses of manageable interfaces")]
    mac_filter: Option<String>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(name) = &self.bridge_name {
            config.bridge_name = name.clone();
        }
        if let Some(name) = &self.bluetooth_name {
            config.bluetooth_name = name.clone();
        }
        if self.dhcp {
            config.bridge_dhcp = true;
        }
        if let Some(filter) = &self.mac_filter {
            config.mac_filter = filter.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .init();

    // Load configuration
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    match commands::execute(cli.command, config, cli.format).await {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "panbridge",
            "--bridge-name",
            "pan-br",
            "--bluetooth-name",
            "kiosk",
            "--dhcp",
            "--mac-filter",
            "^b8:27:eb",
            "status",
        ]);

        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.bridge_name, "pan-br");
        assert_eq!(config.bluetooth_name, "kiosk");
        assert!(config.bridge_dhcp);
        assert_eq!(config.mac_filter, "^b8:27:eb");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::parse_from(["panbridge", "run"]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.bridge_name, "br0");
        assert!(!config.bridge_dhcp);
    }
}
