use crate::output::print_progress;
use panbridge_core::{Config, Reconciler, Result};
use tracing::info;

pub async fn execute(config: Config) -> Result<()> {
    print_progress(&format!(
        "Managing bridge {} (DHCP {})",
        config.bridge_name,
        if config.bridge_dhcp { "on" } else { "off" }
    ));

    let system = panbridge_network::linux_collaborators(&config)?;
    let mut reconciler = Reconciler::new(config, system)?;

    // Leftover state is cleaned up on the next start, not here.
    tokio::select! {
        result = reconciler.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, leaving bridge in place");
            Ok(())
        }
    }
}
