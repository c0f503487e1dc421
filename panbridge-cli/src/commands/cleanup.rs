use crate::output::{print_progress, print_success};
use panbridge_core::{Config, Reconciler, Result};

pub async fn execute(config: Config) -> Result<()> {
    print_progress("Stopping PAN listeners and DHCP server, removing bridges...");

    let system = panbridge_network::linux_collaborators(&config)?;
    Reconciler::new(config, system)?.cleanup().await?;

    print_success("Cleanup complete");
    Ok(())
}
