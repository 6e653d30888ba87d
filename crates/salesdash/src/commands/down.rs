use colored::Colorize;
use salesdash::{RunningServiceSet, teardown_resources};
use salesdash_container::{DockerCli, SystemRunner};
use salesdash_core::LaunchConfig;
use std::sync::Arc;

/// Clean up after a run that was killed without a chance to tear down
pub async fn handle(config: &LaunchConfig) -> anyhow::Result<()> {
    println!("{}", "Looking for leftovers...".yellow());
    let runtime = DockerCli::new(config.runtime.clone(), Arc::new(SystemRunner));

    let mut leftovers = RunningServiceSet::default();
    if runtime.network_exists(&config.network).await? {
        leftovers.record_network(&config.network);
    }
    // Start order, so teardown stops the app before the database
    for service in config.services() {
        if runtime.container_exists(&service.name).await? {
            leftovers.record_service(&service.name);
        }
    }

    if leftovers.is_empty() {
        println!("  ℹ nothing to clean up");
        return Ok(());
    }

    for name in leftovers.names() {
        println!("  • {}", name.cyan());
    }
    let report = teardown_resources(&runtime, leftovers).await;

    println!();
    if report.failed.is_empty() && report.network_removed != Some(false) {
        println!("{}", "✓ Cleanup finished".green().bold());
    } else {
        println!("{}", "⚠ Cleanup finished with errors (see above)".yellow().bold());
    }
    Ok(())
}
