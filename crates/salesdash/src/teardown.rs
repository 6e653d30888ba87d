//! Reverse-order, best-effort release of everything a run acquired

use crate::context::{LaunchContext, RunningServiceSet};
use colored::Colorize;
use salesdash_container::DockerCli;

/// What a teardown pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub server_stopped: bool,
    /// Containers stopped, in the order they were stopped
    pub stopped: Vec<String>,
    /// Containers whose stop command failed
    pub failed: Vec<String>,
    /// `None` when no network had been acquired
    pub network_removed: Option<bool>,
}

impl TeardownReport {
    /// Nothing was running, so nothing was attempted
    pub fn is_noop(&self) -> bool {
        !self.server_stopped
            && self.stopped.is_empty()
            && self.failed.is_empty()
            && self.network_removed.is_none()
    }
}

/// Stop the static server, then every container newest first, then the network
///
/// Never fails. The context's set is drained, so a second call does nothing.
pub async fn teardown(ctx: &mut LaunchContext) -> TeardownReport {
    let server = ctx.server.take();
    let running = ctx.running.take();

    if server.is_none() && running.is_empty() {
        return TeardownReport::default();
    }

    println!();
    println!("{}", "Cleaning up...".yellow());

    let mut server_stopped = false;
    if let Some(server) = server {
        server.stop().await;
        println!("  ✓ static server stopped");
        server_stopped = true;
    }

    let mut report = teardown_resources(&ctx.runtime, running).await;
    report.server_stopped = server_stopped;
    report
}

/// Container and network half of [`teardown`], also used by `salesdash down`
pub async fn teardown_resources(runtime: &DockerCli, running: RunningServiceSet) -> TeardownReport {
    let mut report = TeardownReport::default();
    let (network, services) = running.into_parts();

    for name in services.iter().rev() {
        match runtime.stop(name).await {
            Ok(()) => {
                println!("  ✓ stopped {}", name.cyan());
                report.stopped.push(name.clone());
            }
            Err(e) => {
                tracing::warn!("failed to stop {}: {}", name, e);
                println!("  ⚠ could not stop {} (ignored)", name.cyan());
                report.failed.push(name.clone());
            }
        }
    }

    if let Some(network) = network {
        let removed = match runtime.remove_network(&network).await {
            Ok(()) => {
                println!("  ✓ removed network {}", network.cyan());
                true
            }
            Err(e) => {
                tracing::warn!("failed to remove network {}: {}", network, e);
                println!("  ⚠ could not remove network {} (ignored)", network.cyan());
                false
            }
        };
        report.network_removed = Some(removed);
    }

    report
}
