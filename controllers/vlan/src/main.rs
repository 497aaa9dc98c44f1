//! VLAN Controller
//!
//! Node-local controller that keeps 802.1Q VLAN sub-interfaces on this host
//! in sync with `Vlan` resources addressed to it.
//!
//! One instance runs per node (typically as a DaemonSet with host networking)
//! and only acts on resources whose `spec.nodeName` matches `NODE_NAME`.

mod backoff;
mod config;
mod controller;
mod error;
mod events;
mod reconciler;
mod store;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("A rustls crypto provider was already installed");
    }

    info!("Starting VLAN Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  Node: {}", config.node_name);
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  ip command: {}", config.ip_command);
    info!("  Concurrency: {}", config.concurrency);
    info!("  Debounce: {:?}", config.debounce);

    let controller = Controller::new(&config).await?;
    controller.run().await?;

    info!("VLAN Controller stopped");
    Ok(())
}
