//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the Kubernetes
//! store, the `ip` driver and the event recorder into the reconciler and runs
//! the Vlan watcher.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::events::KubeEventSink;
use crate::reconciler::VlanReconciler;
use crate::store::KubeVlanStore;
use crate::watcher::Watcher;
use iface_driver::IpLinkDriver;
use kube::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for node-local VLAN interfaces.
pub struct Controller {
    vlan_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts watching.
    pub async fn new(config: &ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing VLAN Controller for node {}", config.node_name);

        let kube_client = Client::try_default().await?;

        let reconciler = VlanReconciler::new(
            config.node_name.clone(),
            KubeVlanStore::new(kube_client.clone()),
            IpLinkDriver::new(config.ip_command.clone()),
            KubeEventSink::new(kube_client.clone(), &config.node_name),
        );

        let watcher = Watcher::new(kube_client, Arc::new(reconciler), config);
        let vlan_watcher = tokio::spawn(async move { watcher.watch().await });

        Ok(Self { vlan_watcher })
    }

    /// Runs the controller until shutdown.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("VLAN Controller running");

        self.vlan_watcher
            .await
            .map_err(|e| ControllerError::Watch(format!("Vlan watcher panicked: {}", e)))?
    }
}
