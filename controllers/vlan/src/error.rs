//! Controller-specific error types.
//!
//! This module defines error types specific to the VLAN Controller
//! that are not covered by upstream library errors.

use iface_driver::DriverError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the VLAN Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes client error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Reading or writing a Vlan resource failed
    #[error("Store error: {0}")]
    Store(String),

    /// Host interface driver error
    #[error("Interface driver error: {0}")]
    Driver(#[from] DriverError),

    /// Vlan spec cannot be applied as written
    #[error("Invalid Vlan spec: {0}")]
    InvalidSpec(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
