//! Controller configuration.
//!
//! Loaded once at startup from environment variables. The node name is
//! passed explicitly into the reconciler rather than read from a global.

use crate::error::ControllerError;
use iface_driver::ip_link::DEFAULT_IP_CMD;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration for the VLAN Controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Name of the node this controller manages interfaces for (`NODE_NAME`)
    pub node_name: String,
    /// Namespace to watch, all namespaces when `None` (`WATCH_NAMESPACE`)
    pub namespace: Option<String>,
    /// Path of the iproute2 `ip` binary (`IP_COMMAND`)
    pub ip_command: String,
    /// Maximum concurrent reconciliations (`RECONCILE_CONCURRENCY`)
    pub concurrency: u16,
    /// Quiet period before reconciling a changed record (`RECONCILE_DEBOUNCE_SECS`)
    pub debounce: Duration,
}

impl ControllerConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let node_name = lookup("NODE_NAME")
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| {
                ControllerError::InvalidConfig("NODE_NAME environment variable is required".to_string())
            })?;

        let namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.is_empty());
        let ip_command = lookup("IP_COMMAND").unwrap_or_else(|| DEFAULT_IP_CMD.to_string());
        let concurrency = parse_or(&lookup, "RECONCILE_CONCURRENCY", 3u16)?;
        let debounce = Duration::from_secs(parse_or(&lookup, "RECONCILE_DEBOUNCE_SECS", 1u64)?);

        if concurrency == 0 {
            return Err(ControllerError::InvalidConfig(
                "RECONCILE_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            node_name,
            namespace,
            ip_command,
            concurrency,
            debounce,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ControllerError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| {
            ControllerError::InvalidConfig(format!("{key}={raw:?} is not valid: {e}"))
        }),
    }
}
