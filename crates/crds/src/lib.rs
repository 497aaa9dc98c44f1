//! CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the node-local VLAN controller.

pub mod vlan;

pub use vlan::*;
