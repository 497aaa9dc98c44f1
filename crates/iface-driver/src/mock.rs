//! Mock InterfaceDriver for unit testing
//!
//! Keeps a link table in memory with the same idempotency, ownership and
//! validation rules as `IpLinkDriver`, records every call, and can be told to
//! fail the next create or delete.

use crate::driver_trait::InterfaceDriver;
use crate::error::DriverError;
use crate::ip_link::{validate_link, validate_name};
use crate::models::VlanLink;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A recorded driver invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    /// `create_or_update` with the given definition
    CreateOrUpdate(VlanLink),
    /// `delete` of the named interface
    Delete(String),
}

/// Mock InterfaceDriver for testing
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MockInterfaceDriver {
    pub(crate) links: Arc<Mutex<HashMap<String, VlanLink>>>,
    /// Non-VLAN links by name, mapped to their kind
    pub(crate) foreign: Arc<Mutex<HashMap<String, String>>>,
    pub(crate) calls: Arc<Mutex<Vec<DriverCall>>>,
    pub(crate) fail_create: Arc<Mutex<Option<String>>>,
    pub(crate) fail_delete: Arc<Mutex<Option<String>>>,
}

impl MockInterfaceDriver {
    /// Create a mock with no links
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a link (for test setup)
    pub fn add_link(&self, link: VlanLink) {
        self.links.lock().unwrap().insert(link.name.clone(), link);
    }

    /// Pre-populate a link that is not a VLAN, e.g. a bridge
    pub fn add_foreign_link(&self, name: impl Into<String>, kind: impl Into<String>) {
        self.foreign.lock().unwrap().insert(name.into(), kind.into());
    }

    /// Kind of the non-VLAN link with this name, if any
    pub fn foreign_link(&self, name: &str) -> Option<String> {
        self.foreign.lock().unwrap().get(name).cloned()
    }

    /// Current link with this name, if any
    pub fn link(&self, name: &str) -> Option<VlanLink> {
        self.links.lock().unwrap().get(name).cloned()
    }

    /// Number of links present
    pub fn link_count(&self) -> usize {
        self.links.lock().unwrap().len()
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Fail the next `create_or_update` with `message`
    pub fn fail_next_create(&self, message: impl Into<String>) {
        *self.fail_create.lock().unwrap() = Some(message.into());
    }

    /// Fail the next `delete` with `message`
    pub fn fail_next_delete(&self, message: impl Into<String>) {
        *self.fail_delete.lock().unwrap() = Some(message.into());
    }

    /// Same rules as `check_owned` against the in-memory tables.
    fn check_owned(&self, link: &VlanLink) -> Result<(), DriverError> {
        let conflict = |reason: String| DriverError::Conflict {
            name: link.name.clone(),
            reason,
        };
        if let Some(kind) = self.foreign.lock().unwrap().get(&link.name) {
            return Err(conflict(format!("link kind is {kind}, expected vlan")));
        }
        if let Some(existing) = self.links.lock().unwrap().get(&link.name) {
            if existing.vlan_id != link.vlan_id {
                return Err(conflict(format!(
                    "VLAN ID is {}, expected {}",
                    existing.vlan_id, link.vlan_id
                )));
            }
            if existing.master != link.master {
                return Err(conflict(format!(
                    "parent is {}, expected {}",
                    existing.master, link.master
                )));
            }
        }
        Ok(())
    }

    fn injected_failure(slot: &Mutex<Option<String>>, command: String) -> Result<(), DriverError> {
        match slot.lock().unwrap().take() {
            Some(output) => Err(DriverError::CommandFailed {
                command,
                exit_code: 2,
                output,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl InterfaceDriver for MockInterfaceDriver {
    async fn create_or_update(&self, link: &VlanLink) -> Result<(), DriverError> {
        self.calls.lock().unwrap().push(DriverCall::CreateOrUpdate(link.clone()));
        validate_link(link)?;
        Self::injected_failure(&self.fail_create, format!("ip link add {}", link.name))?;

        self.check_owned(link)?;
        self.links.lock().unwrap().insert(link.name.clone(), link.clone());
        Ok(())
    }

    async fn delete(&self, link: &VlanLink) -> Result<(), DriverError> {
        self.calls.lock().unwrap().push(DriverCall::Delete(link.name.clone()));
        validate_name(&link.name)?;
        Self::injected_failure(&self.fail_delete, format!("ip link delete {}", link.name))?;

        self.check_owned(link)?;
        self.links.lock().unwrap().remove(&link.name);
        Ok(())
    }
}
