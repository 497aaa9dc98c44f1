//! InterfaceDriver trait for mocking
//!
//! This trait abstracts host interface mutation so the controller never spawns
//! processes inline and tests can substitute `MockInterfaceDriver`.

use crate::error::DriverError;
use crate::models::VlanLink;

/// Operations against host networking
///
/// Both operations must tolerate being invoked when the target state already
/// holds. All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait InterfaceDriver: Send + Sync {
    /// Ensure the VLAN interface exists with the given definition and is up.
    async fn create_or_update(&self, link: &VlanLink) -> Result<(), DriverError>;

    /// Ensure the VLAN interface described by `link` no longer exists.
    ///
    /// Only `link.name`, `link.master` and `link.vlan_id` are consulted. A
    /// same-named link with another definition was not created for `link` and
    /// is left in place with a `DriverError::Conflict`.
    async fn delete(&self, link: &VlanLink) -> Result<(), DriverError>;
}
