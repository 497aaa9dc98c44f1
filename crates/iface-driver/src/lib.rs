//! Host Interface Driver
//!
//! Creates, updates and deletes 802.1Q VLAN sub-interfaces on the local host.
//!
//! # Example
//!
//! ```no_run
//! use iface_driver::{InterfaceDriver, IpLinkDriver, VlanLink};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let driver = IpLinkDriver::new("/sbin/ip");
//!
//! let link = VlanLink {
//!     master: "eth0".to_string(),
//!     name: "ki.eth0.100".to_string(),
//!     vlan_id: 100,
//!     mtu: Some(1496),
//! };
//!
//! // Safe to call repeatedly: an already-correct interface is left alone
//! driver.create_or_update(&link).await?;
//! driver.delete(&link).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Idempotent operations**: both operations succeed when the target state already holds
//! - **Collision reporting**: an existing interface with a conflicting definition is an error, never replaced
//! - **`test-util`**: in-memory `MockInterfaceDriver` for controller unit tests

pub mod error;
pub mod ip_link;
pub mod models;
pub mod plan;
#[path = "trait.rs"]
pub mod driver_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use driver_trait::InterfaceDriver;
pub use error::DriverError;
pub use ip_link::{IpLinkDriver, MAX_IFNAME_LEN, validate_name};
pub use models::*;
pub use plan::{LinkAction, check_owned, plan_link};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{DriverCall, MockInterfaceDriver};
