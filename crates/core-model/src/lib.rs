//! Pure domain types for the infrastructure-orchestration core.
//!
//! Nothing in this crate performs I/O: it is the shared vocabulary between
//! the Inventory/BMC clients, the Task Fabric, the Reconciler, and the
//! Configuration Generator. Cross-references between graph entities are by
//! id, never by pointer, so the Device/Interface/Cable graph has no
//! ownership cycles.

pub mod cable;
pub mod custom_fields;
pub mod device;
pub mod diff;
pub mod error;
pub mod graph;
pub mod ids;
pub mod interface;
pub mod ip;
pub mod node;
pub mod vrf;

pub use cable::Cable;
pub use custom_fields::CustomFields;
pub use device::{Device, DeviceRole};
pub use diff::DiffArtifact;
pub use error::{CoreError, ErrorKind};
pub use graph::InventorySnapshot;
pub use ids::{CableId, DeviceId, InterfaceId, IpAddressId, PrefixId, VrfId};
pub use interface::{Interface, InterfaceType, VirtualKind, VlanMembership};
pub use ip::{AddressFamily, IpAddress, Prefix};
pub use node::{DriverKind, Node, NodePort, PowerState, ProvisionState};
pub use vrf::Vrf;
