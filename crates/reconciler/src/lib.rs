//! Bidirectional BMC <-> Inventory reconciler: managed-set sweeps, the
//! provision-state machine, notification handling, and config-drive
//! assembly. Ports (`Store`, `InventoryClient`, `BmcClient`, `Vault`)
//! are supplied by the caller; this crate only knows the policy.

pub mod config_drive;
pub mod error;
pub mod filter;
pub mod node_attrs;
pub mod notifications;
pub mod state_machine;
pub mod sweep_inbound;
pub mod sweep_outbound;
pub mod util;

pub use error::ReconcilerError;
pub use filter::{ManagedSetFilter, ManagedSetQuery};
pub use sweep_inbound::{sweep_inbound, SweepReport};
pub use sweep_outbound::{sweep_outbound, MirrorReport};
