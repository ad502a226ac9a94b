//! Read/write access to the DCIM graph, with multi-replica fan-out for
//! state mirroring.

pub mod error;
pub mod fanout;
pub mod http;
pub mod port;
pub mod replica;

pub use error::InventoryError;
pub use fanout::MultiInventory;
pub use http::HttpInventoryClient;
pub use port::{DeviceFilter, InventoryClient, JournalEntryKind};
pub use replica::{InventoryReplica, ReplicaFilter};
