//! CRUD on bare-metal nodes/ports, provision-state transitions with
//! waits, validation, and the BMC notification envelope.

pub mod error;
pub mod http;
pub mod notification;
pub mod port;

pub use error::BmcError;
pub use http::HttpBmcClient;
pub use notification::{BmcEventType, NotificationEnvelope, NotificationPayload};
pub use port::{BmcClient, CreateNodeInput, InterfaceValidation, NodeValidation, ProvisionVerb, UpdateNodeInput};
