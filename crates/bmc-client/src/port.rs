use std::time::Duration;

use async_trait::async_trait;
use core_model::node::{DriverKind, Node, NodePort, ProvisionState};
use serde_json::Value;

use crate::error::BmcError;

pub type Result<T> = std::result::Result<T, BmcError>;

/// Verb accepted by `set_provision_state` (subset the reconciler drives
/// directly; the BMC's own state machine handles the rest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionVerb {
    Manage,
    Provide,
    Active,
    Deleted,
    Clean,
    Inspect,
    Rebuild,
}

impl ProvisionVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manage => "manage",
            Self::Provide => "provide",
            Self::Active => "active",
            Self::Deleted => "deleted",
            Self::Clean => "clean",
            Self::Inspect => "inspect",
            Self::Rebuild => "rebuild",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceValidation {
    Ok,
    Failed,
}

/// Per-interface outcome of the BMC's `validate` check. spec.md §4.3 drives
/// the provision-state machine off the `management` and `boot` interfaces
/// specifically, so those are surfaced separately rather than collapsed
/// into one pass/fail.
#[derive(Debug, Clone, Copy)]
pub struct NodeValidation {
    pub management: InterfaceValidation,
    pub boot: InterfaceValidation,
}

#[derive(Debug, Clone)]
pub struct CreateNodeInput {
    pub name: String,
    pub driver: DriverKind,
    pub driver_info: Value,
    pub resource_class: String,
    pub extra: Value,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateNodeInput {
    pub driver_info: Option<Value>,
    pub instance_info: Option<Value>,
    pub extra: Option<Value>,
    pub maintenance: Option<bool>,
    pub maintenance_reason: Option<String>,
}

/// CRUD on bare-metal nodes/ports, provision-state transitions with
/// waits, validation, and power control (spec.md §6's BMC API). Node
/// identity on the wire is the BMC-assigned UUID string, mirroring
/// `core_model::Node::uuid`.
#[async_trait]
pub trait BmcClient: Send + Sync {
    async fn find_node(&self, name: &str) -> Result<Option<Node>>;

    /// Every node the BMC currently tracks, regardless of whether it is
    /// still part of the managed set — used to detect entities the
    /// inbound sweep must delete.
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    async fn create_node(&self, input: CreateNodeInput) -> Result<Node>;

    async fn update_node(&self, uuid: &str, input: UpdateNodeInput) -> Result<Node>;

    async fn delete_node(&self, uuid: &str) -> Result<()>;

    /// Validates the node's interfaces are sane before a provisioning
    /// action is attempted, reporting the `management` and `boot`
    /// interfaces separately so the provision-state machine can act on
    /// them independently (spec.md §4.3).
    async fn validate_node(&self, uuid: &str) -> Result<NodeValidation>;

    async fn set_provision_state(
        &self,
        uuid: &str,
        verb: ProvisionVerb,
        config_drive: Option<Value>,
    ) -> Result<()>;

    /// Polls until `target` is observed or `timeout` elapses.
    async fn wait_for_provision_state(
        &self,
        uuid: &str,
        target: ProvisionState,
        timeout: Duration,
    ) -> Result<ProvisionState>;

    async fn set_power_state(&self, uuid: &str, on: bool) -> Result<()>;

    async fn list_ports(&self, node_uuid: &str) -> Result<Vec<NodePort>>;

    async fn create_port(&self, node_uuid: &str, mac_address: &str) -> Result<NodePort>;

    async fn delete_port(&self, port_uuid: &str) -> Result<()>;
}
