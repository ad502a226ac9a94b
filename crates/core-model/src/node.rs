use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The BMC's provision-state machine (spec.md §4.3). The core only
/// *requests* transitions along these edges; the BMC owns the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionState {
    Enroll,
    Manageable,
    Available,
    Active,
    DeployFailed,
    Error,
    CleanFailed,
    InspectWait,
    WaitCallBack,
    Deleting,
}

impl ProvisionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionState::Enroll => "enroll",
            ProvisionState::Manageable => "manageable",
            ProvisionState::Available => "available",
            ProvisionState::Active => "active",
            ProvisionState::DeployFailed => "deploy failed",
            ProvisionState::Error => "error",
            ProvisionState::CleanFailed => "clean failed",
            ProvisionState::InspectWait => "inspect wait",
            ProvisionState::WaitCallBack => "wait call-back",
            ProvisionState::Deleting => "deleting",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "enroll" => ProvisionState::Enroll,
            "manageable" => ProvisionState::Manageable,
            "available" => ProvisionState::Available,
            "active" => ProvisionState::Active,
            "deploy failed" => ProvisionState::DeployFailed,
            "error" => ProvisionState::Error,
            "clean failed" => ProvisionState::CleanFailed,
            "inspect wait" => ProvisionState::InspectWait,
            "wait call-back" => ProvisionState::WaitCallBack,
            "deleting" => ProvisionState::Deleting,
            _ => return None,
        })
    }

    /// States from which a safe, unprovisioned BMC deletion is allowed
    /// (spec.md §4.2 step 4, §4.3).
    pub fn is_safe_for_deletion(&self) -> bool {
        matches!(
            self,
            ProvisionState::Enroll
                | ProvisionState::Manageable
                | ProvisionState::Available
                | ProvisionState::CleanFailed
        )
    }

    /// States from which un-deploy is permitted (spec.md §4.3).
    pub fn allows_undeploy(&self) -> bool {
        matches!(
            self,
            ProvisionState::Active
                | ProvisionState::WaitCallBack
                | ProvisionState::DeployFailed
                | ProvisionState::Error
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    PowerOn,
    PowerOff,
    Rebooting,
    Unknown,
}

impl PowerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::PowerOn => "power on",
            PowerState::PowerOff => "power off",
            PowerState::Rebooting => "rebooting",
            PowerState::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "power on" => PowerState::PowerOn,
            "power off" => PowerState::PowerOff,
            "rebooting" => PowerState::Rebooting,
            _ => PowerState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Ipmi,
    Redfish,
}

impl DriverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::Ipmi => "ipmi",
            DriverKind::Redfish => "redfish",
        }
    }
}

/// A bare-metal node as the BMC sees it — a mirror of a Device, uniquely
/// keyed by the Device name (`resource_class` in the original).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub uuid: Option<String>,
    pub name: String,
    pub provision_state: ProvisionState,
    pub power_state: PowerState,
    pub maintenance: bool,
    pub driver: DriverKind,
    pub driver_info: Map<String, Value>,
    pub instance_info: Map<String, Value>,
    pub instance_uuid: Option<String>,
    /// Persists network-rendering parameters across un-deploy
    /// (`netplan_parameters` / `frr_parameters` / image-id rehydration).
    pub extra: Map<String, Value>,
    pub resource_class: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePort {
    pub uuid: Option<String>,
    pub address: String,
    pub node_uuid: String,
}
