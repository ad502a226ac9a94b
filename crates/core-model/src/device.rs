use std::collections::BTreeSet;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::custom_fields::CustomFields;
use crate::ids::DeviceId;

/// Closed set of roles the core knows about, plus an escape hatch for
/// anything else the Inventory carries. Mirrors the original's
/// `NETBOX_NODE_ROLES` / `NETBOX_SWITCH_ROLES` split.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceRole {
    // Node-family roles
    Compute,
    Storage,
    Resource,
    Control,
    Manager,
    Network,
    Metalbox,
    Dpu,
    Loadbalancer,
    Router,
    Firewall,
    // Switch-family roles
    AccessLeaf,
    BorderLeaf,
    ComputeLeaf,
    DataLeaf,
    Leaf,
    ServiceLeaf,
    Spine,
    StorageLeaf,
    SuperSpine,
    Switch,
    TransferLeaf,
    /// Anything the Inventory carries that this core doesn't special-case.
    Other(String),
}

impl DeviceRole {
    pub fn slug(&self) -> &str {
        match self {
            DeviceRole::Compute => "compute",
            DeviceRole::Storage => "storage",
            DeviceRole::Resource => "resource",
            DeviceRole::Control => "control",
            DeviceRole::Manager => "manager",
            DeviceRole::Network => "network",
            DeviceRole::Metalbox => "metalbox",
            DeviceRole::Dpu => "dpu",
            DeviceRole::Loadbalancer => "loadbalancer",
            DeviceRole::Router => "router",
            DeviceRole::Firewall => "firewall",
            DeviceRole::AccessLeaf => "accessleaf",
            DeviceRole::BorderLeaf => "borderleaf",
            DeviceRole::ComputeLeaf => "computeleaf",
            DeviceRole::DataLeaf => "dataleaf",
            DeviceRole::Leaf => "leaf",
            DeviceRole::ServiceLeaf => "serviceleaf",
            DeviceRole::Spine => "spine",
            DeviceRole::StorageLeaf => "storageleaf",
            DeviceRole::SuperSpine => "superspine",
            DeviceRole::Switch => "switch",
            DeviceRole::TransferLeaf => "transferleaf",
            DeviceRole::Other(s) => s.as_str(),
        }
    }

    pub fn from_slug(slug: &str) -> Self {
        match slug {
            "compute" => DeviceRole::Compute,
            "storage" => DeviceRole::Storage,
            "resource" => DeviceRole::Resource,
            "control" => DeviceRole::Control,
            "manager" => DeviceRole::Manager,
            "network" => DeviceRole::Network,
            "metalbox" => DeviceRole::Metalbox,
            "dpu" => DeviceRole::Dpu,
            "loadbalancer" => DeviceRole::Loadbalancer,
            "router" => DeviceRole::Router,
            "firewall" => DeviceRole::Firewall,
            "accessleaf" => DeviceRole::AccessLeaf,
            "borderleaf" => DeviceRole::BorderLeaf,
            "computeleaf" => DeviceRole::ComputeLeaf,
            "dataleaf" => DeviceRole::DataLeaf,
            "leaf" => DeviceRole::Leaf,
            "serviceleaf" => DeviceRole::ServiceLeaf,
            "spine" => DeviceRole::Spine,
            "storageleaf" => DeviceRole::StorageLeaf,
            "superspine" => DeviceRole::SuperSpine,
            "switch" => DeviceRole::Switch,
            "transferleaf" => DeviceRole::TransferLeaf,
            other => DeviceRole::Other(other.to_string()),
        }
    }

    /// True for every role SONiC configuration applies to.
    pub fn is_switch_family(&self) -> bool {
        matches!(
            self,
            DeviceRole::AccessLeaf
                | DeviceRole::BorderLeaf
                | DeviceRole::ComputeLeaf
                | DeviceRole::DataLeaf
                | DeviceRole::Leaf
                | DeviceRole::ServiceLeaf
                | DeviceRole::Spine
                | DeviceRole::StorageLeaf
                | DeviceRole::SuperSpine
                | DeviceRole::Switch
                | DeviceRole::TransferLeaf
        )
    }

    /// True for spine/superspine — the roles whose AS is shared across an
    /// interconnected component rather than computed per-device.
    pub fn is_spine_family(&self) -> bool {
        matches!(self, DeviceRole::Spine | DeviceRole::SuperSpine)
    }

    /// Node-family + switch-family: the combined BFD-eligible role set.
    pub fn is_bfd_enabled(&self) -> bool {
        self.is_switch_family()
            || matches!(
                self,
                DeviceRole::Compute
                    | DeviceRole::Storage
                    | DeviceRole::Resource
                    | DeviceRole::Control
                    | DeviceRole::Manager
                    | DeviceRole::Network
                    | DeviceRole::Metalbox
                    | DeviceRole::Dpu
                    | DeviceRole::Loadbalancer
                    | DeviceRole::Router
                    | DeviceRole::Firewall
            )
    }

    /// True for the BMC-managed (non-switch) population the Reconciler owns.
    pub fn is_bmc_managed_family(&self) -> bool {
        !self.is_switch_family()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub role: DeviceRole,
    pub primary_ipv4: Option<IpAddr>,
    pub primary_ipv6: Option<IpAddr>,
    pub tags: BTreeSet<String>,
    pub oob_ip: Option<IpAddr>,
    pub serial: Option<String>,
    pub custom_fields: CustomFields,
}

impl Device {
    /// A `managed-by-<agent>` tag gates agent ownership per spec.md §3.
    pub fn managed_by(&self, agent: &str) -> bool {
        self.tags.contains(&format!("managed-by-{agent}"))
    }

    pub fn is_switch(&self) -> bool {
        self.role.is_switch_family()
    }
}
