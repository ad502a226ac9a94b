use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{CableId, DeviceId, InterfaceId, VrfId};

/// NetBox-shaped physical port type, collapsed to the speed classes the
/// generator cares about. `speed_kbps` on the `Interface` itself overrides
/// whatever this type implies (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceType {
    Physical100M,
    Physical1G,
    Physical2500M,
    Physical5G,
    Physical10G,
    Physical25G,
    Physical40G,
    Physical50G,
    Physical100G,
    Physical200G,
    Physical400G,
    Physical800G,
    Lag,
    Virtual,
}

impl InterfaceType {
    /// Speed in kbps implied by the port type, or `None` for LAG/virtual
    /// interfaces whose speed is meaningless without member/SVI context.
    pub fn default_speed_kbps(&self) -> Option<u64> {
        use InterfaceType::*;
        Some(match self {
            Physical100M => 100_000,
            Physical1G => 1_000_000,
            Physical2500M => 2_500_000,
            Physical5G => 5_000_000,
            Physical10G => 10_000_000,
            Physical25G => 25_000_000,
            Physical40G => 40_000_000,
            Physical50G => 50_000_000,
            Physical100G => 100_000_000,
            Physical200G => 200_000_000,
            Physical400G => 400_000_000,
            Physical800G => 800_000_000,
            Lag | Virtual => return None,
        })
    }

    /// The high-speed set that uses the 4-lane breakout-capable port
    /// numbering (spec.md §4.4.1): 100/200/400/800 Gbps.
    pub fn is_high_speed(&self) -> bool {
        matches!(
            self,
            InterfaceType::Physical100G
                | InterfaceType::Physical200G
                | InterfaceType::Physical400G
                | InterfaceType::Physical800G
        )
    }
}

/// What kind of virtual interface this is, derived from its name
/// (`Vlan<N>` → SVI, `Loopback<N>` → loopback) per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VirtualKind {
    Svi(u16),
    Loopback(u16),
    Other,
}

impl VirtualKind {
    pub fn from_name(name: &str) -> Self {
        if let Some(rest) = name.strip_prefix("Vlan") {
            if let Ok(n) = rest.parse() {
                return VirtualKind::Svi(n);
            }
        }
        if let Some(rest) = name.strip_prefix("Loopback") {
            if let Ok(n) = rest.parse() {
                return VirtualKind::Loopback(n);
            }
        }
        VirtualKind::Other
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlanMembership {
    pub untagged: Option<u16>,
    pub tagged: Vec<u16>,
}

impl VlanMembership {
    pub fn sorted_tagged(&self) -> Vec<u16> {
        let mut v = self.tagged.clone();
        v.sort_unstable();
        v
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interface {
    pub id: InterfaceId,
    pub device_id: DeviceId,
    pub name: String,
    pub interface_type: InterfaceType,
    /// Overrides `interface_type.default_speed_kbps()` when set.
    pub speed_kbps: Option<u64>,
    pub mac_address: Option<String>,
    pub mgmt_only: bool,
    pub lag_parent: Option<InterfaceId>,
    pub vrf: Option<VrfId>,
    pub vlans: VlanMembership,
    pub enabled: bool,
    pub cable_id: Option<CableId>,
}

impl Interface {
    pub fn effective_speed_kbps(&self) -> Option<u64> {
        self.speed_kbps.or_else(|| self.interface_type.default_speed_kbps())
    }

    pub fn is_lag_member(&self) -> bool {
        self.lag_parent.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.cable_id.is_some()
    }

    pub fn virtual_kind(&self) -> Option<VirtualKind> {
        if matches!(self.interface_type, InterfaceType::Virtual) {
            Some(VirtualKind::from_name(&self.name))
        } else {
            None
        }
    }

    /// Validate the cross-field invariants from spec.md §3:
    /// a LAG member carries no IP directly is enforced at the IP-assignment
    /// layer; here we only check the shape invariants this type can see.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.vlans.untagged.is_some() && self.vlans.tagged.contains(&self.vlans.untagged.unwrap())
        {
            return Err(CoreError::InvalidCustomField {
                field: format!("{}.vlans", self.name),
                reason: "untagged VLAN also listed as tagged".to_string(),
            });
        }
        Ok(())
    }
}
