use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{InterfaceId, IpAddressId, PrefixId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressFamily {
    V4,
    V6,
}

/// An IP address in CIDR form (`"10.0.0.5/24"`), parsed lazily — the
/// Inventory is the source of truth and round-trips the raw string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpAddress {
    pub id: IpAddressId,
    pub interface_id: Option<InterfaceId>,
    pub address: String,
    pub family: AddressFamily,
}

impl IpAddress {
    pub fn host(&self) -> Result<IpAddr, CoreError> {
        let host_part = self.address.split('/').next().unwrap_or(&self.address);
        IpAddr::from_str(host_part).map_err(|_| CoreError::InvalidCidr(self.address.clone()))
    }

    pub fn prefix_len(&self) -> Option<u8> {
        self.address.split('/').nth(1).and_then(|s| s.parse().ok())
    }

    pub fn net(&self) -> Result<IpNet, CoreError> {
        IpNet::from_str(&self.address).map_err(|_| CoreError::InvalidCidr(self.address.clone()))
    }
}

/// A Prefix may carry a `role`; `transfer` marks routed point-to-point
/// links relevant to BGP (spec.md §3, §GLOSSARY).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prefix {
    pub id: PrefixId,
    pub cidr: String,
    pub role: Option<String>,
}

impl Prefix {
    pub const ROLE_TRANSFER: &'static str = "transfer";

    pub fn is_transfer(&self) -> bool {
        self.role.as_deref() == Some(Self::ROLE_TRANSFER)
    }

    pub fn net(&self) -> Result<IpNet, CoreError> {
        IpNet::from_str(&self.cidr).map_err(|_| CoreError::InvalidCidr(self.cidr.clone()))
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        self.net().map(|n| n.contains(&addr)).unwrap_or(false)
    }
}
