use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The Inventory exposes a free-form per-device map. We model it as a
/// tagged variant: a handful of known keys the core reads or owns, plus an
/// opaque `extra` bag that round-trips verbatim. Validation of individual
/// keys is lazy (done by whoever reads it) and non-fatal — an unparsable
/// known key is treated the same as an absent one.
///
/// The keys the core is the *sole writer* of are listed in
/// `CustomFields::CORE_OWNED`; everything else is read-only from the
/// core's perspective.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomFields {
    // State mirrored from the BMC (core-owned, write side lives in the
    // Reconciler's outbound sweep).
    pub provision_state: Option<String>,
    pub power_state: Option<String>,
    pub maintenance: Option<bool>,
    pub ironic_state: Option<String>,
    pub introspection_state: Option<String>,
    pub deployment_state: Option<String>,
    pub device_state: Option<String>,
    pub device_transition: Option<String>,
    pub network_interface_name: Option<String>,

    // Read-only inputs to the Reconciler / Config Generator.
    pub ironic_parameters: Option<Value>,
    pub sonic_parameters: Option<Value>,
    pub secrets: Option<Value>,
    pub netplan_parameters: Option<Value>,
    pub frr_parameters: Option<Value>,
    pub inventory_hostname: Option<String>,
    pub deployment_enabled: Option<bool>,
    pub deployment_type: Option<String>,
    pub device_type: Option<String>,

    /// Everything else, preserved verbatim on read/write round-trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl CustomFields {
    /// Custom-field keys the core is the only writer of (spec.md §3).
    pub const CORE_OWNED: &'static [&'static str] = &[
        "provision_state",
        "power_state",
        "maintenance",
        "ironic_state",
        "introspection_state",
        "deployment_state",
        "device_state",
        "device_transition",
        "network_interface_name",
    ];

    pub fn hwsku(&self) -> Option<String> {
        self.sonic_parameters
            .as_ref()?
            .get("hwsku")?
            .as_str()
            .map(str::to_string)
    }
}
