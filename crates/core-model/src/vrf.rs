use serde::{Deserialize, Serialize};

use crate::ids::VrfId;

/// A routing VRF as the Inventory names it. The Configuration Generator
/// maps `name` to a SONiC table id via its own `^vrf(\d+)$` convention
/// (spec.md §4.4) — this type only carries what the Inventory owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vrf {
    pub id: VrfId,
    pub name: String,
}
