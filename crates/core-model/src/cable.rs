use serde::{Deserialize, Serialize};

use crate::ids::{CableId, InterfaceId};

/// A cable links exactly two interfaces. Stored by id, never by pointer,
/// so the graph has no ownership cycles (spec.md §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cable {
    pub id: CableId,
    pub a: InterfaceId,
    pub b: InterfaceId,
}

impl Cable {
    /// The interface on the other end of this cable from `from`, if `from`
    /// is actually one of its endpoints.
    pub fn peer_of(&self, from: InterfaceId) -> Option<InterfaceId> {
        if self.a == from {
            Some(self.b)
        } else if self.b == from {
            Some(self.a)
        } else {
            None
        }
    }
}
