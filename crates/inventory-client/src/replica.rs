/// One Inventory endpoint: the primary, or a secondary subject to a
/// filter predicate (spec.md §9: "the secondary list is a filterable
/// sequence; a filter predicate matches against `{name, site, base_url}`
/// substrings").
#[derive(Debug, Clone)]
pub struct InventoryReplica {
    pub name: Option<String>,
    pub site: Option<String>,
    pub base_url: String,
    pub token: String,
}

/// Matches the original's `_matches_netbox_filter`: substring/equality
/// against name or site; an empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct ReplicaFilter {
    pub name: Option<String>,
    pub site: Option<String>,
}

impl ReplicaFilter {
    pub fn matches(&self, replica: &InventoryReplica) -> bool {
        if let Some(want) = &self.name {
            if replica.name.as_deref() != Some(want.as_str()) {
                return false;
            }
        }
        if let Some(want) = &self.site {
            if replica.site.as_deref() != Some(want.as_str()) {
                return false;
            }
        }
        true
    }
}
