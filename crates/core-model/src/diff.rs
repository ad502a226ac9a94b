use serde::{Deserialize, Serialize};

/// A unified textual diff between the previously published and newly
/// generated configuration for a device, plus where it was published to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffArtifact {
    pub device_name: String,
    pub unified_diff: String,
    pub journal_entry_id: Option<String>,
    pub file_path: Option<String>,
}

impl DiffArtifact {
    pub fn is_empty(&self) -> bool {
        self.unified_diff.is_empty()
    }
}
