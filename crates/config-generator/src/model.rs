//! The shape `generate()` produces: a nested map mirroring SONiC's
//! `config_db.json` — table name -> row key -> field map. Field maps use
//! `serde_json::Value` rather than a plain `String` because a handful of
//! fields (`PORTCHANNEL.members`, tagged-VLAN lists elsewhere in SONiC) are
//! arrays; everything else in this generator happens to be scalar strings.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

pub type Fields = Map<String, Value>;
pub type Table = BTreeMap<String, Fields>;

/// A full switch configuration document. `BTreeMap` throughout so
/// serialization is key-sorted without an extra sort pass, which is what
/// makes two `generate()` calls over the same input byte-identical and
/// diffable against a JSON file that was itself written with sorted keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SonicConfigDocument(pub BTreeMap<String, Table>);

impl SonicConfigDocument {
    pub fn table(&mut self, name: &str) -> &mut Table {
        self.0.entry(name.to_string()).or_default()
    }

    pub fn insert(&mut self, table: &str, key: impl Into<String>, fields: Fields) {
        self.table(table).insert(key.into(), fields);
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.0).expect("BTreeMap<String, Table> always serializes")
    }

    /// Pretty-printed, sorted-key JSON text — the exact representation
    /// used for both diffing and on-disk publication (spec.md §4.4.7).
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).expect("BTreeMap<String, Table> always serializes")
    }
}
