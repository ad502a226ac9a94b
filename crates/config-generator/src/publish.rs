//! Drift detection and atomic publication, ported from `exporter.py`'s
//! `save_config_to_netbox` / `export_config_to_file`. Both destinations
//! share one rule: compute the new document, compare it against whatever
//! was published last, and do nothing at all when they match.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use similar::TextDiff;

use core_model::{Device, DiffArtifact};
use inventory_client::{InventoryClient, JournalEntryKind};

use crate::device_meta;
use crate::error::ConfigGeneratorError;
use crate::model::SonicConfigDocument;

/// Which device field names the on-disk export file (`SONIC_EXPORT_IDENTIFIER`
/// in the original).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportIdentifier {
    Hostname,
    SerialNumber,
}

#[derive(Debug, Clone)]
pub struct PublishOptions<'a> {
    pub export_dir: &'a Path,
    pub prefix: &'a str,
    pub suffix: &'a str,
    pub identifier: ExportIdentifier,
}

/// Publishes `cfg` for `device`: merges it into the Inventory's
/// `sonic_config` custom field (journaling a diff when the previous value
/// differs) and writes it to `<export_dir>/<prefix><identifier><suffix>`.
/// Both writes are skipped when the freshly generated document is
/// structurally identical to what's already published — the on-disk file's
/// mtime is left untouched and no journal entry is created.
pub async fn publish(
    device: &Device,
    cfg: &SonicConfigDocument,
    inventory: &dyn InventoryClient,
    options: &PublishOptions<'_>,
) -> Result<DiffArtifact, ConfigGeneratorError> {
    let new_value = cfg.to_json();
    let previous_value = device.custom_fields.extra.get("sonic_config").cloned();

    if previous_value.as_ref() == Some(&new_value) {
        tracing::info!(device = %device.name, "no changes detected for sonic config, skipping publish");
        return Ok(DiffArtifact {
            device_name: device.name.clone(),
            unified_diff: String::new(),
            journal_entry_id: None,
            file_path: None,
        });
    }

    let previous_json = previous_value
        .as_ref()
        .map(|v| serde_json::to_string_pretty(v).unwrap_or_default())
        .unwrap_or_default();
    let new_json = cfg.to_pretty_json();
    let unified_diff = render_unified_diff(&previous_json, &new_json, &device.name);

    inventory
        .update_custom_fields(device.id, json!({ "sonic_config": new_value }))
        .await
        .map_err(|e| ConfigGeneratorError::Publish { device: device.name.clone(), reason: e.to_string() })?;
    tracing::info!(device = %device.name, "updated sonic_config custom field");

    if !unified_diff.is_empty() {
        let comment = format!("SONiC Configuration Update\n\n```diff\n{unified_diff}\n```");
        inventory
            .create_journal_entry(device.id, JournalEntryKind::Info, &comment)
            .await
            .map_err(|e| ConfigGeneratorError::Publish { device: device.name.clone(), reason: e.to_string() })?;
        tracing::info!(device = %device.name, "wrote configuration diff to journal");
    }

    let file_path = write_export_file(device, cfg, options)?;

    Ok(DiffArtifact {
        device_name: device.name.clone(),
        unified_diff,
        journal_entry_id: None,
        file_path: Some(file_path),
    })
}

/// A deep, order-insensitive comparison is what the original gets from
/// `DeepDiff(..., ignore_order=True)`; plain JSON `Value` equality already
/// gives the same answer here because every table/field map this generator
/// produces is a `BTreeMap` and every ordered list (VLAN members, breakout
/// lanes) is built in a fixed, sorted order — there's no object-key or
/// array-element shuffling left for `ignore_order` to absorb.
fn structurally_equal(a: &Value, b: &Value) -> bool {
    a == b
}

fn render_unified_diff(previous: &str, new: &str, device_name: &str) -> String {
    if previous.is_empty() {
        return String::new();
    }
    TextDiff::from_lines(previous, new)
        .unified_diff()
        .header(
            &format!("SONiC Config - {device_name} (existing)"),
            &format!("SONiC Config - {device_name} (new)"),
        )
        .to_string()
}

fn write_export_file(
    device: &Device,
    cfg: &SonicConfigDocument,
    options: &PublishOptions<'_>,
) -> Result<String, ConfigGeneratorError> {
    fs::create_dir_all(options.export_dir)?;

    let identifier = match options.identifier {
        ExportIdentifier::SerialNumber => device.serial.clone().unwrap_or_else(|| {
            tracing::warn!(device = %device.name, "no serial number recorded, falling back to hostname");
            device_meta::hostname(device)
        }),
        ExportIdentifier::Hostname => device_meta::hostname(device),
    };

    let filename = format!("{}{}{}", options.prefix, identifier, options.suffix);
    let filepath = options.export_dir.join(&filename);
    let new_body = cfg.to_pretty_json();

    let unchanged = fs::read_to_string(&filepath)
        .ok()
        .and_then(|existing| serde_json::from_str::<Value>(&existing).ok())
        .map(|existing| structurally_equal(&existing, &cfg.to_json()))
        .unwrap_or(false);
    if unchanged {
        return Ok(filepath.to_string_lossy().into_owned());
    }

    let tmp_path = options.export_dir.join(format!(".{filename}.tmp"));
    fs::write(&tmp_path, &new_body)?;
    fs::rename(&tmp_path, &filepath)?;

    if options.identifier == ExportIdentifier::SerialNumber && device.serial.is_some() {
        let hostname = device_meta::hostname(device);
        if hostname != identifier {
            let hostname_filename = format!("{}{}{}", options.prefix, hostname, options.suffix);
            let hostname_path = options.export_dir.join(&hostname_filename);
            let _ = fs::remove_file(&hostname_path);
            symlink_export(&filename, &hostname_path)?;
        }
    }

    Ok(filepath.to_string_lossy().into_owned())
}

#[cfg(unix)]
fn symlink_export(target: &str, link: &Path) -> Result<(), ConfigGeneratorError> {
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

#[cfg(not(unix))]
fn symlink_export(target: &str, link: &Path) -> Result<(), ConfigGeneratorError> {
    fs::copy(target, link)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;
    use tempfile::tempdir;

    use core_model::{CustomFields, DeviceId, DeviceRole};

    use super::*;

    struct RecordingInventory {
        patches: std::sync::Mutex<Vec<Value>>,
        journals: std::sync::Mutex<Vec<String>>,
    }

    impl RecordingInventory {
        fn new() -> Self {
            Self { patches: std::sync::Mutex::new(Vec::new()), journals: std::sync::Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl InventoryClient for RecordingInventory {
        async fn status(&self) -> inventory_client::port::Result<()> {
            Ok(())
        }
        async fn get_device(&self, _name: &str) -> inventory_client::port::Result<Device> {
            unreachable!()
        }
        async fn filter_devices(
            &self,
            _filter: &inventory_client::DeviceFilter,
        ) -> inventory_client::port::Result<Vec<Device>> {
            Ok(Vec::new())
        }
        async fn list_interfaces(&self, _device_id: DeviceId) -> inventory_client::port::Result<Vec<core_model::Interface>> {
            Ok(Vec::new())
        }
        async fn list_ip_addresses(&self, _device_id: DeviceId) -> inventory_client::port::Result<Vec<core_model::IpAddress>> {
            Ok(Vec::new())
        }
        async fn list_cables(&self, _device_id: DeviceId) -> inventory_client::port::Result<Vec<core_model::Cable>> {
            Ok(Vec::new())
        }
        async fn list_prefixes(&self, _role: Option<&str>) -> inventory_client::port::Result<Vec<core_model::Prefix>> {
            Ok(Vec::new())
        }
        async fn update_custom_fields(&self, _device_id: DeviceId, patch: Value) -> inventory_client::port::Result<()> {
            self.patches.lock().unwrap().push(patch);
            Ok(())
        }
        async fn create_journal_entry(
            &self,
            _device_id: DeviceId,
            _kind: JournalEntryKind,
            message: &str,
        ) -> inventory_client::port::Result<()> {
            self.journals.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn device(name: &str, custom_fields: CustomFields) -> Device {
        Device {
            id: DeviceId::default(),
            name: name.to_string(),
            role: DeviceRole::Leaf,
            primary_ipv4: None,
            primary_ipv6: None,
            tags: BTreeSet::new(),
            oob_ip: None,
            serial: None,
            custom_fields,
        }
    }

    fn sample_doc(value: &str) -> SonicConfigDocument {
        let mut doc = SonicConfigDocument::default();
        let mut fields = serde_json::Map::new();
        fields.insert("hostname".to_string(), Value::from(value));
        doc.insert("DEVICE_METADATA", "localhost", fields);
        doc
    }

    #[tokio::test]
    async fn first_publish_writes_custom_field_and_file_with_no_diff() {
        let dir = tempdir().unwrap();
        let d = device("leaf-01", CustomFields::default());
        let inventory = RecordingInventory::new();
        let options = PublishOptions { export_dir: dir.path(), prefix: "sonic-", suffix: ".json", identifier: ExportIdentifier::Hostname };

        let artifact = publish(&d, &sample_doc("leaf-01"), &inventory, &options).await.unwrap();
        assert!(artifact.unified_diff.is_empty(), "no previous config to diff against");
        assert_eq!(inventory.patches.lock().unwrap().len(), 1);
        assert!(inventory.journals.lock().unwrap().is_empty());
        assert!(dir.path().join("sonic-leaf-01.json").exists());
    }

    #[tokio::test]
    async fn unchanged_config_is_a_no_op() {
        let mut cf = CustomFields::default();
        let doc = sample_doc("leaf-01");
        cf.extra.insert("sonic_config".to_string(), doc.to_json());
        let d = device("leaf-01", cf);
        let inventory = RecordingInventory::new();
        let dir = tempdir().unwrap();
        let options = PublishOptions { export_dir: dir.path(), prefix: "sonic-", suffix: ".json", identifier: ExportIdentifier::Hostname };

        let artifact = publish(&d, &doc, &inventory, &options).await.unwrap();
        assert!(artifact.unified_diff.is_empty());
        assert!(artifact.file_path.is_none());
        assert!(inventory.patches.lock().unwrap().is_empty());
        assert!(inventory.journals.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn changed_config_journals_a_unified_diff() {
        let mut cf = CustomFields::default();
        cf.extra.insert("sonic_config".to_string(), sample_doc("leaf-01-old").to_json());
        let d = device("leaf-01", cf);
        let inventory = RecordingInventory::new();
        let dir = tempdir().unwrap();
        let options = PublishOptions { export_dir: dir.path(), prefix: "sonic-", suffix: ".json", identifier: ExportIdentifier::Hostname };

        let artifact = publish(&d, &sample_doc("leaf-01-new"), &inventory, &options).await.unwrap();
        assert!(!artifact.unified_diff.is_empty());
        assert!(artifact.unified_diff.contains("leaf-01-new"));
        assert_eq!(inventory.journals.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn serial_number_identifier_symlinks_hostname_file() {
        let mut cf = CustomFields::default();
        cf.inventory_hostname = Some("leaf-01".to_string());
        let mut d = device("leaf-01", cf);
        d.serial = Some("SN12345".to_string());
        let inventory = RecordingInventory::new();
        let dir = tempdir().unwrap();
        let options = PublishOptions { export_dir: dir.path(), prefix: "sonic-", suffix: ".json", identifier: ExportIdentifier::SerialNumber };

        publish(&d, &sample_doc("leaf-01"), &inventory, &options).await.unwrap();
        assert!(dir.path().join("sonic-SN12345.json").exists());
        let link = dir.path().join("sonic-leaf-01.json");
        assert!(link.exists());
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    }

    #[tokio::test]
    async fn rewriting_with_identical_content_leaves_file_untouched() {
        let d = device("leaf-01", CustomFields::default());
        let inventory = RecordingInventory::new();
        let dir = tempdir().unwrap();
        let options = PublishOptions { export_dir: dir.path(), prefix: "sonic-", suffix: ".json", identifier: ExportIdentifier::Hostname };
        let doc = sample_doc("leaf-01");

        publish(&d, &doc, &inventory, &options).await.unwrap();
        let path = dir.path().join("sonic-leaf-01.json");
        let mtime_before = fs::metadata(&path).unwrap().modified().unwrap();

        // A fresh inventory so the custom-field short-circuit doesn't apply,
        // but the on-disk file itself is byte-for-byte the same document.
        let inventory2 = RecordingInventory::new();
        publish(&d, &doc, &inventory2, &options).await.unwrap();
        let mtime_after = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(mtime_before, mtime_after);
    }
}
