//! Assembles the `InventorySnapshot` the Config Generator and BGP/AS
//! helpers operate on, by walking every device the Inventory knows about
//! through the `InventoryClient` port (ported from `sync_sonic`'s device
//! enumeration, generalized from "the managed SONiC set" to "everything",
//! since cable peers and transfer prefixes can sit on either side).

use std::collections::HashMap;

use core_model::InventorySnapshot;
use inventory_client::{DeviceFilter, InventoryClient};

pub async fn build_snapshot(
    inventory: &dyn InventoryClient,
) -> Result<InventorySnapshot, inventory_client::InventoryError> {
    let devices = inventory.filter_devices(&DeviceFilter::default()).await?;

    let mut snapshot = InventorySnapshot::default();
    let mut interfaces = HashMap::new();
    let mut cables = HashMap::new();
    let mut ip_addresses = HashMap::new();

    for device in &devices {
        for iface in inventory.list_interfaces(device.id).await? {
            interfaces.insert(iface.id, iface);
        }
        for cable in inventory.list_cables(device.id).await? {
            cables.insert(cable.id, cable);
        }
        for ip in inventory.list_ip_addresses(device.id).await? {
            ip_addresses.insert(ip.id, ip);
        }
    }

    for prefix in inventory.list_prefixes(None).await? {
        snapshot.prefixes.insert(prefix.id, prefix);
    }

    snapshot.devices = devices.into_iter().map(|d| (d.id, d)).collect();
    snapshot.interfaces = interfaces;
    snapshot.cables = cables;
    snapshot.ip_addresses = ip_addresses;
    Ok(snapshot)
}
