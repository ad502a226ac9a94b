use serde::Deserialize;
use serde_json::Value;

/// Recognized `event_type`s from the `ironic_versioned_notifications.info`
/// routing key (spec.md §6). Anything else is ignored by the consumer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmcEventType {
    PowerSetEnd,
    PowerStateCorrectedSuccess,
    MaintenanceSetEnd,
    ProvisionSetStart,
    ProvisionSetSuccess,
    ProvisionSetEnd,
    PortCreateEnd,
    PortUpdateEnd,
    NodeDeleteEnd,
}

impl BmcEventType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "baremetal.node.power_set.end" => Some(Self::PowerSetEnd),
            "baremetal.node.power_state_corrected.success" => Some(Self::PowerStateCorrectedSuccess),
            "baremetal.node.maintenance_set.end" => Some(Self::MaintenanceSetEnd),
            "baremetal.node.provision_set.start" => Some(Self::ProvisionSetStart),
            "baremetal.node.provision_set.success" => Some(Self::ProvisionSetSuccess),
            "baremetal.node.provision_set.end" => Some(Self::ProvisionSetEnd),
            "baremetal.port.create.end" => Some(Self::PortCreateEnd),
            "baremetal.port.update.end" => Some(Self::PortUpdateEnd),
            "baremetal.node.delete.end" => Some(Self::NodeDeleteEnd),
            _ => None,
        }
    }
}

/// Envelope shape: `{event_type, payload: {ironic_object.data: {...}}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    pub event_type: String,
    pub payload: NotificationPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationPayload {
    #[serde(rename = "ironic_object.data")]
    pub data: Value,
}

impl NotificationEnvelope {
    pub fn kind(&self) -> Option<BmcEventType> {
        BmcEventType::from_str(&self.event_type)
    }

    pub fn node_uuid(&self) -> Option<uuid::Uuid> {
        self.payload
            .data
            .get("uuid")
            .and_then(Value::as_str)
            .and_then(|s| uuid::Uuid::parse_str(s).ok())
    }

    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.payload.data.get(field).and_then(Value::as_str)
    }
}
