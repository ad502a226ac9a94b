//! Environment-variable driven startup configuration, following
//! `sem_os_server::main`'s pattern: required values `.expect()`, optional
//! values `.unwrap_or_else()` with a constant default. No config-file
//! format is invented here.

use std::time::Duration;

use serde_json::{Map, Value};

const DEFAULT_PORT_CONFIG_DIR: &str = "/etc/sonic/port_config";
const DEFAULT_EXPORT_DIR: &str = "/etc/sonic/generated";
const DEFAULT_EXPORT_SUFFIX: &str = ".json";
const DEFAULT_MANAGED_SET_TAG: &str = "managed-by-bmc";

/// A missed periodic tick stays eligible for this long before being
/// dropped (original: `add_periodic_task(..., expires=10)`).
pub const PERIODIC_EXPIRES: Duration = Duration::from_secs(10);

pub struct StoreConfig {
    pub redis_url: Option<String>,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL").ok(),
        }
    }
}

pub struct InventoryClientConfig {
    pub base_url: String,
    pub token: String,
    pub secondary: Option<InventorySecondaryConfig>,
}

pub struct InventorySecondaryConfig {
    pub name: Option<String>,
    pub site: Option<String>,
    pub base_url: String,
    pub token: String,
}

impl InventoryClientConfig {
    pub fn from_env() -> Self {
        let secondary = std::env::var("INVENTORY_SECONDARY_BASE_URL").ok().map(|base_url| {
            InventorySecondaryConfig {
                name: std::env::var("INVENTORY_SECONDARY_NAME").ok(),
                site: std::env::var("INVENTORY_SECONDARY_SITE").ok(),
                base_url,
                token: std::env::var("INVENTORY_SECONDARY_TOKEN")
                    .expect("INVENTORY_SECONDARY_TOKEN must be set when INVENTORY_SECONDARY_BASE_URL is"),
            }
        });
        Self {
            base_url: std::env::var("INVENTORY_BASE_URL").expect("INVENTORY_BASE_URL must be set"),
            token: std::env::var("INVENTORY_TOKEN").expect("INVENTORY_TOKEN must be set"),
            secondary,
        }
    }
}

pub struct BmcClientConfig {
    pub base_url: String,
    pub token: String,
}

impl BmcClientConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("BMC_BASE_URL").expect("BMC_BASE_URL must be set"),
            token: std::env::var("BMC_TOKEN").expect("BMC_TOKEN must be set"),
        }
    }
}

/// The rest of the process's knobs: managed-set selection, where SONiC
/// port configs and generated output live, queue concurrency, and sweep
/// cadence.
pub struct OrchestratorConfig {
    pub vault_key: Option<[u8; 32]>,
    pub managed_set_tag: String,
    pub base_ironic_parameters: Map<String, Value>,
    pub sonic_port_config_dir: std::path::PathBuf,
    pub sonic_export_dir: std::path::PathBuf,
    pub sonic_export_prefix: String,
    pub sonic_export_suffix: String,
    pub conductor_concurrency: usize,
    pub reconciler_concurrency: usize,
    pub ansible_concurrency: usize,
    pub default_concurrency: usize,
    pub sync_sonic_interval: Duration,
    pub sweep_inbound_interval: Duration,
    pub sweep_outbound_interval: Duration,
}

fn env_duration_secs(key: &str, default_secs: u64) -> Duration {
    Duration::from_secs(
        std::env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default_secs),
    )
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        let vault_key = std::env::var("VAULT_KEY_BASE64").ok().map(|encoded| {
            use base64::engine::general_purpose::STANDARD as BASE64;
            use base64::Engine;
            let bytes = BASE64.decode(encoded).expect("VAULT_KEY_BASE64 must be valid base64");
            let array: [u8; 32] = bytes
                .try_into()
                .expect("VAULT_KEY_BASE64 must decode to exactly 32 bytes");
            array
        });

        let base_ironic_parameters = std::env::var("IRONIC_BASE_PARAMETERS_JSON")
            .ok()
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_else(default_ironic_parameters);

        Self {
            vault_key,
            managed_set_tag: std::env::var("MANAGED_SET_TAG")
                .unwrap_or_else(|_| DEFAULT_MANAGED_SET_TAG.to_string()),
            base_ironic_parameters,
            sonic_port_config_dir: std::env::var("SONIC_PORT_CONFIG_DIR")
                .unwrap_or_else(|_| DEFAULT_PORT_CONFIG_DIR.to_string())
                .into(),
            sonic_export_dir: std::env::var("SONIC_EXPORT_DIR")
                .unwrap_or_else(|_| DEFAULT_EXPORT_DIR.to_string())
                .into(),
            sonic_export_prefix: std::env::var("SONIC_EXPORT_PREFIX").unwrap_or_default(),
            sonic_export_suffix: std::env::var("SONIC_EXPORT_SUFFIX")
                .unwrap_or_else(|_| DEFAULT_EXPORT_SUFFIX.to_string()),
            conductor_concurrency: env_usize("CONDUCTOR_QUEUE_CONCURRENCY", 2),
            reconciler_concurrency: env_usize("RECONCILER_QUEUE_CONCURRENCY", 4),
            ansible_concurrency: env_usize("ANSIBLE_QUEUE_CONCURRENCY", 1),
            default_concurrency: env_usize("DEFAULT_QUEUE_CONCURRENCY", 1),
            sync_sonic_interval: env_duration_secs("SYNC_SONIC_INTERVAL_SECS", 300),
            sweep_inbound_interval: env_duration_secs("SWEEP_INBOUND_INTERVAL_SECS", 300),
            sweep_outbound_interval: env_duration_secs("SWEEP_OUTBOUND_INTERVAL_SECS", 60),
        }
    }
}

/// A bare redfish template; real deployments override via
/// `IRONIC_BASE_PARAMETERS_JSON`.
fn default_ironic_parameters() -> Map<String, Value> {
    serde_json::json!({
        "driver": "redfish",
        "driver_info": {
            "redfish_address": "https://{{remote_board_address}}",
            "redfish_username": "{{remote_board_username}}",
            "redfish_password": "{{remote_board_password}}",
        }
    })
    .as_object()
    .unwrap()
    .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_usize_falls_back_to_default_on_missing_or_bad_value() {
        assert_eq!(env_usize("ORCHESTRATORD_TEST_MISSING_USIZE", 3), 3);
        std::env::set_var("ORCHESTRATORD_TEST_BAD_USIZE", "not-a-number");
        assert_eq!(env_usize("ORCHESTRATORD_TEST_BAD_USIZE", 3), 3);
        std::env::set_var("ORCHESTRATORD_TEST_GOOD_USIZE", "7");
        assert_eq!(env_usize("ORCHESTRATORD_TEST_GOOD_USIZE", 3), 7);
        std::env::remove_var("ORCHESTRATORD_TEST_BAD_USIZE");
        std::env::remove_var("ORCHESTRATORD_TEST_GOOD_USIZE");
    }

    #[test]
    fn env_duration_secs_falls_back_to_default() {
        assert_eq!(
            env_duration_secs("ORCHESTRATORD_TEST_MISSING_DURATION", 42),
            Duration::from_secs(42)
        );
        std::env::set_var("ORCHESTRATORD_TEST_GOOD_DURATION", "99");
        assert_eq!(
            env_duration_secs("ORCHESTRATORD_TEST_GOOD_DURATION", 42),
            Duration::from_secs(99)
        );
        std::env::remove_var("ORCHESTRATORD_TEST_GOOD_DURATION");
    }

    #[test]
    fn default_ironic_parameters_uses_redfish_driver() {
        let params = default_ironic_parameters();
        assert_eq!(params.get("driver").unwrap(), "redfish");
    }

    #[test]
    fn orchestrator_config_defaults_managed_set_tag_when_unset() {
        std::env::remove_var("MANAGED_SET_TAG");
        let config = OrchestratorConfig::from_env();
        assert_eq!(config.managed_set_tag, DEFAULT_MANAGED_SET_TAG);
        assert_eq!(config.sonic_export_suffix, DEFAULT_EXPORT_SUFFIX);
    }
}
