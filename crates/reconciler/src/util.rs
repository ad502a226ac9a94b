use serde_json::{Map, Value};
use vault::Vault;

/// `DELETE`, as a bare string value, removes the matching key rather than
/// replacing it (the original's sentinel in `deep_merge`).
const DELETE_SENTINEL: &str = "DELETE";

/// Recursively merges `patch` into `base`: nested objects merge key by
/// key, every other value type fully replaces the existing one
/// (spec.md §4.2: "`deep_merge` does full-value replacement for nested
/// maps"). A string value of `"DELETE"` removes the key.
pub fn deep_merge(base: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        if value.as_str() == Some(DELETE_SENTINEL) {
            base.remove(key);
            continue;
        }
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Collects keys present in `desired` that are absent from or differ in
/// `actual` into `updates`, recursing into nested objects (the original's
/// `deep_compare`). `ignore_keys` lets a caller skip fields the backend
/// never echoes back (e.g. a write-only password).
pub fn deep_compare(
    desired: &Map<String, Value>,
    actual: &Map<String, Value>,
    ignore_keys: &[&str],
) -> Map<String, Value> {
    let mut updates = Map::new();
    for (key, value) in desired {
        if ignore_keys.contains(&key.as_str()) {
            continue;
        }
        match value {
            Value::Object(nested_desired) => {
                let nested_actual = actual.get(key).and_then(Value::as_object);
                let nested_updates = match nested_actual {
                    Some(na) => deep_compare(nested_desired, na, ignore_keys),
                    None => nested_desired.clone(),
                };
                if !nested_updates.is_empty() {
                    updates.insert(key.clone(), Value::Object(nested_updates));
                }
            }
            other => {
                if actual.get(key) != Some(other) {
                    updates.insert(key.clone(), other.clone());
                }
            }
        }
    }
    updates
}

/// Walks `value` depth-first, decrypting any leaf string the `Vault`
/// flags as encrypted; a leaf that fails to decrypt is dropped silently
/// (spec.md §7: "an intentional design choice so that partial rotation
/// does not wedge reconciliation").
pub fn deep_decrypt(value: &mut Value, vault: &dyn Vault) {
    match value {
        Value::Object(map) => {
            let keys: Vec<String> = map.keys().cloned().collect();
            for key in keys {
                let entry = map.get_mut(&key).unwrap();
                match entry {
                    Value::Object(_) | Value::Array(_) => deep_decrypt(entry, vault),
                    Value::String(s) if vault.is_encrypted(s) => match vault.decrypt(s) {
                        Ok(plain) => *entry = Value::String(plain),
                        Err(_) => {
                            map.remove(&key);
                        }
                    },
                    _ => {}
                }
            }
        }
        Value::Array(items) => {
            let mut i = 0;
            while i < items.len() {
                match &items[i] {
                    Value::Object(_) | Value::Array(_) => {
                        deep_decrypt(&mut items[i], vault);
                        i += 1;
                    }
                    Value::String(s) if vault.is_encrypted(s) => match vault.decrypt(s) {
                        Ok(plain) => {
                            items[i] = Value::String(plain);
                            i += 1;
                        }
                        Err(_) => {
                            // the original leaves list items in place on
                            // failure rather than removing them
                            i += 1;
                        }
                    },
                    _ => i += 1,
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vault::{Vault, VaultError};

    struct AlwaysEncryptedFailingVault;

    impl Vault for AlwaysEncryptedFailingVault {
        fn is_encrypted(&self, value: &str) -> bool {
            value.starts_with("enc:")
        }

        fn decrypt(&self, _value: &str) -> Result<String, VaultError> {
            Err(VaultError::DecryptFailed)
        }
    }

    #[test]
    fn deep_merge_replaces_nested_maps_fully_on_type_mismatch() {
        let mut base = json!({"a": {"x": 1, "y": 2}, "b": 5}).as_object().unwrap().clone();
        let patch = json!({"a": {"y": 9}, "b": {"nested": true}}).as_object().unwrap().clone();
        deep_merge(&mut base, &patch);
        assert_eq!(base["a"]["x"], 1);
        assert_eq!(base["a"]["y"], 9);
        assert_eq!(base["b"]["nested"], true);
    }

    #[test]
    fn deep_merge_delete_sentinel_removes_key() {
        let mut base = json!({"a": 1, "b": 2}).as_object().unwrap().clone();
        let patch = json!({"a": "DELETE"}).as_object().unwrap().clone();
        deep_merge(&mut base, &patch);
        assert!(!base.contains_key("a"));
        assert_eq!(base["b"], 2);
    }

    #[test]
    fn deep_compare_finds_nested_differences() {
        let desired = json!({"driver_info": {"redfish_address": "https://10.0.0.5", "redfish_username": "admin"}})
            .as_object().unwrap().clone();
        let actual = json!({"driver_info": {"redfish_address": "https://10.0.0.9", "redfish_username": "admin"}})
            .as_object().unwrap().clone();
        let updates = deep_compare(&desired, &actual, &[]);
        assert_eq!(updates["driver_info"]["redfish_address"], "https://10.0.0.5");
        assert!(updates["driver_info"].get("redfish_username").is_none());
    }

    #[test]
    fn deep_compare_ignores_configured_keys() {
        let desired = json!({"driver_info": {"redfish_password": "new"}}).as_object().unwrap().clone();
        let actual = json!({"driver_info": {}}).as_object().unwrap().clone();
        let updates = deep_compare(&desired, &actual, &["redfish_password"]);
        assert!(updates.is_empty());
    }

    #[test]
    fn deep_decrypt_drops_leaf_on_failure() {
        let mut value = json!({"password": "enc:garbage", "username": "admin"});
        deep_decrypt(&mut value, &AlwaysEncryptedFailingVault);
        assert!(value.get("password").is_none());
        assert_eq!(value["username"], "admin");
    }
}
