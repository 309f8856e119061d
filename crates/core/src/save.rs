//! Save snapshots and the persistence gateway that stores them.

use std::{
    collections::{HashMap, HashSet},
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::{
    error::{Result, StoreError},
    models::ItemRecord,
};

/// Storage key under which the item service persists its snapshot.
pub const ITEM_SERVICE_KEY: &str = "ItemServiceData";

/// Namespace prepended to every key before it reaches the backing store.
pub const DEFAULT_KEY_PREFIX: &str = "Bazaar_";

/// Currency granted to a fresh player.
pub const DEFAULT_CURRENCY: i64 = 100;

/// Keys removed by [`PersistenceGateway::delete_all`].
const KNOWN_KEYS: &[&str] = &[ITEM_SERVICE_KEY];

/// Serializable aggregate of currency and inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot {
    /// Currency balance at save time.
    pub currency: i64,
    /// Owned stacks in display order.
    pub inventory_items: Vec<ItemRecord>,
}

impl Default for SaveSnapshot {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY,
            inventory_items: Vec::new(),
        }
    }
}

impl SaveSnapshot {
    /// Build a snapshot from live state.
    pub fn new(currency: i64, inventory_items: Vec<ItemRecord>) -> Self {
        Self {
            currency,
            inventory_items,
        }
    }

    /// A snapshot may be applied when the balance is non-negative and every
    /// stack is a valid record with a positive quantity and a unique id.
    pub fn is_valid(&self) -> bool {
        if self.currency < 0 {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.inventory_items.len());
        self.inventory_items
            .iter()
            .all(|item| item.is_valid() && item.quantity > 0 && seen.insert(item.id.as_str()))
    }
}

/// Durable string-keyed storage backing the persistence gateway.
pub trait KeyValueStore {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Whether a value exists under `key`.
    fn contains(&self, key: &str) -> Result<bool>;
    /// Remove `key`, returning whether a value was present.
    fn remove(&self, key: &str) -> Result<bool>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn contains(&self, key: &str) -> Result<bool> {
        (**self).contains(key)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        (**self).remove(key)
    }
}

/// Stores each key as `<key>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the stored files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let component =
            sanitize_component(key).ok_or_else(|| StoreError::InvalidKey(key.to_string()))?;
        Ok(self.root.join(format!("{component}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::io(path, err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|err| StoreError::io(&self.root, err))?;

        // Write beside the target so the rename stays on one filesystem.
        let mut staging =
            NamedTempFile::new_in(&self.root).map_err(|err| StoreError::io(&self.root, err))?;
        staging
            .write_all(value.as_bytes())
            .map_err(|err| StoreError::io(staging.path(), err))?;
        staging
            .persist(&path)
            .map_err(|err| StoreError::io(&path, err.error))?;
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.path_for(key)?.is_file())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::io(path, err)),
        }
    }
}

/// Volatile store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Returns true when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.values.read().contains_key(key))
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.values.write().remove(key).is_some())
    }
}

/// Converts values to and from JSON inside a namespaced key-value store.
///
/// Failures never escape: saves report `false` and loads fall back to the
/// caller's default, with the cause logged.
pub struct PersistenceGateway {
    store: Box<dyn KeyValueStore>,
    prefix: String,
}

impl PersistenceGateway {
    /// Wrap a store using the default namespace.
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self::with_prefix(store, DEFAULT_KEY_PREFIX)
    }

    /// Wrap a store using a custom namespace.
    pub fn with_prefix(store: impl KeyValueStore + 'static, prefix: impl Into<String>) -> Self {
        Self {
            store: Box::new(store),
            prefix: prefix.into(),
        }
    }

    /// Namespace prepended to keys.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Serialize `data` and store it under `key`.
    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> bool {
        match self.try_save(key, data) {
            Ok(bytes) => {
                debug!(key, bytes, "saved data");
                true
            }
            Err(err) => {
                error!(key, %err, "failed to save data");
                false
            }
        }
    }

    /// Load the value stored under `key`, or `default` when it is missing,
    /// empty or malformed.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_load(key) {
            Ok(Some(data)) => {
                debug!(key, "loaded data");
                data
            }
            Ok(None) => {
                info!(key, "no saved data found, using default");
                default
            }
            Err(err) => {
                error!(key, %err, "failed to load saved data, using default");
                default
            }
        }
    }

    fn try_save<T: Serialize>(&self, key: &str, data: &T) -> Result<usize> {
        let json = serde_json::to_string_pretty(data)?;
        self.store.set(&self.full_key(key), &json)?;
        Ok(json.len())
    }

    fn try_load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(json) = self.store.get(&self.full_key(key))? else {
            return Ok(None);
        };
        if json.trim().is_empty() {
            warn!(key, "saved data is empty");
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Whether data exists under `key`.
    pub fn exists(&self, key: &str) -> bool {
        match self.store.contains(&self.full_key(key)) {
            Ok(found) => found,
            Err(err) => {
                error!(key, %err, "failed to check saved data");
                false
            }
        }
    }

    /// Delete the data under `key`. Returns false when nothing was stored.
    pub fn delete(&self, key: &str) -> bool {
        match self.store.remove(&self.full_key(key)) {
            Ok(true) => {
                info!(key, "deleted saved data");
                true
            }
            Ok(false) => {
                warn!(key, "no saved data to delete");
                false
            }
            Err(err) => {
                error!(key, %err, "failed to delete saved data");
                false
            }
        }
    }

    /// Delete every key this application is known to write.
    pub fn delete_all(&self) -> bool {
        let mut ok = true;
        for key in KNOWN_KEYS {
            if let Err(err) = self.store.remove(&self.full_key(key)) {
                error!(key, %err, "failed to delete saved data");
                ok = false;
            }
        }
        ok
    }

    /// Serialize a value without storing it.
    pub fn to_json<T: Serialize>(data: &T, pretty: bool) -> Option<String> {
        let result = if pretty {
            serde_json::to_string_pretty(data)
        } else {
            serde_json::to_string(data)
        };
        result
            .map_err(|err| error!(%err, "failed to convert to JSON"))
            .ok()
    }

    /// Deserialize a value without touching the store.
    pub fn from_json<T: DeserializeOwned>(json: &str) -> Option<T> {
        if json.trim().is_empty() {
            return None;
        }
        serde_json::from_str(json)
            .map_err(|err| error!(%err, "failed to convert from JSON"))
            .ok()
    }

    /// Whether `json` decodes as a `T`.
    pub fn validate_json<T: DeserializeOwned>(json: &str) -> bool {
        !json.trim().is_empty() && serde_json::from_str::<T>(json).is_ok()
    }
}

fn sanitize_component(input: &str) -> Option<String> {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemType;
    use anyhow::Result;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_snapshot() -> SaveSnapshot {
        SaveSnapshot::new(
            42,
            vec![
                ItemRecord::new("potion", "Potion", "Heals", 10, ItemType::Consumable)
                    .with_quantity(2),
                ItemRecord::new("ore", "Ore", "", 3, ItemType::Material).with_quantity(7),
            ],
        )
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::InvalidKey(key.to_string()))
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::InvalidKey(key.to_string()))
        }

        fn contains(&self, key: &str) -> Result<bool, StoreError> {
            Err(StoreError::InvalidKey(key.to_string()))
        }

        fn remove(&self, key: &str) -> Result<bool, StoreError> {
            Err(StoreError::InvalidKey(key.to_string()))
        }
    }

    #[test]
    fn snapshot_schema_matches_save_format() -> Result<()> {
        let value = serde_json::to_value(sample_snapshot())?;
        assert_eq!(value["currency"], json!(42));
        assert_eq!(value["inventoryItems"][0]["itemName"], json!("Potion"));
        assert_eq!(value["inventoryItems"][1]["itemType"], json!("Material"));
        assert!(value["inventoryItems"][0].get("icon").is_none());
        Ok(())
    }

    #[test]
    fn snapshot_validity() {
        assert!(SaveSnapshot::default().is_valid());
        assert_eq!(SaveSnapshot::default().currency, DEFAULT_CURRENCY);
        assert!(sample_snapshot().is_valid());

        let mut negative = sample_snapshot();
        negative.currency = -1;
        assert!(!negative.is_valid());

        let mut empty_stack = sample_snapshot();
        empty_stack.inventory_items[0].quantity = 0;
        assert!(!empty_stack.is_valid());

        let mut duplicate = sample_snapshot();
        duplicate.inventory_items[1].id = "potion".to_string();
        assert!(!duplicate.is_valid());

        let mut nameless = sample_snapshot();
        nameless.inventory_items[1].name.clear();
        assert!(!nameless.is_valid());
    }

    #[test]
    fn file_store_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().join("saves"));

        assert_eq!(store.get("Bazaar_Data")?, None);
        assert!(!store.contains("Bazaar_Data")?);

        store.set("Bazaar_Data", "{\"a\":1}")?;
        assert!(store.contains("Bazaar_Data")?);
        assert_eq!(store.get("Bazaar_Data")?.as_deref(), Some("{\"a\":1}"));

        store.set("Bazaar_Data", "{\"a\":2}")?;
        assert_eq!(store.get("Bazaar_Data")?.as_deref(), Some("{\"a\":2}"));

        let leftovers: Vec<_> = fs::read_dir(store.root())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(leftovers, vec!["Bazaar_Data.json".to_string()]);

        assert!(store.remove("Bazaar_Data")?);
        assert!(!store.remove("Bazaar_Data")?);
        assert_eq!(store.get("Bazaar_Data")?, None);
        Ok(())
    }

    #[test]
    fn file_store_rejects_unusable_keys() {
        let store = FileStore::new("/nonexistent");
        assert!(matches!(
            store.get("???"),
            Err(StoreError::InvalidKey(key)) if key == "???"
        ));
    }

    #[test]
    fn sanitize_strips_unsafe_characters() {
        assert_eq!(
            sanitize_component("../Hello World!* 18").as_deref(),
            Some("HelloWorld18")
        );
        assert_eq!(sanitize_component("/.."), None);
    }

    #[test]
    fn gateway_prefixes_keys() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let gateway = PersistenceGateway::new(store.clone());

        assert!(gateway.save(ITEM_SERVICE_KEY, &sample_snapshot()));
        assert!(store.contains("Bazaar_ItemServiceData")?);
        assert!(!store.contains(ITEM_SERVICE_KEY)?);
        assert!(gateway.exists(ITEM_SERVICE_KEY));

        let custom = PersistenceGateway::with_prefix(store.clone(), "Other_");
        assert!(!custom.exists(ITEM_SERVICE_KEY));
        assert_eq!(custom.prefix(), "Other_");
        Ok(())
    }

    #[test]
    fn gateway_load_round_trip_and_defaults() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let gateway = PersistenceGateway::new(store.clone());

        let missing: SaveSnapshot = gateway.load(ITEM_SERVICE_KEY, SaveSnapshot::default());
        assert_eq!(missing, SaveSnapshot::default());

        assert!(gateway.save(ITEM_SERVICE_KEY, &sample_snapshot()));
        let loaded: SaveSnapshot = gateway.load(ITEM_SERVICE_KEY, SaveSnapshot::default());
        assert_eq!(loaded, sample_snapshot());

        store.set("Bazaar_ItemServiceData", "   ")?;
        let empty: SaveSnapshot = gateway.load(ITEM_SERVICE_KEY, SaveSnapshot::default());
        assert_eq!(empty, SaveSnapshot::default());

        store.set("Bazaar_ItemServiceData", "{\"currency\": \"lots\"}")?;
        let malformed: SaveSnapshot = gateway.load(ITEM_SERVICE_KEY, SaveSnapshot::default());
        assert_eq!(malformed, SaveSnapshot::default());

        store.set("Bazaar_ItemServiceData", "{\"currency\": 5, \"inventoryItems\": null}")?;
        let null_items: SaveSnapshot = gateway.load(ITEM_SERVICE_KEY, SaveSnapshot::default());
        assert_eq!(null_items, SaveSnapshot::default());
        Ok(())
    }

    #[test]
    fn gateway_delete_and_delete_all() {
        let store = Arc::new(MemoryStore::new());
        let gateway = PersistenceGateway::new(store.clone());

        assert!(!gateway.delete(ITEM_SERVICE_KEY));
        assert!(gateway.save(ITEM_SERVICE_KEY, &sample_snapshot()));
        assert!(gateway.delete(ITEM_SERVICE_KEY));
        assert!(!gateway.exists(ITEM_SERVICE_KEY));

        assert!(gateway.save(ITEM_SERVICE_KEY, &sample_snapshot()));
        assert!(gateway.delete_all());
        assert!(store.is_empty());
    }

    #[test]
    fn gateway_swallows_store_failures() {
        let gateway = PersistenceGateway::new(BrokenStore);
        assert!(!gateway.save(ITEM_SERVICE_KEY, &sample_snapshot()));
        assert!(!gateway.exists(ITEM_SERVICE_KEY));
        assert!(!gateway.delete(ITEM_SERVICE_KEY));
        assert!(!gateway.delete_all());
        let loaded: SaveSnapshot = gateway.load(ITEM_SERVICE_KEY, SaveSnapshot::default());
        assert_eq!(loaded, SaveSnapshot::default());
    }

    #[test]
    fn json_helpers() {
        let compact = PersistenceGateway::to_json(&sample_snapshot(), false).unwrap_or_default();
        assert!(!compact.contains('\n'));
        let pretty = PersistenceGateway::to_json(&sample_snapshot(), true).unwrap_or_default();
        assert!(pretty.contains('\n'));

        let decoded: Option<SaveSnapshot> = PersistenceGateway::from_json(&compact);
        assert_eq!(decoded, Some(sample_snapshot()));
        assert_eq!(PersistenceGateway::from_json::<SaveSnapshot>(""), None);
        assert_eq!(PersistenceGateway::from_json::<SaveSnapshot>("[1,2"), None);

        assert!(PersistenceGateway::validate_json::<SaveSnapshot>(&pretty));
        assert!(!PersistenceGateway::validate_json::<SaveSnapshot>("{}"));
        assert!(!PersistenceGateway::validate_json::<SaveSnapshot>(""));
    }
}
