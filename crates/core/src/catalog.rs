//! Shop catalog definitions loaded from static configuration.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use tracing::warn;

use crate::models::{ItemRecord, ItemType};

/// Something the shop can sell: resolves a unit price and stamps runtime records.
pub trait Purchasable {
    /// Unit price, or `None` when no usable price can be resolved.
    fn unit_price(&self) -> Option<i64>;

    /// Produce a fresh record carrying `quantity` units.
    fn stamp(&self, quantity: i64) -> ItemRecord;
}

/// Immutable template for an item offered by the shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    record: ItemRecord,
}

impl CatalogEntry {
    /// Wrap a canonical record. Invalid definitions are kept but logged.
    pub fn new(record: ItemRecord) -> Self {
        if !record.is_valid() {
            warn!(id = %record.id, name = %record.name, price = record.price, "catalog entry has invalid data");
        }
        Self { record }
    }

    /// Canonical record for this entry.
    pub fn record(&self) -> &ItemRecord {
        &self.record
    }

    /// Identifier of the item this entry produces.
    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// Whether the canonical record passes validation.
    pub fn is_valid(&self) -> bool {
        self.record.is_valid()
    }
}

impl Purchasable for CatalogEntry {
    fn unit_price(&self) -> Option<i64> {
        self.record.unit_price()
    }

    fn stamp(&self, quantity: i64) -> ItemRecord {
        self.record.stamp(quantity)
    }
}

impl Purchasable for ItemRecord {
    fn unit_price(&self) -> Option<i64> {
        self.is_valid().then_some(self.price)
    }

    fn stamp(&self, quantity: i64) -> ItemRecord {
        self.clone().with_quantity(quantity)
    }
}

/// Ordered collection of catalog entries.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

static BUILTIN: Lazy<Vec<ItemRecord>> = Lazy::new(|| {
    vec![
        ItemRecord::new(
            "health_potion",
            "Health Potion",
            "Restores a modest amount of health.",
            10,
            ItemType::Consumable,
        ),
        ItemRecord::new(
            "mana_potion",
            "Mana Potion",
            "Restores a modest amount of mana.",
            15,
            ItemType::Consumable,
        ),
        ItemRecord::new(
            "iron_sword",
            "Iron Sword",
            "A plain but dependable blade.",
            60,
            ItemType::Equipment,
        ),
        ItemRecord::new(
            "leather_armor",
            "Leather Armor",
            "Light armor stitched from cured hide.",
            45,
            ItemType::Equipment,
        ),
        ItemRecord::new(
            "iron_ore",
            "Iron Ore",
            "Raw ore, ready for the smelter.",
            5,
            ItemType::Material,
        ),
        ItemRecord::new(
            "oak_plank",
            "Oak Plank",
            "Seasoned timber for crafting.",
            3,
            ItemType::Material,
        ),
        ItemRecord::new(
            "ruby",
            "Ruby",
            "A deep red gem prized by merchants.",
            120,
            ItemType::Valuable,
        ),
    ]
});

impl Catalog {
    /// Build a catalog from entries in display order.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Default shop stock used when no catalog file is configured.
    pub fn builtin() -> Self {
        Self::from_records(BUILTIN.iter().cloned())
    }

    /// Wrap each record in a catalog entry.
    pub fn from_records(records: impl IntoIterator<Item = ItemRecord>) -> Self {
        Self {
            entries: records.into_iter().map(CatalogEntry::new).collect(),
        }
    }

    /// Load a JSON array of item records from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let records: Vec<ItemRecord> = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse catalog {}", path.display()))?;
        Ok(Self::from_records(records))
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Consume the catalog and return its entries.
    pub fn into_entries(self) -> Vec<CatalogEntry> {
        self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the catalog offers nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
