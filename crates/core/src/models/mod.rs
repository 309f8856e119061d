//! Shared domain models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of an item, used for shop and inventory filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemType {
    /// Used up on use (potions, food).
    #[default]
    Consumable,
    /// Worn or wielded gear.
    Equipment,
    /// Crafting ingredients.
    Material,
    /// Trade goods with no direct use.
    Valuable,
}

impl ItemType {
    /// Every variant in declaration order.
    pub const ALL: [ItemType; 4] = [
        ItemType::Consumable,
        ItemType::Equipment,
        ItemType::Material,
        ItemType::Valuable,
    ];

    /// Display label matching the serialised name.
    pub fn label(self) -> &'static str {
        match self {
            ItemType::Consumable => "Consumable",
            ItemType::Equipment => "Equipment",
            ItemType::Material => "Material",
            ItemType::Valuable => "Valuable",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One stack of a game item.
///
/// Field names follow the persisted save schema. The icon is a presentation
/// asset reference and never reaches the save file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemRecord {
    /// Stable identifier, unique within an inventory.
    pub id: String,
    /// Display name.
    #[serde(rename = "itemName")]
    pub name: String,
    /// Flavour text.
    pub description: String,
    /// Unit price in currency.
    pub price: i64,
    /// Number of units in this stack.
    pub quantity: i64,
    /// Category used by filters.
    #[serde(rename = "itemType")]
    pub item_type: ItemType,
    /// Optional asset reference resolved by the presentation layer.
    #[serde(skip)]
    pub icon: Option<String>,
}

impl Default for ItemRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            price: 0,
            quantity: 1,
            item_type: ItemType::Consumable,
            icon: None,
        }
    }
}

impl ItemRecord {
    /// Build a record with a quantity of one.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        price: i64,
        item_type: ItemType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            price,
            quantity: 1,
            item_type,
            icon: None,
        }
    }

    /// Builder-style quantity override.
    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Builder-style icon reference.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// A record is valid when it has an id, a name and a non-negative price.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.name.is_empty() && self.price >= 0
    }

    /// Total value of the stack, `None` on overflow.
    pub fn stack_value(&self) -> Option<i64> {
        self.price.checked_mul(self.quantity)
    }
}

/// Category filter applied to shop and inventory listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemFilter {
    /// Everything passes.
    #[default]
    All,
    /// Only items of the given type pass.
    Type(ItemType),
}

impl ItemFilter {
    /// Returns true when the record passes the filter.
    pub fn matches(&self, record: &ItemRecord) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::Type(item_type) => record.item_type == *item_type,
        }
    }

    /// Next filter in the cycle `All → Consumable → … → Valuable → All`.
    pub fn next(self) -> Self {
        match self {
            ItemFilter::All => ItemFilter::Type(ItemType::ALL[0]),
            ItemFilter::Type(current) => {
                let idx = ItemType::ALL
                    .iter()
                    .position(|candidate| *candidate == current)
                    .unwrap_or(0);
                ItemType::ALL
                    .get(idx + 1)
                    .copied()
                    .map(ItemFilter::Type)
                    .unwrap_or(ItemFilter::All)
            }
        }
    }

    /// Previous filter in the cycle.
    pub fn previous(self) -> Self {
        match self {
            ItemFilter::All => ItemFilter::Type(ItemType::ALL[ItemType::ALL.len() - 1]),
            ItemFilter::Type(current) => {
                let idx = ItemType::ALL
                    .iter()
                    .position(|candidate| *candidate == current)
                    .unwrap_or(0);
                match idx.checked_sub(1) {
                    Some(prev) => ItemFilter::Type(ItemType::ALL[prev]),
                    None => ItemFilter::All,
                }
            }
        }
    }

    /// Label used by filter bars.
    pub fn label(&self) -> &'static str {
        match self {
            ItemFilter::All => "All",
            ItemFilter::Type(item_type) => item_type.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn potion() -> ItemRecord {
        ItemRecord::new("potion", "Potion", "Restores health", 10, ItemType::Consumable)
    }

    #[test]
    fn validity_requires_id_name_and_price() {
        assert!(potion().is_valid());

        let mut missing_id = potion();
        missing_id.id.clear();
        assert!(!missing_id.is_valid());

        let mut missing_name = potion();
        missing_name.name.clear();
        assert!(!missing_name.is_valid());

        let mut negative_price = potion();
        negative_price.price = -1;
        assert!(!negative_price.is_valid());

        let mut free = potion();
        free.price = 0;
        assert!(free.is_valid());
    }

    #[test]
    fn serialises_with_save_schema_names() -> serde_json::Result<()> {
        let record = potion().with_quantity(3).with_icon("icons/potion.png");
        let value = serde_json::to_value(&record)?;
        assert_eq!(
            value,
            json!({
                "id": "potion",
                "itemName": "Potion",
                "description": "Restores health",
                "price": 10,
                "quantity": 3,
                "itemType": "Consumable",
            })
        );

        let decoded: ItemRecord = serde_json::from_value(value)?;
        assert_eq!(decoded.icon, None);
        assert_eq!(decoded.quantity, 3);
        Ok(())
    }

    #[test]
    fn missing_fields_take_defaults() -> serde_json::Result<()> {
        let decoded: ItemRecord = serde_json::from_value(json!({"id": "ore"}))?;
        assert_eq!(decoded.id, "ore");
        assert_eq!(decoded.name, "");
        assert_eq!(decoded.quantity, 1);
        assert_eq!(decoded.item_type, ItemType::Consumable);
        assert!(!decoded.is_valid());
        Ok(())
    }

    #[test]
    fn filter_cycles_through_every_type() {
        let mut filter = ItemFilter::All;
        let mut seen = Vec::new();
        for _ in 0..5 {
            filter = filter.next();
            seen.push(filter.label());
        }
        assert_eq!(
            seen,
            vec!["Consumable", "Equipment", "Material", "Valuable", "All"]
        );
        assert_eq!(ItemFilter::All.previous(), ItemFilter::Type(ItemType::Valuable));
        assert_eq!(
            ItemFilter::Type(ItemType::Consumable).previous(),
            ItemFilter::All
        );
    }

    #[test]
    fn filter_matches_by_type() {
        let sword = ItemRecord::new("sword", "Sword", "", 50, ItemType::Equipment);
        assert!(ItemFilter::All.matches(&sword));
        assert!(ItemFilter::Type(ItemType::Equipment).matches(&sword));
        assert!(!ItemFilter::Type(ItemType::Material).matches(&sword));
    }
}
