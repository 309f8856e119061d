//! Inventory and economy service: owns the player's currency and items.

use tracing::{debug, error, info, warn};

use crate::{
    catalog::{CatalogEntry, Purchasable},
    events::{EventBus, EventKind, ServiceEvent, SubscriptionId},
    models::{ItemFilter, ItemRecord},
    save::{PersistenceGateway, SaveSnapshot, DEFAULT_CURRENCY, ITEM_SERVICE_KEY},
};

/// Live currency balance, inventory and shop catalog for one player.
///
/// Every mutator validates its inputs before touching state, so a call that
/// returns `false` leaves the service exactly as it was and emits nothing.
/// Successful mutations notify listeners synchronously before returning.
pub struct ItemService {
    currency: i64,
    inventory: Vec<ItemRecord>,
    shop_catalog: Vec<CatalogEntry>,
    gateway: PersistenceGateway,
    events: EventBus,
}

impl ItemService {
    /// Create a service with the starting balance and an empty inventory.
    pub fn new(gateway: PersistenceGateway) -> Self {
        Self {
            currency: DEFAULT_CURRENCY,
            inventory: Vec::new(),
            shop_catalog: Vec::new(),
            gateway,
            events: EventBus::new(),
        }
    }

    /// Current currency balance.
    pub fn currency(&self) -> i64 {
        self.currency
    }

    /// Deduct `amount`. Fails without side effects on a negative amount or
    /// insufficient funds.
    pub fn spend_currency(&mut self, amount: i64) -> bool {
        if amount < 0 || amount > self.currency {
            debug!(amount, balance = self.currency, "spend rejected");
            return false;
        }
        self.currency -= amount;
        self.emit(ServiceEvent::CurrencyChanged(self.currency));
        true
    }

    /// Credit `amount`. Negative amounts are ignored.
    pub fn add_currency(&mut self, amount: i64) {
        if amount < 0 {
            return;
        }
        let Some(balance) = self.currency.checked_add(amount) else {
            warn!(amount, balance = self.currency, "currency credit would overflow");
            return;
        };
        self.currency = balance;
        self.emit(ServiceEvent::CurrencyChanged(self.currency));
    }

    /// Owned stacks in insertion order.
    pub fn inventory(&self) -> &[ItemRecord] {
        &self.inventory
    }

    /// Owned stacks passing `filter`, in insertion order.
    pub fn inventory_matching(&self, filter: ItemFilter) -> Vec<&ItemRecord> {
        self.inventory
            .iter()
            .filter(|item| filter.matches(item))
            .collect()
    }

    /// Whether a stack with `id` is owned.
    pub fn has_item(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Units owned of `id`, zero when absent.
    pub fn item_quantity(&self, id: &str) -> i64 {
        self.find(id).map_or(0, |item| item.quantity)
    }

    fn find(&self, id: &str) -> Option<&ItemRecord> {
        self.inventory.iter().find(|item| item.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.inventory.iter().position(|item| item.id == id)
    }

    /// Whether `add_item(record)` would succeed.
    fn accepts(&self, record: &ItemRecord) -> bool {
        if !record.is_valid() || record.quantity <= 0 {
            return false;
        }
        match self.find(&record.id) {
            Some(existing) => existing.quantity.checked_add(record.quantity).is_some(),
            None => true,
        }
    }

    /// Add a record, merging into an existing stack with the same id.
    ///
    /// Rejects invalid records and non-positive quantities. The `ItemAdded`
    /// payload is the incoming record; re-query for the merged total.
    pub fn add_item(&mut self, record: &ItemRecord) -> bool {
        if !self.accepts(record) {
            debug!(id = %record.id, quantity = record.quantity, "add rejected");
            return false;
        }
        match self.position(&record.id) {
            Some(idx) => self.inventory[idx].quantity += record.quantity,
            None => self.inventory.push(record.clone()),
        }
        self.emit(ServiceEvent::ItemAdded(record.clone()));
        self.emit(ServiceEvent::InventoryChanged);
        true
    }

    /// Remove `quantity` units of `id`. Fails when fewer are owned; there is
    /// no partial removal. A stack reaching zero leaves the inventory.
    pub fn remove_item(&mut self, id: &str, quantity: i64) -> bool {
        if quantity <= 0 {
            return false;
        }
        let Some(idx) = self.position(id) else {
            debug!(id, "remove rejected: not owned");
            return false;
        };
        if self.inventory[idx].quantity < quantity {
            debug!(
                id,
                requested = quantity,
                owned = self.inventory[idx].quantity,
                "remove rejected: insufficient stock"
            );
            return false;
        }

        self.inventory[idx].quantity -= quantity;
        let removed = if self.inventory[idx].quantity == 0 {
            self.inventory.remove(idx)
        } else {
            self.inventory[idx].clone()
        };
        self.emit(ServiceEvent::ItemRemoved(removed));
        self.emit(ServiceEvent::InventoryChanged);
        true
    }

    /// Drop every stack. Emits a single `InventoryChanged`.
    pub fn clear_inventory(&mut self) {
        self.inventory.clear();
        self.emit(ServiceEvent::InventoryChanged);
    }

    /// Entries currently offered by the shop.
    pub fn shop_catalog(&self) -> &[CatalogEntry] {
        &self.shop_catalog
    }

    /// Offered entries passing `filter`.
    pub fn shop_catalog_matching(&self, filter: ItemFilter) -> Vec<&CatalogEntry> {
        self.shop_catalog
            .iter()
            .filter(|entry| filter.matches(entry.record()))
            .collect()
    }

    /// Look up an offered entry by item id.
    pub fn catalog_entry(&self, id: &str) -> Option<&CatalogEntry> {
        self.shop_catalog.iter().find(|entry| entry.id() == id)
    }

    /// Replace the shop catalog. Absent entries are skipped.
    pub fn setup_shop_catalog<I, E>(&mut self, entries: I)
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<CatalogEntry>>,
    {
        self.shop_catalog = entries.into_iter().filter_map(Into::into).collect();
        debug!(entries = self.shop_catalog.len(), "shop catalog configured");
    }

    /// Whether the balance covers one unit of `item`.
    pub fn can_purchase(&self, item: &impl Purchasable) -> bool {
        item.unit_price()
            .map_or(false, |price| self.currency >= price)
    }

    /// Buy `quantity` units of `item`.
    ///
    /// Currency is spent first, then the stamped record is added. Every
    /// failure is detected before the spend, so a `false` result leaves
    /// currency and inventory untouched.
    pub fn purchase(&mut self, item: &impl Purchasable, quantity: i64) -> bool {
        if quantity <= 0 {
            return false;
        }
        let Some(price) = item.unit_price() else {
            warn!("purchase rejected: item has no valid price");
            return false;
        };
        let Some(total) = price.checked_mul(quantity) else {
            warn!(price, quantity, "purchase rejected: total cost overflows");
            return false;
        };

        let purchased = item.stamp(quantity);
        if !self.accepts(&purchased) {
            warn!(id = %purchased.id, "purchase rejected: inventory cannot hold item");
            return false;
        }
        if !self.spend_currency(total) {
            return false;
        }
        if !self.add_item(&purchased) {
            // accepts() above rules this out.
            error!(id = %purchased.id, "purchased item was not added");
        }

        info!(id = %purchased.id, quantity, total, "item purchased");
        self.emit(ServiceEvent::ItemPurchased(purchased));
        true
    }

    /// Buy from the current catalog by item id.
    pub fn purchase_by_id(&mut self, id: &str, quantity: i64) -> bool {
        let Some(entry) = self.catalog_entry(id).cloned() else {
            debug!(id, "purchase rejected: not in catalog");
            return false;
        };
        self.purchase(&entry, quantity)
    }

    /// Snapshot of the live state.
    pub fn snapshot(&self) -> SaveSnapshot {
        SaveSnapshot::new(self.currency, self.inventory.clone())
    }

    /// Persist the live state. Failure leaves live state untouched.
    pub fn save_state(&self) -> bool {
        let saved = self.gateway.save(ITEM_SERVICE_KEY, &self.snapshot());
        if saved {
            info!(
                currency = self.currency,
                stacks = self.inventory.len(),
                "item service data saved"
            );
        } else {
            error!("failed to save item service data");
        }
        saved
    }

    /// Replace live state with the saved snapshot, or the default snapshot
    /// when none is stored or it fails validation. Always notifies.
    pub fn load_state(&mut self) {
        let loaded: SaveSnapshot = self
            .gateway
            .load(ITEM_SERVICE_KEY, SaveSnapshot::default());
        let snapshot = if loaded.is_valid() {
            info!(
                currency = loaded.currency,
                stacks = loaded.inventory_items.len(),
                "item service data loaded"
            );
            loaded
        } else {
            warn!("invalid save data found, using default values");
            SaveSnapshot::default()
        };

        self.currency = snapshot.currency;
        self.inventory = snapshot.inventory_items;
        self.emit(ServiceEvent::CurrencyChanged(self.currency));
        self.emit(ServiceEvent::InventoryChanged);
    }

    /// Gateway used for persistence.
    pub fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    /// Listen for one kind of notification.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&ServiceEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(kind, listener)
    }

    /// Listen for every notification.
    pub fn subscribe_all(
        &mut self,
        listener: impl FnMut(&ServiceEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe_all(listener)
    }

    /// Stop a listener. Returns false for unknown ids.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit(&mut self, event: ServiceEvent) {
        self.events.emit(&event);
    }
}
