#![warn(clippy::all, missing_docs)]

//! Core domain logic for Bazaar.
//!
//! This crate owns the player's currency and inventory, the shop catalog,
//! change notifications and save-game persistence. Frontends only call
//! into [`ItemService`] and re-render when it notifies them.

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod save;
pub mod service;

pub use catalog::{Catalog, CatalogEntry, Purchasable};
pub use crate::config::AppConfig;
pub use error::StoreError;
pub use events::{EventBus, EventKind, ServiceEvent, SubscriptionId};
pub use models::{ItemFilter, ItemRecord, ItemType};
pub use save::{
    FileStore, KeyValueStore, MemoryStore, PersistenceGateway, SaveSnapshot, DEFAULT_CURRENCY,
    ITEM_SERVICE_KEY,
};
pub use service::ItemService;
