//! Catalog service: item registration, repricing and name lookup.

use chrono::Utc;
use tracing::info;

use gymops_core::{DomainError, DomainResult, ItemId, Money};
use gymops_inventory::{Item, NewItem, current_versions, find_current_by_name};

use crate::locks::KeyedLocks;
use crate::repository::{Scope, Stores, all_records};

pub struct CatalogService {
    stores: Stores,
    // Keyed by sku: two concurrent reprices must not both become version N+1.
    locks: KeyedLocks<String>,
}

impl CatalogService {
    pub fn new(stores: Stores) -> Self {
        Self {
            stores,
            locks: KeyedLocks::new(),
        }
    }

    pub fn register(&self, input: NewItem) -> DomainResult<Item> {
        let item = Item::register(input, Utc::now())?;
        let set = self.locks.for_keys(std::slice::from_ref(&item.sku))?;
        let _held = set.acquire()?;

        let sku = item.sku.clone();
        let same_sku = self
            .stores
            .items
            .list_scoped(&Scope::new().field("sku", &sku), &|i: &Item| i.sku == sku)?;
        if !same_sku.is_empty() {
            return Err(DomainError::validation(format!("sku {} is already registered", item.sku)));
        }
        self.stores.items.insert(item.clone())?;

        info!(item_id = %item.id, sku = %item.sku, "item registered");
        Ok(item)
    }

    /// Store a new version of `item_id` with new prices. Only the current
    /// version of a sku can be repriced.
    pub fn reprice(&self, item_id: ItemId, purchase_price: Money, sale_price: Money) -> DomainResult<Item> {
        let existing = self.get(item_id)?;
        let set = self.locks.for_keys(std::slice::from_ref(&existing.sku))?;
        let _held = set.acquire()?;

        let latest = self
            .versions_of(&existing.sku)?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::item_not_found(item_id))?;
        if latest.id != existing.id {
            return Err(DomainError::validation(format!(
                "item {item_id} was superseded by version {}",
                latest.catalog_version
            )));
        }

        let next = existing.reprice(purchase_price, sale_price, Utc::now())?;
        self.stores.items.insert(next.clone())?;

        info!(
            sku = %next.sku,
            version = next.catalog_version,
            purchase_price = %next.purchase_price,
            "item repriced"
        );
        Ok(next)
    }

    /// Any version, current or not.
    pub fn get(&self, item_id: ItemId) -> DomainResult<Item> {
        self.stores
            .items
            .get(&item_id)?
            .ok_or_else(|| DomainError::item_not_found(item_id))
    }

    /// Current version whose name matches, ignoring case and surrounding space.
    pub fn find_by_name(&self, name: &str) -> DomainResult<Item> {
        let items = self.stores.items.list(&all_records)?;
        find_current_by_name(&items, name).cloned()
    }

    /// Every version of `sku`, newest first.
    pub fn versions_of(&self, sku: &str) -> DomainResult<Vec<Item>> {
        let mut versions = self
            .stores
            .items
            .list_scoped(&Scope::new().field("sku", &sku), &|i: &Item| i.sku == sku)?;
        versions.sort_by(|a, b| b.catalog_version.cmp(&a.catalog_version));
        Ok(versions)
    }

    /// Current version of every sku, sorted by name.
    pub fn list_current(&self) -> DomainResult<Vec<Item>> {
        let items = self.stores.items.list(&all_records)?;
        Ok(current_versions(&items).into_iter().cloned().collect())
    }
}
