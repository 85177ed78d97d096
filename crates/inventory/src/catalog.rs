use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{DomainError, DomainResult, ItemId, Money};

/// Catalog entry: one immutable version of a purchasable item.
///
/// Items are never edited in place. A price change produces a new version with
/// a fresh `ItemId` and the same `sku`; ledger rows and order lines keep
/// pointing at the version they were created against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Stable identity across versions.
    pub sku: String,
    /// The one canonical display-name field. Name lookups match on this.
    pub name: String,
    pub category: String,
    /// Unit of measure (e.g. "unidad", "par", "caja").
    pub unit: String,
    pub purchase_price: Money,
    pub sale_price: Money,
    /// Catalog version of this sku, starting at 1.
    pub catalog_version: u32,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a brand-new sku.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub purchase_price: Money,
    pub sale_price: Money,
}

impl Item {
    pub fn register(input: NewItem, occurred_at: DateTime<Utc>) -> DomainResult<Self> {
        if input.sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        ensure_price(input.purchase_price)?;
        ensure_price(input.sale_price)?;

        Ok(Self {
            id: ItemId::new(),
            sku: input.sku.trim().to_string(),
            name: input.name.trim().to_string(),
            category: input.category.trim().to_string(),
            unit: input.unit.trim().to_string(),
            purchase_price: input.purchase_price,
            sale_price: input.sale_price,
            catalog_version: 1,
            created_at: occurred_at,
        })
    }

    /// New version of this item carrying different prices.
    pub fn reprice(
        &self,
        purchase_price: Money,
        sale_price: Money,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        ensure_price(purchase_price)?;
        ensure_price(sale_price)?;

        Ok(Self {
            id: ItemId::new(),
            purchase_price,
            sale_price,
            catalog_version: self.catalog_version + 1,
            created_at: occurred_at,
            ..self.clone()
        })
    }

    /// Case-insensitive, whitespace-trimmed match on `name`.
    pub fn matches_name(&self, query: &str) -> bool {
        self.name.to_lowercase() == query.trim().to_lowercase()
    }
}

fn ensure_price(price: Money) -> DomainResult<()> {
    if price.cents() < 0 {
        return Err(DomainError::validation("price cannot be negative"));
    }
    Ok(())
}

/// Latest version of every sku.
pub fn current_versions<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<&'a Item> {
    let mut latest: HashMap<&str, &Item> = HashMap::new();
    for item in items {
        latest
            .entry(item.sku.as_str())
            .and_modify(|cur| {
                if item.catalog_version > cur.catalog_version {
                    *cur = item;
                }
            })
            .or_insert(item);
    }

    let mut out: Vec<&Item> = latest.into_values().collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// Resolve a display name to the current version of its item.
///
/// Fails with `ItemNotFound` rather than guessing when nothing matches.
pub fn find_current_by_name<'a>(
    items: impl IntoIterator<Item = &'a Item>,
    name: &str,
) -> DomainResult<&'a Item> {
    current_versions(items)
        .into_iter()
        .find(|item| item.matches_name(name))
        .ok_or_else(|| DomainError::item_not_found(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camiseta() -> Item {
        Item::register(
            NewItem {
                sku: "CAM-M".to_string(),
                name: "Camiseta M".to_string(),
                category: "merchandising".to_string(),
                unit: "unidad".to_string(),
                purchase_price: Money::from_cents(1500),
                sale_price: Money::from_cents(2500),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn register_rejects_blank_name() {
        let mut input = NewItem {
            sku: "X".to_string(),
            name: "  ".to_string(),
            category: String::new(),
            unit: String::new(),
            purchase_price: Money::ZERO,
            sale_price: Money::ZERO,
        };
        assert!(matches!(
            Item::register(input.clone(), Utc::now()),
            Err(DomainError::Validation(_))
        ));

        input.name = "Correa".to_string();
        input.purchase_price = Money::from_cents(-1);
        assert!(Item::register(input, Utc::now()).is_err());
    }

    #[test]
    fn reprice_creates_a_new_version_and_leaves_the_old_one_alone() {
        let v1 = camiseta();
        let v2 = v1.reprice(Money::from_cents(1600), Money::from_cents(2600), Utc::now()).unwrap();

        assert_ne!(v1.id, v2.id);
        assert_eq!(v2.sku, v1.sku);
        assert_eq!(v2.catalog_version, 2);
        assert_eq!(v1.purchase_price, Money::from_cents(1500));
    }

    #[test]
    fn name_lookup_resolves_latest_version() {
        let v1 = camiseta();
        let v2 = v1.reprice(Money::from_cents(1600), Money::from_cents(2600), Utc::now()).unwrap();
        let items = vec![v1, v2.clone()];

        let found = find_current_by_name(&items, "  camiseta m ").unwrap();
        assert_eq!(found.id, v2.id);
    }

    #[test]
    fn name_lookup_fails_loudly() {
        let items = vec![camiseta()];
        let err = find_current_by_name(&items, "Correa TRX").unwrap_err();
        assert_eq!(err, DomainError::ItemNotFound("Correa TRX".to_string()));
    }
}
