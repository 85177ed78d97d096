//! Demo catalog and stock for local runs (`GYMOPS_SEED_DEMO=true`).

use tracing::info;

use gymops_core::{DomainResult, Location, Money};
use gymops_inventory::NewItem;

use crate::facade::InventoryFacade;

const CENTERS: [&str; 2] = ["centro_sevilla", "centro_malaga"];

// sku, name, category, unit, purchase cents, sale cents, center min, center stock
const ITEMS: [(&str, &str, &str, &str, i64, i64, i64, i64); 4] = [
    ("CAM-M", "Camiseta M", "merchandising", "unidad", 1500, 2500, 5, 12),
    ("TRX-1", "Correa TRX", "material", "unidad", 3000, 5500, 2, 4),
    ("TOA-1", "Toalla", "limpieza", "unidad", 500, 1200, 10, 25),
    ("BOT-1", "Botella agua", "merchandising", "unidad", 300, 800, 8, 20),
];

pub fn seed_demo(facade: &InventoryFacade) -> DomainResult<()> {
    let central = facade.config().central_warehouse.clone();

    for (sku, name, category, unit, purchase, sale, min, stock) in ITEMS {
        let item = facade.register_item(NewItem {
            sku: sku.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            unit: unit.to_string(),
            purchase_price: Money::from_cents(purchase),
            sale_price: Money::from_cents(sale),
        })?;

        facade.assign_stock(item.id, central.clone(), min * 2, None, stock * 5, "seed")?;
        for center in CENTERS {
            facade.assign_stock(item.id, Location::new(center)?, min, Some(min * 6), stock, "seed")?;
        }
    }

    info!(items = ITEMS.len(), "demo data seeded");
    Ok(())
}
