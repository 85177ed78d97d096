//! Replenishment order engine.
//!
//! Orders are `InternalOrder` aggregates. Every transition loads the order,
//! runs the command through `gymops_events::execute`, and writes it back with
//! an exact-version check, all while holding that order's lock. Two racing
//! transitions on one order are serialized: the second sees the new status
//! and fails with `InvalidTransition`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use gymops_core::{AggregateRoot, DomainError, DomainResult, ExpectedVersion, ItemId, Location, OrderId};
use gymops_events::{Event, execute};
use gymops_replenishment::{
    CancelOrder, CreateOrder, DeliverOrder, InternalOrder, OrderCommand, OrderLine, OrderNumber,
    OrderStats, OrderStatus, ProcessOrder, RecordPayment, ShipOrder,
};

use crate::catalog::CatalogService;
use crate::locks::KeyedLocks;
use crate::repository::{Scope, Stores, all_records};

pub struct OrderEngine {
    stores: Stores,
    catalog: Arc<CatalogService>,
    locks: KeyedLocks<OrderId>,
}

impl OrderEngine {
    pub fn new(stores: Stores, catalog: Arc<CatalogService>) -> Self {
        Self {
            stores,
            catalog,
            locks: KeyedLocks::new(),
        }
    }

    /// Create a single-line order priced at the current purchase price of the
    /// item's sku. The order number is drawn only after validation passes.
    pub fn create_order(
        &self,
        item_id: ItemId,
        from_location: &Location,
        to_location: &Location,
        quantity: i64,
        requested_by: &str,
        reason: &str,
    ) -> DomainResult<InternalOrder> {
        let requested = self.catalog.get(item_id)?;
        let current = self
            .catalog
            .versions_of(&requested.sku)?
            .into_iter()
            .next()
            .unwrap_or(requested);

        let line = OrderLine::new(current.id, current.name.clone(), quantity, current.purchase_price)?;
        if from_location == to_location {
            return Err(DomainError::validation("order source and destination must differ"));
        }

        let order_id = OrderId::new();
        let order_number = OrderNumber::new(self.stores.order_numbers.next_value()?);
        let command = OrderCommand::Create(CreateOrder {
            order_id,
            order_number,
            from_location: from_location.clone(),
            to_location: to_location.clone(),
            lines: vec![line],
            requested_by: requested_by.to_string(),
            notes: reason.to_string(),
            occurred_at: Utc::now(),
        });

        let mut order = InternalOrder::empty(order_id);
        let events = execute(&mut order, &command)?;
        self.stores.orders.insert(order.clone())?;

        for ev in &events {
            info!(
                event = ev.event_type(),
                %order_id,
                %order_number,
                from = %from_location,
                to = %to_location,
                total = %order.total_amount(),
                "order created"
            );
        }
        Ok(order)
    }

    /// `pendiente → procesando`.
    pub fn process_order(&self, order_id: OrderId, processed_by: &str) -> DomainResult<InternalOrder> {
        self.transition(
            order_id,
            OrderCommand::Process(ProcessOrder {
                order_id,
                processed_by: processed_by.to_string(),
                occurred_at: Utc::now(),
            }),
        )
    }

    /// `procesando → enviado`; any other state is rejected.
    pub fn mark_shipped(&self, order_id: OrderId) -> DomainResult<InternalOrder> {
        self.transition(
            order_id,
            OrderCommand::Ship(ShipOrder {
                order_id,
                occurred_at: Utc::now(),
            }),
        )
    }

    /// `enviado → entregado` (terminal).
    pub fn mark_delivered(&self, order_id: OrderId, received_by: &str) -> DomainResult<InternalOrder> {
        self.transition(
            order_id,
            OrderCommand::Deliver(DeliverOrder {
                order_id,
                received_by: received_by.to_string(),
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn cancel(&self, order_id: OrderId, reason: &str) -> DomainResult<InternalOrder> {
        self.transition(
            order_id,
            OrderCommand::Cancel(CancelOrder {
                order_id,
                reason: reason.to_string(),
                occurred_at: Utc::now(),
            }),
        )
    }

    /// Allowed in every status, terminal ones included.
    pub fn mark_paid(&self, order_id: OrderId) -> DomainResult<InternalOrder> {
        self.transition(
            order_id,
            OrderCommand::RecordPayment(RecordPayment {
                order_id,
                occurred_at: Utc::now(),
            }),
        )
    }

    fn transition(&self, order_id: OrderId, command: OrderCommand) -> DomainResult<InternalOrder> {
        let set = self.locks.for_keys(&[order_id])?;
        let _held = set.acquire()?;

        let mut order = self
            .stores
            .orders
            .get(&order_id)?
            .ok_or_else(|| DomainError::order_not_found(order_id))?;
        let expected = ExpectedVersion::Exact(order.version());

        let events = execute(&mut order, &command).inspect_err(|e| {
            warn!(%order_id, status = %order.status(), error = %e, "order transition rejected");
        })?;
        self.stores.orders.update(order.clone(), expected)?;

        for ev in &events {
            info!(
                event = ev.event_type(),
                %order_id,
                order_number = %order.order_number(),
                status = %order.status(),
                "order transitioned"
            );
        }
        Ok(order)
    }

    pub fn get(&self, order_id: OrderId) -> DomainResult<InternalOrder> {
        self.stores
            .orders
            .get(&order_id)?
            .ok_or_else(|| DomainError::order_not_found(order_id))
    }

    /// Every order, in creation order.
    pub fn list(&self) -> DomainResult<Vec<InternalOrder>> {
        Ok(self.stores.orders.list(&all_records)?)
    }

    /// Orders shipping from or to `location`, newest first.
    pub fn orders_by_location(&self, location: &Location) -> DomainResult<Vec<InternalOrder>> {
        debug!(%location, "listing orders");
        let mut orders = self
            .stores
            .orders
            .list_scoped(
                &Scope::new().any_of(&["from_location", "to_location"], location),
                &|o: &InternalOrder| o.involves(location),
            )?;
        orders.sort_by(|a, b| b.order_number().cmp(&a.order_number()));
        Ok(orders)
    }

    /// Orders still `pendiente`, oldest first.
    pub fn pending_orders(&self) -> DomainResult<Vec<InternalOrder>> {
        let mut orders = self
            .stores
            .orders
            .list_scoped(
                &Scope::new().field("status", OrderStatus::Pending.as_str()),
                &|o: &InternalOrder| o.status() == OrderStatus::Pending,
            )?;
        orders.sort_by_key(|o| o.order_number());
        Ok(orders)
    }

    pub fn stats(&self) -> DomainResult<OrderStats> {
        let orders = self.list()?;
        OrderStats::from_orders(&orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymops_core::Money;
    use gymops_inventory::NewItem;
    use gymops_replenishment::PaymentStatus;

    fn loc(s: &str) -> Location {
        Location::new(s).unwrap()
    }

    fn setup() -> (OrderEngine, Arc<CatalogService>, ItemId) {
        let stores = Stores::in_memory();
        let catalog = Arc::new(CatalogService::new(stores.clone()));
        let item = catalog
            .register(NewItem {
                sku: "CAM-M".to_string(),
                name: "Camiseta M".to_string(),
                category: "merchandising".to_string(),
                unit: "unidad".to_string(),
                purchase_price: Money::from_cents(1500),
                sale_price: Money::from_cents(2500),
            })
            .unwrap();
        (OrderEngine::new(stores, catalog.clone()), catalog, item.id)
    }

    fn create(engine: &OrderEngine, item: ItemId) -> InternalOrder {
        engine
            .create_order(item, &loc("almacen_central"), &loc("centro_sevilla"), 10, "Ana García", "Stock bajo")
            .unwrap()
    }

    #[test]
    fn create_prices_from_catalog_and_numbers_sequentially() {
        let (engine, _, item) = setup();
        let first = create(&engine, item);
        let second = create(&engine, item);

        assert_eq!(first.status(), OrderStatus::Pending);
        assert_eq!(first.payment_status(), PaymentStatus::Pending);
        assert_eq!(first.total_amount(), Money::from_cents(15_000));
        assert_eq!(first.order_number().to_string(), "PED-AUTO-001");
        assert!(second.order_number() > first.order_number());
    }

    #[test]
    fn create_uses_current_price_after_reprice() {
        let (engine, catalog, item) = setup();
        let v2 = catalog
            .reprice(item, Money::from_cents(1800), Money::from_cents(2500))
            .unwrap();

        let order = create(&engine, item);
        assert_eq!(order.lines()[0].item_id, v2.id);
        assert_eq!(order.total_amount(), Money::from_cents(18_000));
    }

    #[test]
    fn unknown_item_appends_nothing() {
        let (engine, _, _) = setup();
        let err = engine
            .create_order(ItemId::new(), &loc("almacen_central"), &loc("centro_sevilla"), 1, "a", "b")
            .unwrap_err();

        assert!(matches!(err, DomainError::ItemNotFound(_)));
        assert_eq!(engine.stats().unwrap().total_orders, 0);
    }

    #[test]
    fn invalid_quantity_does_not_consume_a_number() {
        let (engine, _, item) = setup();
        assert!(
            engine
                .create_order(item, &loc("almacen_central"), &loc("centro_sevilla"), 0, "a", "b")
                .is_err()
        );
        assert_eq!(create(&engine, item).order_number().value(), 1);
    }

    #[test]
    fn process_is_not_repeatable() {
        let (engine, _, item) = setup();
        let order = create(&engine, item);

        let processed = engine.process_order(order.id_typed(), "Admin").unwrap();
        assert_eq!(processed.status(), OrderStatus::Processing);
        assert_eq!(processed.processed_by(), Some("Admin"));

        assert!(matches!(
            engine.process_order(order.id_typed(), "Admin"),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert_eq!(engine.get(order.id_typed()).unwrap().status(), OrderStatus::Processing);
    }

    #[test]
    fn full_lifecycle_and_payment() {
        let (engine, _, item) = setup();
        let id = create(&engine, item).id_typed();

        engine.process_order(id, "Admin").unwrap();
        engine.mark_shipped(id).unwrap();
        let delivered = engine.mark_delivered(id, "Luis").unwrap();
        assert_eq!(delivered.status(), OrderStatus::Delivered);
        assert_eq!(delivered.received_by(), Some("Luis"));

        assert!(engine.cancel(id, "tarde").is_err());
        assert_eq!(engine.mark_paid(id).unwrap().payment_status(), PaymentStatus::Paid);
    }

    #[test]
    fn ship_requires_processing_and_unknown_ids_fail() {
        let (engine, _, item) = setup();
        let id = create(&engine, item).id_typed();

        assert!(matches!(engine.mark_shipped(id), Err(DomainError::InvalidTransition { .. })));
        assert!(matches!(
            engine.mark_shipped(OrderId::new()),
            Err(DomainError::OrderNotFound(_))
        ));
    }

    #[test]
    fn stats_report_value_overflow_instead_of_panicking() {
        let (engine, catalog, _) = setup();
        let treadmill = catalog
            .register(NewItem {
                sku: "CINTA-1".to_string(),
                name: "Cinta de correr".to_string(),
                category: "maquinaria".to_string(),
                unit: "unidad".to_string(),
                purchase_price: Money::from_cents(i64::MAX / 2 + 1),
                sale_price: Money::from_cents(i64::MAX / 2 + 1),
            })
            .unwrap();
        for _ in 0..2 {
            engine
                .create_order(treadmill.id, &loc("almacen_central"), &loc("centro_sevilla"), 1, "Ana", "b")
                .unwrap();
        }

        assert!(matches!(engine.stats(), Err(DomainError::Validation(_))));
        assert_eq!(engine.pending_orders().unwrap().len(), 2);
    }

    #[test]
    fn listings_and_stats() {
        let (engine, _, item) = setup();
        let a = create(&engine, item).id_typed();
        let b = create(&engine, item).id_typed();
        engine.cancel(b, "duplicado").unwrap();

        let pending = engine.pending_orders().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id_typed(), a);

        let sevilla = engine.orders_by_location(&loc("centro_sevilla")).unwrap();
        assert_eq!(sevilla.len(), 2);
        assert_eq!(sevilla[0].id_typed(), b);
        assert!(engine.orders_by_location(&loc("centro_malaga")).unwrap().is_empty());

        let stats = engine.stats().unwrap();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.cancelled_orders, 1);
        assert_eq!(stats.total_value, Money::from_cents(30_000));
    }
}
