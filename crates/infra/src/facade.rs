//! Integration façade: the one entry point for incident-reporting surfaces.
//!
//! Sequences ledger mutation, alert evaluation and (human-confirmed) order
//! creation, forwards alert openings and new orders to the notification port,
//! and exposes the read side.

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use gymops_core::{AlertId, DomainError, DomainResult, ItemId, Location, Money, OrderId};
use gymops_inventory::{
    Alert, AlertType, InventoryEvent, Item, Movement, MovementType, NewItem, Severity, StockEntry,
};
use gymops_replenishment::{InternalOrder, OrderStats};

use crate::catalog::CatalogService;
use crate::config::InventoryConfig;
use crate::ledger::{LedgerOutcome, StockLedger, TransferOutcome};
use crate::notify::{Notifier, notify_best_effort};
use crate::orders::OrderEngine;
use crate::repository::Stores;

/// Result of `report_consumption`.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionReport {
    pub entry: StockEntry,
    /// Alert opened or refreshed by this consumption, if any.
    pub alert: Option<Alert>,
}

pub struct InventoryFacade {
    catalog: Arc<CatalogService>,
    ledger: StockLedger,
    orders: OrderEngine,
    notifier: Arc<dyn Notifier>,
    config: InventoryConfig,
}

impl InventoryFacade {
    pub fn new(stores: Stores, notifier: Arc<dyn Notifier>, config: InventoryConfig) -> Self {
        let catalog = Arc::new(CatalogService::new(stores.clone()));
        Self {
            ledger: StockLedger::new(stores.clone(), config.alert_policy.clone()),
            orders: OrderEngine::new(stores, catalog.clone()),
            catalog,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    // ---- incident flow ----

    /// Book a consumption (breakage, loss) as shrinkage at `location`.
    ///
    /// `item_name` resolves to the current catalog version; if stock is held
    /// under an older version of the same sku, that entry is used.
    #[instrument(skip(self))]
    pub fn report_consumption(
        &self,
        item_name: &str,
        quantity: i64,
        location: &Location,
        reason: &str,
        reported_by: &str,
    ) -> DomainResult<ConsumptionReport> {
        let item = self.stocked_version(item_name, location)?;
        let outcome = self.ledger.apply_movement(
            item.id,
            location,
            quantity,
            MovementType::Shrinkage,
            reason,
            reported_by,
        )?;
        self.forward_alerts(&outcome.events);

        let alert = outcome.alert.filter(|a| {
            outcome.events.iter().any(|ev| {
                matches!(ev, InventoryEvent::AlertOpened(x) | InventoryEvent::AlertRefreshed(x) if x.id == a.id)
            })
        });
        Ok(ConsumptionReport {
            entry: outcome.entry,
            alert,
        })
    }

    /// Create a replenishment order for an alert: `multiplier × min_stock`
    /// units from the central warehouse to the alert's location.
    #[instrument(skip(self, alert), fields(alert_id = %alert.id))]
    pub fn confirm_auto_reorder(&self, alert: &Alert, requested_by: &str) -> DomainResult<InternalOrder> {
        if alert.is_resolved {
            return Err(DomainError::invalid_transition("resolved", "reorder"));
        }
        if alert.alert_type == AlertType::Overstock {
            return Err(DomainError::validation("overstock alerts cannot be reordered"));
        }
        let quantity = alert
            .min_stock
            .checked_mul(self.config.reorder_multiplier)
            .ok_or_else(|| DomainError::validation("reorder quantity overflows"))?;
        if quantity <= 0 {
            return Err(DomainError::validation("minimum stock is zero, nothing to reorder"));
        }

        let order = self.orders.create_order(
            alert.item_id,
            &self.config.central_warehouse,
            &alert.location,
            quantity,
            requested_by,
            &alert.message,
        )?;

        self.announce_order(&order, alert.severity);
        Ok(order)
    }

    pub fn confirm_auto_reorder_by_id(&self, alert_id: AlertId, requested_by: &str) -> DomainResult<InternalOrder> {
        let alert = self.ledger.alert(alert_id)?;
        self.confirm_auto_reorder(&alert, requested_by)
    }

    // ---- catalog ----

    pub fn register_item(&self, input: NewItem) -> DomainResult<Item> {
        self.catalog.register(input)
    }

    pub fn reprice_item(&self, item_id: ItemId, purchase_price: Money, sale_price: Money) -> DomainResult<Item> {
        self.catalog.reprice(item_id, purchase_price, sale_price)
    }

    pub fn item(&self, item_id: ItemId) -> DomainResult<Item> {
        self.catalog.get(item_id)
    }

    pub fn find_item_by_name(&self, name: &str) -> DomainResult<Item> {
        self.catalog.find_by_name(name)
    }

    pub fn items(&self) -> DomainResult<Vec<Item>> {
        self.catalog.list_current()
    }

    // ---- ledger ----

    #[instrument(skip(self))]
    pub fn assign_stock(
        &self,
        item_id: ItemId,
        location: Location,
        min_stock: i64,
        max_stock: Option<i64>,
        initial_stock: i64,
        performed_by: &str,
    ) -> DomainResult<LedgerOutcome> {
        let outcome =
            self.ledger
                .assign_stock(item_id, location, min_stock, max_stock, initial_stock, performed_by)?;
        self.forward_alerts(&outcome.events);
        Ok(outcome)
    }

    #[instrument(skip(self))]
    pub fn record_movement(
        &self,
        item_id: ItemId,
        location: &Location,
        quantity: i64,
        movement_type: MovementType,
        reason: &str,
        performed_by: &str,
    ) -> DomainResult<LedgerOutcome> {
        let outcome = self
            .ledger
            .apply_movement(item_id, location, quantity, movement_type, reason, performed_by)?;
        self.forward_alerts(&outcome.events);
        Ok(outcome)
    }

    #[instrument(skip(self))]
    pub fn adjust_stock(
        &self,
        item_id: ItemId,
        location: &Location,
        delta: i64,
        reason: &str,
        performed_by: &str,
    ) -> DomainResult<LedgerOutcome> {
        let outcome = self.ledger.adjust(item_id, location, delta, reason, performed_by)?;
        self.forward_alerts(&outcome.events);
        Ok(outcome)
    }

    #[instrument(skip(self))]
    pub fn transfer_stock(
        &self,
        item_id: ItemId,
        from: &Location,
        to: &Location,
        quantity: i64,
        reason: &str,
        performed_by: &str,
    ) -> DomainResult<TransferOutcome> {
        let outcome = self
            .ledger
            .transfer(item_id, from, to, quantity, reason, performed_by)?;
        self.forward_alerts(&outcome.events);
        Ok(outcome)
    }

    pub fn reserve_stock(&self, item_id: ItemId, location: &Location, quantity: i64) -> DomainResult<StockEntry> {
        self.ledger.reserve(item_id, location, quantity)
    }

    pub fn release_stock(&self, item_id: ItemId, location: &Location, quantity: i64) -> DomainResult<StockEntry> {
        self.ledger.release(item_id, location, quantity)
    }

    #[instrument(skip(self))]
    pub fn set_thresholds(
        &self,
        item_id: ItemId,
        location: &Location,
        min_stock: i64,
        max_stock: Option<i64>,
    ) -> DomainResult<LedgerOutcome> {
        let outcome = self.ledger.set_thresholds(item_id, location, min_stock, max_stock)?;
        self.forward_alerts(&outcome.events);
        Ok(outcome)
    }

    // ---- alerts ----

    pub fn alert(&self, alert_id: AlertId) -> DomainResult<Alert> {
        self.ledger.alert(alert_id)
    }

    #[instrument(skip(self))]
    pub fn resolve_alert(&self, alert_id: AlertId, resolved_by: &str) -> DomainResult<Alert> {
        self.ledger.resolve_alert(alert_id, resolved_by)
    }

    pub fn mark_alert_read(&self, alert_id: AlertId) -> DomainResult<Alert> {
        self.ledger.mark_alert_read(alert_id)
    }

    // ---- orders ----

    #[instrument(skip(self))]
    pub fn create_order(
        &self,
        item_id: ItemId,
        from: &Location,
        to: &Location,
        quantity: i64,
        requested_by: &str,
        reason: &str,
    ) -> DomainResult<InternalOrder> {
        let order = self
            .orders
            .create_order(item_id, from, to, quantity, requested_by, reason)?;
        self.announce_order(&order, Severity::Medium);
        Ok(order)
    }

    #[instrument(skip(self))]
    pub fn process_order(&self, order_id: OrderId, processed_by: &str) -> DomainResult<InternalOrder> {
        self.orders.process_order(order_id, processed_by)
    }

    #[instrument(skip(self))]
    pub fn mark_shipped(&self, order_id: OrderId) -> DomainResult<InternalOrder> {
        self.orders.mark_shipped(order_id)
    }

    #[instrument(skip(self))]
    pub fn mark_delivered(&self, order_id: OrderId, received_by: &str) -> DomainResult<InternalOrder> {
        self.orders.mark_delivered(order_id, received_by)
    }

    #[instrument(skip(self))]
    pub fn cancel_order(&self, order_id: OrderId, reason: &str) -> DomainResult<InternalOrder> {
        self.orders.cancel(order_id, reason)
    }

    #[instrument(skip(self))]
    pub fn mark_paid(&self, order_id: OrderId) -> DomainResult<InternalOrder> {
        self.orders.mark_paid(order_id)
    }

    pub fn order(&self, order_id: OrderId) -> DomainResult<InternalOrder> {
        self.orders.get(order_id)
    }

    // ---- read side ----

    pub fn stock_by_location(&self, location: &Location) -> DomainResult<Vec<StockEntry>> {
        self.ledger.get_stock(location)
    }

    pub fn open_alerts_by_location(&self, location: &Location) -> DomainResult<Vec<Alert>> {
        self.ledger.open_alerts(location)
    }

    /// Newest first.
    pub fn movement_history(
        &self,
        location: Option<&Location>,
        item_id: Option<ItemId>,
    ) -> DomainResult<Vec<Movement>> {
        self.ledger.movement_history(location, item_id)
    }

    pub fn orders_by_location(&self, location: &Location) -> DomainResult<Vec<InternalOrder>> {
        self.orders.orders_by_location(location)
    }

    pub fn pending_orders(&self) -> DomainResult<Vec<InternalOrder>> {
        self.orders.pending_orders()
    }

    pub fn order_stats(&self) -> DomainResult<OrderStats> {
        self.orders.stats()
    }

    // ---- internals ----

    fn stocked_version(&self, item_name: &str, location: &Location) -> DomainResult<Item> {
        let current = self.catalog.find_by_name(item_name)?;
        for version in self.catalog.versions_of(&current.sku)? {
            if self.ledger.find_entry(version.id, location)?.is_some() {
                return Ok(version);
            }
        }
        Err(DomainError::no_stock_record(&current.name, location))
    }

    fn forward_alerts(&self, events: &[InventoryEvent]) {
        for ev in events {
            if let InventoryEvent::AlertOpened(alert) = ev {
                notify_best_effort(
                    self.notifier.as_ref(),
                    alert.severity,
                    &self.config.alert_recipients,
                    &format!("{}: {}", self.item_label(alert.item_id), alert.message),
                );
            }
        }
    }

    fn announce_order(&self, order: &InternalOrder, severity: Severity) {
        let (Some(line), Some(from), Some(to)) = (order.lines().first(), order.from_location(), order.to_location())
        else {
            return;
        };
        notify_best_effort(
            self.notifier.as_ref(),
            severity,
            &self.config.logistics_recipients,
            &format!(
                "Order {} created: {} x {} from {} to {}",
                order.order_number(),
                line.quantity,
                line.item_name,
                from,
                to
            ),
        );
    }

    fn item_label(&self, item_id: ItemId) -> String {
        self.catalog
            .get(item_id)
            .map(|item| item.name)
            .unwrap_or_else(|_| item_id.to_string())
    }
}
