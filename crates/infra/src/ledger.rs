//! Stock ledger service.
//!
//! Every mutation of a `StockEntry` runs as one unit under the per-key lock:
//!
//! ```text
//! lock (item, location)
//!   ↓
//! 1. read current entry
//!   ↓
//! 2. validate + build the movement (pure, `gymops_inventory`)
//!   ↓
//! 3. write entry (optimistic version check), append movement
//!   ↓
//! 4. evaluate alerts against the post-mutation entry and store the outcome
//!   ↓
//! unlock
//! ```
//!
//! A rejected movement fails at step 2 and writes nothing. No reader can see a
//! stock value whose alert evaluation has not been stored yet, because both
//! happen before the lock is released.

use chrono::Utc;
use tracing::{debug, info, warn};

use gymops_core::{AlertId, DomainError, DomainResult, ExpectedVersion, ItemId, Location};
use gymops_inventory::{
    Alert, AlertDecision, Direction, InventoryEvent, Movement, MovementType, StockEntry, StockKey,
    StockMoved, evaluate,
};

use crate::locks::KeyedLocks;
use crate::repository::{Scope, Stores};

/// What to do with an open alert once stock is back above its threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPolicy {
    pub auto_resolve: bool,
    /// Recorded as `resolved_by` on automatic resolutions.
    pub resolved_by: String,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            auto_resolve: true,
            resolved_by: "system".to_string(),
        }
    }
}

/// Result of a single-key ledger mutation.
#[derive(Debug, Clone)]
pub struct LedgerOutcome {
    pub entry: StockEntry,
    /// `None` when the mutation did not move stock (threshold change, empty assignment).
    pub movement: Option<Movement>,
    /// Alert opened or refreshed by this mutation, or still open and unchanged.
    pub alert: Option<Alert>,
    pub events: Vec<InventoryEvent>,
}

#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub movement: Movement,
    pub source: StockEntry,
    pub destination: StockEntry,
    /// Alerts open on either side after the transfer.
    pub alerts: Vec<Alert>,
    pub events: Vec<InventoryEvent>,
}

pub struct StockLedger {
    stores: Stores,
    locks: KeyedLocks<StockKey>,
    policy: AlertPolicy,
}

impl StockLedger {
    pub fn new(stores: Stores, policy: AlertPolicy) -> Self {
        Self {
            stores,
            locks: KeyedLocks::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    // ---- read side ----

    /// Every entry held at `location`, in assignment order.
    pub fn get_stock(&self, location: &Location) -> DomainResult<Vec<StockEntry>> {
        debug!(%location, "listing stock");
        let scope = Scope::new().field("location", location);
        Ok(self.stores.stock.list_scoped(&scope, &|e: &StockEntry| e.location() == location)?)
    }

    pub fn get_entry(&self, item_id: ItemId, location: &Location) -> DomainResult<StockEntry> {
        self.require_entry(&StockKey::new(item_id, location.clone()))
    }

    pub fn find_entry(&self, item_id: ItemId, location: &Location) -> DomainResult<Option<StockEntry>> {
        Ok(self.stores.stock.get(&StockKey::new(item_id, location.clone()))?)
    }

    /// Movements touching `location` and/or `item_id`, newest first.
    pub fn movement_history(
        &self,
        location: Option<&Location>,
        item_id: Option<ItemId>,
    ) -> DomainResult<Vec<Movement>> {
        let mut scope = Scope::new();
        if let Some(loc) = location {
            scope = scope.any_of(&["from_location", "to_location"], loc);
        }
        if let Some(id) = item_id {
            scope = scope.field("item_id", id);
        }
        let mut rows = self.stores.movements.list_scoped(&scope, &|m: &Movement| {
            location.is_none_or(|loc| m.touches(loc)) && item_id.is_none_or(|id| m.item_id == id)
        })?;
        rows.reverse();
        rows.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(rows)
    }

    /// Open alerts at `location`, most severe first, then newest first.
    pub fn open_alerts(&self, location: &Location) -> DomainResult<Vec<Alert>> {
        let scope = Scope::new().field("location", location).field("is_resolved", false);
        let mut alerts = self
            .stores
            .alerts
            .list_scoped(&scope, &|a: &Alert| a.is_open() && &a.location == location)?;
        alerts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(alerts)
    }

    pub fn alert(&self, alert_id: AlertId) -> DomainResult<Alert> {
        self.stores
            .alerts
            .get(&alert_id)?
            .ok_or_else(|| DomainError::alert_not_found(alert_id))
    }

    // ---- mutations ----

    /// First assignment of an item to a location. A non-zero `initial_stock`
    /// is booked as an inbound adjustment.
    #[allow(clippy::too_many_arguments)]
    pub fn assign_stock(
        &self,
        item_id: ItemId,
        location: Location,
        min_stock: i64,
        max_stock: Option<i64>,
        initial_stock: i64,
        performed_by: &str,
    ) -> DomainResult<LedgerOutcome> {
        self.require_item(item_id)?;
        if initial_stock < 0 {
            return Err(DomainError::validation("initial stock cannot be negative"));
        }

        let key = StockKey::new(item_id, location.clone());
        let set = self.locks.for_keys(std::slice::from_ref(&key))?;
        let _held = set.acquire()?;

        if self.stores.stock.get(&key)?.is_some() {
            return Err(DomainError::validation(format!("stock for {key} is already assigned")));
        }
        let opened = StockEntry::open(item_id, location.clone(), min_stock, max_stock)?;
        self.stores.stock.insert(opened.clone())?;
        info!(%key, min_stock, ?max_stock, "stock assigned");

        let mut events = Vec::new();
        if initial_stock == 0 {
            let alert = self.evaluate_locked(&opened, &mut events)?;
            return Ok(LedgerOutcome {
                entry: opened,
                movement: None,
                alert,
                events,
            });
        }

        let movement = Movement::record(
            item_id,
            location,
            initial_stock,
            MovementType::Adjustment,
            Direction::Inbound,
            "initial stock",
            performed_by,
            Utc::now(),
        )?;
        self.commit(opened, movement, events)
    }

    /// Apply one movement of `movement_type` to (item, location). Direction
    /// follows the type; transfers go through [`StockLedger::transfer`].
    pub fn apply_movement(
        &self,
        item_id: ItemId,
        location: &Location,
        quantity: i64,
        movement_type: MovementType,
        reason: &str,
        performed_by: &str,
    ) -> DomainResult<LedgerOutcome> {
        if movement_type == MovementType::Transfer {
            return Err(DomainError::validation("transfers need a source and a destination"));
        }
        self.record_single(
            item_id,
            location,
            quantity,
            movement_type,
            movement_type.natural_direction(),
            reason,
            performed_by,
        )
    }

    /// Signed correction: positive `delta` adds stock, negative removes it.
    pub fn adjust(
        &self,
        item_id: ItemId,
        location: &Location,
        delta: i64,
        reason: &str,
        performed_by: &str,
    ) -> DomainResult<LedgerOutcome> {
        let direction = match delta.signum() {
            1 => Direction::Inbound,
            -1 => Direction::Outbound,
            _ => return Err(DomainError::validation("adjustment delta cannot be zero")),
        };
        let quantity = delta
            .checked_abs()
            .ok_or_else(|| DomainError::validation("adjustment delta out of range"))?;
        self.record_single(
            item_id,
            location,
            quantity,
            MovementType::Adjustment,
            direction,
            reason,
            performed_by,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn record_single(
        &self,
        item_id: ItemId,
        location: &Location,
        quantity: i64,
        movement_type: MovementType,
        direction: Direction,
        reason: &str,
        performed_by: &str,
    ) -> DomainResult<LedgerOutcome> {
        let key = StockKey::new(item_id, location.clone());
        let set = self.locks.for_keys(std::slice::from_ref(&key))?;
        let _held = set.acquire()?;

        let entry = self.require_entry(&key)?;
        let movement = Movement::record(
            item_id,
            location.clone(),
            quantity,
            movement_type,
            direction,
            reason,
            performed_by,
            Utc::now(),
        )?;
        self.commit(entry, movement, Vec::new())
    }

    /// Move `quantity` from one location to another as a single movement.
    /// Both entries must exist; both are re-evaluated for alerts.
    pub fn transfer(
        &self,
        item_id: ItemId,
        from: &Location,
        to: &Location,
        quantity: i64,
        reason: &str,
        performed_by: &str,
    ) -> DomainResult<TransferOutcome> {
        let source_key = StockKey::new(item_id, from.clone());
        let destination_key = StockKey::new(item_id, to.clone());
        let set = self
            .locks
            .for_keys(&[source_key.clone(), destination_key.clone()])?;
        let _held = set.acquire()?;

        let source = self.require_entry(&source_key)?;
        let destination = self.require_entry(&destination_key)?;
        let movement = Movement::transfer(
            item_id,
            from.clone(),
            to.clone(),
            quantity,
            reason,
            performed_by,
            Utc::now(),
        )?;

        // Validate both sides before writing either.
        let source_next = source.apply(&movement)?;
        let destination_next = destination.apply(&movement)?;

        self.stores
            .stock
            .update(source_next.clone(), ExpectedVersion::Exact(source.version()))?;
        self.stores.stock.update(
            destination_next.clone(),
            ExpectedVersion::Exact(destination.version()),
        )?;
        self.stores.movements.insert(movement.clone())?;

        info!(
            item_id = %item_id,
            from = %from,
            to = %to,
            quantity,
            "stock transferred"
        );

        let mut events = vec![
            InventoryEvent::StockMoved(StockMoved {
                movement: movement.clone(),
                entry: source_next.clone(),
            }),
            InventoryEvent::StockMoved(StockMoved {
                movement: movement.clone(),
                entry: destination_next.clone(),
            }),
        ];
        let alerts = [
            self.evaluate_locked(&source_next, &mut events)?,
            self.evaluate_locked(&destination_next, &mut events)?,
        ]
        .into_iter()
        .flatten()
        .collect();

        Ok(TransferOutcome {
            movement,
            source: source_next,
            destination: destination_next,
            alerts,
            events,
        })
    }

    pub fn reserve(&self, item_id: ItemId, location: &Location, quantity: i64) -> DomainResult<StockEntry> {
        self.update_entry(item_id, location, |entry| entry.reserve(quantity))
    }

    pub fn release(&self, item_id: ItemId, location: &Location, quantity: i64) -> DomainResult<StockEntry> {
        self.update_entry(item_id, location, |entry| entry.release(quantity))
    }

    fn update_entry(
        &self,
        item_id: ItemId,
        location: &Location,
        change: impl FnOnce(&StockEntry) -> DomainResult<StockEntry>,
    ) -> DomainResult<StockEntry> {
        let key = StockKey::new(item_id, location.clone());
        let set = self.locks.for_keys(std::slice::from_ref(&key))?;
        let _held = set.acquire()?;

        let entry = self.require_entry(&key)?;
        let next = change(&entry)?;
        self.stores
            .stock
            .update(next.clone(), ExpectedVersion::Exact(entry.version()))?;
        debug!(%key, reserved = next.reserved_stock(), "reservation changed");
        Ok(next)
    }

    /// Change min/max and re-run alert evaluation under the same lock.
    pub fn set_thresholds(
        &self,
        item_id: ItemId,
        location: &Location,
        min_stock: i64,
        max_stock: Option<i64>,
    ) -> DomainResult<LedgerOutcome> {
        let key = StockKey::new(item_id, location.clone());
        let set = self.locks.for_keys(std::slice::from_ref(&key))?;
        let _held = set.acquire()?;

        let entry = self.require_entry(&key)?;
        let next = entry.with_thresholds(min_stock, max_stock)?;
        self.stores
            .stock
            .update(next.clone(), ExpectedVersion::Exact(entry.version()))?;
        info!(%key, min_stock, ?max_stock, "thresholds changed");

        let mut events = Vec::new();
        let alert = self.evaluate_locked(&next, &mut events)?;
        Ok(LedgerOutcome {
            entry: next,
            movement: None,
            alert,
            events,
        })
    }

    /// Close an open alert by hand.
    pub fn resolve_alert(&self, alert_id: AlertId, resolved_by: &str) -> DomainResult<Alert> {
        self.update_alert(alert_id, |alert| alert.resolve(resolved_by, Utc::now()))
            .inspect(|a| info!(alert_id = %a.id, resolved_by, "alert resolved"))
            .inspect_err(|e| warn!(alert_id = %alert_id, error = %e, "alert not resolved"))
    }

    pub fn mark_alert_read(&self, alert_id: AlertId) -> DomainResult<Alert> {
        self.update_alert(alert_id, |alert| Ok(alert.mark_read()))
    }

    // Alerts share the stock key's lock so they never race an evaluation.
    fn update_alert(
        &self,
        alert_id: AlertId,
        change: impl FnOnce(&Alert) -> DomainResult<Alert>,
    ) -> DomainResult<Alert> {
        let key = self.alert(alert_id)?.key();
        let set = self.locks.for_keys(std::slice::from_ref(&key))?;
        let _held = set.acquire()?;

        let current = self.alert(alert_id)?;
        let next = change(&current)?;
        self.stores
            .alerts
            .update(next.clone(), ExpectedVersion::Exact(current.version))?;
        Ok(next)
    }

    // ---- internals (caller holds the key lock) ----

    fn commit(
        &self,
        entry: StockEntry,
        movement: Movement,
        mut events: Vec<InventoryEvent>,
    ) -> DomainResult<LedgerOutcome> {
        let next = entry.apply(&movement).inspect_err(|e| {
            warn!(key = %entry.key(), movement_type = %movement.movement_type, error = %e, "movement rejected");
        })?;

        self.stores
            .stock
            .update(next.clone(), ExpectedVersion::Exact(entry.version()))?;
        self.stores.movements.insert(movement.clone())?;

        info!(
            key = %next.key(),
            movement_type = %movement.movement_type,
            quantity = movement.quantity,
            current_stock = next.current_stock(),
            "movement applied"
        );

        events.push(InventoryEvent::StockMoved(StockMoved {
            movement: movement.clone(),
            entry: next.clone(),
        }));
        let alert = self.evaluate_locked(&next, &mut events)?;

        Ok(LedgerOutcome {
            entry: next,
            movement: Some(movement),
            alert,
            events,
        })
    }

    fn evaluate_locked(
        &self,
        entry: &StockEntry,
        events: &mut Vec<InventoryEvent>,
    ) -> DomainResult<Option<Alert>> {
        let open = self.open_alert_for(&entry.key())?;
        let now = Utc::now();

        match evaluate(entry, open.as_ref(), now) {
            AlertDecision::Open(alert) => {
                self.stores.alerts.insert(alert.clone())?;
                info!(
                    alert_id = %alert.id,
                    key = %alert.key(),
                    alert_type = alert.alert_type.as_str(),
                    severity = %alert.severity,
                    "alert opened"
                );
                events.push(InventoryEvent::AlertOpened(alert.clone()));
                Ok(Some(alert))
            }
            AlertDecision::Refresh(alert) => {
                let expected = open.as_ref().map_or(0, |a| a.version);
                self.stores
                    .alerts
                    .update(alert.clone(), ExpectedVersion::Exact(expected))?;
                info!(alert_id = %alert.id, severity = %alert.severity, "alert refreshed");
                events.push(InventoryEvent::AlertRefreshed(alert.clone()));
                Ok(Some(alert))
            }
            AlertDecision::Unchanged(_) => Ok(open),
            AlertDecision::ResolveEligible(alert_id) => {
                let Some(current) = open else {
                    return Ok(None);
                };
                if !self.policy.auto_resolve {
                    debug!(%alert_id, "alert eligible for resolution, left open");
                    return Ok(None);
                }
                let resolved = current.resolve(self.policy.resolved_by.as_str(), now)?;
                self.stores
                    .alerts
                    .update(resolved.clone(), ExpectedVersion::Exact(current.version))?;
                info!(%alert_id, "alert auto-resolved");
                events.push(InventoryEvent::AlertResolved(resolved));
                Ok(None)
            }
            AlertDecision::Clear => Ok(None),
        }
    }

    fn open_alert_for(&self, key: &StockKey) -> DomainResult<Option<Alert>> {
        let scope = Scope::new()
            .field("item_id", key.item_id)
            .field("location", &key.location)
            .field("is_resolved", false);
        let mut open = self.stores.alerts.list_scoped(&scope, &|a: &Alert| {
            a.is_open() && a.item_id == key.item_id && a.location == key.location
        })?;
        if open.len() > 1 {
            warn!(%key, count = open.len(), "more than one open alert for key");
        }
        Ok(open.pop())
    }

    fn require_entry(&self, key: &StockKey) -> DomainResult<StockEntry> {
        self.stores
            .stock
            .get(key)?
            .ok_or_else(|| DomainError::no_stock_record(key.item_id, &key.location))
    }

    fn require_item(&self, item_id: ItemId) -> DomainResult<()> {
        match self.stores.items.get(&item_id)? {
            Some(_) => Ok(()),
            None => Err(DomainError::item_not_found(item_id)),
        }
    }
}
