use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{DomainError, DomainResult, ItemId, Location, MovementId};

/// Ledger key: one item at one location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    pub item_id: ItemId,
    pub location: Location,
}

impl StockKey {
    pub fn new(item_id: ItemId, location: Location) -> Self {
        Self { item_id, location }
    }
}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.item_id, self.location)
    }
}

/// Per-(item, location) quantity state.
///
/// Fields are private: the only way to change `current_stock` is `apply`, which
/// takes a `Movement`. `available_stock` is always derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    item_id: ItemId,
    location: Location,
    current_stock: i64,
    min_stock: i64,
    max_stock: Option<i64>,
    reserved_stock: i64,
    last_movement_at: Option<DateTime<Utc>>,
    version: u64,
}

impl StockEntry {
    /// First assignment of an item to a location, with zero stock.
    pub fn open(
        item_id: ItemId,
        location: Location,
        min_stock: i64,
        max_stock: Option<i64>,
    ) -> DomainResult<Self> {
        validate_thresholds(min_stock, max_stock)?;
        Ok(Self {
            item_id,
            location,
            current_stock: 0,
            min_stock,
            max_stock,
            reserved_stock: 0,
            last_movement_at: None,
            version: 1,
        })
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.item_id, self.location.clone())
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn current_stock(&self) -> i64 {
        self.current_stock
    }

    pub fn min_stock(&self) -> i64 {
        self.min_stock
    }

    pub fn max_stock(&self) -> Option<i64> {
        self.max_stock
    }

    pub fn reserved_stock(&self) -> i64 {
        self.reserved_stock
    }

    /// `current_stock - reserved_stock`; never negative because every mutation
    /// keeps `reserved_stock <= current_stock`.
    pub fn available_stock(&self) -> i64 {
        self.current_stock - self.reserved_stock
    }

    pub fn last_movement_at(&self) -> Option<DateTime<Utc>> {
        self.last_movement_at
    }

    /// Bumped by one on every change; checked by the repository on update.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply a movement and return the resulting entry. `self` is untouched on
    /// error, so a rejected movement leaves no trace.
    pub fn apply(&self, movement: &Movement) -> DomainResult<StockEntry> {
        if movement.item_id != self.item_id {
            return Err(DomainError::validation(format!(
                "movement for item {} applied to entry {}",
                movement.item_id,
                self.key()
            )));
        }

        let delta = movement.delta_at(&self.location);
        if delta == 0 {
            return Err(DomainError::validation(format!(
                "movement does not touch location {}",
                self.location
            )));
        }

        if delta < 0 && -delta > self.available_stock() {
            return Err(DomainError::insufficient_stock(self.available_stock(), -delta));
        }

        let current_stock = self
            .current_stock
            .checked_add(delta)
            .ok_or_else(|| DomainError::validation("stock overflow"))?;

        Ok(Self {
            current_stock,
            last_movement_at: Some(movement.occurred_at),
            version: self.version + 1,
            ..self.clone()
        })
    }

    /// Hold `quantity` units back from `available_stock`.
    pub fn reserve(&self, quantity: i64) -> DomainResult<StockEntry> {
        ensure_positive(quantity)?;
        if quantity > self.available_stock() {
            return Err(DomainError::insufficient_stock(self.available_stock(), quantity));
        }
        let reserved_stock = self
            .reserved_stock
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("reservation overflow"))?;
        Ok(Self {
            reserved_stock,
            version: self.version + 1,
            ..self.clone()
        })
    }

    pub fn release(&self, quantity: i64) -> DomainResult<StockEntry> {
        ensure_positive(quantity)?;
        if quantity > self.reserved_stock {
            return Err(DomainError::validation(format!(
                "cannot release {quantity}, only {} reserved",
                self.reserved_stock
            )));
        }
        Ok(Self {
            reserved_stock: self.reserved_stock - quantity,
            version: self.version + 1,
            ..self.clone()
        })
    }

    pub fn with_thresholds(&self, min_stock: i64, max_stock: Option<i64>) -> DomainResult<StockEntry> {
        validate_thresholds(min_stock, max_stock)?;
        Ok(Self {
            min_stock,
            max_stock,
            version: self.version + 1,
            ..self.clone()
        })
    }
}

fn validate_thresholds(min_stock: i64, max_stock: Option<i64>) -> DomainResult<()> {
    if min_stock < 0 {
        return Err(DomainError::validation("min_stock cannot be negative"));
    }
    if let Some(max) = max_stock {
        if max < min_stock {
            return Err(DomainError::validation("max_stock cannot be below min_stock"));
        }
    }
    Ok(())
}

fn ensure_positive(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovementType {
    InboundPurchase,
    OutboundSale,
    Transfer,
    Adjustment,
    Shrinkage,
    Return,
}

impl MovementType {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementType::InboundPurchase => "inbound-purchase",
            MovementType::OutboundSale => "outbound-sale",
            MovementType::Transfer => "transfer",
            MovementType::Adjustment => "adjustment",
            MovementType::Shrinkage => "shrinkage",
            MovementType::Return => "return",
        }
    }

    /// Direction a movement of this type takes relative to the location it is
    /// applied to. Adjustments can go either way; this is their default.
    pub fn natural_direction(self) -> Direction {
        match self {
            MovementType::InboundPurchase | MovementType::Return | MovementType::Adjustment => {
                Direction::Inbound
            }
            MovementType::OutboundSale | MovementType::Shrinkage | MovementType::Transfer => {
                Direction::Outbound
            }
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Append-only ledger row. Never edited; corrections are new movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub item_id: ItemId,
    pub from_location: Option<Location>,
    pub to_location: Option<Location>,
    pub movement_type: MovementType,
    /// Always > 0; direction is carried by from/to.
    pub quantity: i64,
    pub reason: String,
    pub performed_by: String,
    pub occurred_at: DateTime<Utc>,
}

impl Movement {
    /// Movement into or out of a single location.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        item_id: ItemId,
        location: Location,
        quantity: i64,
        movement_type: MovementType,
        direction: Direction,
        reason: impl Into<String>,
        performed_by: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        ensure_positive(quantity)?;
        let (from_location, to_location) = match direction {
            Direction::Inbound => (None, Some(location)),
            Direction::Outbound => (Some(location), None),
        };
        Ok(Self {
            id: MovementId::new(),
            item_id,
            from_location,
            to_location,
            movement_type,
            quantity,
            reason: reason.into(),
            performed_by: performed_by.into(),
            occurred_at,
        })
    }

    /// Location-to-location transfer; one row debits `from` and credits `to`.
    pub fn transfer(
        item_id: ItemId,
        from: Location,
        to: Location,
        quantity: i64,
        reason: impl Into<String>,
        performed_by: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        ensure_positive(quantity)?;
        if from == to {
            return Err(DomainError::validation("transfer source and destination must differ"));
        }
        Ok(Self {
            id: MovementId::new(),
            item_id,
            from_location: Some(from),
            to_location: Some(to),
            movement_type: MovementType::Transfer,
            quantity,
            reason: reason.into(),
            performed_by: performed_by.into(),
            occurred_at,
        })
    }

    /// Signed stock change this movement causes at `location`.
    pub fn delta_at(&self, location: &Location) -> i64 {
        let mut delta = 0;
        if self.to_location.as_ref() == Some(location) {
            delta += self.quantity;
        }
        if self.from_location.as_ref() == Some(location) {
            delta -= self.quantity;
        }
        delta
    }

    pub fn touches(&self, location: &Location) -> bool {
        self.from_location.as_ref() == Some(location) || self.to_location.as_ref() == Some(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn loc(s: &str) -> Location {
        Location::new(s).unwrap()
    }

    fn entry_with(stock: i64, min: i64) -> StockEntry {
        let item = ItemId::new();
        let entry = StockEntry::open(item, loc("centro_sevilla"), min, None).unwrap();
        if stock == 0 {
            return entry;
        }
        let m = inbound(item, stock);
        entry.apply(&m).unwrap()
    }

    fn inbound(item: ItemId, qty: i64) -> Movement {
        Movement::record(
            item,
            loc("centro_sevilla"),
            qty,
            MovementType::InboundPurchase,
            Direction::Inbound,
            "compra",
            "Ana García",
            Utc::now(),
        )
        .unwrap()
    }

    fn outbound(item: ItemId, qty: i64) -> Movement {
        Movement::record(
            item,
            loc("centro_sevilla"),
            qty,
            MovementType::Shrinkage,
            Direction::Outbound,
            "correa rota",
            "Ana García",
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn outbound_beyond_available_is_rejected_without_change() {
        let entry = entry_with(3, 1);
        let before = entry.clone();

        let err = entry.apply(&outbound(entry.item_id(), 5)).unwrap_err();

        assert_eq!(err, DomainError::insufficient_stock(3, 5));
        assert_eq!(entry, before);
    }

    #[test]
    fn apply_updates_stock_timestamp_and_version() {
        let entry = entry_with(10, 2);
        let m = outbound(entry.item_id(), 4);

        let next = entry.apply(&m).unwrap();

        assert_eq!(next.current_stock(), 6);
        assert_eq!(next.available_stock(), 6);
        assert_eq!(next.last_movement_at(), Some(m.occurred_at));
        assert_eq!(next.version(), entry.version() + 1);
    }

    #[test]
    fn inbound_past_i64_max_is_rejected_without_change() {
        let entry = entry_with(5, 1);
        let before = entry.clone();

        let err = entry.apply(&inbound(entry.item_id(), i64::MAX)).unwrap_err();

        assert!(matches!(err, DomainError::Validation(msg) if msg == "stock overflow"));
        assert_eq!(entry, before);
        assert_eq!(entry.apply(&inbound(entry.item_id(), i64::MAX - 5)).unwrap().current_stock(), i64::MAX);
    }

    #[test]
    fn reserved_units_are_not_available_for_outbound() {
        let entry = entry_with(10, 2).reserve(7).unwrap();
        assert_eq!(entry.available_stock(), 3);

        let err = entry.apply(&outbound(entry.item_id(), 4)).unwrap_err();
        assert_eq!(err, DomainError::insufficient_stock(3, 4));

        let released = entry.release(7).unwrap();
        assert_eq!(released.available_stock(), 10);
        assert!(released.release(1).is_err());
    }

    #[test]
    fn movement_rejects_non_positive_quantity() {
        let err = Movement::record(
            ItemId::new(),
            loc("centro_sevilla"),
            0,
            MovementType::Shrinkage,
            Direction::Outbound,
            "",
            "",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn transfer_debits_source_and_credits_destination() {
        let item = ItemId::new();
        let m = Movement::transfer(
            item,
            loc("almacen_central"),
            loc("centro_sevilla"),
            4,
            "reposición",
            "Logística",
            Utc::now(),
        )
        .unwrap();

        assert_eq!(m.delta_at(&loc("almacen_central")), -4);
        assert_eq!(m.delta_at(&loc("centro_sevilla")), 4);
        assert_eq!(m.delta_at(&loc("centro_malaga")), 0);
        assert!(Movement::transfer(item, loc("a"), loc("a"), 1, "", "", Utc::now()).is_err());
    }

    #[test]
    fn movement_for_another_location_is_rejected() {
        let entry = entry_with(5, 1);
        let elsewhere = Movement::record(
            entry.item_id(),
            loc("centro_malaga"),
            1,
            MovementType::Return,
            Direction::Inbound,
            "devolución",
            "Admin",
            Utc::now(),
        )
        .unwrap();
        assert!(matches!(entry.apply(&elsewhere), Err(DomainError::Validation(_))));
    }

    #[test]
    fn thresholds_are_validated() {
        let item = ItemId::new();
        assert!(StockEntry::open(item, loc("x"), -1, None).is_err());
        assert!(StockEntry::open(item, loc("x"), 5, Some(4)).is_err());
        assert!(StockEntry::open(item, loc("x"), 5, Some(5)).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever sequence of movements and reservations is
        /// attempted, current and available stock stay non-negative and
        /// available == current - reserved.
        #[test]
        fn stock_never_goes_negative(ops in prop::collection::vec((0u8..4, 1i64..20), 1..60)) {
            let item = ItemId::new();
            let mut entry = StockEntry::open(item, loc("centro_sevilla"), 3, None).unwrap();

            for (op, qty) in ops {
                let next = match op {
                    0 => entry.apply(&inbound(item, qty)),
                    1 => entry.apply(&outbound(item, qty)),
                    2 => entry.reserve(qty),
                    _ => entry.release(qty),
                };
                match next {
                    Ok(e) => entry = e,
                    Err(_) => {}
                }

                prop_assert!(entry.current_stock() >= 0);
                prop_assert!(entry.reserved_stock() >= 0);
                prop_assert!(entry.available_stock() >= 0);
                prop_assert_eq!(
                    entry.available_stock(),
                    entry.current_stock() - entry.reserved_stock()
                );
            }
        }
    }
}
