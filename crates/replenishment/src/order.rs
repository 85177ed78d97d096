use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, ItemId, Location, Money, OrderId,
};
use gymops_events::Event;

/// Human-facing order number, unique and strictly increasing per process.
///
/// Rendered as `PED-AUTO-###` (zero-padded to at least three digits).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(u64);

impl OrderNumber {
    pub const PREFIX: &'static str = "PED-AUTO-";

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{:03}", Self::PREFIX, self.0)
    }
}

impl core::str::FromStr for OrderNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(Self::PREFIX)
            .and_then(|digits| digits.parse::<u64>().ok())
            .map(OrderNumber)
            .ok_or_else(|| DomainError::invalid_id(format!("OrderNumber: {s}")))
    }
}

/// Order status lifecycle.
///
/// ```text
/// pendiente → procesando → enviado → entregado
///     └──────────┴──→ cancelado
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "procesando")]
    Processing,
    #[serde(rename = "enviado")]
    Shipped,
    #[serde(rename = "entregado")]
    Delivered,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pendiente",
            OrderStatus::Processing => "procesando",
            OrderStatus::Shipped => "enviado",
            OrderStatus::Delivered => "entregado",
            OrderStatus::Cancelled => "cancelado",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "pagado")]
    Paid,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pendiente",
            PaymentStatus::Paid => "pagado",
        }
    }
}

/// Order line. `unit_price` is captured from the catalog when the order is
/// created and never re-read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl OrderLine {
    pub fn new(
        item_id: ItemId,
        item_name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(Self {
            item_id,
            item_name: item_name.into(),
            quantity,
            unit_price,
            line_total: unit_price.times(quantity)?,
        })
    }

    fn is_consistent(&self) -> bool {
        self.quantity > 0 && self.unit_price.times(self.quantity).ok() == Some(self.line_total)
    }
}

/// Aggregate root: InternalOrder (replenishment between two locations).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalOrder {
    id: OrderId,
    order_number: OrderNumber,
    from_location: Option<Location>,
    to_location: Option<Location>,
    status: OrderStatus,
    requested_by: String,
    requested_at: Option<DateTime<Utc>>,
    processed_by: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    received_by: Option<String>,
    cancelled_at: Option<DateTime<Utc>>,
    cancel_reason: Option<String>,
    lines: Vec<OrderLine>,
    total_amount: Money,
    payment_status: PaymentStatus,
    paid_at: Option<DateTime<Utc>>,
    notes: String,
    version: u64,
    created: bool,
}

impl InternalOrder {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            order_number: OrderNumber::new(0),
            from_location: None,
            to_location: None,
            status: OrderStatus::Pending,
            requested_by: String::new(),
            requested_at: None,
            processed_by: None,
            processed_at: None,
            shipped_at: None,
            delivered_at: None,
            received_by: None,
            cancelled_at: None,
            cancel_reason: None,
            lines: Vec::new(),
            total_amount: Money::ZERO,
            payment_status: PaymentStatus::Pending,
            paid_at: None,
            notes: String::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> OrderNumber {
        self.order_number
    }

    pub fn from_location(&self) -> Option<&Location> {
        self.from_location.as_ref()
    }

    pub fn to_location(&self) -> Option<&Location> {
        self.to_location.as_ref()
    }

    /// True if the order moves stock out of or into `location`.
    pub fn involves(&self, location: &Location) -> bool {
        self.from_location.as_ref() == Some(location) || self.to_location.as_ref() == Some(location)
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn requested_by(&self) -> &str {
        &self.requested_by
    }

    pub fn requested_at(&self) -> Option<DateTime<Utc>> {
        self.requested_at
    }

    pub fn processed_by(&self) -> Option<&str> {
        self.processed_by.as_deref()
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn received_by(&self) -> Option<&str> {
        self.received_by.as_deref()
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }
}

impl AggregateRoot for InternalOrder {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub from_location: Location,
    pub to_location: Location,
    pub lines: Vec<OrderLine>,
    pub requested_by: String,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ProcessOrder (`pendiente → procesando`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOrder {
    pub order_id: OrderId,
    pub processed_by: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ShipOrder (`procesando → enviado`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeliverOrder (`enviado → entregado`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverOrder {
    pub order_id: OrderId,
    pub received_by: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelOrder (from `pendiente` or `procesando`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordPayment (any status, terminal ones included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    Create(CreateOrder),
    Process(ProcessOrder),
    Ship(ShipOrder),
    Deliver(DeliverOrder),
    Cancel(CancelOrder),
    RecordPayment(RecordPayment),
}

impl OrderCommand {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderCommand::Create(c) => c.order_id,
            OrderCommand::Process(c) => c.order_id,
            OrderCommand::Ship(c) => c.order_id,
            OrderCommand::Deliver(c) => c.order_id,
            OrderCommand::Cancel(c) => c.order_id,
            OrderCommand::RecordPayment(c) => c.order_id,
        }
    }
}

/// Event: OrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub from_location: Location,
    pub to_location: Location,
    pub lines: Vec<OrderLine>,
    pub total_amount: Money,
    pub requested_by: String,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProcessing {
    pub order_id: OrderId,
    pub processed_by: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShipped {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDelivered {
    pub order_id: OrderId,
    pub received_by: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecorded {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderCreated(OrderCreated),
    OrderProcessing(OrderProcessing),
    OrderShipped(OrderShipped),
    OrderDelivered(OrderDelivered),
    OrderCancelled(OrderCancelled),
    PaymentRecorded(PaymentRecorded),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "replenishment.order.created",
            OrderEvent::OrderProcessing(_) => "replenishment.order.processing",
            OrderEvent::OrderShipped(_) => "replenishment.order.shipped",
            OrderEvent::OrderDelivered(_) => "replenishment.order.delivered",
            OrderEvent::OrderCancelled(_) => "replenishment.order.cancelled",
            OrderEvent::PaymentRecorded(_) => "replenishment.order.payment_recorded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated(e) => e.occurred_at,
            OrderEvent::OrderProcessing(e) => e.occurred_at,
            OrderEvent::OrderShipped(e) => e.occurred_at,
            OrderEvent::OrderDelivered(e) => e.occurred_at,
            OrderEvent::OrderCancelled(e) => e.occurred_at,
            OrderEvent::PaymentRecorded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InternalOrder {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderCreated(e) => {
                self.id = e.order_id;
                self.order_number = e.order_number;
                self.from_location = Some(e.from_location.clone());
                self.to_location = Some(e.to_location.clone());
                self.status = OrderStatus::Pending;
                self.requested_by = e.requested_by.clone();
                self.requested_at = Some(e.occurred_at);
                self.lines = e.lines.clone();
                self.total_amount = e.total_amount;
                self.payment_status = PaymentStatus::Pending;
                self.notes = e.notes.clone();
                self.created = true;
            }
            OrderEvent::OrderProcessing(e) => {
                self.status = OrderStatus::Processing;
                self.processed_by = Some(e.processed_by.clone());
                self.processed_at = Some(e.occurred_at);
            }
            OrderEvent::OrderShipped(e) => {
                self.status = OrderStatus::Shipped;
                self.shipped_at = Some(e.occurred_at);
            }
            OrderEvent::OrderDelivered(e) => {
                self.status = OrderStatus::Delivered;
                self.received_by = Some(e.received_by.clone());
                self.delivered_at = Some(e.occurred_at);
            }
            OrderEvent::OrderCancelled(e) => {
                self.status = OrderStatus::Cancelled;
                self.cancel_reason = Some(e.reason.clone());
                self.cancelled_at = Some(e.occurred_at);
            }
            OrderEvent::PaymentRecorded(e) => {
                self.payment_status = PaymentStatus::Paid;
                self.paid_at = Some(e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::Create(cmd) => self.handle_create(cmd),
            OrderCommand::Process(cmd) => self.handle_process(cmd),
            OrderCommand::Ship(cmd) => self.handle_ship(cmd),
            OrderCommand::Deliver(cmd) => self.handle_deliver(cmd),
            OrderCommand::Cancel(cmd) => self.handle_cancel(cmd),
            OrderCommand::RecordPayment(cmd) => self.handle_payment(cmd),
        }
    }
}

impl InternalOrder {
    fn ensure_exists(&self, order_id: OrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::order_not_found(order_id));
        }
        if self.id != order_id {
            return Err(DomainError::validation("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_status(&self, allowed: &[OrderStatus], action: &str) -> Result<(), DomainError> {
        if !allowed.contains(&self.status) {
            return Err(DomainError::invalid_transition(self.status, action));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        if cmd.lines.is_empty() {
            return Err(DomainError::validation("order needs at least one line"));
        }
        if cmd.from_location == cmd.to_location {
            return Err(DomainError::validation(
                "source and destination locations must differ",
            ));
        }
        if let Some(bad) = cmd.lines.iter().find(|l| !l.is_consistent()) {
            return Err(DomainError::validation(format!(
                "line for item {} does not match quantity × unit price",
                bad.item_id
            )));
        }

        let total_amount = Money::checked_sum(cmd.lines.iter().map(|l| l.line_total))?;

        Ok(vec![OrderEvent::OrderCreated(OrderCreated {
            order_id: cmd.order_id,
            order_number: cmd.order_number,
            from_location: cmd.from_location.clone(),
            to_location: cmd.to_location.clone(),
            lines: cmd.lines.clone(),
            total_amount,
            requested_by: cmd.requested_by.clone(),
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_process(&self, cmd: &ProcessOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_exists(cmd.order_id)?;
        self.ensure_status(&[OrderStatus::Pending], "process")?;

        Ok(vec![OrderEvent::OrderProcessing(OrderProcessing {
            order_id: cmd.order_id,
            processed_by: cmd.processed_by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_ship(&self, cmd: &ShipOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_exists(cmd.order_id)?;
        self.ensure_status(&[OrderStatus::Processing], "ship")?;

        Ok(vec![OrderEvent::OrderShipped(OrderShipped {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_deliver(&self, cmd: &DeliverOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_exists(cmd.order_id)?;
        self.ensure_status(&[OrderStatus::Shipped], "deliver")?;

        Ok(vec![OrderEvent::OrderDelivered(OrderDelivered {
            order_id: cmd.order_id,
            received_by: cmd.received_by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_exists(cmd.order_id)?;
        self.ensure_status(&[OrderStatus::Pending, OrderStatus::Processing], "cancel")?;

        Ok(vec![OrderEvent::OrderCancelled(OrderCancelled {
            order_id: cmd.order_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_payment(&self, cmd: &RecordPayment) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_exists(cmd.order_id)?;
        if self.payment_status == PaymentStatus::Paid {
            return Err(DomainError::invalid_transition(
                PaymentStatus::Paid.as_str(),
                "record payment",
            ));
        }

        Ok(vec![OrderEvent::PaymentRecorded(PaymentRecorded {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymops_events::execute;

    fn loc(s: &str) -> Location {
        Location::new(s).unwrap()
    }

    fn camiseta_line(quantity: i64) -> OrderLine {
        OrderLine::new(ItemId::new(), "Camiseta M", quantity, Money::from_cents(1500)).unwrap()
    }

    fn created_order(number: u64) -> InternalOrder {
        let order_id = OrderId::new();
        let mut order = InternalOrder::empty(order_id);
        let cmd = OrderCommand::Create(CreateOrder {
            order_id,
            order_number: OrderNumber::new(number),
            from_location: loc("almacen_central"),
            to_location: loc("centro_sevilla"),
            lines: vec![camiseta_line(10)],
            requested_by: "Ana García".to_string(),
            notes: "Stock bajo".to_string(),
            occurred_at: Utc::now(),
        });
        execute(&mut order, &cmd).unwrap();
        order
    }

    fn process(order: &mut InternalOrder, by: &str) -> Result<Vec<OrderEvent>, DomainError> {
        let cmd = OrderCommand::Process(ProcessOrder {
            order_id: order.id_typed(),
            processed_by: by.to_string(),
            occurred_at: Utc::now(),
        });
        execute(order, &cmd)
    }

    fn ship(order: &mut InternalOrder) -> Result<Vec<OrderEvent>, DomainError> {
        let cmd = OrderCommand::Ship(ShipOrder {
            order_id: order.id_typed(),
            occurred_at: Utc::now(),
        });
        execute(order, &cmd)
    }

    #[test]
    fn order_number_format() {
        assert_eq!(OrderNumber::new(1).to_string(), "PED-AUTO-001");
        assert_eq!(OrderNumber::new(1234).to_string(), "PED-AUTO-1234");
        assert_eq!("PED-AUTO-042".parse::<OrderNumber>().unwrap(), OrderNumber::new(42));
        assert!("PED-042".parse::<OrderNumber>().is_err());
    }

    #[test]
    fn create_computes_totals_and_starts_pending() {
        let order = created_order(1);

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert_eq!(order.total_amount(), Money::from_cents(15000));
        assert_eq!(order.lines()[0].line_total, Money::from_cents(15000));
        assert_eq!(order.order_number().to_string(), "PED-AUTO-001");
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn create_rejects_inconsistent_line() {
        let order_id = OrderId::new();
        let order = InternalOrder::empty(order_id);
        let mut line = camiseta_line(2);
        line.line_total = Money::from_cents(1);

        let err = order
            .handle(&OrderCommand::Create(CreateOrder {
                order_id,
                order_number: OrderNumber::new(1),
                from_location: loc("almacen_central"),
                to_location: loc("centro_sevilla"),
                lines: vec![line],
                requested_by: "Admin".to_string(),
                notes: String::new(),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn process_is_accepted_once() {
        let mut order = created_order(1);

        process(&mut order, "Admin").unwrap();
        assert_eq!(order.status(), OrderStatus::Processing);
        assert_eq!(order.processed_by(), Some("Admin"));

        let before = order.clone();
        let err = process(&mut order, "Otro").unwrap_err();
        assert_eq!(err, DomainError::invalid_transition("procesando", "process"));
        assert_eq!(order, before);
    }

    #[test]
    fn ship_requires_processing() {
        let mut order = created_order(1);
        assert!(matches!(ship(&mut order), Err(DomainError::InvalidTransition { .. })));

        process(&mut order, "Admin").unwrap();
        ship(&mut order).unwrap();
        assert_eq!(order.status(), OrderStatus::Shipped);
    }

    #[test]
    fn full_lifecycle_and_cancel_guard() {
        let mut order = created_order(1);
        process(&mut order, "Admin").unwrap();
        ship(&mut order).unwrap();

        let cancel = OrderCommand::Cancel(CancelOrder {
            order_id: order.id_typed(),
            reason: "ya no hace falta".to_string(),
            occurred_at: Utc::now(),
        });
        assert!(matches!(
            execute(&mut order, &cancel),
            Err(DomainError::InvalidTransition { .. })
        ));

        let deliver = OrderCommand::Deliver(DeliverOrder {
            order_id: order.id_typed(),
            received_by: "Recepción Sevilla".to_string(),
            occurred_at: Utc::now(),
        });
        execute(&mut order, &deliver).unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert!(order.status().is_terminal());
        assert_eq!(order.received_by(), Some("Recepción Sevilla"));

        // Terminal orders still accept payment, once.
        let pay = OrderCommand::RecordPayment(RecordPayment {
            order_id: order.id_typed(),
            occurred_at: Utc::now(),
        });
        execute(&mut order, &pay).unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert!(execute(&mut order, &pay).is_err());
    }

    #[test]
    fn cancel_from_pending() {
        let mut order = created_order(1);
        let cancel = OrderCommand::Cancel(CancelOrder {
            order_id: order.id_typed(),
            reason: "duplicado".to_string(),
            occurred_at: Utc::now(),
        });
        execute(&mut order, &cancel).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.cancel_reason(), Some("duplicado"));
        assert!(process(&mut order, "Admin").is_err());
    }

    #[test]
    fn commands_on_missing_order_are_not_found() {
        let mut order = InternalOrder::empty(OrderId::new());
        let err = process(&mut order, "Admin").unwrap_err();
        assert!(matches!(err, DomainError::OrderNotFound(_)));
    }
}
