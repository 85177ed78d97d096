use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{ItemId, Location, Money, OrderId};
use gymops_infra::{ConsumptionReport, LedgerOutcome, TransferOutcome};
use gymops_inventory::{Alert, Movement, MovementType, StockEntry};
use gymops_replenishment::{InternalOrder, OrderLine, OrderStatus, PaymentStatus};

// ---- requests ----

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct RepriceItemRequest {
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct AssignStockRequest {
    pub item_id: String,
    pub location: String,
    pub min_stock: i64,
    pub max_stock: Option<i64>,
    #[serde(default)]
    pub initial_stock: i64,
    pub performed_by: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordMovementRequest {
    pub item_id: String,
    pub location: String,
    pub quantity: i64,
    pub movement_type: MovementType,
    #[serde(default)]
    pub reason: String,
    pub performed_by: String,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub item_id: String,
    pub location: String,
    /// Signed; negative removes stock.
    pub delta: i64,
    #[serde(default)]
    pub reason: String,
    pub performed_by: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferStockRequest {
    pub item_id: String,
    pub from_location: String,
    pub to_location: String,
    pub quantity: i64,
    #[serde(default)]
    pub reason: String,
    pub performed_by: String,
}

#[derive(Debug, Deserialize)]
pub struct ReservationRequest {
    pub item_id: String,
    pub location: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ThresholdsRequest {
    pub item_id: String,
    pub location: String,
    pub min_stock: i64,
    pub max_stock: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ConsumptionRequest {
    pub item_name: String,
    pub quantity: i64,
    pub location: String,
    #[serde(default)]
    pub reason: String,
    pub reported_by: String,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub requested_by: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveAlertRequest {
    pub resolved_by: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub item_id: String,
    pub from_location: String,
    pub to_location: String,
    pub quantity: i64,
    pub requested_by: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessOrderRequest {
    pub processed_by: String,
}

#[derive(Debug, Deserialize)]
pub struct DeliverOrderRequest {
    pub received_by: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovementQuery {
    pub location: Option<String>,
    pub item_id: Option<String>,
}

// ---- responses ----

/// A stock entry with its derived `available_stock`.
#[derive(Debug, Serialize)]
pub struct StockEntryView {
    pub item_id: ItemId,
    pub location: Location,
    pub current_stock: i64,
    pub reserved_stock: i64,
    pub available_stock: i64,
    pub min_stock: i64,
    pub max_stock: Option<i64>,
    pub last_movement_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl From<&StockEntry> for StockEntryView {
    fn from(entry: &StockEntry) -> Self {
        Self {
            item_id: entry.item_id(),
            location: entry.location().clone(),
            current_stock: entry.current_stock(),
            reserved_stock: entry.reserved_stock(),
            available_stock: entry.available_stock(),
            min_stock: entry.min_stock(),
            max_stock: entry.max_stock(),
            last_movement_at: entry.last_movement_at(),
            version: entry.version(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub entry: StockEntryView,
    pub movement: Option<Movement>,
    pub alert: Option<Alert>,
}

impl From<LedgerOutcome> for LedgerResponse {
    fn from(outcome: LedgerOutcome) -> Self {
        Self {
            entry: StockEntryView::from(&outcome.entry),
            movement: outcome.movement,
            alert: outcome.alert,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub movement: Movement,
    pub source: StockEntryView,
    pub destination: StockEntryView,
    pub alerts: Vec<Alert>,
}

impl From<TransferOutcome> for TransferResponse {
    fn from(outcome: TransferOutcome) -> Self {
        Self {
            source: StockEntryView::from(&outcome.source),
            destination: StockEntryView::from(&outcome.destination),
            movement: outcome.movement,
            alerts: outcome.alerts,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConsumptionResponse {
    pub entry: StockEntryView,
    pub alert: Option<Alert>,
}

impl From<ConsumptionReport> for ConsumptionResponse {
    fn from(report: ConsumptionReport) -> Self {
        Self {
            entry: StockEntryView::from(&report.entry),
            alert: report.alert,
        }
    }
}

/// Order as shown to clients: formatted number, flattened lifecycle fields.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub order_number: String,
    pub from_location: Option<Location>,
    pub to_location: Option<Location>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub lines: Vec<OrderLine>,
    pub total_amount: Money,
    pub requested_by: String,
    pub requested_at: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub received_by: Option<String>,
    pub cancel_reason: Option<String>,
    pub notes: String,
}

impl From<&InternalOrder> for OrderView {
    fn from(order: &InternalOrder) -> Self {
        Self {
            id: order.id_typed(),
            order_number: order.order_number().to_string(),
            from_location: order.from_location().cloned(),
            to_location: order.to_location().cloned(),
            status: order.status(),
            payment_status: order.payment_status(),
            lines: order.lines().to_vec(),
            total_amount: order.total_amount(),
            requested_by: order.requested_by().to_string(),
            requested_at: order.requested_at(),
            processed_by: order.processed_by().map(str::to_string),
            processed_at: order.processed_at(),
            shipped_at: order.shipped_at(),
            delivered_at: order.delivered_at(),
            received_by: order.received_by().map(str::to_string),
            cancel_reason: order.cancel_reason().map(str::to_string),
            notes: order.notes().to_string(),
        }
    }
}

pub fn order_views(orders: &[InternalOrder]) -> Vec<OrderView> {
    orders.iter().map(OrderView::from).collect()
}

pub fn stock_views(entries: &[StockEntry]) -> Vec<StockEntryView> {
    entries.iter().map(StockEntryView::from).collect()
}
