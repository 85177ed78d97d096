use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gymops_events::Event;

use crate::alert::Alert;
use crate::stock::{Movement, StockEntry};

/// Event: StockMoved. Carries the movement and the entry it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMoved {
    pub movement: Movement,
    pub entry: StockEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    StockMoved(StockMoved),
    AlertOpened(Alert),
    AlertRefreshed(Alert),
    AlertResolved(Alert),
}

impl InventoryEvent {
    /// The alert carried by this event, if it is an alert event.
    pub fn alert(&self) -> Option<&Alert> {
        match self {
            InventoryEvent::AlertOpened(a)
            | InventoryEvent::AlertRefreshed(a)
            | InventoryEvent::AlertResolved(a) => Some(a),
            InventoryEvent::StockMoved(_) => None,
        }
    }
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::StockMoved(_) => "inventory.stock.moved",
            InventoryEvent::AlertOpened(_) => "inventory.alert.opened",
            InventoryEvent::AlertRefreshed(_) => "inventory.alert.refreshed",
            InventoryEvent::AlertResolved(_) => "inventory.alert.resolved",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::StockMoved(e) => e.movement.occurred_at,
            InventoryEvent::AlertOpened(a) => a.created_at,
            InventoryEvent::AlertRefreshed(a) => a.updated_at,
            InventoryEvent::AlertResolved(a) => a.resolved_at.unwrap_or(a.updated_at),
        }
    }
}
