use serde::{Deserialize, Serialize};

use gymops_core::{DomainResult, Money};

use crate::order::{InternalOrder, OrderStatus};

/// Aggregate view over every order known to the engine.
///
/// The status counts partition `total_orders`. `total_value` sums
/// `total_amount` across all orders whatever their status, cancelled included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub processing_orders: u64,
    pub shipped_orders: u64,
    /// Orders in `entregado`.
    pub completed_orders: u64,
    pub cancelled_orders: u64,
    pub total_value: Money,
}

impl OrderStats {
    /// Fails with `Validation` if the summed value overflows.
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a InternalOrder>) -> DomainResult<Self> {
        let mut stats = OrderStats::default();
        for order in orders {
            stats.total_orders += 1;
            stats.total_value = stats.total_value.checked_add(order.total_amount())?;
            match order.status() {
                OrderStatus::Pending => stats.pending_orders += 1,
                OrderStatus::Processing => stats.processing_orders += 1,
                OrderStatus::Shipped => stats.shipped_orders += 1,
                OrderStatus::Delivered => stats.completed_orders += 1,
                OrderStatus::Cancelled => stats.cancelled_orders += 1,
            }
        }
        Ok(stats)
    }
}
