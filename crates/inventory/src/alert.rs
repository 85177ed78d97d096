//! Alert engine: threshold classification and alert lifecycle.
//!
//! `evaluate` is a pure function of a stock entry snapshot and the currently
//! open alert for the same (item, location). It never deletes alerts; when the
//! condition clears it only reports that the open alert may be resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{AggregateRoot, AlertId, DomainError, DomainResult, ItemId, Location};

use crate::stock::{StockEntry, StockKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertType {
    LowStock,
    OutOfStock,
    Overstock,
}

impl AlertType {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertType::LowStock => "low-stock",
            AlertType::OutOfStock => "out-of-stock",
            AlertType::Overstock => "overstock",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl core::fmt::Display for Severity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock alert for one (item, location).
///
/// `current_stock` and `min_stock` are the snapshot taken when the alert was
/// opened and never change. Re-evaluation while open refreshes type, severity,
/// message and `last_observed_stock` in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub item_id: ItemId,
    pub location: Location,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub current_stock: i64,
    pub min_stock: i64,
    pub last_observed_stock: i64,
    pub message: String,
    pub is_read: bool,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub version: u64,
}

impl Alert {
    pub fn key(&self) -> StockKey {
        StockKey::new(self.item_id, self.location.clone())
    }

    pub fn is_open(&self) -> bool {
        !self.is_resolved
    }

    /// Close the alert. Only the resolution fields change.
    pub fn resolve(&self, resolved_by: impl Into<String>, at: DateTime<Utc>) -> DomainResult<Alert> {
        if self.is_resolved {
            return Err(DomainError::invalid_transition("resolved", "resolve alert"));
        }
        Ok(Self {
            is_resolved: true,
            resolved_at: Some(at),
            resolved_by: Some(resolved_by.into()),
            version: self.version + 1,
            ..self.clone()
        })
    }

    pub fn mark_read(&self) -> Alert {
        Self {
            is_read: true,
            version: self.version + 1,
            ..self.clone()
        }
    }

    fn refreshed(&self, condition: Condition, entry: &StockEntry, at: DateTime<Utc>) -> Alert {
        Self {
            alert_type: condition.alert_type,
            severity: condition.severity,
            last_observed_stock: entry.current_stock(),
            message: condition.message(entry),
            updated_at: at,
            version: self.version + 1,
            ..self.clone()
        }
    }
}

impl AggregateRoot for Alert {
    type Id = AlertId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Outcome of evaluating one stock entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertDecision {
    /// No alert was open; a new one must be stored.
    Open(Alert),
    /// The open alert must be replaced by this refreshed copy.
    Refresh(Alert),
    /// The open alert already reflects the entry.
    Unchanged(AlertId),
    /// Stock is back inside thresholds; the open alert may be resolved.
    ResolveEligible(AlertId),
    /// Inside thresholds and nothing open.
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Condition {
    alert_type: AlertType,
    severity: Severity,
    /// The bound that was crossed: `min_stock`, or `max_stock` for overstock.
    threshold: i64,
}

impl Condition {
    fn message(self, entry: &StockEntry) -> String {
        match self.alert_type {
            AlertType::OutOfStock => format!(
                "Out of stock at {} (minimum {})",
                entry.location(),
                self.threshold
            ),
            AlertType::LowStock => format!(
                "Low stock at {}: {} left (minimum {})",
                entry.location(),
                entry.current_stock(),
                self.threshold
            ),
            AlertType::Overstock => format!(
                "Overstock at {}: {} on hand (maximum {})",
                entry.location(),
                entry.current_stock(),
                self.threshold
            ),
        }
    }
}

/// Map a stock level to the alert condition it is in, if any.
///
/// - `current == 0` → out-of-stock / critical
/// - `current <= min / 2` (integer floor) → low-stock / high
/// - `current <= min` → low-stock / medium
/// - `current > max` (when a max is set) → overstock / low
fn classify(entry: &StockEntry) -> Option<Condition> {
    let current = entry.current_stock();
    let min = entry.min_stock();

    if current <= min {
        let (alert_type, severity) = if current == 0 {
            (AlertType::OutOfStock, Severity::Critical)
        } else if current <= min / 2 {
            (AlertType::LowStock, Severity::High)
        } else {
            (AlertType::LowStock, Severity::Medium)
        };
        return Some(Condition {
            alert_type,
            severity,
            threshold: min,
        });
    }

    match entry.max_stock() {
        Some(max) if current > max => Some(Condition {
            alert_type: AlertType::Overstock,
            severity: Severity::Low,
            threshold: max,
        }),
        _ => None,
    }
}

/// Evaluate `entry` against the open alert for the same key (if any).
pub fn evaluate(entry: &StockEntry, open: Option<&Alert>, at: DateTime<Utc>) -> AlertDecision {
    let open = open.filter(|a| a.is_open());

    match (classify(entry), open) {
        (Some(condition), None) => AlertDecision::Open(Alert {
            id: AlertId::new(),
            item_id: entry.item_id(),
            location: entry.location().clone(),
            alert_type: condition.alert_type,
            severity: condition.severity,
            current_stock: entry.current_stock(),
            min_stock: entry.min_stock(),
            last_observed_stock: entry.current_stock(),
            message: condition.message(entry),
            is_read: false,
            is_resolved: false,
            created_at: at,
            updated_at: at,
            resolved_at: None,
            resolved_by: None,
            version: 1,
        }),
        (Some(condition), Some(alert)) => {
            let unchanged = alert.alert_type == condition.alert_type
                && alert.severity == condition.severity
                && alert.last_observed_stock == entry.current_stock();
            if unchanged {
                AlertDecision::Unchanged(alert.id)
            } else {
                AlertDecision::Refresh(alert.refreshed(condition, entry, at))
            }
        }
        (None, Some(alert)) => AlertDecision::ResolveEligible(alert.id),
        (None, None) => AlertDecision::Clear,
    }
}
