//! Configuration loading and representation.
//!
//! Everything comes from environment variables with working defaults, so a
//! bare `cargo run` starts an in-memory server on port 8080.

use std::net::SocketAddr;

use gymops_core::Location;

use crate::ledger::AlertPolicy;

pub const BIND_ADDR: &str = "GYMOPS_BIND_ADDR";
pub const CENTRAL_WAREHOUSE: &str = "GYMOPS_CENTRAL_WAREHOUSE";
pub const REORDER_MULTIPLIER: &str = "GYMOPS_REORDER_MULTIPLIER";
pub const AUTO_RESOLVE_ALERTS: &str = "GYMOPS_AUTO_RESOLVE_ALERTS";
pub const ALERT_RECIPIENTS: &str = "GYMOPS_ALERT_RECIPIENTS";
pub const LOGISTICS_RECIPIENTS: &str = "GYMOPS_LOGISTICS_RECIPIENTS";
pub const STORE: &str = "GYMOPS_STORE";
pub const DATABASE_URL: &str = "DATABASE_URL";
pub const SEED_DEMO: &str = "GYMOPS_SEED_DEMO";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is required{context}")]
    Missing { var: &'static str, context: &'static str },

    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres { database_url: String },
}

/// Settings the façade needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    /// Source of every auto-reorder.
    pub central_warehouse: Location,
    /// Auto-reorder quantity is `reorder_multiplier × min_stock`.
    pub reorder_multiplier: i64,
    pub alert_policy: AlertPolicy,
    pub alert_recipients: String,
    pub logistics_recipients: String,
}

pub const DEFAULT_CENTRAL_WAREHOUSE: &str = "almacen_central";

impl InventoryConfig {
    /// Defaults for everything except the warehouse.
    pub fn new(central_warehouse: Location) -> Self {
        Self {
            central_warehouse,
            reorder_multiplier: 2,
            alert_policy: AlertPolicy::default(),
            alert_recipients: "encargados".to_string(),
            logistics_recipients: "logistica".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub inventory: InventoryConfig,
    pub seed_demo: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get(BIND_ADDR) {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                var: BIND_ADDR,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let raw_warehouse = get(CENTRAL_WAREHOUSE).unwrap_or_else(|| DEFAULT_CENTRAL_WAREHOUSE.to_string());
        let central_warehouse = Location::new(raw_warehouse.as_str()).map_err(|e| ConfigError::Invalid {
            var: CENTRAL_WAREHOUSE,
            value: raw_warehouse.clone(),
            reason: e.to_string(),
        })?;
        let defaults = InventoryConfig::new(central_warehouse.clone());

        let reorder_multiplier = match get(REORDER_MULTIPLIER) {
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: REORDER_MULTIPLIER,
                        value: raw,
                        reason: "expected a positive integer".to_string(),
                    });
                }
            },
            None => defaults.reorder_multiplier,
        };

        let auto_resolve = match get(AUTO_RESOLVE_ALERTS) {
            Some(raw) => parse_bool(AUTO_RESOLVE_ALERTS, &raw)?,
            None => defaults.alert_policy.auto_resolve,
        };

        let store = match get(STORE).as_deref() {
            None | Some("memory") => StoreBackend::Memory,
            Some("postgres") => StoreBackend::Postgres {
                database_url: get(DATABASE_URL).ok_or(ConfigError::Missing {
                    var: DATABASE_URL,
                    context: " when GYMOPS_STORE=postgres",
                })?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: STORE,
                    value: other.to_string(),
                    reason: "expected `memory` or `postgres`".to_string(),
                });
            }
        };

        let seed_demo = match get(SEED_DEMO) {
            Some(raw) => parse_bool(SEED_DEMO, &raw)?,
            None => false,
        };

        Ok(Self {
            bind_addr,
            store,
            inventory: InventoryConfig {
                central_warehouse,
                reorder_multiplier,
                alert_policy: AlertPolicy {
                    auto_resolve,
                    ..defaults.alert_policy
                },
                alert_recipients: get(ALERT_RECIPIENTS).unwrap_or(defaults.alert_recipients),
                logistics_recipients: get(LOGISTICS_RECIPIENTS).unwrap_or(defaults.logistics_recipients),
            },
            seed_demo,
        })
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = load(&[]).unwrap();

        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert_eq!(cfg.inventory.central_warehouse.as_str(), "almacen_central");
        assert_eq!(cfg.inventory.reorder_multiplier, 2);
        assert!(cfg.inventory.alert_policy.auto_resolve);
        assert_eq!(cfg.inventory.alert_recipients, "encargados");
        assert!(!cfg.seed_demo);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = load(&[
            (BIND_ADDR, "127.0.0.1:9000"),
            (CENTRAL_WAREHOUSE, "almacen_norte"),
            (REORDER_MULTIPLIER, "3"),
            (AUTO_RESOLVE_ALERTS, "no"),
            (STORE, "postgres"),
            (DATABASE_URL, "postgres://localhost/gymops"),
            (SEED_DEMO, "true"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.inventory.central_warehouse.as_str(), "almacen_norte");
        assert_eq!(cfg.inventory.reorder_multiplier, 3);
        assert!(!cfg.inventory.alert_policy.auto_resolve);
        assert!(matches!(cfg.store, StoreBackend::Postgres { .. }));
        assert!(cfg.seed_demo);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = load(&[(REORDER_MULTIPLIER, "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: REORDER_MULTIPLIER, .. }));

        let err = load(&[(STORE, "postgres")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "DATABASE_URL is required when GYMOPS_STORE=postgres"
        );

        let err = load(&[(STORE, "redis")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: STORE, .. }));
    }
}
