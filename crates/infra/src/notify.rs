//! Notification port.
//!
//! Best-effort and fire-and-forget: the façade calls [`notify_best_effort`],
//! which logs a failed delivery and carries on. A notification never fails
//! the mutation that triggered it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gymops_events::EventBus;
use gymops_inventory::Severity;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("notification failure: {0}")]
    NotificationFailure(String),
}

/// One message to a recipient group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub recipient_group: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

/// Must not block on delivery.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, recipient_group: &str, message: &str) -> Result<(), NotifyError>;
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn notify(&self, severity: Severity, recipient_group: &str, message: &str) -> Result<(), NotifyError> {
        (**self).notify(severity, recipient_group, message)
    }
}

/// Writes notifications to the log and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, severity: Severity, recipient_group: &str, message: &str) -> Result<(), NotifyError> {
        info!(%severity, recipient_group, message, "notification");
        Ok(())
    }
}

/// Publishes a [`Notification`] onto an event bus for some other consumer
/// to deliver.
pub struct BusNotifier<B> {
    bus: B,
}

impl<B> BusNotifier<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<B> Notifier for BusNotifier<B>
where
    B: EventBus<Notification> + Send + Sync,
    B::Error: core::fmt::Display,
{
    fn notify(&self, severity: Severity, recipient_group: &str, message: &str) -> Result<(), NotifyError> {
        self.bus
            .publish(Notification {
                severity,
                recipient_group: recipient_group.to_string(),
                message: message.to_string(),
                sent_at: Utc::now(),
            })
            .map_err(|e| NotifyError::NotificationFailure(e.to_string()))
    }
}

/// Send and swallow: a failure is logged at `warn`, never returned.
pub fn notify_best_effort(notifier: &dyn Notifier, severity: Severity, recipient_group: &str, message: &str) {
    if let Err(err) = notifier.notify(severity, recipient_group, message) {
        warn!(error = %err, recipient_group, %severity, "notification dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymops_events::InMemoryEventBus;

    struct Failing;

    impl Notifier for Failing {
        fn notify(&self, _: Severity, _: &str, _: &str) -> Result<(), NotifyError> {
            Err(NotifyError::NotificationFailure("smtp down".to_string()))
        }
    }

    #[test]
    fn bus_notifier_publishes_to_subscribers() {
        let bus = Arc::new(InMemoryEventBus::<Notification>::new());
        let sub = bus.subscribe();
        let notifier = BusNotifier::new(bus.clone());

        notifier.notify(Severity::High, "encargados", "Correa TRX bajo mínimo").unwrap();

        let got = sub.try_recv().unwrap();
        assert_eq!(got.severity, Severity::High);
        assert_eq!(got.recipient_group, "encargados");
        assert_eq!(got.message, "Correa TRX bajo mínimo");
    }

    #[test]
    fn best_effort_swallows_failures() {
        notify_best_effort(&Failing, Severity::Critical, "encargados", "sin stock");
        notify_best_effort(&LogNotifier, Severity::Low, "logistica", "ok");
    }
}
