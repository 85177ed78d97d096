//! Wiring: storage backend, notification delivery, façade.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use gymops_events::{EventBus, InMemoryEventBus, Subscription};
use gymops_infra::{AppConfig, BusNotifier, InventoryFacade, Notification, StoreBackend, Stores};

#[cfg(feature = "postgres")]
use gymops_infra::repository::PostgresStores;

/// Build the façade described by `config`, seeding demo data if asked to.
pub async fn build_facade(config: &AppConfig) -> anyhow::Result<Arc<InventoryFacade>> {
    let stores = open_stores(&config.store).await?;

    let bus = Arc::new(InMemoryEventBus::<Notification>::new());
    spawn_delivery_worker(bus.subscribe())?;

    let facade = Arc::new(InventoryFacade::new(
        stores,
        Arc::new(BusNotifier::new(bus)),
        config.inventory.clone(),
    ));

    if config.seed_demo {
        gymops_infra::seed::seed_demo(&facade).context("seeding demo data")?;
    }
    Ok(facade)
}

async fn open_stores(backend: &StoreBackend) -> anyhow::Result<Stores> {
    match backend {
        StoreBackend::Memory => {
            info!("using in-memory store");
            Ok(Stores::in_memory())
        }
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres { database_url } => {
            let pg = PostgresStores::connect(database_url)
                .await
                .context("connecting to postgres")?;
            pg.migrate().await.context("applying schema")?;
            info!("using postgres store");
            Ok(pg.stores())
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres { .. } => {
            anyhow::bail!("GYMOPS_STORE=postgres requires the `postgres` feature")
        }
    }
}

/// Drains the notification bus on its own thread. Delivery is a log line
/// per recipient group; a mail or chat transport would subscribe the same way.
fn spawn_delivery_worker(subscription: Subscription<Notification>) -> anyhow::Result<()> {
    std::thread::Builder::new()
        .name("notification-delivery".to_string())
        .spawn(move || {
            while let Ok(n) = subscription.recv() {
                info!(
                    target: "notifications",
                    severity = %n.severity,
                    recipient_group = %n.recipient_group,
                    sent_at = %n.sent_at,
                    "{}",
                    n.message
                );
            }
            warn!("notification bus closed; delivery worker stopping");
        })
        .context("spawning notification worker")?;
    Ok(())
}
