use axum::{routing::get, Router};

pub mod alerts;
pub mod catalog;
pub mod incidents;
pub mod locations;
pub mod orders;
pub mod stock;
pub mod system;

/// Every endpoint except `/health`.
pub fn router() -> Router {
    Router::new()
        .route("/settings", get(system::settings))
        .route("/consumption", axum::routing::post(incidents::report_consumption))
        .nest("/items", catalog::router())
        .nest("/stock", stock::router())
        .nest("/movements", stock::movements_router())
        .nest("/locations", locations::router())
        .nest("/alerts", alerts::router())
        .nest("/orders", orders::router())
}
