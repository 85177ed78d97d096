use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use tower::ServiceBuilder;

use gymops_infra::InventoryFacade;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// HTTP surface over an already-wired façade.
pub fn build_app(facade: Arc<InventoryFacade>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(facade)))
}
