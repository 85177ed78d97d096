use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::get,
    Router,
};

use gymops_infra::InventoryFacade;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:location/stock", get(stock_by_location))
        .route("/:location/alerts", get(open_alerts))
        .route("/:location/orders", get(orders_by_location))
}

pub async fn stock_by_location(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(location): Path<String>,
) -> axum::response::Response {
    let location = match errors::parse_location(&location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        facade
            .stock_by_location(&location)
            .map(|entries| dto::stock_views(&entries)),
    )
}

/// Open alerts, most severe first.
pub async fn open_alerts(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(location): Path<String>,
) -> axum::response::Response {
    let location = match errors::parse_location(&location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(facade.open_alerts_by_location(&location))
}

pub async fn orders_by_location(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(location): Path<String>,
) -> axum::response::Response {
    let location = match errors::parse_location(&location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        facade
            .orders_by_location(&location)
            .map(|orders| dto::order_views(&orders)),
    )
}
