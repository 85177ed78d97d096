use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use gymops_core::{DomainResult, ItemId, OrderId};
use gymops_infra::InventoryFacade;
use gymops_replenishment::InternalOrder;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order))
        .route("/pending", get(pending_orders))
        .route("/stats", get(order_stats))
        .route("/:id", get(get_order))
        .route("/:id/process", post(process_order))
        .route("/:id/ship", post(mark_shipped))
        .route("/:id/deliver", post(mark_delivered))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/pay", post(mark_paid))
}

fn order_response(result: DomainResult<InternalOrder>) -> axum::response::Response {
    errors::respond(result.map(|order| dto::OrderView::from(&order)))
}

pub async fn create_order(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let item_id: ItemId = match errors::parse_id(&body.item_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (from, to) = match (
        errors::parse_location(&body.from_location),
        errors::parse_location(&body.to_location),
    ) {
        (Ok(from), Ok(to)) => (from, to),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };
    let result = facade
        .create_order(item_id, &from, &to, body.quantity, &body.requested_by, &body.reason)
        .map(|order| dto::OrderView::from(&order));
    errors::respond_with(StatusCode::CREATED, result)
}

/// Oldest first.
pub async fn pending_orders(Extension(facade): Extension<Arc<InventoryFacade>>) -> axum::response::Response {
    errors::respond(facade.pending_orders().map(|orders| dto::order_views(&orders)))
}

pub async fn order_stats(Extension(facade): Extension<Arc<InventoryFacade>>) -> axum::response::Response {
    errors::respond(facade.order_stats())
}

pub async fn get_order(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    order_response(facade.order(order_id))
}

pub async fn process_order(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ProcessOrderRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    order_response(facade.process_order(order_id, &body.processed_by))
}

pub async fn mark_shipped(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    order_response(facade.mark_shipped(order_id))
}

pub async fn mark_delivered(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(id): Path<String>,
    Json(body): Json<dto::DeliverOrderRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    order_response(facade.mark_delivered(order_id, &body.received_by))
}

pub async fn cancel_order(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(id): Path<String>,
    Json(body): Json<dto::CancelOrderRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    order_response(facade.cancel_order(order_id, &body.reason))
}

pub async fn mark_paid(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    order_response(facade.mark_paid(order_id))
}
