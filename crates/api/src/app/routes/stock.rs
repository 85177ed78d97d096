use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use gymops_core::{ItemId, Location};
use gymops_infra::InventoryFacade;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(assign_stock))
        .route("/movements", post(record_movement))
        .route("/adjust", post(adjust_stock))
        .route("/transfer", post(transfer_stock))
        .route("/reserve", post(reserve_stock))
        .route("/release", post(release_stock))
        .route("/thresholds", post(set_thresholds))
}

pub fn movements_router() -> Router {
    Router::new().route("/", get(movement_history))
}

fn target(item_id: &str, location: &str) -> Result<(ItemId, Location), axum::response::Response> {
    Ok((errors::parse_id(item_id)?, errors::parse_location(location)?))
}

pub async fn assign_stock(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Json(body): Json<dto::AssignStockRequest>,
) -> axum::response::Response {
    let (item_id, location) = match target(&body.item_id, &body.location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = facade
        .assign_stock(
            item_id,
            location,
            body.min_stock,
            body.max_stock,
            body.initial_stock,
            &body.performed_by,
        )
        .map(dto::LedgerResponse::from);
    errors::respond_with(StatusCode::CREATED, result)
}

pub async fn record_movement(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Json(body): Json<dto::RecordMovementRequest>,
) -> axum::response::Response {
    let (item_id, location) = match target(&body.item_id, &body.location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = facade
        .record_movement(
            item_id,
            &location,
            body.quantity,
            body.movement_type,
            &body.reason,
            &body.performed_by,
        )
        .map(dto::LedgerResponse::from);
    errors::respond_with(StatusCode::CREATED, result)
}

pub async fn adjust_stock(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let (item_id, location) = match target(&body.item_id, &body.location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = facade
        .adjust_stock(item_id, &location, body.delta, &body.reason, &body.performed_by)
        .map(dto::LedgerResponse::from);
    errors::respond_with(StatusCode::CREATED, result)
}

pub async fn transfer_stock(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Json(body): Json<dto::TransferStockRequest>,
) -> axum::response::Response {
    let (item_id, from) = match target(&body.item_id, &body.from_location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let to = match errors::parse_location(&body.to_location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = facade
        .transfer_stock(item_id, &from, &to, body.quantity, &body.reason, &body.performed_by)
        .map(dto::TransferResponse::from);
    errors::respond_with(StatusCode::CREATED, result)
}

pub async fn reserve_stock(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Json(body): Json<dto::ReservationRequest>,
) -> axum::response::Response {
    let (item_id, location) = match target(&body.item_id, &body.location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        facade
            .reserve_stock(item_id, &location, body.quantity)
            .map(|entry| dto::StockEntryView::from(&entry)),
    )
}

pub async fn release_stock(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Json(body): Json<dto::ReservationRequest>,
) -> axum::response::Response {
    let (item_id, location) = match target(&body.item_id, &body.location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        facade
            .release_stock(item_id, &location, body.quantity)
            .map(|entry| dto::StockEntryView::from(&entry)),
    )
}

pub async fn set_thresholds(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Json(body): Json<dto::ThresholdsRequest>,
) -> axum::response::Response {
    let (item_id, location) = match target(&body.item_id, &body.location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        facade
            .set_thresholds(item_id, &location, body.min_stock, body.max_stock)
            .map(dto::LedgerResponse::from),
    )
}

/// Newest first; both filters optional.
pub async fn movement_history(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Query(query): Query<dto::MovementQuery>,
) -> axum::response::Response {
    let location = match query.location.as_deref().map(errors::parse_location).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let item_id: Option<ItemId> = match query.item_id.as_deref().map(errors::parse_id).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(facade.movement_history(location.as_ref(), item_id))
}
