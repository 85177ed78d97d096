use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use gymops_core::AlertId;
use gymops_infra::InventoryFacade;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:id", get(get_alert))
        .route("/:id/reorder", post(confirm_reorder))
        .route("/:id/resolve", post(resolve_alert))
        .route("/:id/read", post(mark_read))
}

pub async fn get_alert(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let alert_id: AlertId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(facade.alert(alert_id))
}

/// Human confirmation of the suggested replenishment.
pub async fn confirm_reorder(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReorderRequest>,
) -> axum::response::Response {
    let alert_id: AlertId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = facade
        .confirm_auto_reorder_by_id(alert_id, &body.requested_by)
        .map(|order| dto::OrderView::from(&order));
    errors::respond_with(StatusCode::CREATED, result)
}

pub async fn resolve_alert(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ResolveAlertRequest>,
) -> axum::response::Response {
    let alert_id: AlertId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(facade.resolve_alert(alert_id, &body.resolved_by))
}

pub async fn mark_read(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let alert_id: AlertId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(facade.mark_alert_read(alert_id))
}
