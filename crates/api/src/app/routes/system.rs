use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use gymops_infra::InventoryFacade;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Settings clients need to pre-fill forms (reorder source and size).
pub async fn settings(Extension(facade): Extension<Arc<InventoryFacade>>) -> impl IntoResponse {
    let config = facade.config();
    Json(serde_json::json!({
        "central_warehouse": config.central_warehouse,
        "reorder_multiplier": config.reorder_multiplier,
        "auto_resolve_alerts": config.alert_policy.auto_resolve,
    }))
}
