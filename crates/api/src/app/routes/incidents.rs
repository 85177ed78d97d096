use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, Json};

use gymops_infra::InventoryFacade;

use crate::app::{dto, errors};

/// A staff member reports a breakage or loss by item name.
pub async fn report_consumption(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Json(body): Json<dto::ConsumptionRequest>,
) -> axum::response::Response {
    let location = match errors::parse_location(&body.location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = facade
        .report_consumption(
            &body.item_name,
            body.quantity,
            &location,
            &body.reason,
            &body.reported_by,
        )
        .map(dto::ConsumptionResponse::from);
    errors::respond_with(StatusCode::CREATED, result)
}
