use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use gymops_core::{ItemId, Money};
use gymops_infra::InventoryFacade;
use gymops_inventory::NewItem;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_item).get(list_items))
        .route("/search", get(find_item))
        .route("/:id", get(get_item))
        .route("/:id/reprice", post(reprice_item))
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

pub async fn register_item(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Json(body): Json<dto::CreateItemRequest>,
) -> axum::response::Response {
    let input = NewItem {
        sku: body.sku,
        name: body.name,
        category: body.category,
        unit: body.unit,
        purchase_price: Money::from_cents(body.purchase_price_cents),
        sale_price: Money::from_cents(body.sale_price_cents),
    };
    errors::respond_with(StatusCode::CREATED, facade.register_item(input))
}

/// Current version of every sku.
pub async fn list_items(Extension(facade): Extension<Arc<InventoryFacade>>) -> axum::response::Response {
    errors::respond(facade.items())
}

pub async fn find_item(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Query(query): Query<NameQuery>,
) -> axum::response::Response {
    errors::respond(facade.find_item_by_name(&query.name))
}

pub async fn get_item(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(facade.item(item_id))
}

pub async fn reprice_item(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RepriceItemRequest>,
) -> axum::response::Response {
    let item_id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond_with(
        StatusCode::CREATED,
        facade.reprice_item(
            item_id,
            Money::from_cents(body.purchase_price_cents),
            Money::from_cents(body.sale_price_cents),
        ),
    )
}
