use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;

use gymops_core::{DomainError, DomainResult, Location};

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::ItemNotFound(_) => json_error(StatusCode::NOT_FOUND, "item_not_found", message),
        DomainError::NoStockRecord { .. } => json_error(StatusCode::NOT_FOUND, "no_stock_record", message),
        DomainError::OrderNotFound(_) => json_error(StatusCode::NOT_FOUND, "order_not_found", message),
        DomainError::AlertNotFound(_) => json_error(StatusCode::NOT_FOUND, "alert_not_found", message),
        DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock", message)
        }
        DomainError::InvalidTransition { .. } => json_error(StatusCode::CONFLICT, "invalid_transition", message),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::Storage(_) => {
            tracing::error!(error = %message, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// `200` with the JSON body on success, the mapped error otherwise.
pub fn respond<T: Serialize>(result: DomainResult<T>) -> axum::response::Response {
    respond_with(StatusCode::OK, result)
}

pub fn respond_with<T: Serialize>(status: StatusCode, result: DomainResult<T>) -> axum::response::Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

/// Parse a path or body identifier (`ItemId`, `AlertId`, `OrderId`).
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(domain_error_to_response)
}

pub fn parse_location(raw: &str) -> Result<Location, axum::response::Response> {
    Location::new(raw).map_err(domain_error_to_response)
}
