use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::{AppState, error::Result, services::bold_service};

/// Bold posts payment events here. The signature covers the base64 of the
/// raw body, so it is verified before the bytes are parsed as JSON.
pub async fn bold_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let secret_key = state.bold.secret_key.as_deref().unwrap_or("");
    let calculated = bold_service::webhook_signature(secret_key, &body)?;

    let received = headers
        .get("x-bold-signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if !bold_service::signatures_match(&calculated, received) {
        tracing::warn!(
            "Bold webhook signature rejected: received {} calculated {}",
            received,
            calculated
        );
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "message": "Invalid signature" })),
        )
            .into_response());
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Bold webhook body is not JSON: {}", e);
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "message": "Invalid JSON" })),
            )
                .into_response());
        }
    };

    let event_type = payload
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let data = payload.get("data");
    let payment_id = data
        .and_then(|d| d.get("payment_id"))
        .and_then(Value::as_str)
        .unwrap_or("-");
    let reference = data
        .and_then(|d| d.get("metadata"))
        .and_then(|m| m.get("reference"))
        .and_then(Value::as_str)
        .unwrap_or("-");
    let amount = data.and_then(|d| d.get("amount"));
    let total = amount
        .and_then(|a| a.get("total"))
        .map(Value::to_string)
        .unwrap_or_else(|| "-".to_string());
    let currency = amount
        .and_then(|a| a.get("currency"))
        .and_then(Value::as_str)
        .unwrap_or("-");

    // Payment state is not persisted; the log line is the audit trail.
    tracing::info!(
        "Bold webhook accepted: type {} payment {} reference {} total {} {}",
        event_type,
        payment_id,
        reference,
        total,
        currency
    );

    Ok((
        StatusCode::OK,
        Json(json!({ "ok": true, "message": "Webhook received" })),
    )
        .into_response())
}
