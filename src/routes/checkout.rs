use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rand::{Rng, distr::Alphanumeric};
use serde_json::json;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{CheckoutRequest, CheckoutResponse, server_total},
    services::{bold_service, email_service},
    utils::validation::is_valid_email,
};

/// Takes the cart, re-prices it server side and emails the order to the
/// sales inbox. Orders are not persisted; the email is the system of record.
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Response> {
    payload.validate()?;

    let items = payload.normalized_items();
    let client_total = payload.total_cents.unwrap_or(-1);
    let total = server_total(&items);

    // The client total is advisory only; a mismatch means a stale cart or
    // tampered prices, either way the order must not go through.
    if client_total != total {
        tracing::warn!(
            "Checkout total mismatch: client {} vs server {} (diff {})",
            client_total,
            total,
            total - client_total
        );
        return Err(AppError::TotalMismatch {
            server_total: total,
            client_total,
        });
    }

    let email = payload.customer.email.as_deref().unwrap_or_default().trim();
    if !is_valid_email(email) {
        tracing::warn!(
            "Checkout email rejected after validation: {}",
            mask_email(email)
        );
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Correo inválido." })),
        )
            .into_response());
    }

    tracing::info!(
        "Checkout received: {} items from {} ({})",
        items.len(),
        mask_email(email),
        mask_phone(payload.customer.phone.as_deref().unwrap_or_default())
    );

    let order_code = generate_order_code();

    let secret_key = state
        .bold
        .secret_key
        .as_deref()
        .ok_or_else(|| AppError::ConfigError("BOLD_SECRET_KEY is not set".to_string()))?;
    let bold_signature =
        bold_service::integrity_signature(&order_code, total, &state.bold.currency, secret_key);

    // The pay button in the email is best effort; without a link the order
    // still reaches the sales inbox.
    let mut payment_link = None;
    if state.bold.api_key.is_some() {
        match bold_service::create_payment_link(&state.bold, total, &order_code, Some(email)).await
        {
            Ok(link) => payment_link = Some(link),
            Err(e) => tracing::warn!("Payment link for {} not created: {}", order_code, e),
        }
    }

    if let Err(e) = email_service::send_new_order_email(
        &state.mailer,
        &state.mail,
        &order_code,
        &payload.customer,
        &items,
        total,
        payment_link.as_deref(),
    )
    .await
    {
        tracing::error!(
            "Checkout mail failed for {}: {} ({} items)",
            order_code,
            e,
            items.len()
        );
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "ok": false,
                "message": "No se pudo enviar el correo. Intenta más tarde.",
            })),
        )
            .into_response());
    }

    tracing::info!(
        "Order {} emailed to {} (cc {}, {} items, total {})",
        order_code,
        state.mail.orders_to,
        mask_email(email),
        items.len(),
        total
    );

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            ok: true,
            order_code,
            total_cents: total,
            bold_amount: total,
            bold_currency: state.bold.currency.clone(),
            bold_signature,
        }),
    )
        .into_response())
}

fn generate_order_code() -> String {
    let token: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(8)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("ORD-{}", token)
}

/// Keeps the first character and the domain so logs stay traceable
/// without exposing the address.
fn mask_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        _ => email.to_string(),
    }
}

/// Strips whitespace and hides everything but the last two characters.
fn mask_phone(phone: &str) -> String {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    let count = compact.chars().count();
    compact
        .chars()
        .enumerate()
        .map(|(i, c)| if i + 2 < count { '•' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_code_is_prefixed_and_uppercase() {
        let code = generate_order_code();
        assert!(code.starts_with("ORD-"));
        assert_eq!(code.len(), 12);
        assert!(
            code[4..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn masks_email_keeping_first_char_and_domain() {
        assert_eq!(mask_email("cliente@example.com"), "c***@example.com");
        assert_eq!(mask_email("a@b.co"), "a***@b.co");
        assert_eq!(mask_email("sin-arroba"), "sin-arroba");
    }

    #[test]
    fn masks_phone_keeping_last_two_digits() {
        assert_eq!(mask_phone("300 123 4567"), "••••••••67");
        assert_eq!(mask_phone("12"), "12");
    }
}
