use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{AppState, error::Result, models::ContactRequest, services::email_service};

pub async fn contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let name = payload.name.as_deref().unwrap_or_default().trim();
    let email = payload.email.as_deref().unwrap_or_default().trim();
    let message = payload.message.as_deref().unwrap_or_default().trim();

    email_service::send_contact_email(&state.mailer, &state.mail, name, email, message).await?;

    tracing::info!("Contact message forwarded to {}", state.mail.contact_to);

    Ok(Json(json!({ "ok": true, "message": "Mensaje enviado" })))
}
