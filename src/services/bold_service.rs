use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::BoldConfig;
use crate::error::{AppError, Result};

/// Integrity signature the Bold checkout widget embeds:
/// lowercase hex SHA-256 over `{order_code}{amount}{currency}{secret_key}`.
pub fn integrity_signature(
    order_code: &str,
    amount: i64,
    currency: &str,
    secret_key: &str,
) -> String {
    let payload = format!("{}{}{}{}", order_code, amount, currency, secret_key);
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// Signature Bold sends with webhooks: HMAC-SHA256 keyed by the shared
/// secret over the base64 of the raw body, hex-encoded.
pub fn webhook_signature(secret_key: &str, raw_body: &[u8]) -> Result<String> {
    let encoded = BASE64.encode(raw_body);
    let mut mac = Hmac::<Sha256>::new_from_slice(secret_key.as_bytes())
        .map_err(|_| AppError::InternalError("Invalid webhook secret".to_string()))?;
    mac.update(encoded.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison to prevent timing attacks.
pub fn signatures_match(expected: &str, received: &str) -> bool {
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}

/// Creates a closed-amount payment link and returns its shareable URL.
pub async fn create_payment_link(
    config: &BoldConfig,
    amount: i64,
    description: &str,
    payer_email: Option<&str>,
) -> Result<String> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or_else(|| AppError::ConfigError("Bold API key not configured".to_string()))?;

    let payload = serde_json::json!({
        "amount_type": "CLOSE",
        "amount": {
            "currency": config.currency,
            "total_amount": amount,
            "tip_amount": 0,
        },
        "description": description,
        "reference": description,
        "callback_url": config.callback_url,
        "payer_email": payer_email,
    });

    let client = reqwest::Client::new();
    let response = client
        .post(format!(
            "{}/online/link/v1",
            config.base_url.trim_end_matches('/')
        ))
        .header("Authorization", format!("x-api-key {}", api_key))
        .json(&payload)
        .send()
        .await
        .map_err(|e| AppError::InternalError(format!("Bold API request failed: {}", e)))?;

    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to parse Bold response: {}", e)))?;

    if !status.is_success() {
        tracing::error!("Bold link creation failed: HTTP {} {}", status, body);
        return Err(AppError::InternalError(format!(
            "Bold link creation failed: HTTP {}",
            status
        )));
    }

    let link = body
        .get("payload")
        .and_then(|p| p.get("url").or_else(|| p.get("payment_link")))
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::InternalError("Bold response missing payment link".to_string()))?;

    Ok(link.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_signature_is_hex_sha256() {
        let sig = integrity_signature("ORD-AB12CD34", 13500000, "COP", "secreto");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(sig, sig.to_lowercase());
    }

    #[test]
    fn integrity_signature_is_deterministic() {
        let a = integrity_signature("ORD-XYZ", 1000, "COP", "clave");
        let b = integrity_signature("ORD-XYZ", 1000, "COP", "clave");
        assert_eq!(a, b);
    }

    #[test]
    fn integrity_signature_covers_every_field() {
        let base = integrity_signature("ORD-XYZ", 1000, "COP", "clave");
        assert_ne!(base, integrity_signature("ORD-XYZ", 1001, "COP", "clave"));
        assert_ne!(base, integrity_signature("ORD-XYz", 1000, "COP", "clave"));
        assert_ne!(base, integrity_signature("ORD-XYZ", 1000, "USD", "clave"));
        assert_ne!(base, integrity_signature("ORD-XYZ", 1000, "COP", "otra"));
    }

    #[test]
    fn webhook_signature_matches_itself_only() {
        let body = br#"{"type":"SALE_APPROVED","data":{"payment_id":"abc"}}"#;
        let expected = webhook_signature("secreto", body).unwrap();

        assert!(signatures_match(&expected, &expected));
        assert!(!signatures_match(
            &expected,
            &webhook_signature("secreto", b"otro cuerpo").unwrap()
        ));
        assert!(!signatures_match(
            &expected,
            &webhook_signature("otra-clave", body).unwrap()
        ));
        assert!(!signatures_match(&expected, ""));
    }
}
