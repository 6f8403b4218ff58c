use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn generate_token(config: &AuthConfig, user_id: i64, email: &str) -> Result<String> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::minutes(config.token_ttl_minutes))
        .ok_or_else(|| AppError::InternalError("Failed to calculate expiration".to_string()))?;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Token generation failed: {}", e)))
}

pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token has expired".to_string())
        }
        _ => AppError::Unauthorized("Invalid token".to_string()),
    })
}

/// Decodes without enforcing `exp`. The refresh endpoint checks the
/// issued-at window itself, so expired tokens must still parse here.
pub fn decode_for_refresh(config: &AuthConfig, token: &str) -> Result<Claims> {
    let mut validation = Validation::default();
    validation.validate_exp = false;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-key".to_string(),
            token_ttl_minutes: 60,
            refresh_ttl_days: 14,
            cookie_name: "token".to_string(),
            cookie_secure: false,
        }
    }

    fn expired_token(config: &AuthConfig, age_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "7".to_string(),
            email: "admin@mese.co".to_string(),
            iat: (now - age_secs) as usize,
            exp: (now - age_secs + 60) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn round_trip() {
        let config = test_config();
        let token = generate_token(&config, 42, "admin@mese.co").unwrap();
        let claims = verify_token(&config, &token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "admin@mese.co");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected_with_expiry_message() {
        let config = test_config();
        let token = expired_token(&config, 3600);

        match verify_token(&config, &token) {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("Token has expired")),
            other => panic!("expected expiry error, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token = generate_token(&config, 1, "a@b.co").unwrap();

        let mut other = test_config();
        other.jwt_secret = "different-secret".to_string();
        assert!(verify_token(&other, &token).is_err());
    }

    #[test]
    fn refresh_decode_accepts_expired_tokens() {
        let config = test_config();
        let token = expired_token(&config, 3600);

        let claims = decode_for_refresh(&config, &token).unwrap();
        assert_eq!(claims.sub, "7");
    }
}
