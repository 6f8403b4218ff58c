use axum::{
    Extension, Json,
    extract::{Request, State},
    http::StatusCode,
    response::{AppendHeaders, IntoResponse},
};
use chrono::Utc;

use crate::{
    AppState,
    config::AuthConfig,
    error::{AppError, Result},
    middleware,
    models::{AuthUserResponse, LoginRequest, RegisterRequest},
    queries::user_queries,
    utils::{extractors::extract_user_id, jwt, jwt::Claims},
};

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let name = payload.name.as_deref().unwrap_or_default().trim();
    let email = payload.email.as_deref().unwrap_or_default().trim();
    let password = payload.password.as_deref().unwrap_or_default();

    if user_queries::email_taken(&state.db, email, None).await? {
        return Err(AppError::Conflict("El correo ya está registrado.".to_string()));
    }

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    let user = user_queries::create_user(&state.db, name, email, &password_hash).await?;

    tracing::info!("Registered user {}", user.id);

    let token = jwt::generate_token(&state.auth, user.id, &user.email)?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(http::header::SET_COOKIE, auth_cookie(&state.auth, &token))]),
        Json(AuthUserResponse::from(&user)),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let email = payload.email.as_deref().unwrap_or_default().trim();
    let password = payload.password.as_deref().unwrap_or_default();

    let user = user_queries::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Credenciales inválidas.".to_string()))?;

    let is_valid = bcrypt::verify(password, &user.password)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))?;

    if !is_valid {
        return Err(AppError::Unauthorized("Credenciales inválidas.".to_string()));
    }

    let token = jwt::generate_token(&state.auth, user.id, &user.email)?;

    Ok((
        AppendHeaders([(http::header::SET_COOKIE, auth_cookie(&state.auth, &token))]),
        Json(AuthUserResponse::from(&user)),
    ))
}

/// Reissues the cookie for tokens that already expired, as long as they
/// were issued inside the refresh window. The SPA calls this when a
/// request comes back with "Token has expired".
pub async fn refresh(State(state): State<AppState>, req: Request) -> Result<impl IntoResponse> {
    let token = middleware::extract_token(&req, &state.auth.cookie_name)
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let claims = jwt::decode_for_refresh(&state.auth, &token)?;

    let window_secs = state.auth.refresh_ttl_days * 24 * 3600;
    if Utc::now().timestamp() - claims.iat as i64 > window_secs {
        return Err(AppError::Unauthorized("Refresh window expired".to_string()));
    }

    let user_id = extract_user_id(&claims)?;
    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

    let token = jwt::generate_token(&state.auth, user.id, &user.email)?;

    Ok((
        AppendHeaders([(http::header::SET_COOKIE, auth_cookie(&state.auth, &token))]),
        Json(AuthUserResponse::from(&user)),
    ))
}

pub async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok((
        AppendHeaders([(http::header::SET_COOKIE, clear_cookie(&state.auth))]),
        Json(serde_json::json!({ "ok": true })),
    ))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AuthUserResponse>> {
    let user_id = extract_user_id(&claims)?;
    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuario no encontrado.".to_string()))?;

    Ok(Json(AuthUserResponse::from(&user)))
}

fn auth_cookie(auth: &AuthConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        auth.cookie_name,
        token,
        auth.token_ttl_minutes * 60
    );
    if auth.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_cookie(auth: &AuthConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        auth.cookie_name
    );
    if auth.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth(secure: bool) -> AuthConfig {
        AuthConfig {
            jwt_secret: "secreto".to_string(),
            token_ttl_minutes: 60,
            refresh_ttl_days: 14,
            cookie_name: "token".to_string(),
            cookie_secure: secure,
        }
    }

    #[test]
    fn auth_cookie_carries_token_and_ttl() {
        let cookie = auth_cookie(&test_auth(false), "abc.def.ghi");
        assert_eq!(cookie, "token=abc.def.ghi; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600");
    }

    #[test]
    fn auth_cookie_adds_secure_flag_from_config() {
        let cookie = auth_cookie(&test_auth(true), "t");
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_cookie(&test_auth(false));
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
