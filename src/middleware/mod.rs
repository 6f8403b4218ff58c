use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{app::AppState, error::AppError, utils::jwt};

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&req, &state.auth.cookie_name)
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let claims = jwt::verify_token(&state.auth, &token)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Accepts the token from the `Authorization: Bearer` header or from the
/// auth cookie, so both API clients and the browser session work.
pub fn extract_token(req: &Request, cookie_name: &str) -> Option<String> {
    bearer_token(req).or_else(|| cookie_token(req, cookie_name))
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn cookie_token(req: &Request, cookie_name: &str) -> Option<String> {
    let header = req.headers().get(http::header::COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == cookie_name).then(|| value.to_string())
    })
}
