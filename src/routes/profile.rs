use axum::{Extension, Json, extract::State};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AuthUserResponse, UpdatePasswordRequest, UpdateProfileRequest},
    queries::user_queries,
    utils::{extractors::extract_user_id, jwt::Claims},
};

pub async fn show_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AuthUserResponse>> {
    let user_id = extract_user_id(&claims)?;
    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuario no encontrado.".to_string()))?;

    Ok(Json(AuthUserResponse::from(&user)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<AuthUserResponse>> {
    payload.validate()?;

    let user_id = extract_user_id(&claims)?;

    let email = payload.email.as_deref().map(str::trim);
    if let Some(email) = email {
        if user_queries::email_taken(&state.db, email, Some(user_id)).await? {
            return Err(AppError::Conflict("El correo ya está registrado.".to_string()));
        }
    }

    let user = user_queries::update_profile(
        &state.db,
        user_id,
        payload.name.as_deref().map(str::trim),
        email,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Usuario no encontrado.".to_string()))?;

    Ok(Json(AuthUserResponse::from(&user)))
}

pub async fn update_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;

    let user_id = extract_user_id(&claims)?;
    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuario no encontrado.".to_string()))?;

    let current = payload.current_password.as_deref().unwrap_or_default();
    let is_valid = bcrypt::verify(current, &user.password)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))?;

    if !is_valid {
        return Err(AppError::Unauthorized(
            "La contraseña actual no es correcta.".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(
        payload.password.as_deref().unwrap_or_default(),
        bcrypt::DEFAULT_COST,
    )
    .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    user_queries::update_password(&state.db, user_id, &password_hash).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
