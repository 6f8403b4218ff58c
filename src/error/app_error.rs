use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(sqlx::Error),
    ConfigError(String),
    InternalError(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    Validation {
        message: String,
        errors: BTreeMap<String, Vec<String>>,
    },
    TotalMismatch {
        server_total: i64,
        client_total: i64,
    },
}

impl AppError {
    pub fn validation(errors: BTreeMap<String, Vec<String>>) -> Self {
        AppError::Validation {
            message: "Los datos enviados no son válidos.".to_string(),
            errors,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "error de base de datos: {}", e),
            AppError::ConfigError(msg) => write!(f, "error de configuración: {}", msg),
            AppError::InternalError(msg) => write!(f, "error interno: {}", msg),
            AppError::NotFound(msg) => write!(f, "no encontrado: {}", msg),
            AppError::BadRequest(msg) => write!(f, "solicitud inválida: {}", msg),
            AppError::Conflict(msg) => write!(f, "conflicto: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "no autorizado: {}", msg),
            AppError::Forbidden(msg) => write!(f, "prohibido: {}", msg),
            AppError::Validation { message, .. } => write!(f, "validación: {}", message),
            AppError::TotalMismatch {
                server_total,
                client_total,
            } => write!(
                f,
                "el total no coincide: servidor {} vs cliente {}",
                server_total, client_total
            ),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::DatabaseError(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Error de base de datos")
            }
            AppError::ConfigError(ref msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error de configuración del servidor",
                )
            }
            AppError::InternalError(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.as_str())
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.as_str()),
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.as_str()),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.as_str()),
            AppError::Validation { message, errors } => {
                let body = Json(json!({
                    "message": message,
                    "errors": errors,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::TotalMismatch {
                server_total,
                client_total,
            } => {
                let body = Json(json!({
                    "message": "El total no coincide.",
                    "server_total": server_total,
                    "client_total": client_total,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
        };

        let body = Json(json!({
            "message": error_message,
        }));

        (status, body).into_response()
    }
}
