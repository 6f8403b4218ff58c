use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::validation::{Validator, is_valid_email};

// DB models

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Request types

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: Option<String>,
    pub password: Option<String>,
}

// Response types

#[derive(Debug, Serialize)]
pub struct AuthUserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&User> for AuthUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();

        match self.name.as_deref().map(str::trim) {
            None | Some("") => v.add("name", "El nombre es obligatorio."),
            Some(name) if name.chars().count() > 120 => {
                v.add("name", "El nombre no puede superar 120 caracteres.")
            }
            _ => {}
        }

        match self.email.as_deref().map(str::trim) {
            None | Some("") => v.add("email", "El correo es obligatorio."),
            Some(email) if !is_valid_email(email) => v.add("email", "Correo inválido."),
            _ => {}
        }

        match self.password.as_deref() {
            None | Some("") => v.add("password", "La contraseña es obligatoria."),
            Some(pass) if pass.chars().count() < 8 => {
                v.add("password", "La contraseña debe tener al menos 8 caracteres.")
            }
            _ => {}
        }

        v.finish()
    }
}

impl LoginRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();

        if self.email.as_deref().map_or(true, |e| e.trim().is_empty()) {
            v.add("email", "El correo es obligatorio.");
        }
        if self.password.as_deref().map_or(true, str::is_empty) {
            v.add("password", "La contraseña es obligatoria.");
        }

        v.finish()
    }
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();

        if let Some(name) = self.name.as_deref().map(str::trim) {
            if name.is_empty() {
                v.add("name", "El nombre es obligatorio.");
            } else if name.chars().count() > 120 {
                v.add("name", "El nombre no puede superar 120 caracteres.");
            }
        }

        if let Some(email) = self.email.as_deref().map(str::trim) {
            if !is_valid_email(email) {
                v.add("email", "Correo inválido.");
            }
        }

        v.finish()
    }
}

impl UpdatePasswordRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();

        if self.current_password.as_deref().map_or(true, str::is_empty) {
            v.add("current_password", "La contraseña actual es obligatoria.");
        }

        match self.password.as_deref() {
            None | Some("") => v.add("password", "La contraseña es obligatoria."),
            Some(pass) if pass.chars().count() < 8 => {
                v.add("password", "La contraseña debe tener al menos 8 caracteres.")
            }
            _ => {}
        }

        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn register_requires_all_fields() {
        let req = RegisterRequest {
            name: None,
            email: Some("no-es-correo".to_string()),
            password: Some("corta".to_string()),
        };

        match req.validate() {
            Err(AppError::Validation { errors, .. }) => {
                assert!(errors.contains_key("name"));
                assert_eq!(errors["email"], vec!["Correo inválido."]);
                assert!(errors.contains_key("password"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn register_accepts_valid_payload() {
        let req = RegisterRequest {
            name: Some("Ana".to_string()),
            email: Some("ana@mese.co".to_string()),
            password: Some("secreta123".to_string()),
        };
        assert!(req.validate().is_ok());
    }
}
