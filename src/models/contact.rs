use serde::Deserialize;

use crate::error::Result;
use crate::utils::validation::{Validator, is_valid_email};

#[derive(Debug, Default, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl ContactRequest {
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
            Some(email) if email.chars().count() > 180 => {
                v.add("email", "El correo no puede superar 180 caracteres.")
            }
            Some(email) if !is_valid_email(email) => v.add("email", "Correo inválido."),
            _ => {}
        }

        match self.message.as_deref().map(str::trim) {
            None | Some("") => v.add("message", "El mensaje es obligatorio."),
            Some(message) if message.chars().count() > 3000 => {
                v.add("message", "El mensaje no puede superar 3000 caracteres.")
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
    fn requires_all_fields() {
        let req = ContactRequest::default();
        match req.validate() {
            Err(AppError::Validation { errors, .. }) => {
                assert!(errors.contains_key("name"));
                assert!(errors.contains_key("email"));
                assert!(errors.contains_key("message"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn accepts_valid_payload() {
        let req = ContactRequest {
            name: Some("Carlos".to_string()),
            email: Some("carlos@example.com".to_string()),
            message: Some("¿Tienen tallas grandes?".to_string()),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn caps_message_length() {
        let req = ContactRequest {
            name: Some("Carlos".to_string()),
            email: Some("carlos@example.com".to_string()),
            message: Some("x".repeat(3001)),
        };
        assert!(req.validate().is_err());
    }
}
