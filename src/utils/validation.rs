use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{AppError, Result};

/// Collects per-field validation messages and turns them into a single
/// 422 response, keyed the way the admin panel renders form errors.
#[derive(Debug, Default)]
pub struct Validator {
    errors: BTreeMap<String, Vec<String>>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(self.errors))
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    if value.contains(char::is_whitespace) {
        return false;
    }

    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

/// Parses the datetime formats the admin forms submit: RFC 3339, or a
/// naive `datetime-local` value which is taken as UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_collects_messages_per_field() {
        let mut v = Validator::new();
        v.add("email", "Correo inválido.");
        v.add("email", "El correo es obligatorio.");
        v.add("name", "El nombre es obligatorio.");

        match v.finish() {
            Err(AppError::Validation { errors, .. }) => {
                assert_eq!(errors["email"].len(), 2);
                assert_eq!(errors["name"], vec!["El nombre es obligatorio."]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn empty_validator_passes() {
        assert!(Validator::new().finish().is_ok());
    }

    #[test]
    fn email_accepts_normal_addresses() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("ventas+tienda@mese.co"));
    }

    #[test]
    fn email_rejects_malformed_addresses() {
        assert!(!is_valid_email("sin-arroba"));
        assert!(!is_valid_email("@dominio.com"));
        assert!(!is_valid_email("ana@sindominio"));
        assert!(!is_valid_email("ana@.com"));
        assert!(!is_valid_email("ana con espacios@x.co"));
        assert!(!is_valid_email("dos@arrobas@x.co"));
    }

    #[test]
    fn parses_rfc3339_and_local_formats() {
        assert!(parse_datetime("2025-06-01T10:30:00Z").is_some());
        assert!(parse_datetime("2025-06-01T10:30:00-05:00").is_some());
        assert!(parse_datetime("2025-06-01T10:30").is_some());
        assert!(parse_datetime("2025-06-01 10:30:00").is_some());
        assert!(parse_datetime("junio primero").is_none());
    }
}
