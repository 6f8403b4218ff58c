use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::error::Result;
use crate::utils::validation::{Validator, parse_datetime};

// DB models

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Slide {
    pub id: i64,
    pub title: Option<String>,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub button_text: Option<String>,
    pub button_url: Option<String>,
    pub image_path: String,
    pub mobile_image_path: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

// Request types

#[derive(Debug, Default, Deserialize)]
pub struct CreateSlideRequest {
    pub title: Option<String>,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub button_text: Option<String>,
    pub button_url: Option<String>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

pub type UpdateSlideRequest = CreateSlideRequest;

#[derive(Debug, Deserialize)]
pub struct ReorderSlidesRequest {
    pub items: Vec<ReorderItem>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderItem {
    pub id: i64,
    pub position: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSlidesQuery {
    pub search: Option<String>,
    pub active: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListSlidesQuery {
    /// The admin panel sends `active=true|false|1|0` or an empty string for
    /// "all"; anything unparseable means no filter.
    pub fn active_filter(&self) -> Option<bool> {
        match self.active.as_deref().map(str::trim) {
            Some("true") | Some("1") => Some(true),
            Some("false") | Some("0") => Some(false),
            _ => None,
        }
    }
}

// Response types

#[derive(Debug, Serialize)]
pub struct SlideResponse {
    pub id: i64,
    pub title: Option<String>,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub button_text: Option<String>,
    pub button_url: Option<String>,
    pub is_active: bool,
    pub position: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub image_path: String,
    pub mobile_image_path: Option<String>,
    pub image_url: String,
    pub mobile_image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SlideResponse {
    pub fn new(slide: Slide, storage: &StorageConfig) -> Self {
        let image_url = storage.public_url(&slide.image_path);
        let mobile_image_url = slide
            .mobile_image_path
            .as_deref()
            .map(|path| storage.public_url(path));

        Self {
            id: slide.id,
            title: slide.title,
            alt: slide.alt,
            caption: slide.caption,
            button_text: slide.button_text,
            button_url: slide.button_url,
            is_active: slide.is_active,
            position: slide.position,
            starts_at: slide.starts_at,
            ends_at: slide.ends_at,
            image_path: slide.image_path,
            mobile_image_path: slide.mobile_image_path,
            image_url,
            mobile_image_url,
            updated_at: slide.updated_at,
        }
    }
}

impl CreateSlideRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();

        if let Some(title) = self.title.as_deref() {
            if title.chars().count() > 150 {
                v.add("title", "El título no puede superar 150 caracteres.");
            }
        }
        if let Some(alt) = self.alt.as_deref() {
            if alt.chars().count() > 150 {
                v.add("alt", "El texto alternativo no puede superar 150 caracteres.");
            }
        }
        if let Some(caption) = self.caption.as_deref() {
            if caption.chars().count() > 300 {
                v.add("caption", "La leyenda no puede superar 300 caracteres.");
            }
        }
        if let Some(text) = self.button_text.as_deref() {
            if text.chars().count() > 60 {
                v.add("button_text", "El texto del botón no puede superar 60 caracteres.");
            }
        }
        if let Some(url) = self.button_url.as_deref() {
            if !url.is_empty() {
                if url.chars().count() > 255 {
                    v.add("button_url", "La URL no puede superar 255 caracteres.");
                } else if !url.starts_with("http://") && !url.starts_with("https://") {
                    v.add("button_url", "La URL del botón no es válida.");
                }
            }
        }
        if let Some(position) = self.position {
            if position < 0 {
                v.add("position", "La posición no puede ser negativa.");
            }
        }

        let starts = match self.starts_at.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => match parse_datetime(raw) {
                Some(dt) => Some(dt),
                None => {
                    v.add("starts_at", "La fecha de inicio no es válida.");
                    None
                }
            },
            None => None,
        };
        let ends = match self.ends_at.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => match parse_datetime(raw) {
                Some(dt) => Some(dt),
                None => {
                    v.add("ends_at", "La fecha de fin no es válida.");
                    None
                }
            },
            None => None,
        };
        if let (Some(starts), Some(ends)) = (starts, ends) {
            if ends < starts {
                v.add("ends_at", "La fecha de fin debe ser posterior a la de inicio.");
            }
        }

        v.finish()
    }

    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        self.starts_at
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(parse_datetime)
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.ends_at
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(parse_datetime)
    }
}

impl ReorderSlidesRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();

        if self.items.is_empty() {
            v.add("items", "Debes incluir al menos un elemento.");
        }
        for (i, item) in self.items.iter().enumerate() {
            if item.position < 0 {
                v.add(
                    &format!("items.{}.position", i),
                    "La posición no puede ser negativa.",
                );
            }
        }

        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn window_must_be_ordered() {
        let req = CreateSlideRequest {
            starts_at: Some("2025-06-10T00:00:00Z".to_string()),
            ends_at: Some("2025-06-01T00:00:00Z".to_string()),
            ..Default::default()
        };
        match req.validate() {
            Err(AppError::Validation { errors, .. }) => {
                assert!(errors.contains_key("ends_at"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn accepts_datetime_local_values() {
        let req = CreateSlideRequest {
            starts_at: Some("2025-06-01T08:00".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
        assert!(req.starts_at().is_some());
    }

    #[test]
    fn button_url_must_be_http() {
        let req = CreateSlideRequest {
            button_url: Some("javascript:alert(1)".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn active_filter_parses_loosely() {
        let q = |active: &str| ListSlidesQuery {
            active: Some(active.to_string()),
            ..Default::default()
        };
        assert_eq!(q("true").active_filter(), Some(true));
        assert_eq!(q("0").active_filter(), Some(false));
        assert_eq!(q("").active_filter(), None);
        assert_eq!(q("maybe").active_filter(), None);
    }
}
