use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::error::Result;
use crate::models::Status;
use crate::utils::validation::Validator;

// DB models

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub position: i32,
    pub is_featured: bool,
    pub status: Status,
    pub image_path: Option<String>,
    pub image_alt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

// Request types

#[derive(Debug, Default, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub position: Option<i32>,
    pub is_featured: Option<bool>,
    pub status: Option<Status>,
    pub image_alt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub position: Option<i32>,
    pub is_featured: Option<bool>,
    pub status: Option<Status>,
    pub image_alt: Option<String>,
    /// Sending the key with an empty value clears the stored image.
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCategoriesQuery {
    pub search: Option<String>,
    pub status: Option<Status>,
    pub is_featured: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

// Response types

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub position: i32,
    pub is_featured: bool,
    pub status: Status,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryResponse {
    pub fn new(category: Category, storage: &StorageConfig) -> Self {
        let image_url = category
            .image_path
            .as_deref()
            .map(|path| storage.public_url(path));

        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            subtitle: category.subtitle,
            description: category.description,
            color: category.color,
            position: category.position,
            is_featured: category.is_featured,
            status: category.status,
            image_url,
            image_alt: category.image_alt,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

fn check_common_fields(
    v: &mut Validator,
    slug: Option<&str>,
    subtitle: Option<&str>,
    color: Option<&str>,
    position: Option<i32>,
    image_alt: Option<&str>,
) {
    if let Some(slug) = slug {
        if slug.chars().count() > 160 {
            v.add("slug", "El slug no puede superar 160 caracteres.");
        }
    }
    if let Some(subtitle) = subtitle {
        if subtitle.chars().count() > 160 {
            v.add("subtitle", "El subtítulo no puede superar 160 caracteres.");
        }
    }
    if let Some(color) = color {
        if color.chars().count() > 24 {
            v.add("color", "El color no puede superar 24 caracteres.");
        }
    }
    if let Some(position) = position {
        if position < 0 {
            v.add("position", "La posición no puede ser negativa.");
        }
    }
    if let Some(alt) = image_alt {
        if alt.chars().count() > 160 {
            v.add("image_alt", "El texto alternativo no puede superar 160 caracteres.");
        }
    }
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();

        match self.name.as_deref().map(str::trim) {
            None | Some("") => v.add("name", "El nombre es obligatorio."),
            Some(name) if name.chars().count() > 120 => {
                v.add("name", "El nombre no puede superar 120 caracteres.")
            }
            _ => {}
        }

        check_common_fields(
            &mut v,
            self.slug.as_deref(),
            self.subtitle.as_deref(),
            self.color.as_deref(),
            self.position,
            self.image_alt.as_deref(),
        );

        v.finish()
    }
}

impl UpdateCategoryRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();

        if let Some(name) = self.name.as_deref().map(str::trim) {
            if name.is_empty() {
                v.add("name", "El nombre es obligatorio.");
            } else if name.chars().count() > 120 {
                v.add("name", "El nombre no puede superar 120 caracteres.");
            }
        }

        check_common_fields(
            &mut v,
            self.slug.as_deref(),
            self.subtitle.as_deref(),
            self.color.as_deref(),
            self.position,
            self.image_alt.as_deref(),
        );

        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn create_requires_name() {
        let req = CreateCategoryRequest::default();
        match req.validate() {
            Err(AppError::Validation { errors, .. }) => {
                assert_eq!(errors["name"], vec!["El nombre es obligatorio."]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn update_allows_partial_payload() {
        let req = UpdateCategoryRequest {
            subtitle: Some("Nueva colección".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_negative_position() {
        let req = UpdateCategoryRequest {
            position: Some(-1),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
