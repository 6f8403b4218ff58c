use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::error::Result;
use crate::models::Status;
use crate::utils::validation::Validator;

// DB models

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Accepts the labels older admin forms submit alongside the canonical
    /// values.
    pub fn normalize(value: &str) -> Option<Gender> {
        match value.trim().to_lowercase().as_str() {
            "male" | "m" | "h" | "hombre" => Some(Gender::Male),
            "female" | "f" | "mujer" => Some(Gender::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub slug: String,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub price_cents: i64,
    pub size: Option<String>,
    pub color: Option<String>,
    pub gender: Gender,
    pub status: Status,
    pub main_image_path: Option<String>,
    pub main_image_alt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: i64,
    pub product_id: i64,
    pub path: String,
    pub alt: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Request types

#[derive(Debug, Default, Deserialize)]
pub struct CreateProductRequest {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub reference: Option<String>,
    pub gender: Option<String>,
    pub status: Option<Status>,
    pub main_image_alt: Option<String>,
    #[serde(default)]
    pub images_alt: Vec<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub reference: Option<String>,
    pub gender: Option<String>,
    pub status: Option<Status>,
    pub main_image_alt: Option<String>,
    /// Sending the key with an empty value clears the stored main image.
    pub main_image: Option<String>,
    #[serde(default)]
    pub images_alt: Vec<Option<String>>,
    #[serde(default)]
    pub remove_image_ids: Vec<i64>,
    #[serde(default)]
    pub images_order: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub category_slug: Option<String>,
    pub gender: Option<String>,
    pub status: Option<Status>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

// Response types

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct ProductImageResponse {
    pub id: i64,
    pub url: String,
    pub alt: Option<String>,
    pub position: i32,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub category_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub price_cop: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub reference: Option<String>,
    pub gender: Gender,
    pub status: Status,
    pub main_image_url: Option<String>,
    pub main_image_alt: Option<String>,
    pub images: Vec<ProductImageResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    pub fn new(
        product: Product,
        category: Option<CategoryRef>,
        images: Vec<ProductImage>,
        storage: &StorageConfig,
    ) -> Self {
        let main_image_url = product
            .main_image_path
            .as_deref()
            .map(|path| storage.public_url(path));

        let images = images
            .into_iter()
            .map(|image| ProductImageResponse {
                id: image.id,
                url: storage.public_url(&image.path),
                alt: image.alt,
                position: image.position,
            })
            .collect();

        Self {
            id: product.id,
            category_id: product.category_id,
            category,
            name: product.name,
            slug: product.slug,
            description: product.description,
            price_cop: format_cop(product.price_cents),
            price_cents: product.price_cents,
            size: product.size,
            color: product.color,
            reference: product.reference,
            gender: product.gender,
            status: product.status,
            main_image_url,
            main_image_alt: product.main_image_alt,
            images,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Formats a minor-unit amount as Colombian pesos without decimals,
/// dot-separated thousands: 12000000 → "$120.000".
pub fn format_cop(price_cents: i64) -> String {
    let pesos = (price_cents + 50) / 100;
    let digits = pesos.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if pesos < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

fn check_common_fields(
    v: &mut Validator,
    name: Option<&str>,
    slug: Option<&str>,
    price_cents: Option<i64>,
    main_image_alt: Option<&str>,
    images_alt: &[Option<String>],
) {
    if let Some(name) = name {
        if name.chars().count() > 160 {
            v.add("name", "El nombre no puede superar 160 caracteres.");
        }
    }
    if let Some(slug) = slug {
        if slug.chars().count() > 180 {
            v.add("slug", "El slug no puede superar 180 caracteres.");
        }
    }
    if let Some(price) = price_cents {
        if price < 0 {
            v.add("price_cents", "El precio no puede ser negativo.");
        }
    }
    if let Some(alt) = main_image_alt {
        if alt.chars().count() > 160 {
            v.add(
                "main_image_alt",
                "El texto alternativo no puede superar 160 caracteres.",
            );
        }
    }
    for (i, alt) in images_alt.iter().enumerate() {
        if let Some(alt) = alt {
            if alt.chars().count() > 160 {
                v.add(
                    &format!("images_alt.{}", i),
                    "El texto alternativo no puede superar 160 caracteres.",
                );
            }
        }
    }
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();

        if self.category_id.is_none() {
            v.add("category_id", "La categoría es obligatoria.");
        }

        if self.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            v.add("name", "El nombre es obligatorio.");
        }

        match self.gender.as_deref() {
            None | Some("") => v.add("gender", "El género es obligatorio."),
            Some(raw) if Gender::normalize(raw).is_none() => {
                v.add("gender", "El género debe ser male o female.")
            }
            _ => {}
        }

        check_common_fields(
            &mut v,
            self.name.as_deref(),
            self.slug.as_deref(),
            self.price_cents,
            self.main_image_alt.as_deref(),
            &self.images_alt,
        );

        v.finish()
    }

    pub fn gender(&self) -> Gender {
        self.gender
            .as_deref()
            .and_then(Gender::normalize)
            .unwrap_or(Gender::Male)
    }
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();

        if let Some(name) = self.name.as_deref() {
            if name.trim().is_empty() {
                v.add("name", "El nombre es obligatorio.");
            }
        }

        if let Some(raw) = self.gender.as_deref() {
            if !raw.is_empty() && Gender::normalize(raw).is_none() {
                v.add("gender", "El género debe ser male o female.");
            }
        }

        check_common_fields(
            &mut v,
            self.name.as_deref(),
            self.slug.as_deref(),
            self.price_cents,
            self.main_image_alt.as_deref(),
            &self.images_alt,
        );

        v.finish()
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender.as_deref().and_then(Gender::normalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn gender_normalizes_aliases() {
        assert_eq!(Gender::normalize("hombre"), Some(Gender::Male));
        assert_eq!(Gender::normalize("H"), Some(Gender::Male));
        assert_eq!(Gender::normalize(" Mujer "), Some(Gender::Female));
        assert_eq!(Gender::normalize("female"), Some(Gender::Female));
        assert_eq!(Gender::normalize("unisex"), None);
    }

    #[test]
    fn formats_cop_amounts() {
        assert_eq!(format_cop(0), "$0");
        assert_eq!(format_cop(99900), "$999");
        assert_eq!(format_cop(12000000), "$120.000");
        assert_eq!(format_cop(123456700), "$1.234.567");
    }

    #[test]
    fn create_requires_category_name_and_gender() {
        let req = CreateProductRequest::default();
        match req.validate() {
            Err(AppError::Validation { errors, .. }) => {
                assert!(errors.contains_key("category_id"));
                assert!(errors.contains_key("name"));
                assert!(errors.contains_key("gender"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn create_rejects_unknown_gender() {
        let req = CreateProductRequest {
            category_id: Some(1),
            name: Some("Camiseta".to_string()),
            gender: Some("unisex".to_string()),
            ..Default::default()
        };
        match req.validate() {
            Err(AppError::Validation { errors, .. }) => {
                assert_eq!(errors["gender"], vec!["El género debe ser male o female."]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn update_accepts_partial_payload() {
        let req = UpdateProductRequest {
            price_cents: Some(4990000),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }
}
