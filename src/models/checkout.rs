use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::validation::{Validator, is_valid_email};

// Request types

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub customer: CheckoutCustomer,
    #[serde(default)]
    pub items: Vec<CheckoutItemInput>,
    pub total_cents: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutCustomer {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutItemInput {
    pub product_id: Option<i64>,
    pub name: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub qty: Option<i64>,
    pub price_cents: Option<i64>,
    pub image: Option<String>,
}

/// A cart line after normalization: qty clamped to ≥ 1, price to ≥ 0,
/// name trimmed. Totals and the order email work off these.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutItem {
    pub product_id: Option<i64>,
    pub name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub qty: i64,
    pub price_cents: i64,
    pub image: Option<String>,
}

// Response types

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub ok: bool,
    pub order_code: String,
    pub total_cents: i64,
    pub bold_amount: i64,
    pub bold_currency: String,
    pub bold_signature: String,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();

        match self.customer.email.as_deref().map(str::trim) {
            None | Some("") => v.add("customer.email", "El correo es obligatorio."),
            Some(email) if !is_valid_email(email) => v.add("customer.email", "Correo inválido."),
            _ => {}
        }

        match self.customer.phone.as_deref().map(str::trim) {
            None | Some("") => v.add("customer.phone", "El teléfono es obligatorio."),
            Some(phone) if phone.chars().count() < 7 || phone.chars().count() > 20 => {
                v.add("customer.phone", "El teléfono debe tener entre 7 y 20 caracteres.")
            }
            _ => {}
        }

        match self.customer.address.as_deref().map(str::trim) {
            None | Some("") => v.add("customer.address", "La dirección es obligatoria."),
            Some(address) if address.chars().count() < 6 || address.chars().count() > 255 => {
                v.add("customer.address", "La dirección debe tener entre 6 y 255 caracteres.")
            }
            _ => {}
        }

        if self.items.is_empty() {
            v.add("items", "Debes incluir al menos un artículo.");
        }

        for (i, item) in self.items.iter().enumerate() {
            if item.product_id.is_none() {
                v.add(&format!("items.{}.product_id", i), "El producto es obligatorio.");
            }
            if let Some(name) = item.name.as_deref() {
                if name.chars().count() > 255 {
                    v.add(
                        &format!("items.{}.name", i),
                        "El nombre no puede superar 255 caracteres.",
                    );
                }
            }
            for (field, value) in [("size", &item.size), ("color", &item.color)] {
                if let Some(value) = value.as_deref() {
                    if value.chars().count() > 40 {
                        v.add(
                            &format!("items.{}.{}", i, field),
                            "No puede superar 40 caracteres.",
                        );
                    }
                }
            }
            match item.qty {
                None => v.add(&format!("items.{}.qty", i), "La cantidad es obligatoria."),
                Some(qty) if !(1..=100).contains(&qty) => {
                    v.add(&format!("items.{}.qty", i), "La cantidad debe estar entre 1 y 100.")
                }
                _ => {}
            }
            match item.price_cents {
                None => v.add(&format!("items.{}.price_cents", i), "El precio es obligatorio."),
                Some(price) if price < 0 => {
                    v.add(&format!("items.{}.price_cents", i), "El precio no puede ser negativo.")
                }
                _ => {}
            }
            if let Some(image) = item.image.as_deref() {
                if !image.is_empty()
                    && !image.starts_with("http://")
                    && !image.starts_with("https://")
                {
                    v.add(&format!("items.{}.image", i), "La imagen debe ser una URL.");
                }
            }
        }

        match self.total_cents {
            None => v.add("total_cents", "El total es obligatorio."),
            Some(total) if total < 0 => v.add("total_cents", "El total no puede ser negativo."),
            _ => {}
        }

        v.finish()
    }

    pub fn normalized_items(&self) -> Vec<CheckoutItem> {
        self.items
            .iter()
            .map(|item| CheckoutItem {
                product_id: item.product_id,
                name: item.name.as_deref().unwrap_or("").trim().to_string(),
                size: item.size.clone(),
                color: item.color.clone(),
                qty: item.qty.unwrap_or(1).max(1),
                price_cents: item.price_cents.unwrap_or(0).max(0),
                image: item.image.clone(),
            })
            .collect()
    }
}

pub fn server_total(items: &[CheckoutItem]) -> i64 {
    items
        .iter()
        .map(|item| item.price_cents * item.qty)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn item(qty: i64, price_cents: i64) -> CheckoutItemInput {
        CheckoutItemInput {
            product_id: Some(1),
            name: Some("Camiseta básica ".to_string()),
            qty: Some(qty),
            price_cents: Some(price_cents),
            ..Default::default()
        }
    }

    fn request(items: Vec<CheckoutItemInput>, total_cents: i64) -> CheckoutRequest {
        CheckoutRequest {
            customer: CheckoutCustomer {
                email: Some("cliente@example.com".to_string()),
                phone: Some("3001234567".to_string()),
                address: Some("Calle 10 # 5-23, Medellín".to_string()),
            },
            items,
            total_cents: Some(total_cents),
        }
    }

    #[test]
    fn total_is_sum_of_normalized_lines() {
        let req = request(vec![item(2, 5000000), item(1, 3500000)], 13500000);
        let items = req.normalized_items();
        assert_eq!(server_total(&items), 13500000);
    }

    #[test]
    fn normalization_clamps_and_trims() {
        let req = CheckoutRequest {
            items: vec![CheckoutItemInput {
                product_id: Some(9),
                name: Some("  Gorra  ".to_string()),
                qty: Some(0),
                price_cents: Some(-100),
                ..Default::default()
            }],
            ..Default::default()
        };

        let items = req.normalized_items();
        assert_eq!(items[0].name, "Gorra");
        assert_eq!(items[0].qty, 1);
        assert_eq!(items[0].price_cents, 0);
    }

    #[test]
    fn missing_qty_and_price_default_safely() {
        let req = CheckoutRequest {
            items: vec![CheckoutItemInput::default()],
            ..Default::default()
        };
        let items = req.normalized_items();
        assert_eq!(items[0].qty, 1);
        assert_eq!(items[0].price_cents, 0);
        assert_eq!(server_total(&items), 0);
    }

    #[test]
    fn validates_customer_and_items() {
        let req = CheckoutRequest {
            customer: CheckoutCustomer {
                email: Some("no-es-correo".to_string()),
                phone: Some("123".to_string()),
                address: Some("Corta".to_string()),
            },
            items: vec![],
            total_cents: None,
        };

        match req.validate() {
            Err(AppError::Validation { errors, .. }) => {
                assert_eq!(errors["customer.email"], vec!["Correo inválido."]);
                assert!(errors.contains_key("customer.phone"));
                assert!(errors.contains_key("customer.address"));
                assert_eq!(errors["items"], vec!["Debes incluir al menos un artículo."]);
                assert!(errors.contains_key("total_cents"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_out_of_range_qty() {
        let req = request(vec![item(101, 1000)], 101000);
        match req.validate() {
            Err(AppError::Validation { errors, .. }) => {
                assert!(errors.contains_key("items.0.qty"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn valid_request_passes() {
        let req = request(vec![item(2, 4500000)], 9000000);
        assert!(req.validate().is_ok());
    }
}
