use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{ListProductsQuery, Page, ProductResponse},
    queries::{category_queries, product_queries},
};

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListProductsQuery>,
) -> Result<Json<Page<ProductResponse>>> {
    let page = product_queries::list_products(&state.db, &params).await?;

    let product_ids: Vec<i64> = page.data.iter().map(|p| p.id).collect();
    let category_ids: Vec<i64> = page.data.iter().map(|p| p.category_id).collect();

    let mut images = product_queries::find_images_for_products(&state.db, &product_ids).await?;
    let categories = category_queries::find_refs(&state.db, &category_ids).await?;

    Ok(Json(page.map(|product| {
        let category = categories.get(&product.category_id).cloned();
        let gallery = images.remove(&product.id).unwrap_or_default();
        ProductResponse::new(product, category, gallery, &state.storage)
    })))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductResponse>> {
    let product = product_queries::find_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Producto no encontrado.".to_string()))?;

    let images = product_queries::find_images(&state.db, product.id).await?;
    let category = category_queries::find_refs(&state.db, &[product.category_id])
        .await?
        .remove(&product.category_id);

    Ok(Json(ProductResponse::new(
        product,
        category,
        images,
        &state.storage,
    )))
}
