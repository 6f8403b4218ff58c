use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{CategoryResponse, ListCategoriesQuery, Page},
    queries::category_queries,
};

pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<ListCategoriesQuery>,
) -> Result<Json<Page<CategoryResponse>>> {
    let page = category_queries::list_categories(&state.db, &params).await?;

    Ok(Json(page.map(|category| {
        CategoryResponse::new(category, &state.storage)
    })))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryResponse>> {
    let category = category_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Categoría no encontrada.".to_string()))?;

    Ok(Json(CategoryResponse::new(category, &state.storage)))
}
