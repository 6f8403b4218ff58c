use axum::{Json, extract::State};

use crate::{
    AppState,
    error::Result,
    models::SlideResponse,
    queries::slide_queries,
};

/// Slides the storefront carousel shows: active and inside their
/// visibility window, in position order.
pub async fn public_slides(State(state): State<AppState>) -> Result<Json<Vec<SlideResponse>>> {
    let slides = slide_queries::public_slides(&state.db).await?;

    let data = slides
        .into_iter()
        .map(|slide| SlideResponse::new(slide, &state.storage))
        .collect();

    Ok(Json(data))
}
