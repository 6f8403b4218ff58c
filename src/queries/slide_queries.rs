use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{CreateSlideRequest, ListSlidesQuery, Page, ReorderItem, Slide, UpdateSlideRequest},
    queries::page_params,
};

const DEFAULT_PAGE_SIZE: i64 = 15;

/// Active slides whose visibility window contains now; null bounds are
/// unbounded.
pub async fn public_slides(pool: &PgPool) -> Result<Vec<Slide>> {
    let slides = sqlx::query_as::<_, Slide>(
        "SELECT * FROM carousel_slides
         WHERE deleted_at IS NULL
           AND is_active = TRUE
           AND (starts_at IS NULL OR starts_at <= NOW())
           AND (ends_at IS NULL OR ends_at >= NOW())
         ORDER BY position ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(slides)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Slide>> {
    let slide = sqlx::query_as::<_, Slide>(
        "SELECT * FROM carousel_slides WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(slide)
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &ListSlidesQuery) {
    query.push(" WHERE deleted_at IS NULL");

    if let Some(search) = params.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        query.push(" AND (title ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR caption ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(active) = params.active_filter() {
        query.push(" AND is_active = ");
        query.push_bind(active);
    }
}

pub async fn list_slides(pool: &PgPool, params: &ListSlidesQuery) -> Result<Page<Slide>> {
    let mut count_query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM carousel_slides");
    push_filters(&mut count_query, params);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM carousel_slides");
    push_filters(&mut query, params);
    query.push(" ORDER BY position ASC, id ASC");

    let (page, per_page, offset) = page_params(params.page, params.per_page, DEFAULT_PAGE_SIZE);
    query.push(" LIMIT ");
    query.push_bind(per_page);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let slides = query.build_query_as::<Slide>().fetch_all(pool).await?;

    Ok(Page::new(slides, total, page, per_page))
}

/// Omitted position lands the slide after the current last one.
pub async fn create_slide(
    pool: &PgPool,
    req: &CreateSlideRequest,
    image_path: &str,
    mobile_image_path: Option<&str>,
) -> Result<Slide> {
    let position = match req.position {
        Some(position) => position,
        None => {
            sqlx::query_scalar::<_, Option<i32>>(
                "SELECT MAX(position) FROM carousel_slides WHERE deleted_at IS NULL",
            )
            .fetch_one(pool)
            .await?
            .unwrap_or(0)
                + 1
        }
    };

    let slide = sqlx::query_as::<_, Slide>(
        "INSERT INTO carousel_slides
             (title, alt, caption, button_text, button_url, image_path, mobile_image_path,
              position, is_active, starts_at, ends_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING *",
    )
    .bind(&req.title)
    .bind(&req.alt)
    .bind(&req.caption)
    .bind(&req.button_text)
    .bind(&req.button_url)
    .bind(image_path)
    .bind(mobile_image_path)
    .bind(position)
    .bind(req.is_active.unwrap_or(true))
    .bind(req.starts_at())
    .bind(req.ends_at())
    .fetch_one(pool)
    .await?;

    Ok(slide)
}

pub async fn update_slide(
    pool: &PgPool,
    id: i64,
    req: &UpdateSlideRequest,
    image_path: Option<&str>,
    mobile_image_path: Option<&str>,
) -> Result<Option<Slide>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE carousel_slides SET ");
    let mut has_fields = false;

    if let Some(title) = req.title.as_deref() {
        query.push("title = ");
        query.push_bind(title.to_string());
        has_fields = true;
    }
    if let Some(alt) = req.alt.as_deref() {
        if has_fields {
            query.push(", ");
        }
        query.push("alt = ");
        query.push_bind(alt.to_string());
        has_fields = true;
    }
    if let Some(caption) = req.caption.as_deref() {
        if has_fields {
            query.push(", ");
        }
        query.push("caption = ");
        query.push_bind(caption.to_string());
        has_fields = true;
    }
    if let Some(button_text) = req.button_text.as_deref() {
        if has_fields {
            query.push(", ");
        }
        query.push("button_text = ");
        query.push_bind(button_text.to_string());
        has_fields = true;
    }
    if let Some(button_url) = req.button_url.as_deref() {
        if has_fields {
            query.push(", ");
        }
        query.push("button_url = ");
        query.push_bind(button_url.to_string());
        has_fields = true;
    }
    if let Some(image_path) = image_path {
        if has_fields {
            query.push(", ");
        }
        query.push("image_path = ");
        query.push_bind(image_path.to_string());
        has_fields = true;
    }
    if let Some(mobile_image_path) = mobile_image_path {
        if has_fields {
            query.push(", ");
        }
        query.push("mobile_image_path = ");
        query.push_bind(mobile_image_path.to_string());
        has_fields = true;
    }
    if let Some(position) = req.position {
        if has_fields {
            query.push(", ");
        }
        query.push("position = ");
        query.push_bind(position);
        has_fields = true;
    }
    if let Some(is_active) = req.is_active {
        if has_fields {
            query.push(", ");
        }
        query.push("is_active = ");
        query.push_bind(is_active);
        has_fields = true;
    }
    if req.starts_at.is_some() {
        if has_fields {
            query.push(", ");
        }
        query.push("starts_at = ");
        query.push_bind(req.starts_at());
        has_fields = true;
    }
    if req.ends_at.is_some() {
        if has_fields {
            query.push(", ");
        }
        query.push("ends_at = ");
        query.push_bind(req.ends_at());
        has_fields = true;
    }

    if !has_fields {
        return find_by_id(pool, id).await;
    }

    query.push(", updated_at = NOW() WHERE id = ");
    query.push_bind(id);
    query.push(" AND deleted_at IS NULL RETURNING *");

    let slide = query.build_query_as::<Slide>().fetch_optional(pool).await?;

    Ok(slide)
}

pub async fn toggle_active(pool: &PgPool, id: i64) -> Result<Option<Slide>> {
    let slide = sqlx::query_as::<_, Slide>(
        "UPDATE carousel_slides SET is_active = NOT is_active, updated_at = NOW()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(slide)
}

pub async fn reorder(pool: &PgPool, items: &[ReorderItem]) -> Result<()> {
    let mut tx = pool.begin().await?;

    for item in items {
        sqlx::query(
            "UPDATE carousel_slides SET position = $1, updated_at = NOW()
             WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(item.position)
        .bind(item.id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Soft-deletes the slide and returns it so the caller can remove its
/// image files.
pub async fn soft_delete(pool: &PgPool, id: i64) -> Result<Option<Slide>> {
    let slide = sqlx::query_as::<_, Slide>(
        "UPDATE carousel_slides SET deleted_at = NOW(), updated_at = NOW()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(slide)
}
