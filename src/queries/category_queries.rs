use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{
        Category, CategoryRef, CreateCategoryRequest, ListCategoriesQuery, Page, Status,
        UpdateCategoryRequest,
    },
    queries::page_params,
};

const DEFAULT_PAGE_SIZE: i64 = 12;

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Category>> {
    let category =
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(category)
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT * FROM categories WHERE slug = $1 AND deleted_at IS NULL",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(category)
}

/// Embedded `{id, name, slug}` refs for a batch of products.
pub async fn find_refs(pool: &PgPool, ids: &[i64]) -> Result<HashMap<i64, CategoryRef>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let refs = sqlx::query_as::<_, CategoryRef>(
        "SELECT id, name, slug FROM categories WHERE id = ANY($1) AND deleted_at IS NULL",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(refs.into_iter().map(|r| (r.id, r)).collect())
}

/// Slug collisions consider soft-deleted rows too, otherwise restoring a
/// trashed category would violate the unique index.
async fn slug_exists(pool: &PgPool, slug: &str, ignore_id: Option<i64>) -> Result<bool> {
    let exists = match ignore_id {
        Some(id) => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM categories WHERE slug = $1 AND id != $2)",
            )
            .bind(slug)
            .bind(id)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE slug = $1)")
                .bind(slug)
                .fetch_one(pool)
                .await?
        }
    };

    Ok(exists)
}

pub async fn unique_slug(pool: &PgPool, base: &str, ignore_id: Option<i64>) -> Result<String> {
    let base = if base.is_empty() { "categoria" } else { base };
    let mut slug = base.to_string();
    let mut n = 2;

    while slug_exists(pool, &slug, ignore_id).await? {
        slug = format!("{}-{}", base, n);
        n += 1;
    }

    Ok(slug)
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &ListCategoriesQuery) {
    query.push(" WHERE deleted_at IS NULL");

    if let Some(search) = params.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        query.push(" AND (name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR slug ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR subtitle ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(status) = params.status {
        query.push(" AND status = ");
        query.push_bind(status);
    }

    if let Some(is_featured) = params.is_featured {
        query.push(" AND is_featured = ");
        query.push_bind(is_featured);
    }
}

// Sort columns are interpolated, so they go through a whitelist.
fn sort_clause(params: &ListCategoriesQuery) -> (&'static str, &'static str) {
    let column = match params.sort_by.as_deref() {
        Some("name") => "name",
        Some("id") => "id",
        Some("created_at") => "created_at",
        _ => "position",
    };
    let direction = match params.sort_dir.as_deref() {
        Some("desc") => "DESC",
        _ => "ASC",
    };
    (column, direction)
}

pub async fn list_categories(
    pool: &PgPool,
    params: &ListCategoriesQuery,
) -> Result<Page<Category>> {
    let mut count_query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM categories");
    push_filters(&mut count_query, params);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM categories");
    push_filters(&mut query, params);

    let (column, direction) = sort_clause(params);
    query.push(format!(" ORDER BY {} {}, id ASC", column, direction));

    let (page, per_page, offset) = page_params(params.page, params.per_page, DEFAULT_PAGE_SIZE);
    query.push(" LIMIT ");
    query.push_bind(per_page);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let categories = query.build_query_as::<Category>().fetch_all(pool).await?;

    Ok(Page::new(categories, total, page, per_page))
}

pub async fn create_category(
    pool: &PgPool,
    req: &CreateCategoryRequest,
    slug: &str,
    image_path: Option<&str>,
) -> Result<Category> {
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories
             (name, slug, subtitle, description, color, position, is_featured, status,
              image_path, image_alt)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING *",
    )
    .bind(req.name.as_deref().unwrap_or("").trim())
    .bind(slug)
    .bind(&req.subtitle)
    .bind(&req.description)
    .bind(&req.color)
    .bind(req.position.unwrap_or(0))
    .bind(req.is_featured.unwrap_or(false))
    .bind(req.status.unwrap_or(Status::Published))
    .bind(image_path)
    .bind(&req.image_alt)
    .fetch_one(pool)
    .await?;

    Ok(category)
}

/// Partial update. `slug` is the recomputed slug when the name or slug
/// changed; `image_path` is None to leave the image alone, Some(None) to
/// clear it, Some(Some(path)) to replace it.
pub async fn update_category(
    pool: &PgPool,
    id: i64,
    req: &UpdateCategoryRequest,
    slug: Option<&str>,
    image_path: Option<Option<&str>>,
) -> Result<Option<Category>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE categories SET ");
    let mut has_fields = false;

    if let Some(name) = req.name.as_deref() {
        query.push("name = ");
        query.push_bind(name.trim().to_string());
        has_fields = true;
    }
    if let Some(slug) = slug {
        if has_fields {
            query.push(", ");
        }
        query.push("slug = ");
        query.push_bind(slug.to_string());
        has_fields = true;
    }
    if let Some(subtitle) = req.subtitle.as_deref() {
        if has_fields {
            query.push(", ");
        }
        query.push("subtitle = ");
        query.push_bind(subtitle.to_string());
        has_fields = true;
    }
    if let Some(description) = req.description.as_deref() {
        if has_fields {
            query.push(", ");
        }
        query.push("description = ");
        query.push_bind(description.to_string());
        has_fields = true;
    }
    if let Some(color) = req.color.as_deref() {
        if has_fields {
            query.push(", ");
        }
        query.push("color = ");
        query.push_bind(color.to_string());
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
    if let Some(is_featured) = req.is_featured {
        if has_fields {
            query.push(", ");
        }
        query.push("is_featured = ");
        query.push_bind(is_featured);
        has_fields = true;
    }
    if let Some(status) = req.status {
        if has_fields {
            query.push(", ");
        }
        query.push("status = ");
        query.push_bind(status);
        has_fields = true;
    }
    if let Some(image_alt) = req.image_alt.as_deref() {
        if has_fields {
            query.push(", ");
        }
        query.push("image_alt = ");
        query.push_bind(image_alt.to_string());
        has_fields = true;
    }
    if let Some(image_path) = image_path {
        if has_fields {
            query.push(", ");
        }
        query.push("image_path = ");
        query.push_bind(image_path.map(str::to_string));
        has_fields = true;
    }

    if !has_fields {
        return find_by_id(pool, id).await;
    }

    query.push(", updated_at = NOW() WHERE id = ");
    query.push_bind(id);
    query.push(" AND deleted_at IS NULL RETURNING *");

    let category = query
        .build_query_as::<Category>()
        .fetch_optional(pool)
        .await?;

    Ok(category)
}

pub async fn toggle_featured(pool: &PgPool, id: i64) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET is_featured = NOT is_featured, updated_at = NOW()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(category)
}

/// Soft-deletes the row and returns it so the caller can clean up the
/// stored image file.
pub async fn soft_delete(pool: &PgPool, id: i64) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET deleted_at = NOW(), updated_at = NOW()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(category)
}
