use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{
        CreateProductRequest, Gender, ListProductsQuery, Page, Product, ProductImage, Status,
        UpdateProductRequest,
    },
    queries::page_params,
};

const DEFAULT_PAGE_SIZE: i64 = 12;

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Product>> {
    let product =
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(product)
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE slug = $1 AND deleted_at IS NULL",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

async fn slug_exists(pool: &PgPool, slug: &str, ignore_id: Option<i64>) -> Result<bool> {
    let exists = match ignore_id {
        Some(id) => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE slug = $1 AND id != $2)",
            )
            .bind(slug)
            .bind(id)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE slug = $1)")
                .bind(slug)
                .fetch_one(pool)
                .await?
        }
    };

    Ok(exists)
}

/// Collisions consider soft-deleted rows too.
pub async fn unique_slug(pool: &PgPool, base: &str, ignore_id: Option<i64>) -> Result<String> {
    let base = if base.is_empty() { "producto" } else { base };
    let mut slug = base.to_string();
    let mut n = 2;

    while slug_exists(pool, &slug, ignore_id).await? {
        slug = format!("{}-{}", base, n);
        n += 1;
    }

    Ok(slug)
}

fn push_filters(
    query: &mut QueryBuilder<'_, Postgres>,
    params: &ListProductsQuery,
    category_id: Option<i64>,
) {
    query.push(" WHERE deleted_at IS NULL");

    if let Some(search) = params.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        query.push(" AND (name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR slug ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(category_id) = category_id {
        query.push(" AND category_id = ");
        query.push_bind(category_id);
    }

    if let Some(gender) = params.gender.as_deref().and_then(Gender::normalize) {
        query.push(" AND gender = ");
        query.push_bind(gender);
    }

    if let Some(status) = params.status {
        query.push(" AND status = ");
        query.push_bind(status);
    }
}

/// Newest first, paginated. `category_slug` narrows to one category; an
/// unknown slug (or a slug that contradicts `category_id`) yields an
/// empty page instead of the whole catalog.
pub async fn list_products(pool: &PgPool, params: &ListProductsQuery) -> Result<Page<Product>> {
    let mut category_id = params.category_id;

    if let Some(slug) = params.category_slug.as_deref().filter(|s| !s.trim().is_empty()) {
        match crate::queries::category_queries::find_by_slug(pool, slug.trim()).await? {
            Some(category) if category_id.is_none_or(|id| id == category.id) => {
                category_id = Some(category.id);
            }
            _ => {
                let (page, per_page, _) =
                    page_params(params.page, params.per_page, DEFAULT_PAGE_SIZE);
                return Ok(Page::new(Vec::new(), 0, page, per_page));
            }
        }
    }

    let mut count_query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM products");
    push_filters(&mut count_query, params, category_id);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products");
    push_filters(&mut query, params, category_id);
    query.push(" ORDER BY id DESC");

    let (page, per_page, offset) = page_params(params.page, params.per_page, DEFAULT_PAGE_SIZE);
    query.push(" LIMIT ");
    query.push_bind(per_page);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let products = query.build_query_as::<Product>().fetch_all(pool).await?;

    Ok(Page::new(products, total, page, per_page))
}

pub async fn find_images(pool: &PgPool, product_id: i64) -> Result<Vec<ProductImage>> {
    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT * FROM product_images WHERE product_id = $1 ORDER BY position ASC, id ASC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(images)
}

pub async fn find_images_for_products(
    pool: &PgPool,
    product_ids: &[i64],
) -> Result<HashMap<i64, Vec<ProductImage>>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT * FROM product_images
         WHERE product_id = ANY($1)
         ORDER BY product_id, position ASC, id ASC",
    )
    .bind(product_ids)
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<i64, Vec<ProductImage>> = HashMap::new();
    for image in images {
        map.entry(image.product_id).or_default().push(image);
    }

    Ok(map)
}

/// Inserts the product and its gallery rows in one transaction. `images`
/// carries (path, alt) pairs in upload order.
pub async fn create_product_with_images(
    pool: &PgPool,
    req: &CreateProductRequest,
    slug: &str,
    main_image_path: Option<&str>,
    images: &[(String, Option<String>)],
) -> Result<Product> {
    let mut tx = pool.begin().await?;

    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products
             (category_id, name, slug, reference, description, price_cents, size, color,
              gender, status, main_image_path, main_image_alt)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         RETURNING *",
    )
    .bind(req.category_id.unwrap_or_default())
    .bind(req.name.as_deref().unwrap_or("").trim())
    .bind(slug)
    .bind(&req.reference)
    .bind(&req.description)
    .bind(req.price_cents.unwrap_or(0))
    .bind(&req.size)
    .bind(&req.color)
    .bind(req.gender())
    .bind(req.status.unwrap_or(Status::Published))
    .bind(main_image_path)
    .bind(&req.main_image_alt)
    .fetch_one(&mut *tx)
    .await?;

    for (i, (path, alt)) in images.iter().enumerate() {
        sqlx::query(
            "INSERT INTO product_images (product_id, path, alt, position) VALUES ($1, $2, $3, $4)",
        )
        .bind(product.id)
        .bind(path)
        .bind(alt)
        .bind(i as i32)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(product)
}

/// Partial update plus gallery maintenance in one transaction. Returns
/// the updated product and the storage paths of removed gallery rows so
/// the caller can delete the files after commit.
///
/// `main_image` is None to leave the main image alone, Some(None) to
/// clear it, Some(Some(path)) to replace it. New gallery images append
/// after the current max position; `images_order` rewrites positions by
/// index.
pub async fn update_product_with_gallery(
    pool: &PgPool,
    id: i64,
    req: &UpdateProductRequest,
    slug: Option<&str>,
    main_image: Option<Option<&str>>,
    new_images: &[(String, Option<String>)],
) -> Result<Option<(Product, Vec<String>)>> {
    let mut tx = pool.begin().await?;

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE products SET ");
    let mut has_fields = false;

    if let Some(category_id) = req.category_id {
        query.push("category_id = ");
        query.push_bind(category_id);
        has_fields = true;
    }
    if let Some(name) = req.name.as_deref() {
        if has_fields {
            query.push(", ");
        }
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
    if let Some(reference) = req.reference.as_deref() {
        if has_fields {
            query.push(", ");
        }
        query.push("reference = ");
        query.push_bind(reference.to_string());
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
    if let Some(price_cents) = req.price_cents {
        if has_fields {
            query.push(", ");
        }
        query.push("price_cents = ");
        query.push_bind(price_cents);
        has_fields = true;
    }
    if let Some(size) = req.size.as_deref() {
        if has_fields {
            query.push(", ");
        }
        query.push("size = ");
        query.push_bind(size.to_string());
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
    if let Some(gender) = req.gender() {
        if has_fields {
            query.push(", ");
        }
        query.push("gender = ");
        query.push_bind(gender);
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
    if let Some(main_image_alt) = req.main_image_alt.as_deref() {
        if has_fields {
            query.push(", ");
        }
        query.push("main_image_alt = ");
        query.push_bind(main_image_alt.to_string());
        has_fields = true;
    }
    if let Some(main_image) = main_image {
        if has_fields {
            query.push(", ");
        }
        query.push("main_image_path = ");
        query.push_bind(main_image.map(str::to_string));
        has_fields = true;
    }

    let product = if has_fields {
        query.push(", updated_at = NOW() WHERE id = ");
        query.push_bind(id);
        query.push(" AND deleted_at IS NULL RETURNING *");

        query
            .build_query_as::<Product>()
            .fetch_optional(&mut *tx)
            .await?
    } else {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
    };

    let product = match product {
        Some(p) => p,
        None => {
            tx.commit().await?;
            return Ok(None);
        }
    };

    if !new_images.is_empty() {
        let base: i32 = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(position) FROM product_images WHERE product_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?
        .unwrap_or(0)
            + 1;

        for (i, (path, alt)) in new_images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_images (product_id, path, alt, position)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(path)
            .bind(alt)
            .bind(base + i as i32)
            .execute(&mut *tx)
            .await?;
        }
    }

    let mut removed_paths = Vec::new();
    if !req.remove_image_ids.is_empty() {
        removed_paths = sqlx::query_scalar::<_, String>(
            "SELECT path FROM product_images WHERE product_id = $1 AND id = ANY($2)",
        )
        .bind(id)
        .bind(&req.remove_image_ids)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM product_images WHERE product_id = $1 AND id = ANY($2)")
            .bind(id)
            .bind(&req.remove_image_ids)
            .execute(&mut *tx)
            .await?;
    }

    for (position, image_id) in req.images_order.iter().enumerate() {
        sqlx::query(
            "UPDATE product_images SET position = $1, updated_at = NOW()
             WHERE product_id = $2 AND id = $3",
        )
        .bind(position as i32)
        .bind(id)
        .bind(image_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(Some((product, removed_paths)))
}

/// Soft-deletes the product and returns the storage paths of its main
/// image and gallery so the caller can remove the files afterwards.
pub async fn soft_delete(pool: &PgPool, id: i64) -> Result<Option<(Product, Vec<String>)>> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET deleted_at = NOW(), updated_at = NOW()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let product = match product {
        Some(product) => product,
        None => return Ok(None),
    };

    let mut paths =
        sqlx::query_scalar::<_, String>("SELECT path FROM product_images WHERE product_id = $1")
            .bind(id)
            .fetch_all(pool)
            .await?;

    if let Some(main) = product.main_image_path.clone() {
        paths.push(main);
    }

    Ok(Some((product, paths)))
}
