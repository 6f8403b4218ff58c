use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
};
use serde_json::json;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        CategoryRef, CategoryResponse, CreateCategoryRequest, CreateProductRequest,
        CreateSlideRequest, ListSlidesQuery, Page, ProductResponse, ReorderSlidesRequest,
        SlideResponse, Status, UpdateCategoryRequest, UpdateProductRequest,
    },
    queries::{category_queries, product_queries, slide_queries},
    services::{storage_service, storage_service::UploadedFile},
    utils::{
        forms::{FilePart, FormData, parse_bool},
        slug::slugify,
        validation::Validator,
    },
};

const IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/avif",
];

// The carousel renderer has no AVIF fallback, so slides stay on the
// narrower list.
const SLIDE_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

//SLIDE ROUTES

pub async fn list_slides(
    State(state): State<AppState>,
    Query(params): Query<ListSlidesQuery>,
) -> Result<Json<Page<SlideResponse>>> {
    let page = slide_queries::list_slides(&state.db, &params).await?;
    Ok(Json(
        page.map(|slide| SlideResponse::new(slide, &state.storage)),
    ))
}

pub async fn create_slide(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SlideResponse>)> {
    let form = FormData::read(multipart).await?;
    let req = slide_request_from_form(&form)?;
    req.validate()?;

    let image = form
        .file("image")
        .ok_or_else(|| field_error("image", "La imagen es obligatoria."))?;
    check_slide_images(&form)?;

    let image_path = storage_service::store_image(&state.storage, image, "carousel").await?;
    let mobile_path = match form.file("mobile_image") {
        Some(file) => Some(storage_service::store_image(&state.storage, file, "carousel").await?),
        None => None,
    };

    let slide =
        slide_queries::create_slide(&state.db, &req, &image_path, mobile_path.as_deref()).await?;
    tracing::info!("Created slide {}", slide.id);

    Ok((
        StatusCode::CREATED,
        Json(SlideResponse::new(slide, &state.storage)),
    ))
}

pub async fn update_slide(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<SlideResponse>> {
    let existing = slide_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Slide no encontrado.".to_string()))?;

    let form = FormData::read(multipart).await?;
    let req = slide_request_from_form(&form)?;
    req.validate()?;
    check_slide_images(&form)?;

    // Slide images are only ever replaced; a bare key does not clear them.
    let image_path = match form.file("image") {
        Some(file) => Some(storage_service::store_image(&state.storage, file, "carousel").await?),
        None => None,
    };
    let mobile_path = match form.file("mobile_image") {
        Some(file) => Some(storage_service::store_image(&state.storage, file, "carousel").await?),
        None => None,
    };

    let slide = slide_queries::update_slide(
        &state.db,
        id,
        &req,
        image_path.as_deref(),
        mobile_path.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Slide no encontrado.".to_string()))?;

    // Old files go only after the row points at the new ones.
    if image_path.is_some() {
        storage_service::delete_file(&state.storage, &existing.image_path).await;
    }
    if mobile_path.is_some() {
        if let Some(old) = existing.mobile_image_path.as_deref() {
            storage_service::delete_file(&state.storage, old).await;
        }
    }

    Ok(Json(SlideResponse::new(slide, &state.storage)))
}

pub async fn toggle_slide(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SlideResponse>> {
    let slide = slide_queries::toggle_active(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Slide no encontrado.".to_string()))?;

    Ok(Json(SlideResponse::new(slide, &state.storage)))
}

pub async fn reorder_slides(
    State(state): State<AppState>,
    Json(payload): Json<ReorderSlidesRequest>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;
    slide_queries::reorder(&state.db, &payload.items).await?;

    Ok(Json(json!({ "status": "ok" })))
}

pub async fn delete_slide(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let slide = slide_queries::soft_delete(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Slide no encontrado.".to_string()))?;

    storage_service::delete_file(&state.storage, &slide.image_path).await;
    if let Some(mobile) = slide.mobile_image_path.as_deref() {
        storage_service::delete_file(&state.storage, mobile).await;
    }

    tracing::info!("Deleted slide {}", id);
    Ok(StatusCode::NO_CONTENT)
}

//CATEGORY ROUTES

pub async fn create_category(
    State(state): State<AppState>,
    req: Request,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    let (payload, image) = if is_multipart(&req) {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
        let form = FormData::read(multipart).await?;
        let payload = category_request_from_form(&form)?;
        let image = form.file_part("image");
        (payload, image)
    } else {
        let Json(payload) = Json::<CreateCategoryRequest>::from_request(req, &())
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))?;
        (payload, FilePart::Missing)
    };

    payload.validate()?;
    check_image_part(&image, "image")?;

    let base = match payload.slug.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(slug) => slugify(slug),
        None => slugify(payload.name.as_deref().unwrap_or_default()),
    };
    let slug = category_queries::unique_slug(&state.db, &base, None).await?;

    let image_path = match &image {
        FilePart::Upload(file) => {
            Some(storage_service::store_image(&state.storage, file, "categories").await?)
        }
        _ => None,
    };

    let category =
        category_queries::create_category(&state.db, &payload, &slug, image_path.as_deref())
            .await?;
    tracing::info!("Created category {} ({})", category.id, category.slug);

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse::new(category, &state.storage)),
    ))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    req: Request,
) -> Result<Json<CategoryResponse>> {
    let existing = category_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Categoría no encontrada.".to_string()))?;

    let (payload, image) = if is_multipart(&req) {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
        let form = FormData::read(multipart).await?;
        let payload = category_update_from_form(&form)?;
        let image = form.file_part("image");
        (payload, image)
    } else {
        let Json(payload) = Json::<UpdateCategoryRequest>::from_request(req, &())
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))?;
        // JSON bodies carry no files; a present `image` key means clear.
        let image = if payload.image.is_some() {
            FilePart::Clear
        } else {
            FilePart::Missing
        };
        (payload, image)
    };

    payload.validate()?;
    check_image_part(&image, "image")?;

    let slug = match payload.slug.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(explicit) => {
            Some(category_queries::unique_slug(&state.db, &slugify(explicit), Some(id)).await?)
        }
        None => match payload.name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => {
                Some(category_queries::unique_slug(&state.db, &slugify(name), Some(id)).await?)
            }
            None => None,
        },
    };

    let new_path = match &image {
        FilePart::Upload(file) => {
            Some(storage_service::store_image(&state.storage, file, "categories").await?)
        }
        _ => None,
    };
    let image_arg = match &image {
        FilePart::Upload(_) => Some(new_path.as_deref()),
        FilePart::Clear => Some(None),
        FilePart::Missing => None,
    };

    let category =
        category_queries::update_category(&state.db, id, &payload, slug.as_deref(), image_arg)
            .await?
            .ok_or_else(|| AppError::NotFound("Categoría no encontrada.".to_string()))?;

    // The previous file goes once the row no longer references it.
    if !matches!(image, FilePart::Missing) {
        if let Some(old) = existing.image_path.as_deref() {
            storage_service::delete_file(&state.storage, old).await;
        }
    }

    Ok(Json(CategoryResponse::new(category, &state.storage)))
}

pub async fn toggle_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryResponse>> {
    let category = category_queries::toggle_featured(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Categoría no encontrada.".to_string()))?;

    Ok(Json(CategoryResponse::new(category, &state.storage)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let category = category_queries::soft_delete(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Categoría no encontrada.".to_string()))?;

    if let Some(path) = category.image_path.as_deref() {
        storage_service::delete_file(&state.storage, path).await;
    }

    tracing::info!("Deleted category {}", id);
    Ok(Json(json!({ "ok": true })))
}

//PRODUCT ROUTES

pub async fn create_product(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let form = FormData::read(multipart).await?;
    let payload = product_request_from_form(&form)?;
    payload.validate()?;

    let main_image = form.file_part("main_image");
    let gallery_files: Vec<UploadedFile> = form.files("images").into_iter().cloned().collect();
    check_image_part(&main_image, "main_image")?;
    check_gallery(&gallery_files)?;

    let category_id = payload.category_id.unwrap_or_default();
    let category = category_queries::find_by_id(&state.db, category_id)
        .await?
        .ok_or_else(|| field_error("category_id", "La categoría no existe."))?;

    let base = match payload.slug.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(slug) => slugify(slug),
        None => slugify(payload.name.as_deref().unwrap_or_default()),
    };
    let slug = product_queries::unique_slug(&state.db, &base, None).await?;

    let main_image_path = match &main_image {
        FilePart::Upload(file) => {
            Some(storage_service::store_image(&state.storage, file, "products").await?)
        }
        _ => None,
    };

    let mut gallery = Vec::new();
    for (i, file) in gallery_files.iter().enumerate() {
        let path = storage_service::store_image(&state.storage, file, "products").await?;
        let alt = payload.images_alt.get(i).cloned().flatten();
        gallery.push((path, alt));
    }

    let product = product_queries::create_product_with_images(
        &state.db,
        &payload,
        &slug,
        main_image_path.as_deref(),
        &gallery,
    )
    .await?;

    let images = product_queries::find_images(&state.db, product.id).await?;
    let category_ref = CategoryRef {
        id: category.id,
        name: category.name,
        slug: category.slug,
    };
    tracing::info!("Created product {} ({})", product.id, product.slug);

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::new(
            product,
            Some(category_ref),
            images,
            &state.storage,
        )),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    req: Request,
) -> Result<Json<ProductResponse>> {
    let existing = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Producto no encontrado.".to_string()))?;

    let (payload, main_image, new_files) = if is_multipart(&req) {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
        let form = FormData::read(multipart).await?;
        let payload = product_update_from_form(&form)?;
        let main_image = form.file_part("main_image");
        let new_files: Vec<UploadedFile> = form.files("images").into_iter().cloned().collect();
        (payload, main_image, new_files)
    } else {
        let Json(payload) = Json::<UpdateProductRequest>::from_request(req, &())
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))?;
        let main_image = if payload.main_image.is_some() {
            FilePart::Clear
        } else {
            FilePart::Missing
        };
        (payload, main_image, Vec::new())
    };

    payload.validate()?;
    check_image_part(&main_image, "main_image")?;
    check_gallery(&new_files)?;

    if let Some(category_id) = payload.category_id {
        if category_queries::find_by_id(&state.db, category_id)
            .await?
            .is_none()
        {
            return Err(field_error("category_id", "La categoría no existe."));
        }
    }

    let slug = match payload.slug.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(explicit) => {
            Some(product_queries::unique_slug(&state.db, &slugify(explicit), Some(id)).await?)
        }
        None => match payload.name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => {
                Some(product_queries::unique_slug(&state.db, &slugify(name), Some(id)).await?)
            }
            None => None,
        },
    };

    let new_main_path = match &main_image {
        FilePart::Upload(file) => {
            Some(storage_service::store_image(&state.storage, file, "products").await?)
        }
        _ => None,
    };
    let main_arg = match &main_image {
        FilePart::Upload(_) => Some(new_main_path.as_deref()),
        FilePart::Clear => Some(None),
        FilePart::Missing => None,
    };

    let mut gallery = Vec::new();
    for (i, file) in new_files.iter().enumerate() {
        let path = storage_service::store_image(&state.storage, file, "products").await?;
        let alt = payload.images_alt.get(i).cloned().flatten();
        gallery.push((path, alt));
    }

    let (product, removed_paths) = product_queries::update_product_with_gallery(
        &state.db,
        id,
        &payload,
        slug.as_deref(),
        main_arg,
        &gallery,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Producto no encontrado.".to_string()))?;

    for path in &removed_paths {
        storage_service::delete_file(&state.storage, path).await;
    }
    if !matches!(main_image, FilePart::Missing) {
        if let Some(old) = existing.main_image_path.as_deref() {
            storage_service::delete_file(&state.storage, old).await;
        }
    }

    let images = product_queries::find_images(&state.db, product.id).await?;
    let refs = category_queries::find_refs(&state.db, &[product.category_id]).await?;
    let category = refs.get(&product.category_id).cloned();

    Ok(Json(ProductResponse::new(
        product,
        category,
        images,
        &state.storage,
    )))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let (_, paths) = product_queries::soft_delete(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Producto no encontrado.".to_string()))?;

    for path in &paths {
        storage_service::delete_file(&state.storage, path).await;
    }

    tracing::info!("Deleted product {}", id);
    Ok(Json(json!({ "ok": true })))
}

//FORM HELPERS

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

fn field_error(field: &str, message: &str) -> AppError {
    let mut errors = BTreeMap::new();
    errors.insert(field.to_string(), vec![message.to_string()]);
    AppError::validation(errors)
}

fn check_image_part(part: &FilePart, field: &str) -> Result<()> {
    if let FilePart::Upload(file) = part {
        if !IMAGE_TYPES.contains(&file.content_type.as_str()) {
            return Err(field_error(
                field,
                "La imagen debe ser JPG, PNG, WEBP o AVIF.",
            ));
        }
    }
    Ok(())
}

fn check_gallery(files: &[UploadedFile]) -> Result<()> {
    let mut v = Validator::new();
    for (i, file) in files.iter().enumerate() {
        if !IMAGE_TYPES.contains(&file.content_type.as_str()) {
            v.add(
                &format!("images.{}", i),
                "La imagen debe ser JPG, PNG, WEBP o AVIF.",
            );
        }
    }
    v.finish()
}

fn check_slide_images(form: &FormData) -> Result<()> {
    let mut v = Validator::new();
    for field in ["image", "mobile_image"] {
        if let Some(file) = form.file(field) {
            if !SLIDE_IMAGE_TYPES.contains(&file.content_type.as_str()) {
                v.add(field, "La imagen debe ser JPG, PNG o WEBP.");
            }
        }
    }
    v.finish()
}

fn text(form: &FormData, name: &str) -> Option<String> {
    form.value(name).map(str::to_string)
}

fn parse_int<T: std::str::FromStr>(
    v: &mut Validator,
    form: &FormData,
    name: &str,
    message: &str,
) -> Option<T> {
    let raw = form.value(name)?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            v.add(name, message);
            None
        }
    }
}

fn parse_flag(v: &mut Validator, form: &FormData, name: &str) -> Option<bool> {
    let raw = form.value(name)?;
    let parsed = parse_bool(raw);
    if parsed.is_none() {
        v.add(name, "El valor debe ser verdadero o falso.");
    }
    parsed
}

fn parse_status(v: &mut Validator, form: &FormData) -> Option<Status> {
    let raw = form.value("status")?.trim();
    if raw.is_empty() {
        return None;
    }
    match Status::parse(raw) {
        Some(status) => Some(status),
        None => {
            v.add("status", "El estado debe ser draft, published o archived.");
            None
        }
    }
}

fn parse_id_list(v: &mut Validator, form: &FormData, name: &str) -> Vec<i64> {
    let mut ids = Vec::new();
    for (i, raw) in form.values(name).into_iter().enumerate() {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match raw.parse() {
            Ok(id) => ids.push(id),
            Err(_) => v.add(
                &format!("{}.{}", name, i),
                "Debe ser un identificador numérico.",
            ),
        }
    }
    ids
}

fn images_alt_from(form: &FormData) -> Vec<Option<String>> {
    form.values("images_alt")
        .into_iter()
        .map(|alt| {
            let alt = alt.trim();
            if alt.is_empty() {
                None
            } else {
                Some(alt.to_string())
            }
        })
        .collect()
}

fn slide_request_from_form(form: &FormData) -> Result<CreateSlideRequest> {
    let mut v = Validator::new();

    let position = parse_int(&mut v, form, "position", "La posición debe ser un número.");
    let is_active = parse_flag(&mut v, form, "is_active");
    v.finish()?;

    Ok(CreateSlideRequest {
        title: text(form, "title"),
        alt: text(form, "alt"),
        caption: text(form, "caption"),
        button_text: text(form, "button_text"),
        button_url: text(form, "button_url"),
        position,
        is_active,
        starts_at: text(form, "starts_at"),
        ends_at: text(form, "ends_at"),
    })
}

fn category_request_from_form(form: &FormData) -> Result<CreateCategoryRequest> {
    let mut v = Validator::new();

    let position = parse_int(&mut v, form, "position", "La posición debe ser un número.");
    let is_featured = parse_flag(&mut v, form, "is_featured");
    let status = parse_status(&mut v, form);
    v.finish()?;

    Ok(CreateCategoryRequest {
        name: text(form, "name"),
        slug: text(form, "slug"),
        subtitle: text(form, "subtitle"),
        description: text(form, "description"),
        color: text(form, "color"),
        position,
        is_featured,
        status,
        image_alt: text(form, "image_alt"),
    })
}

fn category_update_from_form(form: &FormData) -> Result<UpdateCategoryRequest> {
    let mut v = Validator::new();

    let position = parse_int(&mut v, form, "position", "La posición debe ser un número.");
    let is_featured = parse_flag(&mut v, form, "is_featured");
    let status = parse_status(&mut v, form);
    v.finish()?;

    Ok(UpdateCategoryRequest {
        name: text(form, "name"),
        slug: text(form, "slug"),
        subtitle: text(form, "subtitle"),
        description: text(form, "description"),
        color: text(form, "color"),
        position,
        is_featured,
        status,
        image_alt: text(form, "image_alt"),
        // The form's image key is read as a file part, not a field.
        image: None,
    })
}

fn product_request_from_form(form: &FormData) -> Result<CreateProductRequest> {
    let mut v = Validator::new();

    let category_id = parse_int(&mut v, form, "category_id", "La categoría debe ser un número.");
    let price_cents = parse_int(
        &mut v,
        form,
        "price_cents",
        "El precio debe ser un número entero.",
    );
    let status = parse_status(&mut v, form);
    v.finish()?;

    Ok(CreateProductRequest {
        category_id,
        name: text(form, "name"),
        slug: text(form, "slug"),
        description: text(form, "description"),
        price_cents,
        size: text(form, "size"),
        color: text(form, "color"),
        reference: text(form, "reference"),
        gender: text(form, "gender"),
        status,
        main_image_alt: text(form, "main_image_alt"),
        images_alt: images_alt_from(form),
    })
}

fn product_update_from_form(form: &FormData) -> Result<UpdateProductRequest> {
    let mut v = Validator::new();

    let category_id = parse_int(&mut v, form, "category_id", "La categoría debe ser un número.");
    let price_cents = parse_int(
        &mut v,
        form,
        "price_cents",
        "El precio debe ser un número entero.",
    );
    let status = parse_status(&mut v, form);
    let remove_image_ids = parse_id_list(&mut v, form, "remove_image_ids");
    let images_order = parse_id_list(&mut v, form, "images_order");
    v.finish()?;

    Ok(UpdateProductRequest {
        category_id,
        name: text(form, "name"),
        slug: text(form, "slug"),
        description: text(form, "description"),
        price_cents,
        size: text(form, "size"),
        color: text(form, "color"),
        reference: text(form, "reference"),
        gender: text(form, "gender"),
        status,
        main_image_alt: text(form, "main_image_alt"),
        // The form's main_image key is read as a file part, not a field.
        main_image: None,
        images_alt: images_alt_from(form),
        remove_image_ids,
        images_order,
    })
}
