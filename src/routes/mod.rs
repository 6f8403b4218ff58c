mod admin;
mod auth;
mod bold_callback;
mod categories;
mod checkout;
mod contact;
mod health;
mod products;
mod profile;
mod slides;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
};

use crate::{AppState, middleware::auth_middleware};

pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/slides", get(slides::public_slides))
        .route("/categories", get(categories::list_categories))
        .route("/categories/{id}", get(categories::get_category))
        .route("/products", get(products::list_products))
        .route("/products/{slug}", get(products::get_product))
        .route("/checkout", post(checkout::checkout))
        .route("/contact", post(contact::contact))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout));

    let protected = Router::new()
        .route("/me", get(auth::me))
        .route(
            "/profile",
            get(profile::show_profile).put(profile::update_profile),
        )
        .route("/profile/password", put(profile::update_password))
        .route(
            "/admin/slides",
            get(admin::list_slides).post(admin::create_slide),
        )
        .route("/admin/slides/reorder", post(admin::reorder_slides))
        .route(
            "/admin/slides/{id}",
            patch(admin::update_slide).delete(admin::delete_slide),
        )
        .route("/admin/slides/{id}/toggle", patch(admin::toggle_slide))
        .route("/admin/categories", post(admin::create_category))
        .route(
            "/admin/categories/{id}",
            put(admin::update_category)
                .patch(admin::update_category)
                .delete(admin::delete_category),
        )
        .route(
            "/admin/categories/{id}/toggle",
            patch(admin::toggle_category),
        )
        .route("/admin/products", post(admin::create_product))
        .route(
            "/admin/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new().merge(public).merge(protected);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/bold-callback", post(bold_callback::bold_callback))
        .nest("/api", api)
        .with_state(state)
}
