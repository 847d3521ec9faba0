// ============================
// larder-backend-lib/src/router.rs
// ============================
//! HTTP router.
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, admin, auth, grocery, user};
use crate::middleware::{require_admin, require_auth};
use crate::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let signed_in = Router::new()
        .route("/auth/isadmin", get(auth::is_admin))
        .route("/user", get(user::current_user).put(user::update_user))
        .route("/groceries", get(grocery::list_items).post(grocery::create_item))
        .route("/groceries/expiring", get(grocery::expiring_items))
        .route("/user/delivery-target", post(user::set_delivery_target))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let admin_only = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/send-notification", post(admin::send_notification))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .nest("/api", public.merge(signed_in).merge(admin_only))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
