//! User route definitions

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::user::{
    create_user, delete_user, get_user, list_users, patch_user, replace_user,
};
use crate::middleware::require_user_fields;
use crate::state::AppState;

/// Create and replace must carry `name` and `email`; patch accepts any subset.
pub fn user_routes() -> Router<AppState> {
    let validated = middleware::from_fn(require_user_fields);

    Router::new()
        .route(
            "/api/v1/users",
            get(list_users).merge(post(create_user).route_layer(validated.clone())),
        )
        .route(
            "/api/v1/users/:id",
            get(get_user)
                .merge(put(replace_user).route_layer(validated))
                .patch(patch_user)
                .delete(delete_user),
        )
}
