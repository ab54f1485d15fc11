//! Route definitions for the users gateway

mod user;

use axum::{routing::get, Router};

use crate::handlers::{health_check, root};
use crate::state::AppState;

pub use user::user_routes;

/// Full application router, without the outer tracing/CORS layers added at startup
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(user_routes())
        .with_state(state)
}
