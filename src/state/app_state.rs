//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::store::UserStore;

/// Shared application state.
///
/// Holds only the read-only store handle built at startup; no request data
/// outlives its request.
#[derive(Clone)]
pub struct AppState {
    pub user_store: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }
}

impl FromRef<AppState> for Arc<dyn UserStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.user_store.clone()
    }
}
