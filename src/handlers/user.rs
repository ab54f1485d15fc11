//! User-related API handlers
//!
//! Each handler maps one route onto one store call. Failures are converted
//! into [`ApiError`] at this boundary and never propagate further.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult, Operation};
use crate::middleware::JsonPayload;
use crate::models::{ApiResponse, Record};
use crate::store::{StoreError, UserStore};

const CREATED: &str = "User created successfully";
const UPDATED: &str = "User updated successfully";
const DELETED: &str = "User deleted successfully";

fn failed(operation: Operation) -> impl FnOnce(StoreError) -> ApiError {
    move |err| ApiError::from_store(operation, err)
}

/// List all users
pub async fn list_users(
    State(store): State<Arc<dyn UserStore>>,
) -> ApiResult<Json<Vec<Record>>> {
    let users = store.list().await.map_err(failed(Operation::List))?;
    Ok(Json(users))
}

/// Get a user by ID
pub async fn get_user(
    State(store): State<Arc<dyn UserStore>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Record>> {
    store
        .read(&id)
        .await
        .map_err(failed(Operation::Read))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Create a new user. Required fields are enforced by `require_user_fields`.
pub async fn create_user(
    State(store): State<Arc<dyn UserStore>>,
    JsonPayload(fields): JsonPayload,
) -> ApiResult<(StatusCode, Json<ApiResponse>)> {
    let user = store.create(fields).await.map_err(failed(Operation::Create))?;

    tracing::info!(user_id = ?user.get("id"), "User created");
    Ok((StatusCode::CREATED, Json(ApiResponse::with_data(CREATED, user))))
}

/// Replace a user. Required fields are enforced by `require_user_fields`.
pub async fn replace_user(
    State(store): State<Arc<dyn UserStore>>,
    Path(id): Path<String>,
    JsonPayload(fields): JsonPayload,
) -> ApiResult<Json<ApiResponse>> {
    update_user(store.as_ref(), &id, fields, Operation::Replace).await
}

/// Partially update a user; any subset of fields is accepted
pub async fn patch_user(
    State(store): State<Arc<dyn UserStore>>,
    Path(id): Path<String>,
    JsonPayload(fields): JsonPayload,
) -> ApiResult<Json<ApiResponse>> {
    update_user(store.as_ref(), &id, fields, Operation::Patch).await
}

// Replace and patch differ only in validation; merge semantics belong to the store.
async fn update_user(
    store: &dyn UserStore,
    id: &str,
    fields: Record,
    operation: Operation,
) -> ApiResult<Json<ApiResponse>> {
    let user = store.update(id, fields).await.map_err(failed(operation))?;

    tracing::info!(user_id = %id, operation = operation.as_str(), "User updated");
    Ok(Json(ApiResponse::with_data(UPDATED, user)))
}

/// Delete a user
pub async fn delete_user(
    State(store): State<Arc<dyn UserStore>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse>> {
    store.delete(&id).await.map_err(failed(Operation::Delete))?;

    tracing::info!(user_id = %id, "User deleted");
    Ok(Json(ApiResponse::message(DELETED)))
}
