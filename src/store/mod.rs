//! Record store clients
//!
//! The gateway talks to its backend exclusively through [`UserStore`]. The
//! production implementation is [`XataStore`]; [`MemoryStore`] keeps records
//! in process for local development and tests.

mod memory;
mod xata;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Record;

pub use memory::MemoryStore;
pub use xata::XataStore;

/// Errors raised by a record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected backend response: {0}")]
    Decode(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid record id: {0:?}")]
    InvalidId(String),
}

impl StoreError {
    /// Stable code exposed to API clients
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "NOT_FOUND",
            StoreError::Transport(_) => "BACKEND_UNAVAILABLE",
            StoreError::Status { .. } => "BACKEND_REJECTED",
            StoreError::Decode(_) => "BACKEND_BAD_RESPONSE",
            StoreError::InvalidUrl(_) => "BACKEND_MISCONFIGURED",
            StoreError::InvalidId(_) => "INVALID_RECORD_ID",
        }
    }

    /// Short description safe to return to API clients. Full detail stays in the logs.
    pub fn summary(&self) -> String {
        match self {
            StoreError::NotFound(_) => "The record does not exist".to_string(),
            StoreError::Transport(_) => "The user store could not be reached".to_string(),
            StoreError::Status { status, .. } => {
                format!("The user store rejected the request (status {})", status)
            }
            StoreError::Decode(_) => "The user store returned an unreadable response".to_string(),
            StoreError::InvalidUrl(_) => "The user store is misconfigured".to_string(),
            StoreError::InvalidId(_) => "The record id is not valid".to_string(),
        }
    }
}

/// Whether `id` can name a single record. Dot segments would resolve to the
/// collection itself once placed in a URL path.
pub fn is_addressable_id(id: &str) -> bool {
    !matches!(id.trim(), "" | "." | "..")
}

/// Take a client-chosen `id` out of `fields`. Non-string or blank ids are
/// discarded so the store assigns one.
pub(crate) fn client_id(fields: &mut Record) -> Option<String> {
    match fields.remove("id") {
        Some(serde_json::Value::String(id)) if !id.trim().is_empty() => Some(id),
        _ => None,
    }
}

/// Result type alias using StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD primitives over the remote users table.
///
/// `read` reports a missing record as `Ok(None)`; `update` and `delete`
/// report it as [`StoreError::NotFound`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Record>>;

    async fn read(&self, id: &str) -> StoreResult<Option<Record>>;

    async fn create(&self, fields: Record) -> StoreResult<Record>;

    async fn update(&self, id: &str, fields: Record) -> StoreResult<Record>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}
