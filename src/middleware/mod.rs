//! Middleware for the users gateway
//!
//! This module provides request body validation, request tracing and
//! security headers.

mod security;
mod tracing;
pub mod validation;

pub use security::{hsts_header, security_headers};
pub use self::tracing::{request_tracing, REQUEST_ID_HEADER};
pub use validation::{require_user_fields, JsonPayload, MAX_BODY_BYTES};
