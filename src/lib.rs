//! Users Gateway Library
//!
//! This library exports the core modules for the users gateway: a thin HTTP
//! layer exposing CRUD operations on a remote "users" table.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
