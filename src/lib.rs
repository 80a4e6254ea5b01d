//! Lost-and-found backend library.
//!
//! Exposes the application modules for the server binary and the
//! integration tests.

pub mod api;
pub mod auth;
pub mod models;
pub mod notify;
pub mod policy;
pub mod store;
