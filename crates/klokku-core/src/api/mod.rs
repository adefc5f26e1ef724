//! REST API client module for the Klokku service.
//!
//! This module provides the `ApiClient` for communicating with a Klokku
//! server to fetch users, budgets and the currently tracked event.
//!
//! Klokku identifies the acting user through the `X-User-Id` header, which
//! the client fills in from the session established by `authenticate`.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::ApiClient;
pub use error::{ApiError, ErrorKind, Result};
