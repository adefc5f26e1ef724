//! Client library for the Klokku time budgeting service.
//!
//! The entry point is [`ApiClient`]: build it from a [`ClientConfig`],
//! call [`ApiClient::authenticate`], then use the typed accessors. The
//! client owns its HTTP transport; [`ApiClient::scoped`] and
//! [`ApiClient::close`] release it deterministically.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, ErrorKind};
pub use auth::{Credentials, Session, SessionData};
pub use config::{ClientConfig, Config};
pub use models::{Budget, Event, User};
