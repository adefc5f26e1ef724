//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `Credentials`: login input, never persisted
//! - `Session`: the authenticated handle with an optional lifetime
//!
//! Sessions live in memory only and are dropped on logout or when the
//! client is closed.

pub mod credentials;
pub mod session;

pub use credentials::Credentials;
pub use session::{Session, SessionData};
