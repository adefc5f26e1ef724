//! Data models for Klokku entities.
//!
//! - `User`: an account known to the server
//! - `Budget`: a weekly time allocation
//! - `Event`: the activity currently tracked against a budget

pub mod budget;
pub mod event;
pub mod user;

pub use budget::Budget;
pub use event::Event;
pub use user::User;
