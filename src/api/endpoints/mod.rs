//! API endpoint handlers.

pub mod admin_auth;
pub mod chat;
pub mod health;
pub mod log;
pub mod record;
