//! Command handlers: one module per integration. Handlers own all printing;
//! the API clients only return typed data.

pub mod auth;
pub mod drive;
pub mod sheets;
pub mod speech;
