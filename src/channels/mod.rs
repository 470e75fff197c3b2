//! Inbound channel adapters.

pub mod whatsapp;

pub use whatsapp::{AppState, webhook_routes};
