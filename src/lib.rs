//! PulseAI — civic report triage & routing for Kwara State.

pub mod channels;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod oracle;
pub mod pipeline;
pub mod registry;
