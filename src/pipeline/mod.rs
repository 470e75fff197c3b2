//! Report triage & routing pipeline.

pub mod rules;
pub mod triage;
pub mod types;

pub use rules::GuardRules;
pub use triage::{FALLBACK_REPLY, TriagePipeline};
pub use types::*;
