//! Check-in runner modules.

pub mod orchestrator;
pub mod tasks;

pub use orchestrator::{AccountOrchestrator, SessionRecord};
