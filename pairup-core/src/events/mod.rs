//! Notices delivered from the coordinator to connections

pub mod types;

pub use types::{ChatMessage, EndReason, Notice, PartnerStatus};
