//! External services the coordinator consults

pub mod memory;
pub mod traits;

pub use memory::{MemoryModeration, MemoryProfiles, MemoryQuota, guest_name};
pub use traits::{BanStatus, ModerationService, ProfileDirectory, QuotaGate, Remaining};
