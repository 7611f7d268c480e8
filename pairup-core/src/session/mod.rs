//! Session management

pub mod state;
pub mod table;

// Re-export key types for convenience
pub use state::{Session, SessionState};
pub use table::SessionTable;
