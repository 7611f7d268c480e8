//! Transport handles the coordinator delivers notices through

pub mod mock;
pub mod traits;

pub use mock::MockConnection;
pub use traits::Connection;
