//! pairup-core: Matchmaking and session coordination for one-on-one chat
//!
//! This crate pairs waiting users into ephemeral two-party sessions and
//! tracks their presence across flaky connections:
//!
//! - **Coordinator** - [`Coordinator`] owns all matchmaking state behind one lock
//! - **Wait queue** - [`WaitQueue`] FIFO with idempotent insert
//! - **Sessions** - [`Session`] and [`SessionTable`] for active pairings
//! - **Collaborators** - [`ModerationService`], [`QuotaGate`] and [`ProfileDirectory`]
//!   traits with in-memory implementations
//! - **Connections** - [`Connection`] trait implemented by the transport layer
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pairup_core::{Coordinator, CoordinatorConfig, MockConnection};
//!
//! async fn example() -> Result<(), pairup_core::MatchError> {
//!     let coordinator = Arc::new(Coordinator::in_memory(CoordinatorConfig::default()));
//!     let _tasks = coordinator.spawn_background_tasks();
//!
//!     coordinator.register("alice", Arc::new(MockConnection::new())).await;
//!     coordinator.register("bob", Arc::new(MockConnection::new())).await;
//!     coordinator.join("alice").await?;
//!     coordinator.join("bob").await?;
//!
//!     assert_eq!(coordinator.session_count().await, 1);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────── Coordinator ─────────────────────────┐
//! │  Mutex<CoordinatorState>                                       │
//! │  ┌───────────┐ ┌───────────┐ ┌─────────────┐ ┌──────────────┐ │
//! │  │ Directory │ │ WaitQueue │ │ BlockFilter │ │ SessionTable │ │
//! │  └───────────┘ └───────────┘ └─────────────┘ └──────────────┘ │
//! │  GraceTimers                                                   │
//! └──────┬──────────────────┬──────────────────────┬──────────────┘
//!        │                  │                      │
//!  ModerationService    QuotaGate           ProfileDirectory
//! ```

pub mod blocks;
pub mod collaborators;
pub mod config;
pub mod connection;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod events;
pub mod participant;
pub mod queue;
pub mod session;

// Re-export key types for convenience
pub use blocks::BlockFilter;
pub use collaborators::{
    BanStatus, MemoryModeration, MemoryProfiles, MemoryQuota, ModerationService,
    ProfileDirectory, QuotaGate, Remaining, guest_name,
};
pub use config::CoordinatorConfig;
pub use connection::{Connection, MockConnection};
pub use coordinator::{Coordinator, CoordinatorState, Pairing};
pub use directory::Directory;
pub use error::{CollaboratorError, MatchError};
pub use events::{ChatMessage, EndReason, Notice, PartnerStatus};
pub use participant::{Identifier, Participant, SessionId};
pub use queue::{QueueEntry, WaitQueue};
pub use session::{Session, SessionState, SessionTable};
