//! In-memory collaborator implementations
//!
//! Used by the default server build and by tests. They keep everything in
//! RwLock-guarded maps and never fail.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use tokio::sync::RwLock;

use super::traits::{BanStatus, ModerationService, ProfileDirectory, QuotaGate, Remaining};
use crate::error::CollaboratorError;
use crate::participant::{Identifier, Participant};

const ADJECTIVES: &[&str] = &[
    "Shearing", "Dancing", "Flying", "Singing", "Jumping", "Glowing", "Sparkling", "Whispering",
    "Laughing", "Dreaming", "Floating", "Spinning", "Bouncing", "Twinkling", "Giggling",
];

const NOUNS: &[&str] = &[
    "Ramen", "Pizza", "Taco", "Sushi", "Waffle", "Muffin", "Cookie", "Donut", "Bagel", "Pancake",
    "Noodle", "Pretzel", "Croissant", "Burrito", "Sandwich",
];

/// Generate an "Adjective Noun" guest name
pub fn guest_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Quiet");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("Guest");
    format!("{} {}", adjective, noun)
}

/// In-memory bans and blocks
#[derive(Default)]
pub struct MemoryModeration {
    bans: RwLock<HashMap<Identifier, BanStatus>>,
    /// blocker -> blocked
    blocks: RwLock<HashMap<Identifier, HashSet<Identifier>>>,
}

impl MemoryModeration {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ban(
        &self,
        identifier: &str,
        until: Option<DateTime<Utc>>,
        reason: Option<String>,
    ) {
        self.bans
            .write()
            .await
            .insert(identifier.to_string(), BanStatus::banned(until, reason));
    }

    pub async fn unban(&self, identifier: &str) {
        self.bans.write().await.remove(identifier);
    }

    /// Record that `blocker` blocked `blocked`
    pub async fn block(&self, blocker: &str, blocked: &str) {
        self.blocks
            .write()
            .await
            .entry(blocker.to_string())
            .or_default()
            .insert(blocked.to_string());
    }

    pub async fn unblock(&self, blocker: &str, blocked: &str) {
        if let Some(set) = self.blocks.write().await.get_mut(blocker) {
            set.remove(blocked);
        }
    }
}

#[async_trait]
impl ModerationService for MemoryModeration {
    async fn ban_status(&self, identifier: &str) -> Result<BanStatus, CollaboratorError> {
        Ok(self
            .bans
            .read()
            .await
            .get(identifier)
            .cloned()
            .unwrap_or_default())
    }

    async fn blocked_ids(&self, identifier: &str) -> Result<HashSet<Identifier>, CollaboratorError> {
        let blocks = self.blocks.read().await;
        let mut result: HashSet<Identifier> =
            blocks.get(identifier).cloned().unwrap_or_default();
        for (blocker, blocked) in blocks.iter() {
            if blocked.contains(identifier) {
                result.insert(blocker.clone());
            }
        }
        Ok(result)
    }
}

/// In-memory match quota
pub struct MemoryQuota {
    default_remaining: Remaining,
    counters: RwLock<HashMap<Identifier, Remaining>>,
}

impl MemoryQuota {
    /// Every identifier starts with `default_remaining`
    pub fn new(default_remaining: Remaining) -> Self {
        Self {
            default_remaining,
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Quota where nobody is ever limited
    pub fn unlimited() -> Self {
        Self::new(Remaining::Unlimited)
    }

    pub async fn set(&self, identifier: &str, remaining: Remaining) {
        self.counters
            .write()
            .await
            .insert(identifier.to_string(), remaining);
    }

    pub async fn get(&self, identifier: &str) -> Remaining {
        self.counters
            .read()
            .await
            .get(identifier)
            .copied()
            .unwrap_or(self.default_remaining)
    }

    async fn adjust(&self, identifier: &str, f: impl FnOnce(u32) -> u32) {
        let mut counters = self.counters.write().await;
        let current = counters
            .get(identifier)
            .copied()
            .unwrap_or(self.default_remaining);
        if let Remaining::Limited(n) = current {
            counters.insert(identifier.to_string(), Remaining::Limited(f(n)));
        }
    }
}

impl Default for MemoryQuota {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[async_trait]
impl QuotaGate for MemoryQuota {
    async fn remaining(&self, identifier: &str) -> Result<Remaining, CollaboratorError> {
        Ok(self.get(identifier).await)
    }

    async fn decrement(&self, identifier: &str) -> Result<(), CollaboratorError> {
        self.adjust(identifier, |n| n.saturating_sub(1)).await;
        Ok(())
    }

    async fn refund(&self, identifier: &str) -> Result<(), CollaboratorError> {
        self.adjust(identifier, |n| n.saturating_add(1)).await;
        Ok(())
    }
}

/// In-memory profiles; unknown identifiers get a cached guest name
#[derive(Default)]
pub struct MemoryProfiles {
    profiles: RwLock<HashMap<Identifier, Participant>>,
}

impl MemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, identifier: &str, display_name: &str) {
        self.profiles.write().await.insert(
            identifier.to_string(),
            Participant::new(identifier, display_name),
        );
    }
}

#[async_trait]
impl ProfileDirectory for MemoryProfiles {
    async fn lookup(&self, identifier: &str) -> Result<Participant, CollaboratorError> {
        if let Some(profile) = self.profiles.read().await.get(identifier) {
            return Ok(profile.clone());
        }

        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(identifier.to_string())
            .or_insert_with(|| Participant::new(identifier, guest_name()));
        Ok(profile.clone())
    }
}
