//! Registry record.

use std::time::{Duration, Instant};

/// One issued captcha and its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRecord {
    pub id: String,
    pub answer: u32,
    /// Time of creation
    pub created_at: Instant,
}

impl RegistryRecord {
    pub fn new(id: impl Into<String>, answer: u32, created_at: Instant) -> Self {
        Self {
            id: id.into(),
            answer,
            created_at,
        }
    }

    /// Expired once strictly older than `ttl` at `now`
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > ttl
    }
}
