//! Answer registry: one-time answers for issued captchas.
//!
//! Records live in a map behind a single mutex. A record leaves the map on
//! its first check (right or wrong) or when the sweep finds it older than
//! the TTL. Expired records that the sweep has not reached yet behave as if
//! they were already gone.
//!
//! Image files are never touched here. With release tracking on, ids of
//! consumed and expired records are queued and handed out by
//! [`AnswerRegistry::sweep_expired`] so the caller can drop the files outside
//! the lock.
//!
//! Request-path operations are single map accesses. Only the sweep walks the
//! whole map, so the record limit and [`AnswerRegistry::len`] count expired
//! records until the next sweep removes them.

mod record;

pub use record::RegistryRecord;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use ring_common::{RingError, RingResult};

/// Result of one sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Records removed because they outlived the TTL
    pub expired: usize,
    /// Ids whose images can be forgotten: consumed since the last sweep
    /// plus the ones expired now
    pub released: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, RegistryRecord>,
    released: Vec<String>,
}

/// Concurrent `id -> answer` map with TTL.
#[derive(Debug)]
pub struct AnswerRegistry {
    ttl: Duration,
    max_records: usize,
    track_released: bool,
    inner: Mutex<Inner>,
}

impl AnswerRegistry {
    pub fn new(ttl: Duration, max_records: usize) -> Self {
        Self {
            ttl,
            max_records,
            track_released: true,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Whether consumed and expired ids are queued for image cleanup.
    /// Off when no image store exists.
    pub fn with_release_tracking(mut self, enabled: bool) -> Self {
        self.track_released = enabled;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // A panic while holding the lock cannot leave the map half-updated.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the answer for a new captcha
    pub fn create(&self, id: &str, answer: u32) -> RingResult<()> {
        self.create_at(id, answer, Instant::now())
    }

    fn create_at(&self, id: &str, answer: u32, now: Instant) -> RingResult<()> {
        let mut inner = self.lock();

        if let Some(existing) = inner.records.get(id) {
            if !existing.is_expired(now, self.ttl) {
                return Err(RingError::DuplicateId(id.to_string()));
            }
        }

        // An expired record under the same id is replaced, not added
        if !inner.records.contains_key(id) && inner.records.len() >= self.max_records {
            return Err(RingError::RegistryFull(self.max_records));
        }

        inner
            .records
            .insert(id.to_string(), RegistryRecord::new(id, answer, now));

        Ok(())
    }

    /// Consume the record and compare the guess.
    ///
    /// The record is removed whatever the outcome. A wrong guess is
    /// `Ok(false)`; an absent or expired id is `UnknownId`.
    pub fn check(&self, id: &str, guess: u32) -> RingResult<bool> {
        self.check_at(id, guess, Instant::now())
    }

    fn check_at(&self, id: &str, guess: u32, now: Instant) -> RingResult<bool> {
        let mut inner = self.lock();

        let record = inner
            .records
            .remove(id)
            .ok_or_else(|| RingError::UnknownId(id.to_string()))?;
        if self.track_released {
            inner.released.push(record.id.clone());
        }

        if record.is_expired(now, self.ttl) {
            return Err(RingError::UnknownId(id.to_string()));
        }

        Ok(guess == record.answer)
    }

    /// True when a live record exists. Does not consume it.
    pub fn exists(&self, id: &str) -> bool {
        self.exists_at(id, Instant::now())
    }

    fn exists_at(&self, id: &str, now: Instant) -> bool {
        self.lock()
            .records
            .get(id)
            .is_some_and(|r| !r.is_expired(now, self.ttl))
    }

    /// Remove every expired record and collect ids whose images may go.
    pub fn sweep_expired(&self) -> SweepReport {
        self.sweep_expired_at(Instant::now())
    }

    fn sweep_expired_at(&self, now: Instant) -> SweepReport {
        let mut inner = self.lock();
        let ttl = self.ttl;

        let track = self.track_released;

        let before = inner.records.len();
        let mut expired_ids = Vec::new();
        inner.records.retain(|id, record| {
            if record.is_expired(now, ttl) {
                if track {
                    expired_ids.push(id.clone());
                }
                false
            } else {
                true
            }
        });
        let expired = before - inner.records.len();

        let mut released = std::mem::take(&mut inner.released);
        released.extend(expired_ids);

        SweepReport { expired, released }
    }

    /// Records held, including expired ones the sweep has not removed yet
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
