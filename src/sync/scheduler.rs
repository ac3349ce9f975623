//! Interaction-aware debounce for persistence channels
//!
//! One `DebouncedSync` guards one channel (history blob, shared link). It
//! holds at most one pending deadline, defers firing while a pointer gesture
//! is in progress, and skips writes whose content fingerprint matches the
//! last successful write.

use serde::Serialize;
use tokio::time::{Duration, Instant};

use crate::scene::fingerprint;

#[derive(Debug)]
pub struct DebouncedSync {
    channel: &'static str,
    delay: Duration,
    release_delay: Duration,
    dirty: bool,
    interacting: bool,
    deadline: Option<Instant>,
    last_fingerprint: Option<String>,
    writes: usize,
}

impl DebouncedSync {
    /// `delay` is the quiet period after a change; `release_delay` is used
    /// once a pointer gesture ends with unsaved changes.
    pub fn new(channel: &'static str, delay: Duration, release_delay: Duration) -> Self {
        Self {
            channel,
            delay,
            release_delay,
            dirty: false,
            interacting: false,
            deadline: None,
            last_fingerprint: None,
            writes: 0,
        }
    }

    pub fn channel(&self) -> &'static str {
        self.channel
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Successful writes performed through this channel
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Record a change. Schedules a flush unless one is already pending.
    pub fn notify_change(&mut self, now: Instant) {
        self.dirty = true;
        if self.deadline.is_none() {
            self.deadline = Some(now + self.delay);
        }
    }

    pub fn pointer_down(&mut self) {
        self.interacting = true;
    }

    /// End of a gesture: replace any pending timer with a near-immediate one
    pub fn pointer_up(&mut self, now: Instant) {
        self.interacting = false;
        if self.dirty {
            self.deadline = Some(now + self.release_delay);
        }
    }

    /// Returns `true` when the pending timer has fired and a flush should run.
    ///
    /// A timer that fires mid-gesture is pushed back by the full delay rather
    /// than dropped.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                if self.interacting {
                    self.deadline = Some(now + self.delay);
                    tracing::trace!(channel = self.channel, "Flush deferred during interaction");
                    false
                } else {
                    self.deadline = None;
                    true
                }
            }
            _ => false,
        }
    }

    /// Start a flush of `payload`.
    ///
    /// Returns the fingerprint to hand back to [`Self::finish_flush`], or
    /// `None` when the payload matches the last write and nothing needs to be
    /// written (the channel is then clean).
    pub fn begin_flush<P: Serialize + ?Sized>(
        &mut self,
        payload: &P,
    ) -> Result<Option<String>, serde_json::Error> {
        self.deadline = None;
        let fingerprint = fingerprint(payload)?;
        if self.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            self.dirty = false;
            return Ok(None);
        }
        Ok(Some(fingerprint))
    }

    /// Record a successful write
    pub fn finish_flush(&mut self, fingerprint: String) {
        self.last_fingerprint = Some(fingerprint);
        self.dirty = false;
        self.writes += 1;
    }

    /// Record a failed write; the change stays dirty and is retried later
    pub fn fail_flush(&mut self, now: Instant) {
        self.dirty = true;
        if self.deadline.is_none() {
            self.deadline = Some(now + self.delay);
        }
    }

    /// Treat `payload` as already persisted (e.g. just loaded from storage)
    pub fn mark_synced<P: Serialize + ?Sized>(&mut self, payload: &P) {
        match fingerprint(payload) {
            Ok(fingerprint) => self.last_fingerprint = Some(fingerprint),
            Err(e) => tracing::debug!(channel = self.channel, error = %e, "Cannot fingerprint payload"),
        }
    }
}
