//! Rolling daily spend window
//!
//! The window is reset lazily: the first limit-checking call at or after
//! `last_reset_time + 24h` zeroes the counter and restarts the window at the
//! time of that call.

use serde::{Deserialize, Serialize};

use steward_core::{Amount, Timestamp, SECONDS_PER_DAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendWindow {
    /// Amount disbursed since `last_reset_time`
    pub spent_today: Amount,
    pub last_reset_time: Timestamp,
}

impl SpendWindow {
    /// A fresh window starting at `now`
    pub fn new(now: Timestamp) -> Self {
        Self {
            spent_today: 0,
            last_reset_time: now,
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.last_reset_time.saturating_add(SECONDS_PER_DAY)
    }

    /// Reset the window if it has expired at `now`
    pub fn roll(&mut self, now: Timestamp) {
        if self.is_expired(now) {
            *self = Self::new(now);
        }
    }

    /// The window as it would look after rolling at `now`
    pub fn rolled(&self, now: Timestamp) -> Self {
        let mut window = *self;
        window.roll(now);
        window
    }

    /// What may still be spent at `now` under `limit`
    pub fn remaining(&self, limit: Amount, now: Timestamp) -> Amount {
        limit.saturating_sub(self.rolled(now).spent_today)
    }
}
