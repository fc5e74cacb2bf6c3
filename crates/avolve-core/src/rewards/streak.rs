//! Consecutive-day streak tracking.
//!
//! A streak counts calendar days with at least one qualifying completion.
//! Completing twice on the same day does not extend it; skipping a day
//! restarts it at 1.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted streak counters for one member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Current consecutive-day count.
    pub current: i64,
    /// Longest streak ever reached.
    pub best: i64,
    /// Day of the most recent counted completion.
    pub last_completed_on: Option<NaiveDate>,
}

/// Result of recording a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    pub before: i64,
    pub after: i64,
    /// False when the completion did not change the streak (same day or backdated).
    pub counted: bool,
    /// True when a gap reset the streak.
    pub broken: bool,
}

impl StreakState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completion on `on` and return how the streak moved.
    pub fn record_completion(&mut self, on: NaiveDate) -> StreakUpdate {
        let before = self.current;

        let (after, broken) = match self.last_completed_on {
            None => (1, false),
            Some(last) if on <= last => {
                return StreakUpdate {
                    before,
                    after: before,
                    counted: false,
                    broken: false,
                };
            }
            Some(last) if last.succ_opt() == Some(on) => (self.current.saturating_add(1), false),
            Some(_) => (1, before > 0),
        };

        self.current = after;
        self.best = self.best.max(after);
        self.last_completed_on = Some(on);

        StreakUpdate {
            before,
            after,
            counted: true,
            broken,
        }
    }

    /// Whether the streak can still be extended: last completion today or yesterday.
    pub fn is_active(&self, today: NaiveDate) -> bool {
        match self.last_completed_on {
            Some(last) => last == today || last.succ_opt() == Some(today),
            None => false,
        }
    }

    /// Streak as seen on `today`; a lapsed streak reads as 0.
    pub fn effective(&self, today: NaiveDate) -> i64 {
        if self.is_active(today) {
            self.current
        } else {
            0
        }
    }

    /// Stored counters plus how they read on `today`.
    pub fn status(&self, today: NaiveDate) -> StreakStatus {
        StreakStatus {
            current: self.current,
            best: self.best,
            last_completed_on: self.last_completed_on,
            active: self.is_active(today),
            effective: self.effective(today),
        }
    }
}

/// Streak counters evaluated on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakStatus {
    /// Stored count from the last counted completion.
    pub current: i64,
    pub best: i64,
    pub last_completed_on: Option<NaiveDate>,
    /// Whether a completion today would extend the streak.
    pub active: bool,
    /// `current` while active, 0 once lapsed.
    pub effective: i64,
}
