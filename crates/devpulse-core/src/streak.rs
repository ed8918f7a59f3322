//! Streak state machine.
//!
//! Tracks consecutive active days with a one-missed-day grace window and a
//! consumable "freeze" resource. The tracker is advanced once per user per
//! calendar day by the caller; all transitions are pure (state in, state out).
//!
//! A streak survives a gap of one full missed calendar day (it only breaks
//! after more than 48 hours of inactivity). This is intentional product
//! behavior, centralized here rather than scattered across call sites.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::ActivityDay;
use crate::error::StreakError;

/// Per-user streak state. Owned by the user record; mutated only through
/// [`StreakTracker::advance`] and [`StreakTracker::use_freeze`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    /// Freeze days banked, capped at the tracker's freeze cap (3).
    pub freeze_days_available: u8,
    pub freeze_days_used_total: u32,
    pub last_freeze_earned_date: Option<NaiveDate>,
    /// Set by `use_freeze()`; the next `advance()` over a broken gap treats
    /// the streak as unbroken and clears it.
    #[serde(default)]
    pub gap_protected: bool,
}

/// Streak transition rules.
#[derive(Debug, Clone, Copy)]
pub struct StreakTracker {
    /// Full missed calendar days tolerated before a streak breaks.
    pub grace_days: i64,
    /// Freeze days banked at most.
    pub freeze_cap: u8,
    /// A freeze day is earned every time the streak hits a multiple of this.
    pub freeze_earn_interval: u32,
}

impl Default for StreakTracker {
    fn default() -> Self {
        Self {
            grace_days: 1,
            freeze_cap: 3,
            freeze_earn_interval: 7,
        }
    }
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the state machine for one calendar day.
    ///
    /// Idempotent for repeated calls with the same day, and a no-op for days
    /// older than `last_activity_date` (stale recomputes tolerate
    /// out-of-order job execution). Inactive days never mutate state: a
    /// break is only materialized when the next active day is evaluated.
    pub fn advance(&self, today: &ActivityDay, state: &StreakState) -> StreakState {
        let mut next = state.clone();

        if let Some(last) = state.last_activity_date {
            if today.date < last {
                return next; // stale recompute
            }
        }

        if today.commits == 0 {
            return next;
        }

        match state.last_activity_date {
            None => next.current_streak = 1,
            Some(last) => {
                let gap = (today.date - last).num_days();
                if gap == 0 {
                    return next; // already recorded for today
                }
                if gap <= 1 + self.grace_days {
                    next.current_streak = state.current_streak + 1;
                } else if state.gap_protected {
                    next.current_streak = state.current_streak + 1;
                    next.gap_protected = false;
                    tracing::debug!(gap, "streak gap bridged by freeze");
                } else {
                    tracing::debug!(
                        gap,
                        lost = state.current_streak,
                        "streak broken"
                    );
                    next.current_streak = 1;
                }
            }
        }

        next.last_activity_date = Some(today.date);
        next.longest_streak = next.longest_streak.max(next.current_streak);

        if next.current_streak > 0
            && next.current_streak % self.freeze_earn_interval == 0
            && state.last_freeze_earned_date != Some(today.date)
            && next.freeze_days_available < self.freeze_cap
        {
            next.freeze_days_available += 1;
            next.last_freeze_earned_date = Some(today.date);
            tracing::debug!(
                streak = next.current_streak,
                banked = next.freeze_days_available,
                "freeze day earned"
            );
        }

        next
    }

    /// Consume one freeze day to protect the current gap.
    ///
    /// An explicit caller action, never automatic. The next `advance()` over
    /// a broken gap continues the streak instead of resetting it.
    pub fn use_freeze(&self, state: &StreakState) -> Result<StreakState, StreakError> {
        if state.freeze_days_available == 0 {
            return Err(StreakError::NoFreezeAvailable);
        }
        let mut next = state.clone();
        next.freeze_days_available -= 1;
        next.freeze_days_used_total += 1;
        next.gap_protected = true;
        tracing::debug!(
            remaining = next.freeze_days_available,
            "freeze day consumed"
        );
        Ok(next)
    }

    /// The streak as it stands on `today`, accounting for gaps the stored
    /// state has not materialized yet: a streak whose grace window has
    /// already lapsed (and is not freeze-protected) reads as 0 even though
    /// the stored counter only resets at the next active day.
    pub fn effective_streak(&self, state: &StreakState, today: NaiveDate) -> u32 {
        match state.last_activity_date {
            None => 0,
            Some(last) => {
                let gap = (today - last).num_days();
                if gap <= 1 + self.grace_days || state.gap_protected {
                    state.current_streak
                } else {
                    0
                }
            }
        }
    }

    /// Hours remaining until the streak would break, given no further
    /// activity. Read-only telemetry; clamped at zero. `None` when there is
    /// no streak to lose.
    pub fn hours_until_break(&self, state: &StreakState, now: DateTime<Utc>) -> Option<i64> {
        let last = state.last_activity_date?;
        // grace window runs from the end of the last active day
        let end_of_last = (last + Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc();
        let deadline = end_of_last + Duration::hours(24 * (1 + self.grace_days));
        Some((deadline - now).num_hours().max(0))
    }
}
