//! XP ledger and leveling.
//!
//! XP accumulates from discrete events (commits, PR merges, streak bonuses)
//! into an append-only ledger; the running total is never decremented. Levels
//! are derived on read by walking a monotonic threshold table -- no level
//! state is stored beyond the ledger sum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::XpError;

/// Where an XP award came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum XpSource {
    DailyCommit,
    StreakBonus,
    PrMerged,
    WeekShipped,
    ChallengeWon,
    AchievementUnlocked,
}

impl XpSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            XpSource::DailyCommit => "DAILY_COMMIT",
            XpSource::StreakBonus => "STREAK_BONUS",
            XpSource::PrMerged => "PR_MERGED",
            XpSource::WeekShipped => "WEEK_SHIPPED",
            XpSource::ChallengeWon => "CHALLENGE_WON",
            XpSource::AchievementUnlocked => "ACHIEVEMENT_UNLOCKED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DAILY_COMMIT" => Some(XpSource::DailyCommit),
            "STREAK_BONUS" => Some(XpSource::StreakBonus),
            "PR_MERGED" => Some(XpSource::PrMerged),
            "WEEK_SHIPPED" => Some(XpSource::WeekShipped),
            "CHALLENGE_WON" => Some(XpSource::ChallengeWon),
            "ACHIEVEMENT_UNLOCKED" => Some(XpSource::AchievementUnlocked),
            _ => None,
        }
    }
}

/// One tier of the level table.
#[derive(Debug, Clone, Copy)]
pub struct LevelTier {
    pub level: u32,
    pub threshold: u64,
    pub title: &'static str,
    pub color: &'static str,
}

/// Monotonic level thresholds. A user's level is the highest tier whose
/// threshold does not exceed their total XP.
pub const LEVELS: [LevelTier; 7] = [
    LevelTier { level: 1, threshold: 0, title: "Newcomer", color: "#9ca3af" },
    LevelTier { level: 5, threshold: 500, title: "Contributor", color: "#34d399" },
    LevelTier { level: 10, threshold: 2_000, title: "Shipper", color: "#38bdf8" },
    LevelTier { level: 20, threshold: 10_000, title: "Builder", color: "#818cf8" },
    LevelTier { level: 30, threshold: 25_000, title: "Architect", color: "#c084fc" },
    LevelTier { level: 50, threshold: 100_000, title: "Maintainer", color: "#fb923c" },
    LevelTier { level: 100, threshold: 500_000, title: "Legend", color: "#facc15" },
];

/// Derived level information; computed on read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: u32,
    pub title: String,
    pub color: String,
    pub xp_for_current_level: u64,
    pub xp_for_next_level: u64,
    /// Progress through the current tier; 100 at the top tier.
    pub progress_pct: u8,
}

/// Derive `LevelInfo` from a total XP value.
pub fn level_for(total_xp: u64) -> LevelInfo {
    let idx = LEVELS
        .iter()
        .rposition(|tier| tier.threshold <= total_xp)
        .unwrap_or(0);
    let tier = &LEVELS[idx];

    let (xp_for_next_level, progress_pct) = match LEVELS.get(idx + 1) {
        Some(next) => {
            let span = next.threshold - tier.threshold;
            let into = total_xp - tier.threshold;
            (next.threshold, (into * 100 / span) as u8)
        }
        None => (tier.threshold, 100),
    };

    LevelInfo {
        level: tier.level,
        title: tier.title.to_string(),
        color: tier.color.to_string(),
        xp_for_current_level: tier.threshold,
        xp_for_next_level,
        progress_pct,
    }
}

/// Append-only ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpLedgerEntry {
    pub id: Uuid,
    pub source: XpSource,
    pub amount: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Result of a successful award.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedXp {
    pub entry: XpLedgerEntry,
    pub leveled_up: bool,
    pub old_level: u32,
    pub new_level: u32,
}

/// Per-user XP ledger. Hydrate with the stored total; new entries accumulate
/// in `pending_entries` for the caller to persist.
#[derive(Debug, Clone, Default)]
pub struct XpLedger {
    total_xp: u64,
    pending_entries: Vec<XpLedgerEntry>,
}

impl XpLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a stored ledger sum.
    pub fn with_total(total_xp: u64) -> Self {
        Self {
            total_xp,
            pending_entries: Vec::new(),
        }
    }

    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    /// Entries appended since hydration, in award order.
    pub fn pending_entries(&self) -> &[XpLedgerEntry] {
        &self.pending_entries
    }

    pub fn level_info(&self) -> LevelInfo {
        level_for(self.total_xp)
    }

    /// Append an award. Rejects non-positive amounts with `InvalidAmount`
    /// and leaves the total untouched.
    pub fn award(
        &mut self,
        source: XpSource,
        amount: i64,
        metadata: serde_json::Value,
    ) -> Result<AppliedXp, XpError> {
        if amount <= 0 {
            return Err(XpError::InvalidAmount(amount));
        }

        let old_level = level_for(self.total_xp).level;
        self.total_xp += amount as u64;
        let new_level = level_for(self.total_xp).level;

        let entry = XpLedgerEntry {
            id: Uuid::new_v4(),
            source,
            amount: amount as u32,
            timestamp: Utc::now(),
            metadata,
        };
        self.pending_entries.push(entry.clone());

        if new_level > old_level {
            tracing::debug!(old_level, new_level, total = self.total_xp, "level up");
        }

        Ok(AppliedXp {
            entry,
            leveled_up: new_level > old_level,
            old_level,
            new_level,
        })
    }
}

/// Inputs for the composite daily-sync award.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SyncXpInput {
    pub new_commits_today: u32,
    pub current_streak: u32,
    pub new_prs_merged: u32,
    pub days_active_this_week: u32,
    pub previous_days_active_this_week: u32,
}

/// One line of the daily-sync breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncXpAward {
    pub source: XpSource,
    pub amount: u32,
    pub description: String,
}

/// XP per commit, capped at [`MAX_COMMITS_PER_DAY`] commits.
const XP_PER_COMMIT: u32 = 10;
const MAX_COMMITS_PER_DAY: u32 = 10;
const XP_PER_STREAK_DAY: u32 = 5;
const XP_PER_PR_MERGED: u32 = 50;
const PERFECT_WEEK_BONUS: u32 = 200;

/// Break a day's sync into discrete awards.
///
/// The perfect-week bonus is edge-triggered: it fires only on the transition
/// into a 7-active-day week, so re-syncing an already-perfect week does not
/// award it again.
pub fn calculate_sync_xp(input: &SyncXpInput) -> Vec<SyncXpAward> {
    let mut awards = Vec::new();

    let counted_commits = input.new_commits_today.min(MAX_COMMITS_PER_DAY);
    if counted_commits > 0 {
        awards.push(SyncXpAward {
            source: XpSource::DailyCommit,
            amount: XP_PER_COMMIT * counted_commits,
            description: format!("{} commits today", input.new_commits_today),
        });
    }

    if input.current_streak > 0 {
        awards.push(SyncXpAward {
            source: XpSource::StreakBonus,
            amount: XP_PER_STREAK_DAY * input.current_streak,
            description: format!("{}-day streak", input.current_streak),
        });
    }

    if input.new_prs_merged > 0 {
        awards.push(SyncXpAward {
            source: XpSource::PrMerged,
            amount: XP_PER_PR_MERGED * input.new_prs_merged,
            description: format!("{} PRs merged", input.new_prs_merged),
        });
    }

    if input.days_active_this_week == 7 && input.previous_days_active_this_week < 7 {
        awards.push(SyncXpAward {
            source: XpSource::WeekShipped,
            amount: PERFECT_WEEK_BONUS,
            description: "perfect week: active all 7 days".to_string(),
        });
    }

    awards
}
