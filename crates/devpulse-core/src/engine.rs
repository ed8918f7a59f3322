//! Per-user daily evaluation.
//!
//! Runs the four calculators in their required order -- streak, then score,
//! then XP, then verdict -- because XP and verdict consume streak/score
//! outputs. Everything here is pure: the caller pre-fetches all inputs and
//! persists all outputs, so evaluations for different users can run fully in
//! parallel.

use serde::{Deserialize, Serialize};

use crate::activity::{ActivityWindow, DELTA_WINDOW_DAYS};
use crate::error::XpError;
use crate::score::{LeaderboardSnapshot, ScoreCalculator, ScoreSnapshot};
use crate::streak::{StreakState, StreakTracker};
use crate::verdict::{Verdict, VerdictContext, VerdictSelector};
use crate::xp::{
    calculate_sync_xp, LevelInfo, SyncXpAward, SyncXpInput, XpLedger, XpLedgerEntry,
};

/// Pre-fetched inputs for one user's daily evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationInput<'a> {
    /// Trailing 14-day window ending "today".
    pub window: &'a ActivityWindow,
    /// Yesterday's stored final score, if any.
    pub previous_score: Option<u8>,
    /// Active days in the trailing week as of the previous sync
    /// (edge-trigger input for the perfect-week bonus).
    pub previous_days_active_this_week: u32,
    /// All users' current scores.
    pub leaderboard: &'a LeaderboardSnapshot,
    /// Streak state before today's advance.
    pub streak: &'a StreakState,
    /// Stored ledger sum.
    pub total_xp: u64,
}

/// XP side of an evaluation: the breakdown, the ledger entries to persist,
/// and the level movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpOutcome {
    pub awards: Vec<SyncXpAward>,
    pub entries: Vec<XpLedgerEntry>,
    pub total_before: u64,
    pub total_after: u64,
    pub leveled_up: bool,
    pub level: LevelInfo,
}

/// Everything one evaluation produces. The caller persists the pieces:
/// snapshot and verdict as (user, date) upserts, streak as a versioned
/// update, XP entries as appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyEvaluation {
    pub streak: StreakState,
    pub snapshot: ScoreSnapshot,
    pub xp: XpOutcome,
    pub verdict: Verdict,
}

/// The assembled engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    tracker: StreakTracker,
    calculator: ScoreCalculator,
    selector: VerdictSelector,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parts(
        tracker: StreakTracker,
        calculator: ScoreCalculator,
        selector: VerdictSelector,
    ) -> Self {
        Self {
            tracker,
            calculator,
            selector,
        }
    }

    /// Evaluate one user's day.
    pub fn evaluate_day(&self, input: &EvaluationInput) -> Result<DailyEvaluation, XpError> {
        let today = input.window.today();
        let week = input.window.trailing(DELTA_WINDOW_DAYS);

        // 1. streak
        let streak = self.tracker.advance(today, input.streak);
        let effective_streak = self.tracker.effective_streak(&streak, today.date);

        // 2. score
        let snapshot =
            self.calculator
                .calculate(input.window, input.previous_score, input.leaderboard);

        // 3. XP
        let awards = calculate_sync_xp(&SyncXpInput {
            new_commits_today: today.commits,
            current_streak: effective_streak,
            new_prs_merged: today.prs_merged,
            days_active_this_week: week.active_days(),
            previous_days_active_this_week: input.previous_days_active_this_week,
        });
        let mut ledger = XpLedger::with_total(input.total_xp);
        let mut leveled_up = false;
        for award in &awards {
            let metadata = serde_json::json!({
                "date": today.date,
                "description": award.description,
            });
            let applied = ledger.award(award.source, award.amount as i64, metadata)?;
            leveled_up |= applied.leveled_up;
        }
        let xp = XpOutcome {
            awards,
            entries: ledger.pending_entries().to_vec(),
            total_before: input.total_xp,
            total_after: ledger.total_xp(),
            leveled_up,
            level: ledger.level_info(),
        };

        // 4. verdict
        let has_history = input.streak.last_activity_date.is_some()
            || input.total_xp > 0
            || input.window.active_days() > 0;
        let verdict = self.selector.select(&VerdictContext {
            date: today.date,
            current_streak: effective_streak,
            previous_streak: input.streak.current_streak,
            today_commits: today.commits,
            today_prs: today.prs_merged,
            week_commits: week.total_commits(),
            active_days_in_week: week.active_days(),
            is_weekend: today.is_weekend,
            has_history,
        });

        tracing::info!(
            date = %today.date,
            score = snapshot.final_score,
            streak = streak.current_streak,
            verdict = verdict.key.as_str(),
            xp_awarded = xp.total_after - xp.total_before,
            "daily evaluation complete"
        );

        Ok(DailyEvaluation {
            streak,
            snapshot,
            xp,
            verdict,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityDay, SCORING_WINDOW_DAYS};
    use crate::verdict::VerdictKey;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window_of_daily_commits(end: NaiveDate, days: usize, commits: u32) -> ActivityWindow {
        let rows = (0..days).map(|i| ActivityDay {
            commits,
            ..ActivityDay::empty(end - chrono::Duration::days(i as i64))
        });
        ActivityWindow::from_days(end, SCORING_WINDOW_DAYS, rows)
    }

    #[test]
    fn test_full_evaluation_wiring() {
        // Mon 2026-08-10 anchor, active every day for a week
        let end = date(2026, 8, 10);
        let window = window_of_daily_commits(end, 7, 4);
        let streak = StreakState {
            current_streak: 6,
            longest_streak: 6,
            last_activity_date: Some(end - chrono::Duration::days(1)),
            ..StreakState::default()
        };
        let input = EvaluationInput {
            window: &window,
            previous_score: Some(48),
            previous_days_active_this_week: 6,
            leaderboard: &LeaderboardSnapshot::new(vec![30, 50, 70]),
            streak: &streak,
            total_xp: 400,
        };

        let result = Engine::new().evaluate_day(&input).unwrap();

        // streak advanced to 7 and banked a freeze
        assert_eq!(result.streak.current_streak, 7);
        assert_eq!(result.streak.freeze_days_available, 1);

        // XP saw the post-advance streak (5 x 7) and the perfect-week edge
        let bonus = result
            .xp
            .awards
            .iter()
            .find(|a| a.source == crate::xp::XpSource::StreakBonus)
            .unwrap();
        assert_eq!(bonus.amount, 35);
        assert!(result
            .xp
            .awards
            .iter()
            .any(|a| a.source == crate::xp::XpSource::WeekShipped));
        assert_eq!(
            result.xp.total_after - result.xp.total_before,
            40 + 35 + 200
        );

        // verdict saw the post-advance streak
        assert_eq!(result.verdict.key, VerdictKey::MomentumBuilding);
        assert_eq!(result.snapshot.change_from_yesterday as i32,
            result.snapshot.final_score as i32 - 48);
    }

    #[test]
    fn test_empty_history_evaluation() {
        let window = ActivityWindow::empty(date(2026, 8, 10), SCORING_WINDOW_DAYS);
        let streak = StreakState::default();
        let input = EvaluationInput {
            window: &window,
            previous_score: None,
            previous_days_active_this_week: 0,
            leaderboard: &LeaderboardSnapshot::default(),
            streak: &streak,
            total_xp: 0,
        };

        let result = Engine::new().evaluate_day(&input).unwrap();

        assert_eq!(result.streak, StreakState::default());
        assert!(result.xp.awards.is_empty());
        assert_eq!(result.verdict.key, VerdictKey::ProlongedAbsence);
        assert_eq!(result.snapshot.final_score, 0);
    }

    #[test]
    fn test_dead_streak_reads_as_zero_for_verdict() {
        // last activity 5 days ago, nothing today
        let end = date(2026, 8, 10);
        let window = ActivityWindow::empty(end, SCORING_WINDOW_DAYS);
        let streak = StreakState {
            current_streak: 9,
            longest_streak: 9,
            last_activity_date: Some(end - chrono::Duration::days(5)),
            ..StreakState::default()
        };
        let input = EvaluationInput {
            window: &window,
            previous_score: Some(60),
            previous_days_active_this_week: 0,
            leaderboard: &LeaderboardSnapshot::default(),
            streak: &streak,
            total_xp: 1_000,
        };

        let result = Engine::new().evaluate_day(&input).unwrap();
        assert_eq!(result.verdict.key, VerdictKey::StreakDead);
        // no streak bonus for a lapsed streak
        assert!(result.xp.awards.is_empty());
    }

    #[test]
    fn test_reevaluation_is_idempotent_modulo_timestamps() {
        let end = date(2026, 8, 10);
        let window = window_of_daily_commits(end, 3, 2);
        let streak = StreakState {
            current_streak: 2,
            longest_streak: 4,
            last_activity_date: Some(end - chrono::Duration::days(1)),
            ..StreakState::default()
        };
        let leaderboard = LeaderboardSnapshot::new(vec![20, 80]);
        let input = EvaluationInput {
            window: &window,
            previous_score: Some(44),
            previous_days_active_this_week: 2,
            leaderboard: &leaderboard,
            streak: &streak,
            total_xp: 77,
        };

        let engine = Engine::new();
        let a = engine.evaluate_day(&input).unwrap();
        let b = engine.evaluate_day(&input).unwrap();

        assert_eq!(a.streak, b.streak);
        assert_eq!(a.snapshot.final_score, b.snapshot.final_score);
        assert_eq!(a.snapshot.components, b.snapshot.components);
        assert_eq!(a.verdict, b.verdict);
        assert_eq!(a.xp.awards, b.xp.awards);
        assert_eq!(a.xp.total_after, b.xp.total_after);
    }
}
