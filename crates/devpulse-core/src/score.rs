//! Productivity score calculator.
//!
//! Derives a 0-100 daily score from a trailing 14-day activity window.
//! Five weighted components are computed independently, clamped to [0,100],
//! combined, and then adjusted by an anti-gaming penalty. Percentile and
//! global average come from an injected read-only leaderboard snapshot so the
//! calculator stays a pure function of explicit inputs.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::activity::ActivityWindow;

/// Score assumed for "yesterday" when no snapshot exists yet.
pub const DEFAULT_PREVIOUS_SCORE: u8 = 50;

/// Weekly merged-PR target used by the shipping frequency component.
const WEEKLY_PR_TARGET: f64 = 3.0;
/// Target coding hours per active day for the focus depth component.
const FOCUS_HOURS_TARGET: f64 = 3.0;
/// Ideal number of rest days in a 14-day window.
const IDEAL_REST_DAYS: f64 = 4.0;

/// Weights for the five score components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub building_ratio: f64,
    pub consistency: f64,
    pub shipping_frequency: f64,
    pub focus_depth: f64,
    pub recovery_balance: f64,
}

impl ScoreWeights {
    /// Product-standard weights.
    pub fn standard() -> Self {
        Self {
            building_ratio: 0.30,
            consistency: 0.25,
            shipping_frequency: 0.20,
            focus_depth: 0.15,
            recovery_balance: 0.10,
        }
    }

    /// Validate that all weights are in [0.0, 1.0].
    pub fn validate(&self) -> Result<(), String> {
        let weights = [
            ("building_ratio", self.building_ratio),
            ("consistency", self.consistency),
            ("shipping_frequency", self.shipping_frequency),
            ("focus_depth", self.focus_depth),
            ("recovery_balance", self.recovery_balance),
        ];
        for (name, weight) in weights {
            if !(0.0..=1.0).contains(&weight) {
                return Err(format!(
                    "Weight '{}' must be in [0.0, 1.0], got {}",
                    name, weight
                ));
            }
        }
        Ok(())
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::standard()
    }
}

/// The five component scores, each clamped to [0,100] before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub building_ratio: u8,
    pub consistency: u8,
    pub shipping_frequency: u8,
    pub focus_depth: u8,
    pub recovery_balance: u8,
}

/// Anti-gaming detection result. Penalties accumulate across checks; the
/// reason string is last-writer-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamingCheck {
    pub detected: bool,
    pub penalty: u8,
    pub reason: Option<String>,
}

impl GamingCheck {
    fn clean() -> Self {
        Self {
            detected: false,
            penalty: 0,
            reason: None,
        }
    }
}

/// Read-only snapshot of all users' current scores, supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    pub scores: Vec<u8>,
}

impl LeaderboardSnapshot {
    pub fn new(scores: Vec<u8>) -> Self {
        Self { scores }
    }

    /// Percentile rank of `score`: share of scores strictly below it.
    /// An empty leaderboard yields the neutral 50.
    pub fn percentile_of(&self, score: u8) -> u8 {
        if self.scores.is_empty() {
            return 50;
        }
        let below = self.scores.iter().filter(|s| **s < score).count();
        let pct = below as f64 / self.scores.len() as f64 * 100.0;
        pct.round() as u8
    }

    /// Mean of all scores, if any exist.
    pub fn average(&self) -> Option<u8> {
        if self.scores.is_empty() {
            return None;
        }
        let sum: u32 = self.scores.iter().map(|s| *s as u32).sum();
        Some((sum as f64 / self.scores.len() as f64).round() as u8)
    }
}

/// Daily score snapshot, one per (user, date). Recomputing the same date
/// overwrites the stored row; `computed_at` is the only wall-clock field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub date: chrono::NaiveDate,
    pub components: ComponentScores,
    pub raw_weighted_total: u8,
    pub gaming: GamingCheck,
    pub final_score: u8,
    pub change_from_yesterday: i16,
    pub percentile: u8,
    pub global_average: u8,
    pub computed_at: chrono::DateTime<chrono::Utc>,
}

/// Productivity score calculator over a 14-day window.
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    weights: ScoreWeights,
}

impl ScoreCalculator {
    pub fn new() -> Self {
        Self {
            weights: ScoreWeights::standard(),
        }
    }

    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Compute the snapshot for the window's anchor date.
    ///
    /// `previous_score` is yesterday's stored final score (defaults to 50
    /// when absent); `leaderboard` is the injected cross-user snapshot.
    pub fn calculate(
        &self,
        window: &ActivityWindow,
        previous_score: Option<u8>,
        leaderboard: &LeaderboardSnapshot,
    ) -> ScoreSnapshot {
        let components = self.component_scores(window);
        let raw_weighted_total = self.weighted_total(&components);
        let gaming = detect_gaming(window);
        let final_score =
            (raw_weighted_total as i16 - gaming.penalty as i16).clamp(0, 100) as u8;

        let previous = previous_score.unwrap_or(DEFAULT_PREVIOUS_SCORE);
        let percentile = leaderboard.percentile_of(final_score);
        let global_average = leaderboard.average().unwrap_or(final_score);

        ScoreSnapshot {
            date: window.end_date(),
            components,
            raw_weighted_total,
            gaming,
            final_score,
            change_from_yesterday: final_score as i16 - previous as i16,
            percentile,
            global_average,
            computed_at: Utc::now(),
        }
    }

    fn component_scores(&self, window: &ActivityWindow) -> ComponentScores {
        ComponentScores {
            building_ratio: building_ratio(window),
            consistency: consistency(window),
            shipping_frequency: shipping_frequency(window),
            focus_depth: focus_depth(window),
            recovery_balance: recovery_balance(window),
        }
    }

    fn weighted_total(&self, components: &ComponentScores) -> u8 {
        let total = self.weights.building_ratio * components.building_ratio as f64
            + self.weights.consistency * components.consistency as f64
            + self.weights.shipping_frequency * components.shipping_frequency as f64
            + self.weights.focus_depth * components.focus_depth as f64
            + self.weights.recovery_balance * components.recovery_balance as f64;
        clamp_score(total)
    }
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewards shipped output, penalizes long low-output sessions.
fn building_ratio(window: &ActivityWindow) -> u8 {
    let shipping =
        (window.total_prs_merged() * 20 + window.total_commits() * 2).min(100) as i32;
    let consuming_penalty =
        if window.coding_hours() > 50.0 && window.total_commits() < 20 {
            30
        } else {
            0
        };
    (shipping - consuming_penalty).clamp(0, 100) as u8
}

/// Active-day share, boosted 1.2x so 100 is reachable without all 14 days.
fn consistency(window: &ActivityWindow) -> u8 {
    let share = window.active_days() as f64 / window.len() as f64;
    clamp_score(share * 100.0 * 1.2)
}

/// Weekly merged-PR rate against the 3/week target.
fn shipping_frequency(window: &ActivityWindow) -> u8 {
    let weeks = window.len() as f64 / 7.0;
    let weekly_rate = window.total_prs_merged() as f64 / weeks;
    clamp_score(weekly_rate / WEEKLY_PR_TARGET * 100.0)
}

/// Average coding hours per active day against a 3-hour target.
fn focus_depth(window: &ActivityWindow) -> u8 {
    let active = window.active_days();
    if active == 0 {
        return 0;
    }
    let avg_hours = window.coding_hours() / active as f64;
    clamp_score(avg_hours / FOCUS_HOURS_TARGET * 100.0)
}

/// Rest days compared against an ideal of 4 per fortnight.
fn recovery_balance(window: &ActivityWindow) -> u8 {
    let rest = window.rest_days() as f64;
    clamp_score((1.0 - (rest - IDEAL_REST_DAYS).abs() / IDEAL_REST_DAYS) * 100.0)
}

/// Run the anti-gaming checks over the window.
///
/// Penalties are additive; a later check's reason overwrites an earlier one.
pub fn detect_gaming(window: &ActivityWindow) -> GamingCheck {
    let mut check = GamingCheck::clean();

    if window.coding_hours() > 40.0 && window.total_commits() < 10 {
        check.penalty += 10;
        check.reason = Some("long sessions, minimal output".to_string());
        tracing::debug!(
            hours = window.coding_hours(),
            commits = window.total_commits(),
            "gaming check: long sessions with minimal output"
        );
    }

    let batching = window
        .days()
        .iter()
        .any(|d| d.commits > 20 && d.peak_hour_commits() > 15);
    if batching {
        check.penalty += 5;
        check.reason = Some("commit batching".to_string());
        tracing::debug!("gaming check: commit batching detected");
    }

    check.detected = check.penalty > 0;
    check
}

fn clamp_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
