//! Daily verdict selection.
//!
//! Classifies "today" into one verdict category via a priority-ordered rule
//! table (first match wins), then fills a message template. Rules and copy
//! are decoupled: the rule table owns ordering and classification, templates
//! are a lookup keyed by verdict that the narrative collaborator can replace.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Verdict categories, most specific first in rule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKey {
    StreakMilestone,
    MomentumBuilding,
    ShippedRealProgress,
    ShowedUp,
    StreakDead,
    ProlongedAbsence,
    Inconsistent,
    RestDay,
    BusyNotProductive,
    AverageDay,
}

impl VerdictKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictKey::StreakMilestone => "streak_milestone",
            VerdictKey::MomentumBuilding => "momentum_building",
            VerdictKey::ShippedRealProgress => "shipped_real_progress",
            VerdictKey::ShowedUp => "showed_up",
            VerdictKey::StreakDead => "streak_dead",
            VerdictKey::ProlongedAbsence => "prolonged_absence",
            VerdictKey::Inconsistent => "inconsistent",
            VerdictKey::RestDay => "rest_day",
            VerdictKey::BusyNotProductive => "busy_not_productive",
            VerdictKey::AverageDay => "average_day",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "streak_milestone" => Some(VerdictKey::StreakMilestone),
            "momentum_building" => Some(VerdictKey::MomentumBuilding),
            "shipped_real_progress" => Some(VerdictKey::ShippedRealProgress),
            "showed_up" => Some(VerdictKey::ShowedUp),
            "streak_dead" => Some(VerdictKey::StreakDead),
            "prolonged_absence" => Some(VerdictKey::ProlongedAbsence),
            "inconsistent" => Some(VerdictKey::Inconsistent),
            "rest_day" => Some(VerdictKey::RestDay),
            "busy_not_productive" => Some(VerdictKey::BusyNotProductive),
            "average_day" => Some(VerdictKey::AverageDay),
            _ => None,
        }
    }
}

/// Which input drove the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryFactor {
    Streak,
    Shipping,
    Commits,
    Consistency,
    Rest,
}

impl PrimaryFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryFactor::Streak => "streak",
            PrimaryFactor::Shipping => "shipping",
            PrimaryFactor::Commits => "commits",
            PrimaryFactor::Consistency => "consistency",
            PrimaryFactor::Rest => "rest",
        }
    }
}

/// How the verdict should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Positive,
    Neutral,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Positive => "positive",
            Severity::Neutral => "neutral",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// Everything the rule table looks at for one day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VerdictContext {
    pub date: NaiveDate,
    /// Streak after today's advance.
    pub current_streak: u32,
    /// Streak before today's advance (nonzero when a streak just died).
    pub previous_streak: u32,
    pub today_commits: u32,
    pub today_prs: u32,
    /// Commits over the trailing 7 days.
    pub week_commits: u32,
    /// Active days over the trailing 7 days.
    pub active_days_in_week: u32,
    pub is_weekend: bool,
    /// Whether the user has any recorded activity at all.
    pub has_history: bool,
}

/// The selected verdict for one (user, date). Upsert-idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub date: NaiveDate,
    pub key: VerdictKey,
    pub text: String,
    pub subtext: String,
    pub severity: Severity,
    pub primary_factor: PrimaryFactor,
    pub score_change: i8,
}

type Predicate = fn(&VerdictContext) -> bool;

/// The ordered rule table. First match wins; the final rule always matches.
/// Branching rules from the product decision tree (milestone vs momentum,
/// absence vs inconsistency) are flattened into adjacent entries so ordering
/// stays explicit.
const RULES: &[(Predicate, VerdictKey, PrimaryFactor)] = &[
    (
        |c| c.current_streak >= 14 && c.today_commits > 0,
        VerdictKey::StreakMilestone,
        PrimaryFactor::Streak,
    ),
    (
        |c| c.current_streak >= 7 && c.today_commits > 0,
        VerdictKey::MomentumBuilding,
        PrimaryFactor::Streak,
    ),
    (
        |c| c.today_prs > 0,
        VerdictKey::ShippedRealProgress,
        PrimaryFactor::Shipping,
    ),
    (
        |c| c.today_commits > 5,
        VerdictKey::ShippedRealProgress,
        PrimaryFactor::Commits,
    ),
    (
        |c| c.is_weekend && c.today_commits > 0,
        VerdictKey::ShowedUp,
        PrimaryFactor::Commits,
    ),
    (
        |c| c.today_commits == 0 && c.current_streak == 0 && c.previous_streak > 0,
        VerdictKey::StreakDead,
        PrimaryFactor::Streak,
    ),
    (
        |c| c.today_commits == 0 && c.active_days_in_week < 2 && !c.has_history,
        VerdictKey::ProlongedAbsence,
        PrimaryFactor::Consistency,
    ),
    (
        |c| c.today_commits == 0 && c.active_days_in_week < 2,
        VerdictKey::Inconsistent,
        PrimaryFactor::Consistency,
    ),
    (
        |c| c.today_commits == 0,
        VerdictKey::RestDay,
        PrimaryFactor::Rest,
    ),
    (
        |c| c.active_days_in_week >= 5 && c.week_commits < 10,
        VerdictKey::BusyNotProductive,
        PrimaryFactor::Consistency,
    ),
    (|_| true, VerdictKey::AverageDay, PrimaryFactor::Consistency),
];

/// A message template with `{placeholder}` slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictTemplate {
    pub text: String,
    pub subtext: String,
    pub severity: Severity,
}

impl VerdictTemplate {
    fn new(text: &str, subtext: &str, severity: Severity) -> Self {
        Self {
            text: text.to_string(),
            subtext: subtext.to_string(),
            severity,
        }
    }
}

/// Template lookup keyed by verdict. Defaults ship with the engine; the
/// narrative collaborator owns final copy and can override any entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictTemplates {
    templates: HashMap<VerdictKey, VerdictTemplate>,
}

impl Default for VerdictTemplates {
    fn default() -> Self {
        let templates = HashMap::from([
            (
                VerdictKey::StreakMilestone,
                VerdictTemplate::new(
                    "{streak} days straight. This is what consistency looks like.",
                    "Another {commits} commits in the bank today.",
                    Severity::Positive,
                ),
            ),
            (
                VerdictKey::MomentumBuilding,
                VerdictTemplate::new(
                    "Momentum building: {streak} days and counting.",
                    "Keep the chain alive -- {commits} commits today.",
                    Severity::Positive,
                ),
            ),
            (
                VerdictKey::ShippedRealProgress,
                VerdictTemplate::new(
                    "Real progress shipped today.",
                    "{prs} PRs merged, {commits} commits.",
                    Severity::Positive,
                ),
            ),
            (
                VerdictKey::ShowedUp,
                VerdictTemplate::new(
                    "Weekend commits. You showed up when nobody asked.",
                    "{commits} commits on a day off.",
                    Severity::Positive,
                ),
            ),
            (
                VerdictKey::StreakDead,
                VerdictTemplate::new(
                    "Streak's dead. {previous_streak} days, gone.",
                    "It starts over tomorrow, or it doesn't.",
                    Severity::Critical,
                ),
            ),
            (
                VerdictKey::ProlongedAbsence,
                VerdictTemplate::new(
                    "No activity on record.",
                    "The first commit is the hardest one.",
                    Severity::Warning,
                ),
            ),
            (
                VerdictKey::Inconsistent,
                VerdictTemplate::new(
                    "Quiet again today.",
                    "{active_days} active days this week so far.",
                    Severity::Warning,
                ),
            ),
            (
                VerdictKey::RestDay,
                VerdictTemplate::new(
                    "Rest day.",
                    "Recovery is part of the job.",
                    Severity::Neutral,
                ),
            ),
            (
                VerdictKey::BusyNotProductive,
                VerdictTemplate::new(
                    "Busy, but is it moving?",
                    "{active_days} active days, only {week_commits} commits this week.",
                    Severity::Warning,
                ),
            ),
            (
                VerdictKey::AverageDay,
                VerdictTemplate::new(
                    "An average day. They add up.",
                    "{commits} commits today, {week_commits} this week.",
                    Severity::Neutral,
                ),
            ),
        ]);
        Self { templates }
    }
}

impl VerdictTemplates {
    /// Replace the copy for one verdict.
    pub fn set(&mut self, key: VerdictKey, template: VerdictTemplate) {
        self.templates.insert(key, template);
    }

    fn get(&self, key: VerdictKey) -> VerdictTemplate {
        self.templates.get(&key).cloned().unwrap_or_else(|| {
            VerdictTemplate::new("", "", Severity::Neutral)
        })
    }
}

/// Priority-ordered verdict selector.
#[derive(Debug, Clone, Default)]
pub struct VerdictSelector {
    templates: VerdictTemplates,
}

impl VerdictSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: VerdictTemplates) -> Self {
        Self { templates }
    }

    /// Classify the day and render its message. Deterministic in the
    /// context, so recomputation overwrites the stored row with the same
    /// value.
    pub fn select(&self, ctx: &VerdictContext) -> Verdict {
        let (_, key, primary_factor) = RULES
            .iter()
            .find(|(predicate, _, _)| predicate(ctx))
            .copied()
            // the final rule is a catch-all
            .unwrap_or((|_| true, VerdictKey::AverageDay, PrimaryFactor::Consistency));

        let template = self.templates.get(key);
        Verdict {
            date: ctx.date,
            key,
            text: render(&template.text, ctx),
            subtext: render(&template.subtext, ctx),
            severity: template.severity,
            primary_factor,
            score_change: score_change(ctx),
        }
    }
}

/// Daily score delta shown alongside the verdict: capped reward when active,
/// a flat -2 when not.
pub fn score_change(ctx: &VerdictContext) -> i8 {
    if ctx.today_commits > 0 {
        (ctx.today_commits / 2).min(5) as i8
    } else {
        -2
    }
}

/// Substitute `{placeholder}` slots from the context.
fn render(template: &str, ctx: &VerdictContext) -> String {
    template
        .replace("{streak}", &ctx.current_streak.to_string())
        .replace("{previous_streak}", &ctx.previous_streak.to_string())
        .replace("{commits}", &ctx.today_commits.to_string())
        .replace("{prs}", &ctx.today_prs.to_string())
        .replace("{week_commits}", &ctx.week_commits.to_string())
        .replace("{active_days}", &ctx.active_days_in_week.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> VerdictContext {
        VerdictContext {
            date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
            current_streak: 0,
            previous_streak: 0,
            today_commits: 0,
            today_prs: 0,
            week_commits: 0,
            active_days_in_week: 0,
            is_weekend: false,
            has_history: true,
        }
    }

    fn select(ctx: &VerdictContext) -> Verdict {
        VerdictSelector::new().select(ctx)
    }

    #[test]
    fn test_scenario_e_momentum_not_milestone() {
        let verdict = select(&VerdictContext {
            current_streak: 10,
            today_commits: 3,
            week_commits: 12,
            active_days_in_week: 6,
            ..ctx()
        });
        assert_eq!(verdict.key, VerdictKey::MomentumBuilding);
        assert_eq!(verdict.primary_factor, PrimaryFactor::Streak);
    }

    #[test]
    fn test_long_streak_is_milestone() {
        let verdict = select(&VerdictContext {
            current_streak: 14,
            today_commits: 1,
            ..ctx()
        });
        assert_eq!(verdict.key, VerdictKey::StreakMilestone);
        assert!(verdict.text.contains("14 days"));
    }

    #[test]
    fn test_streak_rule_outranks_pr_rule() {
        let verdict = select(&VerdictContext {
            current_streak: 9,
            today_commits: 2,
            today_prs: 3,
            ..ctx()
        });
        assert_eq!(verdict.key, VerdictKey::MomentumBuilding);
    }

    #[test]
    fn test_pr_shipped() {
        let verdict = select(&VerdictContext {
            today_prs: 2,
            today_commits: 1,
            ..ctx()
        });
        assert_eq!(verdict.key, VerdictKey::ShippedRealProgress);
        assert_eq!(verdict.primary_factor, PrimaryFactor::Shipping);
    }

    #[test]
    fn test_heavy_commit_day_shipped() {
        let verdict = select(&VerdictContext {
            today_commits: 6,
            ..ctx()
        });
        assert_eq!(verdict.key, VerdictKey::ShippedRealProgress);
        assert_eq!(verdict.primary_factor, PrimaryFactor::Commits);
    }

    #[test]
    fn test_weekend_showed_up() {
        let verdict = select(&VerdictContext {
            today_commits: 2,
            is_weekend: true,
            ..ctx()
        });
        assert_eq!(verdict.key, VerdictKey::ShowedUp);
    }

    #[test]
    fn test_streak_dead() {
        let verdict = select(&VerdictContext {
            previous_streak: 12,
            week_commits: 8,
            active_days_in_week: 4,
            ..ctx()
        });
        assert_eq!(verdict.key, VerdictKey::StreakDead);
        assert_eq!(verdict.severity, Severity::Critical);
        assert!(verdict.text.contains("12 days"));
    }

    #[test]
    fn test_prolonged_absence_requires_no_history() {
        let silent = VerdictContext {
            has_history: false,
            ..ctx()
        };
        assert_eq!(select(&silent).key, VerdictKey::ProlongedAbsence);

        let lapsed = VerdictContext {
            has_history: true,
            active_days_in_week: 1,
            ..ctx()
        };
        assert_eq!(select(&lapsed).key, VerdictKey::Inconsistent);
    }

    #[test]
    fn test_rest_day() {
        let verdict = select(&VerdictContext {
            active_days_in_week: 4,
            week_commits: 9,
            ..ctx()
        });
        assert_eq!(verdict.key, VerdictKey::RestDay);
        assert_eq!(verdict.score_change, -2);
    }

    #[test]
    fn test_busy_not_productive() {
        // active today (rules 1-7 skipped) but a thin week
        let verdict = select(&VerdictContext {
            today_commits: 1,
            active_days_in_week: 5,
            week_commits: 7,
            ..ctx()
        });
        assert_eq!(verdict.key, VerdictKey::BusyNotProductive);
        assert_eq!(verdict.severity, Severity::Warning);
    }

    #[test]
    fn test_average_day_fallback() {
        let verdict = select(&VerdictContext {
            today_commits: 3,
            week_commits: 15,
            active_days_in_week: 4,
            ..ctx()
        });
        assert_eq!(verdict.key, VerdictKey::AverageDay);
    }

    #[test]
    fn test_score_change_caps() {
        assert_eq!(score_change(&VerdictContext { today_commits: 3, ..ctx() }), 1);
        assert_eq!(score_change(&VerdictContext { today_commits: 10, ..ctx() }), 5);
        assert_eq!(score_change(&VerdictContext { today_commits: 40, ..ctx() }), 5);
        assert_eq!(score_change(&ctx()), -2);
    }

    #[test]
    fn test_template_override_and_rendering() {
        let mut templates = VerdictTemplates::default();
        templates.set(
            VerdictKey::RestDay,
            VerdictTemplate::new("Off day after {week_commits} commits.", "", Severity::Neutral),
        );
        let selector = VerdictSelector::with_templates(templates);
        let verdict = selector.select(&VerdictContext {
            week_commits: 21,
            active_days_in_week: 5,
            ..ctx()
        });
        assert_eq!(verdict.text, "Off day after 21 commits.");
    }

    #[test]
    fn test_selection_is_idempotent() {
        let context = VerdictContext {
            current_streak: 8,
            today_commits: 4,
            week_commits: 20,
            active_days_in_week: 6,
            ..ctx()
        };
        assert_eq!(select(&context), select(&context));
    }
}
