//! Activity data model.
//!
//! `ActivityDay` is one user-local calendar day of GitHub facts, produced by
//! the external ingestion job and immutable once recorded. `ActivityWindow`
//! is a contiguous-by-calendar-day sequence of days ending at an anchor date;
//! calendar gaps are filled with zero-activity days, not treated as missing
//! data. Every calculator in this crate consumes windows, never raw rows.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Window length for productivity scoring.
pub const SCORING_WINDOW_DAYS: usize = 14;
/// Window length for XP and verdict weekly deltas.
pub const DELTA_WINDOW_DAYS: usize = 7;
/// Window length for personal-best lookups.
pub const PERSONAL_BEST_WINDOW_DAYS: usize = 30;

/// One calendar day of activity facts for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDay {
    /// Calendar date (user-local)
    pub date: NaiveDate,
    pub commits: u32,
    pub prs_opened: u32,
    pub prs_merged: u32,
    pub issues_closed: u32,
    pub lines_added: u32,
    pub lines_deleted: u32,
    pub coding_minutes: u32,
    /// Commit count per hour of day (0-23)
    pub commits_by_hour: [u32; 24],
    pub is_weekend: bool,
    /// Lines of code per language for the day
    #[serde(default)]
    pub languages: HashMap<String, u32>,
}

impl ActivityDay {
    /// A zero-activity day for the given date.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            commits: 0,
            prs_opened: 0,
            prs_merged: 0,
            issues_closed: 0,
            lines_added: 0,
            lines_deleted: 0,
            coding_minutes: 0,
            commits_by_hour: [0; 24],
            is_weekend: is_weekend(date),
            languages: HashMap::new(),
        }
    }

    /// A day counts as active when it has at least one commit.
    pub fn is_active(&self) -> bool {
        self.commits > 0
    }

    /// Largest single-hour commit count for the day.
    pub fn peak_hour_commits(&self) -> u32 {
        self.commits_by_hour.iter().copied().max().unwrap_or(0)
    }

    /// Coding time in hours.
    pub fn coding_hours(&self) -> f64 {
        self.coding_minutes as f64 / 60.0
    }
}

/// Whether a date falls on Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Untrusted activity record as emitted by the ingestion job.
///
/// Counts are signed here so that malformed negative inputs can be clamped to
/// zero at this boundary -- negative values never reach the calculators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawActivityDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub commits: i64,
    #[serde(default)]
    pub prs_opened: i64,
    #[serde(default)]
    pub prs_merged: i64,
    #[serde(default)]
    pub issues_closed: i64,
    #[serde(default)]
    pub lines_added: i64,
    #[serde(default)]
    pub lines_deleted: i64,
    #[serde(default)]
    pub coding_minutes: i64,
    #[serde(default)]
    pub commits_by_hour: Vec<i64>,
    #[serde(default)]
    pub languages: HashMap<String, i64>,
}

impl RawActivityDay {
    /// Clamp negative counts to zero and produce an immutable `ActivityDay`.
    pub fn sanitize(self) -> ActivityDay {
        let mut commits_by_hour = [0u32; 24];
        for (hour, count) in self.commits_by_hour.iter().take(24).enumerate() {
            commits_by_hour[hour] = clamp_count(*count);
        }
        ActivityDay {
            date: self.date,
            commits: clamp_count(self.commits),
            prs_opened: clamp_count(self.prs_opened),
            prs_merged: clamp_count(self.prs_merged),
            issues_closed: clamp_count(self.issues_closed),
            lines_added: clamp_count(self.lines_added),
            lines_deleted: clamp_count(self.lines_deleted),
            coding_minutes: clamp_count(self.coding_minutes),
            commits_by_hour,
            is_weekend: is_weekend(self.date),
            languages: self
                .languages
                .into_iter()
                .map(|(lang, lines)| (lang, clamp_count(lines)))
                .collect(),
        }
    }
}

fn clamp_count(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

/// An ordered, contiguous sequence of `ActivityDay` covering exactly N days
/// ending at the anchor date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityWindow {
    days: Vec<ActivityDay>,
}

impl ActivityWindow {
    /// Build a window of `len` days ending at `end_date` from whatever rows
    /// exist. Days without a row become zero-activity days; rows outside the
    /// range are ignored.
    pub fn from_days(
        end_date: NaiveDate,
        len: usize,
        days: impl IntoIterator<Item = ActivityDay>,
    ) -> Self {
        let len = len.max(1);
        let start = end_date - chrono::Duration::days(len as i64 - 1);
        let mut by_date: HashMap<NaiveDate, ActivityDay> = days
            .into_iter()
            .filter(|d| d.date >= start && d.date <= end_date)
            .map(|d| (d.date, d))
            .collect();

        let days = (0..len)
            .map(|offset| {
                let date = start + chrono::Duration::days(offset as i64);
                by_date.remove(&date).unwrap_or_else(|| ActivityDay::empty(date))
            })
            .collect();

        Self { days }
    }

    /// An all-empty window ending at `end_date`.
    pub fn empty(end_date: NaiveDate, len: usize) -> Self {
        Self::from_days(end_date, len, std::iter::empty())
    }

    pub fn days(&self) -> &[ActivityDay] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// The anchor ("today") date of the window.
    pub fn end_date(&self) -> NaiveDate {
        // from_days guarantees at least one day
        self.days[self.days.len() - 1].date
    }

    /// The anchor ("today") day of the window.
    pub fn today(&self) -> &ActivityDay {
        &self.days[self.days.len() - 1]
    }

    /// The trailing `n` days as a new window.
    pub fn trailing(&self, n: usize) -> ActivityWindow {
        let n = n.clamp(1, self.days.len());
        Self {
            days: self.days[self.days.len() - n..].to_vec(),
        }
    }

    pub fn total_commits(&self) -> u32 {
        self.days.iter().map(|d| d.commits).sum()
    }

    pub fn total_prs_merged(&self) -> u32 {
        self.days.iter().map(|d| d.prs_merged).sum()
    }

    pub fn total_prs_opened(&self) -> u32 {
        self.days.iter().map(|d| d.prs_opened).sum()
    }

    pub fn total_coding_minutes(&self) -> u32 {
        self.days.iter().map(|d| d.coding_minutes).sum()
    }

    pub fn coding_hours(&self) -> f64 {
        self.total_coding_minutes() as f64 / 60.0
    }

    /// Number of days with at least one commit.
    pub fn active_days(&self) -> u32 {
        self.days.iter().filter(|d| d.is_active()).count() as u32
    }

    /// Number of days with no commits.
    pub fn rest_days(&self) -> u32 {
        self.days.len() as u32 - self.active_days()
    }

    /// Single-day records across the window.
    pub fn personal_bests(&self) -> PersonalBests {
        let mut bests = PersonalBests::default();
        for day in &self.days {
            if day.commits > bests.max_commits {
                bests.max_commits = day.commits;
                bests.max_commits_date = Some(day.date);
            }
            if day.prs_merged > bests.max_prs_merged {
                bests.max_prs_merged = day.prs_merged;
                bests.max_prs_merged_date = Some(day.date);
            }
            if day.coding_minutes > bests.max_coding_minutes {
                bests.max_coding_minutes = day.coding_minutes;
                bests.max_coding_minutes_date = Some(day.date);
            }
        }
        bests
    }
}

/// Best single-day marks within a window (30-day lookback by convention).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalBests {
    pub max_commits: u32,
    pub max_commits_date: Option<NaiveDate>,
    pub max_prs_merged: u32,
    pub max_prs_merged_date: Option<NaiveDate>,
    pub max_coding_minutes: u32,
    pub max_coding_minutes_date: Option<NaiveDate>,
}
