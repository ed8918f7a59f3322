//! SQLite persistence for the engine's inputs and outputs.
//!
//! The engine itself never touches the database; this module is the
//! persistence collaborator the host layer uses around it. Snapshot and
//! verdict writes are idempotent upserts keyed by (user, date), the XP
//! ledger is append-only, and streak state carries an optimistic version
//! column so concurrent sync jobs cannot both advance the same user.

use chrono::NaiveDate;
use indoc::indoc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::activity::{ActivityDay, ActivityWindow, RawActivityDay};
use crate::error::StoreError;
use crate::score::{ComponentScores, GamingCheck, LeaderboardSnapshot, ScoreSnapshot};
use crate::streak::StreakState;
use crate::verdict::{PrimaryFactor, Severity, Verdict, VerdictKey};
use crate::xp::{XpLedgerEntry, XpSource};

const SCHEMA: &str = indoc! {"
    CREATE TABLE IF NOT EXISTS activity_days (
        user_id         TEXT NOT NULL,
        date            TEXT NOT NULL,
        commits         INTEGER NOT NULL DEFAULT 0,
        prs_opened      INTEGER NOT NULL DEFAULT 0,
        prs_merged      INTEGER NOT NULL DEFAULT 0,
        issues_closed   INTEGER NOT NULL DEFAULT 0,
        lines_added     INTEGER NOT NULL DEFAULT 0,
        lines_deleted   INTEGER NOT NULL DEFAULT 0,
        coding_minutes  INTEGER NOT NULL DEFAULT 0,
        commits_by_hour TEXT NOT NULL DEFAULT '[]',
        is_weekend      INTEGER NOT NULL DEFAULT 0,
        languages       TEXT NOT NULL DEFAULT '{}',
        PRIMARY KEY (user_id, date)
    );

    CREATE TABLE IF NOT EXISTS score_snapshots (
        user_id             TEXT NOT NULL,
        date                TEXT NOT NULL,
        building_ratio      INTEGER NOT NULL,
        consistency         INTEGER NOT NULL,
        shipping_frequency  INTEGER NOT NULL,
        focus_depth         INTEGER NOT NULL,
        recovery_balance    INTEGER NOT NULL,
        raw_weighted_total  INTEGER NOT NULL,
        gaming_detected     INTEGER NOT NULL,
        gaming_penalty      INTEGER NOT NULL,
        gaming_reason       TEXT,
        final_score         INTEGER NOT NULL,
        change_from_yesterday INTEGER NOT NULL,
        percentile          INTEGER NOT NULL,
        global_average      INTEGER NOT NULL,
        computed_at         TEXT NOT NULL,
        PRIMARY KEY (user_id, date)
    );

    CREATE TABLE IF NOT EXISTS streak_states (
        user_id                 TEXT PRIMARY KEY,
        current_streak          INTEGER NOT NULL DEFAULT 0,
        longest_streak          INTEGER NOT NULL DEFAULT 0,
        last_activity_date      TEXT,
        freeze_days_available   INTEGER NOT NULL DEFAULT 0,
        freeze_days_used_total  INTEGER NOT NULL DEFAULT 0,
        last_freeze_earned_date TEXT,
        gap_protected           INTEGER NOT NULL DEFAULT 0,
        version                 INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS xp_ledger (
        id          TEXT PRIMARY KEY,
        user_id     TEXT NOT NULL,
        source      TEXT NOT NULL,
        amount      INTEGER NOT NULL,
        timestamp   TEXT NOT NULL,
        awarded_for TEXT,
        metadata    TEXT NOT NULL DEFAULT 'null'
    );

    CREATE TABLE IF NOT EXISTS verdicts (
        user_id        TEXT NOT NULL,
        date           TEXT NOT NULL,
        verdict_key    TEXT NOT NULL,
        text           TEXT NOT NULL,
        subtext        TEXT NOT NULL,
        severity       TEXT NOT NULL,
        primary_factor TEXT NOT NULL,
        score_change   INTEGER NOT NULL,
        PRIMARY KEY (user_id, date)
    );

    CREATE INDEX IF NOT EXISTS idx_activity_user_date ON activity_days(user_id, date);
    CREATE INDEX IF NOT EXISTS idx_xp_user ON xp_ledger(user_id);
    CREATE INDEX IF NOT EXISTS idx_xp_user_awarded_for ON xp_ledger(user_id, awarded_for);
    CREATE INDEX IF NOT EXISTS idx_snapshots_user_date ON score_snapshots(user_id, date);
"};

/// A streak state together with its optimistic version.
///
/// `version` is 0 for users with no stored row; `save_streak` with an
/// expected version of 0 inserts, any other value does a compare-and-swap
/// update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedStreak {
    pub state: StreakState,
    pub version: i64,
}

/// SQLite database for engine inputs and outputs.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/devpulse.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = super::data_dir()?.join("devpulse.db");
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests, ephemeral runs).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ── Activity ─────────────────────────────────────────────────────

    /// Upsert one day of activity. Re-ingesting the same (user, date)
    /// overwrites the row.
    pub fn upsert_activity_day(&self, user: &str, day: &ActivityDay) -> Result<(), StoreError> {
        let commits_by_hour = serde_json::to_string(&day.commits_by_hour)
            .map_err(|e| corrupt("commits_by_hour", e))?;
        let languages =
            serde_json::to_string(&day.languages).map_err(|e| corrupt("languages", e))?;
        self.conn.execute(
            indoc! {"
                INSERT INTO activity_days (
                    user_id, date, commits, prs_opened, prs_merged, issues_closed,
                    lines_added, lines_deleted, coding_minutes, commits_by_hour,
                    is_weekend, languages
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT(user_id, date) DO UPDATE SET
                    commits = excluded.commits,
                    prs_opened = excluded.prs_opened,
                    prs_merged = excluded.prs_merged,
                    issues_closed = excluded.issues_closed,
                    lines_added = excluded.lines_added,
                    lines_deleted = excluded.lines_deleted,
                    coding_minutes = excluded.coding_minutes,
                    commits_by_hour = excluded.commits_by_hour,
                    is_weekend = excluded.is_weekend,
                    languages = excluded.languages
            "},
            params![
                user,
                day.date.to_string(),
                day.commits,
                day.prs_opened,
                day.prs_merged,
                day.issues_closed,
                day.lines_added,
                day.lines_deleted,
                day.coding_minutes,
                commits_by_hour,
                day.is_weekend,
                languages,
            ],
        )?;
        Ok(())
    }

    /// Load a gap-filled window of `len` days ending at `end_date`.
    pub fn activity_window(
        &self,
        user: &str,
        end_date: NaiveDate,
        len: usize,
    ) -> Result<ActivityWindow, StoreError> {
        let start = end_date - chrono::Duration::days(len.max(1) as i64 - 1);
        let mut stmt = self.conn.prepare(indoc! {"
            SELECT date, commits, prs_opened, prs_merged, issues_closed,
                   lines_added, lines_deleted, coding_minutes, commits_by_hour, languages
            FROM activity_days
            WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
            ORDER BY date
        "})?;

        let rows = stmt.query_map(
            params![user, start.to_string(), end_date.to_string()],
            |row| {
                Ok(RawActivityDay {
                    date: parse_date_col(row.get::<_, String>(0)?),
                    commits: row.get(1)?,
                    prs_opened: row.get(2)?,
                    prs_merged: row.get(3)?,
                    issues_closed: row.get(4)?,
                    lines_added: row.get(5)?,
                    lines_deleted: row.get(6)?,
                    coding_minutes: row.get(7)?,
                    commits_by_hour: serde_json::from_str(&row.get::<_, String>(8)?)
                        .unwrap_or_default(),
                    languages: serde_json::from_str(&row.get::<_, String>(9)?)
                        .unwrap_or_default(),
                })
            },
        )?;

        let mut days = Vec::new();
        for row in rows {
            days.push(row?.sanitize());
        }
        Ok(ActivityWindow::from_days(end_date, len, days))
    }

    // ── Score snapshots ──────────────────────────────────────────────

    /// Upsert the snapshot for (user, date). Recomputation overwrites.
    pub fn upsert_score_snapshot(
        &self,
        user: &str,
        snapshot: &ScoreSnapshot,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            indoc! {"
                INSERT INTO score_snapshots (
                    user_id, date, building_ratio, consistency, shipping_frequency,
                    focus_depth, recovery_balance, raw_weighted_total,
                    gaming_detected, gaming_penalty, gaming_reason, final_score,
                    change_from_yesterday, percentile, global_average, computed_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                ON CONFLICT(user_id, date) DO UPDATE SET
                    building_ratio = excluded.building_ratio,
                    consistency = excluded.consistency,
                    shipping_frequency = excluded.shipping_frequency,
                    focus_depth = excluded.focus_depth,
                    recovery_balance = excluded.recovery_balance,
                    raw_weighted_total = excluded.raw_weighted_total,
                    gaming_detected = excluded.gaming_detected,
                    gaming_penalty = excluded.gaming_penalty,
                    gaming_reason = excluded.gaming_reason,
                    final_score = excluded.final_score,
                    change_from_yesterday = excluded.change_from_yesterday,
                    percentile = excluded.percentile,
                    global_average = excluded.global_average,
                    computed_at = excluded.computed_at
            "},
            params![
                user,
                snapshot.date.to_string(),
                snapshot.components.building_ratio,
                snapshot.components.consistency,
                snapshot.components.shipping_frequency,
                snapshot.components.focus_depth,
                snapshot.components.recovery_balance,
                snapshot.raw_weighted_total,
                snapshot.gaming.detected,
                snapshot.gaming.penalty,
                snapshot.gaming.reason,
                snapshot.final_score,
                snapshot.change_from_yesterday,
                snapshot.percentile,
                snapshot.global_average,
                snapshot.computed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn score_snapshot(
        &self,
        user: &str,
        date: NaiveDate,
    ) -> Result<Option<ScoreSnapshot>, StoreError> {
        let mut stmt = self.conn.prepare(indoc! {"
            SELECT date, building_ratio, consistency, shipping_frequency, focus_depth,
                   recovery_balance, raw_weighted_total, gaming_detected, gaming_penalty,
                   gaming_reason, final_score, change_from_yesterday, percentile,
                   global_average, computed_at
            FROM score_snapshots
            WHERE user_id = ?1 AND date = ?2
        "})?;
        let snapshot = stmt
            .query_row(params![user, date.to_string()], row_to_snapshot)
            .optional()?;
        Ok(snapshot)
    }

    /// The most recent `limit` snapshots, newest first.
    pub fn score_history(
        &self,
        user: &str,
        limit: usize,
    ) -> Result<Vec<ScoreSnapshot>, StoreError> {
        let mut stmt = self.conn.prepare(indoc! {"
            SELECT date, building_ratio, consistency, shipping_frequency, focus_depth,
                   recovery_balance, raw_weighted_total, gaming_detected, gaming_penalty,
                   gaming_reason, final_score, change_from_yesterday, percentile,
                   global_average, computed_at
            FROM score_snapshots
            WHERE user_id = ?1
            ORDER BY date DESC
            LIMIT ?2
        "})?;
        let rows = stmt.query_map(params![user, limit as i64], row_to_snapshot)?;
        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(row?);
        }
        Ok(snapshots)
    }

    /// Latest final score per user -- the injected leaderboard input.
    pub fn leaderboard(&self) -> Result<LeaderboardSnapshot, StoreError> {
        let mut stmt = self.conn.prepare(indoc! {"
            SELECT s.final_score
            FROM score_snapshots s
            WHERE s.date = (
                SELECT MAX(date) FROM score_snapshots WHERE user_id = s.user_id
            )
        "})?;
        let rows = stmt.query_map([], |row| row.get::<_, u8>(0))?;
        let mut scores = Vec::new();
        for row in rows {
            scores.push(row?);
        }
        Ok(LeaderboardSnapshot::new(scores))
    }

    // ── Streak state ─────────────────────────────────────────────────

    /// Load a user's streak state with its version (0 when absent).
    pub fn streak(&self, user: &str) -> Result<VersionedStreak, StoreError> {
        let mut stmt = self.conn.prepare(indoc! {"
            SELECT current_streak, longest_streak, last_activity_date,
                   freeze_days_available, freeze_days_used_total,
                   last_freeze_earned_date, gap_protected, version
            FROM streak_states
            WHERE user_id = ?1
        "})?;
        let found = stmt
            .query_row(params![user], |row| {
                Ok(VersionedStreak {
                    state: StreakState {
                        current_streak: row.get(0)?,
                        longest_streak: row.get(1)?,
                        last_activity_date: row
                            .get::<_, Option<String>>(2)?
                            .map(parse_date_col),
                        freeze_days_available: row.get(3)?,
                        freeze_days_used_total: row.get(4)?,
                        last_freeze_earned_date: row
                            .get::<_, Option<String>>(5)?
                            .map(parse_date_col),
                        gap_protected: row.get(6)?,
                    },
                    version: row.get(7)?,
                })
            })
            .optional()?;
        Ok(found.unwrap_or(VersionedStreak {
            state: StreakState::default(),
            version: 0,
        }))
    }

    /// Save streak state with an optimistic version check.
    ///
    /// `expected_version` must match what `streak()` returned; on mismatch
    /// (another writer advanced the row) this returns `ConflictingUpdate`
    /// and the caller should re-read and retry the evaluation once.
    pub fn save_streak(
        &self,
        user: &str,
        state: &StreakState,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        let changed = if expected_version == 0 {
            self.conn.execute(
                indoc! {"
                    INSERT INTO streak_states (
                        user_id, current_streak, longest_streak, last_activity_date,
                        freeze_days_available, freeze_days_used_total,
                        last_freeze_earned_date, gap_protected, version
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)
                    ON CONFLICT(user_id) DO NOTHING
                "},
                params![
                    user,
                    state.current_streak,
                    state.longest_streak,
                    state.last_activity_date.map(|d| d.to_string()),
                    state.freeze_days_available,
                    state.freeze_days_used_total,
                    state.last_freeze_earned_date.map(|d| d.to_string()),
                    state.gap_protected,
                ],
            )?
        } else {
            self.conn.execute(
                indoc! {"
                    UPDATE streak_states SET
                        current_streak = ?2,
                        longest_streak = ?3,
                        last_activity_date = ?4,
                        freeze_days_available = ?5,
                        freeze_days_used_total = ?6,
                        last_freeze_earned_date = ?7,
                        gap_protected = ?8,
                        version = version + 1
                    WHERE user_id = ?1 AND version = ?9
                "},
                params![
                    user,
                    state.current_streak,
                    state.longest_streak,
                    state.last_activity_date.map(|d| d.to_string()),
                    state.freeze_days_available,
                    state.freeze_days_used_total,
                    state.last_freeze_earned_date.map(|d| d.to_string()),
                    state.gap_protected,
                    expected_version,
                ],
            )?
        };

        if changed != 1 {
            return Err(StoreError::ConflictingUpdate {
                user: user.to_string(),
                expected: expected_version,
            });
        }
        Ok(expected_version + 1)
    }

    // ── XP ledger ────────────────────────────────────────────────────

    /// Append one ledger entry. `awarded_for` tags daily-sync awards with
    /// their activity date so a re-sync can skip already-granted XP.
    pub fn append_xp(
        &self,
        user: &str,
        entry: &XpLedgerEntry,
        awarded_for: Option<NaiveDate>,
    ) -> Result<(), StoreError> {
        let metadata =
            serde_json::to_string(&entry.metadata).map_err(|e| corrupt("metadata", e))?;
        self.conn.execute(
            indoc! {"
                INSERT INTO xp_ledger (id, user_id, source, amount, timestamp, awarded_for, metadata)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "},
            params![
                entry.id.to_string(),
                user,
                entry.source.as_str(),
                entry.amount,
                entry.timestamp.to_rfc3339(),
                awarded_for.map(|d| d.to_string()),
                metadata,
            ],
        )?;
        Ok(())
    }

    /// Running ledger sum for a user.
    pub fn total_xp(&self, user: &str) -> Result<u64, StoreError> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM xp_ledger WHERE user_id = ?1",
            params![user],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    /// Whether daily-sync XP was already granted for this activity date.
    pub fn sync_xp_granted(&self, user: &str, date: NaiveDate) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM xp_ledger WHERE user_id = ?1 AND awarded_for = ?2",
            params![user, date.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// The most recent `limit` ledger entries, newest first.
    pub fn xp_entries(&self, user: &str, limit: usize) -> Result<Vec<XpLedgerEntry>, StoreError> {
        let mut stmt = self.conn.prepare(indoc! {"
            SELECT id, source, amount, timestamp, metadata
            FROM xp_ledger
            WHERE user_id = ?1
            ORDER BY timestamp DESC
            LIMIT ?2
        "})?;
        let rows = stmt.query_map(params![user, limit as i64], |row| {
            let id: String = row.get(0)?;
            let source: String = row.get(1)?;
            let timestamp: String = row.get(3)?;
            let metadata: String = row.get(4)?;
            Ok(XpLedgerEntry {
                id: id.parse().unwrap_or_default(),
                source: XpSource::parse(&source).unwrap_or(XpSource::AchievementUnlocked),
                amount: row.get(2)?,
                timestamp: timestamp
                    .parse()
                    .unwrap_or_else(|_| chrono::Utc::now()),
                metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    // ── Verdicts ─────────────────────────────────────────────────────

    /// Upsert the verdict for (user, date). Recomputation overwrites.
    pub fn upsert_verdict(&self, user: &str, verdict: &Verdict) -> Result<(), StoreError> {
        self.conn.execute(
            indoc! {"
                INSERT INTO verdicts (
                    user_id, date, verdict_key, text, subtext, severity,
                    primary_factor, score_change
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(user_id, date) DO UPDATE SET
                    verdict_key = excluded.verdict_key,
                    text = excluded.text,
                    subtext = excluded.subtext,
                    severity = excluded.severity,
                    primary_factor = excluded.primary_factor,
                    score_change = excluded.score_change
            "},
            params![
                user,
                verdict.date.to_string(),
                verdict.key.as_str(),
                verdict.text,
                verdict.subtext,
                verdict.severity.as_str(),
                verdict.primary_factor.as_str(),
                verdict.score_change,
            ],
        )?;
        Ok(())
    }

    pub fn verdict(&self, user: &str, date: NaiveDate) -> Result<Option<Verdict>, StoreError> {
        let mut stmt = self.conn.prepare(indoc! {"
            SELECT date, verdict_key, text, subtext, severity, primary_factor, score_change
            FROM verdicts
            WHERE user_id = ?1 AND date = ?2
        "})?;
        let verdict = stmt
            .query_row(params![user, date.to_string()], |row| {
                let key: String = row.get(1)?;
                let severity: String = row.get(4)?;
                let factor: String = row.get(5)?;
                Ok(Verdict {
                    date: parse_date_col(row.get::<_, String>(0)?),
                    key: VerdictKey::parse(&key).unwrap_or(VerdictKey::AverageDay),
                    text: row.get(2)?,
                    subtext: row.get(3)?,
                    severity: parse_severity(&severity),
                    primary_factor: parse_factor(&factor),
                    score_change: row.get(6)?,
                })
            })
            .optional()?;
        Ok(verdict)
    }
}

fn row_to_snapshot(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScoreSnapshot> {
    let computed_at: String = row.get(14)?;
    Ok(ScoreSnapshot {
        date: parse_date_col(row.get::<_, String>(0)?),
        components: ComponentScores {
            building_ratio: row.get(1)?,
            consistency: row.get(2)?,
            shipping_frequency: row.get(3)?,
            focus_depth: row.get(4)?,
            recovery_balance: row.get(5)?,
        },
        raw_weighted_total: row.get(6)?,
        gaming: GamingCheck {
            detected: row.get(7)?,
            penalty: row.get(8)?,
            reason: row.get(9)?,
        },
        final_score: row.get(10)?,
        change_from_yesterday: row.get(11)?,
        percentile: row.get(12)?,
        global_average: row.get(13)?,
        computed_at: computed_at
            .parse()
            .unwrap_or_else(|_| chrono::Utc::now().into()),
    })
}

/// Dates are stored as `YYYY-MM-DD` text; a row that fails to parse maps to
/// the epoch date rather than poisoning the whole query.
fn parse_date_col(raw: String) -> NaiveDate {
    raw.parse().unwrap_or_default()
}

fn parse_severity(raw: &str) -> Severity {
    match raw {
        "positive" => Severity::Positive,
        "warning" => Severity::Warning,
        "critical" => Severity::Critical,
        _ => Severity::Neutral,
    }
}

fn parse_factor(raw: &str) -> PrimaryFactor {
    match raw {
        "streak" => PrimaryFactor::Streak,
        "shipping" => PrimaryFactor::Shipping,
        "commits" => PrimaryFactor::Commits,
        "rest" => PrimaryFactor::Rest,
        _ => PrimaryFactor::Consistency,
    }
}

fn corrupt(column: &str, err: serde_json::Error) -> StoreError {
    StoreError::CorruptColumn {
        column: column.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{LeaderboardSnapshot, ScoreCalculator};
    use crate::verdict::{VerdictContext, VerdictSelector};
    use chrono::Utc;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_day(d: NaiveDate, commits: u32) -> ActivityDay {
        let mut day = ActivityDay::empty(d);
        day.commits = commits;
        day.coding_minutes = 90;
        day.commits_by_hour[11] = commits;
        day.languages.insert("rust".to_string(), 120);
        day
    }

    #[test]
    fn test_activity_upsert_round_trip_and_idempotence() {
        let db = Database::open_memory().unwrap();
        let day = sample_day(date(2026, 8, 3), 5);

        db.upsert_activity_day("mira", &day).unwrap();
        db.upsert_activity_day("mira", &day).unwrap();

        let window = db.activity_window("mira", date(2026, 8, 3), 7).unwrap();
        assert_eq!(window.total_commits(), 5);
        assert_eq!(window.today().languages["rust"], 120);
        assert_eq!(window.today().commits_by_hour[11], 5);

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM activity_days", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_snapshot_upsert_overwrites() {
        let db = Database::open_memory().unwrap();
        let window = ActivityWindow::from_days(
            date(2026, 8, 10),
            14,
            vec![sample_day(date(2026, 8, 10), 8)],
        );
        let calc = ScoreCalculator::new();
        let snapshot = calc.calculate(&window, Some(50), &LeaderboardSnapshot::default());

        db.upsert_score_snapshot("mira", &snapshot).unwrap();
        db.upsert_score_snapshot("mira", &snapshot).unwrap();

        let loaded = db.score_snapshot("mira", date(2026, 8, 10)).unwrap().unwrap();
        assert_eq!(loaded.final_score, snapshot.final_score);
        assert_eq!(loaded.components, snapshot.components);
        assert_eq!(loaded.gaming, snapshot.gaming);

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM score_snapshots", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_streak_version_conflict() {
        let db = Database::open_memory().unwrap();
        let loaded = db.streak("mira").unwrap();
        assert_eq!(loaded.version, 0);

        let mut state = loaded.state;
        state.current_streak = 1;
        state.last_activity_date = Some(date(2026, 8, 3));
        let v1 = db.save_streak("mira", &state, 0).unwrap();
        assert_eq!(v1, 1);

        // stale writer: still holds version 0
        let err = db.save_streak("mira", &state, 0).unwrap_err();
        assert!(matches!(err, StoreError::ConflictingUpdate { .. }));

        // fresh writer succeeds
        state.current_streak = 2;
        let v2 = db.save_streak("mira", &state, v1).unwrap();
        assert_eq!(v2, 2);
        assert_eq!(db.streak("mira").unwrap().state.current_streak, 2);
    }

    #[test]
    fn test_xp_append_and_total() {
        let db = Database::open_memory().unwrap();
        let entry = XpLedgerEntry {
            id: Uuid::new_v4(),
            source: XpSource::PrMerged,
            amount: 50,
            timestamp: Utc::now(),
            metadata: serde_json::json!({"pr": 42}),
        };
        db.append_xp("mira", &entry, Some(date(2026, 8, 3))).unwrap();
        assert_eq!(db.total_xp("mira").unwrap(), 50);
        assert!(db.sync_xp_granted("mira", date(2026, 8, 3)).unwrap());
        assert!(!db.sync_xp_granted("mira", date(2026, 8, 4)).unwrap());

        let entries = db.xp_entries("mira", 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, XpSource::PrMerged);
        assert_eq!(entries[0].metadata["pr"], 42);
    }

    #[test]
    fn test_verdict_upsert_round_trip() {
        let db = Database::open_memory().unwrap();
        let ctx = VerdictContext {
            date: date(2026, 8, 3),
            current_streak: 8,
            previous_streak: 7,
            today_commits: 4,
            today_prs: 0,
            week_commits: 15,
            active_days_in_week: 5,
            is_weekend: false,
            has_history: true,
        };
        let verdict = VerdictSelector::new().select(&ctx);

        db.upsert_verdict("mira", &verdict).unwrap();
        db.upsert_verdict("mira", &verdict).unwrap();

        let loaded = db.verdict("mira", date(2026, 8, 3)).unwrap().unwrap();
        assert_eq!(loaded, verdict);

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM verdicts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_leaderboard_uses_latest_score_per_user() {
        let db = Database::open_memory().unwrap();
        let calc = ScoreCalculator::new();
        let board = LeaderboardSnapshot::default();

        for (user, day, commits) in [
            ("mira", date(2026, 8, 1), 2),
            ("mira", date(2026, 8, 2), 10),
            ("kai", date(2026, 8, 2), 4),
        ] {
            let window =
                ActivityWindow::from_days(day, 14, vec![sample_day(day, commits)]);
            let snapshot = calc.calculate(&window, None, &board);
            db.upsert_score_snapshot(user, &snapshot).unwrap();
        }

        let leaderboard = db.leaderboard().unwrap();
        assert_eq!(leaderboard.scores.len(), 2);
    }
}
