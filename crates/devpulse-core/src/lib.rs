//! # DevPulse Core Library
//!
//! This library provides the core business logic for DevPulse, a developer
//! activity gamification engine. Daily GitHub activity records go in; a
//! productivity score, streak state, XP awards, and a daily verdict come out.
//! All calculators are pure -- inputs are pre-fetched by the caller and
//! outputs are returned as values -- so evaluations for different users can
//! run fully in parallel.
//!
//! ## Architecture
//!
//! - **Activity**: immutable per-day facts and gap-filled windows over them
//! - **Score**: five weighted components plus an anti-gaming penalty
//! - **Streak**: a state machine with a 48h grace window and freeze insurance
//! - **XP**: an append-only ledger mapped through a level threshold table
//! - **Verdict**: a priority-ordered rule table with templated copy
//! - **Storage**: SQLite persistence and TOML configuration for the host
//!
//! ## Key Components
//!
//! - [`Engine`]: runs one user's day in the required order
//! - [`ScoreCalculator`]: 14-day window to `ScoreSnapshot`
//! - [`StreakTracker`]: `advance()` / `use_freeze()` transitions
//! - [`XpLedger`]: awards and level derivation
//! - [`VerdictSelector`]: first-match-wins classification

pub mod activity;
pub mod engine;
pub mod error;
pub mod score;
pub mod storage;
pub mod streak;
pub mod verdict;
pub mod xp;

pub use activity::{ActivityDay, ActivityWindow, PersonalBests, RawActivityDay};
pub use engine::{DailyEvaluation, Engine, EvaluationInput, XpOutcome};
pub use error::{ConfigError, EngineError, StoreError, StreakError, XpError};
pub use score::{
    ComponentScores, GamingCheck, LeaderboardSnapshot, ScoreCalculator, ScoreSnapshot,
    ScoreWeights,
};
pub use storage::{Config, Database, VersionedStreak};
pub use streak::{StreakState, StreakTracker};
pub use verdict::{
    PrimaryFactor, Severity, Verdict, VerdictContext, VerdictKey, VerdictSelector,
    VerdictTemplate, VerdictTemplates,
};
pub use xp::{
    calculate_sync_xp, level_for, AppliedXp, LevelInfo, SyncXpAward, SyncXpInput, XpLedger,
    XpLedgerEntry, XpSource,
};
