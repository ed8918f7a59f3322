//! Sync subcommand: ingest activity records and run the daily evaluation.
//!
//! Activity comes in as a JSON array of per-day records produced by the
//! external GitHub ingestion job; the engine itself never fetches anything.

use chrono::{Duration, NaiveDate};
use clap::Subcommand;
use devpulse_core::activity::{DELTA_WINDOW_DAYS, SCORING_WINDOW_DAYS};
use devpulse_core::{
    Config, Database, DailyEvaluation, Engine, EvaluationInput, RawActivityDay,
    ScoreCalculator, StoreError, VerdictSelector,
};

#[derive(Subcommand)]
pub enum SyncAction {
    /// Ingest an activity file (if given) and evaluate one day
    Run {
        /// User to evaluate
        #[arg(short, long)]
        user: Option<String>,
        /// JSON file with activity day records to ingest first
        #[arg(short, long)]
        file: Option<std::path::PathBuf>,
        /// Day to evaluate (defaults to today, or to the newest ingested day)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Show the latest evaluated day for a user
    Status {
        #[arg(short, long)]
        user: Option<String>,
    },
}

pub fn run(action: SyncAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    match action {
        SyncAction::Run { user, file, date } => {
            let user = super::resolve_user(user, &config)?;
            let mut anchor = date;

            if let Some(path) = file {
                let raw = std::fs::read_to_string(&path)?;
                let records: Vec<RawActivityDay> = serde_json::from_str(&raw)?;
                let newest = records.iter().map(|r| r.date).max();
                for record in records {
                    db.upsert_activity_day(&user, &record.sanitize())?;
                }
                anchor = anchor.or(newest);
            }

            let anchor = super::resolve_date(anchor);
            let evaluation = evaluate_with_retry(&db, &config, &user, anchor)?;

            println!("{}", serde_json::to_string_pretty(&summary(&evaluation))?);
        }
        SyncAction::Status { user } => {
            let user = super::resolve_user(user, &config)?;
            let history = db.score_history(&user, 1)?;
            match history.first() {
                Some(snapshot) => {
                    let verdict = db.verdict(&user, snapshot.date)?;
                    let bests = db
                        .activity_window(
                            &user,
                            snapshot.date,
                            devpulse_core::activity::PERSONAL_BEST_WINDOW_DAYS,
                        )?
                        .personal_bests();
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "user": user,
                            "last_evaluated": snapshot.date,
                            "final_score": snapshot.final_score,
                            "verdict": verdict.map(|v| v.key.as_str().to_string()),
                            "personal_bests": bests,
                        }))?
                    );
                }
                None => println!("No evaluations recorded for {user}"),
            }
        }
    }
    Ok(())
}

/// Run one evaluation and persist it. A concurrent streak writer surfaces as
/// a version conflict; the whole evaluation is retried once from fresh state.
fn evaluate_with_retry(
    db: &Database,
    config: &Config,
    user: &str,
    anchor: NaiveDate,
) -> Result<DailyEvaluation, Box<dyn std::error::Error>> {
    match evaluate_once(db, config, user, anchor) {
        Err(e)
            if matches!(
                e.downcast_ref::<StoreError>(),
                Some(StoreError::ConflictingUpdate { .. })
            ) =>
        {
            evaluate_once(db, config, user, anchor)
        }
        other => other,
    }
}

fn evaluate_once(
    db: &Database,
    config: &Config,
    user: &str,
    anchor: NaiveDate,
) -> Result<DailyEvaluation, Box<dyn std::error::Error>> {
    let window = db.activity_window(user, anchor, SCORING_WINDOW_DAYS)?;
    let previous_score = db
        .score_snapshot(user, anchor - Duration::days(1))?
        .map(|s| s.final_score);
    let previous_week =
        db.activity_window(user, anchor - Duration::days(1), DELTA_WINDOW_DAYS)?;
    let leaderboard = db.leaderboard()?;
    let versioned = db.streak(user)?;
    let total_xp = db.total_xp(user)?;

    let engine = Engine::with_parts(
        config.streak.tracker(),
        ScoreCalculator::with_weights(config.scoring.weights()),
        VerdictSelector::new(),
    );
    let evaluation = engine.evaluate_day(&EvaluationInput {
        window: &window,
        previous_score,
        previous_days_active_this_week: previous_week.active_days(),
        leaderboard: &leaderboard,
        streak: &versioned.state,
        total_xp,
    })?;

    db.save_streak(user, &evaluation.streak, versioned.version)?;
    db.upsert_score_snapshot(user, &evaluation.snapshot)?;
    db.upsert_verdict(user, &evaluation.verdict)?;
    if !db.sync_xp_granted(user, anchor)? {
        for entry in &evaluation.xp.entries {
            db.append_xp(user, entry, Some(anchor))?;
        }
    }

    Ok(evaluation)
}

fn summary(evaluation: &DailyEvaluation) -> serde_json::Value {
    serde_json::json!({
        "date": evaluation.snapshot.date,
        "score": {
            "final": evaluation.snapshot.final_score,
            "change": evaluation.snapshot.change_from_yesterday,
            "percentile": evaluation.snapshot.percentile,
            "gaming_detected": evaluation.snapshot.gaming.detected,
        },
        "streak": {
            "current": evaluation.streak.current_streak,
            "longest": evaluation.streak.longest_streak,
            "freezes_available": evaluation.streak.freeze_days_available,
        },
        "xp": {
            "awarded": evaluation.xp.total_after - evaluation.xp.total_before,
            "total": evaluation.xp.total_after,
            "level": evaluation.xp.level.level,
            "title": evaluation.xp.level.title,
            "leveled_up": evaluation.xp.leveled_up,
        },
        "verdict": {
            "key": evaluation.verdict.key.as_str(),
            "text": evaluation.verdict.text,
            "severity": evaluation.verdict.severity.as_str(),
        },
    })
}
