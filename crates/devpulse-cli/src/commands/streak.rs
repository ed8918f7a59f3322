use clap::Subcommand;
use devpulse_core::{Config, Database};

#[derive(Subcommand)]
pub enum StreakAction {
    /// Current streak state, including hours until the streak breaks
    Show {
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Spend a freeze day to protect the current gap
    Freeze {
        #[arg(short, long)]
        user: Option<String>,
    },
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let tracker = config.streak.tracker();

    match action {
        StreakAction::Show { user } => {
            let user = super::resolve_user(user, &config)?;
            let versioned = db.streak(&user)?;
            let now = chrono::Utc::now();
            let effective =
                tracker.effective_streak(&versioned.state, now.date_naive());
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "user": user,
                    "current_streak": effective,
                    "longest_streak": versioned.state.longest_streak,
                    "last_activity_date": versioned.state.last_activity_date,
                    "freeze_days_available": versioned.state.freeze_days_available,
                    "freeze_days_used_total": versioned.state.freeze_days_used_total,
                    "hours_until_break": tracker.hours_until_break(&versioned.state, now),
                }))?
            );
        }
        StreakAction::Freeze { user } => {
            let user = super::resolve_user(user, &config)?;
            let versioned = db.streak(&user)?;
            let next = tracker.use_freeze(&versioned.state)?;
            db.save_streak(&user, &next, versioned.version)?;
            println!(
                "Freeze applied. {} remaining.",
                next.freeze_days_available
            );
        }
    }
    Ok(())
}
