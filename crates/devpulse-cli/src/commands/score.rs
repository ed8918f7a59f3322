use chrono::NaiveDate;
use clap::Subcommand;
use devpulse_core::{Config, Database};

#[derive(Subcommand)]
pub enum ScoreAction {
    /// Today's (or a given day's) snapshot
    Today {
        #[arg(short, long)]
        user: Option<String>,
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Recent snapshots, newest first
    History {
        #[arg(short, long)]
        user: Option<String>,
        /// Number of days to show
        #[arg(short, long, default_value_t = 14)]
        limit: usize,
    },
}

pub fn run(action: ScoreAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    match action {
        ScoreAction::Today { user, date } => {
            let user = super::resolve_user(user, &config)?;
            let date = super::resolve_date(date);
            match db.score_snapshot(&user, date)? {
                Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                None => println!("No snapshot for {user} on {date}"),
            }
        }
        ScoreAction::History { user, limit } => {
            let user = super::resolve_user(user, &config)?;
            let history = db.score_history(&user, limit)?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
    }
    Ok(())
}
