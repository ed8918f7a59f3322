use chrono::NaiveDate;
use clap::Subcommand;
use devpulse_core::{Config, Database};

#[derive(Subcommand)]
pub enum VerdictAction {
    /// The stored verdict for today (or a given day)
    Today {
        #[arg(short, long)]
        user: Option<String>,
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: VerdictAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    match action {
        VerdictAction::Today { user, date } => {
            let user = super::resolve_user(user, &config)?;
            let date = super::resolve_date(date);
            match db.verdict(&user, date)? {
                Some(verdict) => println!("{}", serde_json::to_string_pretty(&verdict)?),
                None => println!("No verdict for {user} on {date}"),
            }
        }
    }
    Ok(())
}
