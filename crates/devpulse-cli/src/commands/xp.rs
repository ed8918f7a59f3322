use clap::Subcommand;
use devpulse_core::{level_for, Config, Database};

#[derive(Subcommand)]
pub enum XpAction {
    /// Total XP and recent ledger entries
    Show {
        #[arg(short, long)]
        user: Option<String>,
        /// Number of ledger entries to include
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Derived level info only
    Level {
        #[arg(short, long)]
        user: Option<String>,
    },
}

pub fn run(action: XpAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    match action {
        XpAction::Show { user, limit } => {
            let user = super::resolve_user(user, &config)?;
            let total = db.total_xp(&user)?;
            let entries = db.xp_entries(&user, limit)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "user": user,
                    "total_xp": total,
                    "level": level_for(total),
                    "recent": entries,
                }))?
            );
        }
        XpAction::Level { user } => {
            let user = super::resolve_user(user, &config)?;
            let total = db.total_xp(&user)?;
            println!("{}", serde_json::to_string_pretty(&level_for(total))?);
        }
    }
    Ok(())
}
