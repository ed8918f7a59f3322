use clap::Subcommand;
use devpulse_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Set the default user for sync runs
    SetUser { user: String },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigAction::SetUser { user } => {
            let mut config = Config::load()?;
            config.sync.default_user = Some(user);
            config.save()?;
            println!("Default user updated.");
        }
    }
    Ok(())
}
