use clap::{CommandFactory, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "devpulse", version, about = "DevPulse CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest activity and run the daily evaluation
    Sync {
        #[command(subcommand)]
        action: commands::sync::SyncAction,
    },
    /// Productivity score snapshots
    Score {
        #[command(subcommand)]
        action: commands::score::ScoreAction,
    },
    /// Streak state and freeze days
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// XP ledger and level
    Xp {
        #[command(subcommand)]
        action: commands::xp::XpAction,
    },
    /// Daily verdicts
    Verdict {
        #[command(subcommand)]
        action: commands::verdict::VerdictAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Sync { action } => commands::sync::run(action),
        Commands::Score { action } => commands::score::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Xp { action } => commands::xp::run(action),
        Commands::Verdict { action } => commands::verdict::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
