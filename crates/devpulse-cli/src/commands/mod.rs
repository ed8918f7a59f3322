pub mod config;
pub mod score;
pub mod streak;
pub mod sync;
pub mod verdict;
pub mod xp;

use chrono::NaiveDate;
use devpulse_core::Config;

/// Resolve the acting user: `--user` flag, then the configured default.
pub fn resolve_user(flag: Option<String>, config: &Config) -> Result<String, String> {
    flag.or_else(|| config.sync.default_user.clone())
        .ok_or_else(|| {
            "no user given: pass --user or set sync.default_user in config".to_string()
        })
}

/// Resolve the anchor date: `--date` flag or today (UTC).
pub fn resolve_date(flag: Option<NaiveDate>) -> NaiveDate {
    flag.unwrap_or_else(|| chrono::Utc::now().date_naive())
}
