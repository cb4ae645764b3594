use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::betting::SelectorConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path
    pub database_url: String,

    /// Directory holding the trained model artifact
    pub model_dir: PathBuf,

    /// The Odds API base URL
    pub odds_api_url: String,

    /// Odds refresh is disabled without a key
    pub odds_api_key: Option<String>,

    /// Interval in seconds between odds refreshes
    pub odds_refresh_interval: u64,

    /// Interval in seconds between model retrains
    pub retrain_interval: u64,

    /// Book preferred when resolving consensus lines
    pub primary_book: String,

    /// Replaces the model's sigma at inference when set
    pub sigma_override: Option<f64>,

    /// Largest |spread| the selector will price
    pub max_spread: f64,

    /// Days ahead to recommend for
    pub lookahead_days: i64,

    /// Optional JSON file of extra team name aliases
    pub team_aliases_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/nba_edge.db".to_string()),

            model_dir: env::var("MODEL_DIR")
                .unwrap_or_else(|_| "artifacts".to_string())
                .into(),

            odds_api_url: env::var("ODDS_API_URL")
                .unwrap_or_else(|_| "https://api.the-odds-api.com/v4".to_string()),

            odds_api_key: env::var("ODDS_API_KEY").ok().filter(|k| !k.is_empty()),

            odds_refresh_interval: env::var("ODDS_REFRESH_INTERVAL")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .context("ODDS_REFRESH_INTERVAL must be a valid number")?,

            retrain_interval: env::var("RETRAIN_INTERVAL")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .context("RETRAIN_INTERVAL must be a valid number")?,

            primary_book: env::var("PRIMARY_BOOK").unwrap_or_else(|_| "draftkings".to_string()),

            sigma_override: env::var("SIGMA_OVERRIDE")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .context("SIGMA_OVERRIDE must be a valid number")?,

            max_spread: env::var("MAX_SPREAD")
                .unwrap_or_else(|_| "14.0".to_string())
                .parse()
                .context("MAX_SPREAD must be a valid number")?,

            lookahead_days: env::var("LOOKAHEAD_DAYS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("LOOKAHEAD_DAYS must be a valid number")?,

            team_aliases_path: env::var("TEAM_ALIASES_PATH").ok().map(PathBuf::from),
        })
    }

    /// Default tier thresholds with the configured spread guardrail
    pub fn selector_config(&self) -> SelectorConfig {
        SelectorConfig {
            max_spread: self.max_spread,
            ..Default::default()
        }
    }
}
