use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::models::{BookOdds, GameId};

const SPORT_KEY: &str = "basketball_nba";

/// Hours subtracted from UTC tip-off to get the US Eastern game date
const EASTERN_OFFSET_HOURS: i64 = 5;

/// Client for The Odds API (NBA game lines)
pub struct OddsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// One upcoming game with every bookmaker's markets
#[derive(Debug, Clone, Deserialize)]
pub struct OddsEvent {
    pub id: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bookmaker {
    pub key: String,
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Market {
    /// "h2h", "spreads", or "totals"
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
    /// Team name, or "Over"/"Under" for totals
    pub name: String,
    /// American price
    pub price: f64,
    pub point: Option<f64>,
}

impl OddsEvent {
    /// Calendar date of tip-off in US Eastern (fixed UTC-5)
    pub fn game_date(&self) -> NaiveDate {
        (self.commence_time - Duration::hours(EASTERN_OFFSET_HOURS)).date_naive()
    }

    /// Flatten each bookmaker into one odds row for `game_id`
    pub fn book_odds(&self, game_id: GameId) -> Vec<BookOdds> {
        self.bookmakers
            .iter()
            .map(|book| {
                let mut row = BookOdds {
                    game_id,
                    book_name: book.key.clone(),
                    last_update: book.last_update,
                    ..Default::default()
                };

                for market in &book.markets {
                    for outcome in &market.outcomes {
                        let price = Some(outcome.price.round() as i32);
                        let is_home = outcome.name == self.home_team;
                        let is_away = outcome.name == self.away_team;

                        match market.key.as_str() {
                            "h2h" if is_home => row.moneyline_home_odds = price,
                            "h2h" if is_away => row.moneyline_away_odds = price,
                            "spreads" if is_home => {
                                row.spread_home_line = outcome.point;
                                row.spread_home_odds = price;
                            }
                            "spreads" if is_away => {
                                row.spread_away_line = outcome.point;
                                row.spread_away_odds = price;
                            }
                            "totals" if outcome.name == "Over" => {
                                row.total_line = outcome.point;
                                row.over_odds = price;
                            }
                            "totals" if outcome.name == "Under" => {
                                row.total_line = row.total_line.or(outcome.point);
                                row.under_odds = price;
                            }
                            _ => {}
                        }
                    }
                }

                row
            })
            .collect()
    }
}

impl OddsApiClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Fetch moneyline, spread, and total prices for upcoming NBA games
    pub async fn fetch_odds(&self) -> Result<Vec<OddsEvent>> {
        let url = format!("{}/sports/{}/odds/", self.base_url, SPORT_KEY);

        debug!("Fetching odds: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", "us"),
                ("markets", "h2h,spreads,totals"),
                ("oddsFormat", "american"),
            ])
            .send()
            .await
            .context("Failed to fetch odds")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Odds API error: {} - {}", status, text);
        }

        if let Some(remaining) = response
            .headers()
            .get("x-requests-remaining")
            .and_then(|v| v.to_str().ok())
        {
            info!("Odds API requests remaining: {}", remaining);
        }

        let events: Vec<OddsEvent> = response
            .json()
            .await
            .context("Failed to parse odds response")?;

        Ok(events)
    }
}
