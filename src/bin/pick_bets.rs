use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Local};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nba_edge::betting::{implied_probability, ConsensusResolver};
use nba_edge::config::Config;
use nba_edge::db::GameStore;
use nba_edge::model::{ModelHandle, ModelStore};
use nba_edge::models::{BetRecommendation, ConfidenceTier, Side, Team, TeamId};
use nba_edge::services::{
    GameRecommendation, InferenceCache, RecommendationService, RecommendationSummary,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pick_bets=info,nba_edge=warn,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Parse arguments
    let args: Vec<String> = env::args().collect();
    let days = parse_days(&args)?.unwrap_or(config.lookahead_days);
    let only_bets = args.iter().any(|a| a == "--only-bets");
    let debug = args.iter().any(|a| a == "--debug");

    let store = GameStore::new(&config.database_url).await?;
    let model = ModelStore::new(&config.model_dir)
        .load()
        .context("Failed to load model; run train_model first")?;

    let service = RecommendationService::new(
        store.clone(),
        ModelHandle::new(Some(model)),
        Arc::new(InferenceCache::new()),
        ConsensusResolver::new(Some(config.primary_book.clone())),
        config.selector_config(),
    )
    .with_sigma_override(config.sigma_override);

    let today = Local::now().date_naive();
    let results = service
        .recommend_upcoming(today, today + Duration::days(days))
        .await?;

    let teams = store.list_teams().await?;

    println!("\nNBA picks {} to {}", today, today + Duration::days(days));
    println!("Tiers: HIGH (EV>=6%, P>=60%), MEDIUM (EV>=3%, P>=57%), LOW (EV>=0%, P>=52%)");

    for result in &results {
        if only_bets && !result.recommendation.is_actionable() {
            continue;
        }
        print_game(result, &teams, debug);
    }

    let summary =
        RecommendationSummary::from_recommendations(results.iter().map(|r| &r.recommendation));
    print_summary(&summary);

    Ok(())
}

fn parse_days(args: &[String]) -> Result<Option<i64>> {
    match args.iter().position(|a| a == "--days") {
        Some(i) => {
            let value = args.get(i + 1).context("--days needs a value")?;
            Ok(Some(value.parse().context("--days must be a number")?))
        }
        None => Ok(None),
    }
}

fn abbreviation(teams: &[Team], id: TeamId) -> String {
    teams
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.abbreviation.clone())
        .unwrap_or_else(|| format!("#{}", id))
}

fn print_game(result: &GameRecommendation, teams: &[Team], debug: bool) {
    let game = &result.game;
    let rec = &result.recommendation;
    let home = abbreviation(teams, game.home_team_id);
    let away = abbreviation(teams, game.away_team_id);

    let market = rec
        .consensus_odds
        .as_ref()
        .and_then(|o| o.spread)
        .map(|s| format!("{} {:+.1}", home, s.home_line))
        .unwrap_or_else(|| "no line".to_string());

    println!(
        "\n  {} {} @ {}  |  Pred: {} {:+.1}  |  Market: {}  |  {}",
        game.date, away, home, home, rec.predicted_margin, market, rec.confidence_tier
    );

    match (&rec.best_bet, &rec.best_overall) {
        (Some(bet), _) => println!(
            "    BET {}  P {:.1}%  EV {:+.1}%",
            bet,
            bet.probability * 100.0,
            bet.expected_value * 100.0
        ),
        (None, Some(lean)) => println!(
            "    lean {}  P {:.1}%  EV {:+.1}%",
            lean,
            lean.probability * 100.0,
            lean.expected_value * 100.0
        ),
        (None, None) => println!("    lean {}", lean_text(rec, &home, &away)),
    }

    if debug {
        println!("    sigma {:.2}", rec.sigma);
        for candidate in &rec.candidates {
            println!(
                "      {:<22} P {:>5.1}%  market {:>5.1}%  EV {:>+6.1}%",
                candidate.to_string(),
                candidate.probability * 100.0,
                implied_probability(candidate.odds) * 100.0,
                candidate.expected_value * 100.0
            );
        }
    }
}

fn lean_text(rec: &BetRecommendation, home: &str, away: &str) -> String {
    match rec.model_lean() {
        Some(Side::Home) => format!("{} by {:.1}", home, rec.predicted_margin),
        Some(Side::Away) => format!("{} by {:.1}", away, -rec.predicted_margin),
        None => "pick'em".to_string(),
    }
}

fn print_summary(summary: &RecommendationSummary) {
    println!("\nSUMMARY:");
    println!("  Total games:      {}", summary.total_games);
    println!("  Games with odds:  {}", summary.games_with_odds);

    println!("\nConfidence breakdown:");
    for tier in ConfidenceTier::ALL {
        let count = summary.count(tier);
        let share = if summary.total_games > 0 {
            count as f64 / summary.total_games as f64 * 100.0
        } else {
            0.0
        };
        println!("  {:<8} {} ({:.1}%)", tier.as_str(), count, share);
    }

    println!("\nActionable bets (HIGH + MEDIUM): {}", summary.actionable);
    if summary.actionable > 0 {
        println!(
            "  By market: ML {}, Spread {}",
            summary.moneyline_bets, summary.spread_bets
        );
        println!("  By side:   Home {}, Away {}", summary.home_bets, summary.away_bets);
        println!("  Avg EV:    {:.1}%", summary.avg_expected_value * 100.0);
        println!("  Avg P:     {:.1}%", summary.avg_probability * 100.0);
    }
}
