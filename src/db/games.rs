use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use tracing::{debug, info};

use crate::models::{BookOdds, CompletedGame, Game, GameId, Team, TeamId};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite store for teams, games, and per-book odds
#[derive(Clone)]
pub struct GameStore {
    pool: Pool<Sqlite>,
}

impl GameStore {
    /// Create a new game store and initialize the database
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create data directory if needed
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .context("Failed to create database directory")?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init_schema().await?;

        info!("Game store initialized");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                abbreviation TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create teams table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                season TEXT NOT NULL,
                home_team_id INTEGER NOT NULL REFERENCES teams (id),
                away_team_id INTEGER NOT NULL REFERENCES teams (id),
                home_score INTEGER,
                away_score INTEGER,
                is_completed BOOLEAN NOT NULL DEFAULT 0,
                start_time TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create games table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_games_date
            ON games (date, id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS game_odds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id INTEGER NOT NULL REFERENCES games (id),
                book_name TEXT NOT NULL,
                spread_home_line REAL,
                spread_home_odds INTEGER,
                spread_away_line REAL,
                spread_away_odds INTEGER,
                moneyline_home_odds INTEGER,
                moneyline_away_odds INTEGER,
                total_line REAL,
                over_odds INTEGER,
                under_odds INTEGER,
                last_update TEXT,
                UNIQUE (game_id, book_name)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create game_odds table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_game_odds_game_id
            ON game_odds (game_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn upsert_team(&self, team: &Team) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO teams (id, name, abbreviation) VALUES (?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                abbreviation = excluded.abbreviation
            "#,
        )
        .bind(team.id)
        .bind(&team.name)
        .bind(&team.abbreviation)
        .execute(&self.pool)
        .await
        .context("Failed to upsert team")?;

        Ok(())
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>> {
        let rows = sqlx::query_as::<_, TeamRow>("SELECT * FROM teams ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch teams")?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Insert or overwrite a game (scores update as games finish)
    pub async fn upsert_game(&self, game: &Game) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO games (
                id,
                date,
                season,
                home_team_id,
                away_team_id,
                home_score,
                away_score,
                is_completed,
                start_time
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                date = excluded.date,
                season = excluded.season,
                home_team_id = excluded.home_team_id,
                away_team_id = excluded.away_team_id,
                home_score = excluded.home_score,
                away_score = excluded.away_score,
                is_completed = excluded.is_completed,
                start_time = excluded.start_time
            "#,
        )
        .bind(game.id)
        .bind(game.date.format(DATE_FORMAT).to_string())
        .bind(&game.season)
        .bind(game.home_team_id)
        .bind(game.away_team_id)
        .bind(game.home_score)
        .bind(game.away_score)
        .bind(game.is_completed)
        .bind(game.start_time.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to upsert game")?;

        Ok(())
    }

    /// Finished games with both scores, ordered by (date, id)
    pub async fn completed_games(&self) -> Result<Vec<CompletedGame>> {
        let rows = sqlx::query_as::<_, GameRow>(
            r#"
            SELECT * FROM games
            WHERE is_completed = 1
              AND home_score IS NOT NULL
              AND away_score IS NOT NULL
            ORDER BY date, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch completed games")?;

        let mut games = Vec::with_capacity(rows.len());
        for row in rows {
            let game = Game::try_from(row)?;
            games.extend(game.as_completed());
        }
        Ok(games)
    }

    /// Unplayed games dated within `[from, to]`
    pub async fn upcoming_games(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Game>> {
        let rows = sqlx::query_as::<_, GameRow>(
            r#"
            SELECT * FROM games
            WHERE is_completed = 0
              AND date >= ?
              AND date <= ?
            ORDER BY date, start_time, id
            "#,
        )
        .bind(from.format(DATE_FORMAT).to_string())
        .bind(to.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch upcoming games")?;

        rows.into_iter().map(Game::try_from).collect()
    }

    pub async fn find_game(
        &self,
        home_team_id: TeamId,
        away_team_id: TeamId,
        date: NaiveDate,
    ) -> Result<Option<Game>> {
        let row = sqlx::query_as::<_, GameRow>(
            r#"
            SELECT * FROM games
            WHERE home_team_id = ? AND away_team_id = ? AND date = ?
            LIMIT 1
            "#,
        )
        .bind(home_team_id)
        .bind(away_team_id)
        .bind(date.format(DATE_FORMAT).to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find game")?;

        row.map(Game::try_from).transpose()
    }

    pub async fn odds_for_game(&self, game_id: GameId) -> Result<Vec<BookOdds>> {
        let rows = sqlx::query_as::<_, BookOddsRow>(
            "SELECT * FROM game_odds WHERE game_id = ? ORDER BY book_name",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch game odds")?;

        rows.into_iter().map(BookOdds::try_from).collect()
    }

    /// Swap a game's odds rows for a fresh set in one transaction
    pub async fn replace_odds(&self, game_id: GameId, odds: &[BookOdds]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM game_odds WHERE game_id = ?")
            .bind(game_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear game odds")?;

        for row in odds {
            sqlx::query(
                r#"
                INSERT INTO game_odds (
                    game_id,
                    book_name,
                    spread_home_line,
                    spread_home_odds,
                    spread_away_line,
                    spread_away_odds,
                    moneyline_home_odds,
                    moneyline_away_odds,
                    total_line,
                    over_odds,
                    under_odds,
                    last_update
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (game_id, book_name) DO NOTHING
                "#,
            )
            .bind(game_id)
            .bind(&row.book_name)
            .bind(row.spread_home_line)
            .bind(row.spread_home_odds)
            .bind(row.spread_away_line)
            .bind(row.spread_away_odds)
            .bind(row.moneyline_home_odds)
            .bind(row.moneyline_away_odds)
            .bind(row.total_line)
            .bind(row.over_odds)
            .bind(row.under_odds)
            .bind(row.last_update.map(|t| t.to_rfc3339()))
            .execute(&mut *tx)
            .await
            .context("Failed to insert game odds")?;
        }

        tx.commit().await.context("Failed to commit game odds")?;

        debug!("Stored {} odds rows for game {}", odds.len(), game_id);
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct TeamRow {
    id: i64,
    name: String,
    abbreviation: String,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team {
            id: row.id,
            name: row.name,
            abbreviation: row.abbreviation,
        }
    }
}

#[derive(sqlx::FromRow)]
struct GameRow {
    id: i64,
    date: String,
    season: String,
    home_team_id: i64,
    away_team_id: i64,
    home_score: Option<i32>,
    away_score: Option<i32>,
    is_completed: bool,
    start_time: Option<String>,
}

impl TryFrom<GameRow> for Game {
    type Error = anyhow::Error;

    fn try_from(row: GameRow) -> Result<Self> {
        Ok(Game {
            id: row.id,
            date: NaiveDate::parse_from_str(&row.date, DATE_FORMAT)
                .with_context(|| format!("Bad date {} on game {}", row.date, row.id))?,
            season: row.season,
            home_team_id: row.home_team_id,
            away_team_id: row.away_team_id,
            home_score: row.home_score,
            away_score: row.away_score,
            is_completed: row.is_completed,
            start_time: row.start_time.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookOddsRow {
    #[allow(dead_code)]
    id: i64,
    game_id: i64,
    book_name: String,
    spread_home_line: Option<f64>,
    spread_home_odds: Option<i32>,
    spread_away_line: Option<f64>,
    spread_away_odds: Option<i32>,
    moneyline_home_odds: Option<i32>,
    moneyline_away_odds: Option<i32>,
    total_line: Option<f64>,
    over_odds: Option<i32>,
    under_odds: Option<i32>,
    last_update: Option<String>,
}

impl TryFrom<BookOddsRow> for BookOdds {
    type Error = anyhow::Error;

    fn try_from(row: BookOddsRow) -> Result<Self> {
        Ok(BookOdds {
            game_id: row.game_id,
            book_name: row.book_name,
            spread_home_line: row.spread_home_line,
            spread_home_odds: row.spread_home_odds,
            spread_away_line: row.spread_away_line,
            spread_away_odds: row.spread_away_odds,
            moneyline_home_odds: row.moneyline_home_odds,
            moneyline_away_odds: row.moneyline_away_odds,
            total_line: row.total_line,
            over_odds: row.over_odds,
            under_odds: row.under_odds,
            last_update: row.last_update.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("Bad timestamp {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(dir: &tempfile::TempDir) -> GameStore {
        let url = format!("sqlite:{}", dir.path().join("nba.db").display());
        GameStore::new(&url).await.unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn game(id: GameId, day: &str, score: Option<(i32, i32)>) -> Game {
        Game {
            id,
            date: date(day),
            season: "2024-25".to_string(),
            home_team_id: 1,
            away_team_id: 2,
            home_score: score.map(|s| s.0),
            away_score: score.map(|s| s.1),
            is_completed: score.is_some(),
            start_time: None,
        }
    }

    async fn seed_teams(store: &GameStore) {
        for (id, name, abbr) in [(1, "Boston Celtics", "BOS"), (2, "New York Knicks", "NYK")] {
            store
                .upsert_team(&Team {
                    id,
                    name: name.to_string(),
                    abbreviation: abbr.to_string(),
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_completed_games_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        seed_teams(&store).await;

        store.upsert_game(&game(30, "2024-11-02", Some((100, 90)))).await.unwrap();
        store.upsert_game(&game(20, "2024-11-01", Some((95, 99)))).await.unwrap();
        store.upsert_game(&game(10, "2024-11-02", Some((88, 87)))).await.unwrap();
        store.upsert_game(&game(40, "2024-11-05", None)).await.unwrap();

        let ids: Vec<GameId> = store
            .completed_games()
            .await
            .unwrap()
            .iter()
            .map(|g| g.game_id)
            .collect();
        assert_eq!(ids, vec![20, 10, 30]);

        let upcoming = store
            .upcoming_games(date("2024-11-03"), date("2024-11-06"))
            .await
            .unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, 40);
    }

    #[tokio::test]
    async fn test_upsert_game_records_final_score() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        seed_teams(&store).await;

        store.upsert_game(&game(1, "2024-11-01", None)).await.unwrap();
        assert!(store.completed_games().await.unwrap().is_empty());

        store.upsert_game(&game(1, "2024-11-01", Some((110, 101)))).await.unwrap();
        let completed = store.completed_games().await.unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].margin(), 9);

        let found = store.find_game(1, 2, date("2024-11-01")).await.unwrap();
        assert_eq!(found.map(|g| g.id), Some(1));
        assert!(store.find_game(2, 1, date("2024-11-01")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_odds() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        seed_teams(&store).await;
        store.upsert_game(&game(5, "2024-11-03", None)).await.unwrap();

        let first = BookOdds {
            game_id: 5,
            book_name: "fanduel".to_string(),
            moneyline_home_odds: Some(-150),
            moneyline_away_odds: Some(130),
            ..Default::default()
        };
        store.replace_odds(5, &[first]).await.unwrap();

        let second = BookOdds {
            game_id: 5,
            book_name: "draftkings".to_string(),
            spread_home_line: Some(-3.5),
            spread_home_odds: Some(-110),
            spread_away_line: Some(3.5),
            spread_away_odds: Some(-110),
            last_update: Some(Utc::now()),
            ..Default::default()
        };
        store.replace_odds(5, &[second.clone()]).await.unwrap();

        let rows = store.odds_for_game(5).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].book_name, "draftkings");
        assert_eq!(rows[0].spread_home_line, Some(-3.5));
        assert_eq!(rows[0].moneyline_home_odds, None);
        assert!(rows[0].last_update.is_some());
    }
}
