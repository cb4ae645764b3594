use tracing::debug;

use super::odds::is_valid_american;
use crate::error::{Error, Result};
use crate::models::{BookOdds, ConsensusOdds, MoneylineMarket, SpreadMarket, TotalMarket};

/// Picks one representative line per market from several books
///
/// Lines are never averaged: each market is copied whole from a single book
/// so the price always matches the line it was quoted for. The primary book
/// is tried first, then the remaining books in name order.
#[derive(Debug, Clone, Default)]
pub struct ConsensusResolver {
    primary_book: Option<String>,
}

impl ConsensusResolver {
    pub fn new(primary_book: Option<String>) -> Self {
        Self {
            primary_book: primary_book.map(|b| b.to_lowercase()),
        }
    }

    /// `Ok(None)` when no book has posted any complete market yet
    ///
    /// Only the prices of the markets actually picked are validated; a bad
    /// price on a book that loses the preference order is never read.
    pub fn resolve(&self, rows: &[BookOdds]) -> Result<Option<ConsensusOdds>> {
        let ordered = self.preference_order(rows);

        let mut consensus = ConsensusOdds::default();

        if let Some((book, market)) = ordered.iter().find_map(|r| spread(r).map(|m| (r, m))) {
            validate_prices(&book.book_name, &[market.home_odds, market.away_odds])?;
            consensus.spread = Some(market);
            consensus.spread_book = Some(book.book_name.clone());
        }
        if let Some((book, market)) = ordered.iter().find_map(|r| moneyline(r).map(|m| (r, m))) {
            validate_prices(&book.book_name, &[market.home_odds, market.away_odds])?;
            consensus.moneyline = Some(market);
            consensus.moneyline_book = Some(book.book_name.clone());
        }
        if let Some((book, market)) = ordered.iter().find_map(|r| total(r).map(|m| (r, m))) {
            validate_prices(&book.book_name, &[market.over_odds, market.under_odds])?;
            consensus.total = Some(market);
            consensus.total_book = Some(book.book_name.clone());
        }

        if consensus.spread.is_none() && consensus.moneyline.is_none() && consensus.total.is_none()
        {
            debug!("No complete market among {} book rows", rows.len());
            return Ok(None);
        }

        Ok(Some(consensus))
    }

    fn preference_order<'a>(&self, rows: &'a [BookOdds]) -> Vec<&'a BookOdds> {
        let mut ordered: Vec<&BookOdds> = rows.iter().collect();
        ordered.sort_by(|a, b| {
            let a_primary = self.is_primary(&a.book_name);
            let b_primary = self.is_primary(&b.book_name);
            b_primary
                .cmp(&a_primary)
                .then_with(|| a.book_name.cmp(&b.book_name))
        });
        ordered
    }

    fn is_primary(&self, book: &str) -> bool {
        self.primary_book
            .as_deref()
            .is_some_and(|primary| book.eq_ignore_ascii_case(primary))
    }
}

fn validate_prices(book: &str, prices: &[i32]) -> Result<()> {
    match prices.iter().find(|odds| !is_valid_american(**odds)) {
        Some(&odds) => Err(Error::InvalidOdds {
            book: book.to_string(),
            odds,
        }),
        None => Ok(()),
    }
}

fn spread(row: &BookOdds) -> Option<SpreadMarket> {
    let home_line = row.spread_home_line?;
    Some(SpreadMarket {
        home_line,
        home_odds: row.spread_home_odds?,
        away_line: row.spread_away_line.unwrap_or(-home_line),
        away_odds: row.spread_away_odds?,
    })
}

fn moneyline(row: &BookOdds) -> Option<MoneylineMarket> {
    Some(MoneylineMarket {
        home_odds: row.moneyline_home_odds?,
        away_odds: row.moneyline_away_odds?,
    })
}

fn total(row: &BookOdds) -> Option<TotalMarket> {
    Some(TotalMarket {
        line: row.total_line?,
        over_odds: row.over_odds?,
        under_odds: row.under_odds?,
    })
}
