/// Decimal payout per unit staked, stake included
///
/// +150 -> 2.50, -150 -> 1.667
pub fn american_to_decimal(odds: i32) -> f64 {
    if odds > 0 {
        1.0 + f64::from(odds) / 100.0
    } else {
        1.0 + 100.0 / f64::from(odds.unsigned_abs())
    }
}

/// Break-even probability implied by a price (vig included)
pub fn implied_probability(odds: i32) -> f64 {
    if odds > 0 {
        100.0 / (f64::from(odds) + 100.0)
    } else {
        let abs_odds = f64::from(odds.unsigned_abs());
        abs_odds / (abs_odds + 100.0)
    }
}

/// Expected profit per unit staked: probability × decimal − 1
pub fn expected_value(probability: f64, odds: i32) -> f64 {
    probability * american_to_decimal(odds) - 1.0
}

/// Valid American prices are at least 100 in magnitude
pub fn is_valid_american(odds: i32) -> bool {
    odds.unsigned_abs() >= 100
}
