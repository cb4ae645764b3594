//! Normal-model probabilities from a predicted margin.
//!
//! Actual margin ~ Normal(predicted margin, sigma). Lines are quoted from the
//! home side: a home line of -6.5 means home must win by more than 6.5.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{Error, Result};

/// Standard normal CDF
pub fn normal_cdf(x: f64) -> f64 {
    Normal::standard().cdf(x)
}

/// Distribution of the final home margin for one game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginDistribution {
    pub predicted_margin: f64,
    pub sigma: f64,
}

impl MarginDistribution {
    pub fn new(predicted_margin: f64, sigma: f64) -> Result<Self> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(Error::InvalidSigma(sigma));
        }
        Ok(Self {
            predicted_margin,
            sigma,
        })
    }

    /// P(actual margin > 0)
    pub fn home_win(&self) -> f64 {
        normal_cdf(self.predicted_margin / self.sigma)
    }

    pub fn away_win(&self) -> f64 {
        1.0 - self.home_win()
    }

    /// P(actual margin > -home_line)
    pub fn home_cover(&self, home_line: f64) -> f64 {
        1.0 - normal_cdf((-home_line - self.predicted_margin) / self.sigma)
    }

    pub fn away_cover(&self, home_line: f64) -> f64 {
        1.0 - self.home_cover(home_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGMA: f64 = 14.4;

    #[test]
    fn test_cdf_reference_points() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((normal_cdf(1.0) - 0.841_344_746).abs() < 1e-7);
        assert!((normal_cdf(-1.96) - 0.024_997_895).abs() < 1e-7);
    }

    #[test]
    fn test_rejects_bad_sigma() {
        for sigma in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(MarginDistribution::new(3.0, sigma).is_err());
        }
    }

    #[test]
    fn test_complements_sum_to_one() {
        for pred in [-20.0, -3.7, 0.0, 1.5, 12.0] {
            for sigma in [5.0, SIGMA, 30.0] {
                let dist = MarginDistribution::new(pred, sigma).unwrap();
                assert!((dist.home_win() + dist.away_win() - 1.0).abs() < 1e-12);
                for line in [-9.5, -2.0, 0.0, 3.5] {
                    assert!((dist.home_cover(line) + dist.away_cover(line) - 1.0).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_cover_sign_convention() {
        // Model says home by 10, market home -6.5: home should cover more often than not
        let dist = MarginDistribution::new(10.0, SIGMA).unwrap();
        assert!(dist.home_cover(-6.5) > 0.5);

        let dist = MarginDistribution::new(3.0, SIGMA).unwrap();
        assert!(dist.home_cover(-6.5) < 0.5);

        // Model says away by 5, home getting 7.5
        let dist = MarginDistribution::new(-5.0, SIGMA).unwrap();
        assert!(dist.home_cover(7.5) > 0.5);
        assert!(dist.home_cover(3.5) < 0.5);
    }

    #[test]
    fn test_pick_line_matches_win_probability() {
        let dist = MarginDistribution::new(4.0, SIGMA).unwrap();
        assert!((dist.home_cover(0.0) - dist.home_win()).abs() < 1e-12);
    }

    #[test]
    fn test_one_sigma_favorite() {
        let dist = MarginDistribution::new(SIGMA, SIGMA).unwrap();
        assert!((dist.home_win() - 0.8413).abs() < 1e-4);
    }
}
