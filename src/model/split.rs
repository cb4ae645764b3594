use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which partition a season's games belong to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "val",
            Split::Test => "test",
        }
    }
}

/// Maps a season label to a partition; `None` drops the season
pub trait SplitPolicy {
    fn assign(&self, season: &str) -> Option<Split>;
}

impl<F> SplitPolicy for F
where
    F: Fn(&str) -> Option<Split>,
{
    fn assign(&self, season: &str) -> Option<Split> {
        self(season)
    }
}

/// Explicit season lists, checked to be strictly time-ordered
///
/// Season labels ("2023-24") sort chronologically as strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeasonSplit {
    pub train: Vec<String>,
    pub validation: Vec<String>,
    pub test: Vec<String>,
}

impl SeasonSplit {
    pub fn new(train: Vec<String>, validation: Vec<String>, test: Vec<String>) -> Result<Self> {
        if train.is_empty() {
            return Err(Error::InvalidSplitPolicy("no training seasons".to_string()));
        }

        let groups = [&train, &validation, &test];
        let mut latest: Option<&String> = None;
        for group in groups.iter().filter(|g| !g.is_empty()) {
            let earliest = group.iter().min().ok_or_else(|| {
                Error::InvalidSplitPolicy("empty season group".to_string())
            })?;
            if let Some(previous) = latest {
                if earliest <= previous {
                    return Err(Error::InvalidSplitPolicy(format!(
                        "season {} is not after {}",
                        earliest, previous
                    )));
                }
            }
            latest = group.iter().max();
        }

        Ok(Self {
            train,
            validation,
            test,
        })
    }

    /// Latest season tests, the one before validates, the rest train
    pub fn chronological(seasons: &[String]) -> Result<Self> {
        let mut seasons = seasons.to_vec();
        seasons.sort();
        seasons.dedup();

        match seasons.len() {
            0 => Err(Error::InvalidSplitPolicy("no seasons".to_string())),
            1 => Self::new(seasons, Vec::new(), Vec::new()),
            2 => {
                let validation = seasons.split_off(1);
                Self::new(seasons, validation, Vec::new())
            }
            n => {
                let mut tail = seasons.split_off(n - 2);
                let test = tail.split_off(1);
                Self::new(seasons, tail, test)
            }
        }
    }
}

impl SplitPolicy for SeasonSplit {
    fn assign(&self, season: &str) -> Option<Split> {
        let contains = |group: &[String]| group.iter().any(|s| s == season);

        if contains(&self.train) {
            Some(Split::Train)
        } else if contains(&self.validation) {
            Some(Split::Validation)
        } else if contains(&self.test) {
            Some(Split::Test)
        } else {
            None
        }
    }
}
