use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{Team, TeamId};

/// Resolves odds-provider team names to database team ids
pub struct TeamResolver {
    /// Normalized name or alias -> team id
    ids: HashMap<String, TeamId>,
}

/// Team alias configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamAliases {
    pub teams: Vec<TeamAliasEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamAliasEntry {
    /// Full team name as stored in the teams table
    pub canonical: String,
    /// Other spellings (e.g., "LA Clippers")
    pub aliases: Vec<String>,
}

impl TeamResolver {
    /// Index every team by full name and abbreviation
    pub fn from_teams(teams: &[Team]) -> Self {
        let mut ids = HashMap::new();
        for team in teams {
            ids.insert(normalize(&team.name), team.id);
            ids.insert(normalize(&team.abbreviation), team.id);
        }
        Self { ids }
    }

    /// Merge aliases from a JSON file; aliases for unknown teams are skipped
    pub fn load_aliases(&mut self, path: &Path) -> Result<usize> {
        let content =
            std::fs::read_to_string(path).context("Failed to read team aliases file")?;

        let config: TeamAliases =
            serde_json::from_str(&content).context("Failed to parse team aliases JSON")?;

        let mut added = 0;
        for entry in config.teams {
            for alias in &entry.aliases {
                if self.add_alias(alias, &entry.canonical) {
                    added += 1;
                } else {
                    debug!("Alias {} points at unknown team {}", alias, entry.canonical);
                }
            }
        }

        info!("Loaded {} team alias mappings", added);
        Ok(added)
    }

    pub fn resolve(&self, name: &str) -> Option<TeamId> {
        self.ids.get(&normalize(name)).copied()
    }

    /// Map `alias` to whatever `canonical` resolves to
    pub fn add_alias(&mut self, alias: &str, canonical: &str) -> bool {
        match self.resolve(canonical) {
            Some(id) => {
                self.ids.insert(normalize(alias), id);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Lowercase, trim, and drop periods ("L.A. Clippers" -> "la clippers")
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace('.', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams() -> Vec<Team> {
        vec![
            Team {
                id: 1,
                name: "Los Angeles Clippers".to_string(),
                abbreviation: "LAC".to_string(),
            },
            Team {
                id: 2,
                name: "Boston Celtics".to_string(),
                abbreviation: "BOS".to_string(),
            },
        ]
    }

    #[test]
    fn test_resolve_names_and_abbreviations() {
        let resolver = TeamResolver::from_teams(&teams());

        assert_eq!(resolver.resolve("Boston Celtics"), Some(2));
        assert_eq!(resolver.resolve("  boston celtics "), Some(2));
        assert_eq!(resolver.resolve("lac"), Some(1));
        assert_eq!(resolver.resolve("Chicago Bulls"), None);
    }

    #[test]
    fn test_aliases() {
        let mut resolver = TeamResolver::from_teams(&teams());
        assert!(resolver.add_alias("LA Clippers", "Los Angeles Clippers"));
        assert!(!resolver.add_alias("Bulls", "Chicago Bulls"));

        assert_eq!(resolver.resolve("L.A. Clippers"), Some(1));
        assert_eq!(resolver.resolve("Bulls"), None);
    }

    #[test]
    fn test_load_aliases_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        std::fs::write(
            &path,
            r#"{"teams":[{"canonical":"Boston Celtics","aliases":["Celtics","C's"]}]}"#,
        )
        .unwrap();

        let mut resolver = TeamResolver::from_teams(&teams());
        assert_eq!(resolver.load_aliases(&path).unwrap(), 2);
        assert_eq!(resolver.resolve("celtics"), Some(2));
    }
}
