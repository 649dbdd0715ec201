//! Manually curated rank overrides (e.g. CFP seeds).
//!
//! Rules are consulted in order before any provider poll rank; the first
//! rule whose season and team match wins.

use crate::error::OverrideError;
use crate::models::Season;
use crate::utils::matching::normalize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One override rule. `season: None` applies to every season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankOverride {
    pub team: String,
    pub rank: u32,
    #[serde(default)]
    pub season: Option<Season>,
}

impl RankOverride {
    pub fn new(team: &str, rank: u32, season: Option<Season>) -> Self {
        Self {
            team: team.to_string(),
            rank,
            season,
        }
    }
}

/// Priority-ordered override rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankOverrides {
    rules: Vec<(String, RankOverride)>,
}

impl RankOverrides {
    pub fn new(rules: Vec<RankOverride>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| (normalize(rule.team.as_str()), rule))
                .filter(|(key, _)| !key.is_empty())
                .collect(),
        }
    }

    /// Load rules from a JSON array: `[{"team": "Indiana", "rank": 1, "season": 2025}]`.
    pub fn load(path: &Path) -> Result<Self, OverrideError> {
        let content = fs::read_to_string(path).map_err(|source| OverrideError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rules: Vec<RankOverride> =
            serde_json::from_str(&content).map_err(|source| OverrideError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(rules))
    }

    /// Override rank for `team` in `season`, if any rule applies.
    pub fn rank_for(&self, season: Season, team: &str) -> Option<u32> {
        let key = normalize(team);
        if key.is_empty() {
            return None;
        }

        self.rules
            .iter()
            .find(|(rule_key, rule)| {
                *rule_key == key && rule.season.map_or(true, |s| s == season)
            })
            .map(|(_, rule)| rule.rank)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
