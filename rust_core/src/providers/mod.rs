//! Game data provider abstraction
//!
//! The reconciliation run only needs four lookups per season from an
//! upstream stats service. `CfbdClient` is the production implementation;
//! `InMemoryProvider` serves canned data for tests and offline runs.

use crate::error::ProviderError;
use crate::models::{BettingLine, ProviderGameId, ProviderGameRecord, Season};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub mod memory;

pub use memory::InMemoryProvider;

/// Which part of the season to fetch games for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonType {
    Regular,
    #[default]
    Postseason,
    Both,
}

impl SeasonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonType::Regular => "regular",
            SeasonType::Postseason => "postseason",
            SeasonType::Both => "both",
        }
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeasonType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regular" => Ok(SeasonType::Regular),
            "postseason" => Ok(SeasonType::Postseason),
            "both" => Ok(SeasonType::Both),
            other => Err(format!("unknown season type: {}", other)),
        }
    }
}

/// Upstream source of provider game records.
#[async_trait]
pub trait GameProvider: Send + Sync {
    /// All games of `season`. `lines` may be left `None` and fetched later.
    async fn fetch_games(
        &self,
        season: Season,
        season_type: SeasonType,
    ) -> Result<Vec<ProviderGameRecord>, ProviderError>;

    /// Team name -> "W-L".
    async fn fetch_team_records(&self, season: Season) -> Result<HashMap<String, String>, ProviderError>;

    /// Team name -> rank in the latest edition of `poll`. Unranked teams are absent.
    async fn fetch_rankings(&self, season: Season, poll: &str) -> Result<HashMap<String, u32>, ProviderError>;

    /// Sportsbook lines for one game; empty when the provider has none.
    async fn fetch_betting_lines(&self, game_id: &ProviderGameId) -> Result<Vec<BettingLine>, ProviderError>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}
