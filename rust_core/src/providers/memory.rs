//! Canned provider backed by in-memory tables or a JSON fixture file.

use super::{GameProvider, SeasonType};
use crate::error::ProviderError;
use crate::models::{BettingLine, ProviderGameId, ProviderGameRecord, Season};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Fixture layout: one entry per season.
///
/// ```json
/// {"2024": {"games": [...], "records": {"Duke": "9-3"}, "rankings": {"Oregon": 1}}}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonFixture {
    #[serde(default)]
    pub games: Vec<ProviderGameRecord>,
    #[serde(default)]
    pub records: Option<HashMap<String, String>>,
    #[serde(default)]
    pub rankings: Option<HashMap<String, u32>>,
    #[serde(default)]
    pub lines: HashMap<String, Vec<BettingLine>>,
}

/// Provider serving fixed per-season data.
///
/// A season with no fixture, or a lookup left `None`, answers with a
/// `Status` error the way an unreachable upstream would. Every call is
/// counted so tests can assert on traffic.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    seasons: HashMap<Season, SeasonFixture>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_season(mut self, season: Season, fixture: SeasonFixture) -> Self {
        self.seasons.insert(season, fixture);
        self
    }

    /// Load a fixture file keyed by season year.
    pub fn from_json_file(path: &Path) -> Result<Self, ProviderError> {
        let endpoint = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ProviderError::Fixture {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: HashMap<String, SeasonFixture> =
            serde_json::from_str(&content).map_err(|e| ProviderError::Decode {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        let mut seasons = HashMap::new();
        for (year, fixture) in raw {
            let season: Season = year.trim().parse().map_err(|_| ProviderError::Decode {
                endpoint: endpoint.clone(),
                message: format!("invalid season key {:?}", year),
            })?;
            seasons.insert(season, fixture);
        }

        Ok(Self {
            seasons,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Calls made so far, e.g. `"games 2024"`, `"lines 401677174"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record_call(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn season(&self, season: Season, endpoint: &str) -> Result<&SeasonFixture, ProviderError> {
        self.seasons.get(&season).ok_or_else(|| unavailable(endpoint))
    }
}

fn unavailable(endpoint: &str) -> ProviderError {
    ProviderError::Status {
        endpoint: endpoint.to_string(),
        status: 503,
        body: "no fixture data".to_string(),
    }
}

#[async_trait]
impl GameProvider for InMemoryProvider {
    async fn fetch_games(
        &self,
        season: Season,
        _season_type: SeasonType,
    ) -> Result<Vec<ProviderGameRecord>, ProviderError> {
        self.record_call(format!("games {}", season));
        Ok(self.season(season, "/games")?.games.clone())
    }

    async fn fetch_team_records(&self, season: Season) -> Result<HashMap<String, String>, ProviderError> {
        self.record_call(format!("records {}", season));
        self.season(season, "/records")?
            .records
            .clone()
            .ok_or_else(|| unavailable("/records"))
    }

    async fn fetch_rankings(&self, season: Season, _poll: &str) -> Result<HashMap<String, u32>, ProviderError> {
        self.record_call(format!("rankings {}", season));
        self.season(season, "/rankings")?
            .rankings
            .clone()
            .ok_or_else(|| unavailable("/rankings"))
    }

    async fn fetch_betting_lines(&self, game_id: &ProviderGameId) -> Result<Vec<BettingLine>, ProviderError> {
        self.record_call(format!("lines {}", game_id));
        Ok(self
            .seasons
            .values()
            .find_map(|fixture| fixture.lines.get(game_id.as_str()).cloned())
            .unwrap_or_default())
    }

    fn provider_name(&self) -> &str {
        "in-memory"
    }
}
