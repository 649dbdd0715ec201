//! CollegeFootballData.com API client.
//!
//! Endpoints used:
//! - `/games?year=&seasonType=`
//! - `/records?year=`
//! - `/rankings?year=&seasonType=postseason` (falls back to the regular season)
//! - `/lines?gameId=`

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::error::ProviderError;
use crate::models::{BettingLine, ProviderGameId, ProviderGameRecord, Season};
use crate::providers::{GameProvider, SeasonType};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.collegefootballdata.com";

#[derive(Debug, Clone)]
pub struct CfbdConfig {
    pub base_url: String,
    /// Bearer token; requests go out unauthenticated without one
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for CfbdConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

#[derive(Clone)]
pub struct CfbdClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl std::fmt::Debug for CfbdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CfbdClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.api_key.is_some())
            .field("circuit_breaker_state", &self.circuit_breaker.state())
            .finish()
    }
}

impl CfbdClient {
    pub fn new(config: CfbdConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.filter(|k| !k.trim().is_empty()),
            circuit_breaker: Arc::new(CircuitBreaker::new("cfbd", config.circuit_breaker)),
        }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        if !self.circuit_breaker.is_available() {
            return Err(ProviderError::CircuitOpen(self.circuit_breaker.name().to_string()));
        }

        let result = self.get_json_internal(path, query).await;
        match &result {
            Ok(_) => self.circuit_breaker.record_success(),
            // A bad payload is not an outage
            Err(ProviderError::Decode { .. }) => {}
            Err(_) => self.circuit_breaker.record_failure(),
        }
        result
    }

    async fn get_json_internal<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let mut request = self.client.get(&url).query(query);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await.map_err(|source| ProviderError::Transport {
            endpoint: path.to_string(),
            source,
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|source| ProviderError::Transport {
            endpoint: path.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RecordEntry {
    team: String,
    #[serde(default)]
    total: Option<WinLoss>,
    #[serde(default)]
    wins: Option<u32>,
    #[serde(default)]
    losses: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WinLoss {
    #[serde(default)]
    wins: Option<u32>,
    #[serde(default)]
    losses: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankingWeek {
    #[serde(default)]
    season_type: Option<String>,
    #[serde(default)]
    week: u32,
    #[serde(default)]
    polls: Vec<Poll>,
}

#[derive(Debug, Deserialize)]
struct Poll {
    poll: String,
    #[serde(default)]
    ranks: Vec<PollRank>,
}

#[derive(Debug, Deserialize)]
struct PollRank {
    rank: u32,
    school: String,
}

#[derive(Debug, Deserialize)]
struct GameLines {
    #[serde(default)]
    lines: Vec<BettingLine>,
}

/// "W-L" per team; prefers the `total` split, then top-level counts.
fn team_records(entries: Vec<RecordEntry>) -> HashMap<String, String> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let (wins, losses) = match &entry.total {
                Some(WinLoss {
                    wins: Some(w),
                    losses: Some(l),
                }) => (*w, *l),
                _ => (entry.wins?, entry.losses?),
            };
            Some((entry.team, format!("{}-{}", wins, losses)))
        })
        .collect()
}

/// Ranks from the latest week that carries `poll` (postseason after regular).
fn latest_poll_ranks(weeks: &[RankingWeek], poll: &str) -> Option<HashMap<String, u32>> {
    weeks
        .iter()
        .filter_map(|week| {
            week.polls
                .iter()
                .find(|p| p.poll.eq_ignore_ascii_case(poll))
                .map(|p| (week, p))
        })
        .max_by_key(|(week, _)| {
            let postseason = week.season_type.as_deref() == Some("postseason");
            (postseason, week.week)
        })
        .map(|(_, p)| p.ranks.iter().map(|r| (r.school.clone(), r.rank)).collect())
}

#[async_trait]
impl GameProvider for CfbdClient {
    async fn fetch_games(
        &self,
        season: Season,
        season_type: SeasonType,
    ) -> Result<Vec<ProviderGameRecord>, ProviderError> {
        let mut games: Vec<ProviderGameRecord> = self
            .get_json(
                "/games",
                &[
                    ("year", season.to_string()),
                    ("seasonType", season_type.as_str().to_string()),
                ],
            )
            .await?;
        for game in &mut games {
            game.season.get_or_insert(season);
        }
        Ok(games)
    }

    async fn fetch_team_records(&self, season: Season) -> Result<HashMap<String, String>, ProviderError> {
        let entries: Vec<RecordEntry> = self.get_json("/records", &[("year", season.to_string())]).await?;
        Ok(team_records(entries))
    }

    async fn fetch_rankings(&self, season: Season, poll: &str) -> Result<HashMap<String, u32>, ProviderError> {
        let post: Vec<RankingWeek> = self
            .get_json(
                "/rankings",
                &[("year", season.to_string()), ("seasonType", "postseason".to_string())],
            )
            .await?;
        if let Some(ranks) = latest_poll_ranks(&post, poll) {
            return Ok(ranks);
        }

        let regular: Vec<RankingWeek> = self
            .get_json(
                "/rankings",
                &[("year", season.to_string()), ("seasonType", "regular".to_string())],
            )
            .await?;
        latest_poll_ranks(&regular, poll).ok_or_else(|| ProviderError::Decode {
            endpoint: "/rankings".to_string(),
            message: format!("no '{}' poll for {}", poll, season),
        })
    }

    async fn fetch_betting_lines(&self, game_id: &ProviderGameId) -> Result<Vec<BettingLine>, ProviderError> {
        let entries: Vec<GameLines> = self
            .get_json("/lines", &[("gameId", game_id.to_string())])
            .await?;
        Ok(entries.into_iter().flat_map(|g| g.lines).collect())
    }

    fn provider_name(&self) -> &str {
        "cfbd"
    }
}
