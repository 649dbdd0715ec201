//! Game records on both sides of the reconciliation.
//!
//! - `LocalGameRecord`: one row of the curated bowl table
//! - `ProviderGameRecord`: one postseason game as reported by the provider
//! - `BettingLine`: one sportsbook's spread for a provider game

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Season year (e.g. 2025). Matching never crosses seasons.
pub type Season = i32;

/// Opaque provider-side game identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderGameId(String);

impl ProviderGameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a stored id, tolerating spreadsheet float spellings ("401635123.0").
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let id = match trimmed.split_once('.') {
            Some((whole, frac))
                if !whole.is_empty()
                    && whole.chars().all(|c| c.is_ascii_digit())
                    && frac.chars().all(|c| c == '0') =>
            {
                whole
            }
            _ => trimmed,
        };
        Some(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderGameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which matching tier produced a provider id.
///
/// Declared in ascending confidence so `Ord` compares trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Fuzzy,
    Kickoff,
    Teams,
    Label,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Label => "label",
            MatchTier::Teams => "teams",
            MatchTier::Kickoff => "kickoff",
            MatchTier::Fuzzy => "fuzzy",
        }
    }

    /// Exact tiers are trusted across runs; fuzzy ids get re-matched.
    pub fn is_exact(&self) -> bool {
        !matches!(self, MatchTier::Fuzzy)
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "label" => Ok(MatchTier::Label),
            "teams" => Ok(MatchTier::Teams),
            "kickoff" => Ok(MatchTier::Kickoff),
            "fuzzy" => Ok(MatchTier::Fuzzy),
            other => Err(format!("unknown match tier: {}", other)),
        }
    }
}

/// One row of the authoritative local table.
///
/// `game_id` is assigned out-of-band and never rewritten here. Everything from
/// `provider_game_id` down is owned by the enrichment passes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocalGameRecord {
    pub game_id: String,
    pub bowl_name: String,
    pub kickoff_datetime: String,
    pub home_team: String,
    pub away_team: String,
    /// Pick'em weight
    pub point_value: Option<u32>,
    pub provider_game_id: Option<ProviderGameId>,
    pub match_tier: Option<MatchTier>,
    pub home_record: Option<String>,
    pub away_record: Option<String>,
    pub home_rank: Option<u32>,
    pub away_rank: Option<u32>,
    pub spread: Option<f64>,
    pub status: String,
    pub winner: Option<String>,
    pub completed: bool,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    /// Columns this tool does not interpret, carried through verbatim.
    pub extra: BTreeMap<String, String>,
}

impl LocalGameRecord {
    pub fn new(
        game_id: impl Into<String>,
        bowl_name: impl Into<String>,
        kickoff_datetime: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
    ) -> Self {
        Self {
            game_id: game_id.into(),
            bowl_name: bowl_name.into(),
            kickoff_datetime: kickoff_datetime.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
            ..Default::default()
        }
    }

    /// Season from the leading four characters of the kickoff.
    pub fn season(&self) -> Option<Season> {
        self.kickoff_datetime.trim().get(..4)?.parse().ok()
    }

    /// True when the row carries an id that should not be re-matched.
    ///
    /// An id with no recorded tier was entered by hand and is trusted.
    pub fn has_trusted_id(&self) -> bool {
        self.provider_game_id.is_some() && self.match_tier.map_or(true, |t| t.is_exact())
    }
}

/// One sportsbook line for a provider game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BettingLine {
    #[serde(alias = "provider_name")]
    pub provider: String,
    /// Home-relative spread (negative = home favored).
    #[serde(default, deserialize_with = "de_spread")]
    pub spread: Option<f64>,
}

impl BettingLine {
    pub fn new(provider: impl Into<String>, spread: Option<f64>) -> Self {
        Self {
            provider: provider.into(),
            spread,
        }
    }
}

/// One provider-side postseason game.
///
/// Accepts both the camelCase and snake_case payload spellings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderGameRecord {
    #[serde(deserialize_with = "de_provider_id")]
    pub id: ProviderGameId,
    #[serde(default)]
    pub season: Option<Season>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "home_team")]
    pub home_team: Option<String>,
    #[serde(default, alias = "away_team")]
    pub away_team: Option<String>,
    /// UTC, e.g. "2025-01-02T17:00:00.000Z"
    #[serde(default, alias = "start_date")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "de_null_bool")]
    pub completed: bool,
    #[serde(default, alias = "home_points")]
    pub home_points: Option<u32>,
    #[serde(default, alias = "away_points")]
    pub away_points: Option<u32>,
    /// `None` when lines are unknown; `Some(vec![])` when the provider has no odds.
    #[serde(default)]
    pub lines: Option<Vec<BettingLine>>,
}

impl ProviderGameRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ProviderGameId::new(id),
            season: None,
            notes: None,
            home_team: None,
            away_team: None,
            start_date: None,
            completed: false,
            home_points: None,
            away_points: None,
            lines: None,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn with_teams(mut self, home: &str, away: &str) -> Self {
        self.home_team = Some(home.to_string());
        self.away_team = Some(away.to_string());
        self
    }

    pub fn with_start(mut self, start_date: &str) -> Self {
        self.start_date = Some(start_date.to_string());
        self
    }

    pub fn with_final_score(mut self, home_points: u32, away_points: u32) -> Self {
        self.completed = true;
        self.home_points = Some(home_points);
        self.away_points = Some(away_points);
        self
    }

    pub fn with_lines(mut self, lines: Vec<BettingLine>) -> Self {
        self.lines = Some(lines);
        self
    }

    /// Free-text bowl label, if any.
    pub fn label(&self) -> &str {
        self.notes.as_deref().unwrap_or_default()
    }
}

fn de_provider_id<'de, D>(deserializer: D) -> Result<ProviderGameId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Num(n) => Ok(ProviderGameId(n.to_string())),
        Repr::Text(s) => ProviderGameId::parse(&s)
            .ok_or_else(|| serde::de::Error::custom("empty provider game id")),
    }
}

fn de_null_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn de_spread<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(f64),
        Text(String),
    }

    Ok(match Option::<Repr>::deserialize(deserializer)? {
        Some(Repr::Num(n)) => Some(n),
        Some(Repr::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
