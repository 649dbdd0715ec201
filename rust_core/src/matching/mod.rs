//! Candidate Matching
//!
//! Maps one local bowl row onto a provider game of the same season. Tiers are
//! tried in strict priority order and the first tier that produces a hit
//! wins; later tiers are never consulted.
//!
//! 1. exact bowl label
//! 2. exact home/away pair (same orientation)
//! 3. kickoff-time prefix
//! 4. fuzzy bowl label (word-set Jaccard, accepted at `>= 0.35`)

use crate::models::{LocalGameRecord, MatchTier, ProviderGameId, ProviderGameRecord};

pub mod tiers;

pub use tiers::{ExactLabelTier, ExactTeamsTier, FuzzyLabelTier, KickoffPrefixTier};

/// Minimum Jaccard score for a fuzzy label match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.35;

/// A single tier's pick.
#[derive(Debug, Clone, PartialEq)]
pub struct TierHit {
    pub provider_id: ProviderGameId,
    /// 1.0 for exact tiers, the Jaccard score for the fuzzy tier
    pub score: f64,
}

impl TierHit {
    pub fn exact(game: &ProviderGameRecord) -> Self {
        Self {
            provider_id: game.id.clone(),
            score: 1.0,
        }
    }
}

/// Result of matching one local row.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched {
        provider_id: ProviderGameId,
        tier: MatchTier,
        score: f64,
    },
    Unmatched,
}

impl MatchOutcome {
    pub fn provider_id(&self) -> Option<&ProviderGameId> {
        match self {
            MatchOutcome::Matched { provider_id, .. } => Some(provider_id),
            MatchOutcome::Unmatched => None,
        }
    }

    pub fn tier(&self) -> Option<MatchTier> {
        match self {
            MatchOutcome::Matched { tier, .. } => Some(*tier),
            MatchOutcome::Unmatched => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }
}

/// One matching tier.
///
/// Implementations are pure: absent or empty fields on either side never
/// match, and ties go to the first candidate in input order.
pub trait MatchStrategy: Send + Sync {
    /// Tier recorded on the local row when this strategy wins
    fn tier(&self) -> MatchTier;

    /// Pick a provider game for `local` among `candidates`, if any.
    fn find(&self, local: &LocalGameRecord, candidates: &[ProviderGameRecord]) -> Option<TierHit>;
}

/// Ordered tier chain.
pub struct CandidateMatcher {
    tiers: Vec<Box<dyn MatchStrategy>>,
}

impl CandidateMatcher {
    /// Standard four-tier chain with the default fuzzy threshold.
    pub fn new() -> Self {
        Self::with_fuzzy_threshold(DEFAULT_FUZZY_THRESHOLD)
    }

    pub fn with_fuzzy_threshold(threshold: f64) -> Self {
        Self {
            tiers: vec![
                Box::new(ExactLabelTier),
                Box::new(ExactTeamsTier),
                Box::new(KickoffPrefixTier),
                Box::new(FuzzyLabelTier::new(threshold)),
            ],
        }
    }

    /// Build a chain from explicit tiers, tried in the given order.
    pub fn from_tiers(tiers: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self { tiers }
    }

    /// Match one local row against the provider games of its season.
    pub fn match_game(
        &self,
        local: &LocalGameRecord,
        candidates: &[ProviderGameRecord],
    ) -> MatchOutcome {
        if candidates.is_empty() {
            return MatchOutcome::Unmatched;
        }

        for strategy in &self.tiers {
            if let Some(hit) = strategy.find(local, candidates) {
                return MatchOutcome::Matched {
                    provider_id: hit.provider_id,
                    tier: strategy.tier(),
                    score: hit.score,
                };
            }
        }

        MatchOutcome::Unmatched
    }
}

impl Default for CandidateMatcher {
    fn default() -> Self {
        Self::new()
    }
}
