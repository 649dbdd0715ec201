//! The four matching tiers.

use super::{MatchStrategy, TierHit};
use crate::models::{LocalGameRecord, MatchTier, ProviderGameRecord};
use crate::utils::matching::{is_placeholder_team, normalize, similarity};

/// Shortest kickoff string accepted as a prefix ("YYYY-MM-DD"). Anything
/// shorter would act as a wildcard over the whole season.
const MIN_KICKOFF_PREFIX_LEN: usize = 10;

/// Tier 1: canonical provider label equals canonical local bowl name.
pub struct ExactLabelTier;

impl MatchStrategy for ExactLabelTier {
    fn tier(&self) -> MatchTier {
        MatchTier::Label
    }

    fn find(&self, local: &LocalGameRecord, candidates: &[ProviderGameRecord]) -> Option<TierHit> {
        let bowl_key = normalize(local.bowl_name.as_str());
        if bowl_key.is_empty() {
            return None;
        }

        candidates
            .iter()
            .find(|game| normalize(game.notes.as_deref()) == bowl_key)
            .map(TierHit::exact)
    }
}

/// Tier 2: canonical home and away teams both equal, orientation preserved.
pub struct ExactTeamsTier;

impl MatchStrategy for ExactTeamsTier {
    fn tier(&self) -> MatchTier {
        MatchTier::Teams
    }

    fn find(&self, local: &LocalGameRecord, candidates: &[ProviderGameRecord]) -> Option<TierHit> {
        if is_placeholder_team(&local.home_team) || is_placeholder_team(&local.away_team) {
            return None;
        }
        let home_key = normalize(local.home_team.as_str());
        let away_key = normalize(local.away_team.as_str());

        candidates
            .iter()
            .find(|game| {
                let (Some(home), Some(away)) = (game.home_team.as_deref(), game.away_team.as_deref())
                else {
                    return false;
                };
                !is_placeholder_team(home)
                    && !is_placeholder_team(away)
                    && normalize(home) == home_key
                    && normalize(away) == away_key
            })
            .map(TierHit::exact)
    }
}

/// Tier 3: provider UTC start (trailing "Z" removed) starts with the local
/// kickoff in ISO form ("2025-01-02 12:00" -> "2025-01-02T12:00").
pub struct KickoffPrefixTier;

impl KickoffPrefixTier {
    fn local_prefix(kickoff: &str) -> Option<String> {
        let trimmed = kickoff.trim();
        if trimmed.len() < MIN_KICKOFF_PREFIX_LEN {
            return None;
        }
        Some(trimmed.replace(' ', "T"))
    }
}

impl MatchStrategy for KickoffPrefixTier {
    fn tier(&self) -> MatchTier {
        MatchTier::Kickoff
    }

    fn find(&self, local: &LocalGameRecord, candidates: &[ProviderGameRecord]) -> Option<TierHit> {
        let prefix = Self::local_prefix(&local.kickoff_datetime)?;

        candidates
            .iter()
            .find(|game| {
                let Some(start) = game.start_date.as_deref().map(str::trim) else {
                    return false;
                };
                let start = start.strip_suffix('Z').unwrap_or(start);
                !start.is_empty() && start.starts_with(&prefix)
            })
            .map(TierHit::exact)
    }
}

/// Tier 4: best word-set similarity between provider label and local bowl
/// name, accepted only at or above the threshold. Ties keep the first seen.
pub struct FuzzyLabelTier {
    threshold: f64,
}

impl FuzzyLabelTier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl MatchStrategy for FuzzyLabelTier {
    fn tier(&self) -> MatchTier {
        MatchTier::Fuzzy
    }

    fn find(&self, local: &LocalGameRecord, candidates: &[ProviderGameRecord]) -> Option<TierHit> {
        let mut best: Option<(&ProviderGameRecord, f64)> = None;

        for game in candidates {
            let score = similarity(game.label(), &local.bowl_name);
            if score > best.map_or(0.0, |(_, best_score)| best_score) {
                best = Some((game, score));
            }
        }

        best.filter(|(_, score)| *score >= self.threshold)
            .map(|(game, score)| TierHit {
                provider_id: game.id.clone(),
                score,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    /// Label pair with `shared` common words and the given union size.
    fn labels_with_score(shared: usize, union: usize) -> (String, String) {
        let extra = union - shared;
        let left_extra = extra / 2;
        let right_extra = extra - left_extra;

        let common = words("w", shared);
        let mut left = common.clone();
        left.extend(words("l", left_extra));
        let mut right = common;
        right.extend(words("r", right_extra));
        (left.join(" "), right.join(" "))
    }

    #[test]
    fn test_fuzzy_threshold_boundary_accepts_035() {
        let (bowl, label) = labels_with_score(7, 20);
        assert_eq!(similarity(&label, &bowl), 0.35);

        let rec = LocalGameRecord::new("g", bowl.as_str(), "", "", "");
        let games = vec![ProviderGameRecord::new("1").with_notes(&label)];
        let hit = FuzzyLabelTier::new(0.35).find(&rec, &games).unwrap();
        assert_eq!(hit.provider_id.as_str(), "1");
        assert_eq!(hit.score, 0.35);
    }

    #[test]
    fn test_fuzzy_threshold_boundary_rejects_034() {
        let (bowl, label) = labels_with_score(17, 50);
        assert_eq!(similarity(&label, &bowl), 0.34);

        let rec = LocalGameRecord::new("g", bowl.as_str(), "", "", "");
        let games = vec![ProviderGameRecord::new("1").with_notes(&label)];
        assert!(FuzzyLabelTier::new(0.35).find(&rec, &games).is_none());
    }

    #[test]
    fn test_fuzzy_ties_keep_first_seen() {
        let rec = LocalGameRecord::new("g", "Sun Bowl", "", "", "");
        let games = vec![
            ProviderGameRecord::new("first").with_notes("Tony the Tiger Sun Bowl"),
            ProviderGameRecord::new("second").with_notes("Sun Bowl Presented By Someone"),
        ];
        // both score 2/5
        let hit = FuzzyLabelTier::new(0.35).find(&rec, &games).unwrap();
        assert_eq!(hit.provider_id.as_str(), "first");
    }

    #[test]
    fn test_label_first_match_wins() {
        let rec = LocalGameRecord::new("g", "Gator Bowl", "", "", "");
        let games = vec![
            ProviderGameRecord::new("a").with_notes("GATOR BOWL"),
            ProviderGameRecord::new("b").with_notes("Gator Bowl"),
        ];
        assert_eq!(ExactLabelTier.find(&rec, &games).unwrap().provider_id.as_str(), "a");
    }

    #[test]
    fn test_label_empty_local_never_matches_empty_notes() {
        let rec = LocalGameRecord::new("g", "", "", "", "");
        let games = vec![ProviderGameRecord::new("a")];
        assert!(ExactLabelTier.find(&rec, &games).is_none());
    }

    #[test]
    fn test_teams_orientation_must_match() {
        let rec = LocalGameRecord::new("g", "", "", "Oregon", "Ohio State");
        let games = vec![ProviderGameRecord::new("a").with_teams("Ohio State", "Oregon")];
        assert!(ExactTeamsTier.find(&rec, &games).is_none());

        let rec = LocalGameRecord::new("g", "", "", "ohio state", "OREGON");
        assert!(ExactTeamsTier.find(&rec, &games).is_some());
    }

    #[test]
    fn test_teams_placeholders_never_match() {
        let rec = LocalGameRecord::new("g", "", "", "TBD", "TBD");
        let games = vec![ProviderGameRecord::new("a").with_teams("TBD", "TBD")];
        assert!(ExactTeamsTier.find(&rec, &games).is_none());

        let rec = LocalGameRecord::new("g", "", "", "Duke", "Ole Miss");
        let games = vec![ProviderGameRecord::new("a")];
        assert!(ExactTeamsTier.find(&rec, &games).is_none());
    }

    #[test]
    fn test_kickoff_prefix() {
        let games = vec![
            ProviderGameRecord::new("a").with_start("2025-01-01T17:00:00.000Z"),
            ProviderGameRecord::new("b").with_start("2025-01-02T17:00:00.000Z"),
        ];

        let rec = LocalGameRecord::new("g", "", "2025-01-02 17:00", "", "");
        assert_eq!(KickoffPrefixTier.find(&rec, &games).unwrap().provider_id.as_str(), "b");

        let rec = LocalGameRecord::new("g", "", "2025-01-02", "", "");
        assert_eq!(KickoffPrefixTier.find(&rec, &games).unwrap().provider_id.as_str(), "b");

        let rec = LocalGameRecord::new("g", "", "2025-01-02 12:00", "", "");
        assert!(KickoffPrefixTier.find(&rec, &games).is_none());
    }

    #[test]
    fn test_kickoff_short_or_empty_never_matches() {
        let games = vec![ProviderGameRecord::new("a").with_start("2025-01-01T17:00:00.000Z")];
        for kickoff in ["", "2025", "TBD", "   "] {
            let rec = LocalGameRecord::new("g", "", kickoff, "", "");
            assert!(KickoffPrefixTier.find(&rec, &games).is_none(), "{:?}", kickoff);
        }
    }
}
