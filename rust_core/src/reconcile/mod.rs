//! Reconciliation Driver
//!
//! Walks the local table season by season, resolves each row to a provider
//! game and folds provider data back into the row:
//!
//! - identity: `provider_game_id` + `match_tier` from the candidate matcher
//! - enrichment (`apply_updates`): team spelling/orientation, records, ranks,
//!   kickoff precision, spread
//! - results (`apply_result`): winner, final score, completion flag
//!
//! The driver itself is pure. Fetching happens up front (see `crate::sync`),
//! so a season's updates are computed in memory and committed together.

pub mod overrides;

use crate::matching::{CandidateMatcher, MatchOutcome, DEFAULT_FUZZY_THRESHOLD};
use crate::models::{
    BettingLine, LocalGameRecord, MatchTier, ProviderGameId, ProviderGameRecord, Season,
};
use crate::utils::matching::{closest_label, is_placeholder_team, normalize, normalize_winner_name};
use chrono::{DateTime, NaiveDate};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

pub use overrides::{RankOverride, RankOverrides};

/// Sportsbooks consulted for the spread, most trusted first.
pub const DEFAULT_SPREAD_PROVIDERS: &[&str] = &["consensus", "DraftKings", "ESPN Bet", "Bovada"];

/// Team-keyed lookup compared on canonical names ("Hawai'i" finds "Hawaii").
#[derive(Debug, Clone, PartialEq)]
pub struct TeamTable<T> {
    entries: HashMap<String, T>,
}

impl<T> TeamTable<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert a value; the first spelling of a team wins.
    pub fn insert(&mut self, team: &str, value: T) {
        let key = normalize(team);
        if !key.is_empty() {
            self.entries.entry(key).or_insert(value);
        }
    }

    pub fn get(&self, team: &str) -> Option<&T> {
        self.entries.get(&normalize(team))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for TeamTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(String, T)> for TeamTable<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (team, value) in iter {
            table.insert(&team, value);
        }
        table
    }
}

/// Everything fetched from the provider for one season.
///
/// `None` lookups mean the fetch failed; the matching fields are then left
/// untouched rather than cleared.
#[derive(Debug, Clone, Default)]
pub struct SeasonData {
    pub games: Vec<ProviderGameRecord>,
    pub team_records: Option<TeamTable<String>>,
    pub rankings: Option<TeamTable<u32>>,
}

impl SeasonData {
    pub fn new(games: Vec<ProviderGameRecord>) -> Self {
        Self {
            games,
            team_records: None,
            rankings: None,
        }
    }

    pub fn game(&self, id: &ProviderGameId) -> Option<&ProviderGameRecord> {
        self.games.iter().find(|g| &g.id == id)
    }
}

/// Which passes a run performs.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Run the candidate matcher on rows without a trusted id
    pub match_ids: bool,
    /// Re-match every row, trusted ids included
    pub force_rematch: bool,
    /// Apply team/record/rank/kickoff/spread enrichment
    pub enrich: bool,
    /// Record winners and final scores
    pub results: bool,
    pub fuzzy_threshold: f64,
    pub spread_providers: Vec<String>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            match_ids: true,
            force_rematch: false,
            enrich: true,
            results: true,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            spread_providers: DEFAULT_SPREAD_PROVIDERS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Rows resolved by the matcher this run
    pub matched: usize,
    /// Rows that kept a previously trusted id
    pub kept: usize,
    pub unmatched: usize,
    /// Rows with no derivable season
    pub skipped: usize,
    /// Rows whose stored values changed
    pub updated_rows: usize,
    pub results_recorded: usize,
}

impl ReconcileReport {
    pub fn has_changes(&self) -> bool {
        self.updated_rows > 0
    }
}

/// How a row ended up with (or without) a provider id.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Previously trusted id, not re-matched
    Kept(ProviderGameId),
    Matched {
        provider_id: ProviderGameId,
        tier: MatchTier,
        score: f64,
    },
    /// No tier hit; any existing id is retained
    Unmatched(Option<ProviderGameId>),
}

impl Resolution {
    pub fn provider_id(&self) -> Option<&ProviderGameId> {
        match self {
            Resolution::Kept(id) => Some(id),
            Resolution::Matched { provider_id, .. } => Some(provider_id),
            Resolution::Unmatched(existing) => existing.as_ref(),
        }
    }
}

pub struct Reconciler {
    matcher: CandidateMatcher,
    options: ReconcileOptions,
    overrides: RankOverrides,
}

impl Reconciler {
    pub fn new(options: ReconcileOptions, overrides: RankOverrides) -> Self {
        Self {
            matcher: CandidateMatcher::with_fuzzy_threshold(options.fuzzy_threshold),
            options,
            overrides,
        }
    }

    pub fn with_matcher(mut self, matcher: CandidateMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Distinct seasons of the table, ascending. Rows with no season are left out.
    pub fn seasons(table: &[LocalGameRecord]) -> Vec<Season> {
        table
            .iter()
            .filter_map(LocalGameRecord::season)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Decide which provider game a row refers to.
    pub fn resolve(&self, local: &LocalGameRecord, games: &[ProviderGameRecord]) -> Resolution {
        if let Some(id) = &local.provider_game_id {
            if !self.options.match_ids || (local.has_trusted_id() && !self.options.force_rematch) {
                return Resolution::Kept(id.clone());
            }
        } else if !self.options.match_ids {
            return Resolution::Unmatched(None);
        }

        match self.matcher.match_game(local, games) {
            MatchOutcome::Matched { provider_id, tier, score } => {
                Resolution::Matched { provider_id, tier, score }
            }
            MatchOutcome::Unmatched => Resolution::Unmatched(local.provider_game_id.clone()),
        }
    }

    /// Provider ids the rows of `season` will resolve to, in table order.
    ///
    /// Used to decide which games need their betting lines fetched.
    pub fn resolved_ids(
        &self,
        table: &[LocalGameRecord],
        season: Season,
        games: &[ProviderGameRecord],
    ) -> Vec<ProviderGameId> {
        let mut seen = BTreeSet::new();
        table
            .iter()
            .filter(|rec| rec.season() == Some(season))
            .filter_map(|rec| self.resolve(rec, games).provider_id().cloned())
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// Run every enabled pass over `table` in place.
    ///
    /// Rows keep their order; a season's rows are written back together once
    /// all of them have been computed.
    pub fn reconcile(
        &self,
        table: &mut [LocalGameRecord],
        seasons: &HashMap<Season, SeasonData>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let empty = SeasonData::default();

        for (idx, rec) in table.iter().enumerate() {
            if rec.season().is_none() {
                warn!(
                    "Row {} ({}): cannot derive season from kickoff {:?}; skipping",
                    idx, rec.game_id, rec.kickoff_datetime
                );
                report.skipped += 1;
            }
        }

        for season in Self::seasons(table) {
            let data = seasons.get(&season).unwrap_or_else(|| {
                warn!("No provider data for season {}; rows keep their values", season);
                &empty
            });

            let mut pending = Vec::new();
            for (idx, rec) in table.iter().enumerate() {
                if rec.season() != Some(season) {
                    continue;
                }
                let updated = self.reconcile_row(rec, season, data, &mut report);
                if &updated != rec {
                    info!("{} ({}): updated", rec.bowl_name, rec.game_id);
                    pending.push((idx, updated));
                } else {
                    debug!("{} ({}): unchanged", rec.bowl_name, rec.game_id);
                }
            }

            info!(
                "Season {}: {} provider games, {} rows changed",
                season,
                data.games.len(),
                pending.len()
            );
            report.updated_rows += pending.len();
            for (idx, updated) in pending {
                table[idx] = updated;
            }
        }

        report
    }

    fn reconcile_row(
        &self,
        local: &LocalGameRecord,
        season: Season,
        data: &SeasonData,
        report: &mut ReconcileReport,
    ) -> LocalGameRecord {
        let mut out = local.clone();

        match self.resolve(local, &data.games) {
            Resolution::Kept(id) => {
                debug!("{}: keeping provider id {}", local.bowl_name, id);
                report.kept += 1;
            }
            // Re-matching onto the id already held keeps the stored tier, so
            // a fuzzy row whose teams were filled in stays put on the next run.
            Resolution::Matched { provider_id, tier, .. }
                if local.provider_game_id.as_ref() == Some(&provider_id)
                    && local.match_tier.is_some() =>
            {
                debug!(
                    "{}: re-match confirmed provider id {} (tier: {})",
                    local.bowl_name, provider_id, tier
                );
                report.kept += 1;
            }
            Resolution::Matched { provider_id, tier, score } => {
                info!(
                    "{} -> provider game {} (tier: {}, score: {:.2})",
                    local.bowl_name, provider_id, tier, score
                );
                out.provider_game_id = Some(provider_id);
                out.match_tier = Some(tier);
                report.matched += 1;
            }
            Resolution::Unmatched(existing) => {
                report.unmatched += 1;
                if self.options.match_ids {
                    let hint = closest_label(&local.bowl_name, data.games.iter().map(|g| g.label()));
                    match (existing, hint) {
                        (Some(id), _) => warn!(
                            "{}: no match in season {}; keeping provider id {}",
                            local.bowl_name, season, id
                        ),
                        (None, Some((label, score))) => warn!(
                            "{}: no match in season {} (closest label: {:?}, {:.2})",
                            local.bowl_name, season, label, score
                        ),
                        (None, None) => warn!("{}: no match in season {}", local.bowl_name, season),
                    }
                }
            }
        }

        let Some(game) = out.provider_game_id.as_ref().and_then(|id| data.game(id)) else {
            return out;
        };

        if self.options.enrich {
            out = self.apply_updates(&out, game, season, data);
        }
        if self.options.results {
            let with_result = apply_result(&out, game);
            if with_result.winner != out.winner || with_result.completed != out.completed {
                info!(
                    "{}: final {}-{}, winner {:?}",
                    local.bowl_name,
                    game.home_points.unwrap_or_default(),
                    game.away_points.unwrap_or_default(),
                    with_result.winner
                );
                report.results_recorded += 1;
            }
            out = with_result;
        }

        out
    }

    /// Fold provider details into a matched row.
    ///
    /// Fields with nothing to offer (failed lookup, unknown team, absent
    /// lines) keep their existing values.
    pub fn apply_updates(
        &self,
        local: &LocalGameRecord,
        game: &ProviderGameRecord,
        season: Season,
        data: &SeasonData,
    ) -> LocalGameRecord {
        let mut out = local.clone();

        update_teams(&mut out, game);

        if let Some(records) = &data.team_records {
            if let Some(record) = records.get(&out.home_team) {
                out.home_record = Some(record.clone());
            }
            if let Some(record) = records.get(&out.away_team) {
                out.away_record = Some(record.clone());
            }
        }

        out.home_rank = self.rank_for(season, &out.home_team, out.home_rank, data);
        out.away_rank = self.rank_for(season, &out.away_team, out.away_rank, data);

        if let Some(kickoff) = game
            .start_date
            .as_deref()
            .and_then(|start| refine_kickoff(&out.kickoff_datetime, start))
        {
            out.kickoff_datetime = kickoff;
        }

        if let Some(lines) = &game.lines {
            out.spread = select_spread(lines, &self.options.spread_providers);
        }

        out
    }

    /// Override, else poll rank, else unranked. With no poll available only
    /// overrides apply.
    fn rank_for(&self, season: Season, team: &str, current: Option<u32>, data: &SeasonData) -> Option<u32> {
        if is_placeholder_team(team) {
            return current;
        }
        if let Some(rank) = self.overrides.rank_for(season, team) {
            return Some(rank);
        }
        match &data.rankings {
            Some(rankings) => rankings.get(team).copied(),
            None => current,
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(ReconcileOptions::default(), RankOverrides::default())
    }
}

/// Adopt the provider's team spelling and home/away orientation when every
/// known local team appears in the provider pair.
fn update_teams(out: &mut LocalGameRecord, game: &ProviderGameRecord) {
    let (Some(home), Some(away)) = (game.home_team.as_deref(), game.away_team.as_deref()) else {
        return;
    };
    if is_placeholder_team(home) || is_placeholder_team(away) {
        return;
    }

    let provider_keys = [normalize(home), normalize(away)];
    let consistent = [&out.home_team, &out.away_team]
        .into_iter()
        .filter(|team| !is_placeholder_team(team))
        .all(|team| provider_keys.contains(&normalize(team.as_str())));
    if !consistent {
        warn!(
            "{}: local teams {} vs {} disagree with provider {} vs {}; keeping local",
            out.bowl_name, out.home_team, out.away_team, home, away
        );
        return;
    }

    // Orientation follows whichever local team is known.
    let known = |team: &str| Some(normalize(team)).filter(|_| !is_placeholder_team(team));
    let swapped = match (known(out.home_team.as_str()), known(out.away_team.as_str())) {
        (Some(h), _) => h == provider_keys[1] && h != provider_keys[0],
        (None, Some(a)) => a == provider_keys[0] && a != provider_keys[1],
        (None, None) => false,
    };
    if swapped {
        info!("{}: swapping home/away to match provider", out.bowl_name);
        std::mem::swap(&mut out.home_rank, &mut out.away_rank);
        std::mem::swap(&mut out.home_record, &mut out.away_record);
        std::mem::swap(&mut out.home_score, &mut out.away_score);
    }
    out.home_team = home.to_string();
    out.away_team = away.to_string();
}

/// Record the final result of a completed game.
///
/// Requires the game to be completed with both scores present; winner,
/// scores and completion flag are set together or not at all. Ties are
/// left alone. Applying it twice changes nothing the second time.
pub fn apply_result(local: &LocalGameRecord, game: &ProviderGameRecord) -> LocalGameRecord {
    let mut out = local.clone();
    if !game.completed {
        return out;
    }
    let (Some(home_points), Some(away_points)) = (game.home_points, game.away_points) else {
        return out;
    };
    if home_points == away_points {
        debug!("{}: tied final {}-{}; no winner recorded", local.bowl_name, home_points, away_points);
        return out;
    }

    let winner = if home_points > away_points {
        game.home_team.as_deref().unwrap_or(&local.home_team)
    } else {
        game.away_team.as_deref().unwrap_or(&local.away_team)
    };
    let winner = normalize_winner_name(winner);
    if winner.is_empty() {
        return out;
    }

    out.winner = Some(winner);
    out.completed = true;
    out.home_score = Some(home_points);
    out.away_score = Some(away_points);
    out
}

/// Spread from the first priority provider that has one, else the first
/// line that has one.
pub fn select_spread(lines: &[BettingLine], priority: &[String]) -> Option<f64> {
    priority
        .iter()
        .find_map(|wanted| {
            lines
                .iter()
                .find(|line| line.provider.eq_ignore_ascii_case(wanted) && line.spread.is_some())
                .and_then(|line| line.spread)
        })
        .or_else(|| lines.iter().find_map(|line| line.spread))
}

/// Full kickoff for a date-only local value, when the provider start falls
/// on that same (UTC) date. Returns "YYYY-MM-DD HH:MM".
pub fn refine_kickoff(local: &str, provider_start: &str) -> Option<String> {
    let local_date = NaiveDate::parse_from_str(local.trim(), "%Y-%m-%d").ok()?;
    let start = DateTime::parse_from_rfc3339(provider_start.trim()).ok()?.naive_utc();
    if start.date() != local_date {
        return None;
    }
    Some(start.format("%Y-%m-%d %H:%M").to_string())
}
