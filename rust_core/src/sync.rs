//! One reconciliation run: load, fetch per season, reconcile, save once.

use crate::error::StoreError;
use crate::models::Season;
use crate::providers::{GameProvider, SeasonType};
use crate::reconcile::{ReconcileReport, Reconciler, SeasonData, TeamTable};
use crate::store::{GameTable, TableStore};
use std::collections::HashMap;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub season_type: SeasonType,
    /// Poll used for team ranks
    pub ranking_poll: String,
    /// Compute and log changes without saving
    pub dry_run: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            season_type: SeasonType::Postseason,
            ranking_poll: "College Football Playoff Rankings".to_string(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncSummary {
    pub report: ReconcileReport,
    pub seasons: Vec<Season>,
    pub saved: bool,
}

pub struct SyncRunner<P, S> {
    provider: P,
    store: S,
    reconciler: Reconciler,
    settings: SyncSettings,
}

impl<P: GameProvider, S: TableStore> SyncRunner<P, S> {
    pub fn new(provider: P, store: S, reconciler: Reconciler, settings: SyncSettings) -> Self {
        Self {
            provider,
            store,
            reconciler,
            settings,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run every enabled pass and persist the table if anything changed.
    ///
    /// Provider failures only shrink what gets updated; a store failure is
    /// returned after logging how many row changes were lost.
    pub async fn run(&self) -> Result<SyncSummary, StoreError> {
        let mut table = self.store.load()?;
        let seasons = Reconciler::seasons(&table.rows);
        info!(
            "Reconciling {} rows across seasons {:?} via {}",
            table.rows.len(),
            seasons,
            self.provider.provider_name()
        );

        let mut data = HashMap::new();
        for &season in &seasons {
            data.insert(season, self.fetch_season(&table, season).await);
        }

        let report = self.reconciler.reconcile(&mut table.rows, &data);
        info!(
            "Matched {}, kept {}, unmatched {}, skipped {}, results {}, rows changed {}",
            report.matched,
            report.kept,
            report.unmatched,
            report.skipped,
            report.results_recorded,
            report.updated_rows
        );

        let saved = self.persist(&table, &report)?;
        Ok(SyncSummary {
            report,
            seasons,
            saved,
        })
    }

    fn persist(&self, table: &GameTable, report: &ReconcileReport) -> Result<bool, StoreError> {
        if !report.has_changes() {
            info!("No changes; {} left untouched", self.store.location());
            return Ok(false);
        }
        if self.settings.dry_run {
            info!(
                "Dry run; {} changed rows not written to {}",
                report.updated_rows,
                self.store.location()
            );
            return Ok(false);
        }

        if let Err(e) = self.store.save(table) {
            error!(
                "Failed to save {} changed rows to {}: {}",
                report.updated_rows,
                self.store.location(),
                e
            );
            return Err(e);
        }
        Ok(true)
    }

    /// Fetch everything the enabled passes need for one season.
    async fn fetch_season(&self, table: &GameTable, season: Season) -> SeasonData {
        let games = match self.provider.fetch_games(season, self.settings.season_type).await {
            Ok(games) => games,
            Err(e) => {
                warn!("Season {}: failed to fetch games: {}", season, e);
                Vec::new()
            }
        };
        info!("Season {}: {} provider games", season, games.len());

        let mut data = SeasonData::new(games);
        if !self.reconciler.options().enrich || data.games.is_empty() {
            return data;
        }

        data.team_records = match self.provider.fetch_team_records(season).await {
            Ok(records) => Some(records.into_iter().collect::<TeamTable<_>>()),
            Err(e) => {
                warn!("Season {}: team records unavailable: {}", season, e);
                None
            }
        };
        data.rankings = match self.provider.fetch_rankings(season, &self.settings.ranking_poll).await {
            Ok(ranks) => Some(ranks.into_iter().collect::<TeamTable<_>>()),
            Err(e) => {
                warn!(
                    "Season {}: '{}' rankings unavailable: {}",
                    season, self.settings.ranking_poll, e
                );
                None
            }
        };

        for id in self.reconciler.resolved_ids(&table.rows, season, &data.games) {
            let Some(game) = data.games.iter_mut().find(|g| g.id == id) else {
                continue;
            };
            if game.lines.is_some() {
                continue;
            }
            match self.provider.fetch_betting_lines(&id).await {
                Ok(lines) => game.lines = Some(lines),
                Err(e) => warn!("Game {}: betting lines unavailable: {}", id, e),
            }
        }

        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocalGameRecord, ProviderGameRecord};
    use crate::providers::memory::SeasonFixture;
    use crate::providers::InMemoryProvider;
    use parking_lot::Mutex;
    use std::io;
    use std::path::PathBuf;

    /// Store whose writes always fail, e.g. a read-only mount.
    struct ReadOnlyStore {
        table: GameTable,
        loads: Mutex<usize>,
        saves: Mutex<usize>,
    }

    impl ReadOnlyStore {
        fn new(rows: Vec<LocalGameRecord>) -> Self {
            Self {
                table: GameTable::new(rows),
                loads: Mutex::new(0),
                saves: Mutex::new(0),
            }
        }
    }

    impl TableStore for ReadOnlyStore {
        fn load(&self) -> Result<GameTable, StoreError> {
            *self.loads.lock() += 1;
            Ok(self.table.clone())
        }

        fn save(&self, _table: &GameTable) -> Result<(), StoreError> {
            *self.saves.lock() += 1;
            Err(StoreError::Io {
                path: PathBuf::from("/readonly/bowl_games.csv"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only file system"),
            })
        }

        fn location(&self) -> String {
            "/readonly/bowl_games.csv".to_string()
        }
    }

    fn sugar_bowl_provider() -> InMemoryProvider {
        InMemoryProvider::new().with_season(
            2025,
            SeasonFixture {
                games: vec![ProviderGameRecord::new("401677182")
                    .with_notes("Sugar Bowl")
                    .with_teams("Georgia", "Notre Dame")],
                ..SeasonFixture::default()
            },
        )
    }

    fn sugar_bowl_row() -> LocalGameRecord {
        LocalGameRecord::new("g1", "Sugar Bowl", "2025-01-02", "TBD", "TBD")
    }

    #[tokio::test]
    async fn test_save_failure_is_returned() {
        let runner = SyncRunner::new(
            sugar_bowl_provider(),
            ReadOnlyStore::new(vec![sugar_bowl_row()]),
            Reconciler::default(),
            SyncSettings::default(),
        );

        let err = runner.run().await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Io { ref source, .. } if source.kind() == io::ErrorKind::PermissionDenied
        ));
        assert_eq!(*runner.store().loads.lock(), 1);
        assert_eq!(*runner.store().saves.lock(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_skips_save() {
        let runner = SyncRunner::new(
            sugar_bowl_provider(),
            ReadOnlyStore::new(vec![sugar_bowl_row()]),
            Reconciler::default(),
            SyncSettings {
                dry_run: true,
                ..SyncSettings::default()
            },
        );

        let summary = runner.run().await.unwrap();
        assert!(!summary.saved);
        assert_eq!(summary.report.updated_rows, 1);
        assert_eq!(summary.seasons, vec![2025]);
        assert_eq!(*runner.store().saves.lock(), 0);
    }
}
