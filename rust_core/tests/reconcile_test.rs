//! End-to-end runs against a CSV file and an in-memory provider.

use bowl_sync_core::providers::memory::SeasonFixture;
use bowl_sync_core::reconcile::RankOverride;
use bowl_sync_core::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const HEADER: &str = "game_id,bowl_name,kickoff_datetime,point_value,away_team,home_team,away_record,home_record,away_rank,home_rank,status,winner,completed,away_score,home_score,cfbd_game_id,location,network,spread";

fn write_table(dir: &Path, rows: &[&str]) -> PathBuf {
    let path = dir.join("games.csv");
    let mut text = format!("{}\n", HEADER);
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    fs::write(&path, text).unwrap();
    path
}

fn runner(
    provider: InMemoryProvider,
    path: &Path,
    options: ReconcileOptions,
    overrides: RankOverrides,
) -> SyncRunner<InMemoryProvider, CsvTableStore> {
    SyncRunner::new(
        provider,
        CsvTableStore::new(path),
        Reconciler::new(options, overrides),
        SyncSettings::default(),
    )
}

fn postseason_2024() -> SeasonFixture {
    SeasonFixture {
        games: vec![
            ProviderGameRecord::new("401677174")
                .with_notes("TaxSlayer Gator Bowl")
                .with_teams("Duke", "Ole Miss")
                .with_start("2025-01-02T19:30:00.000Z"),
            ProviderGameRecord::new("401677180")
                .with_notes("CFP Quarterfinal - Rose Bowl Game")
                .with_teams("Oregon", "Ohio State")
                .with_start("2025-01-01T22:00:00.000Z")
                .with_final_score(21, 41),
            ProviderGameRecord::new("401677182")
                .with_notes("Sugar Bowl")
                .with_teams("Georgia", "Notre Dame")
                .with_start("2025-01-02T01:45:00.000Z")
                .with_final_score(31, 24),
        ],
        records: Some(HashMap::from([
            ("Duke".to_string(), "9-3".to_string()),
            ("Ole Miss".to_string(), "9-3".to_string()),
            ("Oregon".to_string(), "13-0".to_string()),
            ("Ohio State".to_string(), "10-2".to_string()),
        ])),
        rankings: Some(HashMap::from([
            ("Oregon".to_string(), 1),
            ("Ohio State".to_string(), 6),
            ("Ole Miss".to_string(), 14),
        ])),
        lines: HashMap::from([(
            "401677174".to_string(),
            vec![
                BettingLine::new("Bovada", Some(-14.5)),
                BettingLine::new("DraftKings", Some(-15.5)),
            ],
        )]),
    }
}

#[tokio::test]
async fn test_full_sync_enriches_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_table(
        dir.path(),
        &[
            "1,Gator Bowl,2025-01-02,5,TBD,TBD,,,,,scheduled,,False,,,,Jacksonville FL,ESPN,",
            "2,Rose Bowl,2025-01-01,10,Ohio State,Oregon,,,,,scheduled,,False,,,,Pasadena CA,ESPN,",
            "3,Sugar Bowl,2025-01-01,10,Notre Dame,Georgia,,,,,scheduled,,False,,,,New Orleans LA,ESPN,",
        ],
    );

    let provider = InMemoryProvider::new().with_season(2025, postseason_2024());
    let sync = runner(provider, &path, ReconcileOptions::default(), RankOverrides::default());
    let summary = sync.run().await.unwrap();

    assert!(summary.saved);
    assert_eq!(summary.seasons, vec![2025]);
    assert_eq!(summary.report.matched, 3);
    assert_eq!(summary.report.results_recorded, 2);

    let table = CsvTableStore::new(&path).load().unwrap();

    let gator = &table.rows[0];
    assert_eq!(gator.provider_game_id, Some(ProviderGameId::new("401677174")));
    assert_eq!(gator.match_tier, Some(MatchTier::Kickoff));
    assert_eq!(gator.home_team, "Duke");
    assert_eq!(gator.away_team, "Ole Miss");
    assert_eq!(gator.away_record.as_deref(), Some("9-3"));
    assert_eq!(gator.away_rank, Some(14));
    assert_eq!(gator.home_rank, None);
    assert_eq!(gator.spread, Some(-15.5));
    assert_eq!(gator.kickoff_datetime, "2025-01-02 19:30");
    assert_eq!(gator.extra.get("location").map(String::as_str), Some("Jacksonville FL"));

    let rose = &table.rows[1];
    assert_eq!(rose.match_tier, Some(MatchTier::Teams));
    assert_eq!(rose.winner.as_deref(), Some("ohio state"));
    assert_eq!(rose.home_score, Some(21));
    assert_eq!(rose.away_score, Some(41));
    assert!(rose.completed);

    let sugar = &table.rows[2];
    assert_eq!(sugar.match_tier, Some(MatchTier::Label));
    assert_eq!(sugar.winner.as_deref(), Some("georgia"));
    // provider start is Jan 2 UTC; local date-only value stays
    assert_eq!(sugar.kickoff_datetime, "2025-01-01");

    // one lines request per matched game
    let lines_calls = sync
        .provider()
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("lines"))
        .count();
    assert_eq!(lines_calls, 3);
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_table(
        dir.path(),
        &["3,Sugar Bowl,2025-01-01,10,Notre Dame,Georgia,,,,,scheduled,,False,,,,New Orleans LA,ESPN,"],
    );

    let first = runner(
        InMemoryProvider::new().with_season(2025, postseason_2024()),
        &path,
        ReconcileOptions::default(),
        RankOverrides::default(),
    );
    assert!(first.run().await.unwrap().saved);
    let after_first = fs::read_to_string(&path).unwrap();

    let second = runner(
        InMemoryProvider::new().with_season(2025, postseason_2024()),
        &path,
        ReconcileOptions::default(),
        RankOverrides::default(),
    );
    let summary = second.run().await.unwrap();
    assert!(!summary.saved);
    assert!(!summary.report.has_changes());
    assert_eq!(summary.report.kept, 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
}

#[tokio::test]
async fn test_provider_outage_leaves_table_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_table(
        dir.path(),
        &["1,Gator Bowl,2025-01-02,5,TBD,TBD,,,,,scheduled,,False,,,,Jacksonville FL,ESPN,"],
    );
    let before = fs::read_to_string(&path).unwrap();

    let sync = runner(
        InMemoryProvider::new(),
        &path,
        ReconcileOptions::default(),
        RankOverrides::default(),
    );
    let summary = sync.run().await.unwrap();

    assert!(!summary.saved);
    assert_eq!(summary.report.unmatched, 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    assert_eq!(sync.provider().calls(), vec!["games 2025".to_string()]);
}

#[tokio::test]
async fn test_results_only_run_records_winner() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_table(
        dir.path(),
        &["3,Sugar Bowl,2025-01-01,10,Notre Dame,Georgia,,,,,scheduled,,False,,,401677182,New Orleans LA,ESPN,"],
    );

    let options = ReconcileOptions {
        match_ids: false,
        enrich: false,
        ..ReconcileOptions::default()
    };
    let sync = runner(
        InMemoryProvider::new().with_season(2025, postseason_2024()),
        &path,
        options,
        RankOverrides::default(),
    );
    let summary = sync.run().await.unwrap();
    assert_eq!(summary.report.results_recorded, 1);

    let row = &CsvTableStore::new(&path).load().unwrap().rows[0];
    assert_eq!(row.winner.as_deref(), Some("georgia"));
    assert_eq!(row.home_score, Some(31));
    assert_eq!(row.away_score, Some(24));
    assert_eq!(row.home_rank, None);
    assert_eq!(sync.provider().calls(), vec!["games 2025".to_string()]);
}

#[tokio::test]
async fn test_overrides_apply_when_rankings_fail() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_table(
        dir.path(),
        &["2,Rose Bowl,2025-01-01,10,Ohio State,Oregon,,,,,scheduled,,False,,,,Pasadena CA,ESPN,"],
    );

    let mut fixture = postseason_2024();
    fixture.rankings = None;
    let overrides = RankOverrides::new(vec![
        RankOverride::new("Oregon", 1, Some(2025)),
        RankOverride::new("Ohio State", 8, Some(2025)),
    ]);
    let sync = runner(
        InMemoryProvider::new().with_season(2025, fixture),
        &path,
        ReconcileOptions::default(),
        overrides,
    );
    sync.run().await.unwrap();

    let row = &CsvTableStore::new(&path).load().unwrap().rows[0];
    assert_eq!(row.home_rank, Some(1));
    assert_eq!(row.away_rank, Some(8));
}

#[tokio::test]
async fn test_dry_run_does_not_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_table(
        dir.path(),
        &["3,Sugar Bowl,2025-01-01,10,Notre Dame,Georgia,,,,,scheduled,,False,,,,New Orleans LA,ESPN,"],
    );
    let before = fs::read_to_string(&path).unwrap();

    let sync = SyncRunner::new(
        InMemoryProvider::new().with_season(2025, postseason_2024()),
        CsvTableStore::new(&path),
        Reconciler::default(),
        SyncSettings {
            dry_run: true,
            ..SyncSettings::default()
        },
    );
    let summary = sync.run().await.unwrap();
    assert!(summary.report.has_changes());
    assert!(!summary.saved);
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn test_missing_file_is_a_store_error() {
    let dir = tempfile::tempdir().unwrap();
    let sync = runner(
        InMemoryProvider::new(),
        &dir.path().join("absent.csv"),
        ReconcileOptions::default(),
        RankOverrides::default(),
    );
    assert!(matches!(sync.run().await, Err(StoreError::Io { .. })));
}
