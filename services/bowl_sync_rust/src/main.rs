//! Bowl Sync CLI
//!
//! Keeps the curated bowl table (`games.csv`) in sync with
//! CollegeFootballData.com:
//! - `sync`: match provider ids, enrich teams/records/ranks/spreads, record results
//! - `match`: only assign provider ids
//! - `results`: only record winners for rows that already have an id
//! - `inspect`: summarize the local table
//! - `provider-games`: dump the provider's games for a season

mod config;
mod inspect;

use anyhow::{Context, Result};
use bowl_sync_core::providers::GameProvider;
use bowl_sync_core::{
    CfbdClient, CsvTableStore, InMemoryProvider, RankOverrides, ReconcileOptions, Reconciler,
    Season, SyncRunner, SyncSettings, TableStore,
};
use clap::{Parser, Subcommand};
use config::Config;
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bowl_sync", version, about = "Reconcile the bowl table against CFBD")]
struct Cli {
    /// Local table (defaults to GAMES_CSV_PATH or $DISK_DIR/games.csv)
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    /// Serve provider data from a JSON fixture instead of the API
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Compute and log changes without writing the table
    #[arg(long, global = true, default_value_t = false)]
    dry_run: bool,

    /// Re-match rows that already have a trusted provider id
    #[arg(long, global = true, default_value_t = false)]
    force_rematch: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Match, enrich and record results in one run
    Sync,
    /// Assign provider game ids only
    Match,
    /// Record winners and final scores for already-matched rows
    Results,
    /// Print the local table with match status
    Inspect,
    /// Print the provider's games for a season as JSON
    ProviderGames {
        #[arg(long)]
        season: Season,
    },
}

impl Commands {
    fn options(&self, config: &Config, force_rematch: bool) -> ReconcileOptions {
        let base = ReconcileOptions {
            force_rematch,
            fuzzy_threshold: config.fuzzy_threshold,
            spread_providers: config.spread_providers.clone(),
            ..ReconcileOptions::default()
        };
        match self {
            Commands::Match => ReconcileOptions {
                enrich: false,
                results: false,
                ..base
            },
            Commands::Results => ReconcileOptions {
                match_ids: false,
                enrich: false,
                ..base
            },
            _ => base,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let csv_path = cli.csv.clone().unwrap_or_else(|| config.games_csv_path.clone());

    match &cli.fixture {
        Some(path) => {
            let provider = InMemoryProvider::from_json_file(path)
                .with_context(|| format!("Failed to load fixture {}", path.display()))?;
            dispatch(&cli, &config, provider, csv_path).await
        }
        None => {
            if config.cfbd_api_key.is_none() {
                warn!("CFBD_API_KEY is not set; requests go out unauthenticated");
            }
            dispatch(&cli, &config, CfbdClient::new(config.cfbd_config()), csv_path).await
        }
    }
}

async fn dispatch<P: GameProvider>(cli: &Cli, config: &Config, provider: P, csv_path: PathBuf) -> Result<()> {
    let store = CsvTableStore::new(csv_path);

    match &cli.command {
        Commands::Inspect => {
            let table = store.load()?;
            inspect::print_table(&table);
            Ok(())
        }
        Commands::ProviderGames { season } => {
            let games = provider
                .fetch_games(*season, config.season_type)
                .await
                .with_context(|| format!("Failed to fetch {} games for {}", provider.provider_name(), season))?;
            println!("{}", serde_json::to_string_pretty(&games)?);
            Ok(())
        }
        command => {
            let overrides = match &config.rank_overrides_path {
                Some(path) => RankOverrides::load(path)?,
                None => RankOverrides::default(),
            };
            info!("Loaded {} rank overrides", overrides.len());

            let reconciler = Reconciler::new(command.options(config, cli.force_rematch), overrides);
            let settings = SyncSettings {
                season_type: config.season_type,
                ranking_poll: config.ranking_poll.clone(),
                dry_run: cli.dry_run,
            };

            let summary = SyncRunner::new(provider, store, reconciler, settings).run().await?;
            info!(
                "Done: {} rows changed across {:?}{}",
                summary.report.updated_rows,
                summary.seasons,
                if summary.saved { "" } else { " (not saved)" }
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["bowl_sync", "sync", "--dry-run", "--csv", "games.csv"]).unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.csv, Some(PathBuf::from("games.csv")));
        assert!(matches!(cli.command, Commands::Sync));

        let cli = Cli::try_parse_from(["bowl_sync", "provider-games", "--season", "2024"]).unwrap();
        assert!(matches!(cli.command, Commands::ProviderGames { season: 2024 }));
    }

    #[test]
    fn test_pass_selection() {
        let config = Config::from_env();

        let results = Commands::Results.options(&config, false);
        assert!(!results.match_ids && !results.enrich && results.results);

        let matching = Commands::Match.options(&config, true);
        assert!(matching.match_ids && matching.force_rematch && !matching.enrich && !matching.results);

        let sync = Commands::Sync.options(&config, false);
        assert!(sync.match_ids && sync.enrich && sync.results);
    }
}
