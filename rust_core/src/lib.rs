//! Bowl Sync Core
//!
//! Reconciles a hand-curated table of bowl games against the
//! CollegeFootballData.com API: assigns provider game ids, then keeps teams,
//! records, ranks, kickoff times, spreads and final results in sync.
//!
//! # Modules
//!
//! - `utils::matching`: name normalization and similarity scoring
//! - `matching`: tiered candidate matcher
//! - `reconcile`: reconciliation driver and rank overrides
//! - `providers` / `clients`: provider trait and the CFBD client
//! - `store`: CSV table persistence
//! - `sync`: a full fetch-reconcile-save run

pub mod circuit_breaker;
pub mod clients;
pub mod error;
pub mod matching;
pub mod models;
pub mod providers;
pub mod reconcile;
pub mod store;
pub mod sync;
pub mod utils;

pub use clients::{CfbdClient, CfbdConfig};
pub use error::{OverrideError, ProviderError, StoreError};
pub use matching::{CandidateMatcher, MatchOutcome};
pub use models::{BettingLine, LocalGameRecord, MatchTier, ProviderGameId, ProviderGameRecord, Season};
pub use providers::{GameProvider, InMemoryProvider, SeasonType};
pub use reconcile::{apply_result, ReconcileOptions, ReconcileReport, Reconciler, RankOverrides, SeasonData};
pub use store::{CsvTableStore, GameTable, TableStore};
pub use sync::{SyncRunner, SyncSettings, SyncSummary};
