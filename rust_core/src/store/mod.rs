//! Persistence for the local bowl table.

use crate::error::StoreError;
use crate::models::LocalGameRecord;

pub mod csv;

pub use self::csv::CsvTableStore;

pub const GAME_ID: &str = "game_id";
pub const BOWL_NAME: &str = "bowl_name";
pub const KICKOFF: &str = "kickoff_datetime";
pub const POINT_VALUE: &str = "point_value";
pub const AWAY_TEAM: &str = "away_team";
pub const HOME_TEAM: &str = "home_team";
pub const AWAY_RECORD: &str = "away_record";
pub const HOME_RECORD: &str = "home_record";
pub const AWAY_RANK: &str = "away_rank";
pub const HOME_RANK: &str = "home_rank";
pub const STATUS: &str = "status";
pub const WINNER: &str = "winner";
pub const COMPLETED: &str = "completed";
pub const AWAY_SCORE: &str = "away_score";
pub const HOME_SCORE: &str = "home_score";
pub const PROVIDER_GAME_ID: &str = "cfbd_game_id";
pub const MATCH_TIER: &str = "match_tier";
pub const SPREAD: &str = "spread";

/// Columns a table must have to be loaded at all.
pub const REQUIRED_COLUMNS: &[&str] = &[GAME_ID, BOWL_NAME, KICKOFF, HOME_TEAM, AWAY_TEAM];

/// Every interpreted column, in the order appended when missing.
pub const KNOWN_COLUMNS: &[&str] = &[
    GAME_ID,
    BOWL_NAME,
    KICKOFF,
    POINT_VALUE,
    AWAY_TEAM,
    HOME_TEAM,
    AWAY_RECORD,
    HOME_RECORD,
    AWAY_RANK,
    HOME_RANK,
    STATUS,
    WINNER,
    COMPLETED,
    AWAY_SCORE,
    HOME_SCORE,
    PROVIDER_GAME_ID,
    MATCH_TIER,
    SPREAD,
];

/// Rows plus the column order they are written back in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameTable {
    pub columns: Vec<String>,
    pub rows: Vec<LocalGameRecord>,
}

impl GameTable {
    pub fn new(rows: Vec<LocalGameRecord>) -> Self {
        let mut table = Self {
            columns: Vec::new(),
            rows,
        };
        table.ensure_known_columns();
        table
    }

    /// Append any interpreted column the table is missing. Existing order is
    /// kept.
    pub fn ensure_known_columns(&mut self) {
        for column in KNOWN_COLUMNS {
            if !self.columns.iter().any(|c| c == column) {
                self.columns.push(column.to_string());
            }
        }
    }
}

/// Load/save seam for the local table.
pub trait TableStore {
    fn load(&self) -> Result<GameTable, StoreError>;

    /// Persist the whole table in one write.
    fn save(&self, table: &GameTable) -> Result<(), StoreError>;

    /// Human-readable location for logs
    fn location(&self) -> String;
}
