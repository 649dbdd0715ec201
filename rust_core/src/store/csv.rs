//! CSV-backed table store.
//!
//! The file is hand-edited, so loading is lenient about number spellings
//! ("12.0"), boolean spellings and extra columns. Saving writes a sibling
//! temp file and renames it over the original.

use super::*;
use crate::models::{MatchTier, ProviderGameId};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct CsvTableStore {
    path: PathBuf,
}

impl CsvTableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_err(&self, source: ::csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    /// Parse a table from any reader. `path` is only used in errors.
    pub fn read_table<R: Read>(&self, reader: R) -> Result<GameTable, StoreError> {
        let mut reader = ::csv::ReaderBuilder::new().trim(::csv::Trim::None).from_reader(reader);
        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| self.csv_err(e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        for required in REQUIRED_COLUMNS {
            if !columns.iter().any(|c| c == required) {
                return Err(StoreError::MissingColumn {
                    path: self.path.clone(),
                    column: required.to_string(),
                });
            }
        }

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| self.csv_err(e))?;
            let cells: HashMap<&str, &str> = columns
                .iter()
                .map(String::as_str)
                .zip(record.iter())
                .collect();
            // header is line 1
            rows.push(parse_row(&cells, idx + 2)?);
        }

        let mut table = GameTable { columns, rows };
        table.ensure_known_columns();
        Ok(table)
    }

    /// Serialize a table to any writer, in `table.columns` order.
    pub fn write_table<W: Write>(&self, table: &GameTable, writer: W) -> Result<(), StoreError> {
        let mut writer = ::csv::Writer::from_writer(writer);
        writer.write_record(&table.columns).map_err(|e| self.csv_err(e))?;
        for row in &table.rows {
            let cells: Vec<String> = table.columns.iter().map(|c| format_cell(row, c)).collect();
            writer.write_record(&cells).map_err(|e| self.csv_err(e))?;
        }
        writer.flush().map_err(|e| self.io_err(e))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl TableStore for CsvTableStore {
    fn load(&self) -> Result<GameTable, StoreError> {
        let file = File::open(&self.path).map_err(|e| self.io_err(e))?;
        let table = self.read_table(file)?;
        info!("Loaded {} rows from {}", table.rows.len(), self.path.display());
        Ok(table)
    }

    fn save(&self, table: &GameTable) -> Result<(), StoreError> {
        let tmp = self.temp_path();
        let file = File::create(&tmp).map_err(|e| self.io_err(e))?;
        if let Err(e) = self.write_table(table, file) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        info!("Saved {} rows to {}", table.rows.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

fn parse_row(cells: &HashMap<&str, &str>, line: usize) -> Result<LocalGameRecord, StoreError> {
    let text = |column: &str| cells.get(column).map(|v| v.trim().to_string()).unwrap_or_default();
    let optional = |column: &str| Some(text(column)).filter(|v| !v.is_empty());
    let invalid = |column: &str| StoreError::InvalidField {
        line,
        column: column.to_string(),
        value: text(column),
    };
    let number = |column: &str| -> Result<Option<u32>, StoreError> {
        match optional(column) {
            None => Ok(None),
            Some(v) => parse_count(&v).map(Some).ok_or_else(|| invalid(column)),
        }
    };

    let spread = match optional(SPREAD) {
        None => None,
        Some(v) => Some(v.parse::<f64>().map_err(|_| invalid(SPREAD))?),
    };
    let completed = match optional(COMPLETED) {
        None => false,
        Some(v) => parse_bool(&v).ok_or_else(|| invalid(COMPLETED))?,
    };
    let match_tier = match optional(MATCH_TIER) {
        None => None,
        Some(v) => Some(v.parse::<MatchTier>().map_err(|_| invalid(MATCH_TIER))?),
    };

    let extra = cells
        .iter()
        .filter(|(column, _)| !KNOWN_COLUMNS.contains(*column))
        .map(|(column, value)| (column.to_string(), value.to_string()))
        .collect();

    Ok(LocalGameRecord {
        game_id: text(GAME_ID),
        bowl_name: text(BOWL_NAME),
        kickoff_datetime: text(KICKOFF),
        home_team: text(HOME_TEAM),
        away_team: text(AWAY_TEAM),
        point_value: number(POINT_VALUE)?,
        provider_game_id: optional(PROVIDER_GAME_ID).and_then(|v| ProviderGameId::parse(&v)),
        match_tier,
        home_record: optional(HOME_RECORD),
        away_record: optional(AWAY_RECORD),
        home_rank: number(HOME_RANK)?,
        away_rank: number(AWAY_RANK)?,
        spread,
        status: text(STATUS),
        winner: optional(WINNER),
        completed,
        home_score: number(HOME_SCORE)?,
        away_score: number(AWAY_SCORE)?,
        extra,
    })
}

/// Non-negative integer, tolerating a zero fraction ("12.0").
fn parse_count(value: &str) -> Option<u32> {
    let whole = match value.split_once('.') {
        Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole,
        Some(_) => return None,
        None => value,
    };
    whole.parse().ok()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "1.0" => Some(true),
        "false" | "0" | "no" | "n" | "0.0" => Some(false),
        _ => None,
    }
}

fn format_cell(row: &LocalGameRecord, column: &str) -> String {
    fn opt<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(T::to_string).unwrap_or_default()
    }

    match column {
        GAME_ID => row.game_id.clone(),
        BOWL_NAME => row.bowl_name.clone(),
        KICKOFF => row.kickoff_datetime.clone(),
        POINT_VALUE => opt(&row.point_value),
        AWAY_TEAM => row.away_team.clone(),
        HOME_TEAM => row.home_team.clone(),
        AWAY_RECORD => opt(&row.away_record),
        HOME_RECORD => opt(&row.home_record),
        AWAY_RANK => opt(&row.away_rank),
        HOME_RANK => opt(&row.home_rank),
        STATUS => row.status.clone(),
        WINNER => opt(&row.winner),
        COMPLETED => (if row.completed { "True" } else { "False" }).to_string(),
        AWAY_SCORE => opt(&row.away_score),
        HOME_SCORE => opt(&row.home_score),
        PROVIDER_GAME_ID => opt(&row.provider_game_id),
        MATCH_TIER => opt(&row.match_tier),
        SPREAD => opt(&row.spread),
        other => row.extra.get(other).cloned().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
game_id,bowl_name,kickoff_datetime,point_value,away_team,home_team,notes,cfbd_game_id,completed,home_rank,spread
1,Gator Bowl,2025-01-02,5.0,TBD,TBD,pick early,,False,,
2,Rose Bowl,2025-01-01 17:00,10,Oregon,Ohio State,,401677180.0,true,8.0,-2.5
";

    fn store() -> CsvTableStore {
        CsvTableStore::new("games.csv")
    }

    #[test]
    fn test_read_tolerates_spreadsheet_spellings() {
        let table = store().read_table(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 2);

        let gator = &table.rows[0];
        assert_eq!(gator.point_value, Some(5));
        assert_eq!(gator.provider_game_id, None);
        assert!(!gator.completed);
        assert_eq!(gator.extra.get("notes").map(String::as_str), Some("pick early"));

        let rose = &table.rows[1];
        assert_eq!(rose.provider_game_id, Some(ProviderGameId::new("401677180")));
        assert_eq!(rose.home_rank, Some(8));
        assert_eq!(rose.spread, Some(-2.5));
        assert!(rose.completed);
    }

    #[test]
    fn test_missing_known_columns_are_appended() {
        let table = store().read_table(SAMPLE.as_bytes()).unwrap();
        assert_eq!(&table.columns[..7], &[
            "game_id", "bowl_name", "kickoff_datetime", "point_value", "away_team", "home_team", "notes"
        ]);
        assert!(table.columns.iter().any(|c| c == MATCH_TIER));
        assert!(table.columns.iter().any(|c| c == WINNER));
    }

    #[test]
    fn test_missing_required_column() {
        let err = store().read_table("game_id,bowl_name\n1,Rose Bowl\n".as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::MissingColumn { ref column, .. } if column == "kickoff_datetime"));
    }

    #[test]
    fn test_invalid_field_reports_line() {
        let csv = "game_id,bowl_name,kickoff_datetime,home_team,away_team,home_score\n\
                   1,Rose Bowl,2025-01-01,A,B,\n\
                   2,Sugar Bowl,2025-01-01,A,B,lots\n";
        match store().read_table(csv.as_bytes()) {
            Err(StoreError::InvalidField { line, column, value }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "home_score");
                assert_eq!(value, "lots");
            }
            other => panic!("expected invalid field, got {:?}", other),
        }
    }

    #[test]
    fn test_save_preserves_order_and_unknown_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.csv");
        fs::write(&path, SAMPLE).unwrap();
        let store = CsvTableStore::new(&path);

        let mut table = store.load().unwrap();
        table.rows[0].winner = Some("ole miss".to_string());
        table.rows[0].match_tier = Some(MatchTier::Label);
        store.save(&table).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, table);
        assert!(!dir.path().join("games.csv.tmp").exists());

        let text = fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("game_id,bowl_name,kickoff_datetime,point_value,away_team,home_team,notes,"));
        assert!(text.contains("pick early"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvTableStore::new(dir.path().join("absent.csv"));
        assert!(matches!(store.load(), Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count("12.0"), Some(12));
        assert_eq!(parse_count("12.5"), None);
        assert_eq!(parse_count("-1"), None);
    }
}
