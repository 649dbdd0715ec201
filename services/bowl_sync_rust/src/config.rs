//! Environment configuration for the bowl sync CLI
//!
//! Every setting has a default so a bare `bowl_sync sync` works against the
//! public API with `./storage/games.csv`. Command-line flags override these.

use bowl_sync_core::circuit_breaker::CircuitBreakerConfig;
use bowl_sync_core::clients::cfbd::DEFAULT_BASE_URL;
use bowl_sync_core::matching::DEFAULT_FUZZY_THRESHOLD;
use bowl_sync_core::reconcile::DEFAULT_SPREAD_PROVIDERS;
use bowl_sync_core::{CfbdConfig, SeasonType};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DISK_DIR: &str = "./storage";
pub const DEFAULT_RANKING_POLL: &str = "College Football Playoff Rankings";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub cfbd_api_key: Option<String>,
    pub cfbd_base_url: String,
    pub cfbd_timeout: Duration,
    pub circuit_breaker: CircuitBreakerConfig,
    pub games_csv_path: PathBuf,
    pub rank_overrides_path: Option<PathBuf>,
    pub ranking_poll: String,
    pub spread_providers: Vec<String>,
    pub fuzzy_threshold: f64,
    pub season_type: SeasonType,
}

impl Config {
    pub fn from_env() -> Self {
        let disk_dir = env::var("DISK_DIR").unwrap_or_else(|_| DEFAULT_DISK_DIR.to_string());
        let games_csv_path = env::var("GAMES_CSV_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(disk_dir).join("games.csv"));

        Self {
            cfbd_api_key: env::var("CFBD_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            cfbd_base_url: env::var("CFBD_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            cfbd_timeout: Duration::from_secs(parse_var("CFBD_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)),
            circuit_breaker: load_circuit_breaker_config(),
            games_csv_path,
            rank_overrides_path: env::var("RANK_OVERRIDES_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            ranking_poll: env::var("RANKING_POLL").unwrap_or_else(|_| DEFAULT_RANKING_POLL.to_string()),
            spread_providers: env::var("SPREAD_PROVIDERS")
                .map(|v| split_list(&v))
                .unwrap_or_else(|_| DEFAULT_SPREAD_PROVIDERS.iter().map(|p| p.to_string()).collect()),
            fuzzy_threshold: parse_var("FUZZY_THRESHOLD", DEFAULT_FUZZY_THRESHOLD).clamp(0.0, 1.0),
            season_type: parse_var("SEASON_TYPE", SeasonType::Postseason),
        }
    }

    pub fn cfbd_config(&self) -> CfbdConfig {
        CfbdConfig {
            base_url: self.cfbd_base_url.clone(),
            api_key: self.cfbd_api_key.clone(),
            timeout: self.cfbd_timeout,
            circuit_breaker: self.circuit_breaker.clone(),
        }
    }
}

/// Load the CFBD circuit breaker configuration from environment
fn load_circuit_breaker_config() -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold: parse_var("CFBD_CB_FAILURE_THRESHOLD", 5),
        recovery_timeout: Duration::from_secs(parse_var("CFBD_CB_RECOVERY_TIMEOUT_SECS", 30)),
        success_threshold: 2,
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
