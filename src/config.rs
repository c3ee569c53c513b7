//! Process-wide configuration: environment-driven defaults plus CLI overrides for the one-shot
//! mode. Mirrors the teacher's `lazy_static! { pub static ref CONFIG: Config = Config::new(); }`
//! pattern, switched to `once_cell::sync::Lazy` and reading `std::env::var` instead of only
//! `StructOpt`, since this crate is a long-running service as well as a CLI tool.

use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::Deserialize;
use structopt::StructOpt;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

/// Optional TOML config file, mirroring the teacher's `ConfigFile`/`get_file_config` (§6's
/// "documented names are examples" — env vars win; this file is a convenience layer below them).
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    items_per_chunk: Option<usize>,
    pause_ms_between_chunks: Option<u64>,
    max_cycle_time_seconds: Option<u64>,
    max_search_qty: Option<u32>,
    metrics_remote_url: Option<String>,
    recipe_directory: Option<PathBuf>,
}

/// Reads and parses a TOML config file if one was given, using `serde_path_to_error` so a
/// malformed file names the offending field rather than a bare "invalid type" message.
fn read_config_file(path: &Option<PathBuf>) -> ConfigFile {
    let path = match path {
        Some(path) => path,
        None => return ConfigFile::default(),
    };

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read config file");
            return ConfigFile::default();
        }
    };

    let deserializer = toml::Deserializer::new(&contents);
    match serde_path_to_error::deserialize(deserializer) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse config file");
            ConfigFile::default()
        }
    }
}

fn env_duration_ms(key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_or(key, default_ms))
}

fn env_duration_secs(key: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_or(key, default_secs))
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Items processed per chunk during a batch pass; `ITEMS_PER_CHUNK`, default 50.
    pub items_per_chunk: usize,
    /// Pause between chunks, pure throttling; `PAUSE_MS_BETWEEN_CHUNKS`, default 500ms.
    pub pause_between_chunks: Duration,
    /// Recorded but not bound — the HTTP presentation layer is out of scope for this crate;
    /// `PORT`, default 9000.
    pub port: u16,
    /// Upper bound on acqTime + saleTime an Optimizer candidate may spend.
    pub max_cycle_time: Duration,
    /// Upper bound `Qmax` for the Optimizer's binary search.
    pub max_search_qty: u32,
    /// How often the metrics provider is polled in service mode.
    pub metrics_refresh_interval: Duration,
    /// How often a full optimization pass runs in service mode.
    pub optimization_interval: Duration,
    /// Optional remote metrics credentials; absence triggers local-cache-only fallback (§6).
    pub metrics_remote_url: Option<String>,
    pub recipe_directory: PathBuf,
    pub metrics_cache_file: PathBuf,
    pub price_snapshot_url: String,
}

impl Config {
    fn from_env() -> Self {
        Self::from_env_and_file(&None)
    }

    /// Precedence is env var > config file > built-in default, matching the teacher's
    /// `Opt` > `ConfigFile` > `Config::default()` layering in the old `config.rs`.
    pub fn from_env_and_file(config_file_path: &Option<PathBuf>) -> Self {
        let file = read_config_file(config_file_path);
        let base_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bazaar-arbitrage");

        Config {
            items_per_chunk: std::env::var("ITEMS_PER_CHUNK")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(file.items_per_chunk)
                .unwrap_or(50),
            pause_between_chunks: std::env::var("PAUSE_MS_BETWEEN_CHUNKS")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(file.pause_ms_between_chunks)
                .map(Duration::from_millis)
                .unwrap_or_else(|| Duration::from_millis(500)),
            port: env_or("PORT", 9000u16),
            max_cycle_time: std::env::var("MAX_CYCLE_TIME_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(file.max_cycle_time_seconds)
                .map(Duration::from_secs)
                .unwrap_or_else(|| Duration::from_secs(3600)),
            max_search_qty: std::env::var("MAX_SEARCH_QTY")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(file.max_search_qty)
                .unwrap_or(71_680),
            metrics_refresh_interval: env_duration_secs("METRICS_REFRESH_INTERVAL_SECONDS", 3600),
            optimization_interval: env_duration_secs("OPTIMIZATION_INTERVAL_SECONDS", 300),
            metrics_remote_url: std::env::var("METRICS_REMOTE_URL")
                .ok()
                .or(file.metrics_remote_url),
            recipe_directory: std::env::var("RECIPE_DIRECTORY")
                .map(PathBuf::from)
                .ok()
                .or(file.recipe_directory)
                .unwrap_or_else(|| base_dir.join("recipes")),
            metrics_cache_file: std::env::var("METRICS_CACHE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| base_dir.join("metrics.cache")),
            price_snapshot_url: std::env::var("PRICE_SNAPSHOT_URL")
                .unwrap_or_else(|_| "https://api.hypixel.net/skyblock/bazaar".to_string()),
        }
    }

    /// Fixed, env-independent configuration for unit/integration tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            items_per_chunk: 10,
            pause_between_chunks: Duration::from_millis(0),
            port: 9000,
            max_cycle_time: Duration::from_secs(3600),
            max_search_qty: 1000,
            metrics_refresh_interval: Duration::from_secs(3600),
            optimization_interval: Duration::from_secs(300),
            metrics_remote_url: None,
            recipe_directory: PathBuf::from("/tmp/bazaar-arbitrage-tests/recipes"),
            metrics_cache_file: PathBuf::from("/tmp/bazaar-arbitrage-tests/metrics.cache"),
            price_snapshot_url: "http://localhost/unused".to_string(),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

/// CLI surface for one-shot local runs, mirroring the teacher's `structopt`-derived `Opt`.
#[derive(Debug, StructOpt)]
#[structopt(name = "bazaar-arbitrage")]
pub struct Opt {
    /// Evaluate a single item instead of running a full batch pass.
    #[structopt(long)]
    pub item_id: Option<String>,

    /// Quantity to evaluate in one-shot mode; defaults to the Optimizer's own search.
    #[structopt(long)]
    pub count: Option<u32>,

    #[structopt(long, parse(from_os_str))]
    pub output_csv: Option<PathBuf>,

    #[structopt(long)]
    pub max_cycle_time: Option<u64>,

    #[structopt(long, parse(from_os_str))]
    pub config_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values_when_env_unset() {
        std::env::remove_var("ITEMS_PER_CHUNK");
        std::env::remove_var("PAUSE_MS_BETWEEN_CHUNKS");
        std::env::remove_var("PORT");
        let config = Config::from_env();
        assert_eq!(config.items_per_chunk, 50);
        assert_eq!(config.pause_between_chunks, Duration::from_millis(500));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn env_vars_override_defaults() {
        std::env::set_var("ITEMS_PER_CHUNK", "7");
        let config = Config::from_env();
        assert_eq!(config.items_per_chunk, 7);
        std::env::remove_var("ITEMS_PER_CHUNK");
    }
}
