use async_trait::async_trait;
use bincode::{deserialize_from, serialize_into};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use std::fs::File;
use std::path::PathBuf;

use crate::error::CalcError;
use crate::id::{self, CanonicalId};
use crate::metrics::{Metrics, RawMetricsEntry};
use crate::providers::{MetricsProvider, RawRecipe, RecipeProvider};

/// Default `MetricsProvider`: downloads the metrics blob when credentials are configured,
/// mirrors it atomically to a local cache file, and falls back to the cache on download failure
/// or missing credentials (§6/§7 — `UpstreamUnavailable` retains the prior cache). Grounded on
/// the teacher's `ensure_paginated_cache` in `request.rs`, which pairs `bincode` with `flate2`
/// for the on-disk form; generalized here to prefer-remote-fall-back-to-cache rather than
/// cache-or-fetch-once, since this provider is polled repeatedly by the scheduler.
pub struct CachedMetricsProvider {
    remote_url: Option<String>,
    cache_path: PathBuf,
    client: reqwest::Client,
}

impl CachedMetricsProvider {
    pub fn new(remote_url: Option<String>, cache_path: impl Into<PathBuf>) -> Self {
        CachedMetricsProvider {
            remote_url,
            cache_path: cache_path.into(),
            client: reqwest::Client::new(),
        }
    }

    fn read_cache(&self) -> Result<Metrics, CalcError> {
        let file = File::open(&self.cache_path)?;
        let stream = DeflateDecoder::new(file);
        let entries: Vec<RawMetricsEntry> = deserialize_from(stream)?;
        Ok(Metrics::from_raw(entries))
    }

    fn write_cache(&self, entries: &[RawMetricsEntry]) -> Result<(), CalcError> {
        // write to a temp file and rename so a crash mid-write never leaves a truncated cache.
        let tmp_path = self.cache_path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let stream = DeflateEncoder::new(file, Compression::default());
            serialize_into(stream, entries)?;
        }
        std::fs::rename(&tmp_path, &self.cache_path)?;
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Vec<RawMetricsEntry>, CalcError> {
        tracing::debug!(url, "downloading metrics blob");
        Ok(self.client.get(url).send().await?.json().await?)
    }
}

#[async_trait]
impl MetricsProvider for CachedMetricsProvider {
    async fn fetch(&self) -> Result<Metrics, CalcError> {
        let remote_url = match &self.remote_url {
            Some(url) => url,
            None => {
                tracing::warn!("no metrics credentials configured, falling back to local cache");
                return self.read_cache();
            }
        };

        match self.download(remote_url).await {
            Ok(entries) => {
                if let Err(e) = self.write_cache(&entries) {
                    tracing::warn!(error = %e, "failed to persist metrics cache");
                }
                Ok(Metrics::from_raw(entries))
            }
            Err(e) => {
                tracing::warn!(error = %e, "metrics download failed, retaining prior cache");
                self.read_cache()
            }
        }
    }
}

/// Default `RecipeProvider`: reads one file per item from a configured directory. Each file
/// holds up to 9 ingredient lines of the form `ITEM_ID` or `ITEM_ID:AMOUNT` plus an optional
/// `count=` line for the output units per craft (§6). Malformed lines are skipped with a
/// warning rather than failing the whole recipe (§4.5/§4.6: "malformed recipes degrade to no
/// usable content").
pub struct FileRecipeStore {
    directory: PathBuf,
}

impl FileRecipeStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        FileRecipeStore {
            directory: directory.into(),
        }
    }

    fn path_for(&self, id: &CanonicalId) -> PathBuf {
        self.directory.join(format!("{}.recipe", id.as_str()))
    }
}

impl RecipeProvider for FileRecipeStore {
    fn get(&self, id: &CanonicalId) -> Option<RawRecipe> {
        let path = self.path_for(id);
        let contents = std::fs::read_to_string(&path).ok()?;

        let mut ingredients = Vec::with_capacity(9);
        let mut count = 1.0;

        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(value) = line.strip_prefix("count=") {
                count = value.parse().unwrap_or(1.0);
                if count <= 0.0 {
                    count = 1.0;
                }
                continue;
            }

            if ingredients.len() >= 9 {
                tracing::warn!(recipe = %id, "ignoring ingredient cell past the 9-cell limit");
                continue;
            }

            match parse_ingredient_cell(line) {
                Some(ingredient) => ingredients.push(ingredient),
                None => tracing::warn!(
                    recipe = %id,
                    line = line_no,
                    cell = line,
                    "skipping malformed ingredient cell"
                ),
            }
        }

        Some(RawRecipe { ingredients, count })
    }
}

fn parse_ingredient_cell(cell: &str) -> Option<(String, f64)> {
    match cell.split_once(':') {
        Some((item_id, amount)) => {
            let amount: f64 = amount.parse().ok()?;
            if amount <= 0.0 || !amount.is_finite() {
                return None;
            }
            Some((id::canon(item_id).as_str().to_string(), amount))
        }
        None => Some((id::canon(cell).as_str().to_string(), 1.0)),
    }
}
