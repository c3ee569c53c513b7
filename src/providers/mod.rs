pub mod file_cache;
pub mod http;

use async_trait::async_trait;

use crate::error::CalcError;
use crate::id::CanonicalId;
use crate::metrics::Metrics;
use crate::price::PriceSnapshot;

pub use file_cache::{CachedMetricsProvider, FileRecipeStore};
pub use http::HttpPriceProvider;

/// A recipe as it comes off disk: up to 9 ingredient cells (canonical id, quantity-per-craft)
/// plus the output units produced per craft (§6).
#[derive(Debug, Clone, Default)]
pub struct RawRecipe {
    pub ingredients: Vec<(String, f64)>,
    pub count: f64,
}

/// Out-of-scope collaborator: the upstream price-feed HTTP client. This crate only needs a
/// `PriceSnapshot` out of it.
#[async_trait]
pub trait PriceSnapshotProvider: Send + Sync {
    async fn fetch(&self) -> Result<PriceSnapshot, CalcError>;
}

/// Out-of-scope collaborator: the remote-storage metrics downloader. This crate only needs a
/// `Metrics` map out of it.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn fetch(&self) -> Result<Metrics, CalcError>;
}

/// Out-of-scope collaborator: the on-disk recipe file format. Synchronous — recipe files are
/// read-only and small, and `RecipeStore` caches lookups above this trait.
pub trait RecipeProvider: Send + Sync {
    fn get(&self, id: &CanonicalId) -> Option<RawRecipe>;
}
