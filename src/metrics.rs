use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::id::{self, CanonicalId};

/// Flow-rate statistics derived from historical order flow for a single item. All fields are
/// non-negative.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct ProductMetrics {
    pub sell_size: f64,
    pub sell_frequency: f64,
    pub order_size: f64,
    pub order_frequency: f64,
}

/// Wire shape of a single entry in the metrics blob (§6): `{product_id, sell_size,
/// sell_frequency, order_size_average, order_frequency_average}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMetricsEntry {
    pub product_id: String,
    pub sell_size: f64,
    pub sell_frequency: f64,
    pub order_size_average: f64,
    pub order_frequency_average: f64,
}

/// Canonical-id-keyed metrics map. Read-only; lifetime is until the next download.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    by_id: HashMap<CanonicalId, ProductMetrics>,
}

impl Metrics {
    pub fn from_raw(entries: Vec<RawMetricsEntry>) -> Self {
        let mut by_id = HashMap::with_capacity(entries.len());
        for entry in entries {
            let canonical = id::canon(&entry.product_id);
            if by_id.contains_key(&canonical) {
                tracing::warn!(item = %canonical, "duplicate metrics entry, last wins");
            }
            by_id.insert(
                canonical,
                ProductMetrics {
                    sell_size: entry.sell_size,
                    sell_frequency: entry.sell_frequency,
                    order_size: entry.order_size_average,
                    order_frequency: entry.order_frequency_average,
                },
            );
        }
        Metrics { by_id }
    }

    #[cfg(test)]
    pub(crate) fn mock(entries: Vec<(&str, ProductMetrics)>) -> Self {
        let mut by_id = HashMap::with_capacity(entries.len());
        for (item_id, metrics) in entries {
            by_id.insert(id::canon(item_id), metrics);
        }
        Metrics { by_id }
    }
}

/// Pure, read-only lookup over a `Metrics` map. Always canonicalizes the key before probing.
pub struct MetricsView<'a> {
    metrics: &'a Metrics,
}

impl<'a> MetricsView<'a> {
    pub fn new(metrics: &'a Metrics) -> Self {
        MetricsView { metrics }
    }

    pub fn get(&self, item_id: &str) -> Option<&ProductMetrics> {
        self.metrics.by_id.get(&id::canon(item_id))
    }
}
