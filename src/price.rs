use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::id::{self, CanonicalId};

/// A single rung of an order-book summary, as published by the price feed.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct OrderSummaryEntry {
    #[serde(rename = "pricePerUnit")]
    pub price_per_unit: f64,
    pub amount: u64,
    pub orders: u32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct QuickStatus {
    #[serde(rename = "buyPrice", default)]
    pub buy_price: f64,
    #[serde(rename = "sellPrice", default)]
    pub sell_price: f64,
    #[serde(rename = "buyMovingWeek", default)]
    pub buy_moving_week: f64,
    #[serde(rename = "sellMovingWeek", default)]
    pub sell_moving_week: f64,
}

/// Per-item price document as it arrives on the wire: sell offers ascending by price (the best
/// ask first), buy orders descending by price (the best bid first), plus the rolling 7-day
/// volume scalar used by the insta-sell fill-time estimate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductPrice {
    pub product_id: String,
    #[serde(default)]
    pub sell_summary: Vec<OrderSummaryEntry>,
    #[serde(default)]
    pub buy_summary: Vec<OrderSummaryEntry>,
    #[serde(default)]
    pub quick_status: QuickStatus,
}

/// Top-level document shape fetched from the upstream price feed. `success` and `last_updated`
/// gate whether the document is usable at all (§6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPriceSnapshot {
    pub success: bool,
    #[serde(rename = "lastUpdated")]
    pub last_updated: i64,
    pub products: HashMap<String, ProductPrice>,
}

/// Canonical-id-keyed price snapshot. Read-only once loaded; lifetime is one optimization pass.
#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    pub last_updated_epoch_millis: i64,
    products: HashMap<CanonicalId, ProductPrice>,
}

impl PriceSnapshot {
    /// Accepts a raw snapshot only when the feed marked it usable; `success = false` means the
    /// feed itself flagged the document as stale/bad, so there is nothing to canonicalize.
    pub fn from_raw(raw: RawPriceSnapshot) -> Option<Self> {
        if !raw.success {
            return None;
        }

        let mut products = HashMap::with_capacity(raw.products.len());
        for (product_id, price) in raw.products {
            products.insert(id::canon(&product_id), price);
        }

        Some(PriceSnapshot {
            last_updated_epoch_millis: raw.last_updated,
            products,
        })
    }

    /// The full universe of item ids the feed reported this pass, in no particular order.
    /// The batch entry points use this as the default item list when none is configured.
    pub fn item_ids(&self) -> Vec<CanonicalId> {
        self.products.keys().cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn mock(entries: Vec<(&str, ProductPrice)>) -> Self {
        let mut products = HashMap::with_capacity(entries.len());
        for (item_id, price) in entries {
            products.insert(id::canon(item_id), price);
        }
        PriceSnapshot {
            last_updated_epoch_millis: 0,
            products,
        }
    }
}

/// Pure, read-only lookup over a `PriceSnapshot`. Always canonicalizes the key before probing.
pub struct PriceView<'a> {
    snapshot: &'a PriceSnapshot,
}

impl<'a> PriceView<'a> {
    pub fn new(snapshot: &'a PriceSnapshot) -> Self {
        PriceView { snapshot }
    }

    pub fn get(&self, item_id: &str) -> Option<&ProductPrice> {
        self.snapshot.products.get(&id::canon(item_id))
    }

    /// Best resting buy-order price to place a new buy order under — the top of the buy side.
    /// Returns 0 when missing, non-positive, or non-finite.
    pub fn sell_price(&self, item_id: &str) -> f64 {
        self.get(item_id)
            .map(|p| p.quick_status.sell_price)
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(0.0)
    }

    /// Best resting sell-offer price to insta-buy at — the top of the sell side.
    /// Returns 0 when missing, non-positive, or non-finite.
    pub fn buy_price(&self, item_id: &str) -> f64 {
        self.get(item_id)
            .map(|p| p.quick_status.buy_price)
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(0.0)
    }

    pub fn buy_moving_week(&self, item_id: &str) -> f64 {
        self.get(item_id)
            .map(|p| p.quick_status.buy_moving_week)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0)
    }
}
