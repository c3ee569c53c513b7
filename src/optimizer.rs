//! Optimizer — binary-searches the largest feasible batch size under a cycle-time budget, scores
//! profit, and ranks items. Grounded on `profit.rs`'s `profitable_item_list`
//! (`rayon::par_iter` + `filter_map` + `sort_unstable_by_key`) and `calculate_crafting_profit`'s
//! per-item evaluation loop, generalized from "craft one unit at a time until unprofitable" to a
//! binary search over a time budget.

use std::cmp::Ordering;
use std::time::Duration;

use rayon::prelude::*;

use crate::id::{self, CanonicalId};
use crate::metrics::MetricsView;
use crate::perspective::{self, TopAction};
use crate::price::PriceView;
use crate::recipe::RecipeStore;

const MAX_BINARY_SEARCH_ITERATIONS: u32 = 50;

#[derive(Debug, Clone)]
pub struct OptimizerRecord {
    pub item: CanonicalId,
    pub max_feasible_qty: u32,
    pub cost_at_opt: f64,
    pub revenue_at_opt: f64,
    pub max_profit: f64,
    pub acq_time: f64,
    pub sale_time: f64,
    pub total_cycle_time: f64,
    pub bottleneck: Option<CanonicalId>,
    pub calc_possible: bool,
    pub error_message: Option<String>,
}

/// `acqTime(Q) + saleTime(Q) <= maxCycleTime`, treating NaN as +∞, per §4.9.
fn feasible(
    item: &str,
    qty: u32,
    max_cycle_time: Duration,
    price_view: &PriceView,
    metrics_view: &MetricsView,
    recipe_store: &RecipeStore,
) -> bool {
    if qty == 0 {
        return true;
    }
    let result = perspective::primary_based(item, qty as f64, price_view, metrics_view, recipe_store);
    let insta_sell = perspective::insta_sell_time(item, qty as f64, price_view);

    let acq_time = if result.slowest_fill_time.is_nan() {
        f64::INFINITY
    } else {
        result.slowest_fill_time
    };
    let sale_time = if insta_sell.seconds.is_nan() {
        f64::INFINITY
    } else {
        insta_sell.seconds
    };

    acq_time + sale_time <= max_cycle_time.as_secs_f64()
}

/// Finds `Q* in {0, ..., qty_max}` maximizing feasible quantity via integer binary search,
/// bounded to ≤50 iterations. `bestQty` is the largest feasible quantity tried; 0 if none is
/// feasible.
fn search_best_qty(
    item: &str,
    qty_max: u32,
    max_cycle_time: Duration,
    price_view: &PriceView,
    metrics_view: &MetricsView,
    recipe_store: &RecipeStore,
) -> u32 {
    if qty_max == 0 {
        return 0;
    }

    let mut low = 1u32;
    let mut high = qty_max;
    let mut best = 0u32;

    for _ in 0..MAX_BINARY_SEARCH_ITERATIONS {
        if low > high {
            break;
        }
        let mid = low + (high - low) / 2;
        if feasible(item, mid, max_cycle_time, price_view, metrics_view, recipe_store) {
            best = mid;
            low = mid + 1;
        } else {
            if mid == 0 {
                break;
            }
            high = mid - 1;
        }
    }

    best
}

/// Runs the optimizer for a single item against the given budget.
pub fn optimize_item(
    item: &str,
    qty_max: u32,
    max_cycle_time: Duration,
    price_view: &PriceView,
    metrics_view: &MetricsView,
    recipe_store: &RecipeStore,
) -> OptimizerRecord {
    let canonical = id::canon(item);
    let best_qty = search_best_qty(item, qty_max, max_cycle_time, price_view, metrics_view, recipe_store);

    // Diagnostics still run at Q=1 when nothing was feasible, so callers see why.
    let diagnostic_qty = if best_qty == 0 { 1 } else { best_qty };

    let result = perspective::primary_based(
        item,
        diagnostic_qty as f64,
        price_view,
        metrics_view,
        recipe_store,
    );
    let insta_sell = perspective::insta_sell_time(item, diagnostic_qty as f64, price_view);

    let acq_time = if result.slowest_fill_time.is_nan() {
        f64::INFINITY
    } else {
        result.slowest_fill_time
    };
    let sale_time = if insta_sell.seconds.is_nan() {
        f64::INFINITY
    } else {
        insta_sell.seconds
    };

    let buy_price = price_view.buy_price(canonical.as_str());
    let revenue = if buy_price > 0.0 && buy_price.is_finite() {
        buy_price * best_qty as f64
    } else {
        0.0
    };

    let mut calc_possible = result.calc_possible && best_qty > 0;
    let mut error_message = result.error_message.clone();

    if best_qty == 0 {
        calc_possible = false;
        error_message.get_or_insert_with(|| "no feasible quantity within the cycle-time budget".to_string());
    }

    let profit = if buy_price > 0.0 && buy_price.is_finite() {
        revenue - result.total_cost
    } else {
        calc_possible = false;
        error_message.get_or_insert_with(|| "buyPrice invalid; profit computed against cost only".to_string());
        -result.total_cost
    };

    OptimizerRecord {
        item: canonical,
        max_feasible_qty: best_qty,
        cost_at_opt: result.total_cost,
        revenue_at_opt: revenue,
        max_profit: profit,
        acq_time,
        sale_time,
        total_cycle_time: acq_time + sale_time,
        bottleneck: result.slowest_ingredient,
        calc_possible,
        error_message,
    }
}

/// Ranking per §4.9: records with `calcPossible = true` precede `false`; within a group, sort by
/// `maxProfit` descending (NaN last), then by item ascending.
pub fn rank(mut records: Vec<OptimizerRecord>) -> Vec<OptimizerRecord> {
    records.sort_by(|a, b| {
        let possible_order = b.calc_possible.cmp(&a.calc_possible);
        if possible_order != Ordering::Equal {
            return possible_order;
        }

        match (a.max_profit.is_nan(), b.max_profit.is_nan()) {
            (true, true) => a.item.cmp(&b.item),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let profit_order = b.max_profit.partial_cmp(&a.max_profit).unwrap_or(Ordering::Equal);
                if profit_order != Ordering::Equal {
                    profit_order
                } else {
                    a.item.cmp(&b.item)
                }
            }
        }
    });
    records
}

/// Processes `items` in fixed-size chunks with a pause between chunks (pure throttling — no
/// interaction between items). Item-level parallelism within a chunk is via `rayon`, matching
/// the teacher's `profitable_item_list`; this crate's synchronous, CPU-bound core makes
/// cross-item parallelism safe without additional locking.
pub fn run_batch(
    items: &[String],
    qty_max: u32,
    max_cycle_time: Duration,
    items_per_chunk: usize,
    price_view: &PriceView,
    metrics_view: &MetricsView,
    recipe_store: &RecipeStore,
    pause_between_chunks: impl Fn(),
) -> Vec<OptimizerRecord> {
    let mut all_records = Vec::with_capacity(items.len());

    for (chunk_index, chunk) in items.chunks(items_per_chunk.max(1)).enumerate() {
        if chunk_index > 0 {
            pause_between_chunks();
        }

        let mut chunk_records: Vec<OptimizerRecord> = chunk
            .par_iter()
            .map(|item| {
                optimize_item(
                    item,
                    qty_max,
                    max_cycle_time,
                    price_view,
                    metrics_view,
                    recipe_store,
                )
            })
            .collect();
        all_records.append(&mut chunk_records);
    }

    rank(all_records)
}
