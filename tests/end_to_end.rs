//! End-to-end coverage across price/metrics/recipe inputs through to a ranked batch result,
//! exercising the public crate surface the way a real caller would rather than any one module's
//! internals.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bazaar_arbitrage::id::CanonicalId;
use bazaar_arbitrage::metrics::{Metrics, RawMetricsEntry};
use bazaar_arbitrage::optimizer;
use bazaar_arbitrage::price::{OrderSummaryEntry, PriceSnapshot, ProductPrice, QuickStatus, RawPriceSnapshot};
use bazaar_arbitrage::providers::{RawRecipe, RecipeProvider};
use bazaar_arbitrage::recipe::RecipeStore;

struct NoRecipes;
impl RecipeProvider for NoRecipes {
    fn get(&self, _id: &CanonicalId) -> Option<RawRecipe> {
        None
    }
}

fn product(sell: f64, buy: f64, buy_moving_week: f64) -> ProductPrice {
    ProductPrice {
        product_id: "X".to_string(),
        sell_summary: vec![OrderSummaryEntry {
            price_per_unit: sell,
            amount: 1,
            orders: 1,
        }],
        buy_summary: vec![OrderSummaryEntry {
            price_per_unit: buy,
            amount: 1,
            orders: 1,
        }],
        quick_status: QuickStatus {
            buy_price: buy,
            sell_price: sell,
            buy_moving_week,
            sell_moving_week: 0.0,
        },
    }
}

fn snapshot(entries: Vec<(&str, ProductPrice)>) -> PriceSnapshot {
    let mut products = HashMap::new();
    for (id, price) in entries {
        products.insert(id.to_string(), price);
    }
    PriceSnapshot::from_raw(RawPriceSnapshot {
        success: true,
        last_updated: 0,
        products,
    })
    .expect("success=true snapshot must parse")
}

#[test]
fn batch_ranking_orders_by_profit_with_failures_last() {
    // I1: profitable and feasible. I2: no metrics and no recipe, so it fails outright.
    // I3: more profitable than I1. Expect order I3, I1, I2.
    let snap = snapshot(vec![
        ("I1", product(10.0, 12.0, 604_800.0)),
        ("I2", product(0.0, 0.0, 0.0)),
        ("I3", product(10.0, 12.0, 604_800.0)),
    ]);
    let price_view = bazaar_arbitrage::price::PriceView::new(&snap);

    let metrics = Metrics::from_raw(vec![
        RawMetricsEntry {
            product_id: "I1".to_string(),
            sell_size: 100.0,
            sell_frequency: 5.0,
            order_size: 1.0,
            order_frequency: 1.0,
        },
        RawMetricsEntry {
            product_id: "I3".to_string(),
            sell_size: 200.0,
            sell_frequency: 5.0,
            order_size: 1.0,
            order_frequency: 1.0,
        },
    ]);
    let metrics_view = bazaar_arbitrage::metrics::MetricsView::new(&metrics);

    let store = RecipeStore::new(Arc::new(NoRecipes));

    let items = vec!["I1".to_string(), "I2".to_string(), "I3".to_string()];
    let records = optimizer::run_batch(
        &items,
        1000,
        Duration::from_secs(3600),
        10,
        &price_view,
        &metrics_view,
        &store,
        || {},
    );

    assert_eq!(records.len(), 3);
    assert!(!records[2].calc_possible);
    assert_eq!(records[2].item.as_str(), "I2");
    assert!(records[0].calc_possible && records[1].calc_possible);
    assert!(records[0].max_profit >= records[1].max_profit);
}

#[test]
fn tight_cycle_time_budget_caps_the_feasible_quantity() {
    // Generous sell-side flow keeps acqTime small and bounded, while a very small weekly buy
    // volume makes insta-sell the true bottleneck; a short budget should still find some
    // feasible, nonzero quantity rather than collapsing straight to zero.
    let snap = snapshot(vec![("ITEM", product(10.0, 12.0, 604_800.0))]);
    let price_view = bazaar_arbitrage::price::PriceView::new(&snap);

    let metrics = Metrics::from_raw(vec![RawMetricsEntry {
        product_id: "ITEM".to_string(),
        sell_size: 1000.0,
        sell_frequency: 10.0,
        order_size: 1.0,
        order_frequency: 1.0,
    }]);
    let metrics_view = bazaar_arbitrage::metrics::MetricsView::new(&metrics);
    let store = RecipeStore::new(Arc::new(NoRecipes));

    let record = optimizer::optimize_item(
        "ITEM",
        500,
        Duration::from_secs(60),
        &price_view,
        &metrics_view,
        &store,
    );

    assert!(record.max_feasible_qty > 0);
    assert!(record.total_cycle_time <= 60.0);
    assert!(record.calc_possible);
}

#[test]
fn crafting_beats_buying_when_ingredients_are_cheap() {
    struct BreadRecipe;
    impl RecipeProvider for BreadRecipe {
        fn get(&self, id: &CanonicalId) -> Option<RawRecipe> {
            if id.as_str() == "BREAD" {
                Some(RawRecipe {
                    ingredients: vec![("WHEAT".to_string(), 2.0)],
                    count: 1.0,
                })
            } else {
                None
            }
        }
    }

    let snap = snapshot(vec![
        ("BREAD", product(1000.0, 2000.0, 604_800.0)),
        ("WHEAT", product(1.0, 2.0, 604_800.0)),
    ]);
    let price_view = bazaar_arbitrage::price::PriceView::new(&snap);

    let metrics = Metrics::from_raw(vec![
        RawMetricsEntry {
            product_id: "BREAD".to_string(),
            sell_size: 10.0,
            sell_frequency: 1.0,
            order_size: 1.0,
            order_frequency: 1.0,
        },
        RawMetricsEntry {
            product_id: "WHEAT".to_string(),
            sell_size: 100.0,
            sell_frequency: 10.0,
            order_size: 1.0,
            order_frequency: 1.0,
        },
    ]);
    let metrics_view = bazaar_arbitrage::metrics::MetricsView::new(&metrics);
    let store = RecipeStore::new(Arc::new(BreadRecipe));

    let record = optimizer::optimize_item(
        "BREAD",
        10,
        Duration::from_secs(3600),
        &price_view,
        &metrics_view,
        &store,
    );

    assert!(record.calc_possible);
    // Crafting from near-free wheat must cost far less than buying bread outright.
    assert!(record.cost_at_opt < 2000.0 * record.max_feasible_qty as f64);
}
