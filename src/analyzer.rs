//! Analyzer — walks a crafting tree, sums base-ingredient costs, and determines the bottleneck
//! fill time. Grounded on `crafting.rs`'s purchase-bookkeeping accumulation, generalized from a
//! running total over a flat ingredient list to a fold over base leaves of a tree.

use std::collections::HashMap;

use crate::cost_model::{Acquisition, AcquisitionMethod};
use crate::expander::{CraftingNode, NodeContent};
use crate::fill_time;
use crate::id::CanonicalId;
use crate::metrics::{MetricsView, ProductMetrics};

#[derive(Debug, Clone)]
struct LeafEntry {
    qty: f64,
    acquisition: Acquisition,
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub total_cost: f64,
    pub calc_possible: bool,
    pub slowest_fill_time: f64,
    pub slowest_ingredient: Option<CanonicalId>,
    pub error_message: Option<String>,
}

/// Collects all base leaves into a `CanonicalId -> {summed qty, first Acquisition seen}` map;
/// quantities of identical base items across different branches sum.
fn collect_leaves(node: &CraftingNode, leaves: &mut HashMap<CanonicalId, LeafEntry>) {
    match &node.content {
        NodeContent::Base { acquisition, .. } => {
            leaves
                .entry(node.item.clone())
                .and_modify(|entry| entry.qty += node.qty_needed)
                .or_insert_with(|| LeafEntry {
                    qty: node.qty_needed,
                    acquisition: acquisition.clone(),
                });
        }
        NodeContent::Internal { ingredients, .. } => {
            for child in ingredients {
                collect_leaves(child, leaves);
            }
        }
    }
}

pub fn analyze(root: &CraftingNode, metrics_view: &MetricsView) -> AnalysisResult {
    let mut leaves = HashMap::new();
    collect_leaves(root, &mut leaves);

    let mut total_cost = 0.0;
    let mut calc_possible = true;
    let mut error_message = None;

    let mut slowest_fill_time = 0.0;
    let mut slowest_ingredient = None;

    for (item, entry) in &leaves {
        if !entry.acquisition.best_cost.is_finite() {
            calc_possible = false;
            error_message.get_or_insert_with(|| {
                format!("leaf {} has no valid acquisition cost", item)
            });
        }
        total_cost += entry.acquisition.best_cost;

        if entry.acquisition.method != AcquisitionMethod::Primary {
            continue;
        }

        let fill_seconds = match metrics_view.get(item.as_str()) {
            Some(metrics) => buy_order_fill_seconds(entry.qty, metrics),
            None => {
                calc_possible = false;
                error_message.get_or_insert_with(|| {
                    format!("leaf {} is Primary but has no metrics for fill-time", item)
                });
                f64::INFINITY
            }
        };

        if !fill_seconds.is_finite() {
            calc_possible = false;
        }

        if fill_seconds > slowest_fill_time {
            slowest_fill_time = fill_seconds;
            slowest_ingredient = Some(item.clone());
        }
    }

    if !total_cost.is_finite() {
        calc_possible = false;
        total_cost = f64::INFINITY;
    }

    AnalysisResult {
        total_cost,
        calc_possible,
        slowest_fill_time,
        slowest_ingredient,
        error_message,
    }
}

fn buy_order_fill_seconds(qty: f64, metrics: &ProductMetrics) -> f64 {
    let result = fill_time::buy_order(qty, metrics);
    if result.error_message.is_some() {
        f64::INFINITY
    } else {
        result.seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost_model::Acquisition;
    use crate::id;
    use crate::metrics::Metrics;

    fn base(item: &str, qty: f64, acquisition: Acquisition) -> CraftingNode {
        CraftingNode {
            item: id::canon(item),
            qty_needed: qty,
            depth: 0,
            max_sub_tree_depth: 0,
            content: NodeContent::Base {
                acquisition,
                error: None,
            },
        }
    }

    fn primary_acquisition(cost: f64) -> Acquisition {
        Acquisition {
            method: AcquisitionMethod::Primary,
            best_cost: cost,
            associated_cost: cost,
            rr: 1.0,
            instafill: f64::INFINITY,
            delta_ratio: 2.0,
            error_message: None,
        }
    }

    #[test]
    fn sums_identical_base_items_across_branches() {
        let left = base("WHEAT", 5.0, primary_acquisition(50.0));
        let right = base("WHEAT", 3.0, primary_acquisition(30.0));
        let root = CraftingNode {
            item: id::canon("BREAD"),
            qty_needed: 8.0,
            depth: 0,
            max_sub_tree_depth: 1,
            content: NodeContent::Internal {
                num_crafts: 1.0,
                qty_per_craft_total: 1.0,
                ingredients: vec![left, right],
            },
        };
        let metrics = Metrics::mock(vec![(
            "WHEAT",
            ProductMetrics {
                sell_size: 10.0,
                sell_frequency: 1.0,
                order_size: 1.0,
                order_frequency: 1.0,
            },
        )]);
        let metrics_view = MetricsView::new(&metrics);

        let result = analyze(&root, &metrics_view);
        assert!(result.calc_possible);
        assert_eq!(result.total_cost, 80.0);
    }

    #[test]
    fn invalid_leaf_cost_taints_calc_possible() {
        let leaf = base("RARE_GEM", 1.0, Acquisition::unavailable("API data not found"));
        let metrics = Metrics::mock(vec![]);
        let metrics_view = MetricsView::new(&metrics);
        let result = analyze(&leaf, &metrics_view);
        assert!(!result.calc_possible);
        assert_eq!(result.total_cost, f64::INFINITY);
    }

    #[test]
    fn non_primary_leaves_contribute_zero_fill_time() {
        let acquisition = Acquisition {
            method: AcquisitionMethod::Secondary,
            best_cost: 10.0,
            associated_cost: 10.0,
            rr: f64::NAN,
            instafill: f64::NAN,
            delta_ratio: 0.5,
            error_message: None,
        };
        let leaf = base("GLASS", 1.0, acquisition);
        let metrics = Metrics::mock(vec![]);
        let metrics_view = MetricsView::new(&metrics);
        let result = analyze(&leaf, &metrics_view);
        assert!(result.calc_possible);
        assert_eq!(result.slowest_fill_time, 0.0);
        assert!(result.slowest_ingredient.is_none());
    }
}
