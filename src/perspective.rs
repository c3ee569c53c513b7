//! DualPerspective — produces two parallel analyses of the same top-level (item, qty): P1
//! ("Primary-based", minimum of three candidates) and P2 ("Secondary-based", craft-preferring).
//! Grounded on `profit.rs`'s `calculate_crafting_profit`, which compares a crafting total against
//! a direct-purchase cost inside one loop; generalized here into two named decision policies
//! sharing the same tree.

use crate::analyzer::{self, AnalysisResult};
use crate::cost_model::{self, Acquisition, AcquisitionMethod};
use crate::expander::{self, CraftingNode, NodeContent};
use crate::fill_time;
use crate::id::{self, CanonicalId};
use crate::metrics::MetricsView;
use crate::price::PriceView;
use crate::recipe::RecipeStore;

#[derive(Debug, Clone, PartialEq)]
pub enum TopAction {
    Expanded,
    TreatedAsBase(AcquisitionMethod),
    ExpansionFailed,
}

#[derive(Debug, Clone)]
pub struct PerspectiveResult {
    pub total_cost: f64,
    pub calc_possible: bool,
    pub top_action: TopAction,
    pub slowest_fill_time: f64,
    pub slowest_ingredient: Option<CanonicalId>,
    pub recipe_tree: CraftingNode,
    pub error_message: Option<String>,
}

fn is_expanded(tree: &CraftingNode) -> bool {
    matches!(tree.content, NodeContent::Internal { .. })
}

fn base_fill_time(
    method: AcquisitionMethod,
    item: &CanonicalId,
    qty: f64,
    metrics_view: &MetricsView,
) -> (f64, Option<CanonicalId>) {
    match method {
        AcquisitionMethod::Primary => match metrics_view.get(item.as_str()) {
            Some(metrics) => {
                let result = fill_time::buy_order(qty, metrics);
                let seconds = if result.error_message.is_some() {
                    f64::INFINITY
                } else {
                    result.seconds
                };
                (seconds, Some(item.clone()))
            }
            None => (f64::INFINITY, Some(item.clone())),
        },
        // An instant buy does not wait on order flow.
        AcquisitionMethod::Secondary => (0.0, None),
        AcquisitionMethod::NotAvailable => (f64::INFINITY, Some(item.clone())),
    }
}

fn craft_result(tree: CraftingNode, analysis: AnalysisResult) -> PerspectiveResult {
    PerspectiveResult {
        total_cost: analysis.total_cost,
        calc_possible: analysis.calc_possible,
        top_action: TopAction::Expanded,
        slowest_fill_time: analysis.slowest_fill_time,
        slowest_ingredient: analysis.slowest_ingredient,
        recipe_tree: tree,
        error_message: analysis.error_message,
    }
}

fn base_result(
    tree: CraftingNode,
    acquisition: Acquisition,
    item: &CanonicalId,
    qty: f64,
    metrics_view: &MetricsView,
) -> PerspectiveResult {
    let (slowest_fill_time, slowest_ingredient) =
        base_fill_time(acquisition.method, item, qty, metrics_view);
    PerspectiveResult {
        total_cost: acquisition.best_cost,
        calc_possible: true,
        top_action: TopAction::TreatedAsBase(acquisition.method),
        slowest_fill_time,
        slowest_ingredient,
        recipe_tree: tree,
        error_message: acquisition.error_message,
    }
}

fn expansion_failed(tree: CraftingNode, message: impl Into<String>) -> PerspectiveResult {
    PerspectiveResult {
        total_cost: f64::INFINITY,
        calc_possible: false,
        top_action: TopAction::ExpansionFailed,
        slowest_fill_time: f64::INFINITY,
        slowest_ingredient: None,
        recipe_tree: tree,
        error_message: Some(message.into()),
    }
}

/// P1 ("Primary-based"): picks the minimum over `{craftTotalCost, topPrimary, topSecondary}`,
/// each only considered when valid. Populates `recipeTree` from the expansion attempt even when
/// the winner is a base acquisition.
pub fn primary_based(
    item: &str,
    qty: f64,
    price_view: &PriceView,
    metrics_view: &MetricsView,
    recipe_store: &RecipeStore,
) -> PerspectiveResult {
    let canonical = id::canon(item);
    let tree = expander::expand_tree(item, qty, price_view, metrics_view, recipe_store);
    let (primary, secondary) = cost_model::get_candidates(item, qty, price_view, metrics_view);

    let craft_analysis = if is_expanded(&tree) {
        let analysis = analyzer::analyze(&tree, metrics_view);
        if analysis.calc_possible {
            Some(analysis)
        } else {
            None
        }
    } else {
        None
    };

    let mut best: Option<(f64, TopAction)> = None;
    let mut consider = |cost: f64, action: TopAction| {
        if cost.is_finite() && best.as_ref().map(|(b, _)| cost < *b).unwrap_or(true) {
            best = Some((cost, action));
        }
    };

    if let Some(analysis) = &craft_analysis {
        consider(analysis.total_cost, TopAction::Expanded);
    }
    if let Some(p) = &primary {
        consider(p.best_cost, TopAction::TreatedAsBase(AcquisitionMethod::Primary));
    }
    if let Some(s) = &secondary {
        consider(s.best_cost, TopAction::TreatedAsBase(AcquisitionMethod::Secondary));
    }

    match best {
        None => expansion_failed(tree, "no viable acquisition method"),
        Some((_, TopAction::Expanded)) => craft_result(tree, craft_analysis.unwrap()),
        Some((_, TopAction::TreatedAsBase(method))) => {
            let acquisition = match method {
                AcquisitionMethod::Primary => primary.unwrap(),
                _ => secondary.unwrap(),
            };
            base_result(tree, acquisition, &canonical, qty, metrics_view)
        }
        Some((_, TopAction::ExpansionFailed)) => unreachable!("never pushed as a candidate"),
    }
}

/// P2 ("Secondary-based"): prefers crafting when possible and meaningful, otherwise falls back
/// to Primary, then Secondary, then gives up.
pub fn secondary_based(
    item: &str,
    qty: f64,
    price_view: &PriceView,
    metrics_view: &MetricsView,
    recipe_store: &RecipeStore,
) -> PerspectiveResult {
    let canonical = id::canon(item);
    let tree = expander::expand_tree(item, qty, price_view, metrics_view, recipe_store);
    let (primary, secondary) = cost_model::get_candidates(item, qty, price_view, metrics_view);
    let price_absent = primary.is_none() && secondary.is_none();

    let craft_analysis = if is_expanded(&tree) {
        let analysis = analyzer::analyze(&tree, metrics_view);
        if analysis.calc_possible {
            Some(analysis)
        } else {
            None
        }
    } else {
        None
    };

    if price_absent {
        return match craft_analysis {
            Some(analysis) => craft_result(tree, analysis),
            None => expansion_failed(tree, "no price data and crafting was not possible"),
        };
    }

    // A craft that survived analysis but whose cost still lost to the cycle-pruning rule (a
    // pure top-level cycle collapses the whole tree to an infeasible leaf) was already filtered
    // out above by `analysis.calc_possible`, so reaching here with `craft_analysis = Some(_)`
    // means the craft is a genuine, non-cyclical candidate.
    if let Some(analysis) = &craft_analysis {
        let qualifies = match &primary {
            Some(p) if p.best_cost.is_finite() => analysis.total_cost <= p.best_cost,
            _ => true,
        };
        if qualifies {
            return craft_result(tree, analysis.clone());
        }
    }

    if let Some(p) = primary.filter(|p| p.best_cost.is_finite()) {
        return base_result(tree, p, &canonical, qty, metrics_view);
    }
    if let Some(s) = secondary.filter(|s| s.best_cost.is_finite()) {
        return base_result(tree, s, &canonical, qty, metrics_view);
    }
    expansion_failed(tree, "no viable acquisition method")
}

/// Both perspectives share a single insta-sell time estimate at the top level: the sale side is
/// method-independent, so it is computed once and attached by the caller rather than duplicated
/// inside each policy.
pub fn insta_sell_time(item: &str, qty: f64, price_view: &PriceView) -> fill_time::FillTimeResult {
    let canonical = id::canon(item);
    fill_time::insta_sell(qty, price_view.buy_moving_week(canonical.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Metrics, ProductMetrics};
    use crate::price::{PriceSnapshot, ProductPrice, QuickStatus};
    use crate::providers::{RawRecipe, RecipeProvider};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct MockProvider(HashMap<&'static str, RawRecipe>);

    impl RecipeProvider for MockProvider {
        fn get(&self, id: &CanonicalId) -> Option<RawRecipe> {
            self.0.get(id.as_str()).cloned()
        }
    }

    fn price(sell: f64, buy: f64) -> ProductPrice {
        ProductPrice {
            product_id: "X".to_string(),
            sell_summary: vec![],
            buy_summary: vec![],
            quick_status: QuickStatus {
                buy_price: buy,
                sell_price: sell,
                buy_moving_week: 1000.0,
                sell_moving_week: 0.0,
            },
        }
    }

    fn flat_metrics() -> ProductMetrics {
        ProductMetrics {
            sell_size: 10.0,
            sell_frequency: 1.0,
            order_size: 1.0,
            order_frequency: 1.0,
        }
    }

    #[test]
    fn primary_based_picks_cheapest_of_three_candidates() {
        // No recipe: craft is unavailable, so P1 must pick between Primary and Secondary.
        let snapshot = PriceSnapshot::mock(vec![("ITEM", price(10.0, 20.0))]);
        let price_view = PriceView::new(&snapshot);
        let metrics = Metrics::mock(vec![("ITEM", flat_metrics())]);
        let metrics_view = MetricsView::new(&metrics);
        let store = RecipeStore::new(Arc::new(MockProvider(HashMap::new())));

        let result = primary_based("ITEM", 5.0, &price_view, &metrics_view, &store);
        assert!(result.calc_possible);
        assert_eq!(result.top_action, TopAction::TreatedAsBase(AcquisitionMethod::Primary));
    }

    #[test]
    fn secondary_based_prefers_craft_when_cheaper() {
        let snapshot = PriceSnapshot::mock(vec![
            ("BREAD", price(1000.0, 2000.0)),
            ("WHEAT", price(1.0, 2.0)),
        ]);
        let price_view = PriceView::new(&snapshot);
        let metrics = Metrics::mock(vec![("BREAD", flat_metrics()), ("WHEAT", flat_metrics())]);
        let metrics_view = MetricsView::new(&metrics);

        let mut raws = HashMap::new();
        raws.insert(
            "BREAD",
            RawRecipe {
                ingredients: vec![("WHEAT".to_string(), 1.0)],
                count: 1.0,
            },
        );
        let store = RecipeStore::new(Arc::new(MockProvider(raws)));

        let result = secondary_based("BREAD", 1.0, &price_view, &metrics_view, &store);
        assert_eq!(result.top_action, TopAction::Expanded);
    }

    #[test]
    fn secondary_based_falls_back_to_primary_when_craft_too_expensive() {
        let snapshot = PriceSnapshot::mock(vec![
            ("BREAD", price(10.0, 20.0)),
            ("SAFFRON", price(1000.0, 2000.0)),
        ]);
        let price_view = PriceView::new(&snapshot);
        let metrics = Metrics::mock(vec![("BREAD", flat_metrics()), ("SAFFRON", flat_metrics())]);
        let metrics_view = MetricsView::new(&metrics);

        let mut raws = HashMap::new();
        raws.insert(
            "BREAD",
            RawRecipe {
                ingredients: vec![("SAFFRON".to_string(), 1.0)],
                count: 1.0,
            },
        );
        let store = RecipeStore::new(Arc::new(MockProvider(raws)));

        let result = secondary_based("BREAD", 1.0, &price_view, &metrics_view, &store);
        assert_eq!(result.top_action, TopAction::TreatedAsBase(AcquisitionMethod::Primary));
    }

    #[test]
    fn unavailable_item_with_no_recipe_fails_both_perspectives() {
        let snapshot = PriceSnapshot::mock(vec![]);
        let price_view = PriceView::new(&snapshot);
        let metrics = Metrics::mock(vec![]);
        let metrics_view = MetricsView::new(&metrics);
        let store = RecipeStore::new(Arc::new(MockProvider(HashMap::new())));

        let p1 = primary_based("GHOST", 1.0, &price_view, &metrics_view, &store);
        assert_eq!(p1.top_action, TopAction::ExpansionFailed);
        assert!(!p1.calc_possible);

        let p2 = secondary_based("GHOST", 1.0, &price_view, &metrics_view, &store);
        assert_eq!(p2.top_action, TopAction::ExpansionFailed);
        assert!(!p2.calc_possible);
    }
}
