//! Expander — builds the crafting-step tree with cycle detection and per-node acquisition
//! decisions. Grounded on the teacher's `mark_recursive_recipes_internal` in the old `recipe.rs`,
//! which tracks a path stack to detect a cycle back to the search target; generalized here to
//! also detect cycles to non-root ancestors and to decide craft-vs-buy per node rather than just
//! flagging recursiveness.

use crate::cost_model::{self, Acquisition, AcquisitionMethod};
use crate::id::{self, CanonicalId};
use crate::metrics::MetricsView;
use crate::price::PriceView;
use crate::recipe::RecipeStore;

#[derive(Debug, Clone)]
pub enum NodeContent {
    Base {
        acquisition: Acquisition,
        error: Option<String>,
    },
    Internal {
        num_crafts: f64,
        qty_per_craft_total: f64,
        ingredients: Vec<CraftingNode>,
    },
}

#[derive(Debug, Clone)]
pub struct CraftingNode {
    pub item: CanonicalId,
    pub qty_needed: f64,
    pub depth: u32,
    pub max_sub_tree_depth: u32,
    pub content: NodeContent,
}

impl CraftingNode {
    pub fn is_base(&self) -> bool {
        matches!(self.content, NodeContent::Base { .. })
    }
}

fn base_node(
    item: CanonicalId,
    qty_needed: f64,
    depth: u32,
    acquisition: Acquisition,
    error: Option<String>,
) -> CraftingNode {
    CraftingNode {
        item,
        qty_needed,
        depth,
        max_sub_tree_depth: depth,
        content: NodeContent::Base { acquisition, error },
    }
}

/// Builds the crafting tree for `(item, qty)` rooted at the top-level item.
pub fn expand_tree(
    item: &str,
    qty: f64,
    price_view: &PriceView,
    metrics_view: &MetricsView,
    recipe_store: &RecipeStore,
) -> CraftingNode {
    let top = id::canon(item);
    let mut path = Vec::new();
    expand(&top, qty, 0, &mut path, &top, price_view, metrics_view, recipe_store)
}

fn expand(
    item: &CanonicalId,
    qty_needed: f64,
    depth: u32,
    path: &mut Vec<CanonicalId>,
    top_item: &CanonicalId,
    price_view: &PriceView,
    metrics_view: &MetricsView,
    recipe_store: &RecipeStore,
) -> CraftingNode {
    // Cycle check happens before any recipe lookup: a cycle node is always treated as base,
    // regardless of whether it happens to have a recipe.
    if depth > 0 && item == top_item {
        let acquisition = cost_model::get_best(item.as_str(), qty_needed, price_view, metrics_view);
        return base_node(
            item.clone(),
            qty_needed,
            depth,
            acquisition,
            Some("cycle-to-top".to_string()),
        );
    }

    if path.contains(item) {
        let acquisition = cost_model::get_best(item.as_str(), qty_needed, price_view, metrics_view);
        return base_node(
            item.clone(),
            qty_needed,
            depth,
            acquisition,
            Some("cycle-to-intermediate".to_string()),
        );
    }

    let acquisition = cost_model::get_best(item.as_str(), qty_needed, price_view, metrics_view);
    let recipe = recipe_store.lookup(item);

    let should_expand = match (&recipe, acquisition.method) {
        (Some(_), AcquisitionMethod::NotAvailable) => true,
        (Some(_), AcquisitionMethod::Primary) => true,
        _ => false,
    };

    if !should_expand {
        return base_node(item.clone(), qty_needed, depth, acquisition, None);
    }

    let recipe = recipe.expect("should_expand implies recipe.is_some()");
    let num_crafts = (qty_needed / recipe.output_count).ceil().max(1.0);

    path.push(item.clone());
    let mut max_child_depth = depth;
    let ingredients: Vec<CraftingNode> = recipe
        .ingredients
        .iter()
        .map(|(ingredient_id, qty_per_craft)| {
            let child_qty = qty_per_craft * num_crafts;
            let child = expand(
                ingredient_id,
                child_qty,
                depth + 1,
                path,
                top_item,
                price_view,
                metrics_view,
                recipe_store,
            );
            max_child_depth = max_child_depth.max(child.max_sub_tree_depth);
            child
        })
        .collect();
    path.pop();

    CraftingNode {
        item: item.clone(),
        qty_needed,
        depth,
        max_sub_tree_depth: max_child_depth,
        content: NodeContent::Internal {
            num_crafts,
            qty_per_craft_total: recipe.output_count,
            ingredients,
        },
    }
}
