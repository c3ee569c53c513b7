use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::id::{self, CanonicalId};
use crate::providers::RecipeProvider;

/// An ordered list of (ingredient, quantity-per-craft) entries together with the output count
/// produced per craft. Absence of a `Recipe` means the item is not craftable.
#[derive(Debug, Clone, Default)]
pub struct Recipe {
    pub ingredients: Vec<(CanonicalId, f64)>,
    pub output_count: f64,
}

/// Wraps a `RecipeProvider` with an in-memory cache populated on first lookup, matching "load
/// and cache recipe definitions on demand" (§2). The cache is behind a `Mutex` rather than the
/// `RwLock` the scheduler uses elsewhere: lookups are cheap, CPU-bound, and never held across
/// an `.await`, so a plain mutual-exclusion lock is the simpler fit (grounded on the teacher's
/// `mark_recursive_recipes` style of building a lookup map once and reusing it, generalized to
/// populate lazily instead of all at once).
pub struct RecipeStore {
    provider: Arc<dyn RecipeProvider>,
    cache: Mutex<HashMap<CanonicalId, Option<Recipe>>>,
}

impl RecipeStore {
    pub fn new(provider: Arc<dyn RecipeProvider>) -> Self {
        RecipeStore {
            provider,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Absence of a recipe is not an error — `hasRecipe = false` is an ordinary result (§4.5).
    /// Malformed recipes (no usable ingredient cells, non-positive output count) degrade to "no
    /// usable content" and are reported identically to absence.
    pub fn lookup(&self, item_id: &CanonicalId) -> Option<Recipe> {
        if let Some(cached) = self.cache.lock().unwrap().get(item_id) {
            return cached.clone();
        }

        let recipe = self.provider.get(item_id).and_then(|raw| {
            if raw.ingredients.is_empty() || raw.count <= 0.0 || !raw.count.is_finite() {
                return None;
            }
            Some(Recipe {
                ingredients: raw
                    .ingredients
                    .into_iter()
                    .map(|(ingredient_id, qty)| (id::canon(&ingredient_id), qty))
                    .collect(),
                output_count: raw.count,
            })
        });

        self.cache
            .lock()
            .unwrap()
            .insert(item_id.clone(), recipe.clone());
        recipe
    }

    pub fn has_recipe(&self, item_id: &CanonicalId) -> bool {
        self.lookup(item_id).is_some()
    }
}
