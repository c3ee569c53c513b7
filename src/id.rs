use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A normalized item identifier; the sole key used for all cross-references between a price
/// snapshot, a metrics map and a recipe store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalId(String);

impl CanonicalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CanonicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fixed mapping of variant spellings (legacy numeric suffixes, deprecated aliases) to the
/// preferred canonical name. Finite and initialized once; safe under concurrent first-touch.
/// Entries are uppercase on both sides since they're probed after trim+uppercase normalization.
static ALIASES: Lazy<HashMap<String, String>> = Lazy::new(|| {
    let mut aliases = HashMap::new();
    // Legacy numeric-suffixed ids retired in favor of the plain name they used to disambiguate.
    aliases.insert("ENCHANTED_DIAMOND_1".to_string(), "ENCHANTED_DIAMOND".to_string());
    aliases.insert("ENCHANTED_EMERALD_1".to_string(), "ENCHANTED_EMERALD".to_string());
    // Deprecated spellings carried by older price-feed snapshots.
    aliases.insert("MUTTON".to_string(), "RAW_MUTTON".to_string());
    aliases.insert("CARROT_ITEM".to_string(), "CARROT".to_string());
    aliases
});

/// Canonicalize an identifier: trim surrounding whitespace, uppercase, then apply the alias
/// table. Idempotent: `canon(canon(x).as_str()) == canon(x)`. Unknown ids pass through with
/// only trim+uppercase applied — there is no error mode.
pub fn canon(id: &str) -> CanonicalId {
    let normalized = id.trim().to_uppercase();
    let resolved = ALIASES
        .get(normalized.as_str())
        .cloned()
        .unwrap_or(normalized);
    CanonicalId(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_uppercases() {
        assert_eq!(canon("  enchanted_diamond  ").as_str(), "ENCHANTED_DIAMOND");
    }

    #[test]
    fn is_idempotent() {
        let once = canon("Raw Diamond");
        let twice = canon(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_ids_pass_through() {
        assert_eq!(canon("wheat"), canon("WHEAT"));
    }

    #[test]
    fn legacy_aliases_resolve_to_the_preferred_name() {
        assert_eq!(canon("enchanted_diamond_1").as_str(), "ENCHANTED_DIAMOND");
        assert_eq!(canon("mutton").as_str(), "RAW_MUTTON");
    }

    #[test]
    fn aliased_ids_are_idempotent_once_resolved() {
        let once = canon("mutton");
        let twice = canon(once.as_str());
        assert_eq!(once, twice);
    }
}
