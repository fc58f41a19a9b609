//! Sort strategies for a mode's item views.
//!
//! The strategy is picked once, when the mode is validated:
//!
//! - **By search key** (no `sort_by`): the item's search text, lowercased.
//! - **By keys** (`sort_by` key list): the trimmed string values of the
//!   listed fields, concatenated in list order.
//! - **Custom** (`sort_by` function): the caller reorders the sequence.
//!
//! Comparable keys are computed once per item at registration and cached in
//! the mode's [`Computed`] map; sorting only reads the cache.

use super::options::{MapToSearch, SortMode};
use crate::domain::hooks::SortFn;
use crate::domain::{Item, ItemId};
use std::collections::HashMap;
use std::fmt;

/// Registry-owned derived values for one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Computed {
    pub sort_key: Option<String>,
}

#[derive(Clone)]
pub enum SortStrategy {
    BySearchKey,
    ByKeys(Vec<String>),
    Custom(SortFn),
}

impl SortStrategy {
    /// Computes the cached values for an item under this strategy.
    #[must_use]
    pub fn compute(&self, item: &Item, map_to_search: &MapToSearch) -> Computed {
        let sort_key = match self {
            Self::BySearchKey => Some(map_to_search.apply(item).to_lowercase()),
            Self::ByKeys(keys) => Some(
                keys.iter()
                    .filter_map(|key| item.field(key))
                    .map(str::trim)
                    .collect(),
            ),
            Self::Custom(_) => None,
        };
        Computed { sort_key }
    }

    /// Reorders `items` in place.
    pub fn sort(&self, items: &mut Vec<Item>, cache: &HashMap<ItemId, Computed>) {
        match self {
            Self::Custom(sort) => sort(items),
            Self::BySearchKey | Self::ByKeys(_) => {
                items.sort_by(|a, b| sort_key(cache, a).cmp(sort_key(cache, b)));
            }
        }
    }

    /// Applies the strategy as `sort_mode` dictates.
    pub fn arrange(
        &self,
        sort_mode: SortMode,
        items: &mut Vec<Item>,
        cache: &HashMap<ItemId, Computed>,
    ) {
        match sort_mode {
            SortMode::Unsorted => {}
            SortMode::Sorted => self.sort(items, cache),
            SortMode::Reversed => {
                self.sort(items, cache);
                items.reverse();
            }
        }
    }
}

fn sort_key<'a>(cache: &'a HashMap<ItemId, Computed>, item: &Item) -> &'a str {
    cache
        .get(item.id())
        .and_then(|computed| computed.sort_key.as_deref())
        .unwrap_or_default()
}

impl fmt::Debug for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BySearchKey => f.write_str("BySearchKey"),
            Self::ByKeys(keys) => f.debug_tuple("ByKeys").field(keys).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Actionable;

    fn item(id: &str, name: &str, category: &str) -> Item {
        Item::new(
            id,
            name,
            Actionable::new(|_| async { Ok(()) }).category(category),
        )
    }

    fn arranged(strategy: &SortStrategy, sort_mode: SortMode, items: &[Item]) -> Vec<String> {
        let map = MapToSearch::Fields(vec!["name".to_string()]);
        let cache = items
            .iter()
            .map(|item| (item.id().clone(), strategy.compute(item, &map)))
            .collect();
        let mut items = items.to_vec();
        strategy.arrange(sort_mode, &mut items, &cache);
        items.iter().map(|item| item.name().to_string()).collect()
    }

    #[test]
    fn by_keys_sorts_and_reverses() {
        let items = [item("b", "Beta", "x"), item("a", "Alpha", "x")];
        let strategy = SortStrategy::ByKeys(vec!["name".to_string()]);

        assert_eq!(arranged(&strategy, SortMode::Sorted, &items), ["Alpha", "Beta"]);
        assert_eq!(arranged(&strategy, SortMode::Reversed, &items), ["Beta", "Alpha"]);
        assert_eq!(arranged(&strategy, SortMode::Unsorted, &items), ["Beta", "Alpha"]);
    }

    #[test]
    fn by_keys_concatenates_trimmed_fields_and_skips_absent_ones() {
        let strategy = SortStrategy::ByKeys(vec![
            "category".to_string(),
            "description".to_string(),
            "name".to_string(),
        ]);
        let map = MapToSearch::Fields(vec!["name".to_string()]);
        let computed = strategy.compute(&item("n", " New ", "  File "), &map);
        assert_eq!(computed.sort_key.as_deref(), Some("FileNew"));
    }

    #[test]
    fn by_search_key_ignores_case() {
        let items = [item("1", "beta", ""), item("2", "Alpha", ""), item("3", "Gamma", "")];
        assert_eq!(
            arranged(&SortStrategy::BySearchKey, SortMode::Sorted, &items),
            ["Alpha", "beta", "Gamma"]
        );
    }

    #[test]
    fn custom_sorter_reorders_in_place() {
        let items = [item("1", "one", ""), item("2", "two", ""), item("3", "three", "")];
        let strategy = SortStrategy::Custom(std::rc::Rc::new(|items: &mut Vec<Item>| {
            items.sort_by_key(|item| item.name().len());
        }));
        assert_eq!(arranged(&strategy, SortMode::Sorted, &items), ["one", "two", "three"]);
    }
}
