//! Search index capability and its default fuzzy implementation.
//!
//! The palette only depends on the [`Searcher`] contract: items are added and
//! removed as the registry changes, and `search` returns matches best-first.
//! The mode re-sorts the output according to its own policy, so a searcher
//! does not need to be stable.

use super::options::MapToSearch;
use crate::domain::Item;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::fmt;
use std::rc::Rc;

/// Ranked-match index over one mode's items.
pub trait Searcher {
    /// Indexes an item.
    fn add(&mut self, item: &Item);

    /// Drops an item previously passed to [`add`](Self::add).
    fn remove(&mut self, item: &Item);

    /// Returns the items matching `query`, best match first.
    fn search(&self, query: &str) -> Vec<Item>;

    /// Number of indexed items.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds a mode's searcher from its search mapping.
pub type SearcherFactory = Rc<dyn Fn(MapToSearch) -> Box<dyn Searcher>>;

/// Default factory producing [`FuzzySearcher`]s.
#[must_use]
pub fn fuzzy_factory() -> SearcherFactory {
    Rc::new(|map_to_search| Box::new(FuzzySearcher::new(map_to_search)))
}

/// Skim-style fuzzy searcher.
///
/// The query is split on whitespace; every token must fuzzy-match the item's
/// lowercased search text. Matches are ranked by the summed token scores,
/// ties keeping insertion order.
pub struct FuzzySearcher {
    map_to_search: MapToSearch,
    entries: Vec<(Item, String)>,
    matcher: SkimMatcherV2,
}

impl FuzzySearcher {
    #[must_use]
    pub fn new(map_to_search: MapToSearch) -> Self {
        Self {
            map_to_search,
            entries: Vec::new(),
            matcher: SkimMatcherV2::default(),
        }
    }

    fn score(&self, haystack: &str, tokens: &[String]) -> Option<i64> {
        tokens
            .iter()
            .map(|token| self.matcher.fuzzy_match(haystack, token))
            .sum()
    }
}

impl Searcher for FuzzySearcher {
    fn add(&mut self, item: &Item) {
        let haystack = self.map_to_search.apply(item).to_lowercase();
        self.entries.push((item.clone(), haystack));
    }

    fn remove(&mut self, item: &Item) {
        if let Some(index) = self.entries.iter().position(|(entry, _)| entry.ptr_eq(item)) {
            self.entries.remove(index);
        }
    }

    fn search(&self, query: &str) -> Vec<Item> {
        let _span = tracing::trace_span!("fuzzy_search",
            indexed = self.entries.len(),
            query_len = query.len()
        )
        .entered();

        let tokens: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if tokens.is_empty() {
            return self.entries.iter().map(|(item, _)| item.clone()).collect();
        }

        let mut scored: Vec<(i64, &Item)> = self
            .entries
            .iter()
            .filter_map(|(item, haystack)| self.score(haystack, &tokens).map(|score| (score, item)))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        tracing::trace!(matched = scored.len(), "fuzzy search complete");
        scored.into_iter().map(|(_, item)| item.clone()).collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for FuzzySearcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuzzySearcher")
            .field("map_to_search", &self.map_to_search)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Searchable;
    use serde_json::json;

    fn item(id: &str, name: &str) -> Item {
        Item::new(id, name, Searchable::new(json!({})))
    }

    fn searcher(items: &[Item]) -> FuzzySearcher {
        let mut searcher = FuzzySearcher::new(MapToSearch::Fields(vec!["name".to_string()]));
        for item in items {
            searcher.add(item);
        }
        searcher
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(Item::name).collect()
    }

    #[test]
    fn every_token_must_match() {
        let items = [item("1", "Open File"), item("2", "Open Folder"), item("3", "Close File")];
        let searcher = searcher(&items);

        let hits = searcher.search("open fi");
        assert_eq!(names(&hits), ["Open File"]);
    }

    #[test]
    fn matching_ignores_case() {
        let searcher = searcher(&[item("1", "README")]);
        assert_eq!(searcher.search("readme").len(), 1);
        assert!(searcher.search("xyz").is_empty());
    }

    #[test]
    fn remove_drops_only_that_registration() {
        let first = item("1", "Alpha");
        let second = item("1", "Alpha");
        let mut searcher = searcher(&[first.clone(), second.clone()]);

        searcher.remove(&first);
        assert_eq!(searcher.len(), 1);
        assert!(searcher.search("alpha")[0].ptr_eq(&second));
    }

    #[test]
    fn blank_query_returns_everything() {
        let searcher = searcher(&[item("1", "a"), item("2", "b")]);
        assert_eq!(searcher.search("   ").len(), 2);
    }
}
