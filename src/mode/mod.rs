//! Modes: prefix-scoped partitions of palette items.
//!
//! A [`Mode`] owns one item type's validated configuration, the raw item list
//! (insertion order, the source of truth), the sorted view derived from it,
//! the search index, the last computed results, the resolution history and
//! the item currently being resolved.
//!
//! # Modules
//!
//! - [`options`]: Caller-facing options, policies and validation
//! - [`sort`]: Sort strategies and the per-item computed cache
//! - [`searcher`]: The search capability and the default fuzzy searcher

pub mod options;
pub mod searcher;
pub mod sort;

pub use options::{
    CloseAction, EmptyMode, MapToSearch, ModeConfig, ModeOptions, OpenAction, SortMode,
    UpdateAction,
};
pub use searcher::{fuzzy_factory, FuzzySearcher, Searcher, SearcherFactory};
pub use sort::{Computed, SortStrategy};

use crate::domain::{Item, ItemId};
use crate::infrastructure::KeyBinding;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A registered item and the shortcut bindings it holds.
///
/// Dropping an entry releases its bindings.
pub(crate) struct Entry {
    pub(crate) item: Item,
    pub(crate) bindings: Vec<KeyBinding>,
}

pub struct Mode {
    name: String,
    config: ModeConfig,
    entries: Vec<Entry>,
    sorted: Vec<Item>,
    computed: HashMap<ItemId, Computed>,
    searcher: Box<dyn Searcher>,
    pub(crate) results: Vec<Item>,
    pub(crate) history: Vec<ItemId>,
    pub(crate) current: Option<Item>,
    pub(crate) last_input: String,
}

impl Mode {
    pub(crate) fn new(name: String, config: ModeConfig, factory: &SearcherFactory) -> Self {
        let searcher = factory(config.map_to_search.clone());
        Self {
            name,
            config,
            entries: Vec::new(),
            sorted: Vec::new(),
            computed: HashMap::new(),
            searcher,
            results: Vec::new(),
            history: Vec::new(),
            current: None,
            last_input: String::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn config(&self) -> &ModeConfig {
        &self.config
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    /// Items in registration order.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.entries.iter().map(|entry| entry.item.clone()).collect()
    }

    /// Items in the order the sort strategy and sort mode dictate.
    #[must_use]
    pub fn sorted_items(&self) -> &[Item] {
        &self.sorted
    }

    #[must_use]
    pub fn results(&self) -> &[Item] {
        &self.results
    }

    /// Resolved item ids, most recent first.
    #[must_use]
    pub fn history(&self) -> &[ItemId] {
        &self.history
    }

    #[must_use]
    pub const fn current(&self) -> Option<&Item> {
        self.current.as_ref()
    }

    /// Input text captured the last time a close was resolved on this mode.
    #[must_use]
    pub fn last_input(&self) -> &str {
        &self.last_input
    }

    #[must_use]
    pub fn computed(&self, id: &ItemId) -> Option<&Computed> {
        self.computed.get(id)
    }

    #[must_use]
    pub fn searcher(&self) -> &dyn Searcher {
        self.searcher.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.position(id).is_some()
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.position(id).map(|index| &self.entries[index].item)
    }

    pub(crate) fn position(&self, id: &ItemId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.item.id() == id)
    }

    pub(crate) fn position_of(&self, item: &Item) -> Option<usize> {
        self.entries.iter().position(|entry| entry.item.ptr_eq(item))
    }

    /// Appends a new entry and indexes it.
    pub(crate) fn insert(&mut self, entry: Entry) {
        self.index(&entry.item);
        self.entries.push(entry);
    }

    /// Replaces the entry at `index`, returning the displaced one.
    pub(crate) fn replace(&mut self, index: usize, entry: Entry) -> Entry {
        self.index(&entry.item);
        let displaced = std::mem::replace(&mut self.entries[index], entry);
        self.searcher.remove(&displaced.item);
        self.sorted.retain(|item| !item.ptr_eq(&displaced.item));
        displaced
    }

    /// Removes the entries at `indices`, from every view.
    pub(crate) fn remove(&mut self, indices: &[usize]) -> Vec<Entry> {
        let doomed: HashSet<usize> = indices.iter().copied().collect();
        let mut removed = Vec::with_capacity(doomed.len());
        let mut kept = Vec::with_capacity(self.entries.len().saturating_sub(doomed.len()));

        for (index, entry) in std::mem::take(&mut self.entries).into_iter().enumerate() {
            if doomed.contains(&index) {
                removed.push(entry);
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;

        for entry in &removed {
            self.searcher.remove(&entry.item);
            self.sorted.retain(|item| !item.ptr_eq(&entry.item));
            if !self.contains(entry.item.id()) {
                self.computed.remove(entry.item.id());
            }
        }
        removed
    }

    fn index(&mut self, item: &Item) {
        self.searcher.add(item);
        let computed = self.config.sort.compute(item, &self.config.map_to_search);
        self.computed.insert(item.id().clone(), computed);
    }

    /// Recomputes the sorted view from the raw list.
    pub(crate) fn resort(&mut self) {
        let mut sorted = self.items();
        self.config
            .sort
            .arrange(self.config.sort_mode, &mut sorted, &self.computed);
        self.sorted = sorted;
    }

    /// Removes the mode prefix from the raw input.
    ///
    /// Input not starting with the prefix is searched whole.
    #[must_use]
    pub fn strip_prefix<'a>(&self, input: &'a str) -> &'a str {
        input.strip_prefix(self.prefix()).unwrap_or_else(|| {
            tracing::debug!(
                mode = %self.name,
                "input does not carry the mode prefix, searching it whole"
            );
            input
        })
    }

    /// Computes the results for a raw input string.
    #[must_use]
    pub fn query(&self, input: &str) -> Vec<Item> {
        let query = self.strip_prefix(input).trim();
        let _span = tracing::debug_span!("mode_query",
            mode = %self.name,
            query_len = query.len(),
            items = self.entries.len()
        )
        .entered();

        if query.is_empty() {
            return match self.config.empty_mode {
                EmptyMode::All => self.sorted.clone(),
                EmptyMode::History => self.history_items(),
                EmptyMode::None => Vec::new(),
            };
        }

        let mut results = self.searcher.search(query);
        self.config
            .sort
            .arrange(self.config.sort_mode, &mut results, &self.computed);
        tracing::debug!(matched = results.len(), "query complete");
        results
    }

    /// History resolved against the live items, most recent first, each item
    /// once. Ids no longer registered are skipped.
    #[must_use]
    pub fn history_items(&self) -> Vec<Item> {
        let mut seen = HashSet::new();
        self.history
            .iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| self.get(id).cloned())
            .collect()
    }

    pub(crate) fn push_history(&mut self, id: &ItemId) {
        self.history.insert(0, id.clone());
    }

    /// Hands shortcut bindings to the entry holding `item`.
    ///
    /// Returns them back if that registration is gone.
    pub(crate) fn attach_bindings(
        &mut self,
        item: &Item,
        bindings: Vec<KeyBinding>,
    ) -> Option<Vec<KeyBinding>> {
        match self.position_of(item) {
            Some(index) => {
                self.entries[index].bindings.extend(bindings);
                None
            }
            None => Some(bindings),
        }
    }

    /// Takes every item's shortcut bindings without unregistering items.
    pub(crate) fn take_bindings(&mut self) -> Vec<KeyBinding> {
        self.entries
            .iter_mut()
            .flat_map(|entry| std::mem::take(&mut entry.bindings))
            .collect()
    }
}

impl fmt::Debug for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mode")
            .field("name", &self.name)
            .field("prefix", &self.config.prefix)
            .field("items", &self.entries.len())
            .field("results", &self.results.len())
            .field("history", &self.history.len())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemType, Searchable};
    use serde_json::json;

    fn mode(options: ModeOptions) -> Mode {
        let config = options.validate("files", CloseAction::ResetClose).unwrap();
        Mode::new("files".to_string(), config, &fuzzy_factory())
    }

    fn add(mode: &mut Mode, id: &str, name: &str) -> Item {
        let item = Item::new(id, name, Searchable::new(json!({})));
        mode.insert(Entry {
            item: item.clone(),
            bindings: Vec::new(),
        });
        item
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(Item::name).collect()
    }

    #[test]
    fn prefix_is_stripped_or_input_kept_whole() {
        let mode = mode(ModeOptions::new(ItemType::Searchable, "#").search_fields(["name"]));
        assert_eq!(mode.strip_prefix("#main"), "main");
        assert_eq!(mode.strip_prefix("main"), "main");
    }

    #[test]
    fn empty_query_policies() {
        let mut all = mode(ModeOptions::new(ItemType::Searchable, "").search_fields(["name"]));
        add(&mut all, "b", "beta");
        add(&mut all, "a", "alpha");
        all.resort();
        assert_eq!(names(&all.query("  ")), ["alpha", "beta"]);

        let mut none = mode(
            ModeOptions::new(ItemType::Searchable, "")
                .search_fields(["name"])
                .empty_mode(EmptyMode::None),
        );
        add(&mut none, "a", "alpha");
        none.resort();
        assert!(none.query("").is_empty());
    }

    #[test]
    fn history_is_most_recent_first_and_skips_missing_ids() {
        let mut mode = mode(
            ModeOptions::new(ItemType::Searchable, "")
                .search_fields(["name"])
                .empty_mode(EmptyMode::History),
        );
        add(&mut mode, "a", "alpha");
        add(&mut mode, "b", "beta");
        mode.resort();

        mode.push_history(&ItemId::new("a"));
        mode.push_history(&ItemId::new("gone"));
        mode.push_history(&ItemId::new("b"));
        mode.push_history(&ItemId::new("a"));

        assert_eq!(names(&mode.query("")), ["alpha", "beta"]);
        assert_eq!(mode.history().len(), 4);
    }

    #[test]
    fn search_results_follow_sort_mode() {
        let mut mode = mode(
            ModeOptions::new(ItemType::Searchable, "")
                .search_fields(["name"])
                .sort_mode(SortMode::Reversed),
        );
        add(&mut mode, "1", "file one");
        add(&mut mode, "2", "file two");
        add(&mut mode, "3", "folder");
        mode.resort();

        assert_eq!(names(&mode.query("file")), ["file two", "file one"]);
        assert_eq!(names(mode.sorted_items()), ["folder", "file two", "file one"]);
    }

    #[test]
    fn remove_clears_every_view() {
        let mut mode = mode(ModeOptions::new(ItemType::Searchable, "").search_fields(["name"]));
        add(&mut mode, "a", "alpha");
        add(&mut mode, "b", "beta");
        add(&mut mode, "c", "gamma");
        mode.resort();

        let removed = mode.remove(&[0, 2]);
        assert_eq!(removed.len(), 2);
        assert_eq!(names(&mode.items()), ["beta"]);
        assert_eq!(names(mode.sorted_items()), ["beta"]);
        assert_eq!(mode.searcher().len(), 1);
        assert!(mode.computed(&ItemId::new("a")).is_none());
    }
}
