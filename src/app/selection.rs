//! Selection cursor over the active mode's results.
//!
//! The cursor always refers to a position in the results it was last reset
//! against. An empty result list means no selection.

use crate::domain::error::{PaletteError, Result};
use crate::domain::{Item, ItemId};

/// Highlighted result: its index and the id of the item at that index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub index: Option<usize>,
    pub id: Option<ItemId>,
}

impl Selection {
    /// Selects the first result, or nothing when `results` is empty.
    pub fn reset(&mut self, results: &[Item]) {
        match results.first() {
            Some(first) => self.set(0, first),
            None => self.clear(),
        }
    }

    pub fn clear(&mut self) {
        self.index = None;
        self.id = None;
    }

    /// Moves the cursor down by one, wrapping to the top.
    ///
    /// No-op on empty results.
    pub fn select_next(&mut self, results: &[Item]) {
        if results.is_empty() {
            return;
        }
        let next = self.index.map_or(0, |index| (index + 1) % results.len());
        self.set(next, &results[next]);
    }

    /// Moves the cursor up by one, wrapping to the bottom.
    ///
    /// No-op on empty results.
    pub fn select_previous(&mut self, results: &[Item]) {
        if results.is_empty() {
            return;
        }
        let previous = match self.index {
            Some(0) | None => results.len() - 1,
            Some(index) => (index - 1).min(results.len() - 1),
        };
        self.set(previous, &results[previous]);
    }

    /// Points the cursor at `index` and returns the item there.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::InvalidSelection`] if `results` has no item at
    /// `index`; the cursor is left unchanged.
    pub fn select(&mut self, index: usize, results: &[Item]) -> Result<Item> {
        let item = results
            .get(index)
            .cloned()
            .ok_or(PaletteError::InvalidSelection(index))?;
        self.set(index, &item);
        Ok(item)
    }

    /// The selected item, if the cursor still points inside `results`.
    #[must_use]
    pub fn selected<'a>(&self, results: &'a [Item]) -> Option<&'a Item> {
        self.index.and_then(|index| results.get(index))
    }

    fn set(&mut self, index: usize, item: &Item) {
        self.index = Some(index);
        self.id = Some(item.id().clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Searchable;
    use serde_json::json;

    fn results(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| {
                Item::new(format!("item-{i}"), format!("Item {i}"), Searchable::new(json!({})))
            })
            .collect()
    }

    #[test]
    fn next_wraps_around() {
        let results = results(3);
        let mut selection = Selection::default();
        selection.reset(&results);
        assert_eq!(selection.index, Some(0));

        for _ in 0..3 {
            selection.select_next(&results);
        }
        assert_eq!(selection.index, Some(0));
        assert_eq!(selection.id, Some(ItemId::new("item-0")));
    }

    #[test]
    fn previous_from_top_lands_on_last() {
        let results = results(3);
        let mut selection = Selection::default();
        selection.reset(&results);

        selection.select_previous(&results);
        assert_eq!(selection.index, Some(2));
        assert_eq!(selection.selected(&results), Some(&results[2]));
    }

    #[test]
    fn empty_results_clear_and_ignore_moves() {
        let mut selection = Selection::default();
        selection.reset(&results(2));
        selection.reset(&[]);
        assert_eq!(selection, Selection::default());

        selection.select_next(&[]);
        selection.select_previous(&[]);
        assert_eq!(selection.index, None);
    }

    #[test]
    fn out_of_range_select_fails() {
        let results = results(2);
        let mut selection = Selection::default();
        selection.reset(&results);

        let err = selection.select(5, &results).unwrap_err();
        assert!(matches!(err, PaletteError::InvalidSelection(5)));
        assert_eq!(selection.index, Some(0));
        assert_eq!(selection.select(1, &results).unwrap().name(), "Item 1");
    }
}
