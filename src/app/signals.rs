//! Observable view of palette state.
//!
//! Hosts render from these observables and may drive `open`, `placeholder`
//! and `portal` back. The controller publishes into them after every
//! operation, once its own state borrow is released.

use super::selection::Selection;
use crate::domain::{Item, ItemId, ResolutionError};
use crate::infrastructure::Observable;
use indexmap::IndexMap;

/// Per-mode observables.
#[derive(Debug, Clone)]
pub struct ModeSignals {
    /// Items in sorted order.
    pub items: Observable<Vec<Item>>,
    pub results: Observable<Vec<Item>>,
    /// Resolved ids, most recent first.
    pub history: Observable<Vec<ItemId>>,
    pub current: Observable<Option<Item>>,
}

impl ModeSignals {
    fn new() -> Self {
        Self {
            items: Observable::new(Vec::new()),
            results: Observable::new(Vec::new()),
            history: Observable::new(Vec::new()),
            current: Observable::new(None),
        }
    }
}

/// Palette-wide observables.
#[derive(Debug, Clone)]
pub struct Signals {
    pub open: Observable<bool>,
    pub error: Observable<Option<ResolutionError>>,
    /// Name of the active mode.
    pub mode: Observable<String>,
    pub placeholder: Observable<Option<String>>,
    /// Host element the palette renders into, if any.
    pub portal: Observable<Option<String>>,
    /// Raw text of the search input, prefix included.
    pub search_input: Observable<String>,
    /// Highlighted result of the active mode.
    pub selection: Observable<Selection>,
    modes: IndexMap<String, ModeSignals>,
}

impl Signals {
    pub(crate) fn new<'a>(
        mode_names: impl IntoIterator<Item = &'a str>,
        portal: Option<String>,
    ) -> Self {
        Self {
            open: Observable::new(false),
            error: Observable::new(None),
            mode: Observable::new(String::new()),
            placeholder: Observable::new(None),
            portal: Observable::new(portal),
            search_input: Observable::new(String::new()),
            selection: Observable::new(Selection::default()),
            modes: mode_names
                .into_iter()
                .map(|name| (name.to_string(), ModeSignals::new()))
                .collect(),
        }
    }

    /// Observables of one mode, by name.
    #[must_use]
    pub fn mode(&self, name: &str) -> Option<&ModeSignals> {
        self.modes.get(name)
    }

    pub(crate) fn publish(&self, snapshot: Snapshot) {
        self.open.set(snapshot.open);
        self.mode.set(snapshot.active);
        self.search_input.set(snapshot.search_text);
        self.selection.set(snapshot.selection);
        self.placeholder.set(snapshot.placeholder);
        self.error.set(snapshot.error);
        for view in snapshot.modes {
            if let Some(signals) = self.modes.get(&view.name) {
                signals.items.set(view.items);
                signals.results.set(view.results);
                signals.history.set(view.history);
                signals.current.set(view.current);
            }
        }
    }
}

/// Copy of the state the observables mirror, taken under the state borrow.
pub(crate) struct Snapshot {
    pub(crate) open: bool,
    pub(crate) active: String,
    pub(crate) search_text: String,
    pub(crate) selection: Selection,
    pub(crate) placeholder: Option<String>,
    pub(crate) error: Option<ResolutionError>,
    pub(crate) modes: Vec<ModeView>,
}

pub(crate) struct ModeView {
    pub(crate) name: String,
    pub(crate) items: Vec<Item>,
    pub(crate) results: Vec<Item>,
    pub(crate) history: Vec<ItemId>,
    pub(crate) current: Option<Item>,
}
