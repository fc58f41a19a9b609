//! The mode registry owned by a palette.
//!
//! Modes are kept in registration order and looked up by name. The registry
//! enforces the palette-wide invariants: unique mode names, unique prefixes,
//! an empty-prefix mode, and item ids unique across every mode.

use crate::domain::error::{PaletteError, Result};
use crate::domain::{Item, ItemId};
use crate::mode::{CloseAction, Entry, Mode, ModeOptions, SearcherFactory};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Selects items to unregister.
#[derive(Clone)]
pub enum Matcher {
    /// First item with this id.
    Id(ItemId),
    /// This exact registration.
    Item(Item),
    /// Every item the predicate accepts.
    Predicate(Rc<dyn Fn(&Item) -> bool>),
}

impl Matcher {
    pub fn predicate(f: impl Fn(&Item) -> bool + 'static) -> Self {
        Self::Predicate(Rc::new(f))
    }

    /// Indices in `items` this matcher selects.
    #[must_use]
    pub fn indices(&self, items: &[Item]) -> Vec<usize> {
        match self {
            Self::Id(id) => items.iter().position(|item| item.id() == id).into_iter().collect(),
            Self::Item(target) => items
                .iter()
                .position(|item| item.ptr_eq(target))
                .into_iter()
                .collect(),
            Self::Predicate(accepts) => items
                .iter()
                .enumerate()
                .filter(|(_, item)| accepts(item))
                .map(|(index, _)| index)
                .collect(),
        }
    }
}

impl From<ItemId> for Matcher {
    fn from(id: ItemId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for Matcher {
    fn from(id: &str) -> Self {
        Self::Id(ItemId::new(id))
    }
}

impl From<Item> for Matcher {
    fn from(item: Item) -> Self {
        Self::Item(item)
    }
}

impl From<&Item> for Matcher {
    fn from(item: &Item) -> Self {
        Self::Item(item.clone())
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Self::Item(item) => f.debug_tuple("Item").field(item).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// How [`Registry::register`] treats an id that is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Replace an existing item with the same id in place.
    pub override_existing: bool,
    /// Skip duplicates instead of failing.
    pub silent: bool,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            override_existing: false,
            silent: true,
        }
    }
}

impl RegisterOptions {
    #[must_use]
    pub const fn overriding() -> Self {
        Self {
            override_existing: true,
            silent: true,
        }
    }

    #[must_use]
    pub const fn strict() -> Self {
        Self {
            override_existing: false,
            silent: false,
        }
    }
}

/// Outcome of one registration call.
pub(crate) struct Registered {
    /// Items appended by this call.
    pub(crate) added: Vec<Item>,
    /// Items that took the slot of an existing one.
    pub(crate) replacing: Vec<Item>,
    /// Entries pushed out by `replacing`.
    pub(crate) displaced: Vec<Entry>,
}

pub struct Registry {
    modes: Vec<Mode>,
}

impl Registry {
    /// Validates every mode and builds the registry in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::Configuration`] when no mode is given, a mode
    /// name or prefix repeats, no mode has the empty prefix, or a mode's own
    /// options are invalid.
    pub(crate) fn from_config(
        options: &[(String, ModeOptions)],
        default_close: CloseAction,
        factory: &SearcherFactory,
    ) -> Result<Self> {
        if options.is_empty() {
            return Err(PaletteError::Configuration(
                "at least one mode is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut prefixes = HashSet::new();
        let mut modes = Vec::with_capacity(options.len());
        for (name, opts) in options {
            if !names.insert(name.as_str()) {
                return Err(PaletteError::Configuration(format!(
                    "mode {name:?} is defined twice"
                )));
            }
            if !prefixes.insert(opts.prefix()) {
                return Err(PaletteError::Configuration(format!(
                    "mode {name:?} reuses prefix {:?}",
                    opts.prefix()
                )));
            }
            let config = opts.clone().validate(name, default_close)?;
            modes.push(Mode::new(name.clone(), config, factory));
        }

        if !prefixes.contains("") {
            return Err(PaletteError::Configuration(
                "one mode must use the empty prefix".to_string(),
            ));
        }

        tracing::debug!(modes = modes.len(), "mode registry built");
        Ok(Self { modes })
    }

    /// Modes in registration order.
    #[must_use]
    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    /// Looks a mode up by name.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::UnknownMode`] if no mode has that name.
    pub fn get(&self, name: &str) -> Result<&Mode> {
        self.modes
            .iter()
            .find(|mode| mode.name() == name)
            .ok_or_else(|| PaletteError::UnknownMode(name.to_string()))
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Result<&mut Mode> {
        self.modes
            .iter_mut()
            .find(|mode| mode.name() == name)
            .ok_or_else(|| PaletteError::UnknownMode(name.to_string()))
    }

    pub(crate) fn modes_mut(&mut self) -> impl Iterator<Item = &mut Mode> {
        self.modes.iter_mut()
    }

    /// The mode whose prefix is the longest match for `text`.
    ///
    /// Ties go to the mode registered first.
    #[must_use]
    pub fn best_match(&self, text: &str) -> Option<&Mode> {
        self.modes
            .iter()
            .filter(|mode| text.starts_with(mode.prefix()))
            .fold(None, |best: Option<&Mode>, mode| match best {
                Some(best) if best.prefix().len() >= mode.prefix().len() => Some(best),
                _ => Some(mode),
            })
    }

    /// The mode that holds `id`, and the item.
    #[must_use]
    pub fn find(&self, id: &ItemId) -> Option<(&Mode, &Item)> {
        self.modes
            .iter()
            .find_map(|mode| mode.get(id).map(|item| (mode, item)))
    }

    /// Adds `items` to a mode and recomputes its sorted view.
    ///
    /// Existing ids are replaced in place when overriding, skipped when
    /// silent and rejected otherwise. An id held by another mode is never
    /// replaced. When not silent, every candidate is checked before anything
    /// changes, so a failing call leaves the registry as it was.
    ///
    /// Shortcut bindings are not created here: callers bind the returned
    /// `added` and `replacing` items once the registry is no longer borrowed.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::UnknownMode`] for an unknown mode and
    /// [`PaletteError::DuplicateId`] for a rejected duplicate.
    pub(crate) fn register(
        &mut self,
        mode_name: &str,
        items: Vec<Item>,
        options: RegisterOptions,
    ) -> Result<Registered> {
        let target = self
            .modes
            .iter()
            .position(|mode| mode.name() == mode_name)
            .ok_or_else(|| PaletteError::UnknownMode(mode_name.to_string()))?;

        if !options.silent {
            self.check_duplicates(target, &items, options.override_existing)?;
        }

        let mut registered = Registered {
            added: Vec::new(),
            replacing: Vec::new(),
            displaced: Vec::new(),
        };
        for item in items {
            if self.held_elsewhere(target, item.id()) {
                tracing::warn!(
                    id = %item.id(),
                    mode = %mode_name,
                    "id registered in another mode, skipping"
                );
                continue;
            }

            let mode = &mut self.modes[target];
            let entry = Entry {
                item: item.clone(),
                bindings: Vec::new(),
            };
            match mode.position(item.id()) {
                Some(index) if options.override_existing => {
                    tracing::debug!(id = %item.id(), mode = %mode_name, "overriding item");
                    registered.displaced.push(mode.replace(index, entry));
                    registered.replacing.push(item);
                }
                Some(_) => {
                    tracing::debug!(id = %item.id(), mode = %mode_name, "duplicate id skipped");
                }
                None => {
                    mode.insert(entry);
                    registered.added.push(item);
                }
            }
        }

        self.modes[target].resort();
        tracing::debug!(
            mode = %mode_name,
            added = registered.added.len(),
            replaced = registered.replacing.len(),
            "items registered"
        );
        Ok(registered)
    }

    fn check_duplicates(&self, target: usize, items: &[Item], overriding: bool) -> Result<()> {
        let mut seen = HashSet::new();
        for item in items {
            let id = item.id();
            let in_mode = self.modes[target].contains(id) || !seen.insert(id);
            if self.held_elsewhere(target, id) || (in_mode && !overriding) {
                return Err(PaletteError::DuplicateId(id.clone()));
            }
        }
        Ok(())
    }

    fn held_elsewhere(&self, target: usize, id: &ItemId) -> bool {
        self.modes
            .iter()
            .enumerate()
            .any(|(index, mode)| index != target && mode.contains(id))
    }

    /// Removes these exact registrations from a mode.
    ///
    /// Items no longer registered are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::UnknownMode`] for an unknown mode.
    pub(crate) fn remove(&mut self, mode_name: &str, items: &[Item]) -> Result<Vec<Entry>> {
        let mode = self.get_mut(mode_name)?;
        let indices: Vec<usize> = items
            .iter()
            .filter_map(|item| mode.position_of(item))
            .collect();
        if indices.is_empty() {
            return Ok(Vec::new());
        }
        let removed = mode.remove(&indices);
        tracing::debug!(mode = %mode_name, removed = removed.len(), "items unregistered");
        Ok(removed)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.modes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemType, Searchable};
    use crate::mode::fuzzy_factory;
    use serde_json::json;

    fn registry() -> Registry {
        let modes = vec![
            (
                "files".to_string(),
                ModeOptions::new(ItemType::Searchable, "").search_fields(["name"]),
            ),
            (
                "tags".to_string(),
                ModeOptions::new(ItemType::Searchable, "#").search_fields(["name"]),
            ),
            (
                "tag-groups".to_string(),
                ModeOptions::new(ItemType::Searchable, "##").search_fields(["name"]),
            ),
        ];
        Registry::from_config(&modes, CloseAction::ResetClose, &fuzzy_factory()).unwrap()
    }

    fn item(id: &str, name: &str) -> Item {
        Item::new(id, name, Searchable::new(json!({})))
    }

    fn names(mode: &Mode) -> Vec<String> {
        mode.items().iter().map(|item| item.name().to_string()).collect()
    }

    #[test]
    fn config_requires_empty_prefix_and_unique_names() {
        let factory = fuzzy_factory();
        let only_tags = vec![(
            "tags".to_string(),
            ModeOptions::new(ItemType::Searchable, "#").search_fields(["name"]),
        )];
        assert!(matches!(
            Registry::from_config(&only_tags, CloseAction::ResetClose, &factory),
            Err(PaletteError::Configuration(_))
        ));

        let twice = vec![
            ("a".to_string(), ModeOptions::new(ItemType::Searchable, "").search_fields(["name"])),
            ("a".to_string(), ModeOptions::new(ItemType::Searchable, ">").search_fields(["name"])),
        ];
        assert!(Registry::from_config(&twice, CloseAction::ResetClose, &factory).is_err());

        let same_prefix = vec![
            ("a".to_string(), ModeOptions::new(ItemType::Searchable, "").search_fields(["name"])),
            ("b".to_string(), ModeOptions::new(ItemType::Searchable, "").search_fields(["name"])),
        ];
        assert!(Registry::from_config(&same_prefix, CloseAction::ResetClose, &factory).is_err());

        assert!(Registry::from_config(&[], CloseAction::ResetClose, &factory).is_err());
    }

    #[test]
    fn longest_prefix_wins() {
        let registry = registry();
        assert_eq!(registry.best_match("readme").map(Mode::name), Some("files"));
        assert_eq!(registry.best_match("#rust").map(Mode::name), Some("tags"));
        assert_eq!(registry.best_match("##lang").map(Mode::name), Some("tag-groups"));
    }

    #[test]
    fn strict_duplicate_leaves_mode_unchanged() {
        let mut registry = registry();
        registry
            .register("files", vec![item("a", "alpha")], RegisterOptions::default())
            .unwrap();

        let err = registry
            .register(
                "files",
                vec![item("b", "beta"), item("a", "again")],
                RegisterOptions::strict(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, PaletteError::DuplicateId(ref id) if id.as_str() == "a"));
        assert_eq!(names(registry.get("files").unwrap()), ["alpha"]);
    }

    #[test]
    fn override_replaces_in_place() {
        let mut registry = registry();
        registry
            .register(
                "files",
                vec![item("a", "alpha"), item("b", "beta")],
                RegisterOptions::default(),
            )
            .unwrap();

        let registered = registry
            .register("files", vec![item("a", "ALPHA")], RegisterOptions::overriding())
            .unwrap();
        assert!(registered.added.is_empty());
        assert_eq!(registered.replacing.len(), 1);
        assert_eq!(registered.displaced[0].item.name(), "alpha");
        assert_eq!(names(registry.get("files").unwrap()), ["ALPHA", "beta"]);
    }

    #[test]
    fn ids_are_unique_across_modes() {
        let mut registry = registry();
        registry
            .register("files", vec![item("a", "alpha")], RegisterOptions::default())
            .unwrap();

        let skipped = registry
            .register("tags", vec![item("a", "alpha tag")], RegisterOptions::overriding())
            .unwrap();
        assert!(skipped.added.is_empty() && skipped.replacing.is_empty());
        assert!(registry.get("tags").unwrap().is_empty());

        assert!(registry
            .register("tags", vec![item("a", "alpha tag")], RegisterOptions::strict())
            .is_err());
    }

    #[test]
    fn matchers_select_first_or_all() {
        let items = vec![item("a", "one"), item("a", "two"), item("b", "three")];
        assert_eq!(Matcher::from("a").indices(&items), [0]);
        assert_eq!(Matcher::from(&items[1]).indices(&items), [1]);
        assert_eq!(
            Matcher::predicate(|item| item.name().contains('t')).indices(&items),
            [1, 2]
        );
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = registry();
        let registered = registry
            .register("files", vec![item("a", "alpha")], RegisterOptions::default())
            .unwrap();

        assert_eq!(registry.remove("files", &registered.added).unwrap().len(), 1);
        assert!(registry.remove("files", &registered.added).unwrap().is_empty());
        assert!(matches!(
            registry.remove("nope", &registered.added),
            Err(PaletteError::UnknownMode(_))
        ));
    }
}
