//! Per-mode options and their validated form.
//!
//! [`ModeOptions`] is what callers write: data fields deserialize from TOML,
//! function fields are attached in code with the builder methods.
//! [`ModeOptions::validate`] applies per-variant defaults and produces the
//! immutable [`ModeConfig`] a [`Mode`](super::Mode) is built from.

use super::sort::SortStrategy;
use crate::domain::error::{PaletteError, Result};
use crate::domain::hooks::{hook, MapToSearchFn, NavigationHook, SelectionHook, SortFn};
use crate::domain::{Item, ItemType, NavigationContext, SelectionContext};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::str::FromStr;

/// How the sorted view relates to the sort strategy's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Sorted,
    Reversed,
    Unsorted,
}

/// What an empty query shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyMode {
    /// Every item, in sorted order.
    #[default]
    All,
    /// Previously resolved items, most recent first.
    History,
    /// Nothing.
    None,
}

impl FromStr for EmptyMode {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "history" => Ok(Self::History),
            "none" => Ok(Self::None),
            other => Err(PaletteError::InvalidConfig(format!(
                "unknown empty mode {other:?} (expected all, history or none)"
            ))),
        }
    }
}

/// What resolving a close does to the input text and the open flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseAction {
    /// Leave text and open state alone.
    NoAction,
    /// Reset the input to the mode prefix, stay open.
    Reset,
    /// Keep the input, close the palette.
    KeepClose,
    /// Reset the input and close the palette.
    #[default]
    ResetClose,
}

impl CloseAction {
    #[must_use]
    pub const fn resets(self) -> bool {
        matches!(self, Self::Reset | Self::ResetClose)
    }

    #[must_use]
    pub const fn closes(self) -> bool {
        matches!(self, Self::KeepClose | Self::ResetClose)
    }
}

/// What opening the palette on a mode does to its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenAction {
    #[default]
    Keep,
    Reset,
}

/// Whether registry changes refresh visible results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateAction {
    #[default]
    Refresh,
    Keep,
}

/// A policy written either in code or as text in a configuration file.
///
/// Text is only interpreted by [`ModeOptions::validate`], so an unknown
/// value is reported as a configuration error rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Declared<T> {
    Value(T),
    Text(String),
}

impl<T> Declared<T>
where
    T: Copy + FromStr<Err = PaletteError>,
{
    /// The typed value, if the text names one.
    fn value(&self) -> Option<T> {
        match self {
            Self::Value(value) => Some(*value),
            Self::Text(text) => text.parse().ok(),
        }
    }

    fn resolve(self) -> Result<T> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Text(text) => text.parse(),
        }
    }
}

impl<T: Default> Default for Declared<T> {
    fn default() -> Self {
        Self::Value(T::default())
    }
}

impl<'de, T> Deserialize<'de> for Declared<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::Text)
    }
}

/// The text a mode searches and sorts each item by.
#[derive(Clone)]
pub enum MapToSearch {
    /// Named item fields joined by a space, absent fields skipped.
    Fields(Vec<String>),
    Custom(MapToSearchFn),
}

impl MapToSearch {
    #[must_use]
    pub fn apply(&self, item: &Item) -> String {
        match self {
            Self::Fields(fields) => fields
                .iter()
                .filter_map(|field| item.field(field))
                .collect::<Vec<_>>()
                .join(" "),
            Self::Custom(map) => map(item),
        }
    }
}

impl fmt::Debug for MapToSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Mode-level hooks, by item variant.
#[derive(Clone, Default)]
pub struct VariantHooks {
    pub(crate) on_navigation: Option<NavigationHook>,
    pub(crate) on_external: Option<NavigationHook>,
    pub(crate) on_local: Option<NavigationHook>,
    pub(crate) on_selection: Option<SelectionHook>,
}

impl VariantHooks {
    fn navigation_hooks_set(&self) -> bool {
        self.on_navigation.is_some() || self.on_external.is_some() || self.on_local.is_some()
    }
}

/// Options for one mode, as written by the caller.
///
/// # Example
///
/// ```
/// use paletta::{ItemType, ModeOptions, SortMode};
///
/// let commands = ModeOptions::new(ItemType::Actionable, ">")
///     .search_fields(["name", "category"])
///     .sort_by_keys(["category", "name"])
///     .sort_mode(SortMode::Sorted)
///     .shortcut("ctrl+shift+p");
/// ```
#[derive(Clone, Deserialize)]
pub struct ModeOptions {
    #[serde(rename = "type")]
    pub(crate) item_type: Declared<ItemType>,
    pub(crate) prefix: String,
    #[serde(default)]
    pub(crate) search_fields: Vec<String>,
    #[serde(skip)]
    pub(crate) map_to_search: Option<MapToSearchFn>,
    #[serde(default)]
    pub(crate) sort_by: Option<Vec<String>>,
    #[serde(skip)]
    pub(crate) sort_fn: Option<SortFn>,
    #[serde(default)]
    pub(crate) sort_mode: SortMode,
    #[serde(default)]
    pub(crate) empty_mode: Declared<EmptyMode>,
    #[serde(default)]
    pub(crate) close_action: Option<CloseAction>,
    #[serde(default)]
    pub(crate) open_action: OpenAction,
    #[serde(default)]
    pub(crate) update_action: UpdateAction,
    #[serde(default)]
    pub(crate) shortcuts: Vec<String>,
    #[serde(default)]
    pub(crate) placeholder: Option<String>,
    #[serde(skip)]
    pub(crate) hooks: VariantHooks,
}

impl ModeOptions {
    pub fn new(item_type: ItemType, prefix: impl Into<String>) -> Self {
        Self {
            item_type: Declared::Value(item_type),
            prefix: prefix.into(),
            search_fields: Vec::new(),
            map_to_search: None,
            sort_by: None,
            sort_fn: None,
            sort_mode: SortMode::default(),
            empty_mode: Declared::default(),
            close_action: None,
            open_action: OpenAction::default(),
            update_action: UpdateAction::default(),
            shortcuts: Vec::new(),
            placeholder: None,
            hooks: VariantHooks::default(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Item type of the mode; `None` when a configuration file names an
    /// unknown type.
    #[must_use]
    pub fn item_type(&self) -> Option<ItemType> {
        self.item_type.value()
    }

    /// Searches items by these fields, joined by a space.
    #[must_use]
    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Searches items by the text this function returns. Takes precedence
    /// over `search_fields`.
    ///
    /// Runs while the palette updates its state; it must not call back into
    /// the palette.
    #[must_use]
    pub fn map_to_search(mut self, map: impl Fn(&Item) -> String + 'static) -> Self {
        self.map_to_search = Some(Rc::new(map));
        self
    }

    /// Sorts by the concatenated, trimmed values of these fields.
    #[must_use]
    pub fn sort_by_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_by = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Sorts with a caller-supplied in-place reordering.
    ///
    /// Like `map_to_search`, it runs during palette updates and must not call
    /// back into the palette.
    #[must_use]
    pub fn sort_by(mut self, sort: impl Fn(&mut Vec<Item>) + 'static) -> Self {
        self.sort_fn = Some(Rc::new(sort));
        self
    }

    #[must_use]
    pub const fn sort_mode(mut self, sort_mode: SortMode) -> Self {
        self.sort_mode = sort_mode;
        self
    }

    #[must_use]
    pub fn empty_mode(mut self, empty_mode: EmptyMode) -> Self {
        self.empty_mode = Declared::Value(empty_mode);
        self
    }

    #[must_use]
    pub const fn close_action(mut self, close_action: CloseAction) -> Self {
        self.close_action = Some(close_action);
        self
    }

    #[must_use]
    pub const fn open_action(mut self, open_action: OpenAction) -> Self {
        self.open_action = open_action;
        self
    }

    #[must_use]
    pub const fn update_action(mut self, update_action: UpdateAction) -> Self {
        self.update_action = update_action;
        self
    }

    /// Adds a shortcut that opens the palette on this mode.
    #[must_use]
    pub fn shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcuts.push(shortcut.into());
        self
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Navigable modes: handles every navigation, replacing the
    /// external/local split.
    #[must_use]
    pub fn on_navigation<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(NavigationContext) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        self.hooks.on_navigation = Some(hook(f));
        self
    }

    /// Navigable modes: handles items whose URL is external.
    #[must_use]
    pub fn on_external<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(NavigationContext) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        self.hooks.on_external = Some(hook(f));
        self
    }

    /// Navigable modes: handles items whose URL is local.
    #[must_use]
    pub fn on_local<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(NavigationContext) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        self.hooks.on_local = Some(hook(f));
        self
    }

    /// Searchable modes: handles a resolved item's data.
    #[must_use]
    pub fn on_selection<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(SelectionContext) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        self.hooks.on_selection = Some(hook(f));
        self
    }

    /// Checks the options and applies defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::Configuration`] when no search mapping is
    /// given, `sort_by` is an empty key list, both a key list and a sort
    /// function are given, hooks belong to another item type, or the item
    /// type is unknown. Returns [`PaletteError::InvalidConfig`] for an
    /// unknown empty-query mode.
    pub fn validate(self, name: &str, default_close: CloseAction) -> Result<ModeConfig> {
        let invalid = |reason: &str| {
            PaletteError::Configuration(format!("mode {name:?}: {reason}"))
        };

        let item_type = match self.item_type.resolve() {
            Ok(item_type) => item_type,
            Err(PaletteError::Configuration(reason)) => return Err(invalid(&reason)),
            Err(err) => return Err(err),
        };
        let empty_mode = self.empty_mode.resolve()?;

        let map_to_search = match (self.map_to_search, self.search_fields.is_empty()) {
            (Some(map), _) => MapToSearch::Custom(map),
            (None, false) => MapToSearch::Fields(self.search_fields),
            (None, true) => return Err(invalid("map_to_search or search_fields is required")),
        };

        let sort = match (self.sort_by, self.sort_fn) {
            (Some(_), Some(_)) => {
                return Err(invalid("sort_by takes either a key list or a function, not both"))
            }
            (Some(keys), None) if keys.is_empty() => {
                return Err(invalid("sort_by key list must not be empty"))
            }
            (Some(keys), None) => SortStrategy::ByKeys(keys),
            (None, Some(sort)) => SortStrategy::Custom(sort),
            (None, None) => SortStrategy::BySearchKey,
        };

        let hooks = &self.hooks;
        match item_type {
            ItemType::Actionable
                if hooks.navigation_hooks_set() || hooks.on_selection.is_some() =>
            {
                return Err(invalid("actionable modes take no mode-level hooks"));
            }
            ItemType::Navigable if hooks.on_selection.is_some() => {
                return Err(invalid("on_selection belongs to searchable modes"));
            }
            ItemType::Searchable if hooks.navigation_hooks_set() => {
                return Err(invalid("navigation hooks belong to navigable modes"));
            }
            _ => {}
        }

        Ok(ModeConfig {
            item_type,
            prefix: self.prefix,
            map_to_search,
            sort,
            sort_mode: self.sort_mode,
            empty_mode,
            close_action: self.close_action.unwrap_or(default_close),
            open_action: self.open_action,
            update_action: self.update_action,
            shortcuts: self.shortcuts,
            placeholder: self.placeholder,
            hooks: self.hooks,
        })
    }
}

impl fmt::Debug for ModeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeOptions")
            .field("item_type", &self.item_type)
            .field("prefix", &self.prefix)
            .field("search_fields", &self.search_fields)
            .field("sort_by", &self.sort_by)
            .field("sort_mode", &self.sort_mode)
            .field("empty_mode", &self.empty_mode)
            .field("close_action", &self.close_action)
            .field("shortcuts", &self.shortcuts)
            .finish_non_exhaustive()
    }
}

/// Validated, immutable configuration of a mode.
#[derive(Clone)]
pub struct ModeConfig {
    /// Variant every item of the mode has.
    pub item_type: ItemType,
    /// Input prefix that routes text to this mode; unique per palette.
    pub prefix: String,
    /// Text each item is searched and sorted by.
    pub map_to_search: MapToSearch,
    /// Strategy ordering the sorted view and search results.
    pub sort: SortStrategy,
    pub sort_mode: SortMode,
    /// What an empty query shows.
    pub empty_mode: EmptyMode,
    /// Mode value, else the palette-level default.
    pub close_action: CloseAction,
    pub open_action: OpenAction,
    pub update_action: UpdateAction,
    /// Shortcuts opening the palette on this mode.
    pub shortcuts: Vec<String>,
    /// Placeholder shown while the mode is active.
    pub placeholder: Option<String>,
    pub(crate) hooks: VariantHooks,
}

impl fmt::Debug for ModeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeConfig")
            .field("item_type", &self.item_type)
            .field("prefix", &self.prefix)
            .field("map_to_search", &self.map_to_search)
            .field("sort", &self.sort)
            .field("sort_mode", &self.sort_mode)
            .field("empty_mode", &self.empty_mode)
            .field("close_action", &self.close_action)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(options: ModeOptions) -> Result<ModeConfig> {
        options.validate("test", CloseAction::ResetClose)
    }

    #[test]
    fn defaults_are_applied() {
        let options = ModeOptions::new(ItemType::Actionable, "").search_fields(["name"]);
        let config = validate(options).unwrap();
        assert_eq!(config.sort_mode, SortMode::Sorted);
        assert_eq!(config.empty_mode, EmptyMode::All);
        assert_eq!(config.close_action, CloseAction::ResetClose);
        assert!(matches!(config.sort, SortStrategy::BySearchKey));
    }

    #[test]
    fn search_mapping_is_required() {
        let err = validate(ModeOptions::new(ItemType::Actionable, "")).unwrap_err();
        assert!(matches!(err, PaletteError::Configuration(_)));
    }

    #[test]
    fn empty_sort_keys_are_rejected() {
        let options = ModeOptions::new(ItemType::Actionable, "")
            .search_fields(["name"])
            .sort_by_keys(Vec::<String>::new());
        assert!(matches!(validate(options), Err(PaletteError::Configuration(_))));
    }

    #[test]
    fn sort_keys_and_function_are_exclusive() {
        let options = ModeOptions::new(ItemType::Actionable, "")
            .search_fields(["name"])
            .sort_by_keys(["name"])
            .sort_by(|items| items.reverse());
        assert!(matches!(validate(options), Err(PaletteError::Configuration(_))));
    }

    #[test]
    fn hooks_must_match_item_type() {
        let options = ModeOptions::new(ItemType::Actionable, "")
            .search_fields(["name"])
            .on_local(|_| async { Ok(()) });
        assert!(matches!(validate(options), Err(PaletteError::Configuration(_))));

        let options = ModeOptions::new(ItemType::Navigable, "/")
            .search_fields(["name"])
            .on_external(|_| async { Ok(()) });
        assert!(validate(options).is_ok());
    }

    #[test]
    fn unknown_policy_text_fails_validation() {
        let mut options = ModeOptions::new(ItemType::Searchable, "").search_fields(["name"]);
        options.item_type = Declared::Text("widget".to_string());
        assert!(options.item_type().is_none());
        let err = validate(options).unwrap_err();
        assert!(matches!(
            err,
            PaletteError::Configuration(ref reason) if reason.contains("widget")
        ));

        let mut options = ModeOptions::new(ItemType::Searchable, "").search_fields(["name"]);
        options.empty_mode = Declared::Text("recent".to_string());
        assert!(matches!(validate(options), Err(PaletteError::InvalidConfig(_))));

        let mut options = ModeOptions::new(ItemType::Searchable, "").search_fields(["name"]);
        options.empty_mode = Declared::Text("History".to_string());
        assert_eq!(validate(options).unwrap().empty_mode, EmptyMode::History);
    }

    #[test]
    fn empty_mode_parses_known_values_only() {
        assert_eq!("History".parse::<EmptyMode>().unwrap(), EmptyMode::History);
        assert!(matches!(
            "recent".parse::<EmptyMode>(),
            Err(PaletteError::InvalidConfig(_))
        ));
    }
}
