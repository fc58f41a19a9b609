//! Paletta: a command palette engine.
//!
//! Paletta holds the state and behavior behind a command palette and leaves
//! rendering to the host:
//! - Prefix-scoped modes (`""` for files, `">"` for commands, ...) with
//!   implicit switching as the user types
//! - Fuzzy search with per-mode sorting and empty-query policies
//! - Cyclic keyboard selection, submit and click resolution
//! - Actionable, navigable and searchable items with async hooks
//! - Item and palette shortcuts through a pluggable key binding service
//! - Observable state for hosts to render from

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! The crate follows a layered architecture pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Host (UI, event loop, executor)                    │  ← Host-owned
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← Palette
//! │  - Controller and event dispatch                    │
//! │  - Registry, selection, debounce                    │
//! │  - Item resolution                                  │
//! │  - Observable signals                               │
//! └─────────────────────────────────────────────────────┘
//!         │                                     │
//! ┌───────────────────────────┐   ┌───────────────────────────┐
//! │ Mode Layer (mode/)        │   │ Infrastructure            │
//! │ - Options and validation  │   │ (infrastructure/)         │
//! │ - Sort strategies         │   │ - Key binding service     │
//! │ - Fuzzy searcher          │   │ - Observable values       │
//! └───────────────────────────┘   └───────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain Layer (domain/)                             │
//! │  - Items and close policies                         │
//! │  - Hook contexts                                    │
//! │  - Error types                                      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: The [`Palette`] controller, registry, resolution and events
//! - [`mode`]: Mode options, sorting and the search capability
//! - [`domain`]: Items, hooks and errors
//! - [`infrastructure`]: Key bindings and observables
//! - [`observability`]: Tracing subscriber setup
//!
//! # Configuration
//!
//! Data options load from TOML; hooks and custom functions are attached in
//! code afterwards:
//!
//! ```toml
//! debounce = 50
//! close_on_escape = true
//!
//! [defaults]
//! placeholder = "Search files, > for commands"
//!
//! [modes.files]
//! type = "searchable"
//! prefix = ""
//! search_fields = ["name", "path"]
//!
//! [modes.commands]
//! type = "actionable"
//! prefix = ">"
//! search_fields = ["name", "category"]
//! sort_by = ["category", "name"]
//! shortcuts = ["ctrl+shift+p"]
//! ```
//!
//! # Example
//!
//! ```rust
//! use futures::executor::{block_on, LocalPool};
//! use paletta::{
//!     Actionable, Config, Item, ItemType, Keymap, ModeOptions, Palette, RegisterOptions,
//!     Resolution,
//! };
//! use std::rc::Rc;
//!
//! let config = Config::new()
//!     .mode("files", ModeOptions::new(ItemType::Actionable, "").search_fields(["name"]))
//!     .mode("commands", ModeOptions::new(ItemType::Actionable, ">").search_fields(["name"]));
//!
//! let pool = LocalPool::new();
//! let palette = Palette::new(&config, Rc::new(Keymap::new()), Rc::new(pool.spawner()))?;
//!
//! let save = Actionable::new(|ctx| async move {
//!     println!("saving via {}", ctx.source);
//!     Ok(())
//! });
//! let save = Item::new("save", "Save All", save);
//! palette.register_item("commands", [save], RegisterOptions::default())?;
//!
//! palette.open_palette(None)?;
//! palette.search(">save");
//! assert_eq!(block_on(palette.submit())?, Some(Resolution::Completed));
//! assert!(!palette.is_open());
//! # Ok::<(), paletta::PaletteError>(())
//! ```
//!
//! # Key Design Decisions
//!
//! ## Single-Threaded State
//!
//! A palette lives on one thread, like the UI it drives:
//! - State sits in one `RefCell`, never borrowed across host code
//! - Hooks return `LocalBoxFuture`s awaited in order within a resolution
//! - Shortcut-triggered resolutions are spawned on a host `LocalSpawn`
//!
//! ## Host-Driven Time
//!
//! Debouncing never starts a timer. Input is stamped with the host's clock
//! and [`Palette::tick`] runs whatever is due, which keeps the engine
//! executor-agnostic and deterministic under test.
//!
//! ## RAII Teardown
//!
//! Key bindings and subscriptions are handles that release themselves on
//! drop, so unregistering an item, reverting a registration or dropping the
//! palette cannot leak a shortcut.

pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod mode;

pub mod observability;

pub use app::{
    handle_event, Event, Matcher, ModeSignals, Palette, RegisterOptions, Registration, Resolution,
    Selection, Signals,
};
pub use domain::{
    ActionContext, Actionable, CloseOn, Item, ItemId, ItemKind, ItemType, NavigationContext,
    Navigable, PaletteError, Request, RequestContext, ResolutionError, Result, Searchable,
    SelectionContext, Source,
};
pub use infrastructure::{
    KeyBinding, KeyBindings, KeyHandler, Keymap, Observable, Subscription, DEFAULT_SCOPE,
};
pub use mode::{
    fuzzy_factory, CloseAction, EmptyMode, MapToSearch, Mode, ModeOptions, OpenAction, Searcher,
    SearcherFactory, SortMode, UpdateAction,
};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Initial palette state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Whether the palette starts open. Default: `false`
    pub open: bool,

    /// Initial query, appended to the starting mode's prefix.
    pub search: String,

    /// Placeholder for modes that do not set their own.
    pub placeholder: Option<String>,

    /// Starting mode. Default: the mode with the empty prefix.
    pub mode: Option<String>,

    /// Host element ids (input, list, ...) keyed by role.
    pub ids: BTreeMap<String, String>,
}

/// Shortcuts the palette binds for its own navigation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Default: `["down", "ctrl+n"]`
    pub next: Vec<String>,

    /// Default: `["up", "ctrl+p"]`
    pub previous: Vec<String>,

    /// Default: `["enter"]`
    pub submit: Vec<String>,

    /// Bound only with `close_on_escape`. Default: `["escape"]`
    pub close: Vec<String>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            next: vec!["down".to_string(), "ctrl+n".to_string()],
            previous: vec!["up".to_string(), "ctrl+p".to_string()],
            submit: vec!["enter".to_string()],
            close: vec!["escape".to_string()],
        }
    }
}

/// Palette configuration.
///
/// Deserializes from TOML (see [`Config::from_toml_str`]); modes keep the
/// order they are written in. Functions (search mappings, custom sorts,
/// hooks, a custom searcher) are attached in code.
///
/// # Example
///
/// ```rust
/// use paletta::{Config, ItemType, ModeOptions};
///
/// let mut config = Config::from_toml_str(r#"
///     debounce = 120
///
///     [modes.files]
///     type = "searchable"
///     prefix = ""
///     search_fields = ["name"]
/// "#)?;
///
/// config.configure_mode("files", |files| files.on_selection(|_ctx| async { Ok(()) }))?;
/// let commands = ModeOptions::new(ItemType::Actionable, ">").search_fields(["name"]);
/// let config = config.mode("commands", commands);
///
/// assert_eq!(config.debounce, 120);
/// assert_eq!(config.modes[1].0, "commands");
/// # Ok::<(), paletta::PaletteError>(())
/// ```
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Close when the host reports a click outside. Default: `true`
    pub close_on_click_outside: bool,

    /// Bind the close shortcut and honor escape events. Default: `true`
    pub close_on_escape: bool,

    /// Reset input and `current` every time the palette opens. Default: `false`
    pub reset_on_open: bool,

    /// Debounce delay for typed input in milliseconds; zero or negative
    /// runs every keystroke immediately. Default: `0`
    pub debounce: i64,

    /// Close action for modes that do not set one. Default: `reset_close`
    pub close_action: CloseAction,

    pub defaults: Defaults,

    /// Modes in registration order. One must use the empty prefix.
    #[serde(deserialize_with = "ordered_modes")]
    pub modes: Vec<(String, ModeOptions)>,

    /// Host element the palette renders into.
    pub portal: Option<String>,

    pub keys: KeyConfig,

    /// Tracing level for [`observability::init_tracing`].
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,

    /// Builds each mode's searcher. Default: [`fuzzy_factory`]
    #[serde(skip)]
    pub searcher: Option<SearcherFactory>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            close_on_click_outside: true,
            close_on_escape: true,
            reset_on_open: false,
            debounce: 0,
            close_action: CloseAction::ResetClose,
            defaults: Defaults::default(),
            modes: Vec::new(),
            portal: None,
            keys: KeyConfig::default(),
            trace_level: None,
            searcher: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a mode.
    #[must_use]
    pub fn mode(mut self, name: impl Into<String>, options: ModeOptions) -> Self {
        self.modes.push((name.into(), options));
        self
    }

    /// Rewrites a mode's options in place, typically to attach hooks to a
    /// mode loaded from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::UnknownMode`] if no mode has that name.
    pub fn configure_mode(
        &mut self,
        name: &str,
        configure: impl FnOnce(ModeOptions) -> ModeOptions,
    ) -> Result<()> {
        let slot = self
            .modes
            .iter_mut()
            .find(|(mode, _)| mode == name)
            .map(|(_, options)| options)
            .ok_or_else(|| PaletteError::UnknownMode(name.to_string()))?;
        *slot = configure(slot.clone());
        Ok(())
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::Parse`] for invalid TOML or a document that
    /// does not match the configuration schema.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        tracing::debug!(modes = config.modes.len(), "configuration parsed");
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::Io`] if the file cannot be read and
    /// [`PaletteError::Parse`] if it is not a valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading configuration");
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("close_on_click_outside", &self.close_on_click_outside)
            .field("close_on_escape", &self.close_on_escape)
            .field("reset_on_open", &self.reset_on_open)
            .field("debounce", &self.debounce)
            .field("close_action", &self.close_action)
            .field("defaults", &self.defaults)
            .field("modes", &self.modes)
            .field("portal", &self.portal)
            .field("keys", &self.keys)
            .field("trace_level", &self.trace_level)
            .field("searcher", &self.searcher.as_ref().map(|_| ".."))
            .finish()
    }
}

fn ordered_modes<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<(String, ModeOptions)>, D::Error>
where
    D: Deserializer<'de>,
{
    let modes = IndexMap::<String, ModeOptions>::deserialize(deserializer)?;
    Ok(modes.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documentation() {
        let config = Config::default();
        assert!(config.close_on_click_outside);
        assert!(config.close_on_escape);
        assert!(!config.reset_on_open);
        assert_eq!(config.debounce, 0);
        assert_eq!(config.close_action, CloseAction::ResetClose);
        assert_eq!(config.keys.submit, ["enter"]);
    }

    #[test]
    fn toml_modes_keep_document_order() {
        let config = Config::from_toml_str(
            r#"
            close_on_click_outside = false
            close_action = "keep_close"

            [defaults]
            open = true
            ids = { input = "palette-input" }

            [modes.zeta]
            type = "navigable"
            prefix = "/"
            search_fields = ["name", "url"]

            [modes.alpha]
            type = "actionable"
            prefix = ""
            search_fields = ["name"]
            sort_by = ["category", "name"]
            empty_mode = "history"
            "#,
        )
        .unwrap();

        assert!(!config.close_on_click_outside);
        assert_eq!(config.close_action, CloseAction::KeepClose);
        assert!(config.defaults.open);
        assert_eq!(config.defaults.ids["input"], "palette-input");
        let names: Vec<&str> = config.modes.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha"]);
        assert_eq!(config.modes[1].1.item_type(), Some(ItemType::Actionable));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::from_toml_str("debounce = \"soon\"").unwrap_err();
        assert!(matches!(err, PaletteError::Parse(_)));
    }

    #[test]
    fn unknown_policy_values_fail_validation_not_parsing() {
        let config = Config::from_toml_str(
            r#"
            [modes.files]
            type = "widget"
            prefix = ""
            search_fields = ["name"]

            [modes.commands]
            type = "actionable"
            prefix = ">"
            search_fields = ["name"]
            empty_mode = "recent"
            "#,
        )
        .unwrap();

        let (name, files) = config.modes[0].clone();
        assert!(files.item_type().is_none());
        assert!(matches!(
            files.validate(&name, CloseAction::ResetClose),
            Err(PaletteError::Configuration(_))
        ));

        let (name, commands) = config.modes[1].clone();
        assert!(matches!(
            commands.validate(&name, CloseAction::ResetClose),
            Err(PaletteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn configure_unknown_mode_fails() {
        let mut config = Config::new();
        assert!(matches!(
            config.configure_mode("nope", |options| options),
            Err(PaletteError::UnknownMode(_))
        ));
    }
}
