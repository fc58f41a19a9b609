//! The palette controller.
//!
//! [`Palette`] owns the mode registry and the session state (open flag,
//! active mode, search text, selection, last error) and exposes every public
//! operation. It is a cheap, clonable handle; clones drive the same palette.
//!
//! # State discipline
//!
//! All state lives in one `RefCell`. Operations borrow it, mutate, release it
//! and only then publish to the observables or call host code (hooks,
//! `on_unregister`, `on_error`, key binding services). Host code may therefore
//! call back into the palette freely.

use super::debounce::Debouncer;
use super::registry::{Matcher, RegisterOptions, Registry};
use super::selection::Selection;
use super::signals::{ModeView, Signals, Snapshot};
use crate::domain::error::{PaletteError, Result};
use crate::domain::{Item, ItemId, ItemKind, ResolutionError, Source};
use crate::infrastructure::{KeyBinding, KeyBindings, KeyHandler, Subscription, DEFAULT_SCOPE};
use crate::mode::{fuzzy_factory, Entry, Mode, OpenAction, UpdateAction};
use crate::{Config, KeyConfig};
use futures_util::task::{LocalSpawn, LocalSpawnExt};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Instant;

/// Session state guarded by the palette's `RefCell`.
pub(crate) struct PaletteState {
    pub(crate) registry: Registry,
    pub(crate) active: String,
    pub(crate) open: bool,
    pub(crate) search_text: String,
    pub(crate) selection: Selection,
    pub(crate) error: Option<ResolutionError>,
    pub(crate) placeholder: Option<String>,
    default_placeholder: Option<String>,
    debouncer: Debouncer,
    palette_bindings: Vec<KeyBinding>,
}

impl PaletteState {
    /// Runs the search pipeline for raw input text.
    ///
    /// Switches to the mode whose prefix best matches the text first. Text
    /// no mode claims clears the results.
    pub(crate) fn run_pipeline(&mut self, text: &str) {
        self.search_text = text.to_string();

        let target = self.registry.best_match(text).map(|mode| mode.name().to_string());
        let Some(target) = target else {
            tracing::debug!("no mode claims the input, clearing results");
            if let Ok(mode) = self.registry.get_mut(&self.active) {
                mode.results.clear();
            }
            self.selection.clear();
            return;
        };
        if target != self.active {
            self.switch_mode(target);
        }

        if let Ok(mode) = self.registry.get_mut(&self.active) {
            let results = mode.query(text);
            self.selection.reset(&results);
            mode.results = results;
        }
    }

    fn switch_mode(&mut self, name: String) {
        tracing::debug!(from = %self.active, to = %name, "switching mode");
        self.placeholder = self
            .registry
            .get(&name)
            .ok()
            .and_then(|mode| mode.config().placeholder.clone())
            .or_else(|| self.default_placeholder.clone());
        self.active = name;
    }

    /// Applies the mode's close action. Leaves `current` alone.
    ///
    /// The input belongs to the active mode: for any other mode (an item
    /// shortcut fired from elsewhere) only the open flag is affected.
    pub(crate) fn resolve_close(&mut self, mode_name: &str) {
        let active = mode_name == self.active;
        let Ok(mode) = self.registry.get_mut(mode_name) else {
            return;
        };
        let action = mode.config().close_action;
        let prefix = mode.prefix().to_string();
        if active {
            mode.last_input = self.search_text.clone();
        }

        tracing::debug!(mode = %mode_name, ?action, active, "resolving close");
        if action.closes() {
            self.open = false;
        }
        if !active {
            return;
        }
        if action.resets() {
            self.debouncer.cancel();
            self.run_pipeline(&prefix);
        }
    }

    /// Records a finished resolution: history, optional close, no current.
    pub(crate) fn finish(&mut self, mode_name: &str, item: &Item, close: bool) {
        if let Ok(mode) = self.registry.get_mut(mode_name) {
            mode.push_history(item.id());
        }
        if close {
            self.resolve_close(mode_name);
        }
        self.clear_current(mode_name);
    }

    pub(crate) fn push_history(&mut self, mode_name: &str, item: &Item) {
        if let Ok(mode) = self.registry.get_mut(mode_name) {
            mode.push_history(item.id());
        }
    }

    pub(crate) fn set_current(&mut self, mode_name: &str, item: Option<Item>) {
        if let Ok(mode) = self.registry.get_mut(mode_name) {
            mode.current = item;
        }
    }

    pub(crate) fn clear_current(&mut self, mode_name: &str) {
        self.set_current(mode_name, None);
    }

    /// Reruns the pipeline if `mode_name` is visible and wants refreshes.
    fn refresh(&mut self, mode_name: &str) {
        let refreshes = self
            .registry
            .get(mode_name)
            .map_or(false, |mode| mode.config().update_action == UpdateAction::Refresh);
        if self.open && self.active == mode_name && refreshes {
            let text = self.search_text.clone();
            self.run_pipeline(&text);
        }
    }

    fn active_mode(&self) -> Result<&Mode> {
        self.registry.get(&self.active)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            open: self.open,
            active: self.active.clone(),
            search_text: self.search_text.clone(),
            selection: self.selection.clone(),
            placeholder: self.placeholder.clone(),
            error: self.error.clone(),
            modes: self
                .registry
                .modes()
                .iter()
                .map(|mode| ModeView {
                    name: mode.name().to_string(),
                    items: mode.sorted_items().to_vec(),
                    results: mode.results().to_vec(),
                    history: mode.history().to_vec(),
                    current: mode.current().cloned(),
                })
                .collect(),
        }
    }
}

struct Settings {
    close_on_click_outside: bool,
    close_on_escape: bool,
    reset_on_open: bool,
    keys: KeyConfig,
    ids: BTreeMap<String, String>,
}

pub(crate) struct Inner {
    pub(crate) state: RefCell<PaletteState>,
    pub(crate) signals: Signals,
    pub(crate) busy: RefCell<HashSet<String>>,
    keys: Rc<dyn KeyBindings>,
    spawner: Rc<dyn LocalSpawn>,
    settings: Settings,
    watchers: RefCell<Vec<Subscription>>,
    publishing: Cell<bool>,
    dirty: Cell<bool>,
}

/// A command palette.
///
/// # Example
///
/// ```
/// use futures::executor::LocalPool;
/// use paletta::{
///     Actionable, Config, Item, ItemType, Keymap, ModeOptions, Palette, RegisterOptions,
/// };
/// use std::rc::Rc;
///
/// let config = Config::new()
///     .mode("files", ModeOptions::new(ItemType::Actionable, "").search_fields(["name"]))
///     .mode("commands", ModeOptions::new(ItemType::Actionable, ">").search_fields(["name"]));
///
/// let pool = LocalPool::new();
/// let palette = Palette::new(&config, Rc::new(Keymap::new()), Rc::new(pool.spawner()))?;
///
/// let reload = Item::new("reload", "Reload Window", Actionable::new(|_| async { Ok(()) }));
/// palette.register_item("commands", [reload], RegisterOptions::default())?;
///
/// palette.open_palette(None)?;
/// palette.search(">reload");
/// assert_eq!(palette.active_mode(), "commands");
/// assert_eq!(palette.results().len(), 1);
/// # Ok::<(), paletta::PaletteError>(())
/// ```
#[derive(Clone)]
pub struct Palette {
    pub(crate) inner: Rc<Inner>,
}

impl Palette {
    /// Builds a palette from its configuration.
    ///
    /// `keys` binds every shortcut the palette needs; `spawner` runs the
    /// resolutions shortcuts start.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::Configuration`] for an invalid mode set and
    /// [`PaletteError::UnknownMode`] when `defaults.mode` names no mode.
    pub fn new(
        config: &Config,
        keys: Rc<dyn KeyBindings>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Result<Self> {
        let _span = tracing::debug_span!("palette_init", modes = config.modes.len()).entered();

        let factory = config.searcher.clone().unwrap_or_else(fuzzy_factory);
        let registry = Registry::from_config(&config.modes, config.close_action, &factory)?;
        let active = match &config.defaults.mode {
            Some(name) => registry.get(name)?,
            None => registry.best_match("").ok_or_else(|| {
                PaletteError::Configuration("one mode must use the empty prefix".to_string())
            })?,
        };
        let (active, prefix) = (active.name().to_string(), active.prefix().to_string());
        let signals = Signals::new(registry.modes().iter().map(Mode::name), config.portal.clone());

        let mut state = PaletteState {
            registry,
            active: String::new(),
            open: config.defaults.open,
            search_text: String::new(),
            selection: Selection::default(),
            error: None,
            placeholder: None,
            default_placeholder: config.defaults.placeholder.clone(),
            debouncer: Debouncer::new(config.debounce),
            palette_bindings: Vec::new(),
        };
        state.switch_mode(active);
        state.run_pipeline(&format!("{prefix}{}", config.defaults.search));

        let palette = Self {
            inner: Rc::new(Inner {
                state: RefCell::new(state),
                signals,
                busy: RefCell::new(HashSet::new()),
                keys,
                spawner,
                settings: Settings {
                    close_on_click_outside: config.close_on_click_outside,
                    close_on_escape: config.close_on_escape,
                    reset_on_open: config.reset_on_open,
                    keys: config.keys.clone(),
                    ids: config.defaults.ids.clone(),
                },
                watchers: RefCell::new(Vec::new()),
                publishing: Cell::new(false),
                dirty: Cell::new(false),
            }),
        };
        palette.publish();
        palette.watch_signals();

        tracing::debug!(active = %palette.active_mode(), open = palette.is_open(), "palette ready");
        Ok(palette)
    }

    pub(crate) fn upgrade(inner: &Weak<Inner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    /// Follows host writes to the `open` and `placeholder` observables.
    fn watch_signals(&self) {
        let weak = Rc::downgrade(&self.inner);
        let open = self.inner.signals.open.subscribe(move |open: &bool| {
            if let Some(palette) = Self::upgrade(&weak) {
                palette.follow_open(*open);
            }
        });

        let weak = Rc::downgrade(&self.inner);
        let placeholder = self
            .inner
            .signals
            .placeholder
            .subscribe(move |placeholder: &Option<String>| {
                if let Some(palette) = Self::upgrade(&weak) {
                    if let Ok(mut state) = palette.inner.state.try_borrow_mut() {
                        state.placeholder = placeholder.clone();
                    }
                }
            });

        self.inner.watchers.borrow_mut().extend([open, placeholder]);
    }

    fn follow_open(&self, open: bool) {
        let is_open = match self.inner.state.try_borrow() {
            Ok(state) => state.open,
            Err(_) => return,
        };
        if open == is_open {
            return;
        }
        tracing::debug!(open, "open flag set externally");
        if open {
            if let Err(err) = self.open_palette(None) {
                tracing::warn!(error = %err, "failed to open palette");
            }
        } else {
            self.close_palette();
        }
    }

    /// Mirrors the current state into the observables.
    ///
    /// Nested calls from subscribers are coalesced into one more round.
    pub(crate) fn publish(&self) {
        if self.inner.publishing.replace(true) {
            self.inner.dirty.set(true);
            return;
        }
        loop {
            let snapshot = match self.inner.state.try_borrow() {
                Ok(state) => state.snapshot(),
                Err(_) => {
                    tracing::warn!("palette state busy, skipping publish");
                    break;
                }
            };
            self.inner.signals.publish(snapshot);
            if !self.inner.dirty.replace(false) {
                break;
            }
        }
        self.inner.publishing.set(false);
    }

    pub(crate) fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        if let Err(err) = self.inner.spawner.spawn_local(task) {
            tracing::warn!(error = %err, "failed to spawn palette task");
        }
    }

    /// Registers items in a mode.
    ///
    /// New items are appended and indexed and their shortcuts bound. See
    /// [`RegisterOptions`] for how existing ids are treated. The returned
    /// [`Registration`] can undo the additions.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::UnknownMode`] for an unknown mode and
    /// [`PaletteError::DuplicateId`] for a duplicate when not silent; the
    /// palette is unchanged in both cases.
    pub fn register_item<I>(
        &self,
        mode: &str,
        items: I,
        options: RegisterOptions,
    ) -> Result<Registration>
    where
        I: IntoIterator<Item = Item>,
    {
        let registered = self
            .inner
            .state
            .borrow_mut()
            .registry
            .register(mode, items.into_iter().collect(), options)?;

        for entry in registered.displaced {
            release_entry(entry);
        }
        for item in registered.added.iter().chain(&registered.replacing) {
            let bindings = self.bind_item(item);
            if bindings.is_empty() {
                continue;
            }
            let leftover = {
                let mut state = self.inner.state.borrow_mut();
                match state.registry.get_mut(mode) {
                    Ok(mode) => mode.attach_bindings(item, bindings),
                    Err(_) => Some(bindings),
                }
            };
            drop(leftover);
        }

        self.inner.state.borrow_mut().refresh(mode);
        self.publish();

        Ok(Registration {
            palette: Rc::downgrade(&self.inner),
            mode: mode.to_string(),
            added: registered.added,
        })
    }

    fn bind_item(&self, item: &Item) -> Vec<KeyBinding> {
        item.shortcuts()
            .iter()
            .map(|shortcut| {
                let weak = Rc::downgrade(&self.inner);
                let (id, source) = (item.id().clone(), Source::Shortcut(shortcut.clone()));
                let handler: KeyHandler = Rc::new(move |_: &str| {
                    if let Some(palette) = Self::upgrade(&weak) {
                        palette.spawn_trigger(id.clone(), source.clone());
                    }
                });
                self.inner.keys.bind(DEFAULT_SCOPE, shortcut, handler)
            })
            .collect()
    }

    fn spawn_trigger(&self, id: ItemId, source: Source) {
        let palette = self.clone();
        self.spawn(async move {
            if let Err(err) = palette.trigger(id.clone(), source).await {
                tracing::warn!(id = %id, error = %err, "shortcut resolution failed");
            }
        });
    }

    /// Unregisters the items the matchers select, returning how many were
    /// removed.
    ///
    /// Removed items lose their shortcuts and their `on_unregister` runs.
    /// Matching nothing is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::UnknownMode`] for an unknown mode.
    pub fn unregister_item<I, M>(&self, mode: &str, matchers: I) -> Result<usize>
    where
        I: IntoIterator<Item = M>,
        M: Into<Matcher>,
    {
        let items = self.inner.state.borrow().registry.get(mode)?.items();

        let mut targets: Vec<Item> = Vec::new();
        for matcher in matchers {
            let matcher: Matcher = matcher.into();
            for index in matcher.indices(&items) {
                let item = &items[index];
                if !targets.iter().any(|target| target.ptr_eq(item)) {
                    targets.push(item.clone());
                }
            }
        }

        if targets.is_empty() {
            tracing::debug!(mode = %mode, "unregister matched nothing");
            return Ok(0);
        }
        self.remove_items(mode, &targets)
    }

    fn remove_items(&self, mode: &str, items: &[Item]) -> Result<usize> {
        let removed = {
            let mut state = self.inner.state.borrow_mut();
            let removed = state.registry.remove(mode, items)?;
            if !removed.is_empty() {
                state.refresh(mode);
            }
            removed
        };

        let count = removed.len();
        for entry in removed {
            release_entry(entry);
        }
        if count > 0 {
            self.publish();
        }
        Ok(count)
    }

    /// Reports input text typed at `now`. The pipeline runs immediately or
    /// once the debounce delay has passed (see [`tick`](Self::tick)).
    pub fn input_at(&self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        tracing::trace!(len = text.len(), "input");
        {
            let mut state = self.inner.state.borrow_mut();
            state.search_text = text.clone();
            if let Some(text) = state.debouncer.schedule(text, now) {
                state.run_pipeline(&text);
            }
        }
        self.publish();
    }

    pub fn input(&self, text: impl Into<String>) {
        self.input_at(text, Instant::now());
    }

    /// Runs a debounced pipeline whose deadline has passed. Returns whether
    /// one ran.
    pub fn tick(&self, now: Instant) -> bool {
        let ran = {
            let mut state = self.inner.state.borrow_mut();
            match state.debouncer.take_due(now) {
                Some(text) => {
                    state.run_pipeline(&text);
                    true
                }
                None => false,
            }
        };
        if ran {
            self.publish();
        }
        ran
    }

    /// Deadline of the pending debounced pipeline, if any.
    #[must_use]
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.inner.state.borrow().debouncer.deadline()
    }

    /// Trims `pattern` and runs the pipeline on it now, dropping any pending
    /// debounced input.
    pub fn search(&self, pattern: &str) {
        {
            let mut state = self.inner.state.borrow_mut();
            state.debouncer.cancel();
            state.run_pipeline(pattern.trim());
        }
        self.publish();
    }

    /// Opens the palette, optionally on another mode.
    ///
    /// Opening on a different mode starts from that mode's prefix. With
    /// `reset_on_open` (or the mode's `open_action = reset`) the input is
    /// reset and `current` cleared; otherwise the search text is kept. The
    /// results are recomputed either way.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::UnknownMode`] if `mode` names no mode.
    pub fn open_palette(&self, mode: Option<&str>) -> Result<()> {
        {
            let mut state = self.inner.state.borrow_mut();
            let target = mode.map_or_else(|| state.active.clone(), str::to_string);
            let (prefix, open_action) = {
                let mode = state.registry.get(&target)?;
                (mode.prefix().to_string(), mode.config().open_action)
            };
            let switching = target != state.active;
            let reset = self.inner.settings.reset_on_open || open_action == OpenAction::Reset;

            tracing::debug!(mode = %target, switching, reset, "opening palette");
            state.open = true;
            if reset {
                state.clear_current(&target);
            }
            let text = if switching || reset {
                prefix
            } else {
                state.search_text.clone()
            };
            state.debouncer.cancel();
            state.run_pipeline(&text);
        }
        self.publish();
        Ok(())
    }

    /// Closes the palette and applies the active mode's close action.
    /// No-op when already closed.
    pub fn close_palette(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if !state.open {
                return;
            }
            tracing::debug!("closing palette");
            state.open = false;
            let active = state.active.clone();
            state.resolve_close(&active);
        }
        self.publish();
    }

    /// # Errors
    ///
    /// Never fails in practice: opening targets the active mode.
    pub fn toggle_palette(&self) -> Result<()> {
        if self.is_open() {
            self.close_palette();
            Ok(())
        } else {
            self.open_palette(None)
        }
    }

    /// Closes the palette if `close_on_click_outside` is set.
    pub fn click_outside(&self) {
        if self.inner.settings.close_on_click_outside {
            self.close_palette();
        }
    }

    /// Closes the palette if `close_on_escape` is set.
    pub fn escape(&self) {
        if self.inner.settings.close_on_escape {
            self.close_palette();
        }
    }

    /// Moves the selection down by one result, wrapping to the top.
    ///
    /// Called by the `next` palette shortcut. No-op without results.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use futures::executor::LocalPool;
    /// # use paletta::{Config, ItemType, Keymap, ModeOptions, Palette};
    /// # use std::rc::Rc;
    /// # let config = Config::new()
    /// #     .mode("files", ModeOptions::new(ItemType::Searchable, "").search_fields(["name"]));
    /// # let pool = LocalPool::new();
    /// # let palette = Palette::new(&config, Rc::new(Keymap::new()), Rc::new(pool.spawner()))?;
    /// palette.select_next();
    /// assert_eq!(palette.selection().index, None);
    /// # Ok::<(), paletta::PaletteError>(())
    /// ```
    pub fn select_next(&self) {
        self.move_selection(Selection::select_next);
    }

    /// Moves the selection up by one result, wrapping to the bottom.
    ///
    /// Called by the `previous` palette shortcut. No-op without results.
    pub fn select_previous(&self) {
        self.move_selection(Selection::select_previous);
    }

    fn move_selection(&self, step: fn(&mut Selection, &[Item])) {
        {
            let mut state = self.inner.state.borrow_mut();
            let state = &mut *state;
            if let Ok(mode) = state.registry.get(&state.active) {
                step(&mut state.selection, mode.results());
            }
        }
        self.publish();
    }

    /// Binds the palette's own shortcuts: each mode's open shortcuts, the
    /// navigation keys and, with `close_on_escape`, the close key.
    ///
    /// Calling it again rebinds from scratch.
    pub fn register_palette_shortcuts(&self) {
        let previous = std::mem::take(&mut self.inner.state.borrow_mut().palette_bindings);
        drop(previous);

        let mode_shortcuts: Vec<(String, Vec<String>)> = self
            .inner
            .state
            .borrow()
            .registry
            .modes()
            .iter()
            .map(|mode| (mode.name().to_string(), mode.config().shortcuts.clone()))
            .collect();

        let mut bindings = Vec::new();
        for (mode, shortcuts) in mode_shortcuts {
            for shortcut in shortcuts {
                let mode = mode.clone();
                bindings.push(self.bind(&shortcut, move |palette| {
                    if let Err(err) = palette.open_palette(Some(&mode)) {
                        tracing::warn!(mode = %mode, error = %err, "failed to open palette");
                    }
                }));
            }
        }

        let keys = &self.inner.settings.keys;
        for shortcut in &keys.next {
            bindings.push(self.bind(shortcut, |palette| {
                if palette.is_open() {
                    palette.select_next();
                }
            }));
        }
        for shortcut in &keys.previous {
            bindings.push(self.bind(shortcut, |palette| {
                if palette.is_open() {
                    palette.select_previous();
                }
            }));
        }
        for shortcut in &keys.submit {
            bindings.push(self.bind(shortcut, |palette| {
                if palette.is_open() {
                    palette.spawn_submit();
                }
            }));
        }
        if self.inner.settings.close_on_escape {
            for shortcut in &keys.close {
                bindings.push(self.bind(shortcut, Self::close_palette));
            }
        }

        tracing::debug!(count = bindings.len(), "palette shortcuts registered");
        self.inner.state.borrow_mut().palette_bindings = bindings;
    }

    /// Releases the bindings made by
    /// [`register_palette_shortcuts`](Self::register_palette_shortcuts).
    pub fn unregister_palette_shortcuts(&self) {
        let bindings = std::mem::take(&mut self.inner.state.borrow_mut().palette_bindings);
        tracing::debug!(count = bindings.len(), "palette shortcuts released");
        drop(bindings);
    }

    fn bind(&self, shortcut: &str, action: impl Fn(&Self) + 'static) -> KeyBinding {
        let weak = Rc::downgrade(&self.inner);
        let handler: KeyHandler = Rc::new(move |_: &str| {
            if let Some(palette) = Self::upgrade(&weak) {
                action(&palette);
            }
        });
        self.inner.keys.bind(DEFAULT_SCOPE, shortcut, handler)
    }

    fn spawn_submit(&self) {
        let palette = self.clone();
        self.spawn(async move {
            if let Err(err) = palette.submit().await {
                tracing::warn!(error = %err, "submit failed");
            }
        });
    }

    /// Releases every binding the palette holds, drops pending debounced
    /// input and stops following the observables. Items stay registered.
    pub fn teardown(&self) {
        let (palette_bindings, item_bindings) = {
            let mut state = self.inner.state.borrow_mut();
            state.debouncer.cancel();
            let palette_bindings = std::mem::take(&mut state.palette_bindings);
            let item_bindings: Vec<KeyBinding> =
                state.registry.modes_mut().flat_map(Mode::take_bindings).collect();
            (palette_bindings, item_bindings)
        };

        tracing::debug!(
            released = palette_bindings.len() + item_bindings.len(),
            "palette torn down"
        );
        drop(palette_bindings);
        drop(item_bindings);
        let watchers = std::mem::take(&mut *self.inner.watchers.borrow_mut());
        drop(watchers);
    }

    /// Returns whether the palette is currently shown.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.state.borrow().open
    }

    /// Returns the name of the mode the input is routed to.
    #[must_use]
    pub fn active_mode(&self) -> String {
        self.inner.state.borrow().active.clone()
    }

    /// Raw input text, prefix included.
    #[must_use]
    pub fn search_text(&self) -> String {
        self.inner.state.borrow().search_text.clone()
    }

    /// Returns the highlighted result of the active mode.
    ///
    /// The index is `None` when the active mode has no results.
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.inner.state.borrow().selection.clone()
    }

    /// Results of the active mode.
    #[must_use]
    pub fn results(&self) -> Vec<Item> {
        let state = self.inner.state.borrow();
        state
            .active_mode()
            .map(|mode| mode.results().to_vec())
            .unwrap_or_default()
    }

    /// The last resolution failure, cleared by the next success.
    #[must_use]
    pub fn error(&self) -> Option<ResolutionError> {
        self.inner.state.borrow().error.clone()
    }

    /// Returns the input placeholder: the active mode's own, else
    /// `defaults.placeholder`, unless the host overrode it through the
    /// `placeholder` observable.
    #[must_use]
    pub fn placeholder(&self) -> Option<String> {
        self.inner.state.borrow().placeholder.clone()
    }

    /// Host element id configured under `defaults.ids`.
    #[must_use]
    pub fn element_id(&self, name: &str) -> Option<&str> {
        self.inner.settings.ids.get(name).map(String::as_str)
    }

    /// Whether a resolution is in flight on `mode`.
    #[must_use]
    pub fn is_busy(&self, mode: &str) -> bool {
        self.inner.busy.borrow().contains(mode)
    }

    /// Reads a mode.
    ///
    /// `f` runs while the palette state is borrowed and must not call
    /// operations that change the palette.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::UnknownMode`] if `name` names no mode.
    pub fn with_mode<R>(&self, name: &str, f: impl FnOnce(&Mode) -> R) -> Result<R> {
        let state = self.inner.state.borrow();
        Ok(f(state.registry.get(name)?))
    }

    /// Returns the observables mirroring this palette.
    ///
    /// Writes to `open` and `placeholder` drive the palette back.
    #[must_use]
    pub fn signals(&self) -> &Signals {
        &self.inner.signals
    }
}

impl fmt::Debug for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Palette")
                .field("open", &state.open)
                .field("active", &state.active)
                .field("search_text", &state.search_text)
                .field("selection", &state.selection)
                .field("registry", &state.registry)
                .finish(),
            Err(_) => f.write_str("Palette { <busy> }"),
        }
    }
}

/// Releases an entry's bindings, then runs its `on_unregister`.
fn release_entry(entry: Entry) {
    let Entry { item, bindings } = entry;
    drop(bindings);
    if let ItemKind::Actionable(action) = item.kind() {
        if let Some(on_unregister) = &action.on_unregister {
            on_unregister(&item);
        }
    }
}

/// Items added by one [`Palette::register_item`] call.
#[derive(Debug)]
pub struct Registration {
    palette: Weak<Inner>,
    mode: String,
    added: Vec<Item>,
}

impl Registration {
    #[must_use]
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Items this call appended. Items that replaced an existing one are
    /// not included.
    #[must_use]
    pub fn added(&self) -> &[Item] {
        &self.added
    }

    /// Unregisters exactly the items this call appended.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::UnknownMode`] only if the mode disappeared,
    /// which the registry never allows.
    pub fn revert(self) -> Result<usize> {
        match Palette::upgrade(&self.palette) {
            Some(palette) => palette.remove_items(&self.mode, &self.added),
            None => Ok(0),
        }
    }
}
