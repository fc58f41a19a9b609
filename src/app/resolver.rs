//! Item resolution: what happens when an item is submitted, clicked or its
//! shortcut fires.
//!
//! Every resolution marks the item as its mode's `current`, closes early for
//! `CloseOn::OnTrigger`, then runs the variant's hooks in order:
//!
//! - **Actionable**: `on_request` may veto; `on_action` runs with the
//!   request's value.
//! - **Navigable**: the mode's `on_navigation`, else `on_external` or
//!   `on_local` depending on the URL.
//! - **Searchable**: the mode's `on_selection`. Without one the item resolves
//!   to [`Resolution::NotImplemented`] and nothing changes.
//!
//! Hook failures never reach the caller. They land in the palette's `error`
//! slot, are handed to the item's `on_error`, and are reported as
//! [`Resolution::Failed`]. A mode resolves one item at a time; a second
//! trigger while one is pending fails with [`PaletteError::Busy`].

use super::controller::{Inner, Palette};
use crate::domain::error::{PaletteError, Result};
use crate::domain::hooks::ErrorHook;
use crate::domain::{
    ActionContext, Actionable, CloseOn, Item, ItemId, ItemKind, NavigationContext, Request,
    RequestContext, ResolutionError, SelectionContext, Source,
};
use serde_json::Value;
use std::rc::{Rc, Weak};
use tracing::Instrument;

/// Outcome of resolving one item.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The hooks ran and succeeded.
    Completed,
    /// The request hook vetoed the action.
    Cancelled,
    /// A hook failed; the failure is also in the palette's `error` slot.
    Failed(ResolutionError),
    /// The item's variant has no resolution wired up.
    NotImplemented,
}

/// Marks a mode busy for as long as it lives.
struct BusyGuard {
    inner: Weak<Inner>,
    mode: String,
}

impl BusyGuard {
    fn acquire(inner: &Rc<Inner>, mode: &str) -> Result<Self> {
        if !inner.busy.borrow_mut().insert(mode.to_string()) {
            return Err(PaletteError::Busy(mode.to_string()));
        }
        Ok(Self {
            inner: Rc::downgrade(inner),
            mode: mode.to_string(),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.busy.borrow_mut().remove(&self.mode);
        }
    }
}

impl Palette {
    /// Resolves the selected result of the active mode, or the first one
    /// when nothing is selected. Returns `None` when there are no results.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::InvalidSelection`] if the selection points
    /// past the results and [`PaletteError::Busy`] if the mode is already
    /// resolving an item.
    pub async fn submit(&self) -> Result<Option<Resolution>> {
        let target = {
            let mut state = self.inner.state.borrow_mut();
            let state = &mut *state;
            let mode = state.registry.get(&state.active)?;
            if mode.results().is_empty() {
                None
            } else {
                let index = state.selection.index.unwrap_or(0);
                let item = state.selection.select(index, mode.results())?;
                Some((mode.name().to_string(), item))
            }
        };

        match target {
            Some((mode, item)) => self.resolve(mode, item, Source::Submit).await.map(Some),
            None => {
                tracing::debug!("submit with no results");
                Ok(None)
            }
        }
    }

    /// Selects and resolves the result at `index` of the active mode.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::InvalidSelection`] if there is no result at
    /// `index` and [`PaletteError::Busy`] if the mode is already resolving
    /// an item.
    pub async fn click(&self, index: usize) -> Result<Resolution> {
        let (mode, item) = {
            let mut state = self.inner.state.borrow_mut();
            let state = &mut *state;
            let mode = state.registry.get(&state.active)?;
            let item = state.selection.select(index, mode.results())?;
            (mode.name().to_string(), item)
        };
        self.publish();
        self.resolve(mode, item, Source::Click).await
    }

    /// Resolves a registered item by id, whatever mode holds it and whether
    /// or not the palette is open.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::UnknownItem`] if no mode holds `id` and
    /// [`PaletteError::Busy`] if its mode is already resolving an item.
    pub async fn trigger(&self, id: impl Into<ItemId>, source: Source) -> Result<Resolution> {
        let id = id.into();
        let (mode, item) = {
            let state = self.inner.state.borrow();
            let (mode, item) = state
                .registry
                .find(&id)
                .ok_or_else(|| PaletteError::UnknownItem(id.clone()))?;
            (mode.name().to_string(), item.clone())
        };
        self.resolve(mode, item, source).await
    }

    async fn resolve(&self, mode: String, item: Item, source: Source) -> Result<Resolution> {
        let span = tracing::debug_span!("resolve",
            mode = %mode,
            item = %item.id(),
            source = %source
        );
        self.resolve_item(mode, item, source).instrument(span).await
    }

    async fn resolve_item(&self, mode: String, item: Item, source: Source) -> Result<Resolution> {
        let hooks = self.inner.state.borrow().registry.get(&mode)?.config().hooks.clone();
        if matches!(item.kind(), ItemKind::Searchable(_)) && hooks.on_selection.is_none() {
            tracing::warn!("mode has no selection hook, searchable item not resolved");
            return Ok(Resolution::NotImplemented);
        }

        let _busy = BusyGuard::acquire(&self.inner, &mode)?;
        let close_on = item.close_on();
        {
            let mut state = self.inner.state.borrow_mut();
            state.set_current(&mode, Some(item.clone()));
            if close_on == CloseOn::OnTrigger {
                state.resolve_close(&mode);
            }
        }
        self.publish();

        let resolution = match item.kind() {
            ItemKind::Actionable(action) => self.run_action(&mode, &item, source, action).await,
            ItemKind::Navigable(navigable) => {
                let navigate = hooks.on_navigation.clone().or_else(|| {
                    if navigable.is_external() {
                        hooks.on_external.clone()
                    } else {
                        hooks.on_local.clone()
                    }
                });
                let outcome = match navigate {
                    Some(navigate) => {
                        navigate(NavigationContext {
                            item: item.clone(),
                            source: source.clone(),
                            url: navigable.url().to_string(),
                        })
                        .await
                    }
                    None => {
                        tracing::debug!(
                            external = navigable.is_external(),
                            "no navigation hook for url"
                        );
                        Ok(())
                    }
                };
                self.settle(&mode, &item, source, outcome, None, true)
            }
            ItemKind::Searchable(searchable) => match hooks.on_selection {
                Some(select) => {
                    let outcome = select(SelectionContext {
                        item: item.clone(),
                        source: source.clone(),
                        data: searchable.data().clone(),
                    })
                    .await;
                    self.settle(&mode, &item, source, outcome, None, true)
                }
                None => Resolution::NotImplemented,
            },
        };
        Ok(resolution)
    }

    async fn run_action(
        &self,
        mode: &str,
        item: &Item,
        source: Source,
        action: &Actionable,
    ) -> Resolution {
        let request = match &action.on_request {
            Some(on_request) => {
                on_request(RequestContext {
                    item: item.clone(),
                    source: source.clone(),
                })
                .await
            }
            None => Request::Proceed(Value::Null),
        };

        let rarg = match request {
            Request::Proceed(rarg) => rarg,
            Request::Cancel => {
                tracing::debug!("request hook vetoed the action");
                if item.close_on().closes_on_cancel() {
                    let mut state = self.inner.state.borrow_mut();
                    state.resolve_close(mode);
                    state.clear_current(mode);
                }
                self.publish();
                return Resolution::Cancelled;
            }
        };

        let outcome = (action.on_action)(ActionContext {
            item: item.clone(),
            source: source.clone(),
            rarg,
        })
        .await;
        self.settle(mode, item, source, outcome, action.on_error.as_ref(), false)
    }

    /// Applies a hook outcome to the palette.
    ///
    /// `history_on_error_close` pushes history even when an error closes
    /// the palette early.
    fn settle(
        &self,
        mode: &str,
        item: &Item,
        source: Source,
        outcome: Result<()>,
        on_error: Option<&ErrorHook>,
        history_on_error_close: bool,
    ) -> Resolution {
        let close_on = item.close_on();
        let error = match outcome {
            Ok(()) => {
                {
                    let mut state = self.inner.state.borrow_mut();
                    state.error = None;
                    state.finish(mode, item, close_on.closes_on_success());
                }
                self.publish();
                tracing::debug!("item resolved");
                return Resolution::Completed;
            }
            Err(error) => error,
        };

        let failure = ResolutionError {
            error: Rc::new(error),
            item: item.clone(),
            source,
            mode: mode.to_string(),
        };
        tracing::warn!(error = %failure.error, "item resolution failed");
        self.inner.state.borrow_mut().error = Some(failure.clone());
        self.publish();

        if let Some(on_error) = on_error {
            on_error(&failure);
        }

        {
            let mut state = self.inner.state.borrow_mut();
            if close_on.closes_on_error() {
                if history_on_error_close {
                    state.push_history(mode, item);
                }
                state.resolve_close(mode);
                state.clear_current(mode);
            } else {
                state.finish(mode, item, close_on.closes_on_success());
            }
        }
        self.publish();
        Resolution::Failed(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RegisterOptions;
    use crate::domain::Searchable;
    use crate::infrastructure::Keymap;
    use crate::mode::ModeOptions;
    use crate::{Config, ItemType};
    use futures::executor::{block_on, LocalPool};
    use serde_json::json;

    fn palette(config: &Config) -> Palette {
        let pool = LocalPool::new();
        Palette::new(config, Rc::new(Keymap::new()), Rc::new(pool.spawner())).unwrap()
    }

    #[test]
    fn searchable_without_selection_hook_is_not_implemented() {
        let config = Config::new().mode(
            "files",
            ModeOptions::new(ItemType::Searchable, "").search_fields(["name"]),
        );
        let palette = palette(&config);
        palette
            .register_item(
                "files",
                [Item::new("a", "alpha", Searchable::new(json!({})))],
                RegisterOptions::default(),
            )
            .unwrap();

        let resolution = block_on(palette.trigger("a", Source::Click)).unwrap();
        assert_eq!(resolution, Resolution::NotImplemented);
        assert!(palette.with_mode("files", |mode| mode.history().is_empty()).unwrap());
    }

    #[test]
    fn searchable_with_selection_hook_receives_data() {
        let seen = Rc::new(std::cell::RefCell::new(Value::Null));
        let sink = Rc::clone(&seen);
        let config = Config::new().mode(
            "files",
            ModeOptions::new(ItemType::Searchable, "")
                .search_fields(["name"])
                .on_selection(move |ctx| {
                    *sink.borrow_mut() = ctx.data;
                    async { Ok(()) }
                }),
        );
        let palette = palette(&config);
        palette
            .register_item(
                "files",
                [Item::new("a", "alpha", Searchable::new(json!({ "path": "/a" })))],
                RegisterOptions::default(),
            )
            .unwrap();

        let resolution = block_on(palette.trigger("a", Source::Submit)).unwrap();
        assert_eq!(resolution, Resolution::Completed);
        assert_eq!(*seen.borrow(), json!({ "path": "/a" }));
        assert_eq!(
            palette.with_mode("files", |mode| mode.history().to_vec()).unwrap(),
            [ItemId::new("a")]
        );
    }

    #[test]
    fn unknown_item_is_an_error() {
        let config = Config::new().mode(
            "files",
            ModeOptions::new(ItemType::Searchable, "").search_fields(["name"]),
        );
        let palette = palette(&config);
        let err = block_on(palette.trigger("ghost", Source::Click)).unwrap_err();
        assert!(matches!(err, PaletteError::UnknownItem(_)));
    }
}
