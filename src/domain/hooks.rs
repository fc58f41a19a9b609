//! Hook contexts and callback types.
//!
//! Hooks are single-threaded: they are stored behind `Rc` and return
//! `LocalBoxFuture`s, matching the cooperative execution model of the palette.
//! Async hooks are awaited sequentially inside one resolution; `on_error` and
//! `on_unregister` are plain callbacks whose outcome is ignored.

use super::error::{PaletteError, Result};
use super::item::{Item, Source};
use futures_util::future::{FutureExt, LocalBoxFuture};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Future returned by every async hook.
pub type HookFuture<T> = LocalBoxFuture<'static, T>;

pub type RequestHook = Rc<dyn Fn(RequestContext) -> HookFuture<Request>>;
pub type ActionHook = Rc<dyn Fn(ActionContext) -> HookFuture<Result<()>>>;
pub type NavigationHook = Rc<dyn Fn(NavigationContext) -> HookFuture<Result<()>>>;
pub type SelectionHook = Rc<dyn Fn(SelectionContext) -> HookFuture<Result<()>>>;
pub type ErrorHook = Rc<dyn Fn(&ResolutionError)>;
pub type UnregisterHook = Rc<dyn Fn(&Item)>;

/// Maps an item to the text its mode searches and sorts by.
pub type MapToSearchFn = Rc<dyn Fn(&Item) -> String>;

/// Caller-supplied total reordering, applied in place.
pub type SortFn = Rc<dyn Fn(&mut Vec<Item>)>;

/// Boxes an async closure into a shareable hook.
pub(crate) fn hook<C, T, F, Fut>(f: F) -> Rc<dyn Fn(C) -> HookFuture<T>>
where
    C: 'static,
    T: 'static,
    F: Fn(C) -> Fut + 'static,
    Fut: Future<Output = T> + 'static,
{
    Rc::new(move |ctx| f(ctx).boxed_local())
}

/// Outcome of an item's request hook.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Run the action, handing it this value as `rarg`.
    Proceed(Value),
    /// Veto the action.
    Cancel,
}

impl From<bool> for Request {
    fn from(proceed: bool) -> Self {
        if proceed {
            Self::Proceed(Value::Bool(true))
        } else {
            Self::Cancel
        }
    }
}

/// Input to an item's request hook.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The item about to run.
    pub item: Item,
    /// What triggered the resolution.
    pub source: Source,
}

/// Input to an item's action hook.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// The item being resolved.
    pub item: Item,
    /// What triggered the resolution.
    pub source: Source,
    /// Value the request hook resolved with (`null` without a request hook).
    pub rarg: Value,
}

/// Input to a navigable mode's navigation hooks.
#[derive(Debug, Clone)]
pub struct NavigationContext {
    /// The navigable item being resolved.
    pub item: Item,
    /// What triggered the resolution.
    pub source: Source,
    /// The item's URL, as registered.
    pub url: String,
}

/// Input to a searchable mode's selection hook.
#[derive(Debug, Clone)]
pub struct SelectionContext {
    /// The searchable item being resolved.
    pub item: Item,
    /// What triggered the resolution.
    pub source: Source,
    /// A copy of the item's opaque data.
    pub data: Value,
}

/// A failed resolution, as published through the palette's `error` slot.
#[derive(Clone)]
pub struct ResolutionError {
    pub error: Rc<PaletteError>,
    pub item: Item,
    pub source: Source,
    pub mode: String,
}

impl PartialEq for ResolutionError {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.error, &other.error)
            && self.item == other.item
            && self.source == other.source
            && self.mode == other.mode
    }
}

impl fmt::Debug for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionError")
            .field("error", &self.error.to_string())
            .field("item", self.item.id())
            .field("source", &self.source)
            .field("mode", &self.mode)
            .finish()
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} in mode {}, via {})",
            self.error, self.item.id(), self.mode, self.source
        )
    }
}
