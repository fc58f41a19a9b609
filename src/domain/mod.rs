//! Domain layer for the palette engine.
//!
//! This module contains the item model, the hook types items and modes carry,
//! and the crate-wide error type. It has no knowledge of modes, key bindings or
//! the controller.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`item`]: Items, item variants and close policies
//! - [`hooks`]: Hook contexts, callback aliases and resolution failures

pub mod error;
pub mod hooks;
pub mod item;

pub use error::{PaletteError, Result};
pub use hooks::{
    ActionContext, HookFuture, MapToSearchFn, NavigationContext, Request, RequestContext,
    ResolutionError, SelectionContext, SortFn,
};
pub use item::{
    Actionable, CloseOn, Item, ItemId, ItemKind, ItemType, Navigable, Searchable, Source,
};
