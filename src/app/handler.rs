//! Event dispatch.
//!
//! Hosts that prefer an event loop over calling [`Palette`] methods directly
//! translate their UI events into [`Event`]s and hand them to
//! [`handle_event`]. Each event maps onto exactly one public operation.
//!
//! # Example
//!
//! ```rust
//! use futures::executor::{block_on, LocalPool};
//! use paletta::{handle_event, Config, Event, ItemType, Keymap, ModeOptions, Palette};
//! use std::rc::Rc;
//!
//! let config = Config::new()
//!     .mode("files", ModeOptions::new(ItemType::Searchable, "").search_fields(["name"]));
//! let pool = LocalPool::new();
//! let palette = Palette::new(&config, Rc::new(Keymap::new()), Rc::new(pool.spawner()))?;
//!
//! block_on(handle_event(&palette, Event::Open(None)))?;
//! assert!(palette.is_open());
//! block_on(handle_event(&palette, Event::Escape))?;
//! assert!(!palette.is_open());
//! # Ok::<(), paletta::PaletteError>(())
//! ```

use super::controller::Palette;
use super::resolver::Resolution;
use crate::domain::error::Result;
use std::time::Instant;

/// UI events the palette understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The input text changed (debounced).
    Input(String),
    /// The input text changed at a known time (debounced).
    InputAt(String, Instant),
    /// Run a search immediately.
    Search(String),
    /// Host clock tick; runs a due debounced search.
    Tick(Instant),
    /// Moves the selection down by one (wraps to top).
    SelectNext,
    /// Moves the selection up by one (wraps to bottom).
    SelectPrevious,
    /// Resolves the selected result.
    Submit,
    /// Resolves the result at this index.
    Click(usize),
    /// Opens the palette, optionally on a named mode.
    Open(Option<String>),
    Close,
    Toggle,
    /// Escape key; closes when `close_on_escape` is set.
    Escape,
    /// Pointer pressed outside the palette; closes when
    /// `close_on_click_outside` is set.
    ClickOutside,
}

/// Applies one event to the palette.
///
/// Returns the resolution for `Submit` and `Click`, `None` for everything
/// else (and for a submit with no results).
///
/// # Errors
///
/// Propagates the error of the underlying operation: an unknown mode for
/// `Open`, an invalid selection or busy mode for `Submit` and `Click`.
pub async fn handle_event(palette: &Palette, event: Event) -> Result<Option<Resolution>> {
    tracing::trace!(?event, "handling event");
    match event {
        Event::Input(text) => palette.input(text),
        Event::InputAt(text, at) => palette.input_at(text, at),
        Event::Search(pattern) => palette.search(&pattern),
        Event::Tick(now) => {
            palette.tick(now);
        }
        Event::SelectNext => palette.select_next(),
        Event::SelectPrevious => palette.select_previous(),
        Event::Submit => return palette.submit().await,
        Event::Click(index) => return palette.click(index).await.map(Some),
        Event::Open(mode) => palette.open_palette(mode.as_deref())?,
        Event::Close => palette.close_palette(),
        Event::Toggle => palette.toggle_palette()?,
        Event::Escape => palette.escape(),
        Event::ClickOutside => palette.click_outside(),
    }
    Ok(None)
}
