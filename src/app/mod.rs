//! Application layer: the palette controller and everything it coordinates.
//!
//! This layer sits between the host (which renders, captures keys and owns
//! the event loop) and the domain and mode layers. It owns all mutable
//! session state.
//!
//! # Architecture
//!
//! ```text
//! Host UI ──► Event / method call ──► Palette ──► Registry / Mode pipeline
//!    ▲                                   │
//!    └──────── Observables ◄─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`controller`]: The [`Palette`] handle and its public operations
//! - [`registry`]: Ordered modes, registration and unregistration
//! - [`resolver`]: Submit, click and shortcut resolution of items
//! - [`selection`]: The cyclic selection cursor
//! - [`debounce`]: Host-clock driven input debouncing
//! - [`signals`]: Observables mirroring palette state
//! - [`handler`]: Event dispatch onto the controller

pub mod controller;
pub mod debounce;
pub mod handler;
pub mod registry;
pub mod resolver;
pub mod selection;
pub mod signals;

pub use controller::{Palette, Registration};
pub use debounce::Debouncer;
pub use handler::{handle_event, Event};
pub use registry::{Matcher, RegisterOptions, Registry};
pub use resolver::Resolution;
pub use selection::Selection;
pub use signals::{ModeSignals, Signals};
