//! Infrastructure layer: the capabilities the palette consumes and exposes.
//!
//! The palette does not touch the DOM, the terminal or the keyboard directly.
//! It binds shortcuts through a key binding service and publishes its state
//! through observable values; hosts plug their own UI in on both sides.

pub mod keymap;
pub mod observable;

pub use keymap::{KeyBinding, KeyBindings, KeyHandler, Keymap, DEFAULT_SCOPE};
pub use observable::{Observable, Subscription};
