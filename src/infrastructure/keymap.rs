//! Key binding service.
//!
//! The palette never listens to keyboard events itself. It binds shortcut
//! strings through a [`KeyBindings`] implementation supplied by the host and
//! keeps the returned [`KeyBinding`] handles for as long as the binding should
//! live. Dropping a handle unbinds it.
//!
//! [`Keymap`] is an in-memory implementation: hosts feed it key presses
//! (already rendered as shortcut strings such as `"ctrl+k"`) and it dispatches
//! them to whatever is bound.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Scope every palette binding is registered in.
pub const DEFAULT_SCOPE: &str = "all";

/// Callback run when a bound shortcut fires. Receives the shortcut string.
pub type KeyHandler = Rc<dyn Fn(&str)>;

/// Capability to bind shortcuts to handlers.
pub trait KeyBindings {
    /// Binds `shortcut` in `scope`. The binding lives until the returned
    /// handle is dropped or [`KeyBinding::unbind`] is called.
    fn bind(&self, scope: &str, shortcut: &str, handler: KeyHandler) -> KeyBinding;
}

/// RAII handle over one live binding.
pub struct KeyBinding {
    shortcut: String,
    release: Option<Box<dyn FnOnce()>>,
}

impl KeyBinding {
    /// Wraps a release callback; it runs exactly once, on unbind or drop.
    pub fn new(shortcut: impl Into<String>, release: impl FnOnce() + 'static) -> Self {
        Self {
            shortcut: shortcut.into(),
            release: Some(Box::new(release)),
        }
    }

    #[must_use]
    pub fn shortcut(&self) -> &str {
        &self.shortcut
    }

    pub fn unbind(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for KeyBinding {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBinding")
            .field("shortcut", &self.shortcut)
            .field("bound", &self.release.is_some())
            .finish()
    }
}

struct Bound {
    id: u64,
    scope: String,
    shortcut: String,
    handler: KeyHandler,
}

#[derive(Default)]
struct KeymapState {
    next_id: u64,
    scope: Option<String>,
    bindings: Vec<Bound>,
}

/// In-memory [`KeyBindings`] implementation with explicit dispatch.
///
/// Bindings in [`DEFAULT_SCOPE`] always fire; bindings in other scopes fire
/// only while that scope is active.
///
/// # Example
///
/// ```
/// use paletta::{KeyBindings, Keymap, DEFAULT_SCOPE};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let keymap = Keymap::new();
/// let hits = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&hits);
/// let handler = Rc::new(move |_: &str| counter.set(counter.get() + 1));
/// let binding = keymap.bind(DEFAULT_SCOPE, "Ctrl + K", handler);
///
/// assert_eq!(keymap.press("ctrl+k"), 1);
/// drop(binding);
/// assert_eq!(keymap.press("ctrl+k"), 0);
/// assert_eq!(hits.get(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Keymap {
    state: Rc<RefCell<KeymapState>>,
}

impl Keymap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates a non-default scope (or none).
    pub fn set_scope(&self, scope: Option<&str>) {
        self.state.borrow_mut().scope = scope.map(String::from);
    }

    /// Dispatches a shortcut to every matching binding, returning how many ran.
    pub fn press(&self, shortcut: &str) -> usize {
        let shortcut = normalize(shortcut);
        let handlers: Vec<KeyHandler> = {
            let state = self.state.borrow();
            state
                .bindings
                .iter()
                .filter(|bound| bound.shortcut == shortcut)
                .filter(|bound| {
                    bound.scope == DEFAULT_SCOPE
                        || state.scope.as_deref() == Some(bound.scope.as_str())
                })
                .map(|bound| Rc::clone(&bound.handler))
                .collect()
        };

        tracing::trace!(shortcut = %shortcut, handlers = handlers.len(), "key pressed");
        for handler in &handlers {
            handler(&shortcut);
        }
        handlers.len()
    }

    #[must_use]
    pub fn is_bound(&self, shortcut: &str) -> bool {
        let shortcut = normalize(shortcut);
        self.state
            .borrow()
            .bindings
            .iter()
            .any(|bound| bound.shortcut == shortcut)
    }

    /// Number of live bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyBindings for Keymap {
    fn bind(&self, scope: &str, shortcut: &str, handler: KeyHandler) -> KeyBinding {
        let shortcut = normalize(shortcut);
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.bindings.push(Bound {
                id,
                scope: scope.to_string(),
                shortcut: shortcut.clone(),
                handler,
            });
            id
        };
        tracing::trace!(shortcut = %shortcut, scope = %scope, "shortcut bound");

        let state: Weak<RefCell<KeymapState>> = Rc::downgrade(&self.state);
        KeyBinding::new(shortcut, move || {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().bindings.retain(|bound| bound.id != id);
            }
        })
    }
}

impl fmt::Debug for Keymap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Keymap")
            .field("scope", &state.scope)
            .field(
                "bindings",
                &state.bindings.iter().map(|bound| bound.shortcut.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Canonical shortcut form: lowercase, no whitespace around `+`.
fn normalize(shortcut: &str) -> String {
    shortcut
        .split('+')
        .map(|part| part.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting(hits: &Rc<Cell<usize>>) -> KeyHandler {
        let hits = Rc::clone(hits);
        Rc::new(move |_: &str| hits.set(hits.get() + 1))
    }

    #[test]
    fn scoped_bindings_fire_only_in_their_scope() {
        let keymap = Keymap::new();
        let hits = Rc::new(Cell::new(0));
        let _binding = keymap.bind("editor", "esc", counting(&hits));

        assert_eq!(keymap.press("esc"), 0);
        keymap.set_scope(Some("editor"));
        assert_eq!(keymap.press("ESC"), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unbind_is_idempotent_with_drop() {
        let keymap = Keymap::new();
        let hits = Rc::new(Cell::new(0));
        let first = keymap.bind(DEFAULT_SCOPE, "up", counting(&hits));
        let _second = keymap.bind(DEFAULT_SCOPE, "up", counting(&hits));

        first.unbind();
        assert_eq!(keymap.len(), 1);
        assert_eq!(keymap.press("up"), 1);
    }

    #[test]
    fn handlers_may_rebind_while_dispatching() {
        let keymap = Keymap::new();
        let slot: Rc<RefCell<Option<KeyBinding>>> = Rc::new(RefCell::new(None));
        let (inner_keymap, inner_slot) = (keymap.clone(), Rc::clone(&slot));
        *slot.borrow_mut() = Some(keymap.bind(
            DEFAULT_SCOPE,
            "x",
            Rc::new(move |_: &str| {
                inner_slot.borrow_mut().take();
                let _ = inner_keymap.is_bound("x");
            }),
        ));

        assert_eq!(keymap.press("x"), 1);
        assert!(keymap.is_empty());
    }

    #[test]
    fn shortcuts_are_normalized() {
        assert_eq!(normalize(" Ctrl + Shift+P "), "ctrl+shift+p");
    }
}
