//! Palette item model.
//!
//! An [`Item`] is a cheaply clonable, immutable handle over a shared base
//! shape (`id`, `name`) and a variant payload ([`ItemKind`]). Two handles are
//! equal only when they point to the same registration, which is what
//! identity matching during unregistration relies on.

use super::error::{PaletteError, Result};
use super::hooks::{
    hook, ActionContext, ActionHook, ErrorHook, Request, RequestContext, RequestHook,
    ResolutionError, UnregisterHook,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::str::FromStr;

/// Opaque item identifier, unique across every mode of a palette.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Creates an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&ItemId> for ItemId {
    fn from(id: &ItemId) -> Self {
        id.clone()
    }
}

/// Item variant discriminator.
///
/// Every mode holds items of exactly one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Runs host code when triggered.
    Actionable,
    /// Navigates to a URL when triggered.
    Navigable,
    /// Carries opaque data handed to the mode's selection hook.
    Searchable,
}

impl ItemType {
    /// Lowercase name, as used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Actionable => "actionable",
            Self::Navigable => "navigable",
            Self::Searchable => "searchable",
        }
    }
}

impl FromStr for ItemType {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "actionable" => Ok(Self::Actionable),
            "navigable" => Ok(Self::Navigable),
            "searchable" => Ok(Self::Searchable),
            other => Err(PaletteError::Configuration(format!(
                "unknown item type {other:?} (expected actionable, navigable or searchable)"
            ))),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle point at which resolving an item closes the palette.
///
/// Navigable and Searchable items have no veto hook, so `OnCancel` never
/// fires for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseOn {
    /// Never close as a result of resolving this item.
    Never,
    /// Close as soon as the item is triggered, before any hook runs.
    OnTrigger,
    /// Close when the request hook vetoes the action.
    OnCancel,
    /// Close after the action completes.
    OnSuccess,
    /// Close when the action fails.
    OnError,
    /// Close on cancel, success and error.
    #[default]
    Always,
}

impl CloseOn {
    #[must_use]
    pub const fn closes_on_cancel(self) -> bool {
        matches!(self, Self::OnCancel | Self::Always)
    }

    #[must_use]
    pub const fn closes_on_success(self) -> bool {
        matches!(self, Self::OnSuccess | Self::Always)
    }

    #[must_use]
    pub const fn closes_on_error(self) -> bool {
        matches!(self, Self::OnError | Self::Always)
    }
}

/// What caused a resolution request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// The user submitted the input (Enter).
    Submit,
    /// A bound shortcut fired; carries the shortcut string.
    Shortcut(String),
    /// The user clicked a result.
    Click,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submit => f.write_str("submit"),
            Self::Shortcut(shortcut) => write!(f, "shortcut({shortcut})"),
            Self::Click => f.write_str("click"),
        }
    }
}

/// Payload of an item that runs host code.
///
/// # Example
///
/// ```
/// use paletta::{Actionable, CloseOn, Item};
///
/// let save = Actionable::new(|_ctx| async { Ok(()) })
///     .category("File")
///     .description("Write the buffer to disk")
///     .shortcut("ctrl+s")
///     .close_on(CloseOn::OnSuccess);
/// let item = Item::new("save", "Save", save);
/// assert_eq!(item.shortcuts(), ["ctrl+s".to_string()]);
/// ```
#[derive(Clone)]
pub struct Actionable {
    pub(crate) category: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) shortcut: Vec<String>,
    pub(crate) close_on: CloseOn,
    pub(crate) on_request: Option<RequestHook>,
    pub(crate) on_action: ActionHook,
    pub(crate) on_error: Option<ErrorHook>,
    pub(crate) on_unregister: Option<UnregisterHook>,
}

impl Actionable {
    /// Creates an actionable payload around its action hook.
    pub fn new<F, Fut>(on_action: F) -> Self
    where
        F: Fn(ActionContext) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        Self {
            category: None,
            description: None,
            shortcut: Vec::new(),
            close_on: CloseOn::default(),
            on_request: None,
            on_action: hook(on_action),
            on_error: None,
            on_unregister: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a shortcut that triggers this item while it is registered.
    #[must_use]
    pub fn shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut.push(shortcut.into());
        self
    }

    #[must_use]
    pub const fn close_on(mut self, close_on: CloseOn) -> Self {
        self.close_on = close_on;
        self
    }

    /// Sets the request hook that runs before the action and may veto it.
    ///
    /// Resolving to [`Request::Cancel`] skips the action; any
    /// [`Request::Proceed`] value is handed to the action as `rarg`.
    #[must_use]
    pub fn on_request<F, Fut>(mut self, on_request: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + 'static,
        Fut: Future<Output = Request> + 'static,
    {
        self.on_request = Some(hook(on_request));
        self
    }

    /// Sets a callback invoked after the action fails. Its outcome is ignored.
    #[must_use]
    pub fn on_error(mut self, on_error: impl Fn(&ResolutionError) + 'static) -> Self {
        self.on_error = Some(Rc::new(on_error));
        self
    }

    /// Sets a callback invoked when the item is unregistered or displaced.
    #[must_use]
    pub fn on_unregister(mut self, on_unregister: impl Fn(&Item) + 'static) -> Self {
        self.on_unregister = Some(Rc::new(on_unregister));
        self
    }

    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Debug for Actionable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actionable")
            .field("category", &self.category)
            .field("description", &self.description)
            .field("shortcut", &self.shortcut)
            .field("close_on", &self.close_on)
            .field("on_request", &self.on_request.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_unregister", &self.on_unregister.is_some())
            .finish_non_exhaustive()
    }
}

/// Payload of an item that navigates to a URL.
///
/// `external` and `url_host_pathname` are derived once, at construction.
#[derive(Debug, Clone)]
pub struct Navigable {
    url: String,
    external: bool,
    url_host_pathname: String,
    pub(crate) close_on: CloseOn,
}

impl Navigable {
    /// Creates a navigable payload and analyses its URL.
    ///
    /// ```
    /// use paletta::Navigable;
    ///
    /// let docs = Navigable::new("https://example.com/docs?tab=api#intro");
    /// assert!(docs.is_external());
    /// assert_eq!(docs.url_host_pathname(), "example.com/docs");
    ///
    /// let settings = Navigable::new("/settings/profile");
    /// assert!(!settings.is_external());
    /// assert_eq!(settings.url_host_pathname(), "/settings/profile");
    /// ```
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let (external, url_host_pathname) = analyse_url(&url);
        Self {
            url,
            external,
            url_host_pathname,
            close_on: CloseOn::default(),
        }
    }

    #[must_use]
    pub const fn close_on(mut self, close_on: CloseOn) -> Self {
        self.close_on = close_on;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn is_external(&self) -> bool {
        self.external
    }

    #[must_use]
    pub fn url_host_pathname(&self) -> &str {
        &self.url_host_pathname
    }
}

/// Splits a URL into its external flag and host+path display form.
fn analyse_url(url: &str) -> (bool, String) {
    let (external, rest) = match url.split_once("://") {
        Some((scheme, rest)) if is_scheme(scheme) => (true, rest),
        _ => match url.strip_prefix("//") {
            Some(rest) => (true, rest),
            None => (false, url),
        },
    };

    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let mut host_pathname = &rest[..end];
    if external {
        // userinfo is never part of the display form
        if let Some((_, host)) = host_pathname.split_once('@') {
            host_pathname = host;
        }
    }
    (external, host_pathname.to_string())
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Payload of an item carrying opaque data.
#[derive(Debug, Clone)]
pub struct Searchable {
    data: Value,
    pub(crate) close_on: CloseOn,
}

impl Searchable {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            close_on: CloseOn::default(),
        }
    }

    #[must_use]
    pub const fn close_on(mut self, close_on: CloseOn) -> Self {
        self.close_on = close_on;
        self
    }

    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }
}

/// Variant payload of an [`Item`].
#[derive(Debug, Clone)]
pub enum ItemKind {
    Actionable(Actionable),
    Navigable(Navigable),
    Searchable(Searchable),
}

impl From<Actionable> for ItemKind {
    fn from(payload: Actionable) -> Self {
        Self::Actionable(payload)
    }
}

impl From<Navigable> for ItemKind {
    fn from(payload: Navigable) -> Self {
        Self::Navigable(payload)
    }
}

impl From<Searchable> for ItemKind {
    fn from(payload: Searchable) -> Self {
        Self::Searchable(payload)
    }
}

#[derive(Debug)]
struct ItemData {
    id: ItemId,
    name: String,
    kind: ItemKind,
}

/// A registered palette entry.
///
/// Cloning an `Item` clones the handle, not the payload. Equality is
/// identity: two separately constructed items with the same id are not equal.
#[derive(Clone)]
pub struct Item(Rc<ItemData>);

impl Item {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, kind: impl Into<ItemKind>) -> Self {
        Self(Rc::new(ItemData {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
        }))
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.0.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn kind(&self) -> &ItemKind {
        &self.0.kind
    }

    #[must_use]
    pub fn item_type(&self) -> ItemType {
        match self.kind() {
            ItemKind::Actionable(_) => ItemType::Actionable,
            ItemKind::Navigable(_) => ItemType::Navigable,
            ItemKind::Searchable(_) => ItemType::Searchable,
        }
    }

    #[must_use]
    pub fn close_on(&self) -> CloseOn {
        match self.kind() {
            ItemKind::Actionable(a) => a.close_on,
            ItemKind::Navigable(n) => n.close_on,
            ItemKind::Searchable(s) => s.close_on,
        }
    }

    /// Shortcuts bound while the item is registered (Actionable only).
    #[must_use]
    pub fn shortcuts(&self) -> &[String] {
        match self.kind() {
            ItemKind::Actionable(a) => &a.shortcut,
            _ => &[],
        }
    }

    /// Looks up a field by name for search mapping and key sorting.
    ///
    /// Returns `None` for fields the variant does not have, unset optional
    /// fields, and non-string values inside Searchable data.
    ///
    /// ```
    /// use paletta::{Item, Searchable};
    /// use serde_json::json;
    ///
    /// let item = Item::new("rs", "Rust", Searchable::new(json!({ "ext": "rs", "stars": 5 })));
    /// assert_eq!(item.field("name"), Some("Rust"));
    /// assert_eq!(item.field("ext"), Some("rs"));
    /// assert_eq!(item.field("stars"), None);
    /// ```
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "id" => return Some(self.id().as_str()),
            "name" => return Some(self.name()),
            "type" => return Some(self.item_type().as_str()),
            _ => {}
        }
        match (self.kind(), name) {
            (ItemKind::Actionable(a), "category") => a.category.as_deref(),
            (ItemKind::Actionable(a), "description") => a.description.as_deref(),
            (ItemKind::Navigable(n), "url") => Some(n.url()),
            (ItemKind::Navigable(n), "url_host_pathname" | "urlHostPathname") => {
                Some(n.url_host_pathname())
            }
            (ItemKind::Searchable(s), field) => s.data.get(field).and_then(Value::as_str),
            _ => None,
        }
    }

    /// Returns true when both handles refer to the same registration.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("type", &self.item_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn external_urls_keep_host_and_path() {
        let nav = Navigable::new("https://user@docs.rs/serde/latest?search=x");
        assert!(nav.is_external());
        assert_eq!(nav.url_host_pathname(), "docs.rs/serde/latest");

        let relative = Navigable::new("//cdn.example.com/lib.js");
        assert!(relative.is_external());
        assert_eq!(relative.url_host_pathname(), "cdn.example.com/lib.js");
    }

    #[test]
    fn local_urls_are_not_external() {
        let nav = Navigable::new("/projects#recent");
        assert!(!nav.is_external());
        assert_eq!(nav.url_host_pathname(), "/projects");

        let odd = Navigable::new("notes/1://x");
        assert!(!odd.is_external());
    }

    #[test]
    fn equality_is_identity() {
        let a = Item::new("a", "Alpha", Searchable::new(json!(null)));
        let b = Item::new("a", "Alpha", Searchable::new(json!(null)));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn close_on_policies() {
        assert!(CloseOn::Always.closes_on_cancel());
        assert!(CloseOn::Always.closes_on_error());
        assert!(CloseOn::OnError.closes_on_error());
        assert!(!CloseOn::OnError.closes_on_success());
        assert!(!CloseOn::Never.closes_on_success());
        assert!(!CloseOn::OnTrigger.closes_on_cancel());
    }

    #[test]
    fn fields_by_variant() {
        let action = Item::new(
            "open",
            "Open File",
            Actionable::new(|_| async { Ok(()) }).category("File"),
        );
        assert_eq!(action.field("category"), Some("File"));
        assert_eq!(action.field("description"), None);
        assert_eq!(action.field("url"), None);
        assert_eq!(action.field("type"), Some("actionable"));

        let nav = Item::new("home", "Home", Navigable::new("https://example.com/"));
        assert_eq!(nav.field("urlHostPathname"), Some("example.com/"));
    }
}
