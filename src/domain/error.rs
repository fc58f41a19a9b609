//! Error types for the palette engine.
//!
//! This module defines the centralized error type [`PaletteError`] and a type alias
//! [`Result`] used throughout the crate. All errors are implemented using the
//! `thiserror` crate for automatic `Error` trait implementation.
//!
//! Configuration and lookup errors surface synchronously to the caller. Errors
//! raised by an item's hooks never reach the caller of a resolution; they are
//! captured into the palette's `error` slot instead (see
//! [`ResolutionError`](crate::domain::ResolutionError)).

use super::item::ItemId;
use thiserror::Error;

/// The main error type for palette operations.
///
/// # Examples
///
/// ```
/// use paletta::PaletteError;
///
/// fn fails() -> Result<(), PaletteError> {
///     Err(PaletteError::UnknownMode("commands".to_string()))
/// }
///
/// assert_eq!(fails().unwrap_err().to_string(), "Unknown mode: commands");
/// ```
#[derive(Debug, Error)]
pub enum PaletteError {
    /// The palette or mode configuration is malformed.
    ///
    /// Raised at construction time for duplicate mode names or prefixes, a
    /// missing empty-prefix mode, an empty `sort_by` key list, a missing
    /// search mapping, or hooks attached to a mode of the wrong item type.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A configuration value could not be interpreted.
    ///
    /// Raised when textual policy values (such as an empty-query mode) name
    /// an unknown variant.
    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    /// The named mode is not registered.
    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    /// No registered item carries the given id.
    #[error("Unknown item: {0}")]
    UnknownItem(ItemId),

    /// An item with the same id is already registered.
    #[error("Duplicate item id: {0}")]
    DuplicateId(ItemId),

    /// A submit or click resolved to an index with no corresponding result.
    #[error("Invalid selection: no result at index {0}")]
    InvalidSelection(usize),

    /// An item's action or navigation hook failed.
    ///
    /// Hooks may return any variant; this is the conventional one for action
    /// failures reported by host code.
    #[error("Action failed: {0}")]
    ActionExecution(String),

    /// A resolution is already in flight for the mode.
    #[error("Mode {0} is busy resolving another item")]
    Busy(String),

    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid TOML or does not match the schema.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl PaletteError {
    /// Convenience constructor for hook failures.
    ///
    /// ```
    /// use paletta::PaletteError;
    ///
    /// let err = PaletteError::action("disk full");
    /// assert_eq!(err.to_string(), "Action failed: disk full");
    /// ```
    pub fn action(message: impl Into<String>) -> Self {
        Self::ActionExecution(message.into())
    }
}

/// A specialized `Result` type for palette operations.
pub type Result<T> = std::result::Result<T, PaletteError>;
