//! Error types for editing operations.

use crate::element::ElementId;
use thiserror::Error;

/// Result type for editing operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors raised by the factory and management layers.
///
/// These signal caller misuse (wrong arity, wrong element kind, stale ids)
/// that the host UI is expected to prevent; hosts surface them as
/// non-fatal messages.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The factory was asked for a type outside the closed element set.
    #[error("Unknown element type: {0}")]
    UnknownElementType(String),

    #[error("Unknown resize handle: {0}")]
    UnknownResizeHandle(String),

    /// Grouping needs at least `required` elements.
    #[error("Insufficient selection: need at least {required} elements, got {found}")]
    InsufficientSelection { required: usize, found: usize },

    /// Ungroup was addressed to an element that is not a usable group.
    #[error("Element is not a group: {0}")]
    NotAGroup(ElementId),

    /// No element with this id exists in the collection.
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    /// Element JSON could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while loading an [`EditorConfig`](crate::config::EditorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
