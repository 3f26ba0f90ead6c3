//! Pagesmith Core Library
//!
//! Canvas geometry, element management and undo/redo history for the
//! Pagesmith page designer. Rendering and event wiring live in the host.

pub mod config;
pub mod element;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod history;
pub mod management;
pub mod session;

pub use config::{EditorConfig, UnknownTypePolicy};
pub use element::{
    Animation, Dimension, Effect, Element, ElementId, ElementKind, ElementPatch, ElementStyle,
    ShapeType, StylePatch, VideoFlags,
};
pub use error::{ConfigError, EditorError, EditorResult};
pub use factory::{ElementFactory, GroupCreation};
pub use geometry::{ResizeHandle, SnapGuide, SnapGuides};
pub use history::{HistoryEntrySummary, HistoryManager, HistoryState, SharedHistory};
pub use management::{AlignMode, DistributeDirection, ElementStatistics, ValidationReport};
pub use session::EditorSession;
