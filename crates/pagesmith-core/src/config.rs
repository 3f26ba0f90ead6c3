//! Editor configuration.

use crate::error::ConfigError;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default snap grid spacing in canvas pixels.
pub const GRID_SIZE: f64 = 20.0;

/// Default distance within which smart guides engage.
pub const SNAP_THRESHOLD: f64 = 10.0;

/// Default number of history states to retain.
pub const MAX_HISTORY_SIZE: usize = 50;

/// What the factory does when asked for a type name it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTypePolicy {
    /// Fail with `UnknownElementType`.
    #[default]
    Strict,
    /// Build a placeholder `shape` element instead.
    Lenient,
}

/// Tunables for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub grid_size: f64,
    pub snap_threshold: f64,
    pub max_history_size: usize,
    /// Smallest width/height a resize handle may produce.
    pub min_element_size: f64,
    /// Offset applied per attempt by smart placement.
    pub placement_step: f64,
    pub placement_max_attempts: usize,
    pub canvas_size: Size,
    /// Offset applied to pasted elements.
    pub paste_offset: f64,
    pub unknown_type_policy: UnknownTypePolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            snap_threshold: SNAP_THRESHOLD,
            max_history_size: MAX_HISTORY_SIZE,
            min_element_size: 20.0,
            placement_step: 20.0,
            placement_max_attempts: 10,
            canvas_size: Size::new(1200.0, 800.0),
            paste_offset: 20.0,
            unknown_type_policy: UnknownTypePolicy::Strict,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Loading editor config from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size.is_nan() || self.grid_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "gridSize must be positive, got {}",
                self.grid_size
            )));
        }
        if self.snap_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "snapThreshold must not be negative, got {}",
                self.snap_threshold
            )));
        }
        if self.max_history_size == 0 {
            return Err(ConfigError::Invalid(
                "maxHistorySize must be at least 1".to_string(),
            ));
        }
        if self.min_element_size < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "minElementSize must not be negative, got {}",
                self.min_element_size
            )));
        }
        if self.canvas_size.width <= 0.0 || self.canvas_size.height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "canvasSize must be positive, got {}x{}",
                self.canvas_size.width, self.canvas_size.height
            )));
        }
        Ok(())
    }
}
