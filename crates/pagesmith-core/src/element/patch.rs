//! Partial updates sent by style panels and property editors.

use super::{Animation, Dimension, Element, ShapeType, VideoFlags};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A partial style update. `None` leaves the field as it is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StylePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub z_index: Option<i64>,
    pub color: Option<String>,
    pub background_color: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
    pub text_align: Option<String>,
    pub border: Option<String>,
    pub border_radius: Option<f64>,
    pub box_shadow: Option<String>,
    pub opacity: Option<f64>,
    pub rotation: Option<f64>,
    pub scale: Option<f64>,
    pub filter: Option<String>,
    /// Extra attributes, merged key by key.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A partial element update. `id`, `type` and group membership are not
/// patchable; use the management functions for those.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementPatch {
    pub style: StylePatch,
    pub content: Option<String>,
    pub src: Option<String>,
    pub alt: Option<String>,
    pub video_src: Option<String>,
    pub video_options: Option<VideoFlags>,
    pub shape_type: Option<ShapeType>,
    pub href: Option<String>,
    pub target: Option<String>,
    pub animation: Option<Animation>,
    pub locked: Option<bool>,
}

macro_rules! assign {
    ($target:expr, $source:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = &$source.$field {
                $target.$field = value.clone();
            }
        )*
    };
}

macro_rules! assign_opt {
    ($target:expr, $source:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = &$source.$field {
                $target.$field = Some(value.clone());
            }
        )*
    };
}

impl ElementPatch {
    /// Patch that only moves the element.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            style: StylePatch {
                x: Some(x),
                y: Some(y),
                ..StylePatch::default()
            },
            ..Self::default()
        }
    }

    /// Patch that only replaces the text content.
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    /// Apply the patch in place.
    pub fn apply(&self, element: &mut Element) {
        let style = &mut element.style;
        let patch = &self.style;
        assign!(style, patch, [x, y, width, height, z_index]);
        assign_opt!(
            style,
            patch,
            [
                color,
                background_color,
                font_size,
                font_family,
                font_weight,
                text_align,
                border,
                border_radius,
                box_shadow,
                opacity,
                rotation,
                scale,
                filter,
            ]
        );
        for (key, value) in &patch.extra {
            style.extra.insert(key.clone(), value.clone());
        }

        assign_opt!(
            element,
            self,
            [content, src, alt, video_src, video_options, shape_type, href, target, animation]
        );
        if let Some(locked) = self.locked {
            element.locked = locked;
        }
    }

    /// Check if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
