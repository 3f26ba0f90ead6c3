//! Element definitions for the page canvas.

mod dimension;
mod patch;

pub use dimension::Dimension;
pub use patch::{ElementPatch, StylePatch};

use crate::error::EditorError;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = String;

/// Generate a fresh element id of the form `<type>-<uuid>`.
pub fn generate_id(kind: ElementKind) -> ElementId {
    format!("{}-{}", kind, Uuid::new_v4())
}

/// The closed set of element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Heading,
    Paragraph,
    Button,
    Image,
    Video,
    Shape,
    Group,
}

impl ElementKind {
    /// Every element kind, in declaration order.
    pub const ALL: [ElementKind; 7] = [
        ElementKind::Heading,
        ElementKind::Paragraph,
        ElementKind::Button,
        ElementKind::Image,
        ElementKind::Video,
        ElementKind::Shape,
        ElementKind::Group,
    ];

    /// Wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Heading => "heading",
            ElementKind::Paragraph => "paragraph",
            ElementKind::Button => "button",
            ElementKind::Image => "image",
            ElementKind::Video => "video",
            ElementKind::Shape => "shape",
            ElementKind::Group => "group",
        }
    }

    /// Whether elements of this kind carry text `content`.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            ElementKind::Heading | ElementKind::Paragraph | ElementKind::Button
        )
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EditorError::UnknownElementType(s.to_string()))
    }
}

/// Primitive drawn by a `shape` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[default]
    Rectangle,
    Circle,
    Triangle,
    Line,
    Arrow,
    Star,
}

/// Playback flags for `video` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoFlags {
    pub autoplay: bool,
    #[serde(rename = "loop")]
    pub looped: bool,
    pub muted: bool,
    pub controls: bool,
}

/// A single hover/click effect. Opaque to the editing core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    /// Effect name (`"scale"`, `"pulse"`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Any further effect parameters, kept verbatim.
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

/// Interaction animations attached to an element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<Effect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click: Option<Effect>,
}

/// Visual attributes of an element.
///
/// Only `x`, `y`, `width`, `height` and `z_index` take part in geometry;
/// the appearance fields and `extra` ride along untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    /// Left edge; relative to the parent group's origin when grouped.
    pub x: f64,
    /// Top edge; relative to the parent group's origin when grouped.
    pub y: f64,
    pub width: Dimension,
    pub height: Dimension,
    /// Paint and hit-test order, higher wins.
    pub z_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_shadow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Rotation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Attributes the core does not model.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ElementStyle {
    /// Create a style with geometry set and no appearance attributes.
    pub fn new(x: f64, y: f64, width: impl Into<Dimension>, height: impl Into<Dimension>, z_index: i64) -> Self {
        Self {
            x,
            y,
            width: width.into(),
            height: height.into(),
            z_index,
            ..Self::default()
        }
    }
}

/// A placed object on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub style: ElementStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_options: Option<VideoFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<ShapeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,
    /// Owning group, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ElementId>,
    /// Member ids; only meaningful on `group` elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_ids: Option<Vec<ElementId>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

impl Element {
    /// Create a bare element of `kind` with a fresh id.
    pub fn new(kind: ElementKind, style: ElementStyle) -> Self {
        Self::with_id(generate_id(kind), kind, style)
    }

    /// Create a bare element with a caller-chosen id.
    pub fn with_id(id: impl Into<ElementId>, kind: ElementKind, style: ElementStyle) -> Self {
        Self {
            id: id.into(),
            kind,
            style,
            content: None,
            src: None,
            alt: None,
            video_src: None,
            video_options: None,
            shape_type: None,
            href: None,
            target: None,
            animation: None,
            parent_id: None,
            child_ids: if kind == ElementKind::Group {
                Some(Vec::new())
            } else {
                None
            },
            locked: false,
        }
    }

    /// Check if this element is a group.
    pub fn is_group(&self) -> bool {
        self.kind == ElementKind::Group
    }

    /// Member ids of a group (empty for everything else).
    pub fn children(&self) -> &[ElementId] {
        self.child_ids.as_deref().unwrap_or(&[])
    }

    /// Top-left corner as stored in the style.
    pub fn position(&self) -> Point {
        Point::new(self.style.x, self.style.y)
    }

    /// Move the top-left corner.
    pub fn set_position(&mut self, position: Point) {
        self.style.x = position.x;
        self.style.y = position.y;
    }

    /// Numeric width and height.
    pub fn size(&self) -> Size {
        Size::new(self.style.width.value(), self.style.height.value())
    }

    /// Replace width and height, keeping any unit suffix.
    pub fn set_size(&mut self, size: Size) {
        self.style.width = self.style.width.with_value(size.width);
        self.style.height = self.style.height.with_value(size.height);
    }
}
