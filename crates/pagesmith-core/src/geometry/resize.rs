//! Resize-handle constraint solving.

use crate::error::EditorError;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One of the eight compass handles around a selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeHandle {
    /// Handle moves the left edge.
    pub fn moves_left(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::NW | ResizeHandle::SW)
    }

    /// Handle moves the right edge.
    pub fn moves_right(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::NE | ResizeHandle::SE)
    }

    /// Handle moves the top edge.
    pub fn moves_top(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::NE | ResizeHandle::NW)
    }

    /// Handle moves the bottom edge.
    pub fn moves_bottom(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::SE | ResizeHandle::SW)
    }

    /// Corner handles move two edges.
    pub fn is_corner(self) -> bool {
        matches!(
            self,
            ResizeHandle::NE | ResizeHandle::NW | ResizeHandle::SE | ResizeHandle::SW
        )
    }
}

impl FromStr for ResizeHandle {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" => Ok(ResizeHandle::N),
            "s" => Ok(ResizeHandle::S),
            "e" => Ok(ResizeHandle::E),
            "w" => Ok(ResizeHandle::W),
            "ne" => Ok(ResizeHandle::NE),
            "nw" => Ok(ResizeHandle::NW),
            "se" => Ok(ResizeHandle::SE),
            "sw" => Ok(ResizeHandle::SW),
            other => Err(EditorError::UnknownResizeHandle(other.to_string())),
        }
    }
}

/// Compute new bounds for a handle drag.
///
/// The delta is measured from `initial_mouse_pos`, so repeated calls during a
/// drag do not accumulate error. Width and height are clamped to `min_size`
/// with the opposite edge kept fixed. With an `aspect_ratio` (width/height),
/// the axis the drag mostly moves along drives the other one.
pub fn calculate_resize_constraints(
    handle: ResizeHandle,
    mouse_pos: Point,
    initial_bounds: Rect,
    initial_mouse_pos: Point,
    min_size: f64,
    aspect_ratio: Option<f64>,
) -> Rect {
    let delta = mouse_pos - initial_mouse_pos;
    let right = initial_bounds.x1;
    let bottom = initial_bounds.y1;

    let mut x = initial_bounds.x0;
    let mut y = initial_bounds.y0;
    let mut width = initial_bounds.width();
    let mut height = initial_bounds.height();

    if handle.moves_right() {
        width += delta.x;
    }
    if handle.moves_left() {
        x += delta.x;
        width -= delta.x;
    }
    if handle.moves_bottom() {
        height += delta.y;
    }
    if handle.moves_top() {
        y += delta.y;
        height -= delta.y;
    }

    if width < min_size {
        width = min_size;
        if handle.moves_left() {
            x = right - width;
        }
    }
    if height < min_size {
        height = min_size;
        if handle.moves_top() {
            y = bottom - height;
        }
    }

    if let Some(ratio) = aspect_ratio.filter(|r| *r > 0.0 && r.is_finite()) {
        let width_drives = if handle.is_corner() {
            delta.x.abs() >= delta.y.abs()
        } else {
            handle.moves_left() || handle.moves_right()
        };

        if width_drives {
            height = width / ratio;
            if handle.moves_top() {
                y = bottom - height;
            }
        } else {
            width = height * ratio;
            if handle.moves_left() {
                x = right - width;
            }
        }
    }

    Rect::new(x, y, x + width, y + height)
}
