//! Grid snapping and smart alignment guides.

use super::element_bounds;
use crate::element::Element;
use kurbo::Point;

/// Snap a point to the nearest grid intersection.
///
/// A non-positive grid size disables snapping.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideOrientation {
    /// A vertical line at a fixed X (produced by horizontal alignment).
    Vertical,
    /// A horizontal line at a fixed Y.
    Horizontal,
}

/// Which feature of the other element was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideKind {
    /// Left/left or top/top.
    StartEdge,
    /// Right/right or bottom/bottom.
    EndEdge,
    /// Center/center or middle/middle.
    Center,
}

/// An alignment line to draw while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGuide {
    pub orientation: GuideOrientation,
    /// Canvas coordinate of the line (X for vertical, Y for horizontal).
    pub position: f64,
    pub kind: GuideKind,
}

/// Result of a guide snap.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapGuides {
    /// Adjusted top-left corner for the dragged element.
    pub snapped_position: Point,
    /// At most one guide per axis.
    pub guides: Vec<SnapGuide>,
}

impl SnapGuides {
    /// Check if either axis snapped.
    pub fn is_snapped(&self) -> bool {
        !self.guides.is_empty()
    }
}

/// One axis of an element: start edge, size.
#[derive(Clone, Copy)]
struct Span {
    start: f64,
    size: f64,
}

impl Span {
    fn end(self) -> f64 {
        self.start + self.size
    }

    fn center(self) -> f64 {
        self.start + self.size / 2.0
    }
}

/// Snap one axis against the first matching span.
/// Returns the new start coordinate and the matched guide.
fn snap_axis(
    span: Span,
    others: impl Iterator<Item = Span>,
    threshold: f64,
    orientation: GuideOrientation,
) -> Option<(f64, SnapGuide)> {
    let guide = |position, kind| SnapGuide {
        orientation,
        position,
        kind,
    };
    for other in others {
        if (span.start - other.start).abs() < threshold {
            return Some((other.start, guide(other.start, GuideKind::StartEdge)));
        }
        if (span.end() - other.end()).abs() < threshold {
            return Some((other.end() - span.size, guide(other.end(), GuideKind::EndEdge)));
        }
        if (span.center() - other.center()).abs() < threshold {
            return Some((
                other.center() - span.size / 2.0,
                guide(other.center(), GuideKind::Center),
            ));
        }
    }
    None
}

/// Compute smart-guide snapping for a dragged element.
///
/// Each axis is handled independently. Other elements are scanned in
/// iteration order and the first one with a start-edge, end-edge or center
/// match within `threshold` wins; later candidates are not considered.
pub fn calculate_snap_guides(element: &Element, others: &[Element], threshold: f64) -> SnapGuides {
    let bounds = element_bounds(element);
    let candidates: Vec<_> = others
        .iter()
        .filter(|other| other.id != element.id)
        .map(element_bounds)
        .collect();

    let mut snapped_position = Point::new(bounds.x0, bounds.y0);
    let mut guides = Vec::with_capacity(2);

    let x_span = Span {
        start: bounds.x0,
        size: bounds.width(),
    };
    let x_others = candidates.iter().map(|b| Span {
        start: b.x0,
        size: b.width(),
    });
    if let Some((x, guide)) = snap_axis(x_span, x_others, threshold, GuideOrientation::Vertical) {
        snapped_position.x = x;
        guides.push(guide);
    }

    let y_span = Span {
        start: bounds.y0,
        size: bounds.height(),
    };
    let y_others = candidates.iter().map(|b| Span {
        start: b.y0,
        size: b.height(),
    });
    if let Some((y, guide)) = snap_axis(y_span, y_others, threshold, GuideOrientation::Horizontal) {
        snapped_position.y = y;
        guides.push(guide);
    }

    SnapGuides {
        snapped_position,
        guides,
    }
}
