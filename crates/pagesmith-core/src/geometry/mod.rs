//! Pure geometry over element bounds.
//!
//! Nothing here fails: malformed input (unparsable dimensions, a zero grid)
//! degrades to a neutral result instead of an error.

mod resize;
mod snap;

pub use resize::{ResizeHandle, calculate_resize_constraints};
pub use snap::{
    GuideKind, GuideOrientation, SnapGuide, SnapGuides, calculate_snap_guides, snap_to_grid,
};

use crate::element::Element;
use kurbo::{Point, Rect, Size};
use std::cmp::Reverse;

/// Convert a screen point to canvas coordinates.
///
/// `canvas_origin` is the screen position of the canvas' top-left corner.
pub fn screen_to_canvas(screen_point: Point, canvas_origin: Point) -> Point {
    Point::new(screen_point.x - canvas_origin.x, screen_point.y - canvas_origin.y)
}

/// Convert a canvas point to screen coordinates.
pub fn canvas_to_screen(canvas_point: Point, canvas_origin: Point) -> Point {
    canvas_point + canvas_origin.to_vec2()
}

/// Bounds of an element as stored (group-relative for grouped elements).
///
/// `x0`/`y0`/`x1`/`y1` are left/top/right/bottom.
pub fn element_bounds(element: &Element) -> Rect {
    let x = element.style.x;
    let y = element.style.y;
    let size = element.size();
    Rect::new(x, y, x + size.width, y + size.height)
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(b)
}

/// Check whether two bounds overlap by more than `tolerance` on both axes.
pub fn bounds_overlap(a: Rect, b: Rect, tolerance: f64) -> bool {
    a.x0 + tolerance < b.x1
        && a.x1 - tolerance > b.x0
        && a.y0 + tolerance < b.y1
        && a.y1 - tolerance > b.y0
}

/// Elements in `others` whose bounds overlap `element`.
///
/// A positive `tolerance` requires the overlap to exceed that many pixels
/// on each axis. The element itself is never reported.
pub fn detect_collisions<'a>(
    element: &Element,
    others: &'a [Element],
    tolerance: f64,
) -> Vec<&'a Element> {
    let bounds = element_bounds(element);
    others
        .iter()
        .filter(|other| other.id != element.id)
        .filter(|other| bounds_overlap(bounds, element_bounds(other), tolerance))
        .collect()
}

/// Clamp bounds into the canvas.
///
/// The origin is moved first; only if the box is larger than the canvas is
/// its size reduced.
pub fn constrain_to_canvas(bounds: Rect, canvas_size: Size) -> Rect {
    let width = bounds.width();
    let height = bounds.height();

    let x = bounds.x0.min((canvas_size.width - width).max(0.0)).max(0.0);
    let y = bounds.y0.min((canvas_size.height - height).max(0.0)).max(0.0);
    let width = if x + width > canvas_size.width {
        (canvas_size.width - x).max(0.0)
    } else {
        width
    };
    let height = if y + height > canvas_size.height {
        (canvas_size.height - y).max(0.0)
    } else {
        height
    };

    Rect::new(x, y, x + width, y + height)
}

/// Grid line positions from 0 up to (and including) each canvas bound.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridLines {
    /// X positions of vertical lines.
    pub vertical: Vec<f64>,
    /// Y positions of horizontal lines.
    pub horizontal: Vec<f64>,
}

/// Evenly spaced grid lines for a canvas.
pub fn calculate_grid_lines(canvas_size: Size, grid_size: f64) -> GridLines {
    if grid_size <= 0.0 {
        return GridLines::default();
    }
    let lines = |bound: f64| -> Vec<f64> {
        if bound < 0.0 {
            return Vec::new();
        }
        let count = (bound / grid_size).floor() as usize;
        (0..=count).map(|i| i as f64 * grid_size).collect()
    };
    GridLines {
        vertical: lines(canvas_size.width),
        horizontal: lines(canvas_size.height),
    }
}

/// Zoom that fits the canvas into the container, never above 100%.
pub fn calculate_optimal_zoom(canvas_size: Size, container_size: Size, padding: f64) -> f64 {
    if canvas_size.width <= 0.0 || canvas_size.height <= 0.0 {
        return 1.0;
    }
    let available = Size::new(
        (container_size.width - padding * 2.0).max(0.0),
        (container_size.height - padding * 2.0).max(0.0),
    );
    let scale_x = available.width / canvas_size.width;
    let scale_y = available.height / canvas_size.height;
    scale_x.min(scale_y).min(1.0)
}

/// Check if a point lies inside an element (edges inclusive).
pub fn is_point_in_element(point: Point, element: &Element) -> bool {
    let b = element_bounds(element);
    point.x >= b.x0 && point.x <= b.x1 && point.y >= b.y0 && point.y <= b.y1
}

/// Elements containing `point`, topmost (highest `z_index`) first.
pub fn elements_at_point(point: Point, elements: &[Element]) -> Vec<&Element> {
    let mut hits: Vec<&Element> = elements
        .iter()
        .filter(|el| is_point_in_element(point, el))
        .collect();
    hits.sort_by_key(|el| Reverse(el.style.z_index));
    hits
}

/// Union of all element bounds; `Rect::ZERO` for an empty slice.
pub fn calculate_bounding_box<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Rect {
    elements
        .into_iter()
        .map(element_bounds)
        .reduce(|acc, b| acc.union(b))
        .unwrap_or(Rect::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementKind, ElementStyle};

    fn el(id: &str, x: f64, y: f64, w: f64, h: f64, z: i64) -> Element {
        Element::with_id(id, ElementKind::Shape, ElementStyle::new(x, y, w, h, z))
    }

    #[test]
    fn test_screen_canvas_roundtrip() {
        let origin = Point::new(240.0, 64.0);
        let canvas = screen_to_canvas(Point::new(300.0, 100.0), origin);
        assert_eq!(canvas, Point::new(60.0, 36.0));
        assert_eq!(canvas_to_screen(canvas, origin), Point::new(300.0, 100.0));
    }

    #[test]
    fn test_element_bounds_with_units() {
        let mut e = el("a", 10.0, 20.0, 0.0, 0.0, 1);
        e.style.width = "100px".into();
        e.style.height = "auto".into();
        let b = element_bounds(&e);
        assert!((b.x1 - 110.0).abs() < f64::EPSILON);
        assert!((b.height() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distance() {
        assert!((distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_detect_collisions_scenario() {
        let first = el("first", 0.0, 0.0, 100.0, 100.0, 1);
        let second = el("second", 90.0, 0.0, 100.0, 100.0, 2);
        let third = el("third", 300.0, 300.0, 50.0, 50.0, 3);
        let others = vec![second.clone(), third];

        let hits = detect_collisions(&first, &others, 0.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "second");

        // 10px overlap does not count with a 10px tolerance
        assert!(detect_collisions(&first, &others, 10.0).is_empty());
    }

    #[test]
    fn test_collision_symmetry() {
        let cases = [
            (el("a", 0.0, 0.0, 50.0, 50.0, 1), el("b", 49.0, 49.0, 10.0, 10.0, 1)),
            (el("a", 0.0, 0.0, 50.0, 50.0, 1), el("b", 50.0, 0.0, 10.0, 10.0, 1)),
            (el("a", 10.0, 10.0, 5.0, 5.0, 1), el("b", 0.0, 0.0, 100.0, 100.0, 1)),
        ];
        for (a, b) in cases {
            for tolerance in [0.0, 2.0] {
                let ab = !detect_collisions(&a, std::slice::from_ref(&b), tolerance).is_empty();
                let ba = !detect_collisions(&b, std::slice::from_ref(&a), tolerance).is_empty();
                assert_eq!(ab, ba);
            }
        }
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let a = el("a", 0.0, 0.0, 50.0, 50.0, 1);
        let b = el("b", 50.0, 0.0, 50.0, 50.0, 1);
        assert!(detect_collisions(&a, &[b], 0.0).is_empty());
    }

    #[test]
    fn test_collision_skips_self() {
        let a = el("a", 0.0, 0.0, 50.0, 50.0, 1);
        assert!(detect_collisions(&a, std::slice::from_ref(&a), 0.0).is_empty());
    }

    #[test]
    fn test_constrain_moves_origin_first() {
        let canvas = Size::new(800.0, 600.0);
        let b = constrain_to_canvas(Rect::new(750.0, -20.0, 850.0, 80.0), canvas);
        assert_eq!(b, Rect::new(700.0, 0.0, 800.0, 100.0));
    }

    #[test]
    fn test_constrain_shrinks_oversized() {
        let canvas = Size::new(800.0, 600.0);
        let b = constrain_to_canvas(Rect::new(100.0, 100.0, 1100.0, 300.0), canvas);
        assert_eq!(b, Rect::new(0.0, 100.0, 800.0, 300.0));
    }

    #[test]
    fn test_constrain_idempotent() {
        let canvas = Size::new(640.0, 480.0);
        let inputs = [
            Rect::new(-50.0, -50.0, 50.0, 50.0),
            Rect::new(600.0, 400.0, 900.0, 700.0),
            Rect::new(-10.0, 20.0, 1000.0, 30.0),
            Rect::new(10.0, 10.0, 20.0, 20.0),
        ];
        for input in inputs {
            let once = constrain_to_canvas(input, canvas);
            assert_eq!(constrain_to_canvas(once, canvas), once);
        }
    }

    #[test]
    fn test_grid_lines_inclusive() {
        let lines = calculate_grid_lines(Size::new(100.0, 50.0), 25.0);
        assert_eq!(lines.vertical, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(lines.horizontal, vec![0.0, 25.0, 50.0]);
        assert_eq!(calculate_grid_lines(Size::new(100.0, 50.0), 0.0), GridLines::default());
    }

    #[test]
    fn test_optimal_zoom_never_upscales() {
        let canvas = Size::new(1200.0, 800.0);
        assert!((calculate_optimal_zoom(canvas, Size::new(2000.0, 2000.0), 20.0) - 1.0).abs() < f64::EPSILON);
        let zoom = calculate_optimal_zoom(canvas, Size::new(640.0, 800.0), 20.0);
        assert!((zoom - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_elements_at_point_sorted_by_z() {
        let elements = vec![
            el("low", 0.0, 0.0, 100.0, 100.0, 1),
            el("high", 50.0, 50.0, 100.0, 100.0, 5),
            el("mid", 0.0, 0.0, 60.0, 60.0, 3),
        ];
        let hits = elements_at_point(Point::new(55.0, 55.0), &elements);
        let ids: Vec<&str> = hits.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);

        // Edges are inclusive
        assert!(is_point_in_element(Point::new(100.0, 100.0), &elements[0]));
        assert!(!is_point_in_element(Point::new(100.1, 50.0), &elements[0]));
    }

    #[test]
    fn test_bounding_box() {
        let elements = vec![
            el("a", 10.0, 10.0, 20.0, 20.0, 1),
            el("b", 50.0, 50.0, 30.0, 30.0, 2),
        ];
        assert_eq!(calculate_bounding_box(&elements), Rect::new(10.0, 10.0, 80.0, 80.0));
        assert_eq!(calculate_bounding_box(&Vec::<Element>::new()), Rect::ZERO);
    }
}
