//! Moving, resizing, stacking and lining up elements.

use super::{absolute_position, find_element_by_id};
use crate::element::{Element, ElementId};
use crate::error::{EditorError, EditorResult};
use crate::geometry::element_bounds;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Translate the listed elements by `delta`. Locked elements stay put.
pub fn move_elements(elements: &[Element], ids: &[ElementId], delta: Vec2) -> Vec<Element> {
    elements
        .iter()
        .cloned()
        .map(|mut el| {
            if ids.contains(&el.id) {
                if el.locked {
                    log::debug!("Skipping locked element {} in move", el.id);
                } else {
                    el.set_position(el.position() + delta);
                }
            }
            el
        })
        .collect()
}

/// Replace an element's size and optionally its position.
///
/// Unit suffixes on the existing width/height are kept.
pub fn resize_element(element: &Element, new_size: Size, new_position: Option<Point>) -> Element {
    let mut resized = element.clone();
    resized.set_size(new_size);
    if let Some(position) = new_position {
        resized.set_position(position);
    }
    resized
}

fn with_z_index(elements: &[Element], id: &str, z_index: i64) -> Vec<Element> {
    elements
        .iter()
        .cloned()
        .map(|mut el| {
            if el.id == id {
                el.style.z_index = z_index;
            }
            el
        })
        .collect()
}

fn require<'a>(elements: &'a [Element], id: &str) -> EditorResult<&'a Element> {
    find_element_by_id(elements, id).ok_or_else(|| {
        log::warn!("Element {id} not found");
        EditorError::ElementNotFound(id.to_string())
    })
}

/// Stack an element above everything (`max zIndex + 1`).
pub fn bring_to_front(elements: &[Element], id: &str) -> EditorResult<Vec<Element>> {
    require(elements, id)?;
    let max = elements.iter().map(|el| el.style.z_index).max().unwrap_or_default();
    Ok(with_z_index(elements, id, max + 1))
}

/// Stack an element below everything (`min zIndex - 1`).
pub fn send_to_back(elements: &[Element], id: &str) -> EditorResult<Vec<Element>> {
    require(elements, id)?;
    let min = elements.iter().map(|el| el.style.z_index).min().unwrap_or_default();
    Ok(with_z_index(elements, id, min - 1))
}

/// Swap `zIndex` with the nearest element above. No-op when already on top.
pub fn bring_forward(elements: &[Element], id: &str) -> EditorResult<Vec<Element>> {
    let target = require(elements, id)?;
    let z = target.style.z_index;
    let above = elements
        .iter()
        .filter(|el| el.id != id && el.style.z_index > z)
        .min_by_key(|el| el.style.z_index);
    Ok(match above {
        Some(other) => swap_z(elements, target, other),
        None => elements.to_vec(),
    })
}

/// Swap `zIndex` with the nearest element below. No-op when already at the bottom.
pub fn send_backward(elements: &[Element], id: &str) -> EditorResult<Vec<Element>> {
    let target = require(elements, id)?;
    let z = target.style.z_index;
    let below = elements
        .iter()
        .filter(|el| el.id != id && el.style.z_index < z)
        .max_by_key(|el| el.style.z_index);
    Ok(match below {
        Some(other) => swap_z(elements, target, other),
        None => elements.to_vec(),
    })
}

fn swap_z(elements: &[Element], a: &Element, b: &Element) -> Vec<Element> {
    let (a_id, a_z) = (a.id.as_str(), a.style.z_index);
    let (b_id, b_z) = (b.id.as_str(), b.style.z_index);
    elements
        .iter()
        .cloned()
        .map(|mut el| {
            if el.id == a_id {
                el.style.z_index = b_z;
            } else if el.id == b_id {
                el.style.z_index = a_z;
            }
            el
        })
        .collect()
}

/// Edge or center to line elements up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignMode {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

/// Bounds of an element in canvas space.
fn canvas_bounds(elements: &[Element], el: &Element) -> Rect {
    let bounds = element_bounds(el);
    match absolute_position(elements, &el.id) {
        Some(origin) => bounds.with_origin(origin),
        None => bounds,
    }
}

/// Offset from an element's stored origin to its canvas origin.
fn parent_offset(elements: &[Element], el: &Element) -> Vec2 {
    absolute_position(elements, &el.id)
        .map(|abs| abs - el.position())
        .unwrap_or(Vec2::ZERO)
}

/// Align the listed elements against their combined bounding box.
///
/// Works in canvas space, so grouped and top-level elements can be mixed.
pub fn align_elements(elements: &[Element], ids: &[ElementId], mode: AlignMode) -> Vec<Element> {
    let bounds = elements
        .iter()
        .filter(|el| ids.contains(&el.id))
        .map(|el| canvas_bounds(elements, el))
        .reduce(|acc, b| acc.union(b))
        .unwrap_or(Rect::ZERO);
    elements
        .iter()
        .cloned()
        .map(|mut el| {
            if !ids.contains(&el.id) {
                return el;
            }
            let offset = parent_offset(elements, &el);
            let size = el.size();
            match mode {
                AlignMode::Left => el.style.x = bounds.x0 - offset.x,
                AlignMode::Center => el.style.x = bounds.center().x - size.width / 2.0 - offset.x,
                AlignMode::Right => el.style.x = bounds.x1 - size.width - offset.x,
                AlignMode::Top => el.style.y = bounds.y0 - offset.y,
                AlignMode::Middle => el.style.y = bounds.center().y - size.height / 2.0 - offset.y,
                AlignMode::Bottom => el.style.y = bounds.y1 - size.height - offset.y,
            }
            el
        })
        .collect()
}

/// Axis to distribute along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributeDirection {
    Horizontal,
    Vertical,
}

/// Space the listed elements with equal gaps between neighbouring edges.
///
/// The outermost two elements stay in place. Fewer than three elements is a
/// no-op.
pub fn distribute_elements(
    elements: &[Element],
    ids: &[ElementId],
    direction: DistributeDirection,
) -> Vec<Element> {
    let horizontal = direction == DistributeDirection::Horizontal;
    // (leading edge, extent) along the axis
    let span = |el: &Element| {
        let b = canvas_bounds(elements, el);
        if horizontal {
            (b.x0, b.width())
        } else {
            (b.y0, b.height())
        }
    };

    let mut selected: Vec<&Element> = elements.iter().filter(|el| ids.contains(&el.id)).collect();
    if selected.len() < 3 {
        return elements.to_vec();
    }
    selected.sort_by(|a, b| span(a).0.total_cmp(&span(b).0));

    let (first_start, first_size) = span(selected[0]);
    let (last_start, _) = span(selected[selected.len() - 1]);
    let interior = &selected[1..selected.len() - 1];
    let occupied: f64 = interior.iter().map(|el| span(el).1).sum();
    let gap = (last_start - (first_start + first_size) - occupied) / (selected.len() - 1) as f64;

    let mut placements: Vec<(ElementId, f64)> = Vec::with_capacity(interior.len());
    let mut cursor = first_start + first_size;
    for el in interior {
        let start = cursor + gap;
        placements.push((el.id.clone(), start));
        cursor = start + span(el).1;
    }

    elements
        .iter()
        .cloned()
        .map(|mut el| {
            if let Some((_, start)) = placements.iter().find(|(id, _)| *id == el.id) {
                let offset = parent_offset(elements, &el);
                if horizontal {
                    el.style.x = *start - offset.x;
                } else {
                    el.style.y = *start - offset.y;
                }
            }
            el
        })
        .collect()
}
