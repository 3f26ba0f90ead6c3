//! Operations over the full element collection.
//!
//! Every function takes the current collection by reference and returns a
//! new one; nothing here holds state. Single-id operations fail with
//! [`EditorError::ElementNotFound`] for ids that are not in the collection.

mod arrange;
mod grouping;

pub use arrange::{
    AlignMode, DistributeDirection, align_elements, bring_forward, bring_to_front,
    distribute_elements, move_elements, resize_element, send_backward, send_to_back,
};
pub use grouping::{create_group, ungroup_elements};

use crate::element::{Element, ElementId, ElementKind, ElementPatch};
use crate::error::{EditorError, EditorResult};
use crate::factory::{clone_element, clone_subtree};
use crate::geometry::{self, element_bounds};
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Look up an element by id.
pub fn find_element_by_id<'a>(elements: &'a [Element], id: &str) -> Option<&'a Element> {
    elements.iter().find(|el| el.id == id)
}

/// Look up several elements, in collection order. Unknown ids are ignored.
pub fn find_elements_by_ids<'a>(elements: &'a [Element], ids: &[ElementId]) -> Vec<&'a Element> {
    elements.iter().filter(|el| ids.contains(&el.id)).collect()
}

pub fn get_elements_by_type(elements: &[Element], kind: ElementKind) -> Vec<&Element> {
    elements.iter().filter(|el| el.kind == kind).collect()
}

/// Direct members of `group_id`.
pub fn get_child_elements<'a>(elements: &'a [Element], group_id: &str) -> Vec<&'a Element> {
    elements
        .iter()
        .filter(|el| el.parent_id.as_deref() == Some(group_id))
        .collect()
}

/// Elements with no parent. A `parentId` pointing at a missing element
/// counts as no parent.
pub fn get_top_level_elements(elements: &[Element]) -> Vec<&Element> {
    elements.iter().filter(|el| is_top_level(elements, el)).collect()
}

pub(crate) fn is_top_level(elements: &[Element], element: &Element) -> bool {
    match &element.parent_id {
        None => true,
        Some(parent) => find_element_by_id(elements, parent).is_none(),
    }
}

/// Canvas position of an element, adding up the origins of its ancestors.
pub fn absolute_position(elements: &[Element], id: &str) -> Option<Point> {
    let element = find_element_by_id(elements, id)?;
    let mut position = element.position();
    let mut parent = element.parent_id.as_deref();
    // A malformed parent cycle cannot be longer than the collection.
    for _ in 0..elements.len() {
        let Some(group) = parent.and_then(|p| find_element_by_id(elements, p)) else {
            break;
        };
        position += group.position().to_vec2();
        parent = group.parent_id.as_deref();
    }
    Some(position)
}

/// Ids of every element below `id` in the group tree.
pub(crate) fn descendant_ids(elements: &[Element], id: &str) -> Vec<ElementId> {
    let mut found: Vec<ElementId> = Vec::new();
    let mut pending = vec![id.to_string()];
    while let Some(current) = pending.pop() {
        for child in get_child_elements(elements, &current) {
            if child.id != id && !found.contains(&child.id) {
                found.push(child.id.clone());
                pending.push(child.id.clone());
            }
        }
    }
    found
}

/// Remove one element. See [`delete_elements`].
pub fn delete_element(elements: &[Element], id: &str) -> Vec<Element> {
    delete_elements(elements, &[id.to_string()])
}

/// Remove elements by id.
///
/// Deleting a group also deletes everything inside it. Deleted members are
/// dropped from their surviving parent's `childIds`.
pub fn delete_elements(elements: &[Element], ids: &[ElementId]) -> Vec<Element> {
    let mut doomed: HashSet<ElementId> = ids.iter().cloned().collect();
    for id in ids {
        doomed.extend(descendant_ids(elements, id));
    }

    elements
        .iter()
        .filter(|el| !doomed.contains(&el.id))
        .cloned()
        .map(|mut el| {
            if let Some(children) = &mut el.child_ids {
                children.retain(|child| !doomed.contains(child));
            }
            el
        })
        .collect()
}

/// Apply a patch to one element.
pub fn update_element(elements: &[Element], id: &str, patch: &ElementPatch) -> EditorResult<Vec<Element>> {
    let index = elements
        .iter()
        .position(|el| el.id == id)
        .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
    let mut updated = elements.to_vec();
    patch.apply(&mut updated[index]);
    Ok(updated)
}

/// Apply several patches. Fails without changes if any id is missing.
pub fn update_elements(
    elements: &[Element],
    updates: &[(ElementId, ElementPatch)],
) -> EditorResult<Vec<Element>> {
    let mut updated = elements.to_vec();
    for (id, patch) in updates {
        let element = updated
            .iter_mut()
            .find(|el| &el.id == id)
            .ok_or_else(|| EditorError::ElementNotFound(id.clone()))?;
        patch.apply(element);
    }
    Ok(updated)
}

/// Flip the `locked` flag of each listed element.
pub fn toggle_lock(elements: &[Element], ids: &[ElementId]) -> Vec<Element> {
    elements
        .iter()
        .cloned()
        .map(|mut el| {
            if ids.contains(&el.id) {
                el.locked = !el.locked;
            }
            el
        })
        .collect()
}

/// Copy an element (with its members, for a group) `offset` away and stack
/// the copy above everything else. The copy is appended last.
pub fn duplicate_element(elements: &[Element], id: &str, offset: Vec2) -> EditorResult<Vec<Element>> {
    let Some(original) = find_element_by_id(elements, id) else {
        log::warn!("Cannot duplicate missing element {id}");
        return Err(EditorError::ElementNotFound(id.to_string()));
    };
    let top = elements.iter().map(|el| el.style.z_index).max().unwrap_or_default();

    let mut copies = if original.is_group() {
        let mut subtree = vec![original.clone()];
        for child in descendant_ids(elements, id) {
            subtree.extend(find_element_by_id(elements, &child).cloned());
        }
        clone_subtree(&subtree, offset)
    } else {
        vec![clone_element(original, original.position() + offset, None)]
    };

    let mut updated = elements.to_vec();
    if let Some(root) = copies.first_mut() {
        root.style.z_index = top + 1;
        // A duplicated member stays in its group.
        if let Some(parent) = &original.parent_id {
            root.parent_id = Some(parent.clone());
            if let Some(group) = updated.iter_mut().find(|el| &el.id == parent) {
                group.child_ids.get_or_insert_with(Vec::new).push(root.id.clone());
            }
        }
    }
    // Members first, so the duplicated root ends up last.
    copies.rotate_left(1);
    updated.extend(copies);
    Ok(updated)
}

/// Check whether two elements overlap (touching edges do not count).
pub fn do_elements_overlap(a: &Element, b: &Element) -> bool {
    geometry::bounds_overlap(element_bounds(a), element_bounds(b), 0.0)
}

pub fn get_overlapping_elements<'a>(element: &Element, elements: &'a [Element]) -> Vec<&'a Element> {
    geometry::detect_collisions(element, elements, 0.0)
}

/// Elements under `point`, topmost first.
pub fn get_elements_at_position(elements: &[Element], point: Point) -> Vec<&Element> {
    geometry::elements_at_point(point, elements)
}

/// The element with the highest `zIndex` under `point`.
pub fn get_top_element_at_position(elements: &[Element], point: Point) -> Option<&Element> {
    elements
        .iter()
        .filter(|el| geometry::is_point_in_element(point, el))
        .max_by_key(|el| el.style.z_index)
}

/// Check if the whole element box lies inside the canvas.
pub fn is_element_within_bounds(element: &Element, canvas_size: Size) -> bool {
    let b = element_bounds(element);
    b.x0 >= 0.0 && b.y0 >= 0.0 && b.x1 <= canvas_size.width && b.y1 <= canvas_size.height
}

/// Element-level wrapper around [`geometry::constrain_to_canvas`].
pub fn constrain_element_to_canvas(element: &Element, canvas_size: Size) -> Element {
    let bounds = geometry::constrain_to_canvas(element_bounds(element), canvas_size);
    let mut constrained = element.clone();
    constrained.set_position(bounds.origin());
    constrained.set_size(bounds.size());
    constrained
}

/// Outcome of [`validate_element`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check required and type-specific fields. Never fails; problems are
/// collected into the report.
pub fn validate_element(element: &Element) -> ValidationReport {
    let mut errors = Vec::new();

    if element.id.trim().is_empty() {
        errors.push("Element must have an id".to_string());
    }
    if !element.style.x.is_finite() || !element.style.y.is_finite() {
        errors.push("Position must be numeric".to_string());
    }
    for (name, dim) in [("width", &element.style.width), ("height", &element.style.height)] {
        if !dim.is_parsed() {
            errors.push(format!("Element {name} is not a number: {dim}"));
        } else if dim.value() < 0.0 {
            errors.push(format!("Element {name} must not be negative"));
        }
    }

    let missing = |field: &Option<String>| field.as_deref().is_none_or(|s| s.trim().is_empty());
    match element.kind {
        ElementKind::Image if missing(&element.src) => {
            errors.push("Image elements must have a src".to_string());
        }
        ElementKind::Video if missing(&element.video_src) => {
            errors.push("Video elements must have a videoSrc".to_string());
        }
        ElementKind::Button if missing(&element.content) => {
            errors.push("Button elements must have content".to_string());
        }
        ElementKind::Group if element.child_ids.is_none() => {
            errors.push("Group elements must have childIds".to_string());
        }
        _ => {}
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Counts over an element collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStatistics {
    pub total: usize,
    pub by_type: BTreeMap<ElementKind, usize>,
    pub locked: usize,
    /// Elements that belong to a group.
    pub grouped: usize,
    pub top_level: usize,
}

pub fn get_element_statistics(elements: &[Element]) -> ElementStatistics {
    let mut stats = ElementStatistics {
        total: elements.len(),
        ..ElementStatistics::default()
    };
    for el in elements {
        *stats.by_type.entry(el.kind).or_default() += 1;
        if el.locked {
            stats.locked += 1;
        }
        if is_top_level(elements, el) {
            stats.top_level += 1;
        } else {
            stats.grouped += 1;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Dimension, ElementStyle};

    fn el(id: &str, x: f64, y: f64, w: f64, h: f64, z: i64) -> Element {
        Element::with_id(id, ElementKind::Shape, ElementStyle::new(x, y, w, h, z))
    }

    fn nested() -> Vec<Element> {
        let mut outer = el("outer", 100.0, 100.0, 300.0, 300.0, 10);
        outer.kind = ElementKind::Group;
        outer.child_ids = Some(vec!["inner".to_string(), "c".to_string()]);

        let mut inner = el("inner", 20.0, 30.0, 100.0, 100.0, 9);
        inner.kind = ElementKind::Group;
        inner.parent_id = Some("outer".to_string());
        inner.child_ids = Some(vec!["a".to_string(), "b".to_string()]);

        let mut a = el("a", 5.0, 5.0, 10.0, 10.0, 1);
        a.parent_id = Some("inner".to_string());
        let mut b = el("b", 50.0, 50.0, 10.0, 10.0, 2);
        b.parent_id = Some("inner".to_string());
        let mut c = el("c", 200.0, 0.0, 10.0, 10.0, 3);
        c.parent_id = Some("outer".to_string());

        vec![outer, inner, a, b, c, el("free", 0.0, 0.0, 10.0, 10.0, 4)]
    }

    #[test]
    fn test_find_and_filter() {
        let elements = nested();
        assert_eq!(find_element_by_id(&elements, "b").unwrap().id, "b");
        assert!(find_element_by_id(&elements, "zzz").is_none());
        assert_eq!(
            find_elements_by_ids(&elements, &["c".into(), "a".into(), "zzz".into()]).len(),
            2
        );
        assert_eq!(get_elements_by_type(&elements, ElementKind::Group).len(), 2);

        let kids: Vec<&str> = get_child_elements(&elements, "inner").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(kids, vec!["a", "b"]);

        let top: Vec<&str> = get_top_level_elements(&elements).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(top, vec!["outer", "free"]);
    }

    #[test]
    fn test_dangling_parent_is_top_level() {
        let mut orphan = el("orphan", 0.0, 0.0, 10.0, 10.0, 1);
        orphan.parent_id = Some("gone".to_string());
        let elements = vec![orphan];
        assert_eq!(get_top_level_elements(&elements).len(), 1);
        assert_eq!(absolute_position(&elements, "orphan"), Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_absolute_position_walks_ancestors() {
        let elements = nested();
        assert_eq!(absolute_position(&elements, "a"), Some(Point::new(125.0, 135.0)));
        assert_eq!(absolute_position(&elements, "c"), Some(Point::new(300.0, 100.0)));
        assert_eq!(absolute_position(&elements, "nope"), None);
    }

    #[test]
    fn test_delete_group_cascades() {
        let remaining = delete_element(&nested(), "inner");
        let ids: Vec<&str> = remaining.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["outer", "c", "free"]);
        assert_eq!(remaining[0].children(), ["c".to_string()]);
    }

    #[test]
    fn test_delete_member_updates_parent() {
        let remaining = delete_elements(&nested(), &["a".to_string(), "free".to_string()]);
        let inner = find_element_by_id(&remaining, "inner").unwrap();
        assert_eq!(inner.children(), ["b".to_string()]);
        assert_eq!(remaining.len(), 4);
    }

    #[test]
    fn test_update_element() {
        let elements = nested();
        let updated = update_element(&elements, "free", &ElementPatch::content("hello")).unwrap();
        let free = find_element_by_id(&updated, "free").unwrap();
        assert_eq!(free.content.as_deref(), Some("hello"));
        assert_eq!(free.kind, ElementKind::Shape);

        let err = update_element(&elements, "missing", &ElementPatch::content("x")).unwrap_err();
        assert!(matches!(err, EditorError::ElementNotFound(id) if id == "missing"));
    }

    #[test]
    fn test_update_elements_is_all_or_nothing() {
        let elements = nested();
        let updates = vec![
            ("a".to_string(), ElementPatch::position(1.0, 1.0)),
            ("missing".to_string(), ElementPatch::position(2.0, 2.0)),
        ];
        assert!(update_elements(&elements, &updates).is_err());

        let ok = update_elements(&elements, &updates[..1]).unwrap();
        assert_eq!(find_element_by_id(&ok, "a").unwrap().position(), Point::new(1.0, 1.0));
    }

    #[test]
    fn test_toggle_lock() {
        let elements = toggle_lock(&nested(), &["free".to_string()]);
        assert!(find_element_by_id(&elements, "free").unwrap().locked);
        let elements = toggle_lock(&elements, &["free".to_string()]);
        assert!(!find_element_by_id(&elements, "free").unwrap().locked);
    }

    #[test]
    fn test_duplicate_element() {
        let elements = nested();
        let updated = duplicate_element(&elements, "free", Vec2::new(20.0, 20.0)).unwrap();
        assert_eq!(updated.len(), elements.len() + 1);
        let copy = updated.last().unwrap();
        assert_ne!(copy.id, "free");
        assert_eq!(copy.position(), Point::new(20.0, 20.0));
        assert_eq!(copy.style.z_index, 11);

        assert!(matches!(
            duplicate_element(&elements, "ghost", Vec2::ZERO),
            Err(EditorError::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_group_copies_members() {
        let elements = nested();
        let updated = duplicate_element(&elements, "inner", Vec2::new(10.0, 0.0)).unwrap();
        assert_eq!(updated.len(), elements.len() + 3);

        let copy = updated.last().unwrap();
        assert!(copy.is_group());
        assert_eq!(copy.parent_id.as_deref(), Some("outer"));
        assert_eq!(copy.position(), Point::new(30.0, 30.0));
        assert_eq!(get_child_elements(&updated, &copy.id).len(), 2);

        let outer = find_element_by_id(&updated, "outer").unwrap();
        assert!(outer.children().contains(&copy.id));
    }

    #[test]
    fn test_hit_testing() {
        let elements = vec![
            el("low", 0.0, 0.0, 100.0, 100.0, 1),
            el("high", 50.0, 50.0, 100.0, 100.0, 5),
        ];
        assert!(do_elements_overlap(&elements[0], &elements[1]));
        assert_eq!(get_overlapping_elements(&elements[0], &elements).len(), 1);
        assert_eq!(get_elements_at_position(&elements, Point::new(60.0, 60.0)).len(), 2);
        assert_eq!(
            get_top_element_at_position(&elements, Point::new(60.0, 60.0)).unwrap().id,
            "high"
        );
        assert!(get_top_element_at_position(&elements, Point::new(500.0, 500.0)).is_none());
    }

    #[test]
    fn test_bounds_checks() {
        let canvas = Size::new(800.0, 600.0);
        let inside = el("a", 0.0, 0.0, 800.0, 600.0, 1);
        let outside = el("b", 750.0, 10.0, 100.0, 100.0, 1);
        assert!(is_element_within_bounds(&inside, canvas));
        assert!(!is_element_within_bounds(&outside, canvas));

        let fixed = constrain_element_to_canvas(&outside, canvas);
        assert_eq!(fixed.position(), Point::new(700.0, 10.0));
        assert!(is_element_within_bounds(&fixed, canvas));
    }

    #[test]
    fn test_validate_element() {
        let ok = el("a", 0.0, 0.0, 10.0, 10.0, 1);
        assert!(validate_element(&ok).is_valid);

        let mut image = Element::with_id("img", ElementKind::Image, ElementStyle::new(0.0, 0.0, 10.0, 10.0, 1));
        image.style.height = Dimension::parse("auto");
        let report = validate_element(&image);
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 2);

        let button = Element::with_id("", ElementKind::Button, ElementStyle::new(f64::NAN, 0.0, 10.0, 10.0, 1));
        let report = validate_element(&button);
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn test_statistics() {
        let mut elements = nested();
        elements[5].locked = true;
        let stats = get_element_statistics(&elements);
        assert_eq!(stats.total, 6);
        assert_eq!(stats.by_type[&ElementKind::Group], 2);
        assert_eq!(stats.by_type[&ElementKind::Shape], 4);
        assert_eq!(stats.locked, 1);
        assert_eq!(stats.grouped, 4);
        assert_eq!(stats.top_level, 2);
    }
}
