//! Grouping and ungrouping over the full collection.

use super::{absolute_position, find_element_by_id};
use crate::element::{Element, ElementId};
use crate::error::{EditorError, EditorResult};
use crate::factory::{GroupCreation, create_group_from_elements};
use kurbo::Point;
use std::collections::HashSet;

/// Group the selected elements.
///
/// Selected elements that already belong to a group are converted to
/// absolute coordinates and detached from it first. When every selected
/// element shared the same parent, the new group is nested in that parent;
/// otherwise it is top-level.
///
/// On success `updated_elements` is the full collection with the group
/// appended last.
pub fn create_group(elements: &[Element], selected_ids: &[ElementId]) -> EditorResult<GroupCreation> {
    if selected_ids.len() < 2 {
        log::warn!("Group needs at least 2 elements, got {}", selected_ids.len());
        return Err(EditorError::InsufficientSelection {
            required: 2,
            found: selected_ids.len(),
        });
    }

    let selected: HashSet<&str> = selected_ids.iter().map(String::as_str).collect();
    let members: Vec<Element> = elements
        .iter()
        .filter(|el| selected.contains(el.id.as_str()))
        .map(|el| {
            let mut absolute = el.clone();
            if let Some(position) = absolute_position(elements, &el.id) {
                absolute.set_position(position);
            }
            absolute.parent_id = None;
            absolute
        })
        .collect();
    if members.len() < 2 {
        log::warn!("Group needs at least 2 elements, found {}", members.len());
        return Err(EditorError::InsufficientSelection {
            required: 2,
            found: members.len(),
        });
    }

    let shared_parent = common_parent(elements, &selected);
    let GroupCreation {
        mut group,
        updated_elements: children,
    } = create_group_from_elements(&members)?;

    if let Some(parent) = &shared_parent {
        let parent_origin = absolute_position(elements, parent).unwrap_or(Point::ZERO);
        group.set_position(group.position() - parent_origin.to_vec2());
        group.parent_id = Some(parent.clone());
    }

    let mut updated: Vec<Element> = elements
        .iter()
        .map(|el| {
            let mut el = children
                .iter()
                .find(|c| c.id == el.id)
                .unwrap_or(el)
                .clone();
            // A selected group may itself hold other selected elements.
            if let Some(child_ids) = &mut el.child_ids {
                let had_members = child_ids.iter().any(|id| selected.contains(id.as_str()));
                child_ids.retain(|id| !selected.contains(id.as_str()));
                if had_members && shared_parent.as_deref() == Some(el.id.as_str()) {
                    child_ids.push(group.id.clone());
                }
            }
            el
        })
        .collect();
    updated.push(group.clone());

    log::debug!(
        "Grouped {} elements into {}{}",
        children.len(),
        group.id,
        shared_parent
            .as_deref()
            .map(|p| format!(" inside {p}"))
            .unwrap_or_default()
    );
    Ok(GroupCreation {
        group,
        updated_elements: updated,
    })
}

/// The parent shared by every selected element, if it exists.
fn common_parent(elements: &[Element], selected: &HashSet<&str>) -> Option<ElementId> {
    let mut parents = elements
        .iter()
        .filter(|el| selected.contains(el.id.as_str()))
        .map(|el| el.parent_id.as_deref());
    let first = parents.next()??;
    if parents.all(|p| p == Some(first)) && find_element_by_id(elements, first).is_some() {
        Some(first.to_string())
    } else {
        None
    }
}

/// Dissolve a group.
///
/// Members get the group's origin added back and move up to the group's own
/// parent (top-level for a top-level group). The group element is removed.
pub fn ungroup_elements(elements: &[Element], group_id: &str) -> EditorResult<Vec<Element>> {
    let group = find_element_by_id(elements, group_id).ok_or_else(|| {
        log::warn!("Cannot ungroup missing element {group_id}");
        EditorError::ElementNotFound(group_id.to_string())
    })?;
    let child_ids = match &group.child_ids {
        Some(ids) if group.is_group() => ids.clone(),
        _ => {
            log::warn!("Cannot ungroup {group_id}: not a group");
            return Err(EditorError::NotAGroup(group_id.to_string()));
        }
    };

    let offset = group.position().to_vec2();
    let grandparent = group.parent_id.clone();

    let updated: Vec<Element> = elements
        .iter()
        .filter(|el| el.id != group_id)
        .cloned()
        .map(|mut el| {
            if child_ids.contains(&el.id) {
                el.set_position(el.position() + offset);
                el.parent_id = grandparent.clone();
            } else if grandparent.as_deref() == Some(el.id.as_str()) {
                if let Some(siblings) = &mut el.child_ids {
                    let at = siblings.iter().position(|id| id == group_id);
                    siblings.retain(|id| id != group_id);
                    let at = at.unwrap_or(siblings.len());
                    siblings.splice(at..at, child_ids.iter().cloned());
                }
            }
            el
        })
        .collect();

    log::debug!("Ungrouped {group_id} ({} members)", child_ids.len());
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementKind, ElementStyle};
    use crate::management::get_child_elements;

    fn el(id: &str, x: f64, y: f64, w: f64, h: f64, z: i64) -> Element {
        Element::with_id(id, ElementKind::Shape, ElementStyle::new(x, y, w, h, z))
    }

    fn ids(list: &[&str]) -> Vec<ElementId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_group_rebases_children() {
        let elements = vec![
            el("a", 10.0, 10.0, 20.0, 20.0, 1),
            el("b", 50.0, 50.0, 30.0, 30.0, 2),
            el("c", 500.0, 500.0, 10.0, 10.0, 3),
        ];
        let created = create_group(&elements, &ids(&["a", "b"])).unwrap();
        let updated = &created.updated_elements;
        assert_eq!(updated.len(), 4);
        assert_eq!(updated.last().unwrap().id, created.group.id);
        assert_eq!(created.group.style.z_index, 3);

        assert_eq!(updated[0].position(), Point::new(0.0, 0.0));
        assert_eq!(updated[1].position(), Point::new(40.0, 40.0));
        assert!(updated[2].parent_id.is_none());
        assert_eq!(get_child_elements(updated, &created.group.id).len(), 2);
    }

    #[test]
    fn test_group_errors() {
        let elements = vec![el("a", 0.0, 0.0, 10.0, 10.0, 1)];
        assert!(matches!(
            create_group(&elements, &ids(&["a"])),
            Err(EditorError::InsufficientSelection { required: 2, found: 1 })
        ));
        assert!(matches!(
            create_group(&elements, &ids(&["a", "ghost"])),
            Err(EditorError::InsufficientSelection { required: 2, found: 1 })
        ));
    }

    #[test]
    fn test_ungroup_errors() {
        let elements = vec![el("a", 0.0, 0.0, 10.0, 10.0, 1)];
        assert!(matches!(
            ungroup_elements(&elements, "a"),
            Err(EditorError::NotAGroup(id)) if id == "a"
        ));
        assert!(matches!(
            ungroup_elements(&elements, "nope"),
            Err(EditorError::ElementNotFound(_))
        ));

        let mut broken = Element::with_id("g", ElementKind::Group, ElementStyle::default());
        broken.child_ids = None;
        assert!(matches!(ungroup_elements(&[broken], "g"), Err(EditorError::NotAGroup(_))));
    }

    #[test]
    fn test_group_ungroup_roundtrip() {
        let elements = vec![
            el("a", 13.5, -7.25, 20.0, 20.0, 1),
            el("b", 250.0, 40.0, 30.0, 60.0, 2),
            el("c", -30.0, 410.0, 5.0, 5.0, 3),
        ];
        let created = create_group(&elements, &ids(&["a", "b", "c"])).unwrap();
        let restored = ungroup_elements(&created.updated_elements, &created.group.id).unwrap();

        assert_eq!(restored.len(), 3);
        for (before, after) in elements.iter().zip(&restored) {
            assert_eq!(before.id, after.id);
            assert!((before.style.x - after.style.x).abs() < 1e-9);
            assert!((before.style.y - after.style.y).abs() < 1e-9);
            assert!(after.parent_id.is_none());
        }
    }

    #[test]
    fn test_nested_group_and_ungroup() {
        let elements = vec![
            el("a", 10.0, 10.0, 10.0, 10.0, 1),
            el("b", 100.0, 100.0, 10.0, 10.0, 2),
            el("c", 200.0, 10.0, 10.0, 10.0, 3),
        ];
        let outer = create_group(&elements, &ids(&["a", "b", "c"])).unwrap();
        let outer_id = outer.group.id.clone();

        // Group two members of the outer group: the new group nests inside it.
        let inner = create_group(&outer.updated_elements, &ids(&["a", "b"])).unwrap();
        let inner_id = inner.group.id.clone();
        assert_eq!(inner.group.parent_id.as_ref(), Some(&outer_id));
        assert_eq!(inner.group.position(), Point::new(0.0, 0.0));
        assert_eq!(
            absolute_position(&inner.updated_elements, "b"),
            Some(Point::new(100.0, 100.0))
        );
        let outer_now = find_element_by_id(&inner.updated_elements, &outer_id).unwrap();
        assert_eq!(outer_now.children().to_vec(), vec!["c".to_string(), inner_id.clone()]);

        // Ungrouping the inner group hands its members back to the outer one.
        let flat = ungroup_elements(&inner.updated_elements, &inner_id).unwrap();
        let outer_now = find_element_by_id(&flat, &outer_id).unwrap();
        assert_eq!(outer_now.children().len(), 3);
        for id in ["a", "b", "c"] {
            let member = find_element_by_id(&flat, id).unwrap();
            assert_eq!(member.parent_id.as_ref(), Some(&outer_id));
        }
        assert_eq!(absolute_position(&flat, "a"), Some(Point::new(10.0, 10.0)));
        assert_eq!(absolute_position(&flat, "b"), Some(Point::new(100.0, 100.0)));
    }

    #[test]
    fn test_grouping_members_of_different_parents_detaches_them() {
        let elements = vec![
            el("a", 0.0, 0.0, 10.0, 10.0, 1),
            el("b", 50.0, 0.0, 10.0, 10.0, 2),
            el("c", 300.0, 300.0, 10.0, 10.0, 3),
        ];
        let first = create_group(&elements, &ids(&["a", "b"])).unwrap();
        let regrouped = create_group(&first.updated_elements, &ids(&["b", "c"])).unwrap();

        let old = find_element_by_id(&regrouped.updated_elements, &first.group.id).unwrap();
        assert_eq!(old.children().to_vec(), vec!["a".to_string()]);
        assert!(regrouped.group.parent_id.is_none());
        assert_eq!(
            absolute_position(&regrouped.updated_elements, "b"),
            Some(Point::new(50.0, 0.0))
        );
    }

    fn assert_links_consistent(elements: &[Element]) {
        for el in elements {
            if let Some(parent) = &el.parent_id {
                let group = find_element_by_id(elements, parent).unwrap();
                assert!(group.children().contains(&el.id), "{parent} lost {}", el.id);
            }
            for child in el.children() {
                let member = find_element_by_id(elements, child).unwrap();
                assert_eq!(member.parent_id.as_ref(), Some(&el.id), "{} claims {child}", el.id);
            }
        }
    }

    #[test]
    fn test_grouping_a_group_with_its_own_member() {
        let elements = vec![
            el("a", 10.0, 10.0, 10.0, 10.0, 1),
            el("b", 50.0, 50.0, 10.0, 10.0, 2),
            el("c", 200.0, 200.0, 10.0, 10.0, 3),
        ];
        let first = create_group(&elements, &ids(&["a", "b"])).unwrap();
        let first_id = first.group.id.clone();

        let selection = vec![first_id.clone(), "a".to_string()];
        let outer = create_group(&first.updated_elements, &selection).unwrap();
        assert_links_consistent(&outer.updated_elements);
        let old = find_element_by_id(&outer.updated_elements, &first_id).unwrap();
        assert_eq!(old.children().to_vec(), vec!["b".to_string()]);

        let flat = ungroup_elements(&outer.updated_elements, &outer.group.id).unwrap();
        let flat = ungroup_elements(&flat, &first_id).unwrap();
        assert_links_consistent(&flat);
        assert_eq!(absolute_position(&flat, "a"), Some(Point::new(10.0, 10.0)));
        assert_eq!(absolute_position(&flat, "b"), Some(Point::new(50.0, 50.0)));
    }
}
