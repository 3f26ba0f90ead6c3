//! Element construction.
//!
//! All element creation goes through [`ElementFactory`] so that every entry
//! point (toolbar, paste, grouping) shares one table of defaults:
//!
//! | type      | size    | defaults                                              |
//! |-----------|---------|-------------------------------------------------------|
//! | heading   | 400×60  | content `"Heading"`, font size 32, bold               |
//! | paragraph | 400×100 | placeholder text, font size 16                        |
//! | button    | 150×50  | content `"Button"`, blue fill, white text, radius 8   |
//! | image     | 300×200 | placeholder `src`, alt `"Image"`                      |
//! | video     | 400×225 | placeholder `videoSrc`, controls on                   |
//! | shape     | 100×100 | requested shape type, `rectangle` by default          |
//! | group     | 0×0     | empty member list                                     |

use crate::config::{EditorConfig, UnknownTypePolicy};
use crate::element::{
    Element, ElementId, ElementKind, ElementPatch, ElementStyle, ShapeType, VideoFlags, generate_id,
};
use crate::error::{EditorError, EditorResult};
use crate::geometry::{calculate_bounding_box, detect_collisions};
use kurbo::{Point, Size, Vec2};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

const DEFAULT_TEXT_COLOR: &str = "#000000";
const DEFAULT_FONT_FAMILY: &str = "Inter, system-ui, sans-serif";
const PARAGRAPH_PLACEHOLDER: &str = "Add your text here. Double-click to edit.";
const IMAGE_PLACEHOLDER: &str = "/placeholder-image.svg";
const VIDEO_PLACEHOLDER: &str = "/placeholder-video.mp4";

/// Default box for a freshly created element of `kind`.
pub fn default_size(kind: ElementKind) -> Size {
    match kind {
        ElementKind::Heading => Size::new(400.0, 60.0),
        ElementKind::Paragraph => Size::new(400.0, 100.0),
        ElementKind::Button => Size::new(150.0, 50.0),
        ElementKind::Image => Size::new(300.0, 200.0),
        ElementKind::Video => Size::new(400.0, 225.0),
        ElementKind::Shape => Size::new(100.0, 100.0),
        ElementKind::Group => Size::ZERO,
    }
}

/// A new group plus its members rewritten into group-relative coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCreation {
    pub group: Element,
    pub updated_elements: Vec<Element>,
}

/// Builds elements from the default table.
#[derive(Debug, Clone)]
pub struct ElementFactory {
    policy: UnknownTypePolicy,
    placement_step: f64,
}

impl Default for ElementFactory {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl ElementFactory {
    /// Create a factory.
    pub fn new(policy: UnknownTypePolicy, placement_step: f64) -> Self {
        Self {
            policy,
            placement_step,
        }
    }

    /// Create a factory using the policy and placement step from `config`.
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.unknown_type_policy, config.placement_step)
    }

    /// The unknown-type policy in effect.
    pub fn policy(&self) -> UnknownTypePolicy {
        self.policy
    }

    /// Create an element of `kind` at `position`.
    ///
    /// `existing_count` is the number of elements already on the canvas;
    /// the new element is stacked above them with `zIndex = existing_count + 1`.
    pub fn create_element(
        &self,
        kind: ElementKind,
        position: Point,
        existing_count: usize,
        shape_type: Option<ShapeType>,
    ) -> Element {
        build(kind, position, existing_count as i64 + 1, shape_type)
    }

    /// Create an element from a type name, applying the unknown-type policy.
    pub fn create_element_named(
        &self,
        name: &str,
        position: Point,
        existing_count: usize,
        shape_type: Option<ShapeType>,
    ) -> EditorResult<Element> {
        match name.parse::<ElementKind>() {
            Ok(kind) => Ok(self.create_element(kind, position, existing_count, shape_type)),
            Err(err) => match self.policy {
                UnknownTypePolicy::Strict => {
                    log::warn!("Rejected unknown element type {name:?}");
                    Err(err)
                }
                UnknownTypePolicy::Lenient => {
                    log::warn!("Unknown element type {name:?}, creating placeholder shape");
                    let mut element = self.create_element(
                        ElementKind::Shape,
                        position,
                        existing_count,
                        Some(ShapeType::Rectangle),
                    );
                    element
                        .style
                        .extra
                        .insert("requestedType".to_string(), Value::from(name));
                    Ok(element)
                }
            },
        }
    }

    /// Create an element near `preferred` that does not overlap `existing`.
    ///
    /// Candidate `i` (for `i` in `0..max_attempts`) sits `i * step` pixels
    /// right of and below `preferred`. If every candidate collides, the
    /// element is placed at `preferred` anyway.
    pub fn create_element_with_smart_positioning(
        &self,
        kind: ElementKind,
        preferred: Point,
        existing: &[Element],
        z_index: i64,
        max_attempts: usize,
        shape_type: Option<ShapeType>,
    ) -> Element {
        let mut element = build(kind, preferred, z_index, shape_type);
        for attempt in 0..max_attempts {
            let offset = self.placement_step * attempt as f64;
            element.set_position(preferred + Vec2::new(offset, offset));
            if detect_collisions(&element, existing, 0.0).is_empty() {
                return element;
            }
        }
        log::debug!(
            "No free slot for {kind} after {max_attempts} attempts, using preferred position"
        );
        element.set_position(preferred);
        element
    }

    /// Create an element and clamp its origin so the box lies inside the canvas.
    ///
    /// `overrides` are applied before clamping. Only the origin moves; an
    /// element larger than the canvas keeps its size and is pinned at 0.
    pub fn create_validated_element(
        &self,
        kind: ElementKind,
        position: Point,
        z_index: i64,
        canvas_size: Size,
        overrides: Option<&ElementPatch>,
    ) -> Element {
        let mut element = build(kind, position, z_index, None);
        if let Some(patch) = overrides {
            patch.apply(&mut element);
        }
        let size = element.size();
        let x = element
            .style
            .x
            .min(canvas_size.width - size.width)
            .max(0.0);
        let y = element
            .style
            .y
            .min(canvas_size.height - size.height)
            .max(0.0);
        element.set_position(Point::new(x, y));
        element
    }
}

/// Base style shared by every element kind.
fn base_style(kind: ElementKind, position: Point, z_index: i64) -> ElementStyle {
    let size = default_size(kind);
    ElementStyle {
        color: Some(DEFAULT_TEXT_COLOR.to_string()),
        font_family: Some(DEFAULT_FONT_FAMILY.to_string()),
        opacity: Some(1.0),
        ..ElementStyle::new(position.x, position.y, size.width, size.height, z_index)
    }
}

fn build(kind: ElementKind, position: Point, z_index: i64, shape_type: Option<ShapeType>) -> Element {
    let mut element = Element::new(kind, base_style(kind, position, z_index));
    match kind {
        ElementKind::Heading => {
            element.content = Some("Heading".to_string());
            element.style.font_size = Some(32.0);
            element.style.font_weight = Some("bold".to_string());
        }
        ElementKind::Paragraph => {
            element.content = Some(PARAGRAPH_PLACEHOLDER.to_string());
            element.style.font_size = Some(16.0);
        }
        ElementKind::Button => {
            element.content = Some("Button".to_string());
            element.style.background_color = Some("#3b82f6".to_string());
            element.style.color = Some("#ffffff".to_string());
            element.style.border_radius = Some(8.0);
            element.style.font_size = Some(16.0);
            element.href = Some("#".to_string());
            element.target = Some("_self".to_string());
        }
        ElementKind::Image => {
            element.src = Some(IMAGE_PLACEHOLDER.to_string());
            element.alt = Some("Image".to_string());
        }
        ElementKind::Video => {
            element.video_src = Some(VIDEO_PLACEHOLDER.to_string());
            element.video_options = Some(VideoFlags {
                controls: true,
                ..VideoFlags::default()
            });
        }
        ElementKind::Shape => {
            element.shape_type = Some(shape_type.unwrap_or_default());
            element.style.background_color = Some("#e5e7eb".to_string());
        }
        ElementKind::Group => {}
    }
    element
}

/// Copy an element to `position` under a new id.
///
/// The id is `<type>-<suffix>` when a suffix is given, otherwise a fresh
/// uuid-based id. Group membership is not copied: the clone is top-level and
/// a cloned group starts with no members. Use [`clone_subtree`] to copy a
/// group together with its members.
pub fn clone_element(element: &Element, position: Point, id_suffix: Option<&str>) -> Element {
    let mut clone = element.clone();
    clone.id = match id_suffix {
        Some(suffix) => format!("{}-{}", element.kind, suffix),
        None => generate_id(element.kind),
    };
    clone.set_position(position);
    clone.parent_id = None;
    if clone.is_group() {
        clone.child_ids = Some(Vec::new());
    }
    clone
}

fn clipboard_suffix() -> String {
    format!("copy-{}", Uuid::new_v4().simple())
}

/// Clone a clipboard element for pasting at `position`.
pub fn create_from_clipboard(element: &Element, position: Point) -> Element {
    clone_element(element, position, Some(&clipboard_suffix()))
}

/// Clone a set of elements for pasting.
///
/// Group links between members of the set are rewritten to the new ids;
/// links to elements outside the set are dropped. Members whose parent is
/// outside the set become top-level and are shifted by `offset`; nested
/// members keep their group-relative coordinates.
pub fn clone_subtree(elements: &[Element], offset: Vec2) -> Vec<Element> {
    let id_map: HashMap<&str, ElementId> = elements
        .iter()
        .map(|el| {
            (
                el.id.as_str(),
                format!("{}-{}", el.kind, clipboard_suffix()),
            )
        })
        .collect();

    elements
        .iter()
        .map(|el| {
            let mut clone = el.clone();
            clone.id = id_map[el.id.as_str()].clone();
            clone.parent_id = el
                .parent_id
                .as_deref()
                .and_then(|parent| id_map.get(parent).cloned());
            if let Some(children) = &el.child_ids {
                clone.child_ids = Some(
                    children
                        .iter()
                        .filter_map(|child| id_map.get(child.as_str()).cloned())
                        .collect(),
                );
            }
            if clone.parent_id.is_none() {
                clone.set_position(el.position() + offset);
            }
            clone
        })
        .collect()
}

/// Wrap `elements` in a new group.
///
/// Members must be given in absolute coordinates. The group takes their
/// union box and sits one above the highest member; members are returned
/// rewritten relative to the group's origin with `parentId` set.
pub fn create_group_from_elements(elements: &[Element]) -> EditorResult<GroupCreation> {
    if elements.len() < 2 {
        return Err(EditorError::InsufficientSelection {
            required: 2,
            found: elements.len(),
        });
    }

    let bounds = calculate_bounding_box(elements);
    let z_index = elements
        .iter()
        .map(|el| el.style.z_index)
        .max()
        .unwrap_or_default()
        + 1;

    let mut group = Element::new(
        ElementKind::Group,
        ElementStyle::new(bounds.x0, bounds.y0, bounds.width(), bounds.height(), z_index),
    );
    group.child_ids = Some(elements.iter().map(|el| el.id.clone()).collect());

    let origin = bounds.origin().to_vec2();
    let updated_elements = elements
        .iter()
        .map(|el| {
            let mut child = el.clone();
            child.set_position(el.position() - origin);
            child.parent_id = Some(group.id.clone());
            child
        })
        .collect();

    log::debug!("Created group {} with {} members", group.id, elements.len());
    Ok(GroupCreation {
        group,
        updated_elements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Dimension;

    fn factory() -> ElementFactory {
        ElementFactory::default()
    }

    fn el(id: &str, x: f64, y: f64, w: f64, h: f64, z: i64) -> Element {
        Element::with_id(id, ElementKind::Shape, ElementStyle::new(x, y, w, h, z))
    }

    #[test]
    fn test_create_element_defaults() {
        let heading = factory().create_element(ElementKind::Heading, Point::new(40.0, 60.0), 3, None);
        assert!(heading.id.starts_with("heading-"));
        assert_eq!(heading.position(), Point::new(40.0, 60.0));
        assert_eq!(heading.size(), Size::new(400.0, 60.0));
        assert_eq!(heading.style.z_index, 4);
        assert_eq!(heading.content.as_deref(), Some("Heading"));
        assert_eq!(heading.style.font_weight.as_deref(), Some("bold"));

        let button = factory().create_element(ElementKind::Button, Point::ZERO, 0, None);
        assert_eq!(button.style.z_index, 1);
        assert_eq!(button.href.as_deref(), Some("#"));

        let video = factory().create_element(ElementKind::Video, Point::ZERO, 0, None);
        assert!(video.video_options.unwrap().controls);
    }

    #[test]
    fn test_shape_type_default_and_override() {
        let shape = factory().create_element(ElementKind::Shape, Point::ZERO, 0, None);
        assert_eq!(shape.shape_type, Some(ShapeType::Rectangle));

        let star = factory().create_element(ElementKind::Shape, Point::ZERO, 0, Some(ShapeType::Star));
        assert_eq!(star.shape_type, Some(ShapeType::Star));
    }

    #[test]
    fn test_unknown_type_policy() {
        let strict = factory().create_element_named("carousel", Point::ZERO, 0, None);
        assert!(matches!(strict, Err(EditorError::UnknownElementType(name)) if name == "carousel"));

        let lenient = ElementFactory::new(UnknownTypePolicy::Lenient, 20.0)
            .create_element_named("carousel", Point::new(5.0, 5.0), 0, None)
            .unwrap();
        assert_eq!(lenient.kind, ElementKind::Shape);
        assert_eq!(lenient.style.extra.get("requestedType"), Some(&Value::from("carousel")));

        let known = factory().create_element_named("image", Point::ZERO, 0, None).unwrap();
        assert_eq!(known.kind, ElementKind::Image);
    }

    #[test]
    fn test_smart_positioning_steps_past_collisions() {
        let existing = vec![el("a", 0.0, 0.0, 110.0, 110.0, 1)];
        let shape = factory().create_element_with_smart_positioning(
            ElementKind::Shape,
            Point::ZERO,
            &existing,
            2,
            10,
            None,
        );
        // 0 and 20..100 overlap the 110px box; 120 is the first free slot
        assert_eq!(shape.position(), Point::new(120.0, 120.0));
        assert_eq!(shape.style.z_index, 2);
    }

    #[test]
    fn test_smart_positioning_falls_back_to_preferred() {
        let existing = vec![el("wall", 0.0, 0.0, 2000.0, 2000.0, 1)];
        let shape = factory().create_element_with_smart_positioning(
            ElementKind::Shape,
            Point::new(30.0, 30.0),
            &existing,
            2,
            5,
            None,
        );
        assert_eq!(shape.position(), Point::new(30.0, 30.0));
    }

    #[test]
    fn test_validated_element_clamps_origin() {
        let canvas = Size::new(800.0, 600.0);
        let image = factory().create_validated_element(
            ElementKind::Image,
            Point::new(700.0, -10.0),
            1,
            canvas,
            None,
        );
        assert_eq!(image.position(), Point::new(500.0, 0.0));
        assert_eq!(image.size(), Size::new(300.0, 200.0));

        let mut patch = ElementPatch::default();
        patch.style.width = Some(Dimension::Number(1000.0));
        let wide = factory().create_validated_element(
            ElementKind::Shape,
            Point::new(100.0, 100.0),
            1,
            canvas,
            Some(&patch),
        );
        assert_eq!(wide.position(), Point::new(0.0, 100.0));
        assert!((wide.size().width - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clone_element() {
        let original = factory().create_element(ElementKind::Paragraph, Point::ZERO, 0, None);
        let copy = clone_element(&original, Point::new(50.0, 50.0), Some("dup"));
        assert_eq!(copy.id, "paragraph-dup");
        assert_eq!(copy.content, original.content);
        assert_eq!(copy.position(), Point::new(50.0, 50.0));

        let fresh = clone_element(&original, Point::ZERO, None);
        assert_ne!(fresh.id, original.id);
        assert!(fresh.id.starts_with("paragraph-"));

        let pasted = create_from_clipboard(&original, Point::new(20.0, 20.0));
        assert!(pasted.id.starts_with("paragraph-copy-"));
    }

    #[test]
    fn test_group_from_elements() {
        let a = el("a", 10.0, 10.0, 20.0, 20.0, 3);
        let b = el("b", 50.0, 50.0, 30.0, 30.0, 7);
        let created = create_group_from_elements(&[a, b]).unwrap();

        let group = &created.group;
        assert_eq!(group.position(), Point::new(10.0, 10.0));
        assert_eq!(group.size(), Size::new(70.0, 70.0));
        assert_eq!(group.style.z_index, 8);
        assert_eq!(group.children(), ["a".to_string(), "b".to_string()]);

        let children = &created.updated_elements;
        assert_eq!(children[0].position(), Point::new(0.0, 0.0));
        assert_eq!(children[1].position(), Point::new(40.0, 40.0));
        assert!(children.iter().all(|c| c.parent_id.as_ref() == Some(&group.id)));
    }

    #[test]
    fn test_group_requires_two() {
        let a = el("a", 0.0, 0.0, 10.0, 10.0, 1);
        let err = create_group_from_elements(&[a]).unwrap_err();
        assert!(matches!(err, EditorError::InsufficientSelection { required: 2, found: 1 }));
    }

    #[test]
    fn test_clone_subtree_remaps_links() {
        let a = el("a", 10.0, 10.0, 20.0, 20.0, 1);
        let b = el("b", 50.0, 50.0, 30.0, 30.0, 2);
        let GroupCreation {
            group,
            updated_elements,
        } = create_group_from_elements(&[a, b]).unwrap();
        let mut set = vec![group.clone()];
        set.extend(updated_elements);

        let copies = clone_subtree(&set, Vec2::new(20.0, 20.0));
        let new_group = &copies[0];
        assert_ne!(new_group.id, group.id);
        assert_eq!(new_group.position(), Point::new(30.0, 30.0));
        assert_eq!(new_group.children().len(), 2);
        for child in &copies[1..] {
            assert_eq!(child.parent_id.as_ref(), Some(&new_group.id));
            assert!(new_group.children().contains(&child.id));
        }
        // Nested members keep group-relative coordinates
        assert_eq!(copies[1].position(), Point::new(0.0, 0.0));
        assert_eq!(copies[2].position(), Point::new(40.0, 40.0));
    }
}
