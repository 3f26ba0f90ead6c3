//! Per-document editing session.

use crate::config::EditorConfig;
use crate::element::{Element, ElementId, ElementKind, ElementPatch, ShapeType};
use crate::error::{EditorError, EditorResult};
use crate::factory::{ElementFactory, clone_subtree};
use crate::geometry::{
    GuideOrientation, ResizeHandle, SnapGuide, SnapGuides, calculate_resize_constraints,
    calculate_snap_guides, constrain_to_canvas, element_bounds, snap_to_grid,
};
use crate::history::HistoryManager;
use crate::management::{
    self, AlignMode, DistributeDirection, ElementStatistics, absolute_position, descendant_ids,
    find_element_by_id, is_top_level,
};
use kurbo::{Point, Rect, Size, Vec2};

/// The editing state of one open document.
///
/// Owns the element collection, the selection and the undo history.
/// Every action that changes the document records one history state.
#[derive(Debug, Clone)]
pub struct EditorSession {
    elements: Vec<Element>,
    selected_ids: Vec<ElementId>,
    selected_id: Option<ElementId>,
    history: HistoryManager,
    factory: ElementFactory,
    config: EditorConfig,
    /// Copied elements in absolute coordinates, roots first.
    clipboard: Vec<Element>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    /// Create a session with an empty document.
    pub fn new(config: EditorConfig) -> Self {
        let mut history = HistoryManager::new(config.max_history_size);
        history.initialize(Vec::new(), Vec::new(), None);
        Self {
            elements: Vec::new(),
            selected_ids: Vec::new(),
            selected_id: None,
            history,
            factory: ElementFactory::from_config(&config),
            config,
            clipboard: Vec::new(),
        }
    }

    /// Create a session over an existing element collection.
    pub fn with_elements(config: EditorConfig, elements: Vec<Element>) -> Self {
        let mut session = Self::new(config);
        session.history.initialize(elements.clone(), Vec::new(), None);
        session.elements = elements;
        session
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        find_element_by_id(&self.elements, id)
    }

    pub fn selected_ids(&self) -> &[ElementId] {
        &self.selected_ids
    }

    /// The primary selection.
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn factory(&self) -> &ElementFactory {
        &self.factory
    }

    pub fn statistics(&self) -> ElementStatistics {
        management::get_element_statistics(&self.elements)
    }

    /// Record the current state. Ignored while a drag is in progress.
    fn record(&mut self, description: &str) -> bool {
        let stored = self.history.add_state(
            self.elements.clone(),
            self.selected_ids.clone(),
            self.selected_id.clone(),
            Some(description.to_string()),
        );
        if stored {
            log::info!("{description}");
        }
        stored
    }

    /// Record the current state as a checkpoint.
    fn checkpoint(&mut self, description: &str) -> bool {
        let stored = self.history.create_checkpoint(
            self.elements.clone(),
            self.selected_ids.clone(),
            self.selected_id.clone(),
            description,
        );
        if stored {
            log::info!("{description}");
        }
        stored
    }

    /// Keep a top-level element's box on the canvas by moving its origin.
    /// Group members are positioned by their group and left alone.
    fn clamp_to_canvas(&self, element: &mut Element) {
        if element.parent_id.is_some() {
            return;
        }
        let bounds = constrain_to_canvas(element_bounds(element), self.config.canvas_size);
        element.set_position(bounds.origin());
    }

    fn next_z_index(&self) -> i64 {
        self.elements
            .iter()
            .map(|el| el.style.z_index)
            .max()
            .unwrap_or_default()
            + 1
    }

    // --- Selection ---

    /// Select a single element.
    pub fn select(&mut self, id: &str) {
        self.clear_selection();
        self.add_to_selection(id);
    }

    pub fn add_to_selection(&mut self, id: &str) {
        if self.element(id).is_none() {
            log::warn!("Cannot select missing element {id}");
            return;
        }
        if !self.selected_ids.iter().any(|s| s == id) {
            self.selected_ids.push(id.to_string());
        }
        self.selected_id = Some(id.to_string());
    }

    pub fn clear_selection(&mut self) {
        self.selected_ids.clear();
        self.selected_id = None;
    }

    /// Select every top-level element.
    pub fn select_all(&mut self) {
        self.selected_ids = self
            .elements
            .iter()
            .filter(|el| is_top_level(&self.elements, el))
            .map(|el| el.id.clone())
            .collect();
        self.selected_id = self.selected_ids.last().cloned();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_ids.iter().any(|s| s == id)
    }

    fn set_selection(&mut self, ids: Vec<ElementId>) {
        self.selected_id = ids.last().cloned();
        self.selected_ids = ids;
    }

    // --- Creation ---

    /// Add a new element near `position`, avoiding overlaps, and select it.
    pub fn add_element(
        &mut self,
        kind: ElementKind,
        position: Point,
        shape_type: Option<ShapeType>,
    ) -> ElementId {
        let mut element = self.factory.create_element_with_smart_positioning(
            kind,
            snap_to_grid(position, self.config.grid_size),
            &self.elements,
            self.next_z_index(),
            self.config.placement_max_attempts,
            shape_type,
        );
        self.clamp_to_canvas(&mut element);
        let id = element.id.clone();
        self.elements.push(element);
        self.select(&id);
        self.checkpoint(&format!("Add {kind}"));
        id
    }

    /// Add an element by type name, honouring the unknown-type policy.
    pub fn add_element_named(&mut self, name: &str, position: Point) -> EditorResult<ElementId> {
        let mut element =
            self.factory
                .create_element_named(name, position, self.elements.len(), None)?;
        element.style.z_index = self.next_z_index();
        self.clamp_to_canvas(&mut element);
        let id = element.id.clone();
        let kind = element.kind;
        self.elements.push(element);
        self.select(&id);
        self.checkpoint(&format!("Add {kind}"));
        Ok(id)
    }

    // --- Editing ---

    /// Delete the selection (groups take their members with them).
    pub fn delete_selected(&mut self) -> usize {
        if self.selected_ids.is_empty() {
            return 0;
        }
        let before = self.elements.len();
        self.elements = management::delete_elements(&self.elements, &self.selected_ids);
        self.clear_selection();
        let removed = before - self.elements.len();
        self.checkpoint(&format!("Delete {removed} elements"));
        removed
    }

    /// Copy the selection (with group members) to the session clipboard.
    pub fn copy_selected(&mut self) -> usize {
        let mut copied: Vec<Element> = Vec::new();
        let mut seen: Vec<ElementId> = Vec::new();
        for id in &self.selected_ids {
            let Some(root) = find_element_by_id(&self.elements, id) else {
                continue;
            };
            if seen.contains(&root.id) {
                continue;
            }
            let mut root = root.clone();
            if let Some(position) = absolute_position(&self.elements, id) {
                root.set_position(position);
            }
            root.parent_id = None;
            seen.push(root.id.clone());
            copied.push(root);

            for member in descendant_ids(&self.elements, id) {
                if let Some(el) = find_element_by_id(&self.elements, &member) {
                    if !seen.contains(&el.id) {
                        seen.push(el.id.clone());
                        copied.push(el.clone());
                    }
                }
            }
        }
        log::debug!("Copied {} elements", copied.len());
        self.clipboard = copied;
        self.clipboard.len()
    }

    /// Paste the clipboard, offset from where it was copied, above
    /// everything else. Returns the ids of the pasted top-level elements.
    pub fn paste(&mut self) -> Vec<ElementId> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        let offset = Vec2::new(self.config.paste_offset, self.config.paste_offset);
        let mut copies = clone_subtree(&self.clipboard, offset);

        let lowest = copies
            .iter()
            .map(|el| el.style.z_index)
            .min()
            .unwrap_or_default();
        let base = self.next_z_index();
        for copy in &mut copies {
            copy.style.z_index = base + (copy.style.z_index - lowest);
            self.clamp_to_canvas(copy);
        }

        let roots: Vec<ElementId> = copies
            .iter()
            .filter(|el| el.parent_id.is_none())
            .map(|el| el.id.clone())
            .collect();

        // Cascade repeated pastes.
        for el in &mut self.clipboard {
            if el.parent_id.is_none() {
                el.set_position(el.position() + offset);
            }
        }

        self.elements.extend(copies);
        self.set_selection(roots.clone());
        self.checkpoint("Paste");
        roots
    }

    /// Group the selection and select the new group.
    pub fn group_selected(&mut self) -> EditorResult<ElementId> {
        let created = management::create_group(&self.elements, &self.selected_ids)?;
        let group_id = created.group.id.clone();
        self.elements = created.updated_elements;
        self.select(&group_id);
        self.checkpoint("Group");
        Ok(group_id)
    }

    /// Ungroup every selected group and select their former members.
    pub fn ungroup_selected(&mut self) -> EditorResult<Vec<ElementId>> {
        let groups: Vec<ElementId> = self
            .selected_ids
            .iter()
            .filter(|id| self.element(id).is_some_and(Element::is_group))
            .cloned()
            .collect();
        if groups.is_empty() {
            let id = self.selected_id.clone().unwrap_or_default();
            log::warn!("Ungroup requested without a selected group");
            return Err(EditorError::NotAGroup(id));
        }

        let mut working = self.elements.clone();
        let mut members: Vec<ElementId> = Vec::new();
        for group_id in &groups {
            if let Some(group) = find_element_by_id(&working, group_id) {
                members.extend(group.children().iter().cloned());
            }
            working = management::ungroup_elements(&working, group_id)?;
        }
        // A selected group nested in another selected group is gone now.
        members.retain(|id| find_element_by_id(&working, id).is_some());
        self.elements = working;
        self.set_selection(members.clone());
        self.checkpoint("Ungroup");
        Ok(members)
    }

    /// Move the selection by `delta`. Locked elements stay put.
    pub fn move_selected(&mut self, delta: Vec2) -> bool {
        if self.selected_ids.is_empty() {
            return false;
        }
        self.elements = management::move_elements(&self.elements, &self.selected_ids, delta);
        self.record("Move")
    }

    /// Drag one element so its top-left corner lands at `position`.
    ///
    /// Each axis snaps to a sibling's guide when one is in range and to the
    /// grid otherwise. Top-level elements are kept on the canvas.
    pub fn drag_element_to(&mut self, id: &str, position: Point) -> EditorResult<SnapGuides> {
        let index = self
            .elements
            .iter()
            .position(|el| el.id == id)
            .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
        if self.elements[index].locked {
            log::debug!("Ignoring drag of locked element {id}");
            return Ok(SnapGuides {
                snapped_position: self.elements[index].position(),
                guides: Vec::new(),
            });
        }

        let mut moved = self.elements[index].clone();
        moved.set_position(position);
        // Only siblings share a coordinate space with the dragged element.
        let siblings: Vec<Element> = self
            .elements
            .iter()
            .filter(|el| el.parent_id == moved.parent_id)
            .cloned()
            .collect();
        let mut snap = calculate_snap_guides(&moved, &siblings, self.config.snap_threshold);
        // Axes without a guide fall back to the grid.
        let on_grid = snap_to_grid(position, self.config.grid_size);
        let has_guide = |guides: &[SnapGuide], orientation: GuideOrientation| {
            guides.iter().any(|g| g.orientation == orientation)
        };
        if !has_guide(&snap.guides, GuideOrientation::Vertical) {
            snap.snapped_position.x = on_grid.x;
        }
        if !has_guide(&snap.guides, GuideOrientation::Horizontal) {
            snap.snapped_position.y = on_grid.y;
        }

        moved.set_position(snap.snapped_position);
        self.clamp_to_canvas(&mut moved);
        snap.snapped_position = moved.position();
        self.elements[index] = moved;
        self.record("Move");
        Ok(snap)
    }

    /// Start a drag; intermediate states are not recorded until
    /// [`end_drag`](Self::end_drag).
    pub fn begin_drag(&mut self, description: &str) {
        self.history.start_batch(description);
    }

    /// Finish a drag and record it as one history state.
    pub fn end_drag(&mut self) -> bool {
        let stored = self.history.end_batch(
            self.elements.clone(),
            self.selected_ids.clone(),
            self.selected_id.clone(),
        );
        if stored {
            log::info!("Drag committed");
        }
        stored
    }

    /// Resize an element with a handle drag and return its new bounds.
    ///
    /// `initial_bounds` and `initial_mouse` are captured when the drag starts.
    /// With `keep_aspect_ratio` the initial width/height ratio is preserved.
    pub fn resize_element(
        &mut self,
        id: &str,
        handle: ResizeHandle,
        mouse: Point,
        initial_bounds: Rect,
        initial_mouse: Point,
        keep_aspect_ratio: bool,
    ) -> EditorResult<Rect> {
        let index = self
            .elements
            .iter()
            .position(|el| el.id == id)
            .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
        if self.elements[index].locked {
            log::debug!("Ignoring resize of locked element {id}");
            return self
                .element_canvas_bounds(id)
                .ok_or_else(|| EditorError::ElementNotFound(id.to_string()));
        }
        let aspect_ratio = (keep_aspect_ratio && initial_bounds.height() > 0.0)
            .then(|| initial_bounds.width() / initial_bounds.height());
        let bounds = calculate_resize_constraints(
            handle,
            mouse,
            initial_bounds,
            initial_mouse,
            self.config.min_element_size,
            aspect_ratio,
        );
        // Bounds are in canvas space; grouped elements store group-relative origins.
        let parent_offset = absolute_position(&self.elements, id)
            .map(|abs| abs - self.elements[index].position())
            .unwrap_or(Vec2::ZERO);
        self.elements[index] = management::resize_element(
            &self.elements[index],
            bounds.size(),
            Some(bounds.origin() - parent_offset),
        );
        self.record("Resize");
        Ok(bounds)
    }

    /// Set an element's size directly, keeping its position.
    pub fn set_element_size(&mut self, id: &str, size: Size) -> EditorResult<()> {
        let element = self
            .element(id)
            .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
        if element.locked {
            log::debug!("Ignoring resize of locked element {id}");
            return Ok(());
        }
        let resized = management::resize_element(element, size, None);
        if let Some(slot) = self.elements.iter_mut().find(|el| el.id == id) {
            *slot = resized;
        }
        self.record("Resize");
        Ok(())
    }

    pub fn align_selected(&mut self, mode: AlignMode) {
        if self.selected_ids.len() < 2 {
            return;
        }
        self.elements = management::align_elements(&self.elements, &self.selected_ids, mode);
        self.checkpoint("Align");
    }

    pub fn distribute_selected(&mut self, direction: DistributeDirection) {
        if self.selected_ids.len() < 3 {
            return;
        }
        self.elements =
            management::distribute_elements(&self.elements, &self.selected_ids, direction);
        self.checkpoint("Distribute");
    }

    pub fn bring_selected_to_front(&mut self) -> EditorResult<()> {
        let mut working = self.elements.clone();
        for id in &self.selected_ids {
            working = management::bring_to_front(&working, id)?;
        }
        self.elements = working;
        self.checkpoint("Bring to front");
        Ok(())
    }

    pub fn send_selected_to_back(&mut self) -> EditorResult<()> {
        let mut working = self.elements.clone();
        for id in self.selected_ids.iter().rev() {
            working = management::send_to_back(&working, id)?;
        }
        self.elements = working;
        self.checkpoint("Send to back");
        Ok(())
    }

    pub fn bring_selected_forward(&mut self) -> EditorResult<()> {
        if let Some(id) = self.selected_id.clone() {
            self.elements = management::bring_forward(&self.elements, &id)?;
            self.checkpoint("Bring forward");
        }
        Ok(())
    }

    pub fn send_selected_backward(&mut self) -> EditorResult<()> {
        if let Some(id) = self.selected_id.clone() {
            self.elements = management::send_backward(&self.elements, &id)?;
            self.checkpoint("Send backward");
        }
        Ok(())
    }

    pub fn toggle_lock(&mut self) {
        if self.selected_ids.is_empty() {
            return;
        }
        self.elements = management::toggle_lock(&self.elements, &self.selected_ids);
        self.checkpoint("Toggle lock");
    }

    /// Apply a property edit to one element.
    pub fn update_element(&mut self, id: &str, patch: &ElementPatch) -> EditorResult<()> {
        self.elements = management::update_element(&self.elements, id, patch)?;
        self.record("Update");
        Ok(())
    }

    /// Duplicate one element next to itself and select the copy.
    pub fn duplicate(&mut self, id: &str) -> EditorResult<ElementId> {
        let offset = Vec2::new(self.config.paste_offset, self.config.paste_offset);
        self.elements = management::duplicate_element(&self.elements, id, offset)?;
        let copy = self
            .elements
            .last()
            .map(|el| el.id.clone())
            .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
        self.select(&copy);
        self.checkpoint("Duplicate");
        Ok(copy)
    }

    /// Current bounds of an element in canvas coordinates.
    pub fn element_canvas_bounds(&self, id: &str) -> Option<Rect> {
        let element = self.element(id)?;
        let origin = absolute_position(&self.elements, id)?;
        Some(element_bounds(element).with_origin(origin))
    }

    // --- History ---

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let Some(state) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(state.elements, state.selected_element_ids, state.selected_element_id);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(state) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(state.elements, state.selected_element_ids, state.selected_element_id);
        true
    }

    fn restore(&mut self, elements: Vec<Element>, selected_ids: Vec<ElementId>, selected_id: Option<ElementId>) {
        self.elements = elements;
        self.selected_ids = selected_ids;
        self.selected_id = selected_id;
        // Echo the restored state so the history's post-undo suppression is
        // consumed here rather than by the next real edit.
        self.history.add_state(
            self.elements.clone(),
            self.selected_ids.clone(),
            self.selected_id.clone(),
            None,
        );
    }

    // --- Import / export ---

    /// Serialize the element collection to JSON.
    pub fn export_json(&self) -> EditorResult<String> {
        Ok(serde_json::to_string_pretty(&self.elements)?)
    }

    /// Replace the document with elements parsed from JSON.
    pub fn import_json(&mut self, json: &str) -> EditorResult<usize> {
        let elements: Vec<Element> = serde_json::from_str(json)?;
        for element in &elements {
            let report = management::validate_element(element);
            if !report.is_valid {
                log::warn!("Imported element {} is invalid: {:?}", element.id, report.errors);
            }
        }
        self.elements = elements;
        self.clear_selection();
        self.checkpoint("Import");
        Ok(self.elements.len())
    }
}
