//! Linear undo/redo over full editing-state snapshots.

use crate::config::MAX_HISTORY_SIZE;
use crate::element::{Element, ElementId};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// An immutable snapshot of the editing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    pub elements: Vec<Element>,
    pub selected_element_ids: Vec<ElementId>,
    pub selected_element_id: Option<ElementId>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl HistoryState {
    pub fn new(
        elements: Vec<Element>,
        selected_element_ids: Vec<ElementId>,
        selected_element_id: Option<ElementId>,
        description: Option<String>,
    ) -> Self {
        Self {
            elements,
            selected_element_ids,
            selected_element_id,
            timestamp: now_millis(),
            description,
        }
    }

    /// Same elements and selection; timestamp and description are ignored.
    pub fn same_content(&self, other: &HistoryState) -> bool {
        self.elements == other.elements
            && self.selected_element_ids == other.selected_element_ids
            && self.selected_element_id == other.selected_element_id
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// One row of [`HistoryManager::history_summary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntrySummary {
    pub index: usize,
    pub description: Option<String>,
    pub timestamp: u64,
    pub element_count: usize,
    pub is_current: bool,
}

/// History shared between threads. Each call takes the lock for its
/// whole state transition.
pub type SharedHistory = Arc<Mutex<HistoryManager>>;

/// Bounded linear undo/redo log.
///
/// `history[current_index]` is the state the editor currently shows. Adding
/// a state after an undo discards everything past the current index.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    history: Vec<HistoryState>,
    current_index: usize,
    max_history_size: usize,
    /// Set by undo/redo; swallows the next `add_state`.
    is_undo_redo: bool,
    batch: Option<String>,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(MAX_HISTORY_SIZE)
    }
}

impl HistoryManager {
    /// Create an empty history keeping at most `max_history_size` states.
    pub fn new(max_history_size: usize) -> Self {
        Self {
            history: Vec::new(),
            current_index: 0,
            max_history_size: max_history_size.max(1),
            is_undo_redo: false,
            batch: None,
        }
    }

    /// Wrap a new manager for sharing across threads.
    pub fn shared(max_history_size: usize) -> SharedHistory {
        Arc::new(Mutex::new(Self::new(max_history_size)))
    }

    /// Replace the whole log with a single initial state.
    pub fn initialize(&mut self, elements: Vec<Element>, selected_ids: Vec<ElementId>, selected_id: Option<ElementId>) {
        self.history = vec![HistoryState::new(
            elements,
            selected_ids,
            selected_id,
            Some("Initial state".to_string()),
        )];
        self.current_index = 0;
        self.is_undo_redo = false;
        self.batch = None;
        log::debug!("History initialized");
    }

    /// Drop every state.
    pub fn clear(&mut self) {
        self.history.clear();
        self.current_index = 0;
        self.is_undo_redo = false;
        self.batch = None;
    }

    /// Record a new state. Returns whether it was stored.
    ///
    /// The call is ignored if it directly follows an undo/redo, if a batch
    /// is open, or if nothing changed since the current state.
    pub fn add_state(
        &mut self,
        elements: Vec<Element>,
        selected_ids: Vec<ElementId>,
        selected_id: Option<ElementId>,
        description: Option<String>,
    ) -> bool {
        if self.is_undo_redo {
            self.is_undo_redo = false;
            log::debug!("Skipping state recorded by undo/redo");
            return false;
        }
        if self.batch.is_some() {
            return false;
        }
        self.push(HistoryState::new(elements, selected_ids, selected_id, description))
    }

    /// Record a named state for a discrete user action.
    ///
    /// Unlike [`add_state`](Self::add_state) this is not swallowed after an
    /// undo/redo. Unchanged states are still dropped.
    pub fn create_checkpoint(
        &mut self,
        elements: Vec<Element>,
        selected_ids: Vec<ElementId>,
        selected_id: Option<ElementId>,
        description: impl Into<String>,
    ) -> bool {
        self.is_undo_redo = false;
        self.push(HistoryState::new(
            elements,
            selected_ids,
            selected_id,
            Some(description.into()),
        ))
    }

    fn push(&mut self, state: HistoryState) -> bool {
        if let Some(current) = self.history.get(self.current_index) {
            if current.same_content(&state) {
                return false;
            }
        }

        if !self.history.is_empty() {
            let discarded = self.history.len() - self.current_index - 1;
            if discarded > 0 {
                log::debug!("Discarding {discarded} redo states");
            }
            self.history.truncate(self.current_index + 1);
        }

        self.history.push(state);
        self.current_index = self.history.len() - 1;

        while self.history.len() > self.max_history_size {
            self.history.remove(0);
            self.current_index = self.current_index.saturating_sub(1);
            log::debug!("Evicted oldest history state");
        }
        true
    }

    /// Step back. Returns the state to restore, or `None` at the oldest state.
    pub fn undo(&mut self) -> Option<&HistoryState> {
        if self.current_index == 0 || self.history.is_empty() {
            return None;
        }
        self.is_undo_redo = true;
        self.current_index -= 1;
        log::debug!("Undo to state {}", self.current_index);
        self.history.get(self.current_index)
    }

    /// Step forward. Returns the state to restore, or `None` at the newest state.
    pub fn redo(&mut self) -> Option<&HistoryState> {
        if self.current_index + 1 >= self.history.len() {
            return None;
        }
        self.is_undo_redo = true;
        self.current_index += 1;
        log::debug!("Redo to state {}", self.current_index);
        self.history.get(self.current_index)
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index + 1 < self.history.len()
    }

    /// Start collecting a multi-step operation. Intermediate `add_state`
    /// calls are ignored until [`end_batch`](Self::end_batch).
    pub fn start_batch(&mut self, description: impl Into<String>) {
        if let Some(open) = &self.batch {
            log::warn!("Batch {open:?} still open, replacing it");
        }
        self.batch = Some(description.into());
    }

    /// Whether a batch is open.
    pub fn in_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Close the open batch and commit its final state.
    pub fn end_batch(
        &mut self,
        elements: Vec<Element>,
        selected_ids: Vec<ElementId>,
        selected_id: Option<ElementId>,
    ) -> bool {
        let Some(description) = self.batch.take() else {
            log::warn!("end_batch called without an open batch");
            return false;
        };
        self.is_undo_redo = false;
        self.push(HistoryState::new(
            elements,
            selected_ids,
            selected_id,
            Some(description),
        ))
    }

    /// Description of the state an undo would return to.
    pub fn undo_description(&self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.history
            .get(self.current_index - 1)
            .and_then(|s| s.description.as_deref())
    }

    /// Description of the state a redo would move to.
    pub fn redo_description(&self) -> Option<&str> {
        self.history
            .get(self.current_index + 1)
            .and_then(|s| s.description.as_deref())
    }

    pub fn current_state(&self) -> Option<&HistoryState> {
        self.history.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    /// Change the bound, evicting the oldest states if needed.
    pub fn set_max_history_size(&mut self, max_history_size: usize) {
        self.max_history_size = max_history_size.max(1);
        let excess = self.history.len().saturating_sub(self.max_history_size);
        if excess > 0 {
            self.history.drain(..excess);
            self.current_index = self.current_index.saturating_sub(excess);
            log::debug!("Evicted {excess} history states after resize");
        }
    }

    pub fn history_summary(&self) -> Vec<HistoryEntrySummary> {
        self.history
            .iter()
            .enumerate()
            .map(|(index, state)| HistoryEntrySummary {
                index,
                description: state.description.clone(),
                timestamp: state.timestamp,
                element_count: state.elements.len(),
                is_current: index == self.current_index,
            })
            .collect()
    }

    /// Approximate memory use: total JSON size of all states in bytes.
    pub fn memory_usage(&self) -> usize {
        self.history
            .iter()
            .map(|state| serde_json::to_vec(state).map(|v| v.len()).unwrap_or_default())
            .sum()
    }

    /// Collapse runs of consecutive states with identical content, keeping
    /// the first of each run. The current index moves to the kept state of
    /// its run.
    pub fn optimize_history(&mut self) {
        let before = self.history.len();
        let mut kept: Vec<HistoryState> = Vec::with_capacity(before);
        let mut new_index = 0;
        for (index, state) in self.history.drain(..).enumerate() {
            let duplicate = kept.last().is_some_and(|last| last.same_content(&state));
            if !duplicate {
                kept.push(state);
            }
            if index == self.current_index {
                new_index = kept.len().saturating_sub(1);
            }
        }
        self.history = kept;
        self.current_index = new_index;
        if self.history.len() < before {
            log::debug!("Optimized history from {before} to {} states", self.history.len());
        }
    }
}
