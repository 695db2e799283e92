//! Undo/redo history for feature edits.
//!
//! Edits are recorded as [`EditAction`] values and interpreted against a
//! [`FeatureStore`]: `apply` performs the edit (redo), `reverse` undoes it.
//! Effects are asynchronous, so [`UndoRedoStack::undo`] and
//! [`UndoRedoStack::redo`] are `async` and refuse to start while another one
//! is in flight.

use chrono::{DateTime, Utc};
use geoedit_core::{DataCallback, Feature, FeatureId, Geometry};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::AtomicBool;
use uuid::Uuid;

use crate::error::{HistoryError, HistoryResult, StoreError, StoreResult};
use crate::guard::InFlight;
use crate::store::FeatureStore;

/// Default maximum number of undo entries.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Boxed effect future returned by the action interpreters.
pub type EffectFuture<'a> = Pin<Box<dyn Future<Output = StoreResult<()>> + Send + 'a>>;

/// A reversible edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    /// A feature was created
    AddFeature(Feature),
    /// A feature's geometry was replaced
    ModifyGeometry {
        id: FeatureId,
        before: Geometry,
        after: Geometry,
    },
    /// A feature was deleted
    DeleteFeature(Feature),
    /// Several edits applied in order and reversed in the opposite order
    Batch(Vec<EditAction>),
}

impl EditAction {
    /// Type tag used in logs and history listings.
    pub fn kind(&self) -> &'static str {
        match self {
            EditAction::AddFeature(_) => "add_feature",
            EditAction::ModifyGeometry { .. } => "modify_geometry",
            EditAction::DeleteFeature(_) => "delete_feature",
            EditAction::Batch(_) => "batch",
        }
    }

    /// Performs the edit.
    pub fn apply<'a>(&'a self, store: &'a dyn FeatureStore) -> EffectFuture<'a> {
        Box::pin(async move {
            match self {
                EditAction::AddFeature(feature) => store.insert(feature.clone()).await,
                EditAction::ModifyGeometry { id, after, .. } => {
                    store.replace_geometry(id, after.clone()).await.map(|_| ())
                }
                EditAction::DeleteFeature(feature) => {
                    store.remove(feature_id(feature)?).await.map(|_| ())
                }
                EditAction::Batch(children) => {
                    for (index, child) in children.iter().enumerate() {
                        if let Err(err) = child.apply(store).await {
                            for done in children[..index].iter().rev() {
                                if let Err(rollback) = done.reverse(store).await {
                                    tracing::warn!("Batch apply rollback failed: {}", rollback);
                                }
                            }
                            return Err(err);
                        }
                    }
                    Ok(())
                }
            }
        })
    }

    /// Undoes the edit.
    pub fn reverse<'a>(&'a self, store: &'a dyn FeatureStore) -> EffectFuture<'a> {
        Box::pin(async move {
            match self {
                EditAction::AddFeature(feature) => {
                    store.remove(feature_id(feature)?).await.map(|_| ())
                }
                EditAction::ModifyGeometry { id, before, .. } => {
                    store.replace_geometry(id, before.clone()).await.map(|_| ())
                }
                EditAction::DeleteFeature(feature) => store.insert(feature.clone()).await,
                EditAction::Batch(children) => {
                    for (index, child) in children.iter().enumerate().rev() {
                        if let Err(err) = child.reverse(store).await {
                            for done in &children[index + 1..] {
                                if let Err(rollback) = done.apply(store).await {
                                    tracing::warn!("Batch reverse rollback failed: {}", rollback);
                                }
                            }
                            return Err(err);
                        }
                    }
                    Ok(())
                }
            }
        })
    }
}

fn feature_id(feature: &Feature) -> StoreResult<&FeatureId> {
    feature.id.as_ref().ok_or(StoreError::MissingId)
}

/// A recorded edit with its identity and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoableAction {
    id: Uuid,
    created_at: DateTime<Utc>,
    description: Option<String>,
    action: EditAction,
}

impl UndoableAction {
    pub fn new(action: EditAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            description: None,
            action,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.action.kind()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn action(&self) -> &EditAction {
        &self.action
    }

    pub fn into_action(self) -> EditAction {
        self.action
    }
}

/// Undo/redo availability reported to observers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Default)]
struct HistoryState {
    undo_stack: VecDeque<UndoableAction>,
    redo_stack: Vec<UndoableAction>,
    current_batch: Option<Vec<UndoableAction>>,
    /// Bumped on every recorded entry and on clear.
    generation: u64,
}

impl HistoryState {
    fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: !self.undo_stack.is_empty(),
            can_redo: !self.redo_stack.is_empty(),
        }
    }
}

/// Bounded undo/redo stacks with batching.
pub struct UndoRedoStack {
    state: Mutex<HistoryState>,
    max_depth: usize,
    busy: AtomicBool,
    on_change: Mutex<Option<DataCallback<HistoryStatus>>>,
}

impl UndoRedoStack {
    /// Create a stack with the default depth (50)
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_MAX_DEPTH)
    }

    /// Create a stack keeping at most `max_depth` undo entries
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            state: Mutex::new(HistoryState::default()),
            max_depth: max_depth.max(1),
            busy: AtomicBool::new(false),
            on_change: Mutex::new(None),
        }
    }

    /// Registers the observer notified after every change to the stacks.
    pub fn set_on_change<F>(&self, callback: F)
    where
        F: Fn(HistoryStatus) + Send + Sync + 'static,
    {
        *self.on_change.lock() = Some(Box::new(callback));
    }

    /// Records an action that has already been applied.
    ///
    /// While a batch is open the action is buffered into it instead.
    pub fn add_action(&self, action: UndoableAction) {
        let status = {
            let mut state = self.state.lock();
            if let Some(batch) = state.current_batch.as_mut() {
                batch.push(action);
                return;
            }
            self.push_undo(&mut state, action);
            state.status()
        };
        self.notify(status);
    }

    /// Shorthand for recording a bare [`EditAction`].
    pub fn record(&self, action: EditAction) {
        self.add_action(UndoableAction::new(action));
    }

    fn push_undo(&self, state: &mut HistoryState, action: UndoableAction) {
        tracing::debug!(kind = action.kind(), "Recording undo entry");
        state.generation += 1;
        state.redo_stack.clear();
        state.undo_stack.push_back(action);
        while state.undo_stack.len() > self.max_depth {
            state.undo_stack.pop_front();
        }
    }

    /// Opens a batch. Actions added until [`end_batch`](Self::end_batch) become one entry.
    pub fn start_batch(&self) {
        let mut state = self.state.lock();
        if state.current_batch.is_some() {
            tracing::warn!("start_batch called with a batch already open; continuing it");
            return;
        }
        state.current_batch = Some(Vec::new());
    }

    /// Closes the open batch. An empty batch records nothing.
    pub fn end_batch(&self, description: Option<&str>) {
        let status = {
            let mut state = self.state.lock();
            let Some(batch) = state.current_batch.take() else {
                return;
            };
            if batch.is_empty() {
                return;
            }

            let children = batch.into_iter().map(UndoableAction::into_action).collect();
            let mut entry = UndoableAction::new(EditAction::Batch(children));
            if let Some(description) = description {
                entry = entry.with_description(description);
            }
            self.push_undo(&mut state, entry);
            state.status()
        };
        self.notify(status);
    }

    pub fn is_batching(&self) -> bool {
        self.state.lock().current_batch.is_some()
    }

    /// Reverses the most recent action.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. If the effect fails
    /// both stacks are left unchanged and the error is returned.
    ///
    /// The entry stays on the undo stack while its effect runs. If another
    /// entry is recorded in the meantime the undone entry is dropped instead
    /// of being offered for redo.
    pub async fn undo(&self, store: &dyn FeatureStore) -> HistoryResult<bool> {
        let _guard = InFlight::acquire(&self.busy).ok_or(HistoryError::Busy)?;

        let (top, generation) = {
            let state = self.state.lock();
            let top = state.undo_stack.back().cloned();
            (top, state.generation)
        };
        let Some(action) = top else {
            return Ok(false);
        };

        let outcome = action.action().reverse(store).await;
        if let Err(err) = outcome {
            tracing::warn!(kind = action.kind(), "Undo failed: {}", err);
            return Err(err.into());
        }

        tracing::debug!(kind = action.kind(), "Undid action");
        let status = {
            let mut state = self.state.lock();
            if let Some(index) = state.undo_stack.iter().rposition(|a| a.id == action.id) {
                state.undo_stack.remove(index);
            }
            if state.generation == generation {
                state.redo_stack.push(action);
            } else {
                tracing::debug!(kind = action.kind(), "History changed during undo, not kept for redo");
            }
            state.status()
        };
        self.notify(status);
        Ok(true)
    }

    /// Re-applies the most recently undone action.
    ///
    /// Returns `Ok(false)` when there is nothing to redo. If the effect fails
    /// both stacks are left unchanged and the error is returned.
    pub async fn redo(&self, store: &dyn FeatureStore) -> HistoryResult<bool> {
        let _guard = InFlight::acquire(&self.busy).ok_or(HistoryError::Busy)?;

        let Some(action) = self.state.lock().redo_stack.last().cloned() else {
            return Ok(false);
        };

        let outcome = action.action().apply(store).await;
        if let Err(err) = outcome {
            tracing::warn!(kind = action.kind(), "Redo failed: {}", err);
            return Err(err.into());
        }

        tracing::debug!(kind = action.kind(), "Redid action");
        let status = {
            let mut state = self.state.lock();
            if let Some(index) = state.redo_stack.iter().rposition(|a| a.id == action.id) {
                state.redo_stack.remove(index);
                state.undo_stack.push_back(action);
                while state.undo_stack.len() > self.max_depth {
                    state.undo_stack.pop_front();
                }
            } else {
                tracing::debug!(kind = action.kind(), "Redo history cleared during redo");
            }
            state.status()
        };
        self.notify(status);
        Ok(true)
    }

    /// Empties both stacks and drops any open batch.
    pub fn clear(&self) {
        let status = {
            let mut state = self.state.lock();
            state.undo_stack.clear();
            state.redo_stack.clear();
            state.current_batch = None;
            state.generation += 1;
            state.status()
        };
        self.notify(status);
    }

    pub fn can_undo(&self) -> bool {
        !self.state.lock().undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.state.lock().redo_stack.is_empty()
    }

    pub fn status(&self) -> HistoryStatus {
        self.state.lock().status()
    }

    pub fn undo_count(&self) -> usize {
        self.state.lock().undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.state.lock().redo_stack.len()
    }

    /// Description of the entry `undo` would reverse.
    pub fn peek_undo(&self) -> Option<UndoableAction> {
        self.state.lock().undo_stack.back().cloned()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn notify(&self, status: HistoryStatus) {
        if let Some(callback) = self.on_change.lock().as_ref() {
            callback(status);
        }
    }
}

impl Default for UndoRedoStack {
    fn default() -> Self {
        Self::new()
    }
}
