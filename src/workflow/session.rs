//! One editing session over the workflow graph.
//!
//! A [`Workflow`] is constructed once per session and handed to whoever needs it
//! (HTTP handlers, the CLI). It is a cheap-to-clone handle; all clones share the
//! same state. Mutations are applied and saved under a single lock, then a layout
//! pass is scheduled on the tokio runtime without waiting for it.
//!
//! Overlapping layout passes are not cancelled: whichever finishes last decides
//! the final positions.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::layout::{LayeredLayout, LayoutEngine, LayoutError, LayoutOptions};
use crate::models::*;
use crate::storage::Persistence;

use super::store::{ChainInsert, GraphStore, NodeDataFn};

const EVENT_CAPACITY: usize = 64;

/// Notifications for the rendering side.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    /// Nodes, edges or the selection changed.
    Changed,
    /// A layout pass repositioned this many nodes.
    LayoutApplied { positioned: usize },
    /// The view should fit the graph again.
    FitView,
    Reset,
    Loaded,
}

/// Defaults for the payload of feature nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDefaults {
    pub measurement: String,
    pub max_length: u32,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            measurement: "GPT-o1".to_string(),
            max_length: 60,
        }
    }
}

/// Node payload used by the feature side panel: the feature's name and its
/// description as the extraction prompt.
pub fn prompt_node_data(defaults: NodeDefaults) -> Arc<NodeDataFn> {
    Arc::new(move |feature: &Feature| {
        json!({
            "name": feature.feature_name,
            "measurement": defaults.measurement,
            "prompt": feature.feature_description,
            "maxLength": defaults.max_length,
        })
    })
}

#[derive(Debug, Default)]
struct WorkflowState {
    graph: GraphStore,
    selected: Vec<String>,
    features: Vec<Feature>,
}

impl WorkflowState {
    fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            nodes: self.graph.nodes().to_vec(),
            edges: self.graph.edges().to_vec(),
            selected_feature_ids: self.selected.clone(),
        }
    }

    fn sync_selected_flags(&mut self) {
        for feature in &mut self.features {
            feature.selected = self.selected.contains(&feature.id);
        }
    }
}

struct Inner {
    state: Mutex<WorkflowState>,
    layout: Arc<dyn LayoutEngine>,
    layout_options: LayoutOptions,
    persistence: Persistence,
    node_data: Arc<NodeDataFn>,
    events: broadcast::Sender<WorkflowEvent>,
    pending_layouts: Mutex<Vec<JoinHandle<()>>>,
}

pub struct WorkflowBuilder {
    persistence: Persistence,
    layout: Option<Arc<dyn LayoutEngine>>,
    layout_options: LayoutOptions,
    features: Vec<Feature>,
    node_data: Option<Arc<NodeDataFn>>,
}

impl WorkflowBuilder {
    /// Use a specific layout engine instead of [`LayeredLayout`].
    pub fn layout(mut self, engine: Arc<dyn LayoutEngine>) -> Self {
        self.layout = Some(engine);
        self
    }

    pub fn layout_options(mut self, options: LayoutOptions) -> Self {
        self.layout_options = options;
        self
    }

    pub fn features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }

    pub fn node_data(mut self, node_data: Arc<NodeDataFn>) -> Self {
        self.node_data = Some(node_data);
        self
    }

    /// Build the session, restoring whatever the cache holds.
    pub fn build(self) -> Workflow {
        let saved = self.persistence.load();
        let mut state = WorkflowState {
            graph: GraphStore::from_parts(saved.nodes, saved.edges),
            selected: saved.selected_feature_ids,
            features: self.features,
        };
        state.sync_selected_flags();

        let layout_options = self.layout_options;
        let layout = self.layout.unwrap_or_else(|| {
            Arc::new(LayeredLayout::new(layout_options.clone())) as Arc<dyn LayoutEngine>
        });
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        tracing::debug!(
            "Workflow session restored with {} nodes and {} edges",
            state.graph.nodes().len(),
            state.graph.edges().len()
        );

        Workflow {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                layout,
                layout_options,
                persistence: self.persistence,
                node_data: self
                    .node_data
                    .unwrap_or_else(|| prompt_node_data(NodeDefaults::default())),
                events,
                pending_layouts: Mutex::new(Vec::new()),
            }),
        }
    }
}

#[derive(Clone)]
pub struct Workflow {
    inner: Arc<Inner>,
}

impl Workflow {
    pub fn builder(persistence: Persistence) -> WorkflowBuilder {
        WorkflowBuilder {
            persistence,
            layout: None,
            layout_options: LayoutOptions::default(),
            features: Vec::new(),
            node_data: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowState> {
        self.inner.state.lock().expect("workflow state lock poisoned")
    }

    fn emit(&self, event: WorkflowEvent) {
        // no subscribers is fine
        let _ = self.inner.events.send(event);
    }

    /// Apply `f` under the state lock; if it reports a change, save and notify.
    fn mutate(&self, f: impl FnOnce(&mut WorkflowState) -> bool) -> bool {
        let changed = {
            let mut state = self.lock();
            let changed = f(&mut *state);
            if changed {
                self.persist(&state);
            }
            changed
        };
        if changed {
            self.emit(WorkflowEvent::Changed);
        }
        changed
    }

    fn persist(&self, state: &WorkflowState) {
        if let Err(e) = self.inner.persistence.save(&state.snapshot()) {
            tracing::error!("Failed to save workflow: {}", e);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.lock().snapshot()
    }

    pub fn nodes(&self) -> Vec<GraphNode> {
        self.lock().graph.nodes().to_vec()
    }

    pub fn edges(&self) -> Vec<GraphEdge> {
        self.lock().graph.edges().to_vec()
    }

    pub fn selected_feature_ids(&self) -> Vec<String> {
        self.lock().selected.clone()
    }

    /// The feature catalog, with `selected` reflecting the current selection.
    pub fn features(&self) -> Vec<Feature> {
        self.lock().features.clone()
    }

    /// Replace the catalog. Incoming `selected` flags are overwritten from the
    /// session's selection; use [`Workflow::seed_from_catalog`] to honour them.
    pub fn set_features(&self, features: Vec<Feature>) {
        let mut state = self.lock();
        state.features = features;
        state.sync_selected_flags();
    }

    /// Replace the catalog and select every feature it marks `selected`,
    /// inserting each one's chain. Existing selections are kept.
    pub fn seed_from_catalog(&self, features: Vec<Feature>) -> ChainInsert {
        let node_data = self.inner.node_data.clone();
        let mut seeded = ChainInsert::default();
        let changed = self.mutate(|state| {
            let marked: Vec<String> = features
                .iter()
                .filter(|f| f.selected)
                .map(|f| f.id.clone())
                .collect();
            state.features = features;

            let mut changed = false;
            for id in &marked {
                if !state.selected.contains(id) {
                    state.selected.push(id.clone());
                    changed = true;
                }
                let inserted = state
                    .graph
                    .add_feature_chain(id, &state.features, &*node_data);
                seeded.nodes_added += inserted.nodes_added;
                seeded.edges_added += inserted.edges_added;
            }
            state.sync_selected_flags();
            changed || !seeded.is_noop()
        });

        if changed {
            tracing::debug!(
                "Seeded {} nodes and {} edges from the catalog",
                seeded.nodes_added,
                seeded.edges_added
            );
            self.schedule_layout();
        }
        seeded
    }

    /// Select or deselect a feature from the catalog.
    ///
    /// Selecting adds the feature and its ancestors; deselecting removes only the
    /// feature's own node. Selecting an unknown feature does nothing.
    pub fn toggle_feature(&self, feature_id: &str, checked: bool) -> bool {
        let node_data = self.inner.node_data.clone();
        let changed = self.mutate(|state| {
            let changed = if checked {
                if !state.features.iter().any(|f| f.id == feature_id) {
                    tracing::debug!("Ignoring selection of unknown feature {}", feature_id);
                    return false;
                }
                let newly_selected = !state.selected.iter().any(|id| id == feature_id);
                if newly_selected {
                    state.selected.push(feature_id.to_string());
                }
                let inserted = state
                    .graph
                    .add_feature_chain(feature_id, &state.features, &*node_data);
                newly_selected || !inserted.is_noop()
            } else {
                let before = state.selected.len();
                state.selected.retain(|id| id != feature_id);
                let removed = state.graph.remove_feature(feature_id);
                removed || before != state.selected.len()
            };
            state.sync_selected_flags();
            changed
        });

        if changed {
            tracing::debug!("Feature {} toggled to {}", feature_id, checked);
            self.schedule_layout();
        }
        changed
    }

    /// Insert `target_id` and its ancestors from `all_features`, building node
    /// payloads with `to_node_data`. Does not touch the selection.
    pub fn add_feature_chain(
        &self,
        target_id: &str,
        all_features: &[Feature],
        to_node_data: &NodeDataFn,
    ) -> ChainInsert {
        let mut inserted = ChainInsert::default();
        self.mutate(|state| {
            inserted = state
                .graph
                .add_feature_chain(target_id, all_features, to_node_data);
            !inserted.is_noop()
        });

        if !inserted.is_noop() {
            tracing::debug!(
                "Added chain for {}: {} nodes, {} edges",
                target_id,
                inserted.nodes_added,
                inserted.edges_added
            );
            self.schedule_layout();
        }
        inserted
    }

    /// Remove the node of `feature_id` and its incident edges.
    pub fn remove_feature(&self, feature_id: &str) -> bool {
        let removed = self.mutate(|state| state.graph.remove_feature(feature_id));
        if removed {
            tracing::debug!("Removed feature node {}", feature_id);
            self.schedule_layout();
        }
        removed
    }

    pub fn on_nodes_change(&self, changes: &[NodeChange]) -> bool {
        self.mutate(|state| state.graph.apply_node_changes(changes))
    }

    pub fn on_edges_change(&self, changes: &[EdgeChange]) -> bool {
        self.mutate(|state| state.graph.apply_edge_changes(changes))
    }

    pub fn on_connect(&self, connection: &Connection) -> bool {
        self.mutate(|state| state.graph.connect(connection))
    }

    /// Save the current state explicitly.
    pub fn save(&self) -> Result<(), crate::storage::StorageError> {
        let state = self.lock();
        self.inner.persistence.save(&state.snapshot())
    }

    /// Replace the in-memory state with whatever the cache holds.
    pub fn load_saved(&self) {
        let saved = self.inner.persistence.load();
        {
            let mut state = self.lock();
            state.graph.replace(saved.nodes, saved.edges);
            state.selected = saved.selected_feature_ids;
            state.sync_selected_flags();
        }
        tracing::info!("Workflow reloaded from cache");
        self.emit(WorkflowEvent::Loaded);
    }

    /// Drop every node, edge and selection, in memory and in the cache.
    pub fn reset_all(&self) {
        {
            let mut state = self.lock();
            state.graph.clear();
            state.selected.clear();
            state.sync_selected_flags();
            if let Err(e) = self.inner.persistence.clear() {
                tracing::error!("Failed to clear cached workflow: {}", e);
            }
        }
        tracing::info!("Workflow reset");
        self.emit(WorkflowEvent::Reset);
    }

    /// Run a layout pass now and merge its positions into the current nodes.
    ///
    /// The state lock is not held while the engine runs, so mutations made in the
    /// meantime are kept; positions for nodes removed in the meantime are dropped.
    /// On error nothing is modified.
    pub async fn relayout(&self) -> Result<usize, LayoutError> {
        let (nodes, edges) = {
            let state = self.lock();
            if state.graph.nodes().is_empty() {
                return Ok(0);
            }
            self.inner
                .layout_options
                .describe(state.graph.nodes(), state.graph.edges())
        };

        let positions = self.inner.layout.layout(&nodes, &edges).await?;

        let positioned = {
            let mut state = self.lock();
            let positioned = state.graph.apply_positions(&positions);
            if positioned > 0 {
                self.persist(&state);
            }
            positioned
        };

        tracing::debug!("Layout positioned {} nodes", positioned);
        self.emit(WorkflowEvent::LayoutApplied { positioned });
        self.emit(WorkflowEvent::FitView);
        Ok(positioned)
    }

    fn schedule_layout(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available, skipping layout");
            return;
        };

        let workflow = self.clone();
        let task = runtime.spawn(async move {
            if let Err(e) = workflow.relayout().await {
                tracing::error!("Layout failed, keeping previous positions: {}", e);
            }
        });

        let mut pending = self
            .inner
            .pending_layouts
            .lock()
            .expect("layout queue lock poisoned");
        pending.retain(|t| !t.is_finished());
        pending.push(task);
    }

    /// Wait for every scheduled layout pass to finish.
    pub async fn settle(&self) {
        loop {
            let pending = std::mem::take(
                &mut *self
                    .inner
                    .pending_layouts
                    .lock()
                    .expect("layout queue lock poisoned"),
            );
            if pending.is_empty() {
                return;
            }
            for task in pending {
                if let Err(e) = task.await {
                    tracing::warn!("Layout task did not complete: {}", e);
                }
            }
        }
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Workflow")
            .field("nodes", &state.graph.nodes().len())
            .field("edges", &state.graph.edges().len())
            .field("selected", &state.selected)
            .finish()
    }
}
