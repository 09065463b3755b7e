//! Graph container
//!
//! Owns the node and edge collections, the id -> entity index, lazy
//! creation with the default-position policy, the pointer state machine for
//! marquee selection and drag-move, and the selection signal. All entity
//! mutation goes through the container; entities never touch each other's
//! registrations.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::{EdgeEntity, NodeEntity};
use crate::reactive::{Signal, Subscription};
use crate::scene::{ElementId, Layer, Scene, SceneHandle};
use crate::scheduler::{Debounce, Scheduler};
use crate::state::StateStore;
use crate::value_objects::{EdgeKey, NodeId, Rect, Vector};

/// What a primary-button press on empty canvas starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CanvasDragPolicy {
    /// Rubber-band selection (default).
    Marquee,
    /// Pan every node by the pointer delta.
    PanAll,
}

/// Tunables of the graph view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Logical canvas size; new nodes without a stored position appear in a
    /// ring around its center.
    pub canvas_size: Vector,
    /// Spacing used by the layout helpers.
    pub layout_step: f64,
    /// Quiet window before a node position is written to the state store.
    pub persist_debounce_ms: u64,
    /// Quiet window before a mapping emission is applied to aliases.
    pub mapping_debounce_ms: u64,
    /// Settle delay before a packet pulse starts animating.
    pub pulse_settle_ms: u64,
    /// Travel time of a packet pulse.
    pub pulse_duration_ms: u64,
    /// Empty-canvas drag behavior.
    pub canvas_drag: CanvasDragPolicy,
    /// Seed for the placement RNG; random when absent.
    pub rng_seed: Option<u64>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            canvas_size: Vector::new(1280.0, 800.0),
            layout_step: 80.0,
            persist_debounce_ms: 100,
            mapping_debounce_ms: 100,
            pulse_settle_ms: 100,
            pulse_duration_ms: 2000,
            canvas_drag: CanvasDragPolicy::Marquee,
            rng_seed: None,
        }
    }
}

/// Resolves a scene element back to the entity owning it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Node(NodeId),
    Edge(EdgeKey),
}

/// Pointer buttons the container cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

/// Explicit input state machine. A gesture's state is scoped from press to
/// release/leave and torn down completely when it ends.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PointerState {
    Idle,
    Dragging { last: Vector },
    Marquee { origin: Vector },
    Panning { last: Vector },
}

struct NodeRecord {
    entity: NodeEntity,
    _persist: Subscription,
}

/// The interactive graph view core.
pub struct GraphView {
    config: GraphConfig,
    scene: SceneHandle,
    scheduler: Scheduler,
    store: Rc<RefCell<StateStore>>,
    rng: StdRng,
    nodes: IndexMap<NodeId, NodeRecord>,
    edges: Rc<RefCell<IndexMap<EdgeKey, EdgeEntity>>>,
    elements: Rc<RefCell<HashMap<ElementId, EntityRef>>>,
    selection: Signal<Vec<NodeId>>,
    current_selection: Vec<NodeId>,
    pointer: PointerState,
}

impl GraphView {
    /// Create a graph view over a scene, a scheduler and a restored state
    /// store.
    pub fn new(
        store: StateStore,
        scene: SceneHandle,
        scheduler: Scheduler,
        config: GraphConfig,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            scene,
            scheduler,
            store: Rc::new(RefCell::new(store)),
            rng,
            nodes: IndexMap::new(),
            edges: Rc::new(RefCell::new(IndexMap::new())),
            elements: Rc::new(RefCell::new(HashMap::new())),
            selection: Signal::new(),
            current_selection: Vec::new(),
            pointer: PointerState::Idle,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn scheduler(&self) -> Scheduler {
        self.scheduler.clone()
    }

    /// The backing state store.
    pub fn store(&self) -> Rc<RefCell<StateStore>> {
        Rc::clone(&self.store)
    }

    // ---- entity resolution -------------------------------------------------

    /// Look up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&NodeEntity> {
        self.nodes.get(id).map(|record| &record.entity)
    }

    /// Mutable node lookup.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut NodeEntity> {
        self.nodes.get_mut(id).map(|record| &mut record.entity)
    }

    /// All live nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeEntity> {
        self.nodes.values().map(|record| &record.entity)
    }

    /// Ids of all live nodes in insertion order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().cloned().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.borrow().len()
    }

    /// Resolve a scene element back to its owning entity.
    pub fn entity_of(&self, element: ElementId) -> Option<EntityRef> {
        self.elements.borrow().get(&element).cloned()
    }

    /// Return a node for the id, creating it when absent. A brand-new node is
    /// positioned by precedence: stored position, then a random offset at
    /// three near-node radii when `near` resolves, then a random ring around
    /// the canvas center.
    pub fn get_or_create_node(&mut self, id: &NodeId, near: Option<&NodeId>) -> &NodeEntity {
        if self.nodes.contains_key(id) {
            return &self.nodes.get(id).unwrap().entity;
        }

        let near_info = near
            .and_then(|near_id| self.nodes.get(near_id))
            .map(|record| (record.entity.position(), record.entity.radius()));

        let mut position = self.store.borrow().position_of(id.as_str());
        if position.is_none() {
            if let Some((center, radius)) = near_info {
                let offset = Vector::random(&mut self.rng).scaled(3.0 * radius);
                position = Some(center.plus(offset));
            }
        }

        let node = NodeEntity::new(id.clone(), self.scene.clone());
        self.add_node(node, position)
    }

    /// Register a node entity. Falls back to the default position policy when
    /// `position` is `None`. Panics on a duplicate id: node ids are unique
    /// within a graph.
    pub fn add_node(&mut self, mut node: NodeEntity, position: Option<Vector>) -> &NodeEntity {
        let id = node.id().clone();
        assert!(
            !self.nodes.contains_key(&id),
            "node id {id} already registered"
        );

        node.attach(Layer::Nodes);
        if let Some(alias) = self.store.borrow().alias_of(id.as_str()) {
            node.set_alias(alias);
        }

        let position = match position {
            Some(position) => position,
            None => {
                let stored = self.store.borrow().position_of(id.as_str());
                match stored {
                    Some(stored) => stored,
                    None => self.random_center_position(),
                }
            }
        };
        node.move_to(position);

        // sync position changes back into the store, debounced
        let store = Rc::clone(&self.store);
        let persist_id = id.clone();
        let debounce = Debounce::new(
            self.scheduler.clone(),
            self.config.persist_debounce_ms,
            move |position: Vector| {
                let mut store = store.borrow_mut();
                store.set_position(persist_id.as_str(), position);
                store.persist();
            },
        );
        let persist = node
            .position_signal()
            .subscribe(move |position| debounce.feed(*position));

        self.elements
            .borrow_mut()
            .insert(node.element(), EntityRef::Node(id.clone()));
        debug!(node = %id, "node added");
        self.nodes.insert(
            id.clone(),
            NodeRecord {
                entity: node,
                _persist: persist,
            },
        );
        &self.nodes.get(&id).unwrap().entity
    }

    fn random_center_position(&mut self) -> Vector {
        let center = self.config.canvas_size.scaled(0.5);
        let radius = 50.0 + 100.0 * self.rng.gen::<f64>();
        center.plus(Vector::random(&mut self.rng).scaled(radius))
    }

    /// Destroy a node: drop it from the selection, unregister it and complete
    /// its position stream so dependent edges dispose themselves. Returns
    /// whether the node existed.
    pub fn destroy_node(&mut self, id: &NodeId) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }

        if self.current_selection.contains(id) {
            let remaining: Vec<NodeId> = self
                .current_selection
                .iter()
                .filter(|selected| *selected != id)
                .cloned()
                .collect();
            self.apply_selection(remaining);
        }

        let mut record = self.nodes.shift_remove(id).unwrap();
        self.elements.borrow_mut().remove(&record.entity.element());
        record.entity.destroy();
        debug!(node = %id, "node destroyed");
        true
    }

    /// Look up the edge between two ids in either direction. The flag reports
    /// whether the match was found in the reverse orientation.
    pub fn edge_of(&self, source: &NodeId, target: &NodeId) -> Option<(EdgeEntity, bool)> {
        let edges = self.edges.borrow();
        let forward = EdgeKey::new(source.clone(), target.clone());
        if let Some(edge) = edges.get(&forward) {
            return Some((edge.clone(), false));
        }
        edges
            .get(&forward.reversed())
            .map(|edge| (edge.clone(), true))
    }

    /// Return the edge between two ids, creating endpoints and edge as
    /// needed. At most one edge exists per unordered id pair; a brand-new
    /// target node is placed near the source.
    pub fn get_or_create_edge(&mut self, source: &NodeId, target: &NodeId) -> (EdgeEntity, bool) {
        if let Some(hit) = self.edge_of(source, target) {
            return hit;
        }
        self.get_or_create_node(source, None);
        self.get_or_create_node(target, Some(source));
        (self.connect(source, target), false)
    }

    /// Connect two existing nodes with a new edge tagged with the canonical
    /// `(source, target)` direction. Panics when either node is missing.
    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> EdgeEntity {
        let key = EdgeKey::new(source.clone(), target.clone());
        let source_stream = self
            .node(source)
            .expect("source node must exist")
            .position_signal();
        let target_stream = self
            .node(target)
            .expect("target node must exist")
            .position_signal();

        let edges = Rc::downgrade(&self.edges);
        let elements = Rc::downgrade(&self.elements);
        let cleanup_key = key.clone();
        let edge = EdgeEntity::connect(
            key.clone(),
            &source_stream,
            &target_stream,
            self.scene.clone(),
            self.scheduler.clone(),
            self.config.pulse_settle_ms,
            move || {
                if let Some(edges) = edges.upgrade() {
                    edges.borrow_mut().shift_remove(&cleanup_key);
                }
                if let Some(elements) = elements.upgrade() {
                    elements
                        .borrow_mut()
                        .retain(|_, entry| !matches!(entry, EntityRef::Edge(k) if *k == cleanup_key));
                }
                debug!(edge = %cleanup_key, "edge disposed");
            },
        );

        self.elements
            .borrow_mut()
            .insert(edge.element(), EntityRef::Edge(key.clone()));
        self.edges.borrow_mut().insert(key, edge.clone());
        edge
    }

    // ---- selection ---------------------------------------------------------

    /// Current selection signal. Array-content equality suppresses duplicate
    /// emissions.
    pub fn selection_signal(&self) -> Signal<Vec<NodeId>> {
        self.selection.clone()
    }

    /// The current selection.
    pub fn selection(&self) -> &[NodeId] {
        &self.current_selection
    }

    /// Replace the selection. Unknown ids are dropped: the selection only
    /// ever contains live nodes.
    pub fn update_selection(&mut self, mut nodes: Vec<NodeId>) {
        nodes.retain(|id| self.nodes.contains_key(id));
        self.apply_selection(nodes);
    }

    pub fn clear_selection(&mut self) {
        self.update_selection(Vec::new());
    }

    /// Select every node, or clear when everything is already selected.
    pub fn select_all_nodes(&mut self) {
        let all_selected = self
            .nodes
            .values()
            .all(|record| record.entity.selected());
        if all_selected {
            self.clear_selection();
        } else {
            let all = self.node_ids();
            self.update_selection(all);
        }
    }

    fn apply_selection(&mut self, nodes: Vec<NodeId>) {
        if nodes == self.current_selection {
            return;
        }
        for id in &self.current_selection {
            if !nodes.contains(id) {
                if let Some(record) = self.nodes.get_mut(id) {
                    record.entity.set_selected(false);
                }
            }
        }
        for id in &nodes {
            if let Some(record) = self.nodes.get_mut(id) {
                record.entity.set_selected(true);
            }
        }
        self.current_selection = nodes.clone();
        self.selection.emit(nodes);
    }

    /// Nodes whose bounding circle intersects the given frame, in insertion
    /// order.
    pub fn intersecting_nodes(&self, frame: &Rect) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|record| {
                frame.intersects_circle(record.entity.position(), record.entity.radius())
            })
            .map(|record| record.entity.id().clone())
            .collect()
    }

    // ---- movement ----------------------------------------------------------

    /// Move one node to a new center.
    pub fn move_node(&mut self, id: &NodeId, center: Vector) {
        if let Some(record) = self.nodes.get_mut(id) {
            record.entity.move_to(center);
        }
    }

    /// Move the given nodes by a delta. An empty slice moves all nodes.
    pub fn move_nodes_by(&mut self, delta: Vector, ids: &[NodeId]) {
        let targets: Vec<NodeId> = if ids.is_empty() {
            self.node_ids()
        } else {
            ids.to_vec()
        };
        for id in targets {
            if let Some(record) = self.nodes.get_mut(&id) {
                let next = record.entity.position().plus(delta);
                record.entity.move_to(next);
            }
        }
    }

    /// Rename a node and persist the alias.
    pub fn set_node_alias(&mut self, id: &NodeId, alias: &str) {
        if let Some(record) = self.nodes.get_mut(id) {
            record.entity.set_alias(alias);
            let mut store = self.store.borrow_mut();
            store.set_alias(id.as_str(), alias);
            store.persist();
        }
    }

    // ---- pointer state machine ---------------------------------------------

    /// The topmost node under the pointer, by insertion order.
    pub fn node_at(&self, point: Vector) -> Option<NodeId> {
        self.nodes
            .values()
            .rev()
            .find(|record| record.entity.frame().contains(point))
            .map(|record| record.entity.id().clone())
    }

    /// Primary-button press: selects, starts a drag on an already selected
    /// node, or starts a marquee (or pan, per config) on empty canvas.
    pub fn pointer_down(&mut self, point: Vector, button: PointerButton) {
        if button != PointerButton::Primary {
            return;
        }
        match self.node_at(point) {
            Some(id) if self.current_selection.contains(&id) => {
                self.pointer = PointerState::Dragging { last: point };
            }
            Some(id) => {
                self.update_selection(vec![id]);
            }
            None => match self.config.canvas_drag {
                CanvasDragPolicy::Marquee => {
                    let frame = Rect::empty(point);
                    self.scene.borrow_mut().set_selection_box(Some(frame));
                    let live = self.intersecting_nodes(&frame);
                    self.update_selection(live);
                    self.pointer = PointerState::Marquee { origin: point };
                }
                CanvasDragPolicy::PanAll => {
                    self.pointer = PointerState::Panning { last: point };
                }
            },
        }
    }

    /// Pointer movement while a gesture is active.
    pub fn pointer_move(&mut self, point: Vector) {
        match self.pointer {
            PointerState::Idle => {}
            PointerState::Dragging { last } => {
                let delta = point.minus(last);
                let selected = self.current_selection.clone();
                self.move_nodes_by(delta, &selected);
                self.pointer = PointerState::Dragging { last: point };
            }
            PointerState::Panning { last } => {
                let delta = point.minus(last);
                self.move_nodes_by(delta, &[]);
                self.pointer = PointerState::Panning { last: point };
            }
            PointerState::Marquee { origin } => {
                let frame = Rect::bbox_of(origin, point);
                self.scene.borrow_mut().set_selection_box(Some(frame));
                // selection tracks the box live, not only on release
                let live = self.intersecting_nodes(&frame);
                self.update_selection(live);
            }
        }
    }

    /// Release ends any gesture; the last computed selection is kept.
    pub fn pointer_up(&mut self, _point: Vector) {
        self.finish_gesture();
    }

    /// Leaving the canvas finalizes a marquee; a drag survives until release.
    pub fn pointer_leave(&mut self) {
        if matches!(self.pointer, PointerState::Marquee { .. }) {
            self.finish_gesture();
        }
    }

    fn finish_gesture(&mut self) {
        if matches!(self.pointer, PointerState::Marquee { .. }) {
            self.scene.borrow_mut().set_selection_box(None);
        }
        self.pointer = PointerState::Idle;
    }
}
