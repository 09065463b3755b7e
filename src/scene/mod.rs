//! Renderer abstraction
//!
//! The graph model is the source of truth; a [`Scene`] is a pure projection of
//! it. Every entity owns exactly one scene element carrying a queryable marker
//! derived from its logical identity (`__n<id>` for nodes, `__e<s>--<t>` for
//! edges) so external tooling can resolve an on-screen element back to its
//! entity. [`MemoryScene`] is the headless implementation used by the demo
//! binary and the tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value_objects::{Rect, Vector};

/// Opaque handle to a scene element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u64);

/// Rendering layers, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Edges,
    Nodes,
}

/// Kind of a scene element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Edge,
    Packet,
}

/// Geometry of a rendered edge: a line segment realized as a rotated bar of
/// the given length anchored at `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeGeometry {
    pub origin: Vector,
    pub length: f64,
    pub angle: f64,
}

/// Shared handle to a scene implementation.
pub type SceneHandle = Rc<RefCell<dyn Scene>>;

/// Projection surface for graph entities.
///
/// Packet operations tolerate missing elements: a scheduled pulse step may
/// arrive after its edge was removed.
pub trait Scene {
    /// Create a detached node element with the given marker and label.
    fn create_node(&mut self, marker: &str, label: &str) -> ElementId;

    /// Create a detached edge element with the given marker.
    fn create_edge(&mut self, marker: &str) -> ElementId;

    /// Attach a previously created element to a layer.
    fn attach(&mut self, element: ElementId, layer: Layer);

    /// Remove an element and any packets riding on it.
    fn remove(&mut self, element: ElementId);

    /// Position an element by its top-left corner.
    fn place(&mut self, element: ElementId, top_left: Vector);

    /// The rendered size of an element.
    fn measure(&self, element: ElementId) -> Vector;

    /// Update a node's label text.
    fn set_label(&mut self, element: ElementId, label: &str);

    /// Toggle a node's selected marker.
    fn set_selected(&mut self, element: ElementId, selected: bool);

    /// Apply recomputed edge geometry.
    fn set_edge_geometry(&mut self, element: ElementId, geometry: EdgeGeometry);

    /// Insert a packet marker on an edge in its initial, non-animating state.
    fn create_packet(&mut self, edge: ElementId, reversed: bool, duration_ms: u64) -> ElementId;

    /// Flip a packet marker into its animating state.
    fn start_packet(&mut self, packet: ElementId);

    /// Show the marquee overlay at the given frame, or hide it.
    fn set_selection_box(&mut self, frame: Option<Rect>);

    /// Resolve an element by its identity marker.
    fn find_by_marker(&self, marker: &str) -> Option<ElementId>;
}

/// One element recorded by [`MemoryScene`].
#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    pub marker: String,
    pub layer: Option<Layer>,
    pub top_left: Vector,
    pub label: String,
    pub selected: bool,
    pub geometry: Option<EdgeGeometry>,
    pub parent: Option<ElementId>,
    pub animating: bool,
    pub reversed: bool,
    pub duration_ms: u64,
}

/// In-memory scene for headless operation and tests.
pub struct MemoryScene {
    next_id: u64,
    node_size: Vector,
    elements: HashMap<ElementId, Element>,
    selection_box: Option<Rect>,
    packets_spawned: u64,
}

impl MemoryScene {
    /// Create a scene whose nodes render at the default size.
    pub fn new() -> Self {
        Self::with_node_size(Vector::new(60.0, 30.0))
    }

    /// Create a scene whose nodes all render at `node_size`.
    pub fn with_node_size(node_size: Vector) -> Self {
        Self {
            next_id: 0,
            node_size,
            elements: HashMap::new(),
            selection_box: None,
            packets_spawned: 0,
        }
    }

    /// Wrap a scene into the shared handle the graph expects.
    pub fn into_handle(self) -> Rc<RefCell<MemoryScene>> {
        Rc::new(RefCell::new(self))
    }

    fn insert(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, element);
        id
    }

    /// Look up a recorded element.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Whether the element exists and is attached to a layer.
    pub fn is_attached(&self, id: ElementId) -> bool {
        self.elements
            .get(&id)
            .map(|e| e.layer.is_some())
            .unwrap_or(false)
    }

    /// Packets currently riding on the given edge.
    pub fn packets_on(&self, edge: ElementId) -> usize {
        self.elements
            .values()
            .filter(|e| e.kind == ElementKind::Packet && e.parent == Some(edge))
            .count()
    }

    /// Packets on the given edge that have been flipped to animating.
    pub fn animating_packets_on(&self, edge: ElementId) -> usize {
        self.elements
            .values()
            .filter(|e| e.kind == ElementKind::Packet && e.parent == Some(edge) && e.animating)
            .count()
    }

    /// Total packets spawned since scene creation.
    pub fn packets_spawned(&self) -> u64 {
        self.packets_spawned
    }

    /// Current marquee overlay frame, if shown.
    pub fn selection_box(&self) -> Option<Rect> {
        self.selection_box
    }

    /// Number of attached elements of a kind.
    pub fn attached_count(&self, kind: ElementKind) -> usize {
        self.elements
            .values()
            .filter(|e| e.kind == kind && e.layer.is_some())
            .count()
    }
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for MemoryScene {
    fn create_node(&mut self, marker: &str, label: &str) -> ElementId {
        self.insert(Element {
            kind: ElementKind::Node,
            marker: marker.to_string(),
            layer: None,
            top_left: Vector::origin(),
            label: label.to_string(),
            selected: false,
            geometry: None,
            parent: None,
            animating: false,
            reversed: false,
            duration_ms: 0,
        })
    }

    fn create_edge(&mut self, marker: &str) -> ElementId {
        self.insert(Element {
            kind: ElementKind::Edge,
            marker: marker.to_string(),
            layer: None,
            top_left: Vector::origin(),
            label: String::new(),
            selected: false,
            geometry: None,
            parent: None,
            animating: false,
            reversed: false,
            duration_ms: 0,
        })
    }

    fn attach(&mut self, element: ElementId, layer: Layer) {
        if let Some(el) = self.elements.get_mut(&element) {
            el.layer = Some(layer);
        }
    }

    fn remove(&mut self, element: ElementId) {
        self.elements.remove(&element);
        self.elements.retain(|_, e| e.parent != Some(element));
    }

    fn place(&mut self, element: ElementId, top_left: Vector) {
        if let Some(el) = self.elements.get_mut(&element) {
            el.top_left = top_left;
        }
    }

    fn measure(&self, element: ElementId) -> Vector {
        match self.elements.get(&element) {
            Some(el) if el.kind == ElementKind::Node => self.node_size,
            _ => Vector::origin(),
        }
    }

    fn set_label(&mut self, element: ElementId, label: &str) {
        if let Some(el) = self.elements.get_mut(&element) {
            el.label = label.to_string();
        }
    }

    fn set_selected(&mut self, element: ElementId, selected: bool) {
        if let Some(el) = self.elements.get_mut(&element) {
            el.selected = selected;
        }
    }

    fn set_edge_geometry(&mut self, element: ElementId, geometry: EdgeGeometry) {
        if let Some(el) = self.elements.get_mut(&element) {
            el.geometry = Some(geometry);
        }
    }

    fn create_packet(&mut self, edge: ElementId, reversed: bool, duration_ms: u64) -> ElementId {
        if !self.elements.contains_key(&edge) {
            // pulse raced against edge removal; record nothing
            return ElementId(u64::MAX);
        }
        self.packets_spawned += 1;
        self.insert(Element {
            kind: ElementKind::Packet,
            marker: String::new(),
            layer: None,
            top_left: Vector::origin(),
            label: String::new(),
            selected: false,
            geometry: None,
            parent: Some(edge),
            animating: false,
            reversed,
            duration_ms,
        })
    }

    fn start_packet(&mut self, packet: ElementId) {
        if let Some(el) = self.elements.get_mut(&packet) {
            el.animating = true;
        }
    }

    fn set_selection_box(&mut self, frame: Option<Rect>) {
        self.selection_box = frame;
    }

    fn find_by_marker(&self, marker: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .find(|(_, e)| !e.marker.is_empty() && e.marker == marker)
            .map(|(id, _)| *id)
    }
}
