//! Node entity: a draggable, identity-bearing point in the graph

use crate::reactive::Signal;
use crate::scene::{ElementId, Layer, Scene, SceneHandle};
use crate::value_objects::{NodeId, Rect, Vector};

use super::view::{Lifecycle, ViewCore};
use super::node_marker;

/// A graph vertex representing one traffic endpoint.
///
/// The live center position is published on a signal; destroying the node
/// completes that signal, which is how dependent edges observe end-of-life.
pub struct NodeEntity {
    id: NodeId,
    view: ViewCore,
    position: Signal<Vector>,
    alias: String,
    selected: bool,
    received: u64,
    sent: u64,
}

impl NodeEntity {
    /// Create a detached node entity. The container attaches and positions it.
    pub(crate) fn new(id: NodeId, scene: SceneHandle) -> Self {
        let element = scene
            .borrow_mut()
            .create_node(&node_marker(&id), id.as_str());
        let alias = id.to_string();
        Self {
            id,
            view: ViewCore::new(scene, element),
            position: Signal::new(),
            alias,
            selected: false,
            received: 0,
            sent: 0,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn element(&self) -> ElementId {
        self.view.element()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.view.lifecycle()
    }

    /// Live center position stream. Never emits before the first `move_to`,
    /// so no subscriber observes an uninitialized position.
    pub fn position_signal(&self) -> Signal<Vector> {
        self.position.clone()
    }

    /// Current center position.
    pub fn position(&self) -> Vector {
        self.view.top_left().plus(self.size().scaled(0.5))
    }

    /// Rendered size.
    pub fn size(&self) -> Vector {
        self.view.size()
    }

    /// Half the larger rendered dimension; used for circle intersection in
    /// marquee selection, not for physics.
    pub fn radius(&self) -> f64 {
        let size = self.size();
        size.x.max(size.y) / 2.0
    }

    /// The on-screen bounding box, for hit testing.
    pub fn frame(&self) -> Rect {
        Rect::new(self.view.top_left(), self.size())
    }

    /// Move the node so that `center` becomes its center point, offsetting by
    /// half the rendered size. Always re-emits on the position signal, even
    /// for a repeated center; deduplication happens downstream where needed.
    pub fn move_to(&mut self, center: Vector) {
        self.view.move_to(center.minus(self.size().scaled(0.5)));
        self.position.emit(center);
    }

    /// Display label, defaults to the id.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = alias.into();
        let scene = self.view.scene();
        scene.borrow_mut().set_label(self.view.element(), &self.alias);
    }

    /// Presentational selected marker; the container's selection signal is
    /// the source of truth for membership.
    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
        let scene = self.view.scene();
        scene
            .borrow_mut()
            .set_selected(self.view.element(), selected);
    }

    /// Accumulate traffic counters. Monotonic.
    pub fn log_traffic(&mut self, incoming: u64, outgoing: u64) {
        self.received += incoming;
        self.sent += outgoing;
    }

    /// Cumulative `(received, sent)` counters.
    pub fn traffic(&self) -> (u64, u64) {
        (self.received, self.sent)
    }

    pub(crate) fn attach(&mut self, layer: Layer) {
        self.view.attach(layer);
    }

    /// Detach the element and complete the position signal. Dependent edges
    /// dispose themselves in response. Panics when called twice.
    pub fn destroy(&mut self) {
        self.view.destroy();
        self.position.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn node(id: &str) -> NodeEntity {
        let scene = MemoryScene::new().into_handle();
        let mut node = NodeEntity::new(id.into(), scene);
        node.attach(Layer::Nodes);
        node
    }

    #[test]
    fn test_move_to_centers_and_emits() {
        let mut node = node("a");
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen2 = Rc::clone(&seen);
        let sub = node
            .position_signal()
            .subscribe(move |pos| seen2.borrow_mut().push(*pos));
        // nothing emitted before the first move
        assert!(seen.borrow().is_empty());

        let center = Vector::new(100.0, 50.0);
        node.move_to(center);
        assert_eq!(node.position(), center);
        // element is placed by its top-left corner
        assert!(node.frame().contains(center));
        assert_eq!(*seen.borrow(), vec![center]);

        // same center still emits, no deduplication at this layer
        node.move_to(center);
        assert_eq!(*seen.borrow(), vec![center, center]);
        drop(sub);
    }

    #[test]
    fn test_alias_defaults_to_id() {
        let mut node = node("host-1");
        assert_eq!(node.alias(), "host-1");

        node.set_alias("database");
        assert_eq!(node.alias(), "database");
        assert_eq!(node.id().as_str(), "host-1");
    }

    #[test]
    fn test_traffic_counters_accumulate() {
        let mut node = node("a");
        node.log_traffic(2, 1);
        node.log_traffic(3, 0);
        assert_eq!(node.traffic(), (5, 1));
    }

    #[test]
    fn test_destroy_completes_position_signal() {
        let mut node = node("a");
        let signal = node.position_signal();
        node.move_to(Vector::new(1.0, 1.0));

        node.destroy();
        assert!(signal.is_completed());
    }

    #[test]
    #[should_panic(expected = "destroyed twice")]
    fn test_double_destroy_panics() {
        let mut node = node("a");
        node.destroy();
        node.destroy();
    }

    #[test]
    fn test_radius_is_half_max_dimension() {
        let scene = MemoryScene::with_node_size(Vector::new(80.0, 20.0)).into_handle();
        let mut node = NodeEntity::new("a".into(), scene);
        node.attach(Layer::Nodes);
        assert_eq!(node.radius(), 40.0);
    }
}
