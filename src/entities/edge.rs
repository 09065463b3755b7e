//! Edge entity: a visual connector bound to two node position streams
//!
//! An edge never queries node internals. It is constructed from the two
//! position signals, recomputes its geometry with combine-latest semantics on
//! every emission of either one, and disposes itself when either stream
//! completes. That is how an edge disappears automatically when one of its
//! endpoints is destroyed, without the container tracking edge-to-node
//! dependencies.

use std::cell::RefCell;
use std::mem;
use std::rc::{Rc, Weak};

use crate::reactive::{Signal, Subscription};
use crate::scene::{EdgeGeometry, ElementId, Layer, Scene, SceneHandle};
use crate::scheduler::Scheduler;
use crate::value_objects::{EdgeKey, Vector};

use super::edge_marker;
use super::view::ViewCore;

struct EdgeInner {
    key: EdgeKey,
    view: ViewCore,
    scheduler: Scheduler,
    settle_ms: u64,
    latest_source: Option<Vector>,
    latest_target: Option<Vector>,
    alive: bool,
    subscriptions: Vec<Subscription>,
    on_destroy: Option<Box<dyn FnOnce()>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Source,
    Target,
}

/// Shared handle to an edge entity.
#[derive(Clone)]
pub struct EdgeEntity {
    inner: Rc<RefCell<EdgeInner>>,
}

impl EdgeEntity {
    /// Connect two position streams. `on_destroy` runs exactly once when the
    /// edge disposes itself, letting the container drop its registration.
    pub(crate) fn connect(
        key: EdgeKey,
        source: &Signal<Vector>,
        target: &Signal<Vector>,
        scene: SceneHandle,
        scheduler: Scheduler,
        settle_ms: u64,
        on_destroy: impl FnOnce() + 'static,
    ) -> Self {
        let element = scene.borrow_mut().create_edge(&edge_marker(&key));
        let mut view = ViewCore::new(scene, element);
        view.attach(Layer::Edges);

        let edge = Self {
            inner: Rc::new(RefCell::new(EdgeInner {
                key,
                view,
                scheduler,
                settle_ms,
                latest_source: None,
                latest_target: None,
                alive: true,
                subscriptions: Vec::new(),
                on_destroy: Some(Box::new(on_destroy)),
            })),
        };

        let subscriptions = vec![
            edge.watch_position(source, Side::Source),
            edge.watch_position(target, Side::Target),
            edge.watch_completion(source),
            edge.watch_completion(target),
        ];
        edge.inner.borrow_mut().subscriptions = subscriptions;
        edge
    }

    fn watch_position(&self, stream: &Signal<Vector>, side: Side) -> Subscription {
        let weak = Rc::downgrade(&self.inner);
        stream.subscribe(move |position| {
            if let Some(inner) = weak.upgrade() {
                Self::update(&inner, side, *position);
            }
        })
    }

    fn watch_completion(&self, stream: &Signal<Vector>) -> Subscription {
        let weak: Weak<RefCell<EdgeInner>> = Rc::downgrade(&self.inner);
        stream.on_complete(move || {
            if let Some(inner) = weak.upgrade() {
                EdgeEntity { inner }.dispose();
            }
        })
    }

    /// Combine-latest recompute: geometry always derives from the freshest
    /// known pair, never a stale half-pair.
    fn update(inner: &Rc<RefCell<EdgeInner>>, side: Side, position: Vector) {
        let mut inner = inner.borrow_mut();
        if !inner.alive {
            return;
        }
        match side {
            Side::Source => inner.latest_source = Some(position),
            Side::Target => inner.latest_target = Some(position),
        }
        if let (Some(source), Some(target)) = (inner.latest_source, inner.latest_target) {
            let geometry = EdgeGeometry {
                origin: source,
                length: source.distance_to(target),
                angle: source.angle_to(target),
            };
            let scene = inner.view.scene();
            let element = inner.view.element();
            scene.borrow_mut().set_edge_geometry(element, geometry);
        }
    }

    /// The canonical direction recorded at creation.
    pub fn key(&self) -> EdgeKey {
        self.inner.borrow().key.clone()
    }

    pub fn element(&self) -> ElementId {
        self.inner.borrow().view.element()
    }

    /// Whether the edge is still part of the scene.
    pub fn is_alive(&self) -> bool {
        self.inner.borrow().alive
    }

    /// Spawn a transient packet marker traveling source to target (or the
    /// reverse) over `duration_ms`. The marker is inserted inert and flipped
    /// to animating one settle delay later, so a renderer applies initial
    /// layout before the transition starts; it is removed after
    /// `2 * settle + duration`. Concurrent pulses are independent.
    pub fn ping(&self, reversed: bool, duration_ms: u64) {
        let (scene, element, scheduler, settle_ms) = {
            let inner = self.inner.borrow();
            assert!(inner.alive, "ping on a destroyed edge");
            (
                inner.view.scene(),
                inner.view.element(),
                inner.scheduler.clone(),
                inner.settle_ms,
            )
        };

        let packet = scene
            .borrow_mut()
            .create_packet(element, reversed, duration_ms);

        let activate_scene = scene.clone();
        scheduler.schedule(settle_ms, move || {
            activate_scene.borrow_mut().start_packet(packet);
        });
        scheduler.schedule(2 * settle_ms + duration_ms, move || {
            scene.borrow_mut().remove(packet);
        });
    }

    /// Tear the edge down: detach the element, release the stream
    /// subscriptions, notify the container. Safe to reach from both endpoint
    /// completions; only the first call does anything.
    pub(crate) fn dispose(&self) {
        let (subscriptions, on_destroy) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.alive {
                return;
            }
            inner.alive = false;
            inner.view.destroy();
            (
                mem::take(&mut inner.subscriptions),
                inner.on_destroy.take(),
            )
        };
        drop(subscriptions);
        if let Some(on_destroy) = on_destroy {
            on_destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;
    use std::cell::Cell;

    fn fixture() -> (
        Rc<RefCell<MemoryScene>>,
        Scheduler,
        Signal<Vector>,
        Signal<Vector>,
        EdgeEntity,
        Rc<Cell<bool>>,
    ) {
        let scene = MemoryScene::new().into_handle();
        let scheduler = Scheduler::new();
        let source = Signal::new();
        let target = Signal::new();
        let destroyed = Rc::new(Cell::new(false));
        let destroyed2 = Rc::clone(&destroyed);
        let edge = EdgeEntity::connect(
            EdgeKey::new("a".into(), "b".into()),
            &source,
            &target,
            scene.clone(),
            scheduler.clone(),
            100,
            move || destroyed2.set(true),
        );
        (scene, scheduler, source, target, edge, destroyed)
    }

    #[test]
    fn test_geometry_tracks_both_streams() {
        let (scene, _scheduler, source, target, edge, _destroyed) = fixture();

        // half a pair: no geometry yet
        source.emit(Vector::origin());
        assert!(scene.borrow().element(edge.element()).unwrap().geometry.is_none());

        target.emit(Vector::new(30.0, 40.0));
        let geometry = scene
            .borrow()
            .element(edge.element())
            .unwrap()
            .geometry
            .unwrap();
        assert_eq!(geometry.origin, Vector::origin());
        assert_eq!(geometry.length, 50.0);

        // a later source move recombines with the latest target
        source.emit(Vector::new(30.0, 0.0));
        let geometry = scene
            .borrow()
            .element(edge.element())
            .unwrap()
            .geometry
            .unwrap();
        assert_eq!(geometry.origin, Vector::new(30.0, 0.0));
        assert_eq!(geometry.length, 40.0);
    }

    #[test]
    fn test_completion_of_either_stream_disposes() {
        let (scene, _scheduler, source, _target, edge, destroyed) = fixture();

        source.complete();
        assert!(!edge.is_alive());
        assert!(destroyed.get());
        assert!(scene.borrow().element(edge.element()).is_none());
    }

    #[test]
    fn test_both_streams_completing_disposes_once() {
        let (_scene, _scheduler, source, target, edge, _destroyed) = fixture();

        source.complete();
        target.complete();
        assert!(!edge.is_alive());
    }

    #[test]
    fn test_ping_stages_and_removes_packet() {
        let (scene, scheduler, source, target, edge, _destroyed) = fixture();
        source.emit(Vector::origin());
        target.emit(Vector::new(10.0, 0.0));

        edge.ping(false, 2000);
        assert_eq!(scene.borrow().packets_on(edge.element()), 1);
        assert_eq!(scene.borrow().animating_packets_on(edge.element()), 0);

        // inserted inert, flipped to animating after the settle delay
        scheduler.advance(100);
        assert_eq!(scene.borrow().animating_packets_on(edge.element()), 1);

        scheduler.advance(2000);
        assert_eq!(scene.borrow().packets_on(edge.element()), 1);
        scheduler.advance(100);
        assert_eq!(scene.borrow().packets_on(edge.element()), 0);
    }

    #[test]
    fn test_concurrent_pings_are_independent() {
        let (scene, scheduler, source, target, edge, _destroyed) = fixture();
        source.emit(Vector::origin());
        target.emit(Vector::new(10.0, 0.0));

        edge.ping(false, 2000);
        scheduler.advance(500);
        edge.ping(true, 2000);
        assert_eq!(scene.borrow().packets_on(edge.element()), 2);

        scheduler.advance(1700);
        assert_eq!(scene.borrow().packets_on(edge.element()), 1);
        scheduler.advance(500);
        assert_eq!(scene.borrow().packets_on(edge.element()), 0);
    }

    #[test]
    fn test_pulse_steps_tolerate_edge_removal() {
        let (_scene, scheduler, source, target, edge, _destroyed) = fixture();
        source.emit(Vector::origin());
        target.emit(Vector::new(10.0, 0.0));

        edge.ping(false, 2000);
        source.complete();
        // the scheduled activate/remove steps run against a gone edge
        scheduler.advance(3000);
    }
}
