//! Entity base: owner of a single scene element
//!
//! Every entity moves through an explicit lifecycle, `Created -> Attached ->
//! Destroyed`. Mutating a destroyed view, attaching twice, or destroying twice
//! are programming errors and panic immediately: a corrupted scene graph is
//! worse than a hard stop.

use crate::scene::{ElementId, Layer, Scene, SceneHandle};
use crate::value_objects::Vector;

/// Lifecycle state of a view-owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Attached,
    Destroyed,
}

/// Owns one scene element and its lifecycle.
pub struct ViewCore {
    scene: SceneHandle,
    element: ElementId,
    lifecycle: Lifecycle,
    top_left: Vector,
    size: Option<Vector>,
}

impl ViewCore {
    pub(crate) fn new(scene: SceneHandle, element: ElementId) -> Self {
        Self {
            scene,
            element,
            lifecycle: Lifecycle::Created,
            top_left: Vector::origin(),
            size: None,
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub(crate) fn scene(&self) -> SceneHandle {
        self.scene.clone()
    }

    /// Attach the element to a layer and measure its rendered size.
    ///
    /// Panics unless the view is freshly created: an entity attaches at most
    /// once.
    pub fn attach(&mut self, layer: Layer) {
        assert_eq!(
            self.lifecycle,
            Lifecycle::Created,
            "view already attached or destroyed"
        );
        let mut scene = self.scene.borrow_mut();
        scene.attach(self.element, layer);
        self.size = Some(scene.measure(self.element));
        self.lifecycle = Lifecycle::Attached;
    }

    /// Top-left position of the element.
    pub fn top_left(&self) -> Vector {
        self.top_left
    }

    /// Rendered size, measured at attach time.
    pub fn size(&self) -> Vector {
        self.size.expect("view not attached, size unknown")
    }

    /// Move the element by its top-left corner.
    pub fn move_to(&mut self, top_left: Vector) {
        assert_eq!(self.lifecycle, Lifecycle::Attached, "view not attached");
        self.top_left = top_left;
        self.scene.borrow_mut().place(self.element, top_left);
    }

    /// Detach the element from the scene.
    ///
    /// Panics when called a second time.
    pub fn destroy(&mut self) {
        assert_ne!(
            self.lifecycle,
            Lifecycle::Destroyed,
            "view destroyed twice"
        );
        self.scene.borrow_mut().remove(self.element);
        self.lifecycle = Lifecycle::Destroyed;
    }
}
