//! Axis-aligned bounding box
//!
//! Derived from two corner points and never mutated in place. The circle
//! intersection test is what lets a marquee select a node whose center lies
//! outside the box but whose bounding circle still grazes it.

use serde::{Deserialize, Serialize};

use super::Vector;

/// An axis-aligned rectangle with non-negative size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub position: Vector,
    pub size: Vector,
}

impl Rect {
    /// Create a rectangle from a top-left position and a size.
    ///
    /// Panics when either size component is negative.
    pub fn new(position: Vector, size: Vector) -> Self {
        assert!(
            size.x >= 0.0 && size.y >= 0.0,
            "rect size must be non-negative, got {size}"
        );
        Self { position, size }
    }

    /// The minimal rectangle containing both corner points, regardless of
    /// which corner comes first. This makes marquee selection direction
    /// independent.
    pub fn bbox_of(first: Vector, second: Vector) -> Self {
        let position = first.min(second);
        let size = first.max(second).minus(position);
        Self { position, size }
    }

    /// A degenerate zero-size rectangle at a point, the initial frame of a
    /// drag before any movement has been observed.
    pub fn empty(position: Vector) -> Self {
        Self {
            position,
            size: Vector::origin(),
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn width(&self) -> f64 {
        self.size.x
    }

    pub fn height(&self) -> f64 {
        self.size.y
    }

    pub fn right(&self) -> f64 {
        self.position.x + self.size.x
    }

    pub fn bottom(&self) -> f64 {
        self.position.y + self.size.y
    }

    /// The center point of the rectangle.
    pub fn center(&self) -> Vector {
        self.position.plus(self.size.scaled(0.5))
    }

    /// Inclusive bounds test.
    pub fn contains(&self, point: Vector) -> bool {
        self.x() <= point.x
            && point.x <= self.right()
            && self.y() <= point.y
            && point.y <= self.bottom()
    }

    /// Exact separating-axis test of a circle against this box.
    pub fn intersects_circle(&self, center: Vector, radius: f64) -> bool {
        let distance = center.minus(self.center()).abs();
        let half = self.size.scaled(0.5);

        if distance.x > half.x + radius || distance.y > half.y + radius {
            return false;
        }

        if distance.x <= half.x || distance.y <= half.y {
            return true;
        }

        // corner case: squared distance from the nearest box corner
        distance.minus(half).norm_squared() <= radius * radius
    }
}
