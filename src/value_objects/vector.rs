//! 2D point/vector value type
//!
//! Immutable value compared by components. Serializes as an `[x, y]` pair to
//! match the persisted state layout; deserialization also accepts `{x, y}` and
//! DOM-style `{left, top}` objects so older stored blobs keep loading.

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GraphError;

/// A 2D vector with `f64` components.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    /// Create a new vector.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Strict constructor that rejects non-finite components.
    pub fn finite(x: f64, y: f64) -> Result<Self, GraphError> {
        if x.is_finite() && y.is_finite() {
            Ok(Self { x, y })
        } else {
            Err(GraphError::NonFiniteVector { x, y })
        }
    }

    /// The zero vector.
    pub fn origin() -> Self {
        Self::default()
    }

    /// Construct from polar coordinates.
    pub fn polar(angle: f64, radius: f64) -> Self {
        Self::new(angle.cos() * radius, angle.sin() * radius)
    }

    /// A unit vector with a uniformly random direction.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::polar(rng.gen::<f64>() * std::f64::consts::TAU, 1.0)
    }

    /// Component-wise sum.
    pub fn plus(&self, other: Vector) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// Component-wise difference.
    pub fn minus(&self, other: Vector) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Dot product.
    pub fn dot(&self, other: Vector) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Scale both components by a factor.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Vector) -> f64 {
        other.minus(*self).norm()
    }

    /// Signed angle in radians from this point towards another, via atan2 of
    /// the delta. Directional: `a.angle_to(b) != b.angle_to(a)` in general.
    pub fn angle_to(&self, other: Vector) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Euclidean length.
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Squared length.
    pub fn norm_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    pub fn normalized(&self) -> Option<Vector> {
        let norm = self.norm();
        if norm > 0.0 {
            Some(self.scaled(1.0 / norm))
        } else {
            None
        }
    }

    /// Component-wise absolute value.
    pub fn abs(&self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Component-wise minimum.
    pub fn min(&self, other: Vector) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum.
    pub fn max(&self, other: Vector) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }
}

impl std::ops::Add for Vector {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.plus(other)
    }
}

impl std::ops::Sub for Vector {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.minus(other)
    }
}

impl std::ops::Mul<f64> for Vector {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        self.scaled(factor)
    }
}

impl From<(f64, f64)> for Vector {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Vector {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Serialize for Vector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.x, self.y].serialize(serializer)
    }
}

/// Accepted point-like shapes, in order of preference.
#[derive(Deserialize)]
#[serde(untagged)]
enum PointLike {
    Pair([f64; 2]),
    Xy { x: f64, y: f64 },
    LeftTop { left: f64, top: f64 },
}

impl<'de> Deserialize<'de> for Vector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let point = PointLike::deserialize(deserializer).map_err(|_| {
            serde::de::Error::custom("expected [x, y], {x, y} or {left, top}")
        })?;
        Ok(match point {
            PointLike::Pair([x, y]) => Vector::new(x, y),
            PointLike::Xy { x, y } => Vector::new(x, y),
            PointLike::LeftTop { left, top } => Vector::new(left, top),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Vector::new(1.0, 2.0);
        let b = Vector::new(3.0, -1.0);

        assert_eq!(a.plus(b), Vector::new(4.0, 1.0));
        assert_eq!(a.minus(b), Vector::new(-2.0, 3.0));
        assert_eq!(a + b, a.plus(b));
        assert_eq!(a - b, a.minus(b));
        assert_eq!(a.dot(b), 1.0);
        assert_eq!(a.scaled(2.0), Vector::new(2.0, 4.0));
        assert_eq!(Vector::new(-3.0, 4.0).abs(), Vector::new(3.0, 4.0));
    }

    #[test]
    fn test_distance_and_norm() {
        let a = Vector::origin();
        let b = Vector::new(3.0, 4.0);

        assert_eq!(a.distance_to(b), 5.0);
        assert_eq!(b.norm(), 5.0);
        assert_eq!(b.norm_squared(), 25.0);
    }

    #[test]
    fn test_angle_is_directional() {
        let a = Vector::origin();
        let b = Vector::new(1.0, 1.0);

        let forward = a.angle_to(b);
        let backward = b.angle_to(a);
        assert!((forward - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert!((forward - backward).abs() > 1.0);
    }

    #[test]
    fn test_normalized_guards_zero() {
        assert!(Vector::origin().normalized().is_none());

        let unit = Vector::new(0.0, 2.0).normalized().unwrap();
        assert!((unit.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_polar_and_random() {
        let v = Vector::polar(std::f64::consts::FRAC_PI_2, 2.0);
        assert!(v.x.abs() < 1e-12);
        assert!((v.y - 2.0).abs() < 1e-12);

        let mut rng = rand::thread_rng();
        let r = Vector::random(&mut rng);
        assert!((r.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_finite_rejects_nan() {
        assert!(Vector::finite(1.0, 2.0).is_ok());
        assert!(Vector::finite(f64::NAN, 2.0).is_err());
        assert!(Vector::finite(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_serializes_as_pair() {
        let json = serde_json::to_string(&Vector::new(10.0, 20.0)).unwrap();
        assert_eq!(json, "[10.0,20.0]");
    }

    #[test]
    fn test_deserializes_point_like_shapes() {
        let pair: Vector = serde_json::from_str("[1.0, 2.0]").unwrap();
        let xy: Vector = serde_json::from_str(r#"{"x": 1.0, "y": 2.0}"#).unwrap();
        let dom: Vector = serde_json::from_str(r#"{"left": 1.0, "top": 2.0}"#).unwrap();

        assert_eq!(pair, Vector::new(1.0, 2.0));
        assert_eq!(xy, pair);
        assert_eq!(dom, pair);

        // a single coordinate is ambiguous and must be rejected
        assert!(serde_json::from_str::<Vector>(r#"{"x": 1.0}"#).is_err());
    }
}
