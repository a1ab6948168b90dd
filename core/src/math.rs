//! Math type aliases and bounding volumes.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// Axis-aligned bounding box.
///
/// A box is never "empty" in the sense of having inverted extents: the
/// smallest box is a single point. Use [`Aabb::at`] to start a box from the
/// first point and [`Aabb::add_point`] to grow it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    /// Degenerate box at the origin.
    fn default() -> Self {
        Self::at(Vec3::zeros())
    }
}

impl Aabb {
    /// Create a box from explicit corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y && min.z <= max.z);
        Self { min, max }
    }

    /// Degenerate box containing exactly `point`.
    pub fn at(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Reset to a degenerate box at `point`.
    pub fn reset(&mut self, point: Vec3) {
        *self = Self::at(point);
    }

    /// Grow the box to contain `point`.
    pub fn add_point(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Grow the box to contain `other`.
    pub fn add_box(&mut self, other: &Aabb) {
        self.add_point(other.min);
        self.add_point(other.max);
    }

    /// Whether `point` lies inside or on the boundary.
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.y >= self.min.y
            && point.z >= self.min.z
            && point.x <= self.max.x
            && point.y <= self.max.y
            && point.z <= self.max.z
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// True when the box has zero volume along every axis.
    pub fn is_point(&self) -> bool {
        self.min == self.max
    }
}
