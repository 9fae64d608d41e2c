//! Axis-aligned bounding volumes
//!
//! A [`Bounds`] keeps the object-space box it was created from and the
//! world-space box produced by the last transform, along with the world
//! center and enclosing radius used by light and group culling.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Object bounds in local and world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner in object space
    pub local_min: Vec3,
    /// Maximum corner in object space
    pub local_max: Vec3,
    /// Minimum corner in world space
    pub min: Vec3,
    /// Maximum corner in world space
    pub max: Vec3,
    /// World-space center
    pub center: Vec3,
    /// Radius of the sphere enclosing the world box
    pub radius: f32,
}

impl Bounds {
    /// Create bounds from object-space corners, untransformed
    pub fn new(min: Vec3, max: Vec3) -> Self {
        let mut b = Self {
            local_min: min,
            local_max: max,
            min,
            max,
            center: Vec3::zeros(),
            radius: 0.0,
        };
        b.update_sphere();
        b
    }

    /// Create bounds centered at a point with given half extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self::new(center - extents, center + extents)
    }

    /// Reassign both spaces to the given world box
    pub fn assign(&mut self, min: Vec3, max: Vec3) {
        *self = Self::new(min, max);
    }

    /// Recompute the world box by transforming the eight local corners
    pub fn set_transform(&mut self, m: &Mat4) {
        let lo = self.local_min;
        let hi = self.local_max;
        let mut min = Vec3::repeat(f32::INFINITY);
        let mut max = Vec3::repeat(f32::NEG_INFINITY);
        for i in 0..8 {
            let corner = Point3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            let p = m.transform_point(&corner).coords;
            min = min.inf(&p);
            max = max.sup(&p);
        }
        self.min = min;
        self.max = max;
        self.update_sphere();
    }

    /// Grow the world box to enclose `other`
    pub fn merge(&mut self, other: &Self) {
        self.assign(self.min.inf(&other.min), self.max.sup(&other.max));
    }

    /// Half size of the world box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this box intersects another in world space
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Check if a sphere touches the world box
    pub fn intersects_sphere(&self, center: &Vec3, radius: f32) -> bool {
        let closest = self.min.sup(&center.inf(&self.max));
        (closest - center).norm_squared() <= radius * radius
    }

    fn update_sphere(&mut self) {
        self.center = (self.min + self.max) * 0.5;
        self.radius = self.extents().norm();
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }
}
