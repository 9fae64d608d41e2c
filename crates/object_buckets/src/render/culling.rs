//! Visibility tests used by the bucket culling passes

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::bounds::Bounds;

/// Anything that can decide whether a bounding volume is worth drawing
pub trait CullTest {
    /// `true` when `bounds` may be visible
    fn is_visible(&self, bounds: &Bounds) -> bool;
}

impl<F> CullTest for F
where
    F: Fn(&Bounds) -> bool,
{
    fn is_visible(&self, bounds: &Bounds) -> bool {
        self(bounds)
    }
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a plane from `(a, b, c, d)` coefficients, normalizing them
    pub fn from_coefficients(v: Vec4) -> Self {
        let normal = Vec3::new(v.x, v.y, v.z);
        let len = normal.norm();
        if len <= f32::EPSILON {
            return Self { normal: Vec3::zeros(), distance: 0.0 };
        }
        Self { normal: normal / len, distance: v.w / len }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes (left, right, bottom, top, near, far), normals pointing inward
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Gribb-Hartmann extraction for clip-space depth in `[0, 1]`.
    pub fn from_matrix(vp: &Mat4) -> Self {
        let row = |i: usize| vp.row(i).transpose();
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, min: &Vec3, max: &Vec3) -> bool {
        for plane in &self.planes {
            // Corner furthest along the plane normal
            let p = Vec3::new(
                if plane.normal.x >= 0.0 { max.x } else { min.x },
                if plane.normal.y >= 0.0 { max.y } else { min.y },
                if plane.normal.z >= 0.0 { max.z } else { min.z },
            );

            if plane.distance_to_point(&p) < 0.0 {
                return false;
            }
        }
        true
    }
}

impl CullTest for Frustum {
    fn is_visible(&self, bounds: &Bounds) -> bool {
        self.intersects_aabb(&bounds.min, &bounds.max)
    }
}
