//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the few helpers the render code needs
//! to move matrices into GPU-facing `[f32; 16]` storage.

use nalgebra::{Matrix4, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Column-major copy of a matrix, the layout shaders expect.
pub fn mat4_to_cols(m: &Mat4) -> [[f32; 4]; 4] {
    let mut out = [[0.0; 4]; 4];
    for (col, dst) in out.iter_mut().enumerate() {
        for (row, v) in dst.iter_mut().enumerate() {
            *v = m[(row, col)];
        }
    }
    out
}

/// Flattened column-major copy of a matrix.
pub fn mat4_to_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}
