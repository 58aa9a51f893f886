//! 4x4 matrix in column-major order.

use super::Vector3;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A 4x4 matrix stored in column-major order, laid out the way WGSL
/// `mat4x4<f32>` expects it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Matrix4 {
    /// Matrix elements in column-major order.
    pub elements: [f32; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    /// Identity matrix.
    pub const IDENTITY: Self = Self {
        elements: [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Create from column-major array.
    #[inline]
    pub const fn from_cols_array(elements: [f32; 16]) -> Self {
        Self { elements }
    }

    /// Translation matrix.
    pub fn from_translation(v: &Vector3) -> Self {
        let mut m = Self::IDENTITY;
        m.elements[12] = v.x;
        m.elements[13] = v.y;
        m.elements[14] = v.z;
        m
    }

    /// Rotation around the X axis.
    pub fn from_rotation_x(theta: f32) -> Self {
        let (s, c) = theta.sin_cos();
        Self {
            elements: [
                1.0, 0.0, 0.0, 0.0,
                0.0, c, s, 0.0,
                0.0, -s, c, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Rotation around the Y axis.
    pub fn from_rotation_y(theta: f32) -> Self {
        let (s, c) = theta.sin_cos();
        Self {
            elements: [
                c, 0.0, -s, 0.0,
                0.0, 1.0, 0.0, 0.0,
                s, 0.0, c, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Rotation around the Z axis.
    pub fn from_rotation_z(theta: f32) -> Self {
        let (s, c) = theta.sin_cos();
        Self {
            elements: [
                c, s, 0.0, 0.0,
                -s, c, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// View matrix looking from `eye` toward `target`.
    /// The camera looks down its local -Z axis.
    pub fn look_at(eye: &Vector3, target: &Vector3, up: &Vector3) -> Self {
        let f = (*target - *eye).normalized();
        let r = f.cross(up).normalized();
        let u = r.cross(&f);

        Self {
            elements: [
                r.x, u.x, -f.x, 0.0,
                r.y, u.y, -f.y, 0.0,
                r.z, u.z, -f.z, 0.0,
                -r.dot(eye), -u.dot(eye), f.dot(eye), 1.0,
            ],
        }
    }

    /// Perspective projection with wgpu's 0..1 depth range.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y / 2.0).tan();

        Self {
            elements: [
                f / aspect, 0.0, 0.0, 0.0,
                0.0, f, 0.0, 0.0,
                0.0, 0.0, far / (near - far), -1.0,
                0.0, 0.0, (near * far) / (near - far), 0.0,
            ],
        }
    }

    /// Multiply this matrix by another (`self * other`).
    pub fn multiply(&self, other: &Matrix4) -> Self {
        let a = &self.elements;
        let b = &other.elements;
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum();
            }
        }
        Self { elements: out }
    }

    /// Inverse matrix.
    pub fn inverse(&self) -> Self {
        glam::Mat4::from(*self).inverse().into()
    }

    /// Transform a point (with translation and perspective divide).
    pub fn transform_point(&self, v: &Vector3) -> Vector3 {
        let e = &self.elements;
        let w = 1.0 / (e[3] * v.x + e[7] * v.y + e[11] * v.z + e[15]);
        Vector3 {
            x: (e[0] * v.x + e[4] * v.y + e[8] * v.z + e[12]) * w,
            y: (e[1] * v.x + e[5] * v.y + e[9] * v.z + e[13]) * w,
            z: (e[2] * v.x + e[6] * v.y + e[10] * v.z + e[14]) * w,
        }
    }

    /// Check if approximately equal to another matrix.
    pub fn approx_eq(&self, other: &Matrix4, epsilon: f32) -> bool {
        self.elements
            .iter()
            .zip(other.elements.iter())
            .all(|(a, b)| (a - b).abs() < epsilon)
    }

    /// Column-major 2D array for GPU uniform buffers.
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        let e = &self.elements;
        [
            [e[0], e[1], e[2], e[3]],
            [e[4], e[5], e[6], e[7]],
            [e[8], e[9], e[10], e[11]],
            [e[12], e[13], e[14], e[15]],
        ]
    }
}

impl std::ops::Mul for Matrix4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        self.multiply(&rhs)
    }
}

impl From<glam::Mat4> for Matrix4 {
    fn from(m: glam::Mat4) -> Self {
        Self {
            elements: m.to_cols_array(),
        }
    }
}

impl From<Matrix4> for glam::Mat4 {
    fn from(m: Matrix4) -> Self {
        glam::Mat4::from_cols_array(&m.elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert!(Matrix4::IDENTITY.transform_point(&v).approx_eq(&v, 1e-6));
    }

    #[test]
    fn test_multiply_matches_glam() {
        let a = Matrix4::from_rotation_y(0.4).multiply(&Matrix4::from_translation(&Vector3::new(1.0, 2.0, 3.0)));
        let b: Matrix4 = (glam::Mat4::from_rotation_y(0.4)
            * glam::Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0)))
        .into();
        assert!(a.approx_eq(&b, 1e-5));
    }

    #[test]
    fn test_inverse() {
        let m = Matrix4::from_translation(&Vector3::new(1.0, 2.0, 3.0));
        assert!(m.multiply(&m.inverse()).approx_eq(&Matrix4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_look_at_puts_target_in_front() {
        let view = Matrix4::look_at(&Vector3::new(0.0, 0.0, 10.0), &Vector3::ZERO, &Vector3::UP);
        let p = view.transform_point(&Vector3::ZERO);
        assert!(p.approx_eq(&Vector3::new(0.0, 0.0, -10.0), 1e-5));
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = Matrix4::perspective(1.0, 1.5, 0.1, 100.0);
        let near = proj.transform_point(&Vector3::new(0.0, 0.0, -0.1));
        let far = proj.transform_point(&Vector3::new(0.0, 0.0, -100.0));
        assert!(near.z.abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }
}
