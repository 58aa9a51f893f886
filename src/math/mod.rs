//! # Math Module
//!
//! Small 3D math kit used by the galaxy generators, the camera rig and the
//! shader uniforms: vectors, column-major matrices, colors, plus the scalar
//! helpers for interpolation, easing and per-tick smoothing.
//!
//! Types convert to and from `glam` so heavier operations (inversion) can
//! lean on it.

mod vector3;
mod matrix4;
mod color;

pub use vector3::Vector3;
pub use matrix4::Matrix4;
pub use color::{hex_color, Color, ColorParseError};

/// Common math constants.
pub mod consts {
    /// Pi constant.
    pub const PI: f32 = std::f32::consts::PI;
    /// Two times Pi.
    pub const TWO_PI: f32 = PI * 2.0;
    /// Half of Pi.
    pub const HALF_PI: f32 = PI / 2.0;
    /// Degrees to radians conversion factor.
    pub const DEG2RAD: f32 = PI / 180.0;
    /// Small epsilon for floating point comparisons.
    pub const EPSILON: f32 = 1e-6;
}

/// Convert degrees to radians.
#[inline]
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * consts::DEG2RAD
}

/// Clamp a value between min and max.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Linear interpolation between two values.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite smooth step between two edges.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Cubic ease-in-out over normalized progress.
///
/// Maps 0 to 0 and 1 to 1 and is monotonic in between. Input outside
/// `[0, 1]` is clamped first.
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = clamp(t, 0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let k = -2.0 * t + 2.0;
        1.0 - k * k * k / 2.0
    }
}

/// One step of exponential smoothing: moves `current` a fraction `rate`
/// of the way to `target`.
///
/// For `rate` in `(0, 1]` the result always lies between `current` and
/// `target`, so repeated steps converge without overshoot.
#[inline]
pub fn damp(current: f32, target: f32, rate: f32) -> f32 {
    current + (target - current) * rate
}
