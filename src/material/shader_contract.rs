//! Reference math for the particle program.
//!
//! Every constant the WGSL uses is declared here and emitted into the shader
//! header by [`wgsl_constants`], so the CPU functions below and the GPU code
//! cannot drift apart. The functions mirror the vertex and fragment stages
//! one to one and are what the tests exercise.

use crate::math::consts::{PI, TWO_PI};
use crate::math::{smoothstep, Color, Vector3};

/// Angular speed multiplier applied to `time · rotationSpeed`.
pub const ROTATION_RATE: f32 = 0.035;
/// Extra twist per unit of distance from the center.
pub const DISTANCE_TWIST: f32 = 0.00035;
/// Twinkle sinusoid offset.
pub const TWINKLE_BASE: f32 = 0.78;
/// Twinkle sinusoid amplitude.
pub const TWINKLE_AMPLITUDE: f32 = 0.32;
/// Time multiplier inside the twinkle sinusoid.
pub const TWINKLE_RATE: f32 = 0.7;
/// Phase contribution of distance inside the twinkle sinusoid.
pub const TWINKLE_DISTANCE_PHASE: f32 = 0.1;
/// Sprite radius (in uv units) where the falloff starts.
pub const SPRITE_INNER: f32 = 0.3;
/// Sprite radius where alpha reaches zero.
pub const SPRITE_OUTER: f32 = 0.5;
/// Fragments below this alpha are discarded.
pub const ALPHA_CUTOFF: f32 = 0.001;
/// Smallest view depth used in the size division.
pub const MIN_VIEW_DEPTH: f32 = 0.0001;
/// Gradient band from inner to middle color.
pub const GRADIENT_INNER_BAND: (f32, f32) = (0.0, 0.4);
/// Gradient band from middle to outer color.
pub const GRADIENT_OUTER_BAND: (f32, f32) = (0.4, 0.8);

/// WGSL `const` declarations for every shared constant.
pub fn wgsl_constants() -> String {
    let constants = [
        ("PI", PI),
        ("TWO_PI", TWO_PI),
        ("ROTATION_RATE", ROTATION_RATE),
        ("DISTANCE_TWIST", DISTANCE_TWIST),
        ("TWINKLE_BASE", TWINKLE_BASE),
        ("TWINKLE_AMPLITUDE", TWINKLE_AMPLITUDE),
        ("TWINKLE_RATE", TWINKLE_RATE),
        ("TWINKLE_DISTANCE_PHASE", TWINKLE_DISTANCE_PHASE),
        ("SPRITE_INNER", SPRITE_INNER),
        ("SPRITE_OUTER", SPRITE_OUTER),
        ("ALPHA_CUTOFF", ALPHA_CUTOFF),
        ("MIN_VIEW_DEPTH", MIN_VIEW_DEPTH),
        ("GRADIENT_INNER_START", GRADIENT_INNER_BAND.0),
        ("GRADIENT_INNER_END", GRADIENT_INNER_BAND.1),
        ("GRADIENT_OUTER_START", GRADIENT_OUTER_BAND.0),
        ("GRADIENT_OUTER_END", GRADIENT_OUTER_BAND.1),
    ];

    constants
        .iter()
        .map(|(name, value)| format!("const {name}: f32 = {value:?};\n"))
        .collect()
}

/// Rotation angle about the vertical axis at `time`.
#[inline]
pub fn rotation_angle(time: f32, rotation_speed: f32, distance: f32) -> f32 {
    time * rotation_speed * ROTATION_RATE + distance * DISTANCE_TWIST
}

/// World position of a point after differential rotation.
pub fn rotate_point(position: Vector3, time: f32, rotation_speed: f32, distance: f32) -> Vector3 {
    position.rotated_about_y(rotation_angle(time, rotation_speed, distance))
}

/// Twinkle multiplier. Exactly 1 for points without twinkle.
pub fn twinkle_factor(time: f32, twinkle_speed: f32, distance: f32) -> f32 {
    if twinkle_speed == 0.0 {
        return 1.0;
    }
    TWINKLE_BASE
        + TWINKLE_AMPLITUDE * (time * twinkle_speed * TWINKLE_RATE + distance * TWINKLE_DISTANCE_PHASE).sin()
}

/// Seed-decorrelated shimmer multiplier. Static points (distance 0) never shimmer.
pub fn shimmer_factor(time: f32, seed: f32, distance: f32, amplitude: f32) -> f32 {
    if amplitude <= 0.0 || distance <= 0.0 {
        return 1.0;
    }
    1.0 + amplitude * (time * PI + seed * TWO_PI).sin()
}

/// Screen-space sprite diameter in pixels for a point at view-space `view_z`.
///
/// `view_z` is negative in front of the camera.
pub fn point_size(size: f32, base_size: f32, perspective_scale: f32, view_z: f32) -> f32 {
    size * base_size * perspective_scale / (-view_z).max(MIN_VIEW_DEPTH)
}

/// Soft disc alpha at `dist` from the sprite center, in uv units.
/// Returns `None` where the fragment is discarded.
pub fn sprite_alpha(dist: f32) -> Option<f32> {
    let alpha = 1.0 - smoothstep(SPRITE_INNER, SPRITE_OUTER, dist);
    (alpha >= ALPHA_CUTOFF).then_some(alpha)
}

/// Three-stop temperature gradient blended over `color` by normalized distance.
pub fn gradient_color(
    color: Color,
    distance: f32,
    max_distance: f32,
    stops: [Color; 3],
    strength: f32,
) -> Color {
    if max_distance <= 0.0 {
        return color;
    }
    let t = (distance / max_distance).clamp(0.0, 1.0);
    let inner = stops[0].lerp(&stops[1], smoothstep(GRADIENT_INNER_BAND.0, GRADIENT_INNER_BAND.1, t));
    let graded = inner.lerp(&stops[2], smoothstep(GRADIENT_OUTER_BAND.0, GRADIENT_OUTER_BAND.1, t));
    color.lerp(&graded, strength)
}

/// Premultiplied fragment output `[r, g, b, a]`.
///
/// Each channel is `color · alpha · opacity · twinkle · fade`; the alpha
/// channel carries the same factor so both blend modes composite correctly.
pub fn fragment_output(color: Color, alpha: f32, opacity: f32, twinkle: f32, fade: f32) -> [f32; 4] {
    let factor = alpha * opacity * twinkle * fade;
    [color.r * factor, color.g * factor, color.b * factor, factor]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgsl_constants_are_declarations() {
        let header = wgsl_constants();
        assert!(header.contains("const ROTATION_RATE: f32 = 0.035;"));
        assert!(header.contains("const DISTANCE_TWIST: f32 = 0.00035;"));
        assert!(header.contains("const SPRITE_OUTER: f32 = 0.5;"));
        assert!(header.lines().all(|line| line.starts_with("const ") && line.ends_with(';')));
    }

    #[test]
    fn test_rotation_is_static_at_time_zero_without_distance() {
        let p = Vector3::new(10.0, 2.0, -4.0);
        assert!(rotate_point(p, 0.0, 1.0, 0.0).approx_eq(&p, 1e-6));
    }

    #[test]
    fn test_rotation_preserves_radius_and_height() {
        let p = Vector3::new(30.0, 1.5, 40.0);
        let rotated = rotate_point(p, 12.0, 0.8, 50.0);
        assert!((rotated.horizontal_length() - 50.0).abs() < 1e-3);
        assert_eq!(rotated.y, 1.5);
    }

    #[test]
    fn test_rotation_angle_grows_linearly() {
        let a = rotation_angle(10.0, 0.5, 0.0);
        let b = rotation_angle(20.0, 0.5, 0.0);
        assert!((b - 2.0 * a).abs() < 1e-6);
        assert!((rotation_angle(0.0, 0.0, 100.0) - 0.035).abs() < 1e-6);
    }

    #[test]
    fn test_twinkle_neutral_and_bounded() {
        assert_eq!(twinkle_factor(3.0, 0.0, 20.0), 1.0);
        for i in 0..200 {
            let t = i as f32 * 0.37;
            let f = twinkle_factor(t, -1.3, 40.0);
            assert!(f >= TWINKLE_BASE - TWINKLE_AMPLITUDE - 1e-5);
            assert!(f <= TWINKLE_BASE + TWINKLE_AMPLITUDE + 1e-5);
        }
    }

    #[test]
    fn test_shimmer_only_for_moving_points() {
        assert_eq!(shimmer_factor(1.0, 0.3, 0.0, 0.1), 1.0);
        assert_eq!(shimmer_factor(1.0, 0.3, 5.0, 0.0), 1.0);
        let f = shimmer_factor(0.5, 0.0, 5.0, 0.1);
        assert!((f - 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_point_size_perspective_falloff() {
        let near = point_size(0.3, 1.5, 380.0, -50.0);
        let far = point_size(0.3, 1.5, 380.0, -100.0);
        assert!((near - 3.42).abs() < 1e-4);
        assert!((near / far - 2.0).abs() < 1e-5);
        assert!(point_size(1.0, 1.0, 1.0, 0.0).is_finite());
    }

    #[test]
    fn test_sprite_alpha_profile() {
        assert_eq!(sprite_alpha(0.0), Some(1.0));
        assert_eq!(sprite_alpha(0.3), Some(1.0));
        let mid = sprite_alpha(0.4).unwrap();
        assert!(mid > 0.0 && mid < 1.0);
        assert_eq!(sprite_alpha(0.5), None);
        assert_eq!(sprite_alpha(0.7), None);
    }

    #[test]
    fn test_gradient_bands() {
        let stops = [Color::new(1.0, 0.0, 0.0), Color::new(0.0, 1.0, 0.0), Color::new(0.0, 0.0, 1.0)];
        let base = Color::WHITE;
        assert!(gradient_color(base, 0.0, 100.0, stops, 1.0).approx_eq(&stops[0], 1e-6));
        assert!(gradient_color(base, 40.0, 100.0, stops, 1.0).approx_eq(&stops[1], 1e-6));
        assert!(gradient_color(base, 100.0, 100.0, stops, 1.0).approx_eq(&stops[2], 1e-6));
        assert!(gradient_color(base, 50.0, 100.0, stops, 0.0).approx_eq(&base, 1e-6));
        assert!(gradient_color(base, 50.0, 0.0, stops, 1.0).approx_eq(&base, 1e-6));
    }

    #[test]
    fn test_fragment_output_is_premultiplied() {
        let out = fragment_output(Color::new(1.0, 0.5, 0.25), 0.5, 0.8, 1.0, 0.5);
        assert!((out[3] - 0.2).abs() < 1e-6);
        assert!((out[0] - 0.2).abs() < 1e-6);
        assert!((out[1] - 0.1).abs() < 1e-6);
        assert!((out[2] - 0.05).abs() < 1e-6);
        assert_eq!(fragment_output(Color::WHITE, 1.0, 1.0, 1.0, 0.0), [0.0; 4]);
    }
}
