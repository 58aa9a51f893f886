//! Disk layer: logarithmic spiral arms with differential rotation.

use super::config::DiskConfig;
use super::field::{LayerKind, ParticlePoint};
use super::generator::{sample_twinkle, LayerRng, PointSampler};
use crate::math::consts::{PI, TWO_PI};
use crate::math::{Color, Vector3};
use rand::Rng;

/// Arm assigned to point `index`.
#[inline]
pub fn arm_index(index: usize, arm_count: usize) -> usize {
    index % arm_count
}

/// Fixed angular offset of arm `arm`; arms are spaced `2π / arm_count` apart.
#[inline]
pub fn arm_offset(arm: usize, arm_count: usize) -> f32 {
    arm as f32 * TWO_PI / arm_count as f32
}

/// Angle of the log spiral at radius `r`, before the arm offset.
pub fn spiral_angle(config: &DiskConfig, r: f32) -> f32 {
    let unwound = (r - config.min_arm_radius() + 1.0).max(0.1);
    (unwound / (config.arm_length * config.log_scale) + 1.0).ln() / config.tightness
}

/// Sampler for the spiral disk.
#[derive(Debug, Clone)]
pub struct DiskSampler {
    config: DiskConfig,
}

impl DiskSampler {
    /// Create a sampler reading `config`.
    pub fn new(config: &DiskConfig) -> Self {
        Self { config: config.clone() }
    }

    fn color(&self, rng: &mut LayerRng) -> Color {
        let c = &self.config;
        let base = match rng.gen_range(0..3) {
            0 => c.color1,
            1 => c.color2,
            _ => c.color3,
        };

        let mut color = base.offset_hsl(
            (rng.gen::<f32>() - 0.5) * c.hue_jitter,
            0.0,
            (rng.gen::<f32>() - 0.5) * c.lightness_jitter,
        );

        let accent = rng.gen::<f32>();
        if accent < c.accent_fraction {
            color = color.lerp(&c.accent_warm, 0.3 + rng.gen::<f32>() * 0.3);
        } else if accent < 2.0 * c.accent_fraction {
            color = color.lerp(&c.accent_cool, 0.3 + rng.gen::<f32>() * 0.3);
        }

        color.lerp(&Color::WHITE, rng.gen::<f32>() * c.white_mix).clamp()
    }
}

impl PointSampler for DiskSampler {
    fn kind(&self) -> LayerKind {
        LayerKind::Disk
    }

    fn count(&self) -> usize {
        self.config.particle_count
    }

    fn sample(&self, index: usize, rng: &mut LayerRng) -> ParticlePoint {
        let c = &self.config;
        let arm = arm_index(index, c.arm_count);
        let min_r = c.min_arm_radius();

        // Normalized position along the arm, 0 at the root.
        let along = rng.gen::<f32>().powf(c.radial_exponent);
        let r = min_r + along * (c.arm_length - min_r);

        let spread = c.arm_spread * (1.0 - along.powf(c.spread_falloff));
        let jitter = (rng.gen::<f32>() - 0.5) * spread * (PI / c.arm_count as f32) * 0.7;
        let theta = spiral_angle(c, r) + arm_offset(arm, c.arm_count) + jitter;

        let thinning = 1.0 - (r / c.arm_length).powf(c.thickness_falloff);
        let y = (rng.gen::<f32>() - 0.5) * c.thickness * thinning.max(0.0);

        let color = self.color(rng);

        let size = if rng.gen::<f32>() < c.large_fraction {
            c.size * 2.5 * (1.1 + rng.gen::<f32>() * 0.7)
        } else {
            c.size * (0.5 + rng.gen::<f32>() * 0.9)
        };

        let rotation_speed =
            (c.rotation_inner - r / c.arm_length * c.rotation_falloff) * (0.6 + rng.gen::<f32>() * 0.7);
        let twinkle_speed = sample_twinkle(rng, &c.twinkle);

        ParticlePoint {
            position: Vector3::new(theta.cos() * r, y, theta.sin() * r),
            color,
            size,
            rotation_speed,
            distance: r,
            twinkle_speed,
            fade: 1.0,
            seed: rng.gen(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::generator::{layer_rng, FieldBuilder};
    use crate::galaxy::ParticleField;

    fn build(config: &DiskConfig, seed: u64) -> ParticleField {
        FieldBuilder::new(Box::new(DiskSampler::new(config)), layer_rng(seed, LayerKind::Disk)).finish()
    }

    fn small() -> DiskConfig {
        DiskConfig { particle_count: 4_000, ..DiskConfig::default() }
    }

    #[test]
    fn test_exact_count() {
        let field = build(&small(), 1);
        assert_eq!(field.len(), 4_000);
        assert_eq!(field.rotation_speeds().len(), 4_000);
    }

    #[test]
    fn test_arm_assignment_and_spacing() {
        for i in 0..16 {
            assert_eq!(arm_index(i, 4), i % 4);
        }
        for arm in 0..4 {
            let gap = arm_offset(arm + 1, 4) - arm_offset(arm, 4);
            assert!((gap - TWO_PI / 4.0).abs() < 1e-6);
        }
        assert!((arm_offset(4, 4) - TWO_PI).abs() < 1e-5);
    }

    #[test]
    fn test_points_sit_on_their_arm_without_spread() {
        let config = DiskConfig { arm_spread: 0.0, ..small() };
        let field = build(&config, 2);
        for (i, point) in field.iter().enumerate().take(400) {
            let expected = spiral_angle(&config, point.distance) + arm_offset(arm_index(i, 4), 4);
            let actual = point.position.z.atan2(point.position.x);
            let delta = (actual - expected).rem_euclid(TWO_PI);
            assert!(delta < 1e-3 || TWO_PI - delta < 1e-3, "point {} off its arm by {}", i, delta);
        }
    }

    #[test]
    fn test_radii_within_arms() {
        let config = small();
        let min_r = config.min_arm_radius();
        for point in build(&config, 3).iter() {
            assert!(point.distance >= min_r - 1e-4 && point.distance <= config.arm_length + 1e-4);
            assert!((point.position.horizontal_length() - point.distance).abs() < 1e-3);
            assert!(point.position.y.abs() <= config.thickness / 2.0 + 1e-4);
        }
    }

    #[test]
    fn test_disk_thins_outward() {
        let config = small();
        let field = build(&config, 4);
        let max_height = |lo: f32, hi: f32| {
            field
                .iter()
                .filter(|p| p.distance >= lo && p.distance < hi)
                .map(|p| p.position.y.abs())
                .fold(0.0f32, f32::max)
        };
        assert!(max_height(130.0, 140.0) < max_height(35.0, 60.0));
    }

    #[test]
    fn test_inner_rotates_faster() {
        let config = small();
        let field = build(&config, 5);
        let mean = |lo: f32, hi: f32| {
            let picked: Vec<f32> = field
                .iter()
                .filter(|p| p.distance >= lo && p.distance < hi)
                .map(|p| p.rotation_speed)
                .collect();
            picked.iter().sum::<f32>() / picked.len() as f32
        };
        assert!(mean(35.0, 60.0) > mean(110.0, 140.0));
        assert!(field.rotation_speeds().iter().all(|&r| r > 0.0));
    }

    #[test]
    fn test_colors_in_unit_range() {
        for &channel in build(&small(), 6).colors() {
            assert!(channel.is_finite() && (0.0..=1.0).contains(&channel));
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(build(&small(), 9).to_bytes(), build(&small(), 9).to_bytes());
    }
}
