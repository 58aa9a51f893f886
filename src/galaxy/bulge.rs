//! Core layer: a flattened, center-weighted spheroid.

use super::config::CoreConfig;
use super::field::{LayerKind, ParticlePoint};
use super::generator::{sample_twinkle, sphere_point, LayerRng, PointSampler};
use crate::math::{lerp, Color};
use rand::Rng;

/// Sampler for the central bulge.
#[derive(Debug, Clone)]
pub struct CoreSampler {
    config: CoreConfig,
}

impl CoreSampler {
    /// Create a sampler reading `config`.
    pub fn new(config: &CoreConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Color and size multiplier for a point at normalized radius `rn`.
    fn band(&self, rn: f32, rng: &mut LayerRng) -> (Color, f32) {
        let c = &self.config;

        if rn < c.hot_radius && rng.gen::<f32>() < c.hot_fraction {
            let color = c.hot_color.multiply_scalar(c.hdr_boost);
            return (color, 2.5 * (0.8 + rng.gen::<f32>() * 0.4));
        }

        if rn < c.bright_radius {
            let t = rn / c.bright_radius.max(f32::EPSILON);
            let color = c.color1
                .lerp(&c.color_bright, 0.5 + rng.gen::<f32>() * 0.5)
                .multiply_scalar(lerp(c.hdr_boost.max(1.0), 1.0, t));
            return (color, 1.5 + rng.gen::<f32>() * 0.7);
        }

        if rn < c.mid_radius {
            let t = (rn - c.bright_radius) / (c.mid_radius - c.bright_radius).max(f32::EPSILON);
            return (c.color_bright.lerp(&c.color1, t), 0.9 + rng.gen::<f32>() * 0.5);
        }

        let t = ((rn - c.mid_radius) / (1.0 - c.mid_radius)).min(1.0);
        (c.color1.lerp(&c.color2, t), 0.6 + rng.gen::<f32>() * 0.4)
    }
}

impl PointSampler for CoreSampler {
    fn kind(&self) -> LayerKind {
        LayerKind::Core
    }

    fn count(&self) -> usize {
        self.config.particle_count
    }

    fn sample(&self, _index: usize, rng: &mut LayerRng) -> ParticlePoint {
        let c = &self.config;

        let r = c.radius * rng.gen::<f32>().powf(c.radial_exponent);
        let mut position = sphere_point(rng, r);
        position.y *= c.vertical_flatten;

        let rn = if c.radius > 0.0 { r / c.radius } else { 0.0 };
        let (mut color, size_scale) = self.band(rn, rng);

        let accent = rng.gen::<f32>();
        if accent < c.accent_fraction {
            color = color.lerp(&c.accent_warm, 0.3 + rng.gen::<f32>() * 0.3);
        } else if accent < 2.0 * c.accent_fraction {
            color = color.lerp(&c.accent_cool, 0.3 + rng.gen::<f32>() * 0.3);
        }

        let size = (c.size * size_scale * (1.0 - 0.5 * rn)).max(c.size * c.min_size_factor);
        let rotation_speed = (rng.gen::<f32>() - 0.5) * c.rotation_jitter + c.rotation_base;
        let twinkle_speed = sample_twinkle(rng, &c.twinkle);

        ParticlePoint {
            position,
            color: color.clamp_to(c.hdr_boost.max(1.0)),
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

    fn build(config: &CoreConfig, seed: u64) -> ParticleField {
        FieldBuilder::new(Box::new(CoreSampler::new(config)), layer_rng(seed, LayerKind::Core)).finish()
    }

    #[test]
    fn test_exact_count() {
        let config = CoreConfig { particle_count: 3_000, ..CoreConfig::default() };
        let field = build(&config, 1);
        assert_eq!(field.len(), 3_000);
        assert_eq!(field.positions().len(), 9_000);
        assert_eq!(field.colors().len(), 9_000);
    }

    #[test]
    fn test_radii_within_bulge() {
        let config = CoreConfig { particle_count: 5_000, ..CoreConfig::default() };
        for point in build(&config, 2).iter() {
            assert!(point.distance >= 0.0 && point.distance <= config.radius);
            assert!(point.position.length() <= config.radius + 1e-3);
            assert!(point.position.y.abs() <= config.radius * config.vertical_flatten + 1e-3);
        }
    }

    #[test]
    fn test_center_weighted() {
        let config = CoreConfig { particle_count: 10_000, ..CoreConfig::default() };
        let field = build(&config, 3);
        let inner = field.distances().iter().filter(|&&d| d < config.radius * 0.5).count();
        // u^2.2 < 0.5 for u < 0.73
        assert!(inner as f32 / field.len() as f32 > 0.65);
    }

    #[test]
    fn test_colors_finite_and_bounded() {
        let config = CoreConfig { particle_count: 5_000, ..CoreConfig::default() };
        for &channel in build(&config, 4).colors() {
            assert!(channel.is_finite());
            assert!((0.0..=config.hdr_boost).contains(&channel));
        }
    }

    #[test]
    fn test_size_floor_and_rotation_band() {
        let config = CoreConfig { particle_count: 5_000, ..CoreConfig::default() };
        let field = build(&config, 5);
        let floor = config.size * config.min_size_factor;
        assert!(field.sizes().iter().all(|&s| s >= floor - 1e-6));
        let half = config.rotation_jitter / 2.0;
        assert!(field
            .rotation_speeds()
            .iter()
            .all(|&r| r >= config.rotation_base - half - 1e-6 && r <= config.rotation_base + half + 1e-6));
    }

    #[test]
    fn test_inner_points_larger_on_average() {
        let config = CoreConfig { particle_count: 20_000, ..CoreConfig::default() };
        let field = build(&config, 6);
        let mean = |pred: &dyn Fn(f32) -> bool| {
            let picked: Vec<f32> = field
                .iter()
                .filter(|p| pred(p.distance / config.radius))
                .map(|p| p.size)
                .collect();
            picked.iter().sum::<f32>() / picked.len() as f32
        };
        assert!(mean(&|rn| rn < 0.2) > mean(&|rn| rn > 0.7));
    }

    #[test]
    fn test_deterministic() {
        let config = CoreConfig { particle_count: 2_000, ..CoreConfig::default() };
        assert_eq!(build(&config, 42).to_bytes(), build(&config, 42).to_bytes());
        assert_ne!(build(&config, 42).to_bytes(), build(&config, 43).to_bytes());
    }

    #[test]
    fn test_fade_neutral() {
        let config = CoreConfig { particle_count: 500, ..CoreConfig::default() };
        assert!(build(&config, 7).fades().iter().all(|&f| f == 1.0));
    }
}
