//! Dust layer: a flattened torus of dark particles.

use super::config::DustConfig;
use super::field::{LayerKind, ParticlePoint};
use super::generator::{LayerRng, PointSampler};
use crate::math::consts::TWO_PI;
use crate::math::Vector3;
use rand::Rng;

/// Sampler for the dust lanes.
#[derive(Debug, Clone)]
pub struct DustSampler {
    config: DustConfig,
}

impl DustSampler {
    /// Create a sampler reading `config`.
    pub fn new(config: &DustConfig) -> Self {
        Self { config: config.clone() }
    }
}

impl PointSampler for DustSampler {
    fn kind(&self) -> LayerKind {
        LayerKind::Dust
    }

    fn count(&self) -> usize {
        self.config.particle_count
    }

    fn sample(&self, _index: usize, rng: &mut LayerRng) -> ParticlePoint {
        let c = &self.config;
        let width = c.radius_max - c.radius_min;

        let ring_radius = c.radius_min + rng.gen::<f32>() * width;
        let ring_angle = rng.gen::<f32>() * TWO_PI;
        let tube_radius = rng.gen::<f32>() * c.thickness / 2.0;
        let tube_angle = rng.gen::<f32>() * TWO_PI;

        let radial = ring_radius + tube_angle.cos() * tube_radius;
        let y = tube_angle.sin() * tube_radius * c.vertical_flatten;
        let position = Vector3::new(ring_angle.cos() * radial, y, ring_angle.sin() * radial);

        let base = if rng.gen::<f32>() < 0.5 { c.color1 } else { c.color2 };
        let color = base.lerp(&c.color1, rng.gen::<f32>() * 0.3).clamp();
        let size = c.size * (0.7 + rng.gen::<f32>() * 0.6);

        let along = if width > 0.0 { (ring_radius - c.radius_min) / width } else { 0.0 };
        let rotation_speed = (0.15 - along * 0.1) * (0.8 + rng.gen::<f32>() * 0.4) * c.rotation_factor;

        ParticlePoint {
            position,
            color,
            size,
            rotation_speed,
            distance: ring_radius,
            twinkle_speed: 0.0,
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

    fn build(config: &DustConfig, seed: u64) -> ParticleField {
        FieldBuilder::new(Box::new(DustSampler::new(config)), layer_rng(seed, LayerKind::Dust)).finish()
    }

    fn small() -> DustConfig {
        DustConfig { particle_count: 5_000, ..DustConfig::default() }
    }

    #[test]
    fn test_exact_count() {
        assert_eq!(build(&small(), 1).len(), 5_000);
    }

    #[test]
    fn test_ring_and_tube_bounds() {
        let config = small();
        let half = config.thickness / 2.0;
        for point in build(&config, 2).iter() {
            assert!(point.distance >= config.radius_min && point.distance <= config.radius_max);
            let horizontal = point.position.horizontal_length();
            assert!(horizontal >= config.radius_min - half - 1e-3);
            assert!(horizontal <= config.radius_max + half + 1e-3);
            assert!(point.position.y.abs() <= half * config.vertical_flatten + 1e-4);
        }
    }

    #[test]
    fn test_no_twinkle() {
        assert!(build(&small(), 3).twinkle_speeds().iter().all(|&t| t == 0.0));
    }

    #[test]
    fn test_degenerate_ring() {
        let config = DustConfig { radius_min: 90.0, radius_max: 90.0, thickness: 0.0, ..small() };
        for point in build(&config, 4).iter() {
            assert!((point.position.horizontal_length() - 90.0).abs() < 1e-3);
            assert!(point.rotation_speed.is_finite());
        }
    }

    #[test]
    fn test_colors_stay_between_dust_tones() {
        let config = small();
        let lo = config.color1.r.min(config.color2.r);
        let hi = config.color1.r.max(config.color2.r);
        for point in build(&config, 5).iter() {
            assert!(point.color.r >= lo - 1e-6 && point.color.r <= hi + 1e-6);
        }
    }
}
