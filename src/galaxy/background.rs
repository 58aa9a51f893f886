//! Background layer: a static shell of distant stars.

use super::config::BackgroundConfig;
use super::field::{LayerKind, ParticlePoint};
use super::generator::{sample_twinkle, sphere_point, LayerRng, PointSampler};
use crate::math::Color;
use rand::Rng;

/// Sampler for the background starfield.
#[derive(Debug, Clone)]
pub struct BackgroundSampler {
    config: BackgroundConfig,
    total_weight: f32,
}

impl BackgroundSampler {
    /// Create a sampler reading `config`.
    pub fn new(config: &BackgroundConfig) -> Self {
        let total_weight = config.palette.iter().map(|entry| entry.weight.max(0.0)).sum();
        Self { config: config.clone(), total_weight }
    }

    fn pick_color(&self, rng: &mut LayerRng) -> Color {
        let mut roll = rng.gen::<f32>() * self.total_weight;
        for entry in &self.config.palette {
            if roll < entry.weight {
                return entry.color;
            }
            roll -= entry.weight.max(0.0);
        }
        self.config
            .palette
            .iter()
            .rev()
            .find(|entry| entry.weight > 0.0)
            .map_or(Color::WHITE, |entry| entry.color)
    }
}

impl PointSampler for BackgroundSampler {
    fn kind(&self) -> LayerKind {
        LayerKind::Background
    }

    fn count(&self) -> usize {
        self.config.star_count
    }

    fn sample(&self, _index: usize, rng: &mut LayerRng) -> ParticlePoint {
        let c = &self.config;

        let r = c.radius_min + rng.gen::<f32>() * (c.radius_max - c.radius_min);
        let position = sphere_point(rng, r);

        let brightness = c.brightness_min + rng.gen::<f32>() * (c.brightness_max - c.brightness_min);
        let color = self
            .pick_color(rng)
            .offset_hsl((rng.gen::<f32>() - 0.5) * c.hue_jitter, 0.0, 0.0)
            .multiply_scalar(brightness)
            .clamp();

        let size = c.size * (0.4 + rng.gen::<f32>() * 1.2);
        let twinkle_speed = sample_twinkle(rng, &c.twinkle);

        ParticlePoint {
            position,
            color,
            size,
            rotation_speed: 0.0,
            distance: 0.0,
            twinkle_speed,
            fade: 1.0,
            seed: rng.gen(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::config::PaletteEntry;
    use crate::galaxy::generator::{layer_rng, FieldBuilder};
    use crate::galaxy::ParticleField;

    fn build(config: &BackgroundConfig, seed: u64) -> ParticleField {
        FieldBuilder::new(Box::new(BackgroundSampler::new(config)), layer_rng(seed, LayerKind::Background)).finish()
    }

    #[test]
    fn test_shell_bounds() {
        let config = BackgroundConfig::default();
        let field = build(&config, 1);
        assert_eq!(field.len(), config.star_count);
        for point in field.iter() {
            let r = point.position.length();
            assert!(r >= config.radius_min - 1e-2 && r <= config.radius_max + 1e-2);
        }
    }

    #[test]
    fn test_static_attributes() {
        let field = build(&BackgroundConfig::default(), 2);
        assert!(field.rotation_speeds().iter().all(|&r| r == 0.0));
        assert!(field.distances().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_single_palette_entry() {
        let config = BackgroundConfig {
            palette: vec![
                PaletteEntry { color: Color::from_hex(0xFF0000), weight: 0.0 },
                PaletteEntry { color: Color::from_hex(0x0000FF), weight: 1.0 },
            ],
            hue_jitter: 0.0,
            ..BackgroundConfig::default()
        };
        for point in build(&config, 3).iter() {
            assert_eq!(point.color.r, 0.0);
            assert!(point.color.b >= config.brightness_min - 1e-5);
        }
    }

    #[test]
    fn test_brightness_jitter_bounds() {
        let config = BackgroundConfig::default();
        for &channel in build(&config, 4).colors() {
            assert!(channel.is_finite());
            assert!((0.0..=config.brightness_max + 1e-5).contains(&channel));
        }
    }
}
