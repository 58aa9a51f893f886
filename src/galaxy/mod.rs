//! # Galaxy Module
//!
//! Procedural particle fields for the four galaxy layers. Each layer has
//! one parameterized [`PointSampler`]; the typed [`GalaxyConfig`] drives all
//! variation. Generation is deterministic for a given seed.
//!
//! ```
//! use sombrero::galaxy::{GalaxyConfig, LayerKind, generate_layer};
//!
//! let mut config = GalaxyConfig::default();
//! config.disk.particle_count = 1_000;
//! let disk = generate_layer(LayerKind::Disk, &config).unwrap();
//! assert_eq!(disk.len(), 1_000);
//! ```

mod background;
mod bulge;
mod config;
mod disk;
mod dust;
mod field;
mod generator;

pub use background::BackgroundSampler;
pub use bulge::CoreSampler;
pub use config::*;
pub use disk::{arm_index, arm_offset, spiral_angle, DiskSampler};
pub use dust::DustSampler;
pub use field::{LayerKind, ParticleField, ParticlePoint};
pub use generator::{layer_rng, FieldBuilder, LayerRng, PointSampler};

/// Sampler for `kind` configured from `config`.
pub fn sampler_for(kind: LayerKind, config: &GalaxyConfig) -> Box<dyn PointSampler> {
    match kind {
        LayerKind::Core => Box::new(CoreSampler::new(&config.core)),
        LayerKind::Disk => Box::new(DiskSampler::new(&config.disk)),
        LayerKind::Dust => Box::new(DustSampler::new(&config.dust)),
        LayerKind::Background => Box::new(BackgroundSampler::new(&config.background)),
    }
}

/// Validate `config` and start a resumable build of one layer.
pub fn layer_builder(kind: LayerKind, config: &GalaxyConfig) -> Result<FieldBuilder, ConfigError> {
    config.validate()?;
    Ok(FieldBuilder::new(sampler_for(kind, config), layer_rng(config.seed, kind)))
}

/// Validate `config` and generate one layer in full.
pub fn generate_layer(kind: LayerKind, config: &GalaxyConfig) -> Result<ParticleField, ConfigError> {
    Ok(layer_builder(kind, config)?.finish())
}

/// The four generated layers, immutable once built.
#[derive(Debug, Clone)]
pub struct Galaxy {
    fields: Vec<ParticleField>,
}

impl Galaxy {
    /// Validate `config` and generate every layer.
    pub fn generate(config: &GalaxyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let fields = LayerKind::ALL
            .iter()
            .map(|&kind| FieldBuilder::new(sampler_for(kind, config), layer_rng(config.seed, kind)).finish())
            .collect();
        Ok(Self { fields })
    }

    /// Field of one layer.
    pub fn field(&self, kind: LayerKind) -> Option<&ParticleField> {
        self.fields.iter().find(|field| field.kind() == kind)
    }

    /// Fields in draw order.
    pub fn fields(&self) -> &[ParticleField] {
        &self.fields
    }

    /// Total point count across layers.
    pub fn point_count(&self) -> usize {
        self.fields.iter().map(ParticleField::len).sum()
    }
}

/// Generates a whole [`Galaxy`] a bounded number of points at a time.
pub struct GalaxyBuilder {
    pending: Vec<FieldBuilder>,
    done: Vec<ParticleField>,
}

impl GalaxyBuilder {
    /// Validate `config` and queue every layer.
    pub fn new(config: &GalaxyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pending = LayerKind::ALL
            .iter()
            .map(|&kind| FieldBuilder::new(sampler_for(kind, config), layer_rng(config.seed, kind)))
            .collect();
        Ok(Self { pending, done: Vec::new() })
    }

    /// Fraction of all queued points generated so far.
    pub fn progress(&self) -> f32 {
        let layers = LayerKind::ALL.len() as f32;
        let pending: f32 = self.pending.iter().map(|b| 1.0 - b.progress()).sum();
        1.0 - pending / layers
    }

    /// Generate up to `budget` points across the queued layers.
    /// Yields the galaxy exactly once, on the step that completes it.
    pub fn step(&mut self, mut budget: usize) -> Option<Galaxy> {
        while !self.pending.is_empty() {
            let builder = &mut self.pending[0];
            let before = builder.generated();
            let complete = builder.step(budget);
            budget -= builder.generated() - before;
            if !complete {
                break;
            }
            let finished = self.pending.remove(0);
            self.done.push(finished.finish());
        }

        if self.pending.is_empty() && !self.done.is_empty() {
            Some(Galaxy { fields: std::mem::take(&mut self.done) })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> GalaxyConfig {
        let mut config = GalaxyConfig::default();
        config.core.particle_count = 500;
        config.disk.particle_count = 800;
        config.dust.particle_count = 700;
        config.background.star_count = 300;
        config
    }

    #[test]
    fn test_generate_every_layer() {
        let galaxy = Galaxy::generate(&small_config()).unwrap();
        assert_eq!(galaxy.point_count(), 2_300);
        assert_eq!(galaxy.field(LayerKind::Disk).map(ParticleField::len), Some(800));
        assert_eq!(galaxy.fields()[0].kind(), LayerKind::Background);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = small_config();
        config.background.radius_min = -10.0;
        assert!(matches!(Galaxy::generate(&config), Err(ConfigError::Negative { .. })));
        assert!(generate_layer(LayerKind::Core, &config).is_err());
    }

    #[test]
    fn test_generation_does_not_touch_config() {
        let config = small_config();
        let before = config.clone();
        Galaxy::generate(&config).unwrap();
        assert_eq!(config, before);
    }

    #[test]
    fn test_chunked_galaxy_matches_one_shot() {
        let config = small_config();
        let one_shot = Galaxy::generate(&config).unwrap();

        let mut builder = GalaxyBuilder::new(&config).unwrap();
        let mut ticks = 0;
        let chunked = loop {
            ticks += 1;
            if let Some(galaxy) = builder.step(250) {
                break galaxy;
            }
        };
        assert!(ticks > 1);
        for (a, b) in one_shot.fields().iter().zip(chunked.fields()) {
            assert_eq!(a.kind(), b.kind());
            assert_eq!(a.to_bytes(), b.to_bytes());
        }
    }

    #[test]
    fn test_same_seed_same_bytes() {
        let a = generate_layer(LayerKind::Core, &small_config()).unwrap();
        let b = generate_layer(LayerKind::Core, &small_config()).unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());
    }
}
