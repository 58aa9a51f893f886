//! Shared generator machinery: random streams, per-point samplers and the
//! resumable field builder.

use super::config::TwinkleConfig;
use super::field::{LayerKind, ParticleField, ParticlePoint};
use crate::math::consts::TWO_PI;
use crate::math::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Random stream driving one layer.
pub type LayerRng = ChaCha8Rng;

/// Seeded stream for `kind`, independent of the other layers' streams.
pub fn layer_rng(seed: u64, kind: LayerKind) -> LayerRng {
    ChaCha8Rng::seed_from_u64(seed ^ kind.salt())
}

/// Produces the points of one layer, one index at a time.
///
/// Samplers hold their own copy of the layer configuration and never
/// mutate it; all variation comes from the random stream.
pub trait PointSampler {
    /// Layer produced by this sampler.
    fn kind(&self) -> LayerKind;

    /// Number of points the layer will contain.
    fn count(&self) -> usize;

    /// Draw point `index` from `rng`.
    fn sample(&self, index: usize, rng: &mut LayerRng) -> ParticlePoint;
}

/// Builds a [`ParticleField`] incrementally so large layers can be spread
/// across several frames.
///
/// Stepping in chunks yields exactly the same buffers as a single
/// [`finish`](Self::finish) call because the random stream is consumed in
/// the same order.
pub struct FieldBuilder {
    sampler: Box<dyn PointSampler>,
    rng: LayerRng,
    field: ParticleField,
    next: usize,
}

impl FieldBuilder {
    /// Start building with the given sampler and stream.
    pub fn new(sampler: Box<dyn PointSampler>, rng: LayerRng) -> Self {
        let field = ParticleField::with_capacity(sampler.kind(), sampler.count());
        Self { sampler, rng, field, next: 0 }
    }

    /// Layer being built.
    pub fn kind(&self) -> LayerKind {
        self.sampler.kind()
    }

    /// Generate up to `budget` more points. Returns `true` once complete.
    pub fn step(&mut self, budget: usize) -> bool {
        let end = self.sampler.count().min(self.next.saturating_add(budget));
        while self.next < end {
            let point = self.sampler.sample(self.next, &mut self.rng);
            self.field.push(&point);
            self.next += 1;
        }
        self.is_complete()
    }

    /// Whether every point has been generated.
    pub fn is_complete(&self) -> bool {
        self.next >= self.sampler.count()
    }

    /// Points generated so far.
    pub fn generated(&self) -> usize {
        self.next
    }

    /// Fraction of points generated so far (1.0 for empty layers).
    pub fn progress(&self) -> f32 {
        match self.sampler.count() {
            0 => 1.0,
            total => self.next as f32 / total as f32,
        }
    }

    /// Generate whatever is left and return the finished field.
    pub fn finish(mut self) -> ParticleField {
        self.step(usize::MAX);
        self.field
    }
}

/// Point on a sphere of radius `r` using `theta = 2πu`, `phi = acos(2v − 1)`.
///
/// Returned as (sin φ cos θ, sin φ sin θ, cos φ) scaled by `r`; the second
/// component is the one the generators treat as vertical.
pub(crate) fn sphere_point(rng: &mut LayerRng, r: f32) -> Vector3 {
    let theta = TWO_PI * rng.gen::<f32>();
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let sin_phi = phi.sin();
    Vector3::new(
        r * sin_phi * theta.cos(),
        r * sin_phi * theta.sin(),
        r * phi.cos(),
    )
}

/// Zero for most points; a signed speed for `config.fraction` of them.
pub(crate) fn sample_twinkle(rng: &mut LayerRng, config: &TwinkleConfig) -> f32 {
    if rng.gen::<f32>() >= config.fraction {
        return 0.0;
    }
    let speed = config.speed_min + rng.gen::<f32>() * (config.speed_max - config.speed_min);
    if rng.gen::<bool>() {
        speed
    } else {
        -speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(usize);

    impl PointSampler for Counter {
        fn kind(&self) -> LayerKind {
            LayerKind::Background
        }

        fn count(&self) -> usize {
            self.0
        }

        fn sample(&self, index: usize, rng: &mut LayerRng) -> ParticlePoint {
            ParticlePoint {
                size: index as f32,
                seed: rng.gen(),
                ..ParticlePoint::default()
            }
        }
    }

    #[test]
    fn test_chunked_matches_one_shot() {
        let one_shot = FieldBuilder::new(Box::new(Counter(1000)), layer_rng(3, LayerKind::Background)).finish();

        let mut chunked = FieldBuilder::new(Box::new(Counter(1000)), layer_rng(3, LayerKind::Background));
        let mut steps = 0;
        while !chunked.step(128) {
            steps += 1;
        }
        assert_eq!(steps, 7);
        assert_eq!(chunked.progress(), 1.0);
        assert_eq!(chunked.finish().to_bytes(), one_shot.to_bytes());
    }

    #[test]
    fn test_empty_layer_is_complete() {
        let builder = FieldBuilder::new(Box::new(Counter(0)), layer_rng(0, LayerKind::Background));
        assert!(builder.is_complete());
        assert!(builder.finish().is_empty());
    }

    #[test]
    fn test_layers_draw_distinct_streams() {
        let a: u64 = layer_rng(1, LayerKind::Core).gen();
        let b: u64 = layer_rng(1, LayerKind::Disk).gen();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sphere_point_radius() {
        let mut rng = layer_rng(9, LayerKind::Core);
        for _ in 0..500 {
            let p = sphere_point(&mut rng, 4.0);
            assert!((p.length() - 4.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_twinkle_fraction() {
        let mut rng = layer_rng(11, LayerKind::Disk);
        let config = TwinkleConfig::default();
        let n = 20_000;
        let twinkling = (0..n).filter(|_| sample_twinkle(&mut rng, &config) != 0.0).count();
        let fraction = twinkling as f32 / n as f32;
        assert!(fraction > 0.10 && fraction < 0.14, "fraction {}", fraction);
    }

    #[test]
    fn test_twinkle_disabled() {
        let mut rng = layer_rng(11, LayerKind::Disk);
        let config = TwinkleConfig::none();
        assert!((0..1000).all(|_| sample_twinkle(&mut rng, &config) == 0.0));
    }
}
