//! Parallel attribute buffers of one galaxy layer.

use crate::math::{Color, Vector3};
use serde::{Deserialize, Serialize};

/// The four layers of the galaxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Central spheroidal bulge.
    Core,
    /// Logarithmic spiral arms.
    Disk,
    /// Dark dust torus.
    Dust,
    /// Static starfield shell.
    Background,
}

impl LayerKind {
    /// All layers in draw order (farthest first).
    pub const ALL: [LayerKind; 4] = [
        LayerKind::Background,
        LayerKind::Disk,
        LayerKind::Dust,
        LayerKind::Core,
    ];

    /// Human-readable name, also used for GPU labels.
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Core => "core",
            LayerKind::Disk => "disk",
            LayerKind::Dust => "dust",
            LayerKind::Background => "background",
        }
    }

    /// Salt mixed into the galaxy seed so layers draw independent streams.
    pub(crate) fn salt(&self) -> u64 {
        match self {
            LayerKind::Core => 0x9E37_79B9_7F4A_7C15,
            LayerKind::Disk => 0xC2B2_AE3D_27D4_EB4F,
            LayerKind::Dust => 0x1656_67B1_9E37_79F9,
            LayerKind::Background => 0x27D4_EB2F_1656_67C5,
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One row across a [`ParticleField`]'s parallel arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticlePoint {
    /// Position in galaxy space.
    pub position: Vector3,
    /// Point color.
    pub color: Color,
    /// Size before the shared base size and perspective scaling.
    pub size: f32,
    /// Rotation speed about the vertical axis.
    pub rotation_speed: f32,
    /// Distance from the galaxy center used for twist and twinkle phase.
    pub distance: f32,
    /// Signed twinkle speed; 0 disables twinkle.
    pub twinkle_speed: f32,
    /// Static opacity multiplier, 0-1.
    pub fade: f32,
    /// Random phase for shimmer, 0-1.
    pub seed: f32,
}

impl Default for ParticlePoint {
    fn default() -> Self {
        Self {
            position: Vector3::ZERO,
            color: Color::WHITE,
            size: 1.0,
            rotation_speed: 0.0,
            distance: 0.0,
            twinkle_speed: 0.0,
            fade: 1.0,
            seed: 0.0,
        }
    }
}

/// Attribute buffers for one layer, generated together.
///
/// Every array holds exactly [`len`](Self::len) entries (three per point for
/// the vector attributes). Fields are only appended through the generator,
/// so no array can be resized on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    kind: LayerKind,
    positions: Vec<f32>,
    colors: Vec<f32>,
    sizes: Vec<f32>,
    rotation_speeds: Vec<f32>,
    distances: Vec<f32>,
    twinkle_speeds: Vec<f32>,
    fades: Vec<f32>,
    seeds: Vec<f32>,
}

impl ParticleField {
    /// Empty field with room for `capacity` points.
    pub(crate) fn with_capacity(kind: LayerKind, capacity: usize) -> Self {
        Self {
            kind,
            positions: Vec::with_capacity(capacity * 3),
            colors: Vec::with_capacity(capacity * 3),
            sizes: Vec::with_capacity(capacity),
            rotation_speeds: Vec::with_capacity(capacity),
            distances: Vec::with_capacity(capacity),
            twinkle_speeds: Vec::with_capacity(capacity),
            fades: Vec::with_capacity(capacity),
            seeds: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, point: &ParticlePoint) {
        self.positions.extend_from_slice(&point.position.to_array());
        self.colors.extend_from_slice(&point.color.to_array());
        self.sizes.push(point.size);
        self.rotation_speeds.push(point.rotation_speed);
        self.distances.push(point.distance);
        self.twinkle_speeds.push(point.twinkle_speed);
        self.fades.push(point.fade);
        self.seeds.push(point.seed);
    }

    /// Layer this field belongs to.
    #[inline]
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Whether the field has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Positions, `xyz` per point.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Colors, `rgb` per point.
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// Per-point sizes.
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// Per-point rotation speeds.
    pub fn rotation_speeds(&self) -> &[f32] {
        &self.rotation_speeds
    }

    /// Per-point distances from the center.
    pub fn distances(&self) -> &[f32] {
        &self.distances
    }

    /// Per-point twinkle speeds.
    pub fn twinkle_speeds(&self) -> &[f32] {
        &self.twinkle_speeds
    }

    /// Per-point fades.
    pub fn fades(&self) -> &[f32] {
        &self.fades
    }

    /// Per-point shimmer seeds.
    pub fn seeds(&self) -> &[f32] {
        &self.seeds
    }

    /// Reassemble the point at `index`.
    pub fn point(&self, index: usize) -> Option<ParticlePoint> {
        if index >= self.len() {
            return None;
        }
        let v = index * 3;
        Some(ParticlePoint {
            position: Vector3::new(self.positions[v], self.positions[v + 1], self.positions[v + 2]),
            color: Color::new(self.colors[v], self.colors[v + 1], self.colors[v + 2]),
            size: self.sizes[index],
            rotation_speed: self.rotation_speeds[index],
            distance: self.distances[index],
            twinkle_speed: self.twinkle_speeds[index],
            fade: self.fades[index],
            seed: self.seeds[index],
        })
    }

    /// Iterate over every point.
    pub fn iter(&self) -> impl Iterator<Item = ParticlePoint> + '_ {
        (0..self.len()).filter_map(move |i| self.point(i))
    }

    /// All arrays packed back to back as native-endian bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        [
            &self.positions,
            &self.colors,
            &self.sizes,
            &self.rotation_speeds,
            &self.distances,
            &self.twinkle_speeds,
            &self.fades,
            &self.seeds,
        ]
        .iter()
        .flat_map(|array| bytemuck::cast_slice::<f32, u8>(array).iter().copied())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_arrays_aligned() {
        let mut field = ParticleField::with_capacity(LayerKind::Dust, 2);
        let point = ParticlePoint {
            position: Vector3::new(1.0, 2.0, 3.0),
            color: Color::new(0.1, 0.2, 0.3),
            size: 0.5,
            seed: 0.25,
            ..ParticlePoint::default()
        };
        field.push(&point);
        field.push(&ParticlePoint::default());

        assert_eq!(field.len(), 2);
        assert_eq!(field.positions().len(), 6);
        assert_eq!(field.colors().len(), 6);
        assert_eq!(field.fades(), &[1.0, 1.0]);
        assert_eq!(field.point(0), Some(point));
        assert_eq!(field.point(2), None);
        assert_eq!(field.to_bytes().len(), 2 * 12 * 4);
    }

    #[test]
    fn test_draw_order_lists_every_layer() {
        for kind in [LayerKind::Core, LayerKind::Disk, LayerKind::Dust, LayerKind::Background] {
            assert!(LayerKind::ALL.contains(&kind));
        }
    }
}
