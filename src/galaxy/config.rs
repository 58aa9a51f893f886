//! Typed galaxy configuration with defaults and validation.
//!
//! Every option has a default reproducing the reference look, so an empty
//! JSON object (`{}`) is a complete configuration.

use crate::math::{hex_color, Color};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};
use thiserror::Error;

/// Errors raised while loading or validating a [`GalaxyConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// JSON could not be parsed (includes negative particle counts).
    #[error("Failed to parse galaxy configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value that must be finite and >= 0 was not.
    #[error("`{field}` must be a finite, non-negative number (got {value})")]
    Negative {
        /// Offending option.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// A value that must be finite and > 0 was not.
    #[error("`{field}` must be a finite, positive number (got {value})")]
    NotPositive {
        /// Offending option.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// A fraction, opacity or normalized threshold outside [0, 1].
    #[error("`{field}` must lie in [0, 1] (got {value})")]
    OutOfUnitRange {
        /// Offending option.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// A smoothing rate outside (0, 1].
    #[error("`{field}` must lie in (0, 1] (got {value})")]
    InvalidRate {
        /// Offending option.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// A `[min, max]` pair with `min > max`.
    #[error("`{field}` range is inverted: min {min} > max {max}")]
    InvertedRange {
        /// Offending option pair.
        field: &'static str,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },

    /// A value that must be finite was NaN or infinite.
    #[error("`{field}` must be finite (got {value})")]
    NotFinite {
        /// Offending option.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// A field of view that leaves the open interval (0, 180) degrees.
    #[error("`{field}` must keep the field of view within (0, 180) degrees (got {value})")]
    FovOutOfRange {
        /// Offending option.
        field: &'static str,
        /// Resulting field of view in degrees.
        value: f32,
    },

    /// The disk needs at least one spiral arm.
    #[error("`disk.arm_count` must be at least 1")]
    NoSpiralArms,

    /// The background palette has no entry with positive weight.
    #[error("`background.palette` needs at least one entry with positive weight")]
    EmptyPalette,
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn fov(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value < 180.0 {
        Ok(())
    } else {
        Err(ConfigError::FovOutOfRange { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}

fn rate(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { field, value })
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { field, min, max })
    }
}

/// Sparse per-point shimmer shared by the twinkling layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwinkleConfig {
    /// Fraction of points that twinkle at all.
    pub fraction: f32,
    /// Slowest twinkle speed (absolute value).
    pub speed_min: f32,
    /// Fastest twinkle speed (absolute value).
    pub speed_max: f32,
    /// Amplitude of the seed-phased shimmer applied to points off-center.
    pub shimmer: f32,
}

impl Default for TwinkleConfig {
    fn default() -> Self {
        Self {
            fraction: 0.12,
            speed_min: 0.7,
            speed_max: 1.9,
            shimmer: 0.1,
        }
    }
}

impl TwinkleConfig {
    /// Twinkle disabled.
    pub fn none() -> Self {
        Self {
            fraction: 0.0,
            shimmer: 0.0,
            ..Self::default()
        }
    }

    fn validate(&self, prefix: &'static str) -> Result<(), ConfigError> {
        unit(prefix, self.fraction)?;
        non_negative(prefix, self.speed_min)?;
        non_negative(prefix, self.speed_max)?;
        ordered(prefix, self.speed_min, self.speed_max)?;
        non_negative(prefix, self.shimmer)
    }
}

/// Optional three-stop color gradient blended by radial distance in the
/// fragment stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadialGradient {
    /// Color at the center.
    #[serde(with = "hex_color")]
    pub inner: Color,
    /// Color at 40% of `max_distance`.
    #[serde(with = "hex_color")]
    pub middle: Color,
    /// Color from 80% of `max_distance` outward.
    #[serde(with = "hex_color")]
    pub outer: Color,
    /// Distance normalizing the blend.
    pub max_distance: f32,
    /// How much of the gradient replaces the point color (0-1).
    pub strength: f32,
}

impl Default for RadialGradient {
    fn default() -> Self {
        Self {
            inner: Color::from_hex(0xB0DCFF),
            middle: Color::from_hex(0xFFB6C1),
            outer: Color::from_hex(0xFFDAB9),
            max_distance: 140.0,
            strength: 0.5,
        }
    }
}

/// Spheroidal bulge at the galaxy center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Number of points.
    pub particle_count: usize,
    /// Outer radius of the bulge.
    pub radius: f32,
    /// Exponent biasing radius samples toward the center.
    pub radial_exponent: f32,
    /// Scale applied to the vertical component.
    pub vertical_flatten: f32,
    /// Brightest band.
    #[serde(with = "hex_color")]
    pub color_bright: Color,
    /// Intermediate band.
    #[serde(with = "hex_color")]
    pub color1: Color,
    /// Outskirts.
    #[serde(with = "hex_color")]
    pub color2: Color,
    /// Tint of the rare hot points near the very center.
    #[serde(with = "hex_color")]
    pub hot_color: Color,
    /// Warm accent tint.
    #[serde(with = "hex_color")]
    pub accent_warm: Color,
    /// Cool accent tint.
    #[serde(with = "hex_color")]
    pub accent_cool: Color,
    /// Chance of each accent tint.
    pub accent_fraction: f32,
    /// Normalized radius below which hot points may appear.
    pub hot_radius: f32,
    /// Chance of a hot point inside `hot_radius`.
    pub hot_fraction: f32,
    /// Normalized radius of the bright band.
    pub bright_radius: f32,
    /// Normalized radius of the intermediate band.
    pub mid_radius: f32,
    /// Brightness multiplier for hot points; also the channel ceiling.
    pub hdr_boost: f32,
    /// Base point size.
    pub size: f32,
    /// Smallest size as a fraction of `size`.
    pub min_size_factor: f32,
    /// Layer opacity.
    pub opacity: f32,
    /// Mean rotation speed.
    pub rotation_base: f32,
    /// Spread of rotation speed around the mean.
    pub rotation_jitter: f32,
    /// Twinkle settings.
    pub twinkle: TwinkleConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            particle_count: 20_000,
            radius: 22.0,
            radial_exponent: 2.2,
            vertical_flatten: 0.5,
            color_bright: Color::from_hex(0xFFFFFF),
            color1: Color::from_hex(0xFFFAE0),
            color2: Color::from_hex(0xFFEBCD),
            hot_color: Color::from_hex(0xE0ECFF),
            accent_warm: Color::from_hex(0xFFD6E0),
            accent_cool: Color::from_hex(0xB0FFEA),
            accent_fraction: 0.08,
            hot_radius: 0.18,
            hot_fraction: 0.15,
            bright_radius: 0.25,
            mid_radius: 0.65,
            hdr_boost: 1.8,
            size: 0.35,
            min_size_factor: 0.15,
            opacity: 0.9,
            rotation_base: 0.025,
            rotation_jitter: 0.07,
            twinkle: TwinkleConfig::default(),
        }
    }
}

impl CoreConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("core.radius", self.radius)?;
        positive("core.radial_exponent", self.radial_exponent)?;
        non_negative("core.vertical_flatten", self.vertical_flatten)?;
        unit("core.accent_fraction", self.accent_fraction)?;
        unit("core.hot_radius", self.hot_radius)?;
        unit("core.hot_fraction", self.hot_fraction)?;
        unit("core.bright_radius", self.bright_radius)?;
        unit("core.mid_radius", self.mid_radius)?;
        ordered("core.bright_radius..mid_radius", self.bright_radius, self.mid_radius)?;
        if self.mid_radius >= 1.0 {
            return Err(ConfigError::OutOfUnitRange { field: "core.mid_radius", value: self.mid_radius });
        }
        positive("core.hdr_boost", self.hdr_boost)?;
        non_negative("core.size", self.size)?;
        unit("core.min_size_factor", self.min_size_factor)?;
        unit("core.opacity", self.opacity)?;
        finite("core.rotation_base", self.rotation_base)?;
        non_negative("core.rotation_jitter", self.rotation_jitter)?;
        self.twinkle.validate("core.twinkle")
    }
}

/// Logarithmic spiral disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    /// Number of points.
    pub particle_count: usize,
    /// Number of spiral arms (`numSpiralArms`).
    pub arm_count: usize,
    /// Spiral tightness; larger values wind less.
    pub tightness: f32,
    /// Angular spread of points around an arm at its root.
    pub arm_spread: f32,
    /// Outer radius of the arms.
    pub arm_length: f32,
    /// Inner arm radius as a fraction of `arm_length`.
    pub inner_radius_factor: f32,
    /// Exponent shaping the radial density.
    pub radial_exponent: f32,
    /// Scale `k` in the log-spiral angle formula.
    pub log_scale: f32,
    /// Exponent controlling how fast spread shrinks outward.
    pub spread_falloff: f32,
    /// Vertical thickness at the center.
    pub thickness: f32,
    /// Exponent controlling how fast the disk thins outward.
    pub thickness_falloff: f32,
    /// First base hue.
    #[serde(with = "hex_color")]
    pub color1: Color,
    /// Second base hue.
    #[serde(with = "hex_color")]
    pub color2: Color,
    /// Third base hue.
    #[serde(with = "hex_color")]
    pub color3: Color,
    /// Warm accent tint.
    #[serde(with = "hex_color")]
    pub accent_warm: Color,
    /// Cool accent tint.
    #[serde(with = "hex_color")]
    pub accent_cool: Color,
    /// Chance of each accent tint.
    pub accent_fraction: f32,
    /// Full width of the random hue shift.
    pub hue_jitter: f32,
    /// Full width of the random lightness shift.
    pub lightness_jitter: f32,
    /// Largest blend toward white.
    pub white_mix: f32,
    /// Base point size.
    pub size: f32,
    /// Chance of an oversized point.
    pub large_fraction: f32,
    /// Layer opacity.
    pub opacity: f32,
    /// Rotation speed at the center.
    pub rotation_inner: f32,
    /// Rotation speed lost between center and `arm_length`.
    pub rotation_falloff: f32,
    /// Twinkle settings.
    pub twinkle: TwinkleConfig,
    /// Optional radial temperature gradient.
    pub radial_gradient: Option<RadialGradient>,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            particle_count: 50_000,
            arm_count: 4,
            tightness: 0.28,
            arm_spread: 2.5,
            arm_length: 140.0,
            inner_radius_factor: 0.25,
            radial_exponent: 1.4,
            log_scale: 0.04,
            spread_falloff: 0.6,
            thickness: 12.0,
            thickness_falloff: 1.8,
            color1: Color::from_hex(0xB0DCFF),
            color2: Color::from_hex(0xDADAFE),
            color3: Color::from_hex(0xFFFFFF),
            accent_warm: Color::from_hex(0xFFD6E0),
            accent_cool: Color::from_hex(0xB0FFEA),
            accent_fraction: 0.08,
            hue_jitter: 0.04,
            lightness_jitter: 0.1,
            white_mix: 0.1,
            size: 0.28,
            large_fraction: 0.01,
            opacity: 0.7,
            rotation_inner: 0.3,
            rotation_falloff: 0.28,
            twinkle: TwinkleConfig::default(),
            radial_gradient: None,
        }
    }
}

impl DiskConfig {
    /// Inner radius where the arms start.
    #[inline]
    pub fn min_arm_radius(&self) -> f32 {
        self.arm_length * self.inner_radius_factor
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.arm_count == 0 {
            return Err(ConfigError::NoSpiralArms);
        }
        positive("disk.tightness", self.tightness)?;
        non_negative("disk.arm_spread", self.arm_spread)?;
        positive("disk.arm_length", self.arm_length)?;
        unit("disk.inner_radius_factor", self.inner_radius_factor)?;
        positive("disk.radial_exponent", self.radial_exponent)?;
        positive("disk.log_scale", self.log_scale)?;
        positive("disk.spread_falloff", self.spread_falloff)?;
        non_negative("disk.thickness", self.thickness)?;
        positive("disk.thickness_falloff", self.thickness_falloff)?;
        unit("disk.accent_fraction", self.accent_fraction)?;
        non_negative("disk.hue_jitter", self.hue_jitter)?;
        non_negative("disk.lightness_jitter", self.lightness_jitter)?;
        unit("disk.white_mix", self.white_mix)?;
        non_negative("disk.size", self.size)?;
        unit("disk.large_fraction", self.large_fraction)?;
        unit("disk.opacity", self.opacity)?;
        non_negative("disk.rotation_inner", self.rotation_inner)?;
        non_negative("disk.rotation_falloff", self.rotation_falloff)?;
        self.twinkle.validate("disk.twinkle")?;
        if let Some(gradient) = &self.radial_gradient {
            positive("disk.radial_gradient.max_distance", gradient.max_distance)?;
            unit("disk.radial_gradient.strength", gradient.strength)?;
        }
        Ok(())
    }
}

/// Dark dust torus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DustConfig {
    /// Number of points.
    pub particle_count: usize,
    /// Smallest ring radius (`dustLaneRadiusMin`).
    pub radius_min: f32,
    /// Largest ring radius (`dustLaneRadiusMax`).
    pub radius_max: f32,
    /// Tube diameter (`dustLaneThickness`).
    pub thickness: f32,
    /// Vertical scale of the tube offset relative to its horizontal offset.
    pub vertical_flatten: f32,
    /// First dust color.
    #[serde(with = "hex_color")]
    pub color1: Color,
    /// Second dust color.
    #[serde(with = "hex_color")]
    pub color2: Color,
    /// Base point size.
    pub size: f32,
    /// Layer opacity.
    pub opacity: f32,
    /// Scale applied to the lane's rotation speed.
    pub rotation_factor: f32,
}

impl Default for DustConfig {
    fn default() -> Self {
        Self {
            particle_count: 60_000,
            radius_min: 75.0,
            radius_max: 115.0,
            thickness: 15.0,
            vertical_flatten: 0.5,
            color1: Color::from_hex(0x2C1F1F),
            color2: Color::from_hex(0x382828),
            size: 0.2,
            opacity: 0.35,
            rotation_factor: 0.5,
        }
    }
}

impl DustConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("dust.radius_min", self.radius_min)?;
        non_negative("dust.radius_max", self.radius_max)?;
        ordered("dust.radius_min..radius_max", self.radius_min, self.radius_max)?;
        non_negative("dust.thickness", self.thickness)?;
        non_negative("dust.vertical_flatten", self.vertical_flatten)?;
        non_negative("dust.size", self.size)?;
        unit("dust.opacity", self.opacity)?;
        non_negative("dust.rotation_factor", self.rotation_factor)
    }
}

/// One weighted entry of the background palette.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// Star color.
    #[serde(with = "hex_color")]
    pub color: Color,
    /// Relative probability.
    pub weight: f32,
}

/// Static starfield shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Number of stars (`bgStarCount`).
    pub star_count: usize,
    /// Inner shell radius.
    pub radius_min: f32,
    /// Outer shell radius.
    pub radius_max: f32,
    /// Weighted star colors.
    pub palette: Vec<PaletteEntry>,
    /// Lowest brightness multiplier.
    pub brightness_min: f32,
    /// Highest brightness multiplier.
    pub brightness_max: f32,
    /// Full width of the random hue shift.
    pub hue_jitter: f32,
    /// Base star size.
    pub size: f32,
    /// Layer opacity.
    pub opacity: f32,
    /// Multiplier on the shared base point size.
    pub size_scale: f32,
    /// Multiplier on the shared perspective scale.
    pub perspective_boost: f32,
    /// Twinkle settings.
    pub twinkle: TwinkleConfig,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            star_count: 1_500,
            radius_min: 250.0,
            radius_max: 2_250.0,
            palette: vec![
                PaletteEntry { color: Color::from_hex(0xFFFFFF), weight: 0.5 },
                PaletteEntry { color: Color::from_hex(0xB0B0FF), weight: 0.3 },
                PaletteEntry { color: Color::from_hex(0xFFCC88), weight: 0.2 },
            ],
            brightness_min: 0.5,
            brightness_max: 0.9,
            hue_jitter: 0.05,
            size: 0.06,
            opacity: 0.35,
            size_scale: 0.4,
            perspective_boost: 2.5,
            twinkle: TwinkleConfig {
                fraction: 0.1,
                shimmer: 0.0,
                ..TwinkleConfig::default()
            },
        }
    }
}

impl BackgroundConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("background.radius_min", self.radius_min)?;
        non_negative("background.radius_max", self.radius_max)?;
        ordered("background.radius_min..radius_max", self.radius_min, self.radius_max)?;
        for entry in &self.palette {
            non_negative("background.palette.weight", entry.weight)?;
        }
        if !self.palette.iter().any(|entry| entry.weight > 0.0) {
            return Err(ConfigError::EmptyPalette);
        }
        non_negative("background.brightness_min", self.brightness_min)?;
        non_negative("background.brightness_max", self.brightness_max)?;
        ordered("background.brightness_min..brightness_max", self.brightness_min, self.brightness_max)?;
        non_negative("background.hue_jitter", self.hue_jitter)?;
        non_negative("background.size", self.size)?;
        unit("background.opacity", self.opacity)?;
        positive("background.size_scale", self.size_scale)?;
        positive("background.perspective_boost", self.perspective_boost)?;
        self.twinkle.validate("background.twinkle")
    }
}

/// Camera and point-size base values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Field of view at scroll 0, in degrees (`cameraFov`).
    pub camera_fov: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane; must enclose the background shell.
    pub far: f32,
    /// Shared point-size multiplier (`particleBaseSize`).
    pub particle_base_size: f32,
    /// Perspective point-size numerator (`particlePerspectiveScale`).
    pub particle_perspective_scale: f32,
    /// Clear color behind the galaxy.
    #[serde(with = "hex_color")]
    pub clear_color: Color,
    /// Keep the canvas transparent so the page shows through.
    pub transparent: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            camera_fov: 60.0,
            near: 0.1,
            far: 5_000.0,
            particle_base_size: 1.5,
            particle_perspective_scale: 380.0,
            clear_color: Color::BLACK,
            transparent: true,
        }
    }
}

impl ViewConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("view.camera_fov", self.camera_fov)?;
        positive("view.near", self.near)?;
        positive("view.far", self.far)?;
        ordered("view.near..far", self.near, self.far)?;
        non_negative("view.particle_base_size", self.particle_base_size)?;
        positive("view.particle_perspective_scale", self.particle_perspective_scale)
    }
}

/// Scroll-driven camera rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Dolly distance at scroll 0.
    pub initial_dolly: f32,
    /// Dolly distance at scroll 1.
    pub final_dolly: f32,
    /// Pitch at scroll 0, in radians.
    pub initial_pitch: f32,
    /// Pitch at scroll 1, in radians.
    pub final_pitch: f32,
    /// Total yaw swept over the scroll range, in radians.
    pub yaw_sweep: f32,
    /// Degrees of field of view lost over the scroll range.
    pub fov_range: f32,
    /// Per-tick smoothing rate of the rig.
    pub lerp_rate: f32,
    /// Eased scroll above which the pointer starts steering the camera.
    pub look_around_threshold: f32,
    /// Largest pointer-driven yaw, in radians.
    pub pointer_yaw: f32,
    /// Largest pointer-driven pitch, in radians.
    pub pointer_pitch: f32,
    /// Largest pointer-driven roll, in radians.
    pub pointer_roll: f32,
    /// Eased scroll above which idle breathing may start.
    pub breathing_threshold: f32,
    /// Extra idle time, after the spring-back delay, before breathing.
    pub breathing_delay: f32,
    /// Dolly amplitude of the breathing motion.
    pub breathing_amplitude: f32,
    /// Angular speed of the breathing motion.
    pub breathing_speed: f32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            initial_dolly: 300.0,
            final_dolly: 55.0,
            initial_pitch: -PI / 12.0,
            final_pitch: 0.0,
            yaw_sweep: FRAC_PI_2,
            fov_range: 15.0,
            lerp_rate: 0.035,
            look_around_threshold: 0.98,
            pointer_yaw: PI / 72.0,
            pointer_pitch: PI / 90.0,
            pointer_roll: 0.08,
            breathing_threshold: 0.99,
            breathing_delay: 0.75,
            breathing_amplitude: 1.0,
            breathing_speed: 0.35,
        }
    }
}

impl RigConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("rig.initial_dolly", self.initial_dolly)?;
        positive("rig.final_dolly", self.final_dolly)?;
        finite("rig.initial_pitch", self.initial_pitch)?;
        finite("rig.final_pitch", self.final_pitch)?;
        non_negative("rig.yaw_sweep", self.yaw_sweep)?;
        finite("rig.fov_range", self.fov_range)?;
        rate("rig.lerp_rate", self.lerp_rate)?;
        unit("rig.look_around_threshold", self.look_around_threshold)?;
        if self.look_around_threshold >= 1.0 {
            return Err(ConfigError::OutOfUnitRange {
                field: "rig.look_around_threshold",
                value: self.look_around_threshold,
            });
        }
        non_negative("rig.pointer_yaw", self.pointer_yaw)?;
        non_negative("rig.pointer_pitch", self.pointer_pitch)?;
        non_negative("rig.pointer_roll", self.pointer_roll)?;
        unit("rig.breathing_threshold", self.breathing_threshold)?;
        non_negative("rig.breathing_delay", self.breathing_delay)?;
        non_negative("rig.breathing_amplitude", self.breathing_amplitude)?;
        non_negative("rig.breathing_speed", self.breathing_speed)
    }
}

/// Input normalization and smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Per-tick smoothing rate of the scroll signal.
    pub scroll_lerp: f32,
    /// Per-tick smoothing rate of the pointer signal.
    pub pointer_lerp: f32,
    /// Pointer idle time before it springs back to center, in seconds.
    pub spring_idle_delay: f32,
    /// Id of the page section whose top ends the scroll range.
    pub section_id: String,
    /// Scroll range in viewport heights when the section is missing.
    pub fallback_viewports: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            scroll_lerp: 0.025,
            pointer_lerp: 0.05,
            spring_idle_delay: 0.7,
            section_id: "projects".to_string(),
            fallback_viewports: 3.0,
        }
    }
}

impl InputConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        rate("input.scroll_lerp", self.scroll_lerp)?;
        rate("input.pointer_lerp", self.pointer_lerp)?;
        non_negative("input.spring_idle_delay", self.spring_idle_delay)?;
        positive("input.fallback_viewports", self.fallback_viewports)
    }
}

/// Bloom tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    /// Enables the whole post-processing chain (`bloomEnabled`).
    pub enabled: bool,
    /// Luminance threshold (`bloomThreshold`).
    pub threshold: f32,
    /// Additive strength (`bloomStrength`).
    pub strength: f32,
    /// Blur radius, 0-1 (`bloomRadius`).
    pub radius: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 0.45,
            strength: 0.5,
            radius: 0.7,
        }
    }
}

/// Tone-mapping operator of the output pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapping {
    /// No curve, clamp only.
    #[default]
    Linear,
    /// Reinhard operator.
    Reinhard,
    /// ACES filmic curve.
    Aces,
}

/// Vignette and output settings of the post-processing chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    /// Distance at which the vignette reaches full darkness.
    pub vignette_offset: f32,
    /// Darkening applied at the edge.
    pub vignette_darkness: f32,
    /// Output exposure.
    pub exposure: f32,
    /// Output tone-mapping operator.
    pub tone_mapping: ToneMapping,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            vignette_offset: 1.2,
            vignette_darkness: 0.3,
            exposure: 1.0,
            tone_mapping: ToneMapping::Linear,
        }
    }
}

/// Complete configuration of the galaxy backdrop.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
    /// Seed of every layer's random stream.
    pub seed: u64,
    /// Central bulge.
    pub core: CoreConfig,
    /// Spiral disk.
    pub disk: DiskConfig,
    /// Dust lanes.
    pub dust: DustConfig,
    /// Background starfield.
    pub background: BackgroundConfig,
    /// Camera and point-size base values.
    pub view: ViewConfig,
    /// Camera rig.
    pub rig: RigConfig,
    /// Input smoothing.
    pub input: InputConfig,
    /// Bloom.
    pub bloom: BloomConfig,
    /// Vignette and output.
    pub post: PostConfig,
}

impl GalaxyConfig {
    /// Parse from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every option against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.core.validate()?;
        self.disk.validate()?;
        self.dust.validate()?;
        self.background.validate()?;
        self.view.validate()?;
        self.rig.validate()?;
        self.input.validate()?;
        fov("view.camera_fov", self.view.camera_fov)?;
        // The rig narrows the lens by fov_range over the scroll.
        fov("rig.fov_range", self.view.camera_fov - self.rig.fov_range)?;

        non_negative("bloom.threshold", self.bloom.threshold)?;
        non_negative("bloom.strength", self.bloom.strength)?;
        unit("bloom.radius", self.bloom.radius)?;
        positive("post.vignette_offset", self.post.vignette_offset)?;
        unit("post.vignette_darkness", self.post.vignette_darkness)?;
        positive("post.exposure", self.post.exposure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GalaxyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_json_is_default() {
        let config = GalaxyConfig::from_json("{}").unwrap();
        assert_eq!(config, GalaxyConfig::default());
    }

    #[test]
    fn test_partial_json_overrides() {
        let json = r##"{ "seed": 7, "disk": { "arm_count": 2, "color1": "#ff0000" } }"##;
        let config = GalaxyConfig::from_json(json).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.disk.arm_count, 2);
        assert_eq!(config.disk.color1.to_hex(), 0xFF0000);
        assert_eq!(config.disk.particle_count, 50_000);
    }

    #[test]
    fn test_negative_count_rejected() {
        let err = GalaxyConfig::from_json(r#"{ "core": { "particle_count": -5 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_negative_radius_rejected() {
        let mut config = GalaxyConfig::default();
        config.core.radius = -1.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Negative { field: "core.radius", .. }));
        assert!(err.to_string().contains("core.radius"));
    }

    #[test]
    fn test_inverted_dust_range_rejected() {
        let mut config = GalaxyConfig::default();
        config.dust.radius_min = 120.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvertedRange { .. })));
    }

    #[test]
    fn test_fov_range_exceeding_base_rejected() {
        let mut config = GalaxyConfig::default();
        config.rig.fov_range = 90.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FovOutOfRange { field: "rig.fov_range", .. })
        ));

        let mut config = GalaxyConfig::default();
        config.view.camera_fov = 200.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FovOutOfRange { field: "view.camera_fov", .. })
        ));
    }

    #[test]
    fn test_zero_arms_rejected() {
        let mut config = GalaxyConfig::default();
        config.disk.arm_count = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoSpiralArms)));
    }

    #[test]
    fn test_rates_must_be_in_unit_interval() {
        let mut config = GalaxyConfig::default();
        config.input.scroll_lerp = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRate { .. })));
        config.input.scroll_lerp = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRate { .. })));
    }

    #[test]
    fn test_bad_color_rejected() {
        let err = GalaxyConfig::from_json(r##"{ "dust": { "color1": "#12" } }"##).unwrap_err();
        assert!(err.to_string().contains("invalid hex color"));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = GalaxyConfig::default();
        let json = config.to_json().unwrap();
        let back = GalaxyConfig::from_json(&json).unwrap();
        assert_eq!(back.disk.color1.to_hex(), config.disk.color1.to_hex());
        assert_eq!(back.background.palette.len(), 3);
    }
}
