//! RGB color with hex and HSL helpers.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a `#RRGGBB` string cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid hex color '{0}': expected #RRGGBB")]
pub struct ColorParseError(pub String);

/// Linear RGB color. Channels are nominally 0.0-1.0; HDR boosts may exceed 1.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Color {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
}

impl Color {
    /// Black (0, 0, 0).
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0 };
    /// White (1, 1, 1).
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0 };

    /// Create a new color from RGB values.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Convert to an array.
    #[inline]
    pub const fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Create from a hex integer (0xRRGGBB).
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
        }
    }

    /// Convert to hex integer, clamping each channel.
    pub fn to_hex(&self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Parse a `#RRGGBB` (or `RRGGBB`) string.
    pub fn from_hex_str(s: &str) -> Result<Self, ColorParseError> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(ColorParseError(s.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Self::from_hex)
            .map_err(|_| ColorParseError(s.to_string()))
    }

    /// Format as `#rrggbb`.
    pub fn to_hex_string(&self) -> String {
        format!("#{:06x}", self.to_hex())
    }

    /// Create from HSL values, hue wrapping in 0.0-1.0.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        if s == 0.0 {
            return Self::new(l, l, l);
        }

        let hue_to_rgb = |p: f32, q: f32, t: f32| {
            let t = t.rem_euclid(1.0);
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        };

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let h = h.rem_euclid(1.0);

        Self {
            r: hue_to_rgb(p, q, h + 1.0 / 3.0),
            g: hue_to_rgb(p, q, h),
            b: hue_to_rgb(p, q, h - 1.0 / 3.0),
        }
    }

    /// Convert to HSL.
    pub fn to_hsl(&self) -> (f32, f32, f32) {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let l = (max + min) / 2.0;

        if max == min {
            return (0.0, 0.0, l);
        }

        let d = max - min;
        let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };

        let h = if max == self.r {
            ((self.g - self.b) / d + if self.g < self.b { 6.0 } else { 0.0 }) / 6.0
        } else if max == self.g {
            ((self.b - self.r) / d + 2.0) / 6.0
        } else {
            ((self.r - self.g) / d + 4.0) / 6.0
        };

        (h, s, l)
    }

    /// Shift hue, saturation and lightness. Saturation and lightness are
    /// clamped to 0.0-1.0 and hue wraps.
    pub fn offset_hsl(&self, dh: f32, ds: f32, dl: f32) -> Self {
        let (h, s, l) = self.to_hsl();
        Self::from_hsl(h + dh, (s + ds).clamp(0.0, 1.0), (l + dl).clamp(0.0, 1.0))
    }

    /// Scale every channel.
    #[inline]
    pub fn multiply_scalar(&self, s: f32) -> Self {
        Self::new(self.r * s, self.g * s, self.b * s)
    }

    /// Linear interpolation.
    #[inline]
    pub fn lerp(&self, other: &Color, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    /// Perceived brightness.
    #[inline]
    pub fn luminance(&self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    /// Clamp all components to `[0, max]`.
    #[inline]
    pub fn clamp_to(&self, max: f32) -> Self {
        Self {
            r: self.r.clamp(0.0, max),
            g: self.g.clamp(0.0, max),
            b: self.b.clamp(0.0, max),
        }
    }

    /// Clamp all components to 0.0-1.0.
    #[inline]
    pub fn clamp(&self) -> Self {
        self.clamp_to(1.0)
    }

    /// Check whether every channel is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    /// Check if approximately equal.
    #[inline]
    pub fn approx_eq(&self, other: &Color, epsilon: f32) -> bool {
        (self.r - other.r).abs() < epsilon
            && (self.g - other.g).abs() < epsilon
            && (self.b - other.b).abs() < epsilon
    }
}

impl From<Color> for [f32; 3] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

impl std::ops::Mul<f32> for Color {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        self.multiply_scalar(rhs)
    }
}

/// Serde adapter storing a [`Color`] as a `"#RRGGBB"` string.
///
/// Use with `#[serde(with = "crate::math::hex_color")]`.
pub mod hex_color {
    use super::Color;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as `#rrggbb`.
    pub fn serialize<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&color.to_hex_string())
    }

    /// Deserialize from `#RRGGBB`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_string() {
        let c = Color::from_hex_str("#FFFAE0").unwrap();
        assert_eq!(c.to_hex(), 0xFFFAE0);
        assert_eq!(c.to_hex_string(), "#fffae0");
    }

    #[test]
    fn test_hex_string_rejects_garbage() {
        assert!(Color::from_hex_str("#FFF").is_err());
        assert!(Color::from_hex_str("#GG0000").is_err());
    }

    #[test]
    fn test_hsl_roundtrip() {
        let c = Color::from_hsl(0.5, 0.5, 0.5);
        let (h, s, l) = c.to_hsl();
        assert!((h - 0.5).abs() < 0.01);
        assert!((s - 0.5).abs() < 0.01);
        assert!((l - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_offset_hsl_stays_in_range() {
        let c = Color::from_hex(0xB0DCFF).offset_hsl(0.9, 0.5, 0.4);
        assert!(c.is_finite());
        assert!(c.r >= 0.0 && c.r <= 1.0);
        assert!(c.g >= 0.0 && c.g <= 1.0);
        assert!(c.b >= 0.0 && c.b <= 1.0);
    }
}
