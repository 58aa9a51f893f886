//! # Core Module
//!
//! wgpu context management, the layer renderer, timing, the per-frame
//! scheduler and the [`SceneContext`] that owns them all.

mod context;
mod renderer;
mod clock;
mod scheduler;
mod scene_context;

pub use context::{choose_alpha_mode, choose_surface_format, Context, ContextError};
pub use renderer::{RenderInfo, Renderer};
pub use clock::Clock;
pub use scheduler::{AnimationScheduler, FrameState};
pub use scene_context::{SceneContext, SceneError, GENERATION_BUDGET};

use crate::galaxy::ViewConfig;
use crate::math::Color;

/// Render configuration options.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Keep the canvas transparent (premultiplied alpha compositing).
    pub alpha: bool,
    /// Power preference for GPU selection.
    pub power_preference: wgpu::PowerPreference,
    /// Present mode (vsync).
    pub present_mode: wgpu::PresentMode,
    /// Clear color.
    pub clear_color: Color,
}

impl RenderConfig {
    /// Render settings for a backdrop view.
    pub fn from_view(view: &ViewConfig) -> Self {
        Self {
            alpha: view.transparent,
            clear_color: view.clear_color,
            ..Self::default()
        }
    }

    /// Clear value for the frame. Transparent canvases clear to zero alpha.
    pub fn wgpu_clear_color(&self) -> wgpu::Color {
        if self.alpha {
            return wgpu::Color::TRANSPARENT;
        }
        wgpu::Color {
            r: self.clear_color.r as f64,
            g: self.clear_color.g as f64,
            b: self.clear_color.b as f64,
            a: 1.0,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            alpha: true,
            power_preference: wgpu::PowerPreference::HighPerformance,
            present_mode: wgpu::PresentMode::AutoVsync,
            clear_color: Color::BLACK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_clear_is_zero() {
        let config = RenderConfig::from_view(&ViewConfig::default());
        assert!(config.alpha);
        assert_eq!(config.wgpu_clear_color(), wgpu::Color::TRANSPARENT);
    }

    #[test]
    fn test_opaque_clear_uses_color() {
        let view = ViewConfig {
            transparent: false,
            clear_color: Color::new(0.5, 0.25, 0.0),
            ..ViewConfig::default()
        };
        let clear = RenderConfig::from_view(&view).wgpu_clear_color();
        assert_eq!(clear.r, 0.5);
        assert_eq!(clear.g, 0.25);
        assert_eq!(clear.a, 1.0);
    }
}
