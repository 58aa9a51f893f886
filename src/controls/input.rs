//! Scroll and pointer signals.
//!
//! Event handlers only write the `*_target` fields through the `set_*`
//! methods. The scheduler is the single consumer: it advances the
//! `*_current` fields once per tick with [`InputState::smooth`].

use crate::galaxy::InputConfig;
use crate::math::{clamp, damp};

/// Distance, in pixels, that maps scroll offset onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollReference(pub f32);

impl ScrollReference {
    /// Resolve from the page layout.
    ///
    /// `section_top` is the document offset of the downstream section, if it
    /// exists. Without it the range is the scrollable height, but never less
    /// than `fallback_viewports` viewport heights.
    pub fn resolve(
        section_top: Option<f32>,
        document_height: f32,
        viewport_height: f32,
        fallback_viewports: f32,
    ) -> Self {
        match section_top {
            Some(top) => Self(top),
            None => Self((document_height - viewport_height).max(viewport_height * fallback_viewports)),
        }
    }

    /// Normalized progress for a scroll offset. Zero when the reference is
    /// not positive.
    pub fn normalize(&self, offset: f32) -> f32 {
        if self.0 > 0.0 && offset.is_finite() {
            clamp(offset / self.0, 0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Raw and smoothed input signals.
#[derive(Debug, Clone, PartialEq)]
pub struct InputState {
    scroll_target: f32,
    scroll_current: f32,
    pointer_target: [f32; 2],
    pointer_current: [f32; 2],
    last_move_ms: f64,
    reference: Option<ScrollReference>,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    /// Fresh state with no scroll reference and a centered pointer.
    pub fn new() -> Self {
        Self {
            scroll_target: 0.0,
            scroll_current: 0.0,
            pointer_target: [0.0; 2],
            pointer_current: [0.0; 2],
            last_move_ms: 0.0,
            reference: None,
        }
    }

    /// Replace the scroll reference, e.g. after a layout change.
    pub fn set_scroll_reference(&mut self, reference: ScrollReference) {
        self.reference = Some(reference);
    }

    /// Scroll distance that maps to full progress, once measured.
    pub fn scroll_reference(&self) -> Option<ScrollReference> {
        self.reference
    }

    /// Stage a raw scroll offset in pixels.
    pub fn set_scroll_offset(&mut self, offset: f32) {
        self.scroll_target = self.reference.map_or(0.0, |r| r.normalize(offset));
    }

    /// Stage a raw pointer position in client pixels.
    ///
    /// Each axis maps to `[-1, 1]` across the viewport, y pointing down
    /// like client coordinates.
    /// Calls with an empty viewport are ignored.
    pub fn set_pointer(&mut self, client_x: f32, client_y: f32, width: f32, height: f32, now_ms: f64) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let x = (client_x / width - 0.5) * 2.0;
        let y = (client_y / height - 0.5) * 2.0;
        self.pointer_target = [clamp(x, -1.0, 1.0), clamp(y, -1.0, 1.0)];
        self.last_move_ms = now_ms;
    }

    /// Seconds since the pointer last moved.
    pub fn idle_seconds(&self, now_ms: f64) -> f32 {
        ((now_ms - self.last_move_ms) / 1000.0).max(0.0) as f32
    }

    /// Advance the smoothed scroll one tick.
    pub fn smooth_scroll(&mut self, rate: f32) {
        self.scroll_current = damp(self.scroll_current, self.scroll_target, rate);
    }

    /// Advance the smoothed pointer one tick.
    ///
    /// With `spring_back` the pointer eases toward the center instead of its
    /// staged target; the target itself is kept.
    pub fn smooth_pointer(&mut self, rate: f32, spring_back: bool) {
        let target = if spring_back { [0.0; 2] } else { self.pointer_target };
        for axis in 0..2 {
            self.pointer_current[axis] = damp(self.pointer_current[axis], target[axis], rate);
        }
    }

    /// Advance both smoothed signals one tick.
    pub fn smooth(&mut self, config: &InputConfig, spring_back: bool) {
        self.smooth_scroll(config.scroll_lerp);
        self.smooth_pointer(config.pointer_lerp, spring_back);
    }

    /// Latest raw scroll progress in `[0, 1]`.
    #[inline]
    pub fn scroll_target(&self) -> f32 {
        self.scroll_target
    }

    /// Smoothed scroll progress.
    #[inline]
    pub fn scroll_current(&self) -> f32 {
        self.scroll_current
    }

    /// Latest normalized pointer position.
    #[inline]
    pub fn pointer_target(&self) -> [f32; 2] {
        self.pointer_target
    }

    /// Smoothed pointer position.
    #[inline]
    pub fn pointer_current(&self) -> [f32; 2] {
        self.pointer_current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_prefers_section() {
        let reference = ScrollReference::resolve(Some(2400.0), 5000.0, 800.0, 3.0);
        assert_eq!(reference, ScrollReference(2400.0));
    }

    #[test]
    fn test_reference_fallback() {
        let tall = ScrollReference::resolve(None, 6000.0, 800.0, 3.0);
        assert_eq!(tall, ScrollReference(5200.0));
        let short = ScrollReference::resolve(None, 1000.0, 800.0, 3.0);
        assert_eq!(short, ScrollReference(2400.0));
    }

    #[test]
    fn test_scroll_normalization_clamps() {
        let mut input = InputState::new();
        input.set_scroll_reference(ScrollReference(1000.0));
        input.set_scroll_offset(250.0);
        assert_eq!(input.scroll_target(), 0.25);
        input.set_scroll_offset(5000.0);
        assert_eq!(input.scroll_target(), 1.0);
        input.set_scroll_offset(-40.0);
        assert_eq!(input.scroll_target(), 0.0);
    }

    #[test]
    fn test_scroll_without_positive_reference_is_zero() {
        let mut input = InputState::new();
        input.set_scroll_offset(300.0);
        assert_eq!(input.scroll_target(), 0.0);
        input.set_scroll_reference(ScrollReference(0.0));
        input.set_scroll_offset(300.0);
        assert_eq!(input.scroll_target(), 0.0);
    }

    #[test]
    fn test_pointer_normalization() {
        let mut input = InputState::new();
        input.set_pointer(800.0, 0.0, 800.0, 600.0, 1500.0);
        assert_eq!(input.pointer_target(), [1.0, -1.0]);
        input.set_pointer(400.0, 450.0, 800.0, 600.0, 1600.0);
        assert_eq!(input.pointer_target(), [0.0, 0.5]);
        input.set_pointer(-100.0, 900.0, 800.0, 600.0, 1700.0);
        assert_eq!(input.pointer_target(), [-1.0, 1.0]);
        assert!((input.idle_seconds(2700.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_ignores_empty_viewport() {
        let mut input = InputState::new();
        input.set_pointer(10.0, 10.0, 0.0, 600.0, 100.0);
        assert_eq!(input.pointer_target(), [0.0, 0.0]);
        assert_eq!(input.idle_seconds(100.0), 0.1);
    }

    #[test]
    fn test_smoothing_converges_without_overshoot() {
        let config = InputConfig::default();
        let mut input = InputState::new();
        input.set_scroll_reference(ScrollReference(100.0));
        input.set_scroll_offset(100.0);
        input.set_pointer(800.0, 300.0, 800.0, 600.0, 0.0);

        let mut previous = 0.0;
        for _ in 0..2000 {
            input.smooth(&config, false);
            let current = input.scroll_current();
            assert!(current >= previous && current <= 1.0);
            previous = current;
        }
        assert!((input.scroll_current() - 1.0).abs() < 1e-4);
        assert!((input.pointer_current()[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_spring_back_keeps_target() {
        let config = InputConfig::default();
        let mut input = InputState::new();
        input.set_pointer(800.0, 300.0, 800.0, 600.0, 0.0);
        for _ in 0..200 {
            input.smooth(&config, false);
        }
        let moved = input.pointer_current()[0];
        for _ in 0..200 {
            input.smooth(&config, true);
        }
        assert!(input.pointer_current()[0] < moved * 0.01);
        assert_eq!(input.pointer_target(), [1.0, 0.0]);
    }
}
