//! Per-frame driver.
//!
//! The scheduler owns every piece of mutable animation state and is its
//! only writer. Event producers stage raw input through it; once per tick it
//! advances the clock, smooths the input, updates the rig and poses the
//! camera. GPU work is left to the caller, which receives a [`FrameState`].

use crate::camera::PerspectiveCamera;
use crate::controls::{CameraRig, InputState, RigInput, RigState, ScrollReference};
use crate::galaxy::{GalaxyConfig, InputConfig};
use crate::math::ease_in_out_cubic;

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Shader time, seconds.
    pub time: f32,
    /// Time since the previous tick, seconds.
    pub delta: f32,
    /// Cubic-eased scroll progress.
    pub eased_scroll: f32,
    /// Rig values after this tick.
    pub rig: RigState,
    /// Whether the pointer was springing back to center.
    pub spring_back: bool,
}

/// CPU side of the animation loop.
pub struct AnimationScheduler {
    clock: super::Clock,
    input: InputState,
    input_config: InputConfig,
    rig: CameraRig,
    camera: PerspectiveCamera,
    width: u32,
    height: u32,
    visible: bool,
    eased_scroll: f32,
    frame: u64,
}

impl AnimationScheduler {
    /// Scheduler for a viewport of `width` × `height` pixels.
    pub fn new(config: &GalaxyConfig, width: u32, height: u32) -> Self {
        let view = &config.view;
        let aspect = if width > 0 && height > 0 { width as f32 / height as f32 } else { 1.0 };
        let rig = CameraRig::new(&config.rig, view.camera_fov);
        let mut camera = PerspectiveCamera::new(view.camera_fov, aspect, view.near, view.far);
        rig.apply(&mut camera);

        Self {
            clock: super::Clock::new(),
            input: InputState::new(),
            input_config: config.input.clone(),
            rig,
            camera,
            width,
            height,
            visible: true,
            eased_scroll: 0.0,
            frame: 0,
        }
    }

    /// Stage a new scroll reference distance.
    pub fn set_scroll_reference(&mut self, reference: ScrollReference) {
        self.input.set_scroll_reference(reference);
    }

    /// Stage a raw scroll offset.
    pub fn on_scroll(&mut self, offset: f32) {
        self.input.set_scroll_offset(offset);
    }

    /// Stage a raw pointer position against the current viewport.
    pub fn on_pointer_move(&mut self, client_x: f32, client_y: f32, now_ms: f64) {
        self.input
            .set_pointer(client_x, client_y, self.width as f32, self.height as f32, now_ms);
    }

    /// Advance one frame at timestamp `now_ms`. Returns `None` while hidden.
    pub fn tick(&mut self, now_ms: f64) -> Option<FrameState> {
        if !self.visible {
            return None;
        }

        let now = now_ms / 1000.0;
        let delta = self.clock.get_delta_at(now) as f32;
        let time = self.clock.elapsed() as f32;

        self.input.smooth_scroll(self.input_config.scroll_lerp);
        let eased_scroll = ease_in_out_cubic(self.input.scroll_current());

        let idle_seconds = self.input.idle_seconds(now_ms);
        let spring_back =
            self.rig
                .should_spring_back(eased_scroll, idle_seconds, self.input_config.spring_idle_delay);
        self.input.smooth_pointer(self.input_config.pointer_lerp, spring_back);

        self.rig.update(&RigInput {
            eased_scroll,
            pointer: self.input.pointer_current(),
            idle_seconds,
            spring_idle_delay: self.input_config.spring_idle_delay,
            time,
        });
        self.rig.apply(&mut self.camera);

        self.eased_scroll = eased_scroll;
        self.frame += 1;

        Some(FrameState {
            time,
            delta,
            eased_scroll,
            rig: *self.rig.current(),
            spring_back,
        })
    }

    /// Apply a new viewport size. Zero-area sizes are skipped and reported
    /// as `false`; re-applying the current size is harmless.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resize to zero-area viewport {}x{}", width, height);
            return false;
        }
        self.width = width;
        self.height = height;
        self.camera.set_aspect(width as f32 / height as f32);
        log::debug!("Viewport resized to {}x{}", width, height);
        true
    }

    /// Pause or resume the loop. Hidden time is not replayed on resume.
    pub fn set_visible(&mut self, visible: bool, now_ms: f64) {
        if visible == self.visible {
            return;
        }
        let now = now_ms / 1000.0;
        if visible {
            self.clock.resume_at(now);
        } else {
            self.clock.pause_at(now);
        }
        self.visible = visible;
        log::debug!("Animation {}", if visible { "resumed" } else { "paused" });
    }

    /// Whether frames are currently advancing.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Eased scroll progress of the last tick, for page chrome.
    #[inline]
    pub fn eased_scroll(&self) -> f32 {
        self.eased_scroll
    }

    /// Shader time as of the last tick.
    #[inline]
    pub fn time(&self) -> f32 {
        self.clock.elapsed() as f32
    }

    /// Number of ticks so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Viewport size in pixels.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Scroll and pointer state.
    #[inline]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Camera rig state.
    #[inline]
    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    /// Camera driven by the rig.
    #[inline]
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// Mutable access to the camera.
    #[inline]
    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::{generate_layer, LayerKind};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn scheduler() -> AnimationScheduler {
        AnimationScheduler::new(&GalaxyConfig::default(), 800, 600)
    }

    #[test]
    fn test_resize_updates_aspect_and_keeps_fields() {
        let mut config = GalaxyConfig::default();
        config.disk.particle_count = 64;
        let field = generate_layer(LayerKind::Disk, &config).unwrap();
        let before = field.to_bytes();

        let mut scheduler = AnimationScheduler::new(&config, 800, 600);
        assert!((scheduler.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!(scheduler.resize(1920, 1080));
        assert!((scheduler.camera().aspect - 1920.0 / 1080.0).abs() < 1e-6);
        assert_eq!(field.to_bytes(), before);
    }

    #[test]
    fn test_zero_area_resize_is_skipped() {
        let mut scheduler = scheduler();
        assert!(!scheduler.resize(0, 720));
        assert!(!scheduler.resize(1280, 0));
        assert_eq!(scheduler.size(), (800, 600));
        assert!((scheduler.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_hidden_ticks_are_skipped_and_time_freezes() {
        let mut scheduler = scheduler();
        let mut now = 0.0;
        for _ in 0..10 {
            scheduler.tick(now);
            now += FRAME_MS;
        }
        let frozen = scheduler.time();

        scheduler.set_visible(false, now);
        assert!(scheduler.tick(now + 5_000.0).is_none());

        now += 60_000.0;
        scheduler.set_visible(true, now);
        let state = scheduler.tick(now + FRAME_MS).unwrap();
        assert!(state.time - frozen < 0.05);
        assert!(state.delta < 0.05);
    }

    #[test]
    fn test_scroll_drives_rig_to_final_framing() {
        let config = GalaxyConfig::default();
        let mut scheduler = AnimationScheduler::new(&config, 800, 600);
        scheduler.set_scroll_reference(ScrollReference(1000.0));
        scheduler.on_scroll(1000.0);

        let mut now = 0.0;
        let mut state = None;
        for _ in 0..3000 {
            state = scheduler.tick(now);
            now += FRAME_MS;
        }
        let state = state.unwrap();
        assert!(state.eased_scroll > 0.999);
        assert!((scheduler.eased_scroll() - state.eased_scroll).abs() < 1e-6);
        let dolly = state.rig.dolly;
        assert!((dolly - config.rig.final_dolly).abs() <= config.rig.breathing_amplitude + 1e-2);
        assert!((state.rig.fov - (config.view.camera_fov - config.rig.fov_range)).abs() < 1e-2);
    }

    #[test]
    fn test_no_scroll_keeps_initial_framing() {
        let config = GalaxyConfig::default();
        let mut scheduler = AnimationScheduler::new(&config, 800, 600);
        let state = scheduler.tick(0.0).unwrap();
        assert_eq!(state.eased_scroll, 0.0);
        assert_eq!(state.rig.dolly, config.rig.initial_dolly);
        assert_eq!(state.rig.fov, config.view.camera_fov);
    }

    #[test]
    fn test_pointer_springs_back_when_idle_at_end() {
        let mut scheduler = scheduler();
        scheduler.set_scroll_reference(ScrollReference(100.0));
        scheduler.on_scroll(100.0);

        let mut now = 0.0;
        for _ in 0..3000 {
            scheduler.tick(now);
            now += FRAME_MS;
        }
        scheduler.on_pointer_move(800.0, 300.0, now);
        for _ in 0..30 {
            let state = scheduler.tick(now).unwrap();
            assert!(!state.spring_back);
            now += FRAME_MS;
        }
        let steered = scheduler.input().pointer_current()[0];
        assert!(steered > 0.5);

        for _ in 0..600 {
            scheduler.tick(now);
            now += FRAME_MS;
        }
        assert!(scheduler.input().pointer_current()[0] < 0.01);
        assert_eq!(scheduler.input().pointer_target()[0], 1.0);
    }

    #[test]
    fn test_pointer_at_bottom_tilts_pitch_down() {
        let config = GalaxyConfig::default();
        let mut scheduler = AnimationScheduler::new(&config, 800, 600);
        scheduler.set_scroll_reference(ScrollReference(100.0));
        scheduler.on_scroll(100.0);

        let mut now = 0.0;
        for _ in 0..3000 {
            scheduler.tick(now);
            now += FRAME_MS;
        }
        for _ in 0..400 {
            scheduler.on_pointer_move(400.0, 600.0, now);
            scheduler.tick(now);
            now += FRAME_MS;
        }

        assert!(scheduler.input().pointer_current()[1] > 0.999);
        let pitch = scheduler.rig().target().pitch;
        assert!(pitch < config.rig.final_pitch);
        assert!((pitch - (config.rig.final_pitch - config.rig.pointer_pitch)).abs() < 1e-3);
    }
}
