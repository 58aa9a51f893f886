//! Scroll-driven camera rig.
//!
//! The camera hangs off a yaw pivot, then a pitch pivot, then a dolly
//! offset along local +Z, and always aims at the galaxy's center. Every
//! tick the rig derives target values from the eased scroll and the
//! smoothed pointer and eases its current values toward them.

use crate::camera::PerspectiveCamera;
use crate::galaxy::RigConfig;
use crate::math::{damp, Matrix4, Vector3};

/// One set of rig values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigState {
    /// Rotation of the yaw pivot, radians.
    pub yaw: f32,
    /// Rotation of the pitch pivot, radians.
    pub pitch: f32,
    /// Distance from the pivots to the camera.
    pub dolly: f32,
    /// Vertical field of view, degrees.
    pub fov: f32,
    /// Camera roll about its viewing axis, radians.
    pub roll: f32,
}

impl RigState {
    /// Camera position in world space.
    pub fn position(&self) -> Vector3 {
        let pivots = Matrix4::from_rotation_y(self.yaw).multiply(&Matrix4::from_rotation_x(self.pitch));
        pivots.transform_point(&Vector3::new(0.0, 0.0, self.dolly))
    }
}

/// Inputs of one rig update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigInput {
    /// Cubic-eased scroll progress.
    pub eased_scroll: f32,
    /// Smoothed pointer, each axis in `[-1, 1]`.
    pub pointer: [f32; 2],
    /// Seconds since the pointer last moved.
    pub idle_seconds: f32,
    /// Idle time after which the pointer springs back.
    pub spring_idle_delay: f32,
    /// Clock time, seconds.
    pub time: f32,
}

/// Camera rig controller.
#[derive(Debug, Clone)]
pub struct CameraRig {
    config: RigConfig,
    fov_base: f32,
    current: RigState,
    target: RigState,
}

impl CameraRig {
    /// Rig at its scroll-zero framing.
    pub fn new(config: &RigConfig, fov_base: f32) -> Self {
        let initial = RigState {
            yaw: -config.yaw_sweep / 2.0,
            pitch: config.initial_pitch,
            dolly: config.initial_dolly,
            fov: fov_base,
            roll: 0.0,
        };
        Self {
            config: config.clone(),
            fov_base,
            current: initial,
            target: initial,
        }
    }

    /// Smoothed state applied to the camera.
    #[inline]
    pub fn current(&self) -> &RigState {
        &self.current
    }

    /// State the rig is easing toward.
    #[inline]
    pub fn target(&self) -> &RigState {
        &self.target
    }

    /// Fade-in of pointer look-around over `[threshold, 1]`.
    pub fn look_around_effect(&self, eased_scroll: f32) -> f32 {
        let threshold = self.config.look_around_threshold;
        if eased_scroll <= threshold || threshold >= 1.0 {
            return 0.0;
        }
        ((eased_scroll - threshold) / (1.0 - threshold)).clamp(0.0, 1.0)
    }

    /// Whether the pointer should ease back to center.
    pub fn should_spring_back(&self, eased_scroll: f32, idle_seconds: f32, spring_idle_delay: f32) -> bool {
        eased_scroll > self.config.look_around_threshold && idle_seconds > spring_idle_delay
    }

    /// Whether the idle breathing motion drives the dolly.
    pub fn is_breathing(&self, input: &RigInput) -> bool {
        input.eased_scroll > self.config.breathing_threshold
            && input.idle_seconds > input.spring_idle_delay + self.config.breathing_delay
    }

    /// Targets for one tick, without smoothing.
    pub fn targets(&self, input: &RigInput) -> RigState {
        let c = &self.config;
        let e = input.eased_scroll.clamp(0.0, 1.0);
        let effect = self.look_around_effect(e);
        let [px, py] = input.pointer;

        let mut dolly = c.initial_dolly - e * (c.initial_dolly - c.final_dolly);
        if self.is_breathing(input) {
            dolly = c.final_dolly + (input.time * c.breathing_speed).sin() * c.breathing_amplitude;
        }

        RigState {
            yaw: e * c.yaw_sweep - c.yaw_sweep / 2.0 + px * c.pointer_yaw * effect,
            pitch: c.initial_pitch - e * (c.initial_pitch - c.final_pitch) - py * c.pointer_pitch * effect,
            dolly,
            fov: self.fov_base - e * c.fov_range,
            roll: px * c.pointer_roll * effect,
        }
    }

    /// Recompute targets and ease the rig one tick toward them.
    ///
    /// Roll follows its target directly; the pointer feeding it is already
    /// smoothed.
    pub fn update(&mut self, input: &RigInput) {
        self.target = self.targets(input);
        let rate = self.config.lerp_rate;
        self.current = RigState {
            yaw: damp(self.current.yaw, self.target.yaw, rate),
            pitch: damp(self.current.pitch, self.target.pitch, rate),
            dolly: damp(self.current.dolly, self.target.dolly, rate),
            fov: damp(self.current.fov, self.target.fov, rate),
            roll: self.target.roll,
        };
    }

    /// Write the current pose to `camera`, aimed at the origin.
    pub fn apply(&self, camera: &mut PerspectiveCamera) {
        camera.set_pose(self.current.position(), Vector3::ZERO, self.current.roll);
        camera.set_fov(self.current.fov);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(eased_scroll: f32, pointer: [f32; 2]) -> RigInput {
        RigInput {
            eased_scroll,
            pointer,
            idle_seconds: 0.0,
            spring_idle_delay: 0.7,
            time: 0.0,
        }
    }

    fn settle(rig: &mut CameraRig, input: &RigInput) {
        for _ in 0..2000 {
            rig.update(input);
        }
    }

    #[test]
    fn test_initial_framing() {
        let config = RigConfig::default();
        let mut rig = CameraRig::new(&config, 60.0);
        rig.update(&input(0.0, [0.0, 0.0]));
        assert_eq!(rig.current().dolly, config.initial_dolly);
        assert_eq!(rig.current().fov, 60.0);
        assert_eq!(rig.current().yaw, -config.yaw_sweep / 2.0);
    }

    #[test]
    fn test_full_scroll_converges_to_final_framing() {
        let config = RigConfig::default();
        let mut rig = CameraRig::new(&config, 60.0);
        settle(&mut rig, &input(1.0, [0.0, 0.0]));
        assert!((rig.current().dolly - config.final_dolly).abs() < 1e-3);
        assert!((rig.current().fov - 45.0).abs() < 1e-3);
        assert!((rig.current().yaw - config.yaw_sweep / 2.0).abs() < 1e-4);
        assert!((rig.current().pitch - config.final_pitch).abs() < 1e-4);
    }

    #[test]
    fn test_smoothing_never_overshoots() {
        let config = RigConfig::default();
        let mut rig = CameraRig::new(&config, 60.0);
        let step = input(1.0, [0.0, 0.0]);
        let mut previous = rig.current().dolly;
        for _ in 0..500 {
            rig.update(&step);
            let dolly = rig.current().dolly;
            assert!(dolly <= previous && dolly >= config.final_dolly);
            previous = dolly;
        }
    }

    #[test]
    fn test_pointer_ignored_before_threshold() {
        let config = RigConfig::default();
        let rig = CameraRig::new(&config, 60.0);
        let still = rig.targets(&input(0.9, [0.0, 0.0]));
        let steered = rig.targets(&input(0.9, [1.0, -1.0]));
        assert_eq!(still, steered);
        assert_eq!(rig.look_around_effect(0.98), 0.0);
        assert!((rig.look_around_effect(0.99) - 0.5).abs() < 1e-4);
        assert_eq!(rig.look_around_effect(1.0), 1.0);
    }

    #[test]
    fn test_yaw_stays_within_sweep_plus_pointer() {
        let config = RigConfig::default();
        let mut rig = CameraRig::new(&config, 60.0);
        let bound = config.yaw_sweep / 2.0 + config.pointer_yaw + 1e-5;
        for i in 0..=100 {
            let e = i as f32 / 100.0;
            for pointer in [[-1.0, 1.0], [1.0, -1.0]] {
                rig.update(&input(e, pointer));
                assert!(rig.target().yaw.abs() <= bound);
                assert!(rig.current().yaw.abs() <= bound);
            }
        }
    }

    #[test]
    fn test_look_around_at_end_frame() {
        let config = RigConfig::default();
        let rig = CameraRig::new(&config, 60.0);
        let target = rig.targets(&input(1.0, [1.0, 1.0]));
        assert!((target.yaw - (config.yaw_sweep / 2.0 + config.pointer_yaw)).abs() < 1e-6);
        assert!((target.pitch - (config.final_pitch - config.pointer_pitch)).abs() < 1e-6);
        assert!((target.roll - config.pointer_roll).abs() < 1e-6);
    }

    #[test]
    fn test_spring_back_condition() {
        let rig = CameraRig::new(&RigConfig::default(), 60.0);
        assert!(!rig.should_spring_back(0.5, 10.0, 0.7));
        assert!(!rig.should_spring_back(1.0, 0.5, 0.7));
        assert!(rig.should_spring_back(1.0, 0.8, 0.7));
    }

    #[test]
    fn test_breathing_after_idle() {
        let config = RigConfig::default();
        let rig = CameraRig::new(&config, 60.0);
        let mut idle = input(1.0, [0.0, 0.0]);
        idle.time = std::f32::consts::PI / (2.0 * config.breathing_speed);

        idle.idle_seconds = 1.0;
        assert!(!rig.is_breathing(&idle));
        assert_eq!(rig.targets(&idle).dolly, config.final_dolly);

        idle.idle_seconds = 1.5;
        assert!(rig.is_breathing(&idle));
        let dolly = rig.targets(&idle).dolly;
        assert!((dolly - (config.final_dolly + config.breathing_amplitude)).abs() < 1e-4);
    }

    #[test]
    fn test_start_position_is_above_disk() {
        let config = RigConfig::default();
        let rig = CameraRig::new(&config, 60.0);
        let position = rig.current().position();
        assert!((position.length() - config.initial_dolly).abs() < 1e-2);
        assert!(position.y > 0.0);
    }

    #[test]
    fn test_apply_aims_camera_at_origin() {
        let rig = CameraRig::new(&RigConfig::default(), 60.0);
        let mut camera = PerspectiveCamera::default();
        rig.apply(&mut camera);
        assert_eq!(camera.target, Vector3::ZERO);
        assert_eq!(camera.fov, 60.0);
        assert!(camera.forward().dot(&(-rig.current().position()).normalized()) > 0.9999);
    }
}
