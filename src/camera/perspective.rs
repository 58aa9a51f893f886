//! Perspective camera.

use crate::math::{Matrix4, Vector3};

/// A perspective projection camera with roll about its viewing axis.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Field of view in degrees.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Camera position.
    pub position: Vector3,
    /// Camera target (look-at point).
    pub target: Vector3,
    /// Roll about the forward axis, radians.
    pub roll: f32,
    view_matrix: Matrix4,
    projection_matrix: Matrix4,
    needs_update: bool,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(60.0, 16.0 / 9.0, 0.1, 5000.0)
    }
}

impl PerspectiveCamera {
    /// Create a new perspective camera.
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Vector3::new(0.0, 0.0, 5.0),
            target: Vector3::ZERO,
            roll: 0.0,
            view_matrix: Matrix4::IDENTITY,
            projection_matrix: Matrix4::IDENTITY,
            needs_update: true,
        };
        camera.update_matrices();
        camera
    }

    /// Place the camera and aim it at `target`.
    pub fn set_pose(&mut self, position: Vector3, target: Vector3, roll: f32) {
        self.position = position;
        self.target = target;
        self.roll = roll;
        self.needs_update = true;
    }

    /// Set the field of view.
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.needs_update = true;
    }

    /// Set the aspect ratio. Non-positive or non-finite values are ignored.
    pub fn set_aspect(&mut self, aspect: f32) {
        if !aspect.is_finite() || aspect <= 0.0 {
            return;
        }
        self.aspect = aspect;
        self.needs_update = true;
    }

    /// Set near and far planes.
    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.needs_update = true;
    }

    /// Get the view matrix.
    pub fn view_matrix(&mut self) -> &Matrix4 {
        if self.needs_update {
            self.update_matrices();
        }
        &self.view_matrix
    }

    /// Get the projection matrix.
    pub fn projection_matrix(&mut self) -> &Matrix4 {
        if self.needs_update {
            self.update_matrices();
        }
        &self.projection_matrix
    }

    /// Update all matrices.
    pub fn update_matrices(&mut self) {
        let up = Vector3::UP.rotated_about_axis(&self.forward(), -self.roll);
        self.view_matrix = Matrix4::look_at(&self.position, &self.target, &up);
        self.projection_matrix = Matrix4::perspective(
            self.fov.to_radians(),
            self.aspect,
            self.near,
            self.far,
        );
        self.needs_update = false;
    }

    /// Get the forward direction.
    pub fn forward(&self) -> Vector3 {
        (self.target - self.position).normalized()
    }

    /// View-space depth of a world point (negative in front of the camera).
    pub fn view_depth(&mut self, point: &Vector3) -> f32 {
        self.view_matrix().transform_point(point).z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_aspect_rejects_degenerate() {
        let mut camera = PerspectiveCamera::new(60.0, 800.0 / 600.0, 0.1, 100.0);
        camera.set_aspect(0.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect, 800.0 / 600.0);
        camera.set_aspect(1920.0 / 1080.0);
        assert_eq!(camera.aspect, 1920.0 / 1080.0);
    }

    #[test]
    fn test_target_is_in_front() {
        let mut camera = PerspectiveCamera::default();
        camera.set_pose(Vector3::new(0.0, 10.0, 50.0), Vector3::ZERO, 0.0);
        let depth = camera.view_depth(&Vector3::ZERO);
        assert!(depth < 0.0);
        assert!((depth + Vector3::new(0.0, 10.0, 50.0).length()).abs() < 1e-3);
    }

    #[test]
    fn test_roll_tilts_horizon() {
        let mut camera = PerspectiveCamera::default();
        camera.set_pose(Vector3::new(0.0, 0.0, 10.0), Vector3::ZERO, 0.0);
        let level = camera.view_matrix().transform_point(&Vector3::new(1.0, 0.0, 0.0));
        assert!(level.y.abs() < 1e-5);

        camera.set_pose(Vector3::new(0.0, 0.0, 10.0), Vector3::ZERO, 0.1);
        let rolled = camera.view_matrix().transform_point(&Vector3::new(1.0, 0.0, 0.0));
        assert!(rolled.y.abs() > 0.05);
    }
}
