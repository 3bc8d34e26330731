use glam::{Mat4, Vec3};

/// Perspective camera looking at a fixed target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    /// Camera for the off-screen pass: 45°, square aspect, 0.1..1000.
    pub fn offscreen() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 50.0),
            target: Vec3::ZERO,
            fov_degrees: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Camera for the visible pass: 45°, viewport aspect, 1..1000, at z = 60.
    pub fn primary(aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 60.0),
            target: Vec3::ZERO,
            fov_degrees: 45.0,
            aspect,
            near: 1.0,
            far: 1000.0,
        }
    }

    /// Distance along the view axis (the camera's z).
    pub fn distance(&self) -> f32 {
        self.position.z
    }

    pub fn set_distance(&mut self, z: f32) {
        self.position.z = z;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
