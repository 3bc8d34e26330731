use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity transform with a non-uniform scale.
    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    /// Model matrix (scale, then rotate, then translate).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Size of the drawable area in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimized window reports a zero-area viewport.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The same viewport with each side raised to at least one pixel.
    pub fn at_least_one(self) -> Self {
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        let v = self.at_least_one();
        v.width as f32 / v.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn scale_only_stretches_x() {
        let t = Transform::from_scale(Vec3::new(0.2, 1.0, 1.0));
        let p = t.matrix().transform_point3(Vec3::new(10.0, 10.0, 0.0));
        assert!((p.x - 2.0).abs() < 1e-6);
        assert!((p.y - 10.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_viewport() {
        let v = Viewport::new(0, 720);
        assert!(v.is_degenerate());
        assert_eq!(v.at_least_one(), Viewport::new(1, 720));
        assert_eq!(Viewport::new(0, 0).aspect(), 1.0);
    }

    #[test]
    fn aspect_ratio() {
        assert_eq!(Viewport::new(1280, 720).aspect(), 1280.0 / 720.0);
    }
}
