use crate::target::RenderTarget;
use endless_common::{Color, Viewport};
use endless_scene::{PerspectiveCamera, Scene, TargetId};

/// The off-screen half of the pipeline: a render target, the scene drawn
/// into it and the camera it is drawn through.
#[derive(Debug, Clone)]
pub struct OffscreenTarget {
    pub target: RenderTarget,
    pub scene: Scene,
    pub camera: PerspectiveCamera,
}

impl OffscreenTarget {
    /// Target sized to the viewport, black-backed scene, 45° square camera.
    pub fn new(id: TargetId, viewport: Viewport) -> Self {
        Self {
            target: RenderTarget::allocate(id, viewport),
            scene: Scene::new("offscreen", Color::BLACK),
            camera: PerspectiveCamera::offscreen(),
        }
    }

    /// Handle that materials bind to sample this target.
    pub fn texture(&self) -> TargetId {
        self.target.id
    }

    pub fn resize(&mut self, viewport: Viewport) -> bool {
        self.target.reallocate(viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_offscreen() {
        let off = OffscreenTarget::new(TargetId(0), Viewport::new(640, 480));
        assert_eq!(off.target.size(), Viewport::new(640, 480));
        assert_eq!(off.scene.background, Color::BLACK);
        assert!(off.scene.nodes().is_empty());
        assert_eq!(off.camera, PerspectiveCamera::offscreen());
        assert_eq!(off.texture(), TargetId(0));
    }
}
