use crate::error::RenderError;
use crate::target::RenderTarget;
use endless_scene::{MeshArena, PerspectiveCamera, Scene};

/// Renderer-agnostic interface driven by the composite loop.
///
/// Calls arrive in submission order. A backend must execute them in that
/// order so a target written by one `render` is complete before a later
/// `render` samples it.
pub trait RenderBackend {
    /// Direct subsequent renders into `target`, or the visible framebuffer
    /// when `None`.
    fn set_render_target(&mut self, target: Option<&RenderTarget>) -> Result<(), RenderError>;

    /// Clear the current destination to the scene background and draw its
    /// visible meshes through `camera`.
    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        arena: &MeshArena,
    ) -> Result<(), RenderError>;
}
