//! Scene model: a mesh arena shared by any number of scene graphs.
//!
//! Scenes never own geometry. They hold [`MeshId`] slots into a
//! [`MeshArena`], so one mesh can appear in the off-screen scene and the
//! on-screen scene at once while its buffers exist exactly once.
//!
//! # Invariants
//! - A slot's `revision` changes whenever its geometry or material data is
//!   replaced; transform-only updates leave it untouched.
//! - Replacing a slot's mesh keeps its id, so scene membership survives.

mod arena;
mod camera;
mod error;
pub mod geometry;
mod material;
mod scene;

pub use arena::{MeshArena, MeshId, MeshSlot};
pub use camera::PerspectiveCamera;
pub use error::SceneError;
pub use material::{GlyphAtlas, KnotMaterial, Material, TargetId, TextMaterial};
pub use scene::{Scene, SceneNode};

use bytemuck::{Pod, Zeroable};

/// Interleaved vertex shared by every mesh: position, normal, uv.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle mesh plus the material that shades it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material: Material,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
