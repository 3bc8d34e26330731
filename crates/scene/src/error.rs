use crate::arena::MeshId;

/// Errors from scene operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("mesh slot {0:?} is empty")]
    MissingMesh(MeshId),
}
