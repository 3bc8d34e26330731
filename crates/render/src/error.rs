use endless_scene::{SceneError, TargetId};

/// Errors surfaced by the render loop.
///
/// Context loss is fatal; the loop reports it and does not retry.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("GPU context lost")]
    ContextLost,
    #[error("surface error: {0}")]
    Surface(String),
    #[error("target {0:?} is sampled while bound for writing")]
    Feedback(TargetId),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Param(#[from] endless_params::ParamError),
    #[error(transparent)]
    Font(#[from] endless_text::FontError),
}
