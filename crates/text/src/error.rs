use std::path::PathBuf;

/// Errors from font resolution, loading and layout.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("unknown font: {0}")]
    UnknownFont(String),
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse font {name}: {reason}")]
    Parse { name: String, reason: String },
    #[error("text is empty")]
    EmptyText,
    #[error("glyph atlas of {width}x{height} texels exceeds the texture size limit")]
    AtlasTooLarge { width: usize, height: usize },
    #[error(transparent)]
    Scene(#[from] endless_scene::SceneError),
    #[error(transparent)]
    Param(#[from] endless_params::ParamError),
}
