//! Shared value types used by every layer of the renderer.
//!
//! Nothing here touches the GPU; these are plain `Copy` values that flow
//! between the parameter surface, the scene graph and the render backends.

mod types;

pub use types::{Color, Transform, Viewport};
