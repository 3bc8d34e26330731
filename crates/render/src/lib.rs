//! Composite render loop: draw the off-screen scene into a render target,
//! then draw the visible scene, whose torus knot samples that target.
//!
//! # Invariants
//! - Each frame binds the target and renders the off-screen scene before the
//!   visible scene is rendered; both go to the backend in that order.
//! - The knot's time uniform never decreases.
//! - The off-screen camera's distance equals `cameraZ` as read at the start
//!   of the frame.
//!
//! Backends implement [`RenderBackend`]. [`DebugBackend`] records calls
//! instead of drawing, for tests and headless runs; the wgpu backend lives
//! in its own crate.

mod backend;
mod clock;
mod composite;
mod debug;
mod error;
mod offscreen;
mod sketch;
mod stats;
mod target;

pub use backend::RenderBackend;
pub use clock::{Clock, ManualClock, SystemClock};
pub use composite::{CompositeLoop, FrameReport};
pub use debug::{BackendCall, DebugBackend, DrawCall};
pub use error::RenderError;
pub use offscreen::OffscreenTarget;
pub use sketch::{Sketch, SketchOptions};
pub use stats::FrameStats;
pub use target::{RenderTarget, ResizePolicy};

pub fn crate_info() -> &'static str {
    "endless-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
