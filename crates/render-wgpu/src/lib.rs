//! wgpu render backend for the composite loop.
//!
//! Both passes of a frame are encoded into one command encoder and
//! submitted together, so the off-screen target is fully written before the
//! visible pass samples it.
//!
//! # Invariants
//! - One set of GPU buffers per arena slot, re-uploaded only when the slot
//!   revision changes.
//! - A target's texture is reallocated only when its generation changes.

mod gpu;
mod shaders;

pub use gpu::{WgpuFrame, WgpuRenderer};
