//! Parameter Surface: live-tunable values shared by the render loop and the
//! adjustment panel.
//!
//! # Invariants
//! - Every stored value lies inside its declared bounds or choice list.
//! - Readers always observe the most recently committed value.
//! - Each committed change bumps the store revision exactly once.

mod param;
mod store;

pub use param::{ParamKind, ParamSpec, ParamValue, names};
pub use store::{ParamError, ParamStore, Watcher};
