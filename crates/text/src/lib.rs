//! Text Mesh Provider: turns a string and a font name into a glyph mesh.
//!
//! Font names resolve through a fixed [`FontRegistry`] before anything is
//! loaded, so an unknown name fails without touching the mesh arena. Glyphs
//! are rasterized into a coverage atlas and laid out as one quad per glyph,
//! centered on the origin.
//!
//! # Invariants
//! - The provider owns exactly one arena slot once created; regeneration
//!   replaces the slot's contents and never allocates a second slot.
//! - `fontWidth` is a transform, never a geometry input.

mod error;
mod layout;
mod loader;
mod provider;
mod registry;

pub use error::FontError;
pub use layout::{ATLAS_MAX_SIDE, ATLAS_ROW_WIDTH, RASTER_PX, build_text_mesh};
pub use loader::{BlockFontLoader, FontLoader, FsFontLoader, GlyphBitmap, GlyphSource};
pub use provider::{SyncOutcome, TextMeshProvider, TextRequest};
pub use registry::{DEFAULT_FONT, FontAsset, FontRegistry};
