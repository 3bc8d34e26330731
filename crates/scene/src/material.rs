use endless_common::Color;

/// Identifies an off-screen render target. Stable across reallocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

/// Shader material for the torus knot: a time uniform and the off-screen
/// target it samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnotMaterial {
    /// Elapsed seconds, written once per frame.
    pub time: f32,
    /// Bound once at construction.
    pub texture: TargetId,
}

impl KnotMaterial {
    pub fn new(texture: TargetId) -> Self {
        Self { time: 0.0, texture }
    }
}

/// Single-channel coverage image holding rasterized glyphs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlyphAtlas {
    pub width: u32,
    pub height: u32,
    /// Row-major, one byte per texel.
    pub pixels: Vec<u8>,
}

impl GlyphAtlas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height) as usize],
        }
    }

    pub fn covered_texels(&self) -> usize {
        self.pixels.iter().filter(|&&p| p > 0).count()
    }
}

/// Flat-colored text sampled through a glyph atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMaterial {
    pub color: Color,
    pub atlas: GlyphAtlas,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Knot(KnotMaterial),
    Text(TextMaterial),
}

impl Material {
    /// The render target this material samples, if any.
    pub fn sampled_target(&self) -> Option<TargetId> {
        match self {
            Self::Knot(k) => Some(k.texture),
            Self::Text(_) => None,
        }
    }
}
