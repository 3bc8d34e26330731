use crate::error::FontError;
use crate::registry::FontAsset;

/// One rasterized glyph. Offsets are in pixels relative to the pen
/// position on the baseline, y up; `coverage` rows run top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub xmin: i32,
    pub ymin: i32,
    pub width: usize,
    pub height: usize,
    pub advance: f32,
    pub coverage: Vec<u8>,
}

/// A loaded font able to rasterize glyphs.
pub trait GlyphSource {
    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap;
}

/// Turns a resolved font asset into a glyph source.
pub trait FontLoader {
    fn load(&self, asset: &FontAsset) -> Result<Box<dyn GlyphSource>, FontError>;
}

/// Loads TrueType/OpenType files from disk and rasterizes with fontdue.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFontLoader;

struct FontdueSource(fontdue::Font);

impl GlyphSource for FontdueSource {
    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap {
        let (metrics, coverage) = self.0.rasterize(ch, px);
        GlyphBitmap {
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            width: metrics.width,
            height: metrics.height,
            advance: metrics.advance_width,
            coverage,
        }
    }
}

impl FontLoader for FsFontLoader {
    fn load(&self, asset: &FontAsset) -> Result<Box<dyn GlyphSource>, FontError> {
        let bytes = std::fs::read(&asset.path).map_err(|source| FontError::Io {
            path: asset.path.clone(),
            source,
        })?;
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()).map_err(
            |e| FontError::Parse {
                name: asset.name.clone(),
                reason: e.to_string(),
            },
        )?;
        tracing::info!("loaded font {} from {}", asset.name, asset.path.display());
        Ok(Box::new(FontdueSource(font)))
    }
}

/// Placeholder font: every visible character is a solid block.
///
/// Needs no files, so headless runs and tests can drive the full text path.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockFontLoader;

struct BlockGlyphs;

impl GlyphSource for BlockGlyphs {
    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap {
        let advance = (px * 0.7).round();
        if ch.is_whitespace() {
            return GlyphBitmap {
                xmin: 0,
                ymin: 0,
                width: 0,
                height: 0,
                advance,
                coverage: Vec::new(),
            };
        }
        let width = (px * 0.6).round().max(1.0) as usize;
        let height = (px * 0.7).round().max(1.0) as usize;
        GlyphBitmap {
            xmin: (px * 0.05).round() as i32,
            ymin: 0,
            width,
            height,
            advance,
            coverage: vec![255; width * height],
        }
    }
}

impl FontLoader for BlockFontLoader {
    fn load(&self, asset: &FontAsset) -> Result<Box<dyn GlyphSource>, FontError> {
        tracing::debug!("using block glyphs in place of {}", asset.name);
        Ok(Box::new(BlockGlyphs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn asset(path: std::path::PathBuf) -> FontAsset {
        FontAsset {
            name: "Orbitron".into(),
            path,
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsFontLoader
            .load(&asset(dir.path().join("absent.ttf")))
            .err()
            .unwrap();
        assert!(matches!(err, FontError::Io { .. }));
    }

    #[test]
    fn garbage_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a font").unwrap();
        let err = FsFontLoader
            .load(&asset(file.path().to_path_buf()))
            .err()
            .unwrap();
        match err {
            FontError::Parse { name, .. } => assert_eq!(name, "Orbitron"),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn block_glyphs() {
        let source = BlockFontLoader.load(&asset("unused".into())).unwrap();
        let g = source.rasterize('E', 64.0);
        assert_eq!(g.coverage.len(), g.width * g.height);
        assert!(g.advance > g.width as f32);
        let space = source.rasterize(' ', 64.0);
        assert_eq!(space.width, 0);
        assert!(space.advance > 0.0);
    }
}
