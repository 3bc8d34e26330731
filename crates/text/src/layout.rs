use crate::error::FontError;
use crate::loader::{GlyphBitmap, GlyphSource};
use endless_common::Color;
use endless_scene::{GlyphAtlas, Material, Mesh, TextMaterial, Vertex};

/// Pixel size glyphs are rasterized at, independent of the world-space size.
pub const RASTER_PX: f32 = 64.0;

/// Empty texels around each glyph in the atlas.
const PAD: usize = 1;

/// Atlas rows wrap once they would grow past this width.
pub const ATLAS_ROW_WIDTH: usize = 4096;

/// Largest atlas side accepted; matches the default 2D texture limit of
/// common GPU backends.
pub const ATLAS_MAX_SIDE: usize = 8192;

struct Placed {
    glyph: GlyphBitmap,
    pen_x: f32,
    atlas_x: usize,
    atlas_y: usize,
}

/// Lay out `text` as glyph quads, `font_size` world units tall per em.
///
/// The mesh is centered on the origin in the z = 0 plane, facing +z, and
/// shaded white through a coverage atlas packed in rows of at most
/// [`ATLAS_ROW_WIDTH`] texels.
pub fn build_text_mesh(
    source: &dyn GlyphSource,
    text: &str,
    font_size: f32,
) -> Result<Mesh, FontError> {
    if text.is_empty() {
        return Err(FontError::EmptyText);
    }

    let mut placed = Vec::new();
    let mut pen_x = 0.0;
    let (mut cursor_x, mut cursor_y, mut row_h) = (PAD, PAD, 0);
    let mut atlas_w = PAD;
    for ch in text.chars() {
        let glyph = source.rasterize(ch, RASTER_PX);
        let advance = glyph.advance;
        if glyph.width > 0 && glyph.height > 0 {
            if cursor_x > PAD && cursor_x + glyph.width + PAD > ATLAS_ROW_WIDTH {
                cursor_x = PAD;
                cursor_y += row_h + PAD;
                row_h = 0;
            }
            row_h = row_h.max(glyph.height);
            let width = glyph.width;
            placed.push(Placed {
                glyph,
                pen_x,
                atlas_x: cursor_x,
                atlas_y: cursor_y,
            });
            cursor_x += width + PAD;
            atlas_w = atlas_w.max(cursor_x);
        }
        pen_x += advance;
    }

    let atlas_h = cursor_y + row_h + PAD;
    if atlas_w > ATLAS_MAX_SIDE || atlas_h > ATLAS_MAX_SIDE {
        return Err(FontError::AtlasTooLarge {
            width: atlas_w,
            height: atlas_h,
        });
    }

    let mut atlas = GlyphAtlas::new(atlas_w as u32, atlas_h as u32);
    for p in &placed {
        for row in 0..p.glyph.height {
            let src = &p.glyph.coverage[row * p.glyph.width..(row + 1) * p.glyph.width];
            let dst = (p.atlas_y + row) * atlas.width as usize + p.atlas_x;
            atlas.pixels[dst..dst + p.glyph.width].copy_from_slice(src);
        }
    }

    // Bounds of the inked area, for centering.
    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for p in &placed {
        let left = p.pen_x + p.glyph.xmin as f32;
        let bottom = p.glyph.ymin as f32;
        min_x = min_x.min(left);
        max_x = max_x.max(left + p.glyph.width as f32);
        min_y = min_y.min(bottom);
        max_y = max_y.max(bottom + p.glyph.height as f32);
    }
    let center = if placed.is_empty() {
        (0.0, 0.0)
    } else {
        ((min_x + max_x) * 0.5, (min_y + max_y) * 0.5)
    };

    let scale = font_size / RASTER_PX;
    let (aw, ah) = (atlas.width as f32, atlas.height as f32);
    let mut vertices = Vec::with_capacity(placed.len() * 4);
    let mut indices = Vec::with_capacity(placed.len() * 6);
    for p in &placed {
        let x0 = (p.pen_x + p.glyph.xmin as f32 - center.0) * scale;
        let x1 = x0 + p.glyph.width as f32 * scale;
        let y0 = (p.glyph.ymin as f32 - center.1) * scale;
        let y1 = y0 + p.glyph.height as f32 * scale;

        let u0 = p.atlas_x as f32 / aw;
        let u1 = (p.atlas_x + p.glyph.width) as f32 / aw;
        let v_top = p.atlas_y as f32 / ah;
        let v_bottom = (p.atlas_y + p.glyph.height) as f32 / ah;

        let base = vertices.len() as u32;
        for (x, y, u, v) in [
            (x0, y0, u0, v_bottom),
            (x1, y0, u1, v_bottom),
            (x1, y1, u1, v_top),
            (x0, y1, u0, v_top),
        ] {
            vertices.push(Vertex {
                position: [x, y, 0.0],
                normal: [0.0, 0.0, 1.0],
                uv: [u, v],
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    tracing::debug!(
        "laid out {:?}: {} quads, atlas {}x{}",
        text,
        placed.len(),
        atlas.width,
        atlas.height
    );

    Ok(Mesh {
        vertices,
        indices,
        material: Material::Text(TextMaterial {
            color: Color::WHITE,
            atlas,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{BlockFontLoader, FontLoader};
    use crate::registry::FontAsset;

    fn blocks() -> Box<dyn GlyphSource> {
        BlockFontLoader
            .load(&FontAsset {
                name: "Orbitron".into(),
                path: "unused".into(),
            })
            .unwrap()
    }

    fn bounds(mesh: &Mesh) -> (f32, f32, f32, f32) {
        mesh.vertices.iter().fold(
            (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
            |(lx, hx, ly, hy), v| {
                (
                    lx.min(v.position[0]),
                    hx.max(v.position[0]),
                    ly.min(v.position[1]),
                    hy.max(v.position[1]),
                )
            },
        )
    }

    #[test]
    fn one_quad_per_visible_glyph() {
        let mesh = build_text_mesh(blocks().as_ref(), "END LESS", 33.0).unwrap();
        assert_eq!(mesh.vertices.len(), 7 * 4);
        assert_eq!(mesh.triangle_count(), 7 * 2);
        let Material::Text(text) = &mesh.material else {
            panic!("expected text material");
        };
        assert_eq!(text.color, Color::WHITE);
        assert!(text.atlas.covered_texels() > 0);
    }

    #[test]
    fn centered_on_origin() {
        let mesh = build_text_mesh(blocks().as_ref(), "ENDLESS", 33.0).unwrap();
        let (lx, hx, ly, hy) = bounds(&mesh);
        assert!((lx + hx).abs() < 1e-3);
        assert!((ly + hy).abs() < 1e-3);
    }

    #[test]
    fn height_scales_with_font_size() {
        let small = build_text_mesh(blocks().as_ref(), "E", 10.0).unwrap();
        let large = build_text_mesh(blocks().as_ref(), "E", 40.0).unwrap();
        let (_, _, sly, shy) = bounds(&small);
        let (_, _, lly, lhy) = bounds(&large);
        assert!(((lhy - lly) / (shy - sly) - 4.0).abs() < 1e-3);
    }

    #[test]
    fn uvs_inside_atlas() {
        let mesh = build_text_mesh(blocks().as_ref(), "ENDLESS", 33.0).unwrap();
        for v in &mesh.vertices {
            assert!((0.0..=1.0).contains(&v.uv[0]));
            assert!((0.0..=1.0).contains(&v.uv[1]));
        }
    }

    #[test]
    fn long_text_wraps_atlas_rows() {
        let text = "ENDLESS ".repeat(40);
        let mesh = build_text_mesh(blocks().as_ref(), &text, 33.0).unwrap();
        let Material::Text(material) = &mesh.material else {
            panic!("expected text material");
        };
        let atlas = &material.atlas;
        assert!(atlas.width as usize <= ATLAS_ROW_WIDTH);
        assert!(atlas.height > 64, "expected several rows, got {}", atlas.height);

        // Every glyph keeps its own texels: no overlap between rows.
        let glyph = blocks().rasterize('E', RASTER_PX);
        assert_eq!(atlas.covered_texels(), 280 * glyph.width * glyph.height);
        for v in &mesh.vertices {
            assert!((0.0..=1.0).contains(&v.uv[0]));
            assert!((0.0..=1.0).contains(&v.uv[1]));
        }
    }

    #[test]
    fn oversized_atlas_rejected() {
        let text = "E".repeat(20_000);
        assert!(matches!(
            build_text_mesh(blocks().as_ref(), &text, 33.0),
            Err(FontError::AtlasTooLarge { .. })
        ));
    }

    #[test]
    fn empty_text_rejected() {
        assert!(matches!(
            build_text_mesh(blocks().as_ref(), "", 33.0),
            Err(FontError::EmptyText)
        ));
    }

    #[test]
    fn whitespace_only_has_no_quads() {
        let mesh = build_text_mesh(blocks().as_ref(), "   ", 33.0).unwrap();
        assert!(mesh.is_empty());
    }
}
