//! Glyph atlas and 7-bit text layout.
//!
//! The atlas holds the printable ASCII range packed left to right in a
//! single row. It is built once from a [`GlyphRasterizer`] and never changes
//! afterwards; the rasterizer is dropped as soon as the atlas exists.

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, SwashCache, SwashContent};
use smithay::utils::{Logical, Rectangle};

use crate::{
    geometry::{FONT_SIZE, TEXT_HEIGHT},
    render::{BoxInstance, TextureId, UiBatch, UiRenderer},
};

pub const FIRST_GLYPH: u8 = 32;
pub const LAST_GLYPH: u8 = 126;

/// A rendered glyph as an 8-bit coverage mask.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RasterGlyph {
    pub width: u32,
    pub height: u32,
    pub bearing_x: i32,
    /// Distance from the baseline up to the top of the mask.
    pub bearing_y: i32,
    pub advance: i32,
    /// `width * height` bytes, row-major.
    pub coverage: Vec<u8>,
}

pub trait GlyphRasterizer {
    fn rasterize(&mut self, ch: char) -> Option<RasterGlyph>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphInfo {
    pub uv: [f32; 4],
    pub bearing_x: i32,
    pub bearing_y: i32,
    pub advance: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Debug)]
pub struct GlyphAtlas {
    glyphs: [GlyphInfo; 128],
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    texture: Option<TextureId>,
}

impl GlyphAtlas {
    /// Rasterize every printable ASCII glyph. `None` when the rasterizer
    /// produced nothing with ink.
    pub fn build(rasterizer: &mut dyn GlyphRasterizer) -> Option<Self> {
        let mut glyphs = [GlyphInfo::default(); 128];
        let mut rasters: Vec<(u8, RasterGlyph)> = Vec::new();
        let (mut width, mut height) = (0u32, 0u32);

        for code in FIRST_GLYPH..=LAST_GLYPH {
            let Some(raster) = rasterizer.rasterize(char::from(code)) else {
                continue;
            };
            glyphs[usize::from(code)] = GlyphInfo {
                bearing_x: raster.bearing_x,
                bearing_y: raster.bearing_y,
                advance: raster.advance,
                width: raster.width as i32,
                height: raster.height as i32,
                ..GlyphInfo::default()
            };
            if raster.width > 0 {
                width += raster.width + 1;
                height = height.max(raster.height);
            }
            rasters.push((code, raster));
        }

        if width == 0 || height == 0 {
            return None;
        }

        let mut pixels = vec![0u8; (width * height) as usize];
        let mut x = 0u32;
        for (code, raster) in &rasters {
            if raster.width == 0 {
                continue;
            }
            for row in 0..raster.height {
                let src = (row * raster.width) as usize;
                let dst = (row * width + x) as usize;
                let len = raster.width as usize;
                if let Some(line) = raster.coverage.get(src..src + len) {
                    pixels[dst..dst + len].copy_from_slice(line);
                }
            }
            glyphs[usize::from(*code)].uv = [
                x as f32 / width as f32,
                0.0,
                (x + raster.width) as f32 / width as f32,
                raster.height as f32 / height as f32,
            ];
            x += raster.width + 1;
        }

        Some(Self {
            glyphs,
            width,
            height,
            pixels,
            texture: None,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub(crate) fn set_texture(&mut self, texture: TextureId) {
        self.texture = Some(texture);
        // The GPU copy is all that is needed from here on.
        self.pixels = Vec::new();
    }

    pub fn glyph(&self, byte: u8) -> Option<&GlyphInfo> {
        self.glyphs.get(usize::from(byte))
    }

    /// Walk the 7-bit characters of `text` that fit in `max_width` pixels,
    /// yielding each glyph with its pen position.
    fn walk<'a>(
        &'a self,
        text: &'a str,
        max_width: i32,
    ) -> impl Iterator<Item = (i32, &'a GlyphInfo)> + 'a {
        let mut pen_x = 0;
        text.bytes()
            .filter(|byte| *byte < 128)
            .filter_map(|byte| self.glyph(byte))
            .filter(|glyph| glyph.advance != 0)
            .map_while(move |glyph| {
                if pen_x + glyph.advance > max_width {
                    return None;
                }
                let at = pen_x;
                pen_x += glyph.advance;
                Some((at, glyph))
            })
    }

    /// Width of the part of `text` that fits in `max_width` pixels.
    pub fn measure(&self, text: &str, max_width: i32) -> i32 {
        self.walk(text, max_width)
            .last()
            .map(|(pen, glyph)| pen + glyph.advance)
            .unwrap_or(0)
    }

    /// One glyph box per visible character, with the text's top-left at
    /// (`x`, `y`).
    pub fn layout(
        &self,
        text: &str,
        max_width: i32,
        x: i32,
        y: i32,
        color: [f32; 3],
    ) -> Vec<BoxInstance> {
        self.walk(text, max_width)
            .filter(|(_, glyph)| glyph.width > 0 && glyph.height > 0)
            .map(|(pen, glyph)| {
                let rect = Rectangle::<i32, Logical>::new(
                    (x + pen + glyph.bearing_x, y + FONT_SIZE - glyph.bearing_y).into(),
                    (glyph.width, glyph.height).into(),
                );
                BoxInstance::glyph(rect, glyph.uv, color)
            })
            .collect()
    }
}

/// Text width, or 0 when there is no atlas.
pub fn measure_text(atlas: Option<&GlyphAtlas>, text: &str, max_width: i32) -> i32 {
    atlas.map_or(0, |atlas| atlas.measure(text, max_width))
}

/// Queue `text` into `batch`. Draws nothing without an atlas.
pub fn draw_text<R: UiRenderer + ?Sized>(
    batch: &mut UiBatch<'_, R>,
    atlas: Option<&GlyphAtlas>,
    text: &str,
    max_width: i32,
    color: [f32; 3],
    x: i32,
    y: i32,
) {
    let Some(atlas) = atlas else {
        return;
    };
    if !batch.has_atlas() {
        return;
    }
    for instance in atlas.layout(text, max_width, x, y, color) {
        batch.push(instance);
    }
}

/// Rasterizes with the system fonts through cosmic-text. The font database
/// is only loaded on first use.
pub struct CosmicTextRasterizer {
    family: Option<String>,
    font_system: Option<FontSystem>,
    swash: SwashCache,
}

impl CosmicTextRasterizer {
    pub fn new(family: Option<String>) -> Self {
        Self {
            family,
            font_system: None,
            swash: SwashCache::new(),
        }
    }
}

impl GlyphRasterizer for CosmicTextRasterizer {
    fn rasterize(&mut self, ch: char) -> Option<RasterGlyph> {
        let font_system = self.font_system.get_or_insert_with(FontSystem::new);
        let metrics = Metrics::new(FONT_SIZE as f32, TEXT_HEIGHT as f32);
        let mut buffer = Buffer::new(font_system, metrics);
        let attrs = match self.family.as_deref() {
            Some(name) => Attrs::new().family(Family::Name(name)),
            None => Attrs::new().family(Family::SansSerif),
        };
        buffer.set_text(font_system, &ch.to_string(), attrs, Shaping::Basic);
        buffer.shape_until_scroll(font_system, false);

        let glyph = buffer
            .layout_runs()
            .flat_map(|run| run.glyphs.iter())
            .next()?
            .clone();
        let advance = glyph.w.round() as i32;
        let physical = glyph.physical((0.0, 0.0), 1.0);

        let Some(image) = self.swash.get_image_uncached(font_system, physical.cache_key) else {
            return Some(RasterGlyph {
                advance,
                ..RasterGlyph::default()
            });
        };

        let (width, height) = (image.placement.width, image.placement.height);
        let pixels = (width * height) as usize;
        let coverage: Vec<u8> = match image.content {
            SwashContent::Mask => image.data,
            SwashContent::Color => image.data.chunks_exact(4).map(|px| px[3]).collect(),
            SwashContent::SubpixelMask => image
                .data
                .chunks_exact(4)
                .map(|px| ((u16::from(px[0]) + u16::from(px[1]) + u16::from(px[2])) / 3) as u8)
                .collect(),
        };
        if coverage.len() < pixels {
            tracing::warn!(?ch, "glyph image shorter than its placement, skipping");
            return None;
        }

        Some(RasterGlyph {
            width,
            height,
            bearing_x: image.placement.left,
            bearing_y: image.placement.top,
            advance,
            coverage,
        })
    }
}
