//! Immediate-mode UI drawing.
//!
//! Every visible thing on screen is a [`BoxInstance`]: one screen-space
//! rectangle plus the colours and style flags a single shared fragment
//! routine needs to shade it as a flat fill, a bevel, a texture blit or a
//! glyph mask. Instances are collected in a [`UiBatch`] and handed to the
//! [`UiRenderer`] in as few draw calls as the texture bindings allow.

pub mod frame;
pub mod glyphs;

use bytemuck::{Pod, Zeroable};
use smithay::utils::{Logical, Rectangle};

use crate::errors::Result;

/// Instances per draw call.
pub const UI_BATCH_MAX: usize = 512;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    /// One coverage byte per pixel (glyph atlas).
    Alpha8,
    Rgba8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::Alpha8 => 1,
            TextureFormat::Rgba8 => 4,
        }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoxStyle {
    Flat = 0,
    Raised = 1,
    Sunken = 2,
    Textured = 3,
    Glyph = 4,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoxIcon {
    #[default]
    None = 0,
    Minimize = 1,
    Maximize = 2,
    Close = 3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxColors {
    pub face: [f32; 4],
    pub bevel_light: [f32; 4],
    pub bevel_dark: [f32; 4],
    pub inner_shadow: [f32; 4],
}

impl BoxColors {
    pub const BUTTON: BoxColors = BoxColors {
        face: [0.75, 0.75, 0.75, 1.0],
        bevel_light: [1.0, 1.0, 1.0, 1.0],
        bevel_dark: [0.0, 0.0, 0.0, 1.0],
        inner_shadow: [0.5, 0.5, 0.5, 1.0],
    };

    pub const FRAME_ACTIVE: BoxColors = BoxColors {
        face: [0.65, 0.65, 0.85, 1.0],
        bevel_light: [0.85, 0.85, 1.0, 1.0],
        bevel_dark: [0.3, 0.3, 0.5, 1.0],
        inner_shadow: [0.45, 0.45, 0.65, 1.0],
    };

    /// Flat bar with only a light top edge.
    pub const TASKBAR: BoxColors = BoxColors {
        face: [0.75, 0.75, 0.75, 1.0],
        bevel_light: [1.0, 1.0, 1.0, 1.0],
        bevel_dark: [0.75, 0.75, 0.75, 1.0],
        inner_shadow: [0.75, 0.75, 0.75, 1.0],
    };

    pub const NONE: BoxColors = BoxColors {
        face: [0.0; 4],
        bevel_light: [0.0; 4],
        bevel_dark: [0.0; 4],
        inner_shadow: [0.0; 4],
    };

    pub const fn flat(color: [f32; 4]) -> BoxColors {
        BoxColors {
            face: color,
            bevel_light: color,
            bevel_dark: color,
            inner_shadow: color,
        }
    }
}

/// Desktop background.
pub const BACKGROUND: BoxColors = BoxColors::flat([0.0, 0.5, 0.5, 1.0]);

/// Per-rectangle data, laid out for direct upload as an instance buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BoxInstance {
    /// x, y, width, height in output pixels.
    pub rect: [f32; 4],
    /// Face colour, or the atlas UV rectangle for glyphs.
    pub face: [f32; 4],
    /// Light bevel colour, or the text colour for glyphs.
    pub bevel_light: [f32; 4],
    pub bevel_dark: [f32; 4],
    pub inner_shadow: [f32; 4],
    /// style, icon, icon margin.
    pub params: [f32; 3],
}

impl BoxInstance {
    pub fn new(
        rect: Rectangle<i32, Logical>,
        style: BoxStyle,
        colors: &BoxColors,
        icon: BoxIcon,
        icon_margin: f32,
    ) -> Self {
        Self {
            rect: [
                rect.loc.x as f32,
                rect.loc.y as f32,
                rect.size.w as f32,
                rect.size.h as f32,
            ],
            face: colors.face,
            bevel_light: colors.bevel_light,
            bevel_dark: colors.bevel_dark,
            inner_shadow: colors.inner_shadow,
            params: [style as u8 as f32, icon as u8 as f32, icon_margin],
        }
    }

    pub fn styled(rect: Rectangle<i32, Logical>, style: BoxStyle, colors: &BoxColors) -> Self {
        Self::new(rect, style, colors, BoxIcon::None, 0.0)
    }

    pub fn textured(rect: Rectangle<i32, Logical>) -> Self {
        Self::styled(rect, BoxStyle::Textured, &BoxColors::NONE)
    }

    pub fn glyph(rect: Rectangle<i32, Logical>, uv: [f32; 4], color: [f32; 3]) -> Self {
        let colors = BoxColors {
            face: uv,
            bevel_light: [color[0], color[1], color[2], 1.0],
            ..BoxColors::NONE
        };
        Self::styled(rect, BoxStyle::Glyph, &colors)
    }

    pub fn style(&self) -> f32 {
        self.params[0]
    }
}

/// GPU side of the UI pass.
pub trait UiRenderer {
    fn upload_texture(
        &mut self,
        format: TextureFormat,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureId>;

    /// Draw `instances` in order with `texture` bound (or nothing bound).
    fn draw(&mut self, texture: Option<TextureId>, instances: &[BoxInstance]);
}

/// Fixed-capacity instance buffer. Flushes when full and whenever the bound
/// texture changes.
pub struct UiBatch<'r, R: UiRenderer + ?Sized> {
    renderer: &'r mut R,
    instances: Vec<BoxInstance>,
    bound: Option<TextureId>,
    /// Texture shared by all UI boxes and glyphs.
    atlas: Option<TextureId>,
    draw_calls: usize,
}

impl<'r, R: UiRenderer + ?Sized> UiBatch<'r, R> {
    pub fn new(renderer: &'r mut R, atlas: Option<TextureId>) -> Self {
        Self {
            renderer,
            instances: Vec::with_capacity(UI_BATCH_MAX),
            bound: atlas,
            atlas,
            draw_calls: 0,
        }
    }

    pub fn push(&mut self, instance: BoxInstance) {
        if self.instances.len() >= UI_BATCH_MAX {
            self.flush();
        }
        self.instances.push(instance);
    }

    pub fn flush(&mut self) {
        if self.instances.is_empty() {
            return;
        }
        tracing::trace!(
            count = self.instances.len(),
            texture = ?self.bound,
            "flushing ui batch"
        );
        self.renderer.draw(self.bound, &self.instances);
        self.instances.clear();
        self.draw_calls += 1;
    }

    pub fn bind(&mut self, texture: Option<TextureId>) {
        if self.bound != texture {
            self.flush();
            self.bound = texture;
        }
    }

    /// Go back to the shared atlas after drawing with another texture.
    pub fn rebind_atlas(&mut self) {
        let atlas = self.atlas;
        self.bind(atlas);
    }

    /// Draw one box with its own texture bound, then return to the atlas.
    pub fn blit(&mut self, texture: TextureId, rect: Rectangle<i32, Logical>) {
        self.bind(Some(texture));
        self.push(BoxInstance::textured(rect));
        self.flush();
        self.rebind_atlas();
    }

    pub fn has_atlas(&self) -> bool {
        self.atlas.is_some()
    }

    /// Flush what is left and report how many draw calls the frame took.
    pub fn finish(mut self) -> usize {
        self.flush();
        self.draw_calls
    }
}
