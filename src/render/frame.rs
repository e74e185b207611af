//! Per-frame composition: background, windows back to front, taskbar, find
//! overlay, cursor.

use smithay::utils::{Logical, Rectangle, Size};

use crate::{
    backend::Backend,
    config::RuntimeConfig,
    cursor::{CURSOR_BOX_SIZE, CursorImage},
    geometry::{BAR_HEIGHT, BAR_PADDING, TEXT_HEIGHT, TITLE_BUTTON_GAP, title_buttons},
    handlers::OutputHandler,
    input::Pressed,
    render::{
        BACKGROUND, BoxColors, BoxIcon, BoxInstance, BoxStyle, TextureFormat, TextureId, UiBatch,
        UiRenderer,
        glyphs::{CosmicTextRasterizer, GlyphAtlas, GlyphRasterizer, draw_text, measure_text},
    },
    state::Shell,
    taskbar::{TB_BTN_HEIGHT, TB_GAP, TB_PADDING, TaskbarButton, TaskbarKind},
    view::{View, ViewState},
};

const TEXT_COLOR: [f32; 3] = [0.0, 0.0, 0.0];
const HINT_COLOR: [f32; 3] = [0.5, 0.5, 0.5];
const TITLE_ICON_MARGIN: f32 = 4.0;
const STATUS_MAX_WIDTH: i32 = 400;
const STATUS_PADDING: i32 = 8;

pub const DIALOG_WIDTH: i32 = 400;
pub const DIALOG_PADDING: i32 = 8;
pub const DIALOG_INPUT_HEIGHT: i32 = 28;
pub const DIALOG_ITEM_HEIGHT: i32 = 24;
pub const DIALOG_VISIBLE_ITEMS: usize = 8;

enum AtlasState {
    Pending,
    Ready(GlyphAtlas),
    Unavailable,
}

/// GPU-side resources the UI pass creates on first use.
pub struct UiResources {
    atlas: AtlasState,
    rasterizer: Option<Box<dyn GlyphRasterizer>>,
    font_family: Option<String>,
    cursor_theme: String,
    cursor_size: u32,
    cursor_image: Option<CursorImage>,
    cursor_texture: Option<TextureId>,
    cursor_failed: bool,
}

impl UiResources {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            atlas: AtlasState::Pending,
            rasterizer: None,
            font_family: config.font_family.clone(),
            cursor_theme: config.cursor_theme.clone(),
            cursor_size: config.cursor_size,
            cursor_image: None,
            cursor_texture: None,
            cursor_failed: false,
        }
    }

    pub fn set_rasterizer(&mut self, rasterizer: Box<dyn GlyphRasterizer>) {
        self.rasterizer = Some(rasterizer);
    }

    pub fn set_cursor_image(&mut self, image: CursorImage) {
        self.cursor_image = Some(image);
        self.cursor_texture = None;
        self.cursor_failed = false;
    }

    /// Pick up cursor changes. The glyph atlas is fixed once built.
    pub fn apply_config(&mut self, config: &RuntimeConfig) {
        if matches!(self.atlas, AtlasState::Pending) {
            self.font_family = config.font_family.clone();
        }
        if config.cursor_theme != self.cursor_theme || config.cursor_size != self.cursor_size {
            self.cursor_theme = config.cursor_theme.clone();
            self.cursor_size = config.cursor_size;
            self.cursor_image = None;
            self.cursor_texture = None;
            self.cursor_failed = false;
        }
    }

    pub fn atlas(&self) -> Option<&GlyphAtlas> {
        match &self.atlas {
            AtlasState::Ready(atlas) => Some(atlas),
            AtlasState::Pending | AtlasState::Unavailable => None,
        }
    }

    pub fn cursor_texture(&self) -> Option<TextureId> {
        self.cursor_texture
    }

    fn prepare<R: UiRenderer + ?Sized>(&mut self, renderer: &mut R) {
        if matches!(self.atlas, AtlasState::Pending) {
            self.atlas = self.build_atlas(renderer);
        }
        if self.cursor_texture.is_none() && !self.cursor_failed {
            self.upload_cursor(renderer);
        }
    }

    fn build_atlas<R: UiRenderer + ?Sized>(&mut self, renderer: &mut R) -> AtlasState {
        let mut rasterizer = self.rasterizer.take().unwrap_or_else(|| {
            Box::new(CosmicTextRasterizer::new(self.font_family.clone()))
        });
        let Some(mut atlas) = GlyphAtlas::build(rasterizer.as_mut()) else {
            tracing::warn!("no usable font; text will not be drawn");
            return AtlasState::Unavailable;
        };
        drop(rasterizer);

        let (width, height) = atlas.size();
        match renderer.upload_texture(TextureFormat::Alpha8, width, height, atlas.pixels()) {
            Ok(texture) => {
                atlas.set_texture(texture);
                tracing::debug!(width, height, "glyph atlas ready");
                AtlasState::Ready(atlas)
            }
            Err(err) => {
                tracing::warn!("failed to upload glyph atlas: {err}");
                AtlasState::Unavailable
            }
        }
    }

    fn upload_cursor<R: UiRenderer + ?Sized>(&mut self, renderer: &mut R) {
        let (theme, size) = (&self.cursor_theme, self.cursor_size);
        let image = self
            .cursor_image
            .get_or_insert_with(|| CursorImage::load(theme, size));
        match renderer.upload_texture(
            TextureFormat::Rgba8,
            image.width,
            image.height,
            &image.pixels_rgba,
        ) {
            Ok(texture) => self.cursor_texture = Some(texture),
            Err(err) => {
                tracing::warn!("failed to upload cursor image: {err}");
                self.cursor_failed = true;
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FindDialogLayout {
    pub rect: Rectangle<i32, Logical>,
    pub content_x: i32,
    pub content_w: i32,
    pub input_y: i32,
    pub list_y: i32,
    pub item_stride: i32,
    pub text_inset: i32,
}

/// Dialog centred on the output, tall enough for `visible_items` rows (one
/// empty row when there are none).
pub fn find_dialog_layout(output: Size<i32, Logical>, visible_items: usize) -> FindDialogLayout {
    let rows = visible_items.max(1) as i32;
    let stride = DIALOG_ITEM_HEIGHT + TB_GAP;
    let list_h = rows * stride - if visible_items > 0 { TB_GAP } else { 0 };
    let h = DIALOG_PADDING + DIALOG_INPUT_HEIGHT + DIALOG_PADDING + list_h + DIALOG_PADDING;
    let x = (output.w - DIALOG_WIDTH) / 2;
    let y = (output.h - h) / 2;

    FindDialogLayout {
        rect: Rectangle::new((x, y).into(), (DIALOG_WIDTH, h).into()),
        content_x: x + DIALOG_PADDING,
        content_w: DIALOG_WIDTH - DIALOG_PADDING * 2,
        input_y: y + DIALOG_PADDING,
        list_y: y + DIALOG_PADDING + DIALOG_INPUT_HEIGHT + DIALOG_PADDING,
        item_stride: stride,
        text_inset: (DIALOG_ITEM_HEIGHT - TEXT_HEIGHT) / 2,
    }
}

fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Logical> {
    Rectangle::new((x, y).into(), (w, h).into())
}

impl<B: Backend> Shell<B> {
    /// Draw one frame for an output of `output_size`. Returns the number of
    /// draw calls issued.
    pub fn render_frame<R: UiRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        output_size: Size<i32, Logical>,
    ) -> usize {
        if output_size != self.output_size {
            self.output_resized(output_size);
        }

        self.ui.prepare(renderer);
        let status = self.status.status_line();
        let matches = if self.find.is_open() {
            let matches = self.find_matches();
            self.find.clamp_selection(matches.len());
            matches
        } else {
            Vec::new()
        };

        let atlas = self.ui.atlas();
        let mut batch = UiBatch::new(renderer, atlas.and_then(GlyphAtlas::texture));

        batch.push(BoxInstance::styled(
            rect(0, 0, output_size.w, output_size.h),
            BoxStyle::Flat,
            &BACKGROUND,
        ));

        let back_to_front: Vec<&View> = self.visible_views().collect();
        for view in back_to_front.into_iter().rev() {
            self.draw_view(&mut batch, atlas, view);
        }

        let fullscreen_focus = self
            .focused_view()
            .is_some_and(|view| view.state == ViewState::Fullscreen);
        if !fullscreen_focus {
            self.draw_taskbar(&mut batch, atlas, status.as_deref());
        }

        if self.find.is_open() {
            self.draw_find_overlay(&mut batch, atlas, &matches);
        }

        if let Some(texture) = self.ui.cursor_texture() {
            let (hot_x, hot_y) = self
                .ui
                .cursor_image
                .as_ref()
                .map_or((0, 0), CursorImage::box_hotspot);
            let location = self.pointer_location;
            batch.blit(
                texture,
                rect(
                    location.x as i32 - hot_x,
                    location.y as i32 - hot_y,
                    CURSOR_BOX_SIZE,
                    CURSOR_BOX_SIZE,
                ),
            );
        }

        let draw_calls = batch.finish();
        tracing::trace!(draw_calls, "frame rendered");
        draw_calls
    }

    fn draw_view<R: UiRenderer + ?Sized>(
        &self,
        batch: &mut UiBatch<'_, R>,
        atlas: Option<&GlyphAtlas>,
        view: &View,
    ) {
        let insets = view.insets();
        let content = view.effective_content_size();
        if insets.vertical() > 0 {
            self.draw_frame(batch, atlas, view);
        }

        if let Some(surface) = self.backend.surface_texture(view.id) {
            batch.blit(
                surface.texture,
                Rectangle::new(view.content_origin(), surface.size),
            );
        } else {
            tracing::trace!(view = %view.id, w = content.w, h = content.h, "no surface texture yet");
        }
    }

    fn draw_frame<R: UiRenderer + ?Sized>(
        &self,
        batch: &mut UiBatch<'_, R>,
        atlas: Option<&GlyphAtlas>,
        view: &View,
    ) {
        let insets = view.insets();
        let content = view.effective_content_size();
        let colors = if self.focused() == Some(view.id) {
            &BoxColors::FRAME_ACTIVE
        } else {
            &BoxColors::BUTTON
        };

        batch.push(BoxInstance::styled(view.frame_rect(), BoxStyle::Raised, colors));

        let buttons = title_buttons(view.position, content.w);
        for (button, button_rect) in buttons.iter() {
            let pressed = matches!(
                self.pressed(),
                Pressed::TitleButton { view: id, button: held } if *id == view.id && *held == button
            );
            let style = if pressed {
                BoxStyle::Sunken
            } else {
                BoxStyle::Raised
            };
            batch.push(BoxInstance::new(
                button_rect,
                style,
                colors,
                BoxIcon::from(button),
                TITLE_ICON_MARGIN,
            ));
        }

        let title = view.display_title();
        if title.is_empty() {
            return;
        }
        let max_width = content.w - (buttons.size() + TITLE_BUTTON_GAP) * 3 - TITLE_BUTTON_GAP - 8;
        if max_width < 1 {
            return;
        }
        let title_h = insets.top - BAR_PADDING * 2;
        draw_text(
            batch,
            atlas,
            &title,
            max_width,
            TEXT_COLOR,
            view.position.x + insets.left + 4,
            view.position.y + BAR_PADDING + (title_h - TEXT_HEIGHT) / 2,
        );
    }

    fn taskbar_label(&self, button: &TaskbarButton) -> String {
        match button.kind {
            TaskbarKind::Start => "Start".to_owned(),
            TaskbarKind::Find => "?".to_owned(),
            TaskbarKind::Workspace(workspace) => workspace.to_string(),
            TaskbarKind::Window(id) => self
                .view(id)
                .map(View::display_title)
                .unwrap_or_default(),
        }
    }

    fn draw_taskbar<R: UiRenderer + ?Sized>(
        &self,
        batch: &mut UiBatch<'_, R>,
        atlas: Option<&GlyphAtlas>,
        status: Option<&str>,
    ) {
        let output = self.output_size;
        let bar_y = output.h - BAR_HEIGHT;
        let button_y = bar_y + TB_PADDING;
        let text_y = button_y + (TB_BTN_HEIGHT - TEXT_HEIGHT) / 2;

        batch.push(BoxInstance::styled(
            rect(0, bar_y, output.w, BAR_HEIGHT),
            BoxStyle::Raised,
            &BoxColors::TASKBAR,
        ));

        for button in self.taskbar_buttons() {
            let style = if button.sunken {
                BoxStyle::Sunken
            } else {
                BoxStyle::Raised
            };
            batch.push(BoxInstance::styled(
                button.rect(output),
                style,
                &BoxColors::BUTTON,
            ));

            let label = self.taskbar_label(&button);
            let max_width = button.width - 8;
            if label.is_empty() || max_width <= 0 {
                continue;
            }
            let width = measure_text(atlas, &label, max_width);
            draw_text(
                batch,
                atlas,
                &label,
                max_width,
                TEXT_COLOR,
                button.x + (button.width - width) / 2,
                text_y,
            );
        }

        let Some(status) = status.filter(|status| !status.is_empty()) else {
            return;
        };
        let width = measure_text(atlas, status, STATUS_MAX_WIDTH);
        let x = output.w - width - STATUS_PADDING;
        batch.push(BoxInstance::styled(
            rect(x - 4, button_y, width + 8, TB_BTN_HEIGHT),
            BoxStyle::Sunken,
            &BoxColors::BUTTON,
        ));
        draw_text(batch, atlas, status, STATUS_MAX_WIDTH, TEXT_COLOR, x, text_y);
    }

    fn draw_find_overlay<R: UiRenderer + ?Sized>(
        &self,
        batch: &mut UiBatch<'_, R>,
        atlas: Option<&GlyphAtlas>,
        matches: &[crate::view::ViewId],
    ) {
        let visible = matches.len().min(DIALOG_VISIBLE_ITEMS);
        let layout = find_dialog_layout(self.output_size, visible);
        let text_width = layout.content_w - 8;
        let text_x = layout.content_x + 4;

        batch.push(BoxInstance::styled(
            layout.rect,
            BoxStyle::Raised,
            &BoxColors::BUTTON,
        ));
        batch.push(BoxInstance::styled(
            rect(
                layout.content_x,
                layout.input_y,
                layout.content_w,
                DIALOG_INPUT_HEIGHT,
            ),
            BoxStyle::Sunken,
            &BoxColors::BUTTON,
        ));

        let input = format!("{}|", self.find.query());
        draw_text(
            batch,
            atlas,
            &input,
            text_width,
            TEXT_COLOR,
            text_x,
            layout.input_y + (DIALOG_INPUT_HEIGHT - TEXT_HEIGHT) / 2,
        );

        for (index, id) in matches.iter().take(visible).enumerate() {
            let row_y = layout.list_y + index as i32 * layout.item_stride;
            let style = if index == self.find.selected() {
                BoxStyle::Sunken
            } else {
                BoxStyle::Raised
            };
            batch.push(BoxInstance::styled(
                rect(layout.content_x, row_y, layout.content_w, DIALOG_ITEM_HEIGHT),
                style,
                &BoxColors::BUTTON,
            ));
            let title = self.view(*id).map(View::display_title).unwrap_or_default();
            draw_text(
                batch,
                atlas,
                &title,
                text_width,
                TEXT_COLOR,
                text_x,
                row_y + layout.text_inset,
            );
        }

        if matches.is_empty() && !self.find.query().is_empty() {
            draw_text(
                batch,
                atlas,
                "No windows found",
                text_width,
                HINT_COLOR,
                text_x,
                layout.list_y + layout.text_inset,
            );
        }
    }
}

impl From<crate::geometry::TitleButton> for BoxIcon {
    fn from(button: crate::geometry::TitleButton) -> Self {
        match button {
            crate::geometry::TitleButton::Minimize => BoxIcon::Minimize,
            crate::geometry::TitleButton::Maximize => BoxIcon::Maximize,
            crate::geometry::TitleButton::Close => BoxIcon::Close,
        }
    }
}
