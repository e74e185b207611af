#![allow(dead_code)]

use bevel::{
    Shell,
    backend::{
        headless::{BackendCall, HeadlessBackend},
        script::ScriptEvent,
    },
    config::RuntimeConfig,
    cursor::CursorImage,
    handlers::{InputHandler, KeyEvent, PointerEvent},
    input::BTN_LEFT,
    render::glyphs::{GlyphRasterizer, RasterGlyph},
    view::{DecorationMode, ViewId},
};
use smithay::{
    backend::input::{ButtonState, KeyState},
    input::keyboard::{Keysym, ModifiersState},
    utils::Size,
};

/// Solid 6x10 glyphs advancing 8 pixels; space has no ink.
pub struct BlockRasterizer;

impl GlyphRasterizer for BlockRasterizer {
    fn rasterize(&mut self, ch: char) -> Option<RasterGlyph> {
        if ch == ' ' {
            return Some(RasterGlyph {
                advance: 4,
                ..RasterGlyph::default()
            });
        }
        Some(RasterGlyph {
            width: 6,
            height: 10,
            bearing_x: 1,
            bearing_y: 10,
            advance: 8,
            coverage: vec![255; 60],
        })
    }
}

/// A shell on a 1920x1080 output with deterministic fonts and cursor.
pub fn shell() -> Shell<HeadlessBackend> {
    shell_with_config(RuntimeConfig::default())
}

pub fn shell_with_config(config: RuntimeConfig) -> Shell<HeadlessBackend> {
    Shell::new(HeadlessBackend::new(), config)
        .with_rasterizer(Box::new(BlockRasterizer))
        .with_cursor_image(CursorImage::fallback_arrow())
}

fn apply(shell: &mut Shell<HeadlessBackend>, event: ScriptEvent) {
    event.apply(shell, 0);
}

/// Map a server-decorated window of the given content size.
pub fn map(shell: &mut Shell<HeadlessBackend>, id: u64, size: (i32, i32), title: &str) -> ViewId {
    map_with(shell, id, size, title, DecorationMode::ServerSide)
}

pub fn map_with(
    shell: &mut Shell<HeadlessBackend>,
    id: u64,
    size: (i32, i32),
    title: &str,
    decoration: DecorationMode,
) -> ViewId {
    let id = ViewId::new(id);
    apply(
        shell,
        ScriptEvent::Map {
            id,
            size: Size::from(size),
            decoration,
            title: title.to_owned(),
            pid: None,
        },
    );
    id
}

pub fn commit(shell: &mut Shell<HeadlessBackend>, id: ViewId, size: (i32, i32)) {
    apply(shell, ScriptEvent::Commit(id, Size::from(size)));
}

pub fn warp(shell: &mut Shell<HeadlessBackend>, x: f64, y: f64) {
    shell.on_pointer_event(PointerEvent::MotionAbsolute {
        location: (x, y).into(),
        time: 0,
    });
}

pub fn left(shell: &mut Shell<HeadlessBackend>, state: ButtonState) {
    shell.on_pointer_event(PointerEvent::Button {
        button: BTN_LEFT,
        state,
        time: 0,
    });
}

pub fn click_at(shell: &mut Shell<HeadlessBackend>, x: f64, y: f64) {
    warp(shell, x, y);
    left(shell, ButtonState::Pressed);
    left(shell, ButtonState::Released);
}

pub fn modifiers(shell: &mut Shell<HeadlessBackend>, logo: bool, shift: bool) {
    shell.on_modifiers(ModifiersState {
        logo,
        shift,
        ..ModifiersState::default()
    });
}

pub fn press_key(shell: &mut Shell<HeadlessBackend>, keysym: Keysym) {
    for state in [KeyState::Pressed, KeyState::Released] {
        shell.on_key_event(KeyEvent {
            keycode: keysym.raw(),
            keysyms: vec![keysym],
            state,
            time: 0,
        });
    }
}

pub fn type_text(shell: &mut Shell<HeadlessBackend>, text: &str) {
    for ch in text.chars() {
        press_key(shell, Keysym::new(ch as u32));
    }
}

pub fn forwarded_keys(shell: &Shell<HeadlessBackend>) -> usize {
    shell
        .backend
        .calls()
        .iter()
        .filter(|call| matches!(call, BackendCall::ForwardKey(_)))
        .count()
}
