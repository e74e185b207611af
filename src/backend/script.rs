//! Line-oriented session scripts for the headless backend.
//!
//! One event per line, `#` starts a comment:
//!
//! ```text
//! output 1920 1080
//! map 1 800 600 ssd Terminal 42
//! mods logo
//! key Left press
//! warp 600 240
//! button left press
//! frame
//! ```

use smithay::{
    backend::input::{AxisSource, ButtonState, KeyState},
    input::keyboard::{Keysym, ModifiersState},
    utils::{Logical, Point, Size},
};

use crate::{
    ShellError,
    backend::{
        SurfaceTexture,
        headless::{HeadlessBackend, HeadlessRenderer},
    },
    errors::Result,
    grabs::ResizeEdge,
    handlers::{AxisEvent, InputHandler, KeyEvent, OutputHandler, PointerEvent, ToplevelHandler},
    input::BTN_LEFT,
    render::TextureId,
    state::Shell,
    view::{DecorationMode, ViewId},
};

const BTN_RIGHT: u32 = 0x111;
const BTN_MIDDLE: u32 = 0x112;
/// Surface textures are numbered above anything the renderer hands out.
const SURFACE_TEXTURE_BASE: u64 = 1 << 32;

#[derive(Clone, Debug, PartialEq)]
pub enum ScriptEvent {
    Output(Size<i32, Logical>),
    Map {
        id: ViewId,
        size: Size<i32, Logical>,
        decoration: DecorationMode,
        title: String,
        pid: Option<i32>,
    },
    Title(ViewId, String),
    Commit(ViewId, Size<i32, Logical>),
    Unmap(ViewId),
    Destroy(ViewId),
    RequestMove(ViewId),
    RequestResize(ViewId, ResizeEdge),
    RequestMaximize(ViewId),
    RequestFullscreen(ViewId, bool),
    Motion(Point<f64, Logical>),
    Warp(Point<f64, Logical>),
    Button(u32, ButtonState),
    Scroll(f64, f64),
    Key(Keysym, KeyState),
    Modifiers(ModifiersState),
    Frame,
    Clients,
}

/// What the driver should do once an event has been applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptOutcome {
    Continue,
    /// Render a frame now.
    Render,
    Print(String),
}

fn invalid(line: &str, reason: impl std::fmt::Display) -> ShellError {
    ShellError::Backend(format!("invalid script line `{line}`: {reason}"))
}

fn number<T: std::str::FromStr>(line: &str, token: Option<&str>, what: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let token = token.ok_or_else(|| invalid(line, format!("missing {what}")))?;
    token
        .parse()
        .map_err(|err| invalid(line, format!("bad {what} `{token}`: {err}")))
}

fn view_id(line: &str, token: Option<&str>) -> Result<ViewId> {
    number::<u64>(line, token, "view id").map(ViewId::new)
}

fn size(line: &str, w: Option<&str>, h: Option<&str>) -> Result<Size<i32, Logical>> {
    let w: i32 = number(line, w, "width")?;
    let h: i32 = number(line, h, "height")?;
    if w < 0 || h < 0 {
        return Err(invalid(line, "sizes must not be negative"));
    }
    Ok(Size::from((w, h)))
}

fn point(line: &str, x: Option<&str>, y: Option<&str>) -> Result<Point<f64, Logical>> {
    let x: f64 = number(line, x, "x")?;
    let y: f64 = number(line, y, "y")?;
    Ok(Point::from((x, y)))
}

fn pressed(line: &str, token: Option<&str>) -> Result<bool> {
    match token {
        Some("press" | "down" | "on") => Ok(true),
        Some("release" | "up" | "off") => Ok(false),
        Some(other) => Err(invalid(line, format!("expected press/release, got `{other}`"))),
        None => Err(invalid(line, "missing press/release")),
    }
}

/// Keysym for a script key name: a single printable character or one of the
/// named keys the shell reacts to.
pub fn keysym_from_name(name: &str) -> Option<Keysym> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return (ch.is_ascii_graphic()).then(|| Keysym::new(ch as u32));
    }

    let keysym = match name.to_ascii_lowercase().as_str() {
        "return" | "enter" => Keysym::Return,
        "kp_enter" => Keysym::KP_Enter,
        "escape" | "esc" => Keysym::Escape,
        "backspace" => Keysym::BackSpace,
        "tab" => Keysym::Tab,
        "space" => Keysym::space,
        "left" => Keysym::Left,
        "right" => Keysym::Right,
        "up" => Keysym::Up,
        "down" => Keysym::Down,
        "brightnessup" | "xf86monbrightnessup" => Keysym::XF86_MonBrightnessUp,
        "brightnessdown" | "xf86monbrightnessdown" => Keysym::XF86_MonBrightnessDown,
        _ => return None,
    };
    Some(keysym)
}

impl ScriptEvent {
    /// `Ok(None)` for blank and comment lines.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            return Ok(None);
        }

        let mut tokens = content.split_whitespace();
        let Some(command) = tokens.next() else {
            return Ok(None);
        };

        let event = match command {
            "output" => ScriptEvent::Output(size(line, tokens.next(), tokens.next())?),
            "map" => {
                let id = view_id(line, tokens.next())?;
                let size = size(line, tokens.next(), tokens.next())?;
                let decoration = match tokens.next() {
                    Some("ssd") => DecorationMode::ServerSide,
                    Some("csd") => DecorationMode::ClientSide,
                    Some(other) => {
                        return Err(invalid(line, format!("expected ssd/csd, got `{other}`")));
                    }
                    None => return Err(invalid(line, "missing decoration mode")),
                };
                let title = tokens.next().unwrap_or_default().to_owned();
                let pid = tokens
                    .next()
                    .map(|token| number(line, Some(token), "pid"))
                    .transpose()?;
                ScriptEvent::Map {
                    id,
                    size,
                    decoration,
                    title,
                    pid,
                }
            }
            "title" => {
                let id = view_id(line, tokens.next())?;
                ScriptEvent::Title(id, tokens.collect::<Vec<_>>().join(" "))
            }
            "commit" => {
                let id = view_id(line, tokens.next())?;
                ScriptEvent::Commit(id, size(line, tokens.next(), tokens.next())?)
            }
            "unmap" => ScriptEvent::Unmap(view_id(line, tokens.next())?),
            "destroy" => ScriptEvent::Destroy(view_id(line, tokens.next())?),
            "request-move" => ScriptEvent::RequestMove(view_id(line, tokens.next())?),
            "request-resize" => {
                let id = view_id(line, tokens.next())?;
                let edges: u32 = number(line, tokens.next(), "resize edge")?;
                ScriptEvent::RequestResize(id, ResizeEdge::from_protocol(edges))
            }
            "request-maximize" => ScriptEvent::RequestMaximize(view_id(line, tokens.next())?),
            "request-fullscreen" => {
                let id = view_id(line, tokens.next())?;
                ScriptEvent::RequestFullscreen(id, pressed(line, tokens.next())?)
            }
            "motion" => ScriptEvent::Motion(point(line, tokens.next(), tokens.next())?),
            "warp" => ScriptEvent::Warp(point(line, tokens.next(), tokens.next())?),
            "button" => {
                let button = match tokens.next() {
                    Some("left") => BTN_LEFT,
                    Some("right") => BTN_RIGHT,
                    Some("middle") => BTN_MIDDLE,
                    Some(other) => number(line, Some(other), "button")?,
                    None => return Err(invalid(line, "missing button")),
                };
                let state = if pressed(line, tokens.next())? {
                    ButtonState::Pressed
                } else {
                    ButtonState::Released
                };
                ScriptEvent::Button(button, state)
            }
            "scroll" => {
                let dx: f64 = number(line, tokens.next(), "dx")?;
                let dy: f64 = number(line, tokens.next(), "dy")?;
                ScriptEvent::Scroll(dx, dy)
            }
            "key" => {
                let name = tokens
                    .next()
                    .ok_or_else(|| invalid(line, "missing key name"))?;
                let keysym =
                    keysym_from_name(name).ok_or_else(|| invalid(line, "unknown key name"))?;
                let state = if pressed(line, tokens.next())? {
                    KeyState::Pressed
                } else {
                    KeyState::Released
                };
                ScriptEvent::Key(keysym, state)
            }
            "mods" => {
                let mut modifiers = ModifiersState::default();
                for token in tokens {
                    match token {
                        "none" => {}
                        "shift" => modifiers.shift = true,
                        "ctrl" => modifiers.ctrl = true,
                        "alt" => modifiers.alt = true,
                        "logo" | "super" => modifiers.logo = true,
                        other => return Err(invalid(line, format!("unknown modifier `{other}`"))),
                    }
                }
                ScriptEvent::Modifiers(modifiers)
            }
            "frame" => ScriptEvent::Frame,
            "clients" => ScriptEvent::Clients,
            other => return Err(invalid(line, format!("unknown command `{other}`"))),
        };
        Ok(Some(event))
    }

    /// Feed the event into `shell` at timestamp `time` (milliseconds).
    pub fn apply(self, shell: &mut Shell<HeadlessBackend>, time: u32) -> ScriptOutcome {
        match self {
            ScriptEvent::Output(size) => shell.output_resized(size),
            ScriptEvent::Map {
                id,
                size,
                decoration,
                title,
                pid,
            } => {
                shell.new_toplevel(id, pid);
                shell.decoration_negotiated(id, decoration);
                shell.title_changed(id, &title);
                shell.committed(id, Size::from((0, 0)), true);
                commit(shell, id, size);
                shell.mapped(id);
            }
            ScriptEvent::Title(id, title) => shell.title_changed(id, &title),
            ScriptEvent::Commit(id, size) => commit(shell, id, size),
            ScriptEvent::Unmap(id) => shell.unmapped(id),
            ScriptEvent::Destroy(id) => {
                shell.backend.remove_surface(id);
                shell.destroyed(id);
            }
            ScriptEvent::RequestMove(id) => shell.move_requested(id),
            ScriptEvent::RequestResize(id, edges) => shell.resize_requested(id, edges),
            ScriptEvent::RequestMaximize(id) => shell.maximize_requested(id),
            ScriptEvent::RequestFullscreen(id, fullscreen) => {
                shell.fullscreen_requested(id, fullscreen)
            }
            ScriptEvent::Motion(delta) => {
                shell.on_pointer_event(PointerEvent::Motion { delta, time })
            }
            ScriptEvent::Warp(location) => {
                shell.on_pointer_event(PointerEvent::MotionAbsolute { location, time })
            }
            ScriptEvent::Button(button, state) => shell.on_pointer_event(PointerEvent::Button {
                button,
                state,
                time,
            }),
            ScriptEvent::Scroll(horizontal, vertical) => {
                shell.on_pointer_event(PointerEvent::Axis(AxisEvent {
                    time,
                    source: AxisSource::Wheel,
                    horizontal,
                    vertical,
                    horizontal_v120: None,
                    vertical_v120: None,
                }))
            }
            ScriptEvent::Key(keysym, state) => shell.on_key_event(KeyEvent {
                keycode: keysym.raw(),
                keysyms: vec![keysym],
                state,
                time,
            }),
            ScriptEvent::Modifiers(modifiers) => shell.on_modifiers(modifiers),
            ScriptEvent::Frame => return ScriptOutcome::Render,
            ScriptEvent::Clients => return ScriptOutcome::Print(shell.render_clients_report()),
        }
        ScriptOutcome::Continue
    }
}

/// A client commit: the surface texture follows the new buffer size.
fn commit(shell: &mut Shell<HeadlessBackend>, id: ViewId, size: Size<i32, Logical>) {
    if shell.view(id).is_none() {
        return;
    }
    shell.backend.set_surface(
        id,
        SurfaceTexture {
            texture: TextureId(SURFACE_TEXTURE_BASE + id.get()),
            size,
        },
    );
    shell.committed(id, size, false);
}

/// Parse a whole script, stopping at the first bad line.
pub fn parse_script(source: &str) -> Result<Vec<ScriptEvent>> {
    source
        .lines()
        .filter_map(|line| ScriptEvent::parse(line).transpose())
        .collect()
}

/// Apply `events` in order, rendering into `renderer` on every `frame`.
/// Returns whatever the script asked to print.
pub fn run_script(
    shell: &mut Shell<HeadlessBackend>,
    renderer: &mut HeadlessRenderer,
    events: impl IntoIterator<Item = ScriptEvent>,
) -> Vec<String> {
    let mut printed = Vec::new();
    for (time, event) in (0u32..).step_by(16).zip(events) {
        match event.apply(shell, time) {
            ScriptOutcome::Continue => {}
            ScriptOutcome::Render => {
                let output = shell.output_size;
                shell.render_frame(renderer, output);
            }
            ScriptOutcome::Print(text) => printed.push(text),
        }
    }
    printed
}
