pub mod headless;
pub mod script;

use std::process::Command;

use smithay::{
    backend::input::ButtonState,
    input::keyboard::ModifiersState,
    utils::{Logical, Point, Size},
};

use crate::{
    handlers::{AxisEvent, KeyEvent},
    render::TextureId,
    view::ViewId,
};

/// Client content ready to be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceTexture {
    pub texture: TextureId,
    pub size: Size<i32, Logical>,
}

/// The protocol side of the shell: everything that talks to clients, seats
/// and outputs. The shell core calls into it only to request geometry or
/// focus changes, to forward input it did not consume, and to look up
/// surface textures while drawing.
pub trait Backend {
    fn request_size(&mut self, view: ViewId, size: Size<i32, Logical>);
    fn set_maximized(&mut self, view: ViewId, maximized: bool);
    fn set_fullscreen(&mut self, view: ViewId, fullscreen: bool);
    fn set_activated(&mut self, view: ViewId, activated: bool);
    fn send_close(&mut self, view: ViewId);

    fn keyboard_focus(&mut self, view: Option<ViewId>);
    fn forward_key(&mut self, event: &KeyEvent);
    fn forward_modifiers(&mut self, modifiers: ModifiersState);

    /// Pointer is over `view` content at the given surface-local location, or
    /// over nothing a client cares about.
    fn pointer_focus(&mut self, target: Option<(ViewId, Point<f64, Logical>)>, time: u32);
    fn pointer_button(&mut self, button: u32, state: ButtonState, time: u32);
    fn pointer_axis(&mut self, event: &AxisEvent);

    fn surface_texture(&self, view: ViewId) -> Option<SurfaceTexture>;

    fn spawn(&mut self, command: &str) {
        spawn_command(command);
    }

    fn quit(&mut self);
}

pub fn spawn_command(command: &str) {
    if command.trim().is_empty() {
        return;
    }

    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    apply_child_env(&mut cmd);

    match cmd.spawn() {
        Ok(child) => tracing::debug!(command, pid = child.id(), "spawned command"),
        Err(err) => tracing::warn!(command, "failed to spawn command: {err}"),
    }
}

fn apply_child_env(cmd: &mut Command) {
    if let Some(runtime_dir) = std::env::var_os("XDG_RUNTIME_DIR") {
        cmd.env("XDG_RUNTIME_DIR", runtime_dir);
    }
    cmd.env("XDG_SESSION_TYPE", "wayland");
    cmd.env("XDG_CURRENT_DESKTOP", "bevel");
    cmd.env("XDG_SESSION_DESKTOP", "bevel");
    cmd.env("MOZ_ENABLE_WAYLAND", "1");
    cmd.env("GDK_BACKEND", "wayland");
    cmd.env("QT_QPA_PLATFORM", "wayland");
    cmd.env("SDL_VIDEODRIVER", "wayland");
    cmd.env_remove("DISPLAY");
}
