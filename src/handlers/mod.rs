//! Entry points the protocol side calls into.
//!
//! The shell implements these once; whatever owns the client connections
//! calls them as events arrive. Nothing here talks back to clients directly,
//! that goes through [`crate::backend::Backend`].

mod output;
mod toplevel;

use smithay::{
    backend::input::{AxisSource, ButtonState, KeyState},
    input::keyboard::{Keysym, ModifiersState},
    utils::{Logical, Point, Size},
};

use crate::{
    grabs::ResizeEdge,
    view::{DecorationMode, ViewId},
};

#[derive(Clone, Debug, PartialEq)]
pub enum PointerEvent {
    /// Relative motion from a mouse or touchpad.
    Motion {
        delta: Point<f64, Logical>,
        time: u32,
    },
    /// Absolute position in output coordinates (tablets, nested sessions).
    MotionAbsolute {
        location: Point<f64, Logical>,
        time: u32,
    },
    Button {
        button: u32,
        state: ButtonState,
        time: u32,
    },
    Axis(AxisEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AxisEvent {
    pub time: u32,
    pub source: AxisSource,
    pub horizontal: f64,
    pub vertical: f64,
    pub horizontal_v120: Option<f64>,
    pub vertical_v120: Option<f64>,
}

impl AxisEvent {
    pub fn negated(&self) -> Self {
        Self {
            time: self.time,
            source: self.source,
            horizontal: -self.horizontal,
            vertical: -self.vertical,
            horizontal_v120: self.horizontal_v120.map(|value| -value),
            vertical_v120: self.vertical_v120.map(|value| -value),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub keycode: u32,
    /// Symbols produced under the current modifier state.
    pub keysyms: Vec<Keysym>,
    pub state: KeyState,
    pub time: u32,
}

pub trait ToplevelHandler {
    /// A client created a toplevel. Returns the decoration mode the shell
    /// would like the client to use.
    fn new_toplevel(&mut self, id: ViewId, pid: Option<i32>) -> DecorationMode;
    fn decoration_negotiated(&mut self, id: ViewId, mode: DecorationMode);
    fn title_changed(&mut self, id: ViewId, title: &str);
    /// The client committed a buffer of `size` (window geometry, no
    /// decorations). `initial` marks the first commit before any configure.
    fn committed(&mut self, id: ViewId, size: Size<i32, Logical>, initial: bool);
    fn mapped(&mut self, id: ViewId);
    fn unmapped(&mut self, id: ViewId);
    fn destroyed(&mut self, id: ViewId);
    fn move_requested(&mut self, id: ViewId);
    fn resize_requested(&mut self, id: ViewId, edges: ResizeEdge);
    fn maximize_requested(&mut self, id: ViewId);
    fn fullscreen_requested(&mut self, id: ViewId, fullscreen: bool);
}

pub trait OutputHandler {
    fn output_resized(&mut self, size: Size<i32, Logical>);
}

pub trait InputHandler {
    fn on_pointer_event(&mut self, event: PointerEvent);
    fn on_key_event(&mut self, event: KeyEvent);
    fn on_modifiers(&mut self, modifiers: ModifiersState);
}
