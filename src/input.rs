use smithay::{
    backend::input::{ButtonState, KeyState},
    input::keyboard::{Keysym, ModifiersState},
    utils::{Logical, Point},
};

use crate::{
    action::Action,
    backend::Backend,
    geometry::{Direction, TitleButton, title_buttons},
    grabs::{Grab, GrabUpdate, ResizeEdge},
    handlers::{InputHandler, KeyEvent, PointerEvent},
    state::Shell,
    taskbar::TaskbarButton,
    view::{ViewId, ViewState},
    workspace::WorkspaceId,
};

/// `BTN_LEFT` from linux/input-event-codes.h.
pub const BTN_LEFT: u32 = 0x110;

/// What the last button press landed on, held until the release decides
/// whether it counts as a click.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pressed {
    #[default]
    None,
    TitleButton {
        view: ViewId,
        button: TitleButton,
    },
    Taskbar(TaskbarButton),
}

impl Pressed {
    pub fn references(&self, id: ViewId) -> bool {
        match self {
            Pressed::None => false,
            Pressed::TitleButton { view, .. } => *view == id,
            Pressed::Taskbar(button) => {
                button.kind == crate::taskbar::TaskbarKind::Window(id)
            }
        }
    }

    /// Same widget as `other`: same view and icon, or same taskbar button.
    fn same_target(&self, other: &Pressed) -> bool {
        match (self, other) {
            (
                Pressed::TitleButton { view, button },
                Pressed::TitleButton {
                    view: other_view,
                    button: other_button,
                },
            ) => view == other_view && button == other_button,
            (Pressed::Taskbar(button), Pressed::Taskbar(other)) => button.kind == other.kind,
            (Pressed::None, _) | (Pressed::TitleButton { .. }, _) | (Pressed::Taskbar(_), _) => {
                false
            }
        }
    }
}

/// Result of a screen hit test, in precedence order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitTarget {
    Content {
        view: ViewId,
        /// Surface-local position.
        local: Point<f64, Logical>,
    },
    TitleButton {
        view: ViewId,
        button: TitleButton,
    },
    Decoration(ViewId),
    Taskbar(TaskbarButton),
    Desktop,
}

impl HitTarget {
    fn as_pressed(&self) -> Pressed {
        match *self {
            HitTarget::TitleButton { view, button } => Pressed::TitleButton { view, button },
            HitTarget::Taskbar(button) => Pressed::Taskbar(button),
            HitTarget::Content { .. } | HitTarget::Decoration(_) | HitTarget::Desktop => {
                Pressed::None
            }
        }
    }
}

impl<B: Backend> Shell<B> {
    /// Topmost visible view under `location`, content before frame.
    pub fn view_at(&self, location: Point<f64, Logical>) -> Option<HitTarget> {
        for view in self.visible_views() {
            let content = view.content_rect();
            if content.to_f64().contains(location) {
                return Some(HitTarget::Content {
                    view: view.id,
                    local: location - content.loc.to_f64(),
                });
            }

            if !view.frame_rect().to_f64().contains(location) {
                continue;
            }
            if view.insets().has_title_bar() {
                let buttons = title_buttons(view.position, view.effective_content_size().w);
                if let Some(button) = buttons.hit(location) {
                    return Some(HitTarget::TitleButton {
                        view: view.id,
                        button,
                    });
                }
            }
            return Some(HitTarget::Decoration(view.id));
        }
        None
    }

    /// Views first, then the taskbar, then the empty desktop.
    pub fn hit_test(&self, location: Point<f64, Logical>) -> HitTarget {
        if let Some(target) = self.view_at(location) {
            return target;
        }
        match self.taskbar_hit(location) {
            Some(button) => HitTarget::Taskbar(button),
            None => HitTarget::Desktop,
        }
    }

    /// Start an interactive move (no edges) or resize of `id` from the
    /// current pointer position. Leaves maximize and fullscreen.
    pub fn begin_grab(&mut self, id: ViewId, edges: ResizeEdge) {
        let Some(view) = self.view_mut(id) else {
            return;
        };
        view.target_size = None;
        if view.state != ViewState::Normal {
            self.set_state(id, ViewState::Normal);
        }

        let Some(view) = self.view(id) else {
            return;
        };
        let cursor = self.pointer_location;
        let grab = if edges.is_empty() {
            Grab::start_move(id, cursor, view.position, view.frame_size())
        } else {
            Grab::start_resize(id, edges, cursor, view.position, view.frame_size())
        };
        tracing::debug!(view = %id, ?edges, "grab started");
        self.grab = Some(grab);
    }

    fn apply_grab(&mut self, grab: Grab) {
        let update = grab.motion(self.pointer_location);
        let Some(view) = self.view_mut(grab.view) else {
            self.grab = None;
            return;
        };
        match update {
            GrabUpdate::Move { position } => view.position = position,
            GrabUpdate::Resize {
                position,
                frame_size,
            } => {
                let size = view.insets().inner(frame_size);
                view.position = position;
                view.target_size = Some(size);
                self.backend.request_size(grab.view, size);
            }
        }
    }

    fn wrap_or_clamp_pointer(&mut self) {
        let max_x = f64::from((self.output_size.w - 1).max(0));
        let max_y = f64::from((self.output_size.h - 1).max(0));
        let location = &mut self.pointer_location;

        if self.config.cursor_wrap {
            if location.x <= 0.0 {
                location.x = max_x;
            } else if location.x >= max_x {
                location.x = 0.0;
            }
            if location.y <= 0.0 {
                location.y = max_y;
            } else if location.y >= max_y {
                location.y = 0.0;
            }
        } else {
            location.x = location.x.clamp(0.0, max_x);
            location.y = location.y.clamp(0.0, max_y);
        }
    }

    fn handle_pointer_motion(&mut self, time: u32) {
        if let Some(grab) = self.grab {
            self.apply_grab(grab);
            return;
        }

        let target = match self.view_at(self.pointer_location) {
            Some(HitTarget::Content { view, local }) => Some((view, local)),
            _ => None,
        };
        self.backend.pointer_focus(target, time);
    }

    fn handle_pointer_button(&mut self, button: u32, state: ButtonState, time: u32) {
        match state {
            ButtonState::Pressed => self.handle_button_press(button, time),
            ButtonState::Released => self.handle_button_release(button, time),
        }
    }

    fn handle_button_press(&mut self, button: u32, time: u32) {
        if self.find.is_open() {
            tracing::trace!("click consumed by find overlay");
            return;
        }

        let location = self.pointer_location;
        let target = self.hit_test(location);
        tracing::debug!(?target, button, "button press");

        match target {
            HitTarget::Content { view, local } => {
                self.focus_view(view);
                self.backend.pointer_focus(Some((view, local)), time);
            }
            HitTarget::TitleButton { view, .. } if button == BTN_LEFT => {
                self.focus_view(view);
                self.pressed = target.as_pressed();
                return;
            }
            HitTarget::Decoration(view) if button == BTN_LEFT => {
                self.focus_view(view);
                self.begin_grab(view, ResizeEdge::empty());
                return;
            }
            HitTarget::Taskbar(_) if button == BTN_LEFT => {
                self.pressed = target.as_pressed();
                return;
            }
            HitTarget::TitleButton { view, .. } | HitTarget::Decoration(view) => {
                self.focus_view(view);
                return;
            }
            HitTarget::Taskbar(_) => return,
            HitTarget::Desktop => self.backend.pointer_focus(None, time),
        }

        self.backend
            .pointer_button(button, ButtonState::Pressed, time);
    }

    fn handle_button_release(&mut self, button: u32, time: u32) {
        if self.grab.take().is_some() {
            tracing::debug!("grab ended");
        }
        let pressed = std::mem::take(&mut self.pressed);

        if pressed != Pressed::None && !self.find.is_open() {
            let released = self.hit_test(self.pointer_location).as_pressed();
            if pressed.same_target(&released) {
                self.click(pressed);
            } else {
                tracing::debug!(?pressed, ?released, "press and release targets differ");
            }
        }

        self.backend
            .pointer_button(button, ButtonState::Released, time);
    }

    fn click(&mut self, pressed: Pressed) {
        match pressed {
            Pressed::None => {}
            Pressed::TitleButton { view, button } => match button {
                TitleButton::Minimize => self.minimize(view),
                TitleButton::Maximize => self.toggle(view, ViewState::Maximized),
                TitleButton::Close => {
                    tracing::info!(view = %view, "close button clicked");
                    self.backend.send_close(view);
                }
            },
            Pressed::Taskbar(button) => self.activate_taskbar_button(button.kind),
        }
    }

    fn action_for_key(&self, keysym: Keysym) -> Option<Action> {
        if let Some(action) = self.config.keybind_action_for(&self.modifiers, keysym) {
            return Some(action.into());
        }

        if !self.config.main_key.matches(&self.modifiers) {
            return None;
        }

        if let Some(workspace) = WorkspaceId::from_keysym(keysym) {
            return Some(if self.modifiers.shift {
                Action::MoveFocusedToWorkspace(workspace)
            } else {
                Action::SwitchWorkspace(workspace)
            });
        }

        snap_direction(keysym).map(Action::Snap)
    }

    /// True when the press was consumed and must not reach the client.
    fn handle_key_press(&mut self, keysyms: &[Keysym]) -> bool {
        let main_held = self.config.main_key.matches(&self.modifiers);
        for &keysym in keysyms {
            if snap_direction(keysym).is_none()
                && !keysym.is_modifier_key()
                && self.snap_chord.take().is_some()
            {
                tracing::trace!(?keysym, "snap chord broken");
            }

            if let Some(delta) = brightness_delta(keysym) {
                Action::AdjustBrightness(delta).execute(self);
                return true;
            }

            if self.find.is_open() && self.handle_find_key(keysym, main_held) {
                return true;
            }

            if let Some(action) = self.action_for_key(keysym) {
                action.execute(self);
                return true;
            }
        }
        false
    }
}

impl<B: Backend> InputHandler for Shell<B> {
    fn on_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Motion { delta, time } => {
                self.pointer_location += delta;
                self.wrap_or_clamp_pointer();
                self.handle_pointer_motion(time);
            }
            PointerEvent::MotionAbsolute { location, time } => {
                self.pointer_location = location;
                self.handle_pointer_motion(time);
            }
            PointerEvent::Button {
                button,
                state,
                time,
            } => self.handle_pointer_button(button, state, time),
            PointerEvent::Axis(axis) => {
                let axis = if self.config.natural_scroll {
                    axis.negated()
                } else {
                    axis
                };
                self.backend.pointer_axis(&axis);
            }
        }
    }

    fn on_key_event(&mut self, event: KeyEvent) {
        if event.state == KeyState::Pressed && self.handle_key_press(&event.keysyms) {
            return;
        }
        if !self.find.is_open() {
            self.backend.forward_key(&event);
        }
    }

    fn on_modifiers(&mut self, modifiers: ModifiersState) {
        self.modifiers = modifiers;
        if !self.config.main_key.matches(&modifiers) && self.snap_chord.take().is_some() {
            tracing::trace!("snap chord cleared");
        }
        self.backend.forward_modifiers(modifiers);
    }
}

fn snap_direction(keysym: Keysym) -> Option<Direction> {
    match keysym {
        Keysym::Left => Some(Direction::Left),
        Keysym::Right => Some(Direction::Right),
        Keysym::Up => Some(Direction::Up),
        Keysym::Down => Some(Direction::Down),
        _ => None,
    }
}

fn brightness_delta(keysym: Keysym) -> Option<i32> {
    match keysym {
        Keysym::XF86_MonBrightnessUp => Some(1),
        Keysym::XF86_MonBrightnessDown => Some(-1),
        _ => None,
    }
}
