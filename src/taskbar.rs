//! Taskbar layout and hit-testing.
//!
//! Buttons are rebuilt from the model on every frame and every click, so the
//! drawn bar and the clickable bar can never disagree.

use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::{
    backend::Backend,
    geometry::BAR_HEIGHT,
    input::Pressed,
    state::Shell,
    view::{ViewId, ViewState},
    workspace::WorkspaceId,
};

pub const TB_START_W: i32 = 60;
pub const TB_WS_W: i32 = 24;
pub const TB_WIN_W: i32 = 120;
pub const TB_PADDING: i32 = 3;
pub const TB_GAP: i32 = 2;
pub const TB_BTN_HEIGHT: i32 = BAR_HEIGHT - TB_PADDING * 2;
pub const TB_BTN_MAX: usize = 42;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskbarKind {
    Start,
    Find,
    Workspace(WorkspaceId),
    Window(ViewId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskbarButton {
    pub x: i32,
    pub width: i32,
    pub kind: TaskbarKind,
    /// Drawn pushed in: active workspace, focused window, open overlay, or
    /// currently held down.
    pub sunken: bool,
}

impl TaskbarButton {
    pub fn rect(&self, output: Size<i32, Logical>) -> Rectangle<i32, Logical> {
        Rectangle::new(
            (self.x, button_top(output)).into(),
            (self.width, TB_BTN_HEIGHT).into(),
        )
    }
}

/// Model state the layout depends on.
#[derive(Clone, Copy, Debug)]
pub struct TaskbarState {
    pub current_workspace: WorkspaceId,
    pub focused: Option<ViewId>,
    pub find_open: bool,
    pub pressed: Option<TaskbarKind>,
}

pub fn button_top(output: Size<i32, Logical>) -> i32 {
    output.h - BAR_HEIGHT + TB_PADDING
}

/// Lay out start, find, the nine workspaces, then one button per window of
/// the current workspace until the bar runs out of room.
pub fn layout(
    state: &TaskbarState,
    windows: impl IntoIterator<Item = ViewId>,
    max_x: i32,
) -> Vec<TaskbarButton> {
    let pressed = |kind: TaskbarKind| state.pressed == Some(kind);
    let mut buttons = Vec::with_capacity(TB_BTN_MAX);
    let mut x = TB_PADDING;

    buttons.push(TaskbarButton {
        x,
        width: TB_START_W,
        kind: TaskbarKind::Start,
        sunken: pressed(TaskbarKind::Start),
    });
    x += TB_START_W + TB_GAP;

    buttons.push(TaskbarButton {
        x,
        width: TB_WS_W,
        kind: TaskbarKind::Find,
        sunken: state.find_open || pressed(TaskbarKind::Find),
    });
    x += TB_WS_W + TB_GAP;

    for workspace in WorkspaceId::all() {
        let kind = TaskbarKind::Workspace(workspace);
        buttons.push(TaskbarButton {
            x,
            width: TB_WS_W,
            kind,
            sunken: state.current_workspace == workspace || pressed(kind),
        });
        x += TB_WS_W + TB_GAP;
    }

    let window_limit = max_x - TB_WIN_W;
    for view in windows {
        if buttons.len() >= TB_BTN_MAX || x > window_limit {
            break;
        }
        let kind = TaskbarKind::Window(view);
        buttons.push(TaskbarButton {
            x,
            width: TB_WIN_W,
            kind,
            sunken: state.focused == Some(view) || pressed(kind),
        });
        x += TB_WIN_W + TB_GAP;
    }

    buttons
}

/// First button under `location`, with coordinates truncated to pixels.
pub fn hit<'a>(
    buttons: &'a [TaskbarButton],
    output: Size<i32, Logical>,
    location: Point<f64, Logical>,
) -> Option<&'a TaskbarButton> {
    let (x, y) = (location.x as i32, location.y as i32);
    let top = button_top(output);
    if y < top || y >= top + TB_BTN_HEIGHT {
        return None;
    }
    buttons
        .iter()
        .find(|button| x >= button.x && x < button.x + button.width)
}

impl<B: Backend> Shell<B> {
    pub fn taskbar_buttons(&self) -> Vec<TaskbarButton> {
        let state = TaskbarState {
            current_workspace: self.current_workspace,
            focused: self.focused(),
            find_open: self.find.is_open(),
            pressed: match self.pressed() {
                Pressed::Taskbar(button) => Some(button.kind),
                Pressed::TitleButton { .. } | Pressed::None => None,
            },
        };
        let workspace = self.current_workspace;
        let windows = self
            .views_in_taskbar_order()
            .filter(|view| view.workspace == workspace)
            .map(|view| view.id);
        layout(&state, windows, self.output_size.w)
    }

    pub fn taskbar_hit(&self, location: Point<f64, Logical>) -> Option<TaskbarButton> {
        let buttons = self.taskbar_buttons();
        hit(&buttons, self.output_size, location).copied()
    }

    pub(crate) fn activate_taskbar_button(&mut self, kind: TaskbarKind) {
        tracing::debug!(?kind, "taskbar button clicked");
        match kind {
            TaskbarKind::Start => self.spawn_terminal(),
            TaskbarKind::Find => self.toggle_find(),
            TaskbarKind::Workspace(workspace) => self.switch_workspace(workspace),
            TaskbarKind::Window(id) => {
                let Some(state) = self.view(id).map(|view| view.state) else {
                    return;
                };
                if self.focused() == Some(id) && state != ViewState::Minimized {
                    self.minimize(id);
                } else {
                    self.set_state(id, ViewState::Normal);
                    self.focus_view(id);
                }
            }
        }
    }
}
