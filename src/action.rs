use crate::{
    backend::Backend,
    config::KeybindAction,
    geometry::{Direction, half_rect, quadrant_rect},
    state::Shell,
    view::ViewState,
    workspace::WorkspaceId,
};

/// Everything a key press can trigger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Exec(String),
    Terminal,
    Launcher,
    Lock,
    Mixer,
    CloseFocused,
    ToggleFullscreen,
    ToggleMaximize,
    ToggleFind,
    FocusLast,
    Quit,
    ReloadConfig,
    SwitchWorkspace(WorkspaceId),
    MoveFocusedToWorkspace(WorkspaceId),
    Snap(Direction),
    AdjustBrightness(i32),
}

impl From<KeybindAction> for Action {
    fn from(action: KeybindAction) -> Self {
        match action {
            KeybindAction::Exec(command) => Action::Exec(command),
            KeybindAction::Terminal => Action::Terminal,
            KeybindAction::Launcher => Action::Launcher,
            KeybindAction::Lock => Action::Lock,
            KeybindAction::Mixer => Action::Mixer,
            KeybindAction::CloseFocused => Action::CloseFocused,
            KeybindAction::ToggleFullscreen => Action::ToggleFullscreen,
            KeybindAction::ToggleMaximize => Action::ToggleMaximize,
            KeybindAction::ToggleFind => Action::ToggleFind,
            KeybindAction::FocusLast => Action::FocusLast,
            KeybindAction::Quit => Action::Quit,
            KeybindAction::ReloadConfig => Action::ReloadConfig,
            KeybindAction::SwitchWorkspace(workspace) => Action::SwitchWorkspace(workspace),
            KeybindAction::MoveFocusedToWorkspace(workspace) => {
                Action::MoveFocusedToWorkspace(workspace)
            }
        }
    }
}

impl Action {
    pub fn execute<B: Backend>(self, shell: &mut Shell<B>) {
        tracing::debug!(action = ?self, "executing action");
        match self {
            Action::Exec(command) => shell.spawn_command(&command),
            Action::Terminal => shell.spawn_terminal(),
            Action::Launcher => shell.spawn_launcher(),
            Action::Lock => {
                let command = shell.config.lock_command.clone();
                shell.spawn_command(&command);
            }
            Action::Mixer => {
                let command = shell.config.mixer_command.clone();
                shell.spawn_command(&command);
            }
            Action::CloseFocused => shell.close_focused(),
            Action::ToggleFullscreen => toggle_focused(shell, ViewState::Fullscreen),
            Action::ToggleMaximize => toggle_focused(shell, ViewState::Maximized),
            Action::ToggleFind => shell.toggle_find(),
            Action::FocusLast => shell.focus_last_window(),
            Action::Quit => shell.quit(),
            Action::ReloadConfig => {
                shell
                    .reload_config()
                    .map_err(|err| tracing::warn!("failed to reload config: {err}"))
                    .ok();
            }
            Action::SwitchWorkspace(workspace) => shell.switch_workspace(workspace),
            Action::MoveFocusedToWorkspace(workspace) => {
                shell.move_focused_window_to_workspace(workspace)
            }
            Action::Snap(direction) => snap_focused(shell, direction),
            Action::AdjustBrightness(delta) => shell.status.adjust_brightness(delta),
        }
    }
}

fn toggle_focused<B: Backend>(shell: &mut Shell<B>, target: ViewState) {
    if let Some(id) = shell.focused() {
        shell.toggle(id, target);
    }
}

/// A lone arrow snaps to a half and arms the chord; a perpendicular arrow
/// while the chord is armed narrows the half to a quadrant.
fn snap_focused<B: Backend>(shell: &mut Shell<B>, direction: Direction) {
    let Some(id) = shell.focused() else {
        return;
    };
    let area = shell.usable_area();
    let rect = match shell.snap_chord {
        Some(first) if first.is_perpendicular_to(direction) => {
            shell.snap_chord = None;
            quadrant_rect(area, first, direction)
        }
        _ => {
            shell.snap_chord = Some(direction);
            half_rect(area, direction)
        }
    };
    tracing::debug!(view = %id, ?direction, ?rect, "snapping view");
    shell.snap(id, rect);
}
