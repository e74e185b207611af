use std::fmt;

use smithay::input::keyboard::Keysym;

use crate::{backend::Backend, state::Shell};

pub const WORKSPACE_COUNT: u8 = 9;

/// One of the nine workspaces, numbered from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkspaceId(u8);

impl WorkspaceId {
    pub const FIRST: WorkspaceId = WorkspaceId(1);

    pub fn new(number: u8) -> Option<Self> {
        (1..=WORKSPACE_COUNT).contains(&number).then_some(Self(number))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = WorkspaceId> {
        (1..=WORKSPACE_COUNT).map(WorkspaceId)
    }

    /// Digit keys and their shifted US-layout symbols.
    pub fn from_keysym(keysym: Keysym) -> Option<Self> {
        let number = match keysym {
            Keysym::_1 | Keysym::exclam => 1,
            Keysym::_2 | Keysym::at => 2,
            Keysym::_3 | Keysym::numbersign => 3,
            Keysym::_4 | Keysym::dollar => 4,
            Keysym::_5 | Keysym::percent => 5,
            Keysym::_6 | Keysym::asciicircum => 6,
            Keysym::_7 | Keysym::ampersand => 7,
            Keysym::_8 | Keysym::asterisk => 8,
            Keysym::_9 | Keysym::parenleft => 9,
            _ => return None,
        };
        Some(Self(number))
    }
}

impl Default for WorkspaceId {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<B: Backend> Shell<B> {
    pub fn switch_workspace(&mut self, target: WorkspaceId) {
        tracing::info!(from = %self.current_workspace, to = %target, "switching workspace");
        self.current_workspace = target;
        self.find.close();
        self.focus_top_visible();
    }

    pub fn move_focused_window_to_workspace(&mut self, target: WorkspaceId) {
        let Some(id) = self.focused() else {
            return;
        };
        let Some(view) = self.view_mut(id) else {
            return;
        };
        view.workspace = target;
        tracing::debug!(view = %id, workspace = %target, "moved view to workspace");

        if target != self.current_workspace {
            self.focus_top_visible();
        }
    }
}
