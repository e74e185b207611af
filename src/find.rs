//! Find-window overlay: a modal type-to-search list of open windows.

use smithay::input::keyboard::Keysym;

use crate::{
    backend::Backend,
    state::Shell,
    view::{ViewId, ViewState},
};

pub const MAX_FIND_VIEWS: usize = 32;
pub const FIND_QUERY_MAX: usize = 128;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FindOverlay {
    open: bool,
    query: String,
    /// May run past the end of the match list; readers clamp it.
    selected: usize,
}

/// What the shell has to do after the overlay consumed a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FindCommand {
    None,
    Activate,
}

impl FindOverlay {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn open(&mut self) {
        self.open = true;
        self.query.clear();
        self.selected = 0;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        if self.open {
            self.close();
        } else {
            self.open();
        }
    }

    /// Selection index valid for `count` matches.
    pub fn clamped_selection(&self, count: usize) -> Option<usize> {
        (count > 0).then(|| self.selected.min(count - 1))
    }

    /// Pull a runaway selection back into range.
    pub fn clamp_selection(&mut self, count: usize) {
        self.selected = self.clamped_selection(count).unwrap_or(0);
    }

    /// Every key reaching the overlay is consumed.
    pub fn handle_key(&mut self, keysym: Keysym) -> FindCommand {
        match keysym {
            Keysym::Escape => self.close(),
            Keysym::Return | Keysym::KP_Enter => return FindCommand::Activate,
            Keysym::Up => self.selected = self.selected.saturating_sub(1),
            Keysym::Down => self.selected += 1,
            Keysym::BackSpace => {
                if self.query.pop().is_some() {
                    self.selected = 0;
                }
            }
            _ => {
                let raw = keysym.raw();
                if (0x20..=0x7e).contains(&raw) && self.query.len() < FIND_QUERY_MAX {
                    // Latin-1 keysyms equal their ASCII code points.
                    self.query.push(char::from(raw as u8));
                    self.selected = 0;
                }
            }
        }
        FindCommand::None
    }
}

/// Case-insensitive substring test; an empty needle matches everything.
pub fn title_matches(title: &str, query: &str) -> bool {
    query.is_empty() || title.to_lowercase().contains(&query.to_lowercase())
}

impl<B: Backend> Shell<B> {
    /// Titled, non-minimized windows whose title contains the query, most
    /// recently focused first.
    pub fn find_matches(&self) -> Vec<ViewId> {
        let query = self.find.query();
        self.views_mru()
            .filter(|view| view.state != ViewState::Minimized && !view.title.is_empty())
            .filter(|view| title_matches(&view.display_title(), query))
            .map(|view| view.id)
            .take(MAX_FIND_VIEWS)
            .collect()
    }

    pub fn toggle_find(&mut self) {
        self.find.toggle();
        tracing::debug!(open = self.find.is_open(), "find overlay toggled");
    }

    /// Route a key press to the overlay. Returns false when the overlay
    /// leaves the key alone (main key held), so shortcuts still work.
    pub(crate) fn handle_find_key(&mut self, keysym: Keysym, main_held: bool) -> bool {
        if main_held {
            return false;
        }
        if self.find.handle_key(keysym) == FindCommand::Activate {
            self.activate_find_selection();
        }
        true
    }

    pub fn activate_find_selection(&mut self) {
        let matches = self.find_matches();
        let Some(index) = self.find.clamped_selection(matches.len()) else {
            return;
        };
        let id = matches[index];
        let Some(workspace) = self.view(id).map(|view| view.workspace) else {
            return;
        };

        tracing::debug!(view = %id, %workspace, "activating find selection");
        self.current_workspace = workspace;
        self.focus_view(id);
        self.find.close();
    }
}
