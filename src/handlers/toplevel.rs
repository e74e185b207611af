use smithay::utils::{Logical, Size};

use crate::{
    backend::Backend,
    grabs::ResizeEdge,
    handlers::ToplevelHandler,
    state::Shell,
    view::{DecorationMode, View, ViewId, ViewState},
};

impl<B: Backend> ToplevelHandler for Shell<B> {
    fn new_toplevel(&mut self, id: ViewId, pid: Option<i32>) -> DecorationMode {
        let mut view = View::new(id, self.current_workspace);
        view.pid = pid;
        self.insert_view(view);

        let mode = if self.config.no_csd {
            DecorationMode::ServerSide
        } else {
            DecorationMode::ClientSide
        };
        tracing::debug!(view = %id, ?mode, "new toplevel");
        mode
    }

    fn decoration_negotiated(&mut self, id: ViewId, mode: DecorationMode) {
        if let Some(view) = self.view_mut(id) {
            view.decoration = mode;
        }
    }

    fn title_changed(&mut self, id: ViewId, title: &str) {
        if let Some(view) = self.view_mut(id) {
            view.title = title.to_owned();
        }
    }

    fn committed(&mut self, id: ViewId, size: Size<i32, Logical>, initial: bool) {
        let Some(view) = self.view_mut(id) else {
            return;
        };
        view.content_size = size;
        if initial {
            // Let the client pick its own initial size.
            self.backend.request_size(id, Size::from((0, 0)));
        }
    }

    fn mapped(&mut self, id: ViewId) {
        if self.view(id).is_none() {
            return;
        }
        self.set_state(id, ViewState::Normal);

        let output = self.output_size;
        let workspace = self.current_workspace;
        let Some(view) = self.view_mut(id) else {
            return;
        };
        // Lands wherever the user is now, not where the client was created.
        view.workspace = workspace;
        view.mapped = true;
        let frame = view.frame_size();
        view.position = ((output.w - frame.w) / 2, (output.h - frame.h) / 2).into();
        tracing::info!(
            view = %id,
            title = %view.display_title(),
            x = view.position.x,
            y = view.position.y,
            "view mapped"
        );

        self.link_view(id);
        self.focus_view(id);
    }

    fn unmapped(&mut self, id: ViewId) {
        let Some(view) = self.view_mut(id) else {
            return;
        };
        view.mapped = false;
        tracing::debug!(view = %id, "view unmapped");
        self.unlink_view(id);
        self.defocus_view(id);
    }

    fn destroyed(&mut self, id: ViewId) {
        let was_focused = self.focused() == Some(id);
        self.detach_view(id);
        if self.remove_view(id).is_none() {
            return;
        }
        tracing::info!(view = %id, "view destroyed");
        if was_focused {
            self.focus_top_visible();
        }
    }

    fn move_requested(&mut self, id: ViewId) {
        if self.view(id).is_some_and(|view| view.mapped) {
            self.begin_grab(id, ResizeEdge::empty());
        }
    }

    fn resize_requested(&mut self, id: ViewId, edges: ResizeEdge) {
        if self.view(id).is_some_and(|view| view.mapped) {
            self.begin_grab(id, edges);
        }
    }

    fn maximize_requested(&mut self, id: ViewId) {
        if self.view(id).is_some_and(|view| view.mapped) {
            self.toggle(id, ViewState::Maximized);
        }
    }

    fn fullscreen_requested(&mut self, id: ViewId, fullscreen: bool) {
        let Some(view) = self.view(id) else {
            return;
        };
        let is_fullscreen = view.state == ViewState::Fullscreen;
        if fullscreen != is_fullscreen && (is_fullscreen || view.mapped) {
            self.toggle(id, ViewState::Fullscreen);
        }
    }
}
