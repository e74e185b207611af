use std::{
    collections::{HashMap, VecDeque},
    path::PathBuf,
};

use smithay::{
    input::keyboard::ModifiersState,
    utils::{Logical, Point, Rectangle, Size},
};

use crate::{
    ShellError,
    backend::Backend,
    config::{self, RuntimeConfig},
    cursor::CursorImage,
    find::FindOverlay,
    geometry::{Direction, fullscreen_area, usable_area},
    grabs::Grab,
    input::Pressed,
    render::{frame::UiResources, glyphs::GlyphRasterizer},
    status::{NoStatus, StatusSource},
    view::{View, ViewId, ViewState},
    workspace::WorkspaceId,
};

/// The shell context. Every entry point (input, client notifications, frame
/// rendering) takes `&mut Shell`; there is no other shared state.
pub struct Shell<B: Backend> {
    pub backend: B,
    pub config: RuntimeConfig,
    pub config_path: Option<PathBuf>,
    pub status: Box<dyn StatusSource>,
    pub ui: UiResources,

    views: HashMap<ViewId, View>,
    /// Mapped views, most recently focused first. Doubles as z-order.
    mru: VecDeque<ViewId>,
    /// Mapped views in the order they were first mapped.
    taskbar_order: Vec<ViewId>,

    pub output_size: Size<i32, Logical>,
    pub current_workspace: WorkspaceId,
    pub pointer_location: Point<f64, Logical>,
    pub modifiers: ModifiersState,
    pub find: FindOverlay,

    pub(crate) focused: Option<ViewId>,
    pub(crate) grab: Option<Grab>,
    pub(crate) pressed: Pressed,
    pub(crate) snap_chord: Option<Direction>,
    running: bool,
}

impl<B: Backend> Shell<B> {
    pub fn new(backend: B, config: RuntimeConfig) -> Self {
        let ui = UiResources::new(&config);
        Self {
            backend,
            config,
            config_path: None,
            status: Box::new(NoStatus),
            ui,
            views: HashMap::new(),
            mru: VecDeque::new(),
            taskbar_order: Vec::new(),
            output_size: Size::from((1920, 1080)),
            current_workspace: WorkspaceId::FIRST,
            pointer_location: Point::from((0.0, 0.0)),
            modifiers: ModifiersState::default(),
            find: FindOverlay::default(),
            focused: None,
            grab: None,
            pressed: Pressed::None,
            snap_chord: None,
            running: true,
        }
    }

    pub fn with_status(mut self, status: Box<dyn StatusSource>) -> Self {
        self.status = status;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Box<dyn GlyphRasterizer>) -> Self {
        self.ui.set_rasterizer(rasterizer);
        self
    }

    pub fn with_cursor_image(mut self, image: CursorImage) -> Self {
        self.ui.set_cursor_image(image);
        self
    }

    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn quit(&mut self) {
        tracing::info!("quit requested");
        self.running = false;
        self.backend.quit();
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    pub(crate) fn view_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.views.get_mut(&id)
    }

    /// Mapped views, most recently focused first.
    pub fn views_mru(&self) -> impl Iterator<Item = &View> + '_ {
        self.mru.iter().filter_map(|id| self.views.get(id))
    }

    /// Mapped views in taskbar (first-mapped) order.
    pub fn views_in_taskbar_order(&self) -> impl Iterator<Item = &View> + '_ {
        self.taskbar_order.iter().filter_map(|id| self.views.get(id))
    }

    pub fn visible_views(&self) -> impl Iterator<Item = &View> + '_ {
        let workspace = self.current_workspace;
        self.views_mru().filter(move |view| view.is_on(workspace))
    }

    pub fn is_visible(&self, id: ViewId) -> bool {
        self.views
            .get(&id)
            .is_some_and(|view| view.mapped && view.is_on(self.current_workspace))
    }

    pub fn focused(&self) -> Option<ViewId> {
        self.focused
    }

    pub fn focused_view(&self) -> Option<&View> {
        self.focused.and_then(|id| self.views.get(&id))
    }

    pub fn grab(&self) -> Option<&Grab> {
        self.grab.as_ref()
    }

    pub fn pressed(&self) -> &Pressed {
        &self.pressed
    }

    pub fn snap_chord(&self) -> Option<Direction> {
        self.snap_chord
    }

    pub(crate) fn insert_view(&mut self, view: View) {
        self.views.insert(view.id, view);
    }

    pub(crate) fn remove_view(&mut self, id: ViewId) -> Option<View> {
        self.unlink_view(id);
        self.views.remove(&id)
    }

    /// Put a newly mapped view on top of the stack and at the end of the
    /// taskbar.
    pub(crate) fn link_view(&mut self, id: ViewId) {
        self.unlink_view(id);
        self.mru.push_front(id);
        self.taskbar_order.push(id);
    }

    pub(crate) fn unlink_view(&mut self, id: ViewId) {
        self.mru.retain(|candidate| *candidate != id);
        self.taskbar_order.retain(|candidate| *candidate != id);
    }

    pub fn usable_area(&self) -> Rectangle<i32, Logical> {
        usable_area(self.output_size)
    }

    /// Assign `state` and tell the client whether it is maximized or
    /// fullscreen now.
    pub fn set_state(&mut self, id: ViewId, state: ViewState) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        view.state = state;
        self.backend
            .set_maximized(id, state == ViewState::Maximized);
        self.backend
            .set_fullscreen(id, state == ViewState::Fullscreen);
    }

    /// Enter `target`, or go back to the geometry saved before entering it if
    /// the view is already there.
    pub fn toggle(&mut self, id: ViewId, target: ViewState) {
        let Some(view) = self.views.get(&id) else {
            return;
        };

        if view.state == target {
            tracing::debug!(view = %id, state = %target, "restoring saved geometry");
            self.restore_geometry(id);
            return;
        }

        self.save_geometry(id);
        self.set_state(id, target);
        match target {
            ViewState::Maximized => self.place(id, usable_area(self.output_size)),
            ViewState::Fullscreen => self.place(id, fullscreen_area(self.output_size)),
            ViewState::Minimized => self.defocus_view(id),
            ViewState::Normal => {}
        }
    }

    /// Move the frame to `rect.loc` and ask the client for the content size
    /// that makes the frame fill `rect`.
    pub fn place(&mut self, id: ViewId, rect: Rectangle<i32, Logical>) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        let size = view.insets().inner(rect.size);
        view.position = rect.loc;
        view.target_size = Some(size);
        self.backend.request_size(id, size);
    }

    pub fn snap(&mut self, id: ViewId, rect: Rectangle<i32, Logical>) {
        self.set_state(id, ViewState::Normal);
        self.place(id, rect);
    }

    fn save_geometry(&mut self, id: ViewId) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if view.state != ViewState::Normal {
            return;
        }
        view.saved_position = view.position;
        view.saved_size = view.content_size;
    }

    fn restore_geometry(&mut self, id: ViewId) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        view.position = view.saved_position;
        view.target_size = None;
        let size = view.saved_size;
        self.set_state(id, ViewState::Normal);
        self.backend.request_size(id, size);
    }

    pub fn focus_view(&mut self, id: ViewId) {
        if !self.views.contains_key(&id) {
            return;
        }
        if let Some(previous) = self.focused
            && previous != id
        {
            self.backend.set_activated(previous, false);
        }

        if self.mru.front() != Some(&id) {
            self.mru.retain(|candidate| *candidate != id);
            self.mru.push_front(id);
        }

        self.backend.set_activated(id, true);
        self.focused = Some(id);
        self.backend.keyboard_focus(Some(id));
    }

    /// Focus the most recent visible view, or nothing.
    pub fn focus_top_visible(&mut self) {
        let next = self.visible_views().map(|view| view.id).next();
        match next {
            Some(id) => self.focus_view(id),
            None => {
                if let Some(previous) = self.focused.take() {
                    self.backend.set_activated(previous, false);
                }
                self.backend.keyboard_focus(None);
            }
        }
    }

    /// Focus the most recent visible view that is not the focused one.
    pub fn focus_last_window(&mut self) {
        let focused = self.focused;
        let next = self
            .visible_views()
            .map(|view| view.id)
            .find(|id| Some(*id) != focused);
        if let Some(id) = next {
            self.focus_view(id);
        }
    }

    /// Drop every focus, grab and press reference to `id`.
    pub(crate) fn detach_view(&mut self, id: ViewId) {
        if self.grab.is_some_and(|grab| grab.view == id) {
            self.grab = None;
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        if self.pressed.references(id) {
            self.pressed = Pressed::None;
        }
    }

    /// Detach `id` and hand focus to whatever is on top now.
    pub fn defocus_view(&mut self, id: ViewId) {
        self.detach_view(id);
        self.backend.pointer_focus(None, 0);
        self.focus_top_visible();
    }

    pub fn minimize(&mut self, id: ViewId) {
        self.set_state(id, ViewState::Minimized);
        self.defocus_view(id);
    }

    pub fn close_focused(&mut self) {
        if let Some(id) = self.focused {
            tracing::info!(view = %id, "closing focused view");
            self.backend.send_close(id);
        }
    }

    pub fn spawn_terminal(&mut self) {
        let command = self.config.terminal.clone();
        self.backend.spawn(&command);
    }

    pub fn spawn_launcher(&mut self) {
        let command = self.config.launcher.clone();
        self.backend.spawn(&command);
    }

    pub fn spawn_command(&mut self, command: &str) {
        self.backend.spawn(command);
    }

    pub fn run_autostart(&mut self) {
        let commands = self.config.autostart.clone();
        for command in &commands {
            self.backend.spawn(command);
        }
    }

    pub fn reload_config(&mut self) -> Result<(), ShellError> {
        let Some(path) = self.config_path.clone() else {
            return Err(ShellError::Config(
                "no config file associated with this session".to_owned(),
            ));
        };
        let config = config::load_from_path(&path)?;
        self.ui.apply_config(&config);
        self.config = config;
        tracing::info!(path = %path.display(), "reloaded config.lua");
        Ok(())
    }

    pub fn render_clients_report(&self) -> String {
        if self.views.is_empty() {
            return "No clients.\n".to_owned();
        }

        let mut ids: Vec<ViewId> = self.taskbar_order.clone();
        let mut unmapped: Vec<ViewId> = self
            .views
            .keys()
            .filter(|id| !self.taskbar_order.contains(id))
            .copied()
            .collect();
        unmapped.sort();
        ids.extend(unmapped);

        let mut out = String::new();
        for (index, id) in ids.iter().enumerate() {
            let Some(view) = self.views.get(id) else {
                continue;
            };
            let title = if view.title.is_empty() {
                "<untitled>".to_owned()
            } else {
                view.display_title()
            };
            let frame = view.frame_rect();
            let decoration = if view.has_server_decoration() {
                "server"
            } else {
                "client"
            };

            out.push_str(&format!("Client {}:\n", index + 1));
            out.push_str(&format!("  id: {}\n", id.get()));
            out.push_str(&format!("  title: {title}\n"));
            out.push_str(&format!("  workspace: {}\n", view.workspace));
            out.push_str(&format!("  state: {}\n", view.state));
            out.push_str(&format!("  mapped: {}\n", view.mapped));
            out.push_str(&format!("  decoration: {decoration}\n"));
            out.push_str(&format!(
                "  frame: {},{} {}x{}\n",
                frame.loc.x, frame.loc.y, frame.size.w, frame.size.h
            ));
            out.push_str(&format!("  focused: {}\n", self.focused == Some(*id)));
            out.push('\n');
        }

        out
    }
}
