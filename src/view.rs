use std::fmt;

use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::{
    geometry::{Insets, insets_for},
    workspace::WorkspaceId,
};

/// Stable handle for a client toplevel. The protocol side owns the surface;
/// the shell only ever stores this id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewState {
    #[default]
    Normal,
    Maximized,
    Fullscreen,
    Minimized,
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewState::Normal => "normal",
            ViewState::Maximized => "maximized",
            ViewState::Fullscreen => "fullscreen",
            ViewState::Minimized => "minimized",
        };
        f.write_str(name)
    }
}

/// Who draws the border and title bar. Settled once while the client
/// negotiates its first configure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DecorationMode {
    #[default]
    ClientSide,
    ServerSide,
}

pub const INITIAL_POSITION: (i32, i32) = (50, 50);

#[derive(Clone, Debug)]
pub struct View {
    pub id: ViewId,
    pub title: String,
    pub pid: Option<i32>,
    pub position: Point<i32, Logical>,
    pub saved_position: Point<i32, Logical>,
    pub saved_size: Size<i32, Logical>,
    /// Size most recently requested from the client; `None` once the client's
    /// own size is authoritative again.
    pub target_size: Option<Size<i32, Logical>>,
    /// Content size from the client's last commit.
    pub content_size: Size<i32, Logical>,
    pub workspace: WorkspaceId,
    pub state: ViewState,
    pub decoration: DecorationMode,
    pub mapped: bool,
}

impl View {
    pub fn new(id: ViewId, workspace: WorkspaceId) -> Self {
        Self {
            id,
            title: String::new(),
            pid: None,
            position: INITIAL_POSITION.into(),
            saved_position: INITIAL_POSITION.into(),
            saved_size: Size::default(),
            target_size: None,
            content_size: Size::default(),
            workspace,
            state: ViewState::Normal,
            decoration: DecorationMode::ClientSide,
            mapped: false,
        }
    }

    pub fn has_server_decoration(&self) -> bool {
        self.decoration == DecorationMode::ServerSide
    }

    pub fn insets(&self) -> Insets {
        insets_for(self.decoration, self.state)
    }

    /// The larger of the requested and committed content size, so a pending
    /// grow is laid out before the client catches up.
    pub fn effective_content_size(&self) -> Size<i32, Logical> {
        match self.target_size {
            Some(target) => Size::from((
                target.w.max(self.content_size.w),
                target.h.max(self.content_size.h),
            )),
            None => self.content_size,
        }
    }

    pub fn frame_size(&self) -> Size<i32, Logical> {
        self.insets().outer(self.effective_content_size())
    }

    pub fn frame_rect(&self) -> Rectangle<i32, Logical> {
        Rectangle::new(self.position, self.frame_size())
    }

    pub fn content_origin(&self) -> Point<i32, Logical> {
        let insets = self.insets();
        Point::from((self.position.x + insets.left, self.position.y + insets.top))
    }

    pub fn content_rect(&self) -> Rectangle<i32, Logical> {
        Rectangle::new(self.content_origin(), self.effective_content_size())
    }

    pub fn is_on(&self, workspace: WorkspaceId) -> bool {
        self.workspace == workspace && self.state != ViewState::Minimized
    }

    /// Title as shown on the frame, the taskbar and in the find overlay.
    pub fn display_title(&self) -> String {
        match self.pid {
            Some(pid) if !self.title.is_empty() => format!("{} [{pid}]", self.title),
            _ => self.title.clone(),
        }
    }
}
