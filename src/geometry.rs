//! Frame geometry shared by placement, hit-testing and drawing.
//!
//! Everything here is a pure function of its arguments. Insets in particular
//! are recomputed on every call from the decoration mode and view state; the
//! view itself only stores its raw content size.

use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::view::{DecorationMode, ViewState};

pub const BAR_HEIGHT: i32 = 32;
pub const BAR_PADDING: i32 = 4;
pub const BAR_BUTTON_SIZE: i32 = BAR_HEIGHT - BAR_PADDING * 2;
pub const BORDER_WIDTH: i32 = 4;
pub const FONT_SIZE: i32 = 14;
/// Height of one line of text including the space reserved for descenders.
pub const TEXT_HEIGHT: i32 = FONT_SIZE + 4;
pub const TITLE_BUTTON_GAP: i32 = 2;

pub const MIN_FRAME_WIDTH: i32 = 100;
pub const MIN_FRAME_HEIGHT: i32 = 60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Insets {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Insets {
    pub const ZERO: Insets = Insets {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub fn horizontal(self) -> i32 {
        self.left + self.right
    }

    pub fn vertical(self) -> i32 {
        self.top + self.bottom
    }

    /// Frame size for the given content size.
    pub fn outer(self, content: Size<i32, Logical>) -> Size<i32, Logical> {
        Size::from((content.w + self.horizontal(), content.h + self.vertical()))
    }

    /// Content size that fits inside the given frame size.
    pub fn inner(self, frame: Size<i32, Logical>) -> Size<i32, Logical> {
        Size::from((frame.w - self.horizontal(), frame.h - self.vertical()))
    }

    pub fn has_title_bar(self) -> bool {
        self.top > 0
    }
}

pub fn insets_for(decoration: DecorationMode, state: ViewState) -> Insets {
    if decoration != DecorationMode::ServerSide || state == ViewState::Fullscreen {
        return Insets::ZERO;
    }

    Insets {
        left: BORDER_WIDTH,
        top: BAR_HEIGHT,
        right: BORDER_WIDTH,
        bottom: BORDER_WIDTH,
    }
}

/// Output area left over once the taskbar strip is reserved.
pub fn usable_area(output: Size<i32, Logical>) -> Rectangle<i32, Logical> {
    Rectangle::new((0, 0).into(), (output.w, output.h - BAR_HEIGHT).into())
}

pub fn fullscreen_area(output: Size<i32, Logical>) -> Rectangle<i32, Logical> {
    Rectangle::new((0, 0).into(), output)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TitleButton {
    Minimize,
    Maximize,
    Close,
}

impl TitleButton {
    /// Left-to-right order on the title bar.
    pub const ALL: [TitleButton; 3] = [
        TitleButton::Minimize,
        TitleButton::Maximize,
        TitleButton::Close,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TitleButtons {
    xs: [i32; 3],
    y: i32,
    size: i32,
}

/// Title-bar button placement for a decorated frame at `frame_origin` whose
/// content area is `content_width` wide. Buttons are right-aligned against the
/// right border, close first, each separated by [`TITLE_BUTTON_GAP`].
pub fn title_buttons(frame_origin: Point<i32, Logical>, content_width: i32) -> TitleButtons {
    let size = BAR_BUTTON_SIZE;
    let close_x = frame_origin.x + BORDER_WIDTH + content_width - size;
    let maximize_x = close_x - size - TITLE_BUTTON_GAP;
    let minimize_x = maximize_x - size - TITLE_BUTTON_GAP;

    TitleButtons {
        xs: [minimize_x, maximize_x, close_x],
        y: frame_origin.y + BAR_PADDING,
        size,
    }
}

impl TitleButtons {
    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn rect(&self, button: TitleButton) -> Rectangle<i32, Logical> {
        let index = match button {
            TitleButton::Minimize => 0,
            TitleButton::Maximize => 1,
            TitleButton::Close => 2,
        };
        Rectangle::new((self.xs[index], self.y).into(), (self.size, self.size).into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (TitleButton, Rectangle<i32, Logical>)> + '_ {
        TitleButton::ALL
            .into_iter()
            .map(move |button| (button, self.rect(button)))
    }

    /// Pixel-truncated hit test, as for every other screen-space widget.
    pub fn hit(&self, location: Point<f64, Logical>) -> Option<TitleButton> {
        let point = Point::<i32, Logical>::from((location.x as i32, location.y as i32));
        if point.y < self.y || point.y >= self.y + self.size {
            return None;
        }
        self.iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(button, _)| button)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    pub fn is_perpendicular_to(self, other: Direction) -> bool {
        self.is_horizontal() != other.is_horizontal()
    }
}

/// Half of `area` on the side named by `direction`.
pub fn half_rect(area: Rectangle<i32, Logical>, direction: Direction) -> Rectangle<i32, Logical> {
    let (w, h) = (area.size.w, area.size.h);
    let (hw, hh) = (w / 2, h / 2);
    let (x, y, w, h) = match direction {
        Direction::Left => (0, 0, hw, h),
        Direction::Right => (hw, 0, hw, h),
        Direction::Up => (0, 0, w, hh),
        Direction::Down => (0, hh, w, hh),
    };
    Rectangle::new((area.loc.x + x, area.loc.y + y).into(), (w, h).into())
}

/// Quadrant of `area` picked by one horizontal and one vertical direction,
/// in either order.
pub fn quadrant_rect(
    area: Rectangle<i32, Logical>,
    first: Direction,
    second: Direction,
) -> Rectangle<i32, Logical> {
    let (horizontal, vertical) = if first.is_horizontal() {
        (first, second)
    } else {
        (second, first)
    };
    let (hw, hh) = (area.size.w / 2, area.size.h / 2);
    let x = if horizontal == Direction::Right { hw } else { 0 };
    let y = if vertical == Direction::Up { 0 } else { hh };
    Rectangle::new((area.loc.x + x, area.loc.y + y).into(), (hw, hh).into())
}
