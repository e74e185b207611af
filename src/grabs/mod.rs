//! Interactive move and resize sessions.
//!
//! A [`Grab`] captures everything needed to turn the cursor position into
//! a new frame geometry; the input router applies the result to the view.

use bitflags::bitflags;
use smithay::utils::{Logical, Point, Size};

use crate::{
    geometry::{MIN_FRAME_HEIGHT, MIN_FRAME_WIDTH},
    view::ViewId,
};

bitflags! {
    /// Frame edges being dragged. Values match `xdg_toplevel.resize_edge`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ResizeEdge: u32 {
        const TOP = 0b0001;
        const BOTTOM = 0b0010;
        const LEFT = 0b0100;
        const TOP_LEFT = Self::TOP.bits() | Self::LEFT.bits();
        const BOTTOM_LEFT = Self::BOTTOM.bits() | Self::LEFT.bits();
        const RIGHT = 0b1000;
        const TOP_RIGHT = Self::TOP.bits() | Self::RIGHT.bits();
        const BOTTOM_RIGHT = Self::BOTTOM.bits() | Self::RIGHT.bits();
    }
}

impl ResizeEdge {
    /// Decode the protocol `resize_edge` enum value.
    pub fn from_protocol(value: u32) -> Self {
        match value {
            1 => ResizeEdge::TOP,
            2 => ResizeEdge::BOTTOM,
            4 => ResizeEdge::LEFT,
            5 => ResizeEdge::TOP_LEFT,
            6 => ResizeEdge::BOTTOM_LEFT,
            8 => ResizeEdge::RIGHT,
            9 => ResizeEdge::TOP_RIGHT,
            10 => ResizeEdge::BOTTOM_RIGHT,
            _ => ResizeEdge::empty(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grab {
    pub view: ViewId,
    /// Empty for a move.
    pub edges: ResizeEdge,
    /// Move: cursor offset from the frame origin. Resize: cursor position at
    /// grab start.
    pub anchor: Point<f64, Logical>,
    pub initial_position: Point<i32, Logical>,
    pub initial_frame_size: Size<i32, Logical>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrabUpdate {
    Move {
        position: Point<i32, Logical>,
    },
    Resize {
        position: Point<i32, Logical>,
        frame_size: Size<i32, Logical>,
    },
}

impl Grab {
    pub fn start_move(
        view: ViewId,
        cursor: Point<f64, Logical>,
        position: Point<i32, Logical>,
        frame_size: Size<i32, Logical>,
    ) -> Self {
        Self {
            view,
            edges: ResizeEdge::empty(),
            anchor: cursor - position.to_f64(),
            initial_position: position,
            initial_frame_size: frame_size,
        }
    }

    pub fn start_resize(
        view: ViewId,
        edges: ResizeEdge,
        cursor: Point<f64, Logical>,
        position: Point<i32, Logical>,
        frame_size: Size<i32, Logical>,
    ) -> Self {
        Self {
            view,
            edges,
            anchor: cursor,
            initial_position: position,
            initial_frame_size: frame_size,
        }
    }

    pub fn is_move(&self) -> bool {
        self.edges.is_empty()
    }

    /// Geometry for the cursor at `cursor`. Resizes keep the opposite edge
    /// fixed and never shrink the frame below the minimum size.
    pub fn motion(&self, cursor: Point<f64, Logical>) -> GrabUpdate {
        if self.is_move() {
            let position = cursor - self.anchor;
            return GrabUpdate::Move {
                position: (position.x as i32, position.y as i32).into(),
            };
        }

        let dx = (cursor.x - self.anchor.x) as i32;
        let dy = (cursor.y - self.anchor.y) as i32;

        let left = i32::from(self.edges.contains(ResizeEdge::LEFT));
        let top = i32::from(self.edges.contains(ResizeEdge::TOP));
        let width_sign = if self.edges.contains(ResizeEdge::RIGHT) { 1 } else { -left };
        let height_sign = if self.edges.contains(ResizeEdge::BOTTOM) { 1 } else { -top };

        let width = (self.initial_frame_size.w + width_sign * dx).max(MIN_FRAME_WIDTH);
        let height = (self.initial_frame_size.h + height_sign * dy).max(MIN_FRAME_HEIGHT);

        GrabUpdate::Resize {
            position: (
                self.initial_position.x + left * dx,
                self.initial_position.y + top * dy,
            )
                .into(),
            frame_size: (width, height).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ViewId {
        ViewId::new(7)
    }

    #[test]
    fn move_keeps_the_cursor_offset() {
        let grab = Grab::start_move(view(), (110.0, 60.0).into(), (100, 50).into(), (300, 200).into());
        assert_eq!(
            grab.motion((210.5, 160.9).into()),
            GrabUpdate::Move {
                position: (200, 150).into()
            }
        );
    }

    #[test]
    fn bottom_right_resize_grows_with_the_cursor() {
        let grab = Grab::start_resize(
            view(),
            ResizeEdge::BOTTOM_RIGHT,
            (500.0, 400.0).into(),
            (100, 100).into(),
            (400, 300).into(),
        );
        assert_eq!(
            grab.motion((550.0, 420.0).into()),
            GrabUpdate::Resize {
                position: (100, 100).into(),
                frame_size: (450, 320).into(),
            }
        );
    }

    #[test]
    fn top_left_resize_moves_the_origin() {
        let grab = Grab::start_resize(
            view(),
            ResizeEdge::TOP_LEFT,
            (100.0, 100.0).into(),
            (100, 100).into(),
            (400, 300).into(),
        );
        assert_eq!(
            grab.motion((80.0, 90.0).into()),
            GrabUpdate::Resize {
                position: (80, 90).into(),
                frame_size: (420, 310).into(),
            }
        );
    }

    #[test]
    fn resize_clamps_to_minimum_frame() {
        let grab = Grab::start_resize(
            view(),
            ResizeEdge::RIGHT,
            (400.0, 0.0).into(),
            (0, 0).into(),
            (400, 300).into(),
        );
        let GrabUpdate::Resize { frame_size, .. } = grab.motion((-1000.0, -1000.0).into()) else {
            panic!("expected a resize update");
        };
        assert_eq!(frame_size, Size::from((MIN_FRAME_WIDTH, 300)));
    }

    #[test]
    fn protocol_edges_decode() {
        assert_eq!(ResizeEdge::from_protocol(10), ResizeEdge::BOTTOM_RIGHT);
        assert!(ResizeEdge::from_protocol(0).is_empty());
    }
}
