mod common;

use bevel::{
    backend::headless::BackendCall,
    geometry::{Direction, TitleButton},
    grabs::ResizeEdge,
    handlers::{AxisEvent, InputHandler, PointerEvent, ToplevelHandler},
    input::{BTN_LEFT, HitTarget, Pressed},
    taskbar::TaskbarKind,
    view::{DecorationMode, ViewId, ViewState},
    workspace::WorkspaceId,
};
use common::{
    click_at, commit, forwarded_keys, left, map, map_with, modifiers, press_key, shell, warp,
};
use smithay::{
    backend::input::{AxisSource, ButtonState},
    input::keyboard::Keysym,
    utils::{Point, Rectangle, Size},
};

// Window 1 mapped at 800x600 sits at (556,222); its close button spans
// x 1336..1360, y 226..250.
const CLOSE: (f64, f64) = (1340.0, 230.0);
const TITLE_BAR: (f64, f64) = (600.0, 230.0);

#[test]
fn close_fires_only_when_release_matches_press() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");

    warp(&mut shell, CLOSE.0, CLOSE.1);
    left(&mut shell, ButtonState::Pressed);
    assert_eq!(
        *shell.pressed(),
        Pressed::TitleButton {
            view: id,
            button: TitleButton::Close
        }
    );
    warp(&mut shell, 700.0, 400.0);
    left(&mut shell, ButtonState::Released);
    assert!(!shell.backend.close_requested(id));
    assert_eq!(*shell.pressed(), Pressed::None);

    click_at(&mut shell, CLOSE.0, CLOSE.1);
    assert!(shell.backend.close_requested(id));
}

#[test]
fn title_button_presses_are_not_forwarded() {
    let mut shell = shell();
    map(&mut shell, 1, (800, 600), "Terminal");
    shell.backend.take_calls();

    warp(&mut shell, CLOSE.0, CLOSE.1);
    left(&mut shell, ButtonState::Pressed);
    assert!(
        !shell
            .backend
            .calls()
            .contains(&BackendCall::PointerButton(BTN_LEFT, ButtonState::Pressed))
    );
    left(&mut shell, ButtonState::Released);
    assert!(
        shell
            .backend
            .calls()
            .contains(&BackendCall::PointerButton(BTN_LEFT, ButtonState::Released))
    );
}

#[test]
fn maximize_and_minimize_buttons() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");

    click_at(&mut shell, CLOSE.0 - 26.0, CLOSE.1);
    assert_eq!(shell.view(id).unwrap().state, ViewState::Maximized);

    // Maximized at (0,0) with content 1912 wide: minimize sits at 1916-24-52.
    click_at(&mut shell, 1845.0, 8.0);
    assert_eq!(shell.view(id).unwrap().state, ViewState::Minimized);
    assert_eq!(shell.focused(), None);
}

#[test]
fn dragging_the_title_bar_moves_the_window() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");

    warp(&mut shell, TITLE_BAR.0, TITLE_BAR.1);
    left(&mut shell, ButtonState::Pressed);
    assert!(shell.grab().is_some_and(|grab| grab.is_move()));

    warp(&mut shell, TITLE_BAR.0 + 100.0, TITLE_BAR.1 + 50.0);
    assert_eq!(shell.view(id).unwrap().position, Point::from((656, 272)));

    left(&mut shell, ButtonState::Released);
    assert!(shell.grab().is_none());
    warp(&mut shell, 0.0, 0.0);
    assert_eq!(shell.view(id).unwrap().position, Point::from((656, 272)));
}

#[test]
fn grabbing_a_maximized_window_restores_normal_state() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");
    shell.toggle(id, ViewState::Maximized);

    warp(&mut shell, 300.0, 10.0);
    left(&mut shell, ButtonState::Pressed);
    let view = shell.view(id).unwrap();
    assert_eq!(view.state, ViewState::Normal);
    assert_eq!(view.target_size, None);
    assert!(shell.grab().is_some());
}

#[test]
fn client_resize_request_clamps_to_the_minimum() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");

    warp(&mut shell, 1364.0, 858.0);
    shell.resize_requested(id, ResizeEdge::BOTTOM_RIGHT);
    warp(&mut shell, 1464.0, 908.0);
    assert_eq!(
        shell.backend.last_requested_size(id),
        Some(Size::from((900, 650)))
    );

    warp(&mut shell, 0.0, 0.0);
    assert_eq!(
        shell.backend.last_requested_size(id),
        Some(Size::from((92, 24)))
    );
    assert_eq!(shell.view(id).unwrap().position, Point::from((556, 222)));
}

#[test]
fn content_clicks_focus_and_forward() {
    let mut shell = shell();
    let first = map(&mut shell, 1, (400, 300), "first");
    let second = map(&mut shell, 2, (200, 100), "second");
    assert_eq!(shell.focused(), Some(second));
    shell.backend.take_calls();

    // First window content spans (760,404)..(1160,704); second is centred on
    // top of it but smaller.
    click_at(&mut shell, 770.0, 700.0);
    assert_eq!(shell.focused(), Some(first));
    let calls = shell.backend.take_calls();
    assert!(calls.contains(&BackendCall::PointerFocus(Some((
        first,
        Point::from((10.0, 296.0))
    )))));
    assert!(calls.contains(&BackendCall::PointerButton(BTN_LEFT, ButtonState::Pressed)));
}

#[test]
fn content_wins_over_the_taskbar() {
    let mut shell = shell();
    let id = map_with(
        &mut shell,
        1,
        (1920, 1080),
        "cover",
        DecorationMode::ClientSide,
    );
    assert_eq!(shell.view(id).unwrap().position, Point::from((0, 0)));

    let start = Point::from((10.0, 1060.0));
    assert!(matches!(
        shell.hit_test(start),
        HitTarget::Content { view, .. } if view == id
    ));
    click_at(&mut shell, start.x, start.y);
    assert!(
        !shell
            .backend
            .calls()
            .iter()
            .any(|call| matches!(call, BackendCall::Spawn(_)))
    );
}

#[test]
fn decoration_wins_over_the_taskbar() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");

    // Drag the frame to (0,500) so its left border covers the start button.
    warp(&mut shell, TITLE_BAR.0, TITLE_BAR.1);
    left(&mut shell, ButtonState::Pressed);
    warp(&mut shell, 44.0, 508.0);
    left(&mut shell, ButtonState::Released);
    assert_eq!(shell.view(id).unwrap().position, Point::from((0, 500)));

    let border = Point::from((3.5, 1060.0));
    assert_eq!(
        shell.taskbar_hit(border).map(|button| button.kind),
        Some(TaskbarKind::Start)
    );
    assert_eq!(shell.hit_test(border), HitTarget::Decoration(id));
}

#[test]
fn desktop_clicks_pass_through() {
    let mut shell = shell();
    click_at(&mut shell, 100.0, 100.0);
    let calls = shell.backend.calls();
    assert!(calls.contains(&BackendCall::PointerFocus(None)));
    assert!(calls.contains(&BackendCall::PointerButton(BTN_LEFT, ButtonState::Pressed)));
}

#[test]
fn taskbar_clicks_act_on_release() {
    let mut shell = shell();
    let start = shell
        .taskbar_buttons()
        .into_iter()
        .find(|button| button.kind == TaskbarKind::Start)
        .unwrap();
    let rect = start.rect(shell.output_size);
    let (x, y) = (rect.loc.x as f64 + 5.0, rect.loc.y as f64 + 5.0);

    warp(&mut shell, x, y);
    left(&mut shell, ButtonState::Pressed);
    assert!(shell.taskbar_buttons()[0].sunken);
    left(&mut shell, ButtonState::Released);
    assert!(
        shell
            .backend
            .calls()
            .contains(&BackendCall::Spawn("foot".to_owned()))
    );

    let third = shell
        .taskbar_buttons()
        .into_iter()
        .find(|button| button.kind == TaskbarKind::Workspace(WorkspaceId::new(3).unwrap()))
        .unwrap();
    let rect = third.rect(shell.output_size);
    click_at(
        &mut shell,
        rect.loc.x as f64 + 2.0,
        rect.loc.y as f64 + 2.0,
    );
    assert_eq!(shell.current_workspace.get(), 3);
}

#[test]
fn taskbar_window_button_minimizes_and_restores() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (400, 300), "Editor");
    let button = shell
        .taskbar_buttons()
        .into_iter()
        .find(|button| button.kind == TaskbarKind::Window(id))
        .unwrap();
    let rect = button.rect(shell.output_size);
    let (x, y) = (rect.loc.x as f64 + 10.0, rect.loc.y as f64 + 10.0);

    click_at(&mut shell, x, y);
    assert_eq!(shell.view(id).unwrap().state, ViewState::Minimized);
    assert_eq!(shell.focused(), None);

    click_at(&mut shell, x, y);
    assert_eq!(shell.view(id).unwrap().state, ViewState::Normal);
    assert_eq!(shell.focused(), Some(id));
}

#[test]
fn destroy_scrubs_focus_grab_and_press() {
    let mut shell = shell();
    let first = map(&mut shell, 1, (400, 300), "first");
    let second = map(&mut shell, 2, (800, 600), "second");

    warp(&mut shell, CLOSE.0, CLOSE.1);
    left(&mut shell, ButtonState::Pressed);
    assert!(shell.pressed().references(second));
    shell.resize_requested(second, ResizeEdge::RIGHT);
    assert_eq!(shell.grab().map(|grab| grab.view), Some(second));
    assert_eq!(shell.focused(), Some(second));

    shell.destroyed(second);
    assert!(shell.view(second).is_none());
    assert_eq!(*shell.pressed(), Pressed::None);
    assert!(shell.grab().is_none());
    assert_eq!(shell.focused(), Some(first));

    left(&mut shell, ButtonState::Released);
    assert!(!shell.backend.close_requested(second));
}

#[test]
fn destroying_the_last_view_clears_keyboard_focus() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (400, 300), "only");
    shell.destroyed(id);
    assert_eq!(shell.focused(), None);
    assert_eq!(
        shell.backend.calls().last(),
        Some(&BackendCall::KeyboardFocus(None))
    );
}

#[test]
fn snap_chord_resolves_to_a_quadrant() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");

    modifiers(&mut shell, true, false);
    press_key(&mut shell, Keysym::Left);
    assert_eq!(shell.snap_chord(), Some(Direction::Left));
    assert_eq!(
        shell.backend.last_requested_size(id),
        Some(Size::from((952, 1012)))
    );

    press_key(&mut shell, Keysym::Up);
    assert_eq!(shell.snap_chord(), None);
    assert_eq!(
        shell.backend.last_requested_size(id),
        Some(Size::from((952, 488)))
    );
    commit(&mut shell, id, (952, 488));
    assert_eq!(
        shell.view(id).unwrap().frame_rect(),
        Rectangle::new((0, 0).into(), (960, 524).into())
    );
    assert_eq!(forwarded_keys(&shell), 2);
}

#[test]
fn parallel_arrow_restarts_the_chord() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");

    modifiers(&mut shell, true, false);
    press_key(&mut shell, Keysym::Left);
    press_key(&mut shell, Keysym::Right);
    assert_eq!(shell.snap_chord(), Some(Direction::Right));
    assert_eq!(shell.view(id).unwrap().position, Point::from((960, 0)));
}

#[test]
fn other_keys_break_the_chord() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");

    modifiers(&mut shell, true, false);
    press_key(&mut shell, Keysym::Left);
    press_key(&mut shell, Keysym::z);
    assert_eq!(shell.snap_chord(), None);

    press_key(&mut shell, Keysym::Up);
    assert_eq!(shell.snap_chord(), Some(Direction::Up));
    assert_eq!(
        shell.backend.last_requested_size(id),
        Some(Size::from((1912, 488)))
    );
}

#[test]
fn modifier_presses_keep_the_chord() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");

    modifiers(&mut shell, true, false);
    press_key(&mut shell, Keysym::Left);
    press_key(&mut shell, Keysym::Shift_L);
    modifiers(&mut shell, true, true);
    press_key(&mut shell, Keysym::Up);
    assert_eq!(shell.snap_chord(), None);
    assert_eq!(
        shell.backend.last_requested_size(id),
        Some(Size::from((952, 488)))
    );
}

#[test]
fn releasing_the_main_key_cancels_the_chord() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");

    modifiers(&mut shell, true, false);
    press_key(&mut shell, Keysym::Right);
    modifiers(&mut shell, false, false);
    assert_eq!(shell.snap_chord(), None);

    modifiers(&mut shell, true, false);
    press_key(&mut shell, Keysym::Down);
    assert_eq!(shell.view(id).unwrap().position, Point::from((0, 524)));
    assert_eq!(
        shell.backend.last_requested_size(id),
        Some(Size::from((1912, 488)))
    );
}

#[test]
fn unbound_keys_reach_the_client() {
    let mut shell = shell();
    map(&mut shell, 1, (400, 300), "Terminal");

    press_key(&mut shell, Keysym::a);
    assert_eq!(forwarded_keys(&shell), 2);

    modifiers(&mut shell, true, false);
    press_key(&mut shell, Keysym::z);
    assert_eq!(forwarded_keys(&shell), 4);
}

#[test]
fn default_bindings_and_workspace_keys() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (400, 300), "Terminal");

    modifiers(&mut shell, true, false);
    press_key(&mut shell, Keysym::Return);
    assert!(
        shell
            .backend
            .calls()
            .contains(&BackendCall::Spawn("foot".to_owned()))
    );

    press_key(&mut shell, Keysym::m);
    assert_eq!(shell.view(id).unwrap().state, ViewState::Maximized);

    modifiers(&mut shell, true, true);
    press_key(&mut shell, Keysym::_2);
    assert_eq!(shell.view(id).unwrap().workspace.get(), 2);
    assert_eq!(shell.focused(), None);

    modifiers(&mut shell, true, false);
    press_key(&mut shell, Keysym::_2);
    assert_eq!(shell.current_workspace.get(), 2);
    assert_eq!(shell.focused(), Some(id));

    modifiers(&mut shell, true, true);
    press_key(&mut shell, Keysym::Q);
    assert!(shell.backend.close_requested(id));
}

#[test]
fn relative_motion_wraps_at_the_edges() {
    let mut shell = shell();
    shell.on_pointer_event(PointerEvent::Motion {
        delta: (-5.0, 10.0).into(),
        time: 0,
    });
    assert_eq!(shell.pointer_location, Point::from((1919.0, 10.0)));

    shell.on_pointer_event(PointerEvent::Motion {
        delta: (5.0, 1100.0).into(),
        time: 0,
    });
    assert_eq!(shell.pointer_location, Point::from((0.0, 0.0)));
}

#[test]
fn motion_clamps_when_wrapping_is_off() {
    let mut config = bevel::config::RuntimeConfig::default();
    config.cursor_wrap = false;
    let mut shell = common::shell_with_config(config);
    shell.on_pointer_event(PointerEvent::Motion {
        delta: (-5.0, 5000.0).into(),
        time: 0,
    });
    assert_eq!(shell.pointer_location, Point::from((0.0, 1079.0)));
}

#[test]
fn scrolling_is_natural_by_default() {
    let mut shell = shell();
    let axis = AxisEvent {
        time: 3,
        source: AxisSource::Wheel,
        horizontal: 0.0,
        vertical: 15.0,
        horizontal_v120: None,
        vertical_v120: Some(120.0),
    };
    shell.on_pointer_event(PointerEvent::Axis(axis.clone()));
    assert_eq!(
        shell.backend.calls().last(),
        Some(&BackendCall::PointerAxis(axis.negated()))
    );

    shell.config.natural_scroll = false;
    shell.on_pointer_event(PointerEvent::Axis(axis.clone()));
    assert_eq!(
        shell.backend.calls().last(),
        Some(&BackendCall::PointerAxis(axis))
    );
}

#[test]
fn pointer_focus_follows_motion_outside_grabs() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");
    shell.backend.take_calls();

    warp(&mut shell, 600.0, 300.0);
    assert_eq!(
        shell.backend.calls().last(),
        Some(&BackendCall::PointerFocus(Some((
            id,
            Point::from((40.0, 46.0))
        ))))
    );
    warp(&mut shell, 5.0, 5.0);
    assert_eq!(
        shell.backend.calls().last(),
        Some(&BackendCall::PointerFocus(None))
    );
}

#[test]
fn unknown_view_ids_are_ignored() {
    let mut shell = shell();
    let ghost = ViewId::new(99);
    shell.mapped(ghost);
    shell.destroyed(ghost);
    shell.move_requested(ghost);
    shell.toggle(ghost, ViewState::Maximized);
    shell.focus_view(ghost);
    assert_eq!(shell.focused(), None);
    assert!(shell.backend.calls().is_empty());
}
