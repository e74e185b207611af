mod common;

use bevel::{
    backend::headless::BackendCall,
    handlers::{OutputHandler, ToplevelHandler},
    view::{DecorationMode, ViewState},
};
use common::{commit, map, map_with, shell};
use smithay::utils::{Point, Size};

#[test]
fn mapped_window_is_centred_and_focused() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");

    let view = shell.view(id).unwrap();
    assert_eq!(view.frame_size(), Size::from((808, 636)));
    assert_eq!(view.position, Point::from((556, 222)));
    assert_eq!(view.content_origin(), Point::from((560, 254)));
    assert!(view.mapped);
    assert_eq!(shell.focused(), Some(id));
    assert!(shell.backend.calls().contains(&BackendCall::SetActivated(id, true)));
    assert!(shell.backend.calls().contains(&BackendCall::KeyboardFocus(Some(id))));
}

#[test]
fn initial_commit_lets_the_client_choose() {
    let mut shell = shell();
    let id = bevel::view::ViewId::new(9);
    shell.new_toplevel(id, Some(5));
    shell.committed(id, Size::from((0, 0)), true);
    assert_eq!(
        shell.backend.last_requested_size(id),
        Some(Size::from((0, 0)))
    );
    assert!(!shell.view(id).unwrap().mapped);
    assert_eq!(shell.views_mru().count(), 0);
}

#[test]
fn maximize_fills_the_usable_area_and_restores_exactly() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");

    shell.toggle(id, ViewState::Maximized);
    let view = shell.view(id).unwrap();
    assert_eq!(view.state, ViewState::Maximized);
    assert_eq!(view.position, Point::from((0, 0)));
    assert_eq!(view.target_size, Some(Size::from((1912, 1012))));
    assert_eq!(view.frame_size(), Size::from((1920, 1048)));
    assert!(shell.backend.calls().contains(&BackendCall::SetMaximized(id, true)));

    commit(&mut shell, id, (1912, 1012));
    shell.toggle(id, ViewState::Maximized);
    assert_eq!(
        shell.backend.last_requested_size(id),
        Some(Size::from((800, 600)))
    );
    commit(&mut shell, id, (800, 600));

    let view = shell.view(id).unwrap();
    assert_eq!(view.state, ViewState::Normal);
    assert_eq!(view.position, Point::from((556, 222)));
    assert_eq!(view.frame_size(), Size::from((808, 636)));
    assert_eq!(view.target_size, None);
}

#[test]
fn fullscreen_drops_the_decorations() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Video");

    shell.toggle(id, ViewState::Fullscreen);
    let view = shell.view(id).unwrap();
    assert_eq!(view.frame_rect().loc, Point::from((0, 0)));
    assert_eq!(view.target_size, Some(Size::from((1920, 1080))));
    assert_eq!(view.content_origin(), Point::from((0, 0)));
    assert!(shell.backend.calls().contains(&BackendCall::SetFullscreen(id, true)));
}

#[test]
fn snap_always_leaves_maximize() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");
    shell.toggle(id, ViewState::Maximized);

    let area = shell.usable_area();
    shell.snap(id, area);
    assert_eq!(shell.view(id).unwrap().state, ViewState::Normal);
    assert_eq!(
        shell.backend.last_requested_size(id),
        Some(Size::from((1912, 1012)))
    );
}

#[test]
fn client_side_decorations_have_no_insets() {
    let mut shell = shell();
    let id = map_with(&mut shell, 1, (640, 480), "csd", DecorationMode::ClientSide);
    let view = shell.view(id).unwrap();
    assert_eq!(view.frame_size(), Size::from((640, 480)));
    assert_eq!(view.position, Point::from((640, 300)));
}

#[test]
fn minimize_hides_and_hands_focus_on() {
    let mut shell = shell();
    let first = map(&mut shell, 1, (400, 300), "first");
    let second = map(&mut shell, 2, (500, 300), "second");
    assert_eq!(shell.focused(), Some(second));

    shell.toggle(second, ViewState::Minimized);
    assert!(!shell.is_visible(second));
    assert_eq!(shell.focused(), Some(first));

    shell.toggle(second, ViewState::Minimized);
    assert!(shell.is_visible(second));
    assert_eq!(shell.view(second).unwrap().state, ViewState::Normal);
}

#[test]
fn output_resize_replaces_maximized_and_fullscreen_views() {
    let mut shell = shell();
    let max = map(&mut shell, 1, (800, 600), "max");
    let full = map(&mut shell, 2, (800, 600), "full");
    let normal = map(&mut shell, 3, (300, 200), "normal");
    shell.toggle(max, ViewState::Maximized);
    shell.toggle(full, ViewState::Fullscreen);
    let normal_position = shell.view(normal).unwrap().position;

    shell.output_resized(Size::from((1280, 720)));
    assert_eq!(
        shell.backend.last_requested_size(max),
        Some(Size::from((1272, 652)))
    );
    assert_eq!(
        shell.backend.last_requested_size(full),
        Some(Size::from((1280, 720)))
    );
    assert_eq!(shell.view(normal).unwrap().position, normal_position);
}

#[test]
fn maximize_request_needs_a_mapped_view() {
    let mut shell = shell();
    let id = bevel::view::ViewId::new(4);
    shell.new_toplevel(id, None);
    shell.maximize_requested(id);
    assert_eq!(shell.view(id).unwrap().state, ViewState::Normal);

    let mapped = map(&mut shell, 5, (400, 300), "mapped");
    shell.maximize_requested(mapped);
    assert_eq!(shell.view(mapped).unwrap().state, ViewState::Maximized);
}

#[test]
fn fullscreen_request_only_acts_on_a_change() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Video");

    shell.fullscreen_requested(id, false);
    assert_eq!(shell.view(id).unwrap().state, ViewState::Normal);
    shell.fullscreen_requested(id, true);
    assert_eq!(shell.view(id).unwrap().state, ViewState::Fullscreen);
    shell.fullscreen_requested(id, true);
    assert_eq!(shell.view(id).unwrap().state, ViewState::Fullscreen);
    shell.fullscreen_requested(id, false);
    assert_eq!(shell.view(id).unwrap().state, ViewState::Normal);
}

#[test]
fn late_map_lands_on_the_current_workspace() {
    let mut shell = shell();
    let id = bevel::view::ViewId::new(7);
    shell.new_toplevel(id, None);
    shell.switch_workspace(bevel::workspace::WorkspaceId::new(2).unwrap());

    shell.committed(id, Size::from((0, 0)), true);
    commit(&mut shell, id, (400, 300));
    shell.mapped(id);

    assert_eq!(shell.view(id).unwrap().workspace.get(), 2);
    assert_eq!(shell.focused(), Some(id));
    assert!(shell.is_visible(id));
}

#[test]
fn unmapped_views_leave_the_stack() {
    let mut shell = shell();
    let first = map(&mut shell, 1, (400, 300), "first");
    let second = map(&mut shell, 2, (400, 300), "second");

    shell.unmapped(second);
    assert_eq!(shell.focused(), Some(first));
    assert_eq!(shell.views_mru().count(), 1);
    assert!(shell.view(second).is_some());
    assert!(!shell.is_visible(second));
}

#[test]
fn clients_report_lists_every_view() {
    let mut shell = shell();
    assert_eq!(shell.render_clients_report(), "No clients.\n");

    map(&mut shell, 1, (800, 600), "Terminal");
    let report = shell.render_clients_report();
    assert!(report.contains("Client 1:"));
    assert!(report.contains("title: Terminal"));
    assert!(report.contains("frame: 556,222 808x636"));
    assert!(report.contains("focused: true"));
}
