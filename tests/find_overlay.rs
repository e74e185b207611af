mod common;

use bevel::{backend::headless::BackendCall, view::ViewState, workspace::WorkspaceId};
use common::{click_at, forwarded_keys, map, modifiers, press_key, shell, type_text};
use smithay::input::keyboard::Keysym;

#[test]
fn query_narrows_the_matches() {
    let mut shell = shell();
    let terminal = map(&mut shell, 1, (800, 600), "Terminal");
    map(&mut shell, 2, (400, 300), "Other");

    shell.toggle_find();
    assert_eq!(shell.find_matches().len(), 2);
    type_text(&mut shell, "term");
    assert_eq!(shell.find.query(), "term");
    assert_eq!(shell.find_matches(), vec![terminal]);
}

#[test]
fn keys_never_leak_to_clients_while_open() {
    let mut shell = shell();
    map(&mut shell, 1, (800, 600), "Terminal");

    shell.toggle_find();
    type_text(&mut shell, "xyz");
    press_key(&mut shell, Keysym::Down);
    press_key(&mut shell, Keysym::BackSpace);
    assert_eq!(forwarded_keys(&shell), 0);
    assert_eq!(shell.find.query(), "xy");
}

#[test]
fn return_switches_workspace_and_focuses_the_selection() {
    let mut shell = shell();
    let terminal = map(&mut shell, 1, (800, 600), "Terminal");
    let editor = map(&mut shell, 2, (400, 300), "Editor");
    shell.move_focused_window_to_workspace(WorkspaceId::new(4).unwrap());
    assert_eq!(shell.focused(), Some(terminal));

    shell.toggle_find();
    type_text(&mut shell, "edit");
    press_key(&mut shell, Keysym::Return);

    assert!(!shell.find.is_open());
    assert_eq!(shell.current_workspace.get(), 4);
    assert_eq!(shell.focused(), Some(editor));
}

#[test]
fn selection_is_clamped_when_activated() {
    let mut shell = shell();
    map(&mut shell, 1, (800, 600), "alpha");
    let beta = map(&mut shell, 2, (400, 300), "beta");
    map(&mut shell, 3, (300, 200), "gamma");

    shell.toggle_find();
    for _ in 0..10 {
        press_key(&mut shell, Keysym::Down);
    }
    assert_eq!(shell.find.selected(), 10);
    // MRU order: gamma, beta, alpha. Narrowing to one match clamps to it.
    type_text(&mut shell, "b");
    for _ in 0..5 {
        press_key(&mut shell, Keysym::Down);
    }
    press_key(&mut shell, Keysym::Return);
    assert_eq!(shell.focused(), Some(beta));
}

#[test]
fn minimized_windows_are_not_listed() {
    let mut shell = shell();
    let first = map(&mut shell, 1, (800, 600), "first");
    let second = map(&mut shell, 2, (400, 300), "second");
    shell.toggle(second, ViewState::Minimized);

    shell.toggle_find();
    assert_eq!(shell.find_matches(), vec![first]);
}

#[test]
fn escape_closes_without_acting() {
    let mut shell = shell();
    let first = map(&mut shell, 1, (800, 600), "first");
    map(&mut shell, 2, (400, 300), "second");

    shell.toggle_find();
    press_key(&mut shell, Keysym::Down);
    press_key(&mut shell, Keysym::Escape);
    assert!(!shell.find.is_open());
    assert_ne!(shell.focused(), Some(first));

    let before = forwarded_keys(&shell);
    press_key(&mut shell, Keysym::a);
    assert_eq!(forwarded_keys(&shell), before + 2);
}

#[test]
fn shortcuts_still_work_with_the_main_key_held() {
    let mut shell = shell();
    map(&mut shell, 1, (800, 600), "first");

    modifiers(&mut shell, true, true);
    press_key(&mut shell, Keysym::F);
    assert!(shell.find.is_open());

    press_key(&mut shell, Keysym::F);
    assert!(!shell.find.is_open());
}

#[test]
fn overlay_swallows_clicks() {
    let mut shell = shell();
    let id = map(&mut shell, 1, (800, 600), "Terminal");
    shell.toggle_find();
    shell.backend.take_calls();

    // Close button of the window behind the overlay.
    click_at(&mut shell, 1340.0, 230.0);
    assert!(!shell.backend.close_requested(id));
    assert!(
        !shell
            .backend
            .calls()
            .iter()
            .any(|call| matches!(call, BackendCall::SetActivated(..)))
    );
}

#[test]
fn switching_workspace_closes_the_overlay() {
    let mut shell = shell();
    shell.toggle_find();
    shell.switch_workspace(WorkspaceId::new(2).unwrap());
    assert!(!shell.find.is_open());
}

#[test]
fn untitled_windows_are_not_listed() {
    let mut shell = shell();
    let titled = map(&mut shell, 1, (800, 600), "Terminal");
    map(&mut shell, 2, (400, 300), "");

    shell.toggle_find();
    assert_eq!(shell.find_matches(), vec![titled]);
}
