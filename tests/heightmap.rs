//! Height map and field shading through the controller.

mod common;

use std::time::Instant;

use simview::{Controller, Event, FieldSelection, MissingFieldPolicy, RevertMode};

fn loaded(n: usize) -> (Controller, tempfile::TempDir) {
    let dir = common::sequence(n);
    let mut ctl = Controller::default();
    ctl.load_blocking(dir.path(), Instant::now()).unwrap();
    (ctl, dir)
}

fn top(ctl: &Controller) -> f32 {
    ctl.preview_scene().unwrap().bounds.max.z
}

#[test]
fn test_restore_brings_back_heights() {
    let (mut ctl, _dir) = loaded(2);
    let now = Instant::now();
    ctl.set_height_scale(2.0);
    ctl.dispatch(Event::Select(FieldSelection::select("temperature")), now);
    ctl.dispatch(Event::HeightMap(true), now);
    assert_eq!(top(&ctl), 1.5);

    ctl.dispatch(Event::HeightMap(false), now);
    assert_eq!(top(&ctl), 0.5);
}

#[test]
fn test_flatten_drops_heights() {
    let (mut ctl, _dir) = loaded(2);
    let now = Instant::now();
    ctl.set_revert_mode(RevertMode::Flatten);
    ctl.dispatch(Event::Select(FieldSelection::select("temperature")), now);
    ctl.dispatch(Event::HeightMap(true), now);
    ctl.dispatch(Event::HeightMap(false), now);
    assert_eq!(top(&ctl), 0.0);

    // flattening applies to every frame
    ctl.dispatch(Event::Seek(1), now);
    assert_eq!(top(&ctl), 0.0);
}

#[test]
fn test_enable_twice_is_stable() {
    let (mut ctl, _dir) = loaded(1);
    let now = Instant::now();
    ctl.set_height_scale(1.0);
    ctl.dispatch(Event::Select(FieldSelection::select("temperature")), now);
    ctl.dispatch(Event::HeightMap(true), now);
    let first = top(&ctl);
    ctl.dispatch(Event::HeightMap(true), now);
    ctl.dispatch(Event::HeightMap(false), now);
    ctl.dispatch(Event::HeightMap(true), now);
    assert_eq!(top(&ctl), first);
}

#[test]
fn test_select_none_disables_height_map() {
    let (mut ctl, _dir) = loaded(1);
    let now = Instant::now();
    ctl.dispatch(Event::Select(FieldSelection::select("temperature")), now);
    ctl.dispatch(Event::HeightMap(true), now);
    ctl.dispatch(Event::Select(FieldSelection::None), now);
    assert!(!ctl.state().height_map);
    assert_eq!(top(&ctl), 0.5);
    assert!(!ctl.preview_scene().unwrap().is_shaded());
}

#[test]
fn test_missing_field_draws_unshaded() {
    let dir = common::sequence(1);
    common::write_bare_frame(&dir.path().join("1.vtk"));
    let mut ctl = Controller::default();
    let now = Instant::now();
    ctl.load_blocking(dir.path(), now).unwrap();

    ctl.dispatch(Event::Select(FieldSelection::select("pressure")), now);
    assert!(ctl.preview_scene().unwrap().is_shaded());

    ctl.dispatch(Event::Seek(1), now);
    assert!(!ctl.preview_scene().unwrap().is_shaded());
    assert!(ctl.status().starts_with("Viewing 1.vtk"));
}

#[test]
fn test_missing_field_fail_keeps_last_image() {
    let dir = common::sequence(1);
    common::write_bare_frame(&dir.path().join("1.vtk"));
    let mut ctl = Controller::default();
    let now = Instant::now();
    ctl.load_blocking(dir.path(), now).unwrap();
    ctl.set_missing_field_policy(MissingFieldPolicy::Fail);

    ctl.dispatch(Event::Select(FieldSelection::select("pressure")), now);
    ctl.dispatch(Event::Seek(1), now);
    assert_eq!(ctl.sink().label(), "0.vtk");
    assert!(ctl.status().contains("pressure"));
}
