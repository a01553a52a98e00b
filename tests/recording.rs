//! Recording playback to disk.

mod common;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use simview::{Controller, Event};

fn recording_controller(frames: usize) -> (Controller, tempfile::TempDir) {
    let dir = common::sequence(frames);
    let mut ctl = Controller::default();
    ctl.set_record_size(40, 30);
    ctl.load_blocking(dir.path(), Instant::now()).unwrap();
    (ctl, dir)
}

#[test]
fn test_gif_has_one_frame_per_tick() {
    let (mut ctl, dir) = recording_controller(3);
    let out = dir.path().join("out.gif");
    let now = Instant::now();

    ctl.dispatch(Event::Play { from: Some(0) }, now);
    ctl.start_recording(out.clone()).unwrap();
    assert!(ctl.state().recording);
    for _ in 0..5 {
        ctl.dispatch(Event::Tick, now);
    }
    assert_eq!(ctl.stop_recording().unwrap(), Some(5));
    assert!(!ctl.state().recording);

    let decoder = GifDecoder::new(BufReader::new(File::open(&out).unwrap())).unwrap();
    assert_eq!(decoder.into_frames().count(), 5);
}

#[test]
fn test_play_from_later_frame_records_each_tick_once() {
    let (mut ctl, dir) = recording_controller(3);
    let out = dir.path().join("from_one.gif");
    let now = Instant::now();

    ctl.start_recording(out.clone()).unwrap();
    ctl.dispatch(Event::Play { from: Some(1) }, now);
    let mut shown = Vec::new();
    for _ in 0..3 {
        ctl.dispatch(Event::Tick, now);
        shown.push(ctl.sink().label().to_string());
    }
    assert_eq!(shown, ["1.vtk", "2.vtk", "0.vtk"]);
    assert_eq!(ctl.shown_index(), Some(0));
    assert_eq!(ctl.stop_recording().unwrap(), Some(3));

    let decoder = GifDecoder::new(BufReader::new(File::open(&out).unwrap())).unwrap();
    assert_eq!(decoder.into_frames().count(), 3);
}

#[cfg(unix)]
#[test]
fn test_full_disk_reported_on_stop() {
    let full = Path::new("/dev/full");
    if !full.exists() {
        return;
    }
    let (mut ctl, dir) = recording_controller(2);
    let out = dir.path().join("out.gif");
    std::os::unix::fs::symlink(full, &out).unwrap();

    ctl.start_recording(out).unwrap();
    ctl.dispatch(Event::Seek(1), Instant::now());
    assert!(ctl.stop_recording().is_err());
    assert!(!ctl.state().recording);
    assert!(ctl.status().starts_with("Recording failed"));
}

#[test]
fn test_png_sequence() {
    let (mut ctl, dir) = recording_controller(2);
    let out = dir.path().join("shots");
    let now = Instant::now();

    ctl.dispatch(Event::Play { from: Some(0) }, now);
    ctl.start_recording(out.clone()).unwrap();
    for _ in 0..3 {
        ctl.dispatch(Event::Tick, now);
    }
    assert_eq!(ctl.stop_recording().unwrap(), Some(3));

    let mut names: Vec<String> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["frame_00000.png", "frame_00001.png", "frame_00002.png"]);

    let first = image::open(out.join("frame_00000.png")).unwrap();
    assert_eq!((first.width(), first.height()), (40, 30));
}

#[test]
fn test_stopped_playback_records_seeks_only() {
    let (mut ctl, dir) = recording_controller(3);
    let out = dir.path().join("seek.gif");
    let now = Instant::now();

    ctl.start_recording(out).unwrap();
    // not playing: ticks draw nothing
    ctl.dispatch(Event::Tick, now);
    ctl.dispatch(Event::Seek(2), now);
    assert_eq!(ctl.stop_recording().unwrap(), Some(1));
}

#[test]
fn test_stop_without_recording() {
    let (mut ctl, _dir) = recording_controller(1);
    assert_eq!(ctl.stop_recording().unwrap(), None);
}
