//! Owner of the dataset and the viewer state.
//!
//! The UI feeds [`Event`]s in through [`Controller::dispatch`] and calls
//! [`Controller::poll`] once per update; everything it draws comes back out
//! through the accessors.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::field::{FieldSelection, MissingFieldPolicy};
use crate::frames::{FrameStore, Progress};
use crate::heightmap::{HeightMap, RevertMode};
use crate::loader::{LoaderHandle, LoaderMessage};
use crate::playback::Timer;
use crate::record::{RecordOptions, DEFAULT_RECORDING, MAX_RECORD_SIZE};
use crate::render::{OrbitCamera, RenderSink, Scene, ShadingParams};
use crate::settings::Settings;
use crate::state::{Event, ViewerState};
use crate::util::Result;

pub struct Controller {
    store: FrameStore,
    state: ViewerState,
    height_map: HeightMap,
    height_scale: f32,
    revert_mode: RevertMode,
    sink: RenderSink,
    timer: Timer,
    loader: Option<LoaderHandle>,
    /// Epoch of the load whose messages are accepted
    load_epoch: Option<u64>,
    camera: OrbitCamera,
    /// Index of the frame last drawn
    shown: Option<usize>,
    status: String,
    progress: f32,
    dir: Option<PathBuf>,
    record_options: RecordOptions,
    recording_path: Option<PathBuf>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl Controller {
    pub fn new(settings: &Settings) -> Self {
        let state = ViewerState::default()
            .update(Event::SetStep(settings.step), 0)
            .update(Event::SetRate(settings.playback_rate), 0);
        Self {
            store: FrameStore::new(),
            state,
            height_map: HeightMap::new(),
            height_scale: settings.height_scale,
            revert_mode: settings.revert_mode,
            sink: RenderSink::new(settings.shading_params(), settings.missing_field),
            timer: Timer::new(),
            loader: None,
            load_epoch: None,
            camera: OrbitCamera::default(),
            shown: None,
            status: "Load a directory to begin".to_string(),
            progress: 0.0,
            dir: None,
            record_options: settings.record_options(),
            recording_path: settings.last_recording.clone(),
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Progress of the current load or height-map rebuild, `0..=1`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Index of the frame on screen. Lags [`ViewerState::index`] by one step
    /// while playing, since a tick draws before it advances.
    pub fn shown_index(&self) -> Option<usize> {
        self.shown
    }

    pub fn is_loading(&self) -> bool {
        self.load_epoch.is_some()
    }

    /// Directory of the loaded dataset.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.store.field_names()
    }

    pub fn preview_scene(&self) -> Option<&Scene> {
        self.sink.preview()
    }

    pub fn sink(&self) -> &RenderSink {
        &self.sink
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn height_scale(&self) -> f32 {
        self.height_scale
    }

    pub fn revert_mode(&self) -> RevertMode {
        self.revert_mode
    }

    pub fn recording_path(&self) -> Option<&Path> {
        self.recording_path.as_deref()
    }

    /// Time until the next playback tick, `None` when stopped.
    pub fn next_tick_in(&self, now: Instant) -> Option<Duration> {
        self.timer.remaining(now)
    }

    /// Apply `event` and run the side effects of the transition.
    pub fn dispatch(&mut self, event: Event, now: Instant) {
        let len = self.store.len();
        let prev = self.state.clone();
        match event {
            Event::Tick => {
                if prev.is_playing() && len > 0 {
                    self.render_current();
                    self.state = prev.update(Event::Tick, len);
                }
                return;
            }
            Event::LoadStarted | Event::Loaded { .. } => {
                debug!("{:?} is driven by the loader, ignoring", event);
                return;
            }
            Event::Recording(true) if !self.sink.is_recording() => {
                let path = self
                    .recording_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_RECORDING));
                if let Err(err) = self.start_recording(path) {
                    debug!("recording not started: {}", err);
                }
                return;
            }
            Event::Recording(false) => {
                if let Err(err) = self.stop_recording() {
                    debug!("recording closed with error: {}", err);
                }
                return;
            }
            Event::HeightMap(true) if prev.field == FieldSelection::None => {
                self.status = "Select a field before enabling the height map".to_string();
                return;
            }
            _ => {}
        }
        let seek = matches!(event, Event::Seek(_));
        self.state = prev.clone().update(event, len);
        self.apply_effects(&prev, now);
        // after a tick the state is one step ahead of the screen
        if seek && !self.state.is_playing() && self.shown != Some(self.state.index) {
            self.render_current();
        }
    }

    fn apply_effects(&mut self, prev: &ViewerState, now: Instant) {
        let next = self.state.clone();

        if next.is_playing() {
            if !prev.is_playing() || next.playback.rate != prev.playback.rate {
                self.timer.arm(next.playback.interval(), now);
            }
        } else {
            self.timer.disarm();
        }

        // Starting playback leaves the first draw to the first tick, so a
        // Play that also seeks does not show (or record) that frame twice.
        let starting = next.is_playing() && !prev.is_playing();
        let mut redraw = (next.index != prev.index && !starting) || next.field != prev.field;
        let mut notice = None;
        if next.height_map != prev.height_map || (next.height_map && next.field != prev.field) {
            notice = if next.height_map {
                self.rebuild_height_map()
            } else {
                self.revert_height_map();
                None
            };
            redraw = true;
        }
        if redraw {
            self.render_current();
        }
        if let Some(notice) = notice {
            self.status = notice;
        }
    }

    /// Displace every frame by the selected field. Returns a message for the
    /// status line when the rebuild failed.
    fn rebuild_height_map(&mut self) -> Option<String> {
        let Some(name) = self.state.field.name().map(str::to_owned) else {
            self.state.height_map = false;
            return None;
        };
        let progress = &mut self.progress;
        let result = self
            .height_map
            .apply_all(&self.store, &name, self.height_scale, |p| *progress = p.fraction());
        match result {
            Ok(()) => None,
            Err(err) => {
                warn!("height map from '{}' failed: {}", name, err);
                self.height_map.clear();
                self.state.height_map = false;
                Some(format!("Height map disabled: {}", err))
            }
        }
    }

    fn revert_height_map(&mut self) {
        let progress = &mut self.progress;
        self.height_map
            .revert_all(&self.store, self.revert_mode, |p| *progress = p.fraction());
    }

    /// Draw the frame at the current index.
    fn render_current(&mut self) {
        let index = self.state.index;
        let Ok(frame) = self.store.frame(index) else {
            return;
        };
        let geometry = self.height_map.positions(index, &frame.mesh.points);
        match self
            .sink
            .render(frame, geometry, &self.state.field, &self.camera)
        {
            Ok(report) => {
                self.shown = Some(index);
                self.status = match &report.field_error {
                    Some(err) => format!("Viewing {} ({})", report.label, err),
                    None => format!("Viewing {}", report.label),
                };
                if let Some(err) = report.recording_error {
                    self.state.recording = false;
                    self.status = err.to_string();
                }
            }
            Err(err) => {
                debug!("render of {} failed: {}", frame.label, err);
                self.status = format!("{}: {}", frame.label, err);
            }
        }
    }

    /// Load `dir` in the background. Playback stops and any load in flight is
    /// cancelled; the current dataset stays until the new one is complete.
    pub fn begin_load(&mut self, dir: PathBuf, now: Instant) {
        self.stop_for_load(now);
        let loader = self.loader.get_or_insert_with(LoaderHandle::spawn);
        self.load_epoch = Some(loader.request_load(dir.clone()));
        self.progress = 0.0;
        self.status = format!("Loading {}...", dir.display());
    }

    /// Load `dir` on the calling thread.
    pub fn load_blocking(&mut self, dir: &Path, now: Instant) -> Result<()> {
        self.stop_for_load(now);
        let progress = &mut self.progress;
        let result = FrameStore::load(dir, |p| *progress = p.fraction());
        self.finish_load(dir.to_path_buf(), result)
    }

    fn stop_for_load(&mut self, now: Instant) {
        let prev = self.state.clone();
        self.state = prev.clone().update(Event::LoadStarted, self.store.len());
        self.apply_effects(&prev, now);
        if let Some(loader) = &self.loader {
            loader.cancel_current();
        }
        self.load_epoch = None;
    }

    fn finish_load(&mut self, dir: PathBuf, result: Result<FrameStore>) -> Result<()> {
        self.load_epoch = None;
        let store = match result {
            Ok(store) => store,
            Err(err) => {
                warn!("Failed to load {}: {}", dir.display(), err);
                self.progress = 0.0;
                self.status = format!("Failed to load {}: {}", dir.display(), err);
                return Err(err);
            }
        };

        info!("Loaded {} frames from {}", store.len(), dir.display());
        let len = store.len();
        self.store = store;
        self.height_map.clear();
        self.sink.clear();
        self.shown = None;
        self.timer.disarm();
        self.state = self.state.clone().update(Event::Loaded { len }, len);
        if let Ok(first) = self.store.frame(0) {
            self.camera.fit(&first.mesh.bounds());
        }
        self.dir = Some(dir);
        self.progress = 1.0;
        self.render_current();
        Ok(())
    }

    /// Handle one loader message. Messages from superseded requests are dropped.
    fn handle_message(&mut self, msg: LoaderMessage) {
        if self.load_epoch != Some(msg.epoch()) {
            debug!("dropping stale loader message (epoch {})", msg.epoch());
            return;
        }
        match msg {
            LoaderMessage::Progress { progress, .. } => self.on_progress(&progress),
            LoaderMessage::Finished { dir, result, .. } => {
                // failures are already on the status line
                if let Err(err) = self.finish_load(dir, result) {
                    debug!("load finished with error: {}", err);
                }
            }
        }
    }

    fn on_progress(&mut self, progress: &Progress) {
        self.progress = progress.fraction();
        self.status = format!("Loading {}...", progress.label);
    }

    /// The loader thread exited without being asked to, most likely by
    /// panicking on a file. The load in flight counts as failed and the next
    /// [`begin_load`][Self::begin_load] starts a fresh thread.
    fn loader_lost(&mut self) {
        warn!("loader thread stopped unexpectedly");
        if let Some(mut loader) = self.loader.take() {
            loader.stop();
        }
        if self.load_epoch.take().is_some() {
            self.progress = 0.0;
            self.status = "Failed to load: loader stopped unexpectedly".to_string();
        }
    }

    /// Process loader messages, then the playback timer.
    pub fn poll(&mut self, now: Instant) {
        let mut messages = Vec::new();
        let mut lost = false;
        if let Some(loader) = &self.loader {
            loop {
                match loader.try_recv() {
                    Ok(msg) => messages.push(msg),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        lost = true;
                        break;
                    }
                }
            }
        }
        for msg in messages {
            self.handle_message(msg);
        }
        if lost {
            self.loader_lost();
        }
        if self.state.is_playing() && self.timer.poll(now) {
            self.dispatch(Event::Tick, now);
        }
    }

    /// Block until the current background load ends or `timeout` passes.
    /// Returns `false` on timeout.
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_loading() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            let Some(loader) = &self.loader else {
                self.loader_lost();
                break;
            };
            match loader.recv_timeout(left) {
                Ok(msg) => self.handle_message(msg),
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => self.loader_lost(),
            }
        }
        true
    }

    /// Open a recording at `path`; frames are appended on every render.
    pub fn start_recording(&mut self, path: PathBuf) -> Result<()> {
        let options = RecordOptions {
            fps: self.state.playback.rate,
            ..self.record_options
        };
        if let Err(err) = self.sink.start_recording(&path, options) {
            self.state.recording = false;
            self.status = err.to_string();
            return Err(err);
        }
        self.state = self.state.clone().update(Event::Recording(true), self.store.len());
        self.status = format!("Recording to {}", path.display());
        self.recording_path = Some(path);
        Ok(())
    }

    /// Close the recording. Returns the number of frames written.
    pub fn stop_recording(&mut self) -> Result<Option<usize>> {
        self.state = self.state.clone().update(Event::Recording(false), self.store.len());
        let result = self.sink.stop_recording();
        match &result {
            Ok(Some(frames)) => {
                let path = self.recording_path.as_deref().unwrap_or(Path::new(DEFAULT_RECORDING));
                self.status = format!("Wrote {} frames to {}", frames, path.display());
            }
            Ok(None) => {}
            Err(err) => self.status = err.to_string(),
        }
        result
    }

    pub fn set_height_scale(&mut self, scale: f32) {
        if !scale.is_finite() || scale == self.height_scale {
            return;
        }
        self.height_scale = scale;
        if self.state.height_map {
            if let Some(notice) = self.rebuild_height_map() {
                self.status = notice;
            }
            self.render_current();
        }
    }

    pub fn set_revert_mode(&mut self, mode: RevertMode) {
        self.revert_mode = mode;
    }

    pub fn set_shading(&mut self, params: ShadingParams) {
        self.sink.set_params(params);
        self.render_current();
    }

    pub fn set_missing_field_policy(&mut self, policy: MissingFieldPolicy) {
        self.sink.set_policy(policy);
    }

    pub fn set_record_size(&mut self, width: u32, height: u32) {
        self.record_options.width = width.clamp(1, MAX_RECORD_SIZE);
        self.record_options.height = height.clamp(1, MAX_RECORD_SIZE);
    }

    /// Copy the adjustable values back into `settings` for saving.
    pub fn store_settings(&self, settings: &mut Settings) {
        settings.playback_rate = self.state.playback.rate;
        settings.step = self.state.playback.step;
        settings.height_scale = self.height_scale;
        settings.revert_mode = self.revert_mode;
        settings.missing_field = self.sink.policy();
        settings.record_width = self.record_options.width;
        settings.record_height = self.record_options.height;
        settings.last_recording = self.recording_path.clone();
    }

    /// Cancel loading and close the recording.
    pub fn shutdown(&mut self) {
        if let Some(mut loader) = self.loader.take() {
            loader.stop();
        }
        self.load_epoch = None;
        if let Err(err) = self.stop_recording() {
            warn!("closing recording failed: {}", err);
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if self.sink.is_recording() {
            self.shutdown();
        }
    }
}
