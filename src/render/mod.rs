//! Turning a frame into pixels, for the screen and for the recorder.
//!
//! Both outputs go through the same [`Scene`] and [`ShadingParams`]: the
//! viewer draws the preview scene on the GPU, the recorder rasterizes it on
//! the CPU at the recording size.

pub mod camera;
pub mod colormap;
mod raster;
mod scene;

pub use camera::OrbitCamera;
pub use colormap::{builtin, ColorMap};
pub use raster::rasterize;
pub use scene::{Scene, ShadingParams, Vertex};

use std::path::Path;

use glam::Vec3;
use log::{debug, warn};

use crate::field::{FieldSelection, MissingFieldPolicy};
use crate::frames::Frame;
use crate::record::{RecordOptions, Recorder};
use crate::util::{Error, Result};

/// Outcome of one [`RenderSink::render`] call.
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Label of the frame drawn.
    pub label: String,
    /// Whether field colors were applied.
    pub shaded: bool,
    /// Whether a frame was appended to the recording.
    pub recorded: bool,
    /// Selected field was missing; the mesh was drawn without it.
    pub field_error: Option<Error>,
    /// Recording failed and was closed.
    pub recording_error: Option<Error>,
}

/// Holds the current preview scene and the open recording, if any.
#[derive(Debug, Default)]
pub struct RenderSink {
    params: ShadingParams,
    policy: MissingFieldPolicy,
    preview: Option<Scene>,
    label: String,
    generation: u64,
    recorder: Option<Recorder>,
}

impl RenderSink {
    pub fn new(params: ShadingParams, policy: MissingFieldPolicy) -> Self {
        Self {
            params,
            policy,
            ..Default::default()
        }
    }

    pub fn params(&self) -> &ShadingParams {
        &self.params
    }

    /// Takes effect on the next render.
    pub fn set_params(&mut self, params: ShadingParams) {
        self.params = params;
    }

    pub fn policy(&self) -> MissingFieldPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: MissingFieldPolicy) {
        self.policy = policy;
    }

    /// Scene of the last successful render.
    pub fn preview(&self) -> Option<&Scene> {
        self.preview.as_ref()
    }

    /// Label of the frame in the preview.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Bumped on every new preview scene.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop the preview, e.g. when a new dataset replaces the old one.
    pub fn clear(&mut self) {
        self.preview = None;
        self.label.clear();
        self.generation += 1;
    }

    /// Draw `frame` at `geometry` (one position per mesh point) and record it
    /// if a recording is open.
    ///
    /// A missing field is handled according to the [`MissingFieldPolicy`]:
    /// `Unshaded` draws the plain mesh and reports the error in the returned
    /// [`RenderReport`], `Fail` returns the error and leaves the preview and
    /// the recording untouched. A recording failure never fails the render.
    pub fn render(
        &mut self,
        frame: &Frame,
        geometry: &[Vec3],
        field: &FieldSelection,
        camera: &OrbitCamera,
    ) -> Result<RenderReport> {
        let mut report = RenderReport {
            label: frame.label.clone(),
            ..Default::default()
        };
        let scene = match Scene::build(geometry, &frame.mesh, field, &self.params) {
            Ok(scene) => scene,
            Err(err) if err.is_field() && self.policy == MissingFieldPolicy::Unshaded => {
                debug!("{}: {}, drawing unshaded", frame.label, err);
                report.field_error = Some(err);
                Scene::build(geometry, &frame.mesh, &FieldSelection::None, &self.params)?
            }
            Err(err) => return Err(err),
        };
        report.shaded = scene.is_shaded();

        if let Some(recorder) = self.recorder.as_mut() {
            let RecordOptions { width, height, .. } = recorder.options();
            let image = rasterize(&scene, camera, width, height, &self.params);
            match recorder.append(&image) {
                Ok(()) => report.recorded = true,
                Err(err) => {
                    warn!("Recording stopped: {}", err);
                    if let Some(recorder) = self.recorder.take() {
                        if let Err(err) = recorder.finish() {
                            debug!("closing failed recording: {}", err);
                        }
                    }
                    report.recording_error = Some(Error::recording(err.to_string()));
                }
            }
        }

        self.preview = Some(scene);
        self.label = frame.label.clone();
        self.generation += 1;
        Ok(report)
    }

    /// Open a recording, closing any previous one first.
    pub fn start_recording(&mut self, path: &Path, options: RecordOptions) -> Result<()> {
        self.stop_recording()?;
        self.recorder = Some(Recorder::open(path, options)?);
        Ok(())
    }

    /// Close the recording. Returns the frame count, `None` if none was open.
    pub fn stop_recording(&mut self) -> Result<Option<usize>> {
        self.recorder.take().map(Recorder::finish).transpose()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn recorder(&self) -> Option<&Recorder> {
        self.recorder.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Field;
    use crate::testing::two_triangles;

    fn frame() -> Frame {
        let mesh = two_triangles()
            .with_field(Field::cell("p", vec![1.0, 2.0]))
            .unwrap();
        Frame::new("0.vtk", "0.vtk", mesh)
    }

    #[test]
    fn test_render_sets_preview() {
        let frame = frame();
        let mut sink = RenderSink::default();
        assert!(sink.preview().is_none());
        let report = sink
            .render(&frame, &frame.mesh.points, &FieldSelection::select("p"), &OrbitCamera::default())
            .unwrap();
        assert!(report.shaded);
        assert!(!report.recorded);
        assert_eq!(sink.label(), "0.vtk");
        assert_eq!(sink.generation(), 1);
        assert!(sink.preview().unwrap().is_shaded());
    }

    #[test]
    fn test_missing_field_unshaded() {
        let frame = frame();
        let mut sink = RenderSink::default();
        let report = sink
            .render(&frame, &frame.mesh.points, &FieldSelection::select("nope"), &OrbitCamera::default())
            .unwrap();
        assert!(!report.shaded);
        assert!(matches!(report.field_error, Some(Error::FieldNotFound(_))));
        assert!(sink.preview().is_some());
    }

    #[test]
    fn test_missing_field_fail_keeps_preview() {
        let frame = frame();
        let mut sink = RenderSink::new(ShadingParams::default(), MissingFieldPolicy::Fail);
        sink.render(&frame, &frame.mesh.points, &FieldSelection::select("p"), &OrbitCamera::default())
            .unwrap();
        let err = sink
            .render(&frame, &frame.mesh.points, &FieldSelection::select("nope"), &OrbitCamera::default())
            .unwrap_err();
        assert!(err.is_field());
        assert_eq!(sink.generation(), 1);
        assert!(sink.preview().unwrap().is_shaded());
    }

    #[test]
    fn test_recording_appends() {
        let dir = tempfile::tempdir().unwrap();
        let frame = frame();
        let mut sink = RenderSink::default();
        let options = RecordOptions {
            width: 16,
            height: 12,
            fps: 10.0,
        };
        sink.start_recording(&dir.path().join("seq"), options).unwrap();
        for _ in 0..3 {
            let report = sink
                .render(&frame, &frame.mesh.points, &FieldSelection::None, &OrbitCamera::default())
                .unwrap();
            assert!(report.recorded);
        }
        assert_eq!(sink.stop_recording().unwrap(), Some(3));
        assert!(!sink.is_recording());
        assert_eq!(sink.stop_recording().unwrap(), None);
    }

    #[test]
    fn test_recording_failure_closes_recorder() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("seq");
        let frame = frame();
        let mut sink = RenderSink::default();
        sink.start_recording(&out, RecordOptions::default()).unwrap();
        // pull the directory out from under the recorder
        std::fs::remove_dir_all(&out).unwrap();
        std::fs::write(&out, "not a directory").unwrap();

        let report = sink
            .render(&frame, &frame.mesh.points, &FieldSelection::None, &OrbitCamera::default())
            .unwrap();
        assert!(!report.recorded);
        assert!(matches!(report.recording_error, Some(Error::Recording(_))));
        assert!(!sink.is_recording());
        assert!(sink.preview().is_some());
    }
}
