//! Scalar field to z displacement.
//!
//! Loaded meshes are never modified. Displaced (or flattened) positions live in
//! a per-frame cache next to the store and are handed to the renderer in place
//! of the base points.

use glam::Vec3;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::frames::{FrameStore, Progress};
use crate::mesh::Mesh;
use crate::util::{Error, Result};

pub const DEFAULT_SCALE: f32 = 5.0;

/// What turning the height map off does to the geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevertMode {
    /// Set every z to 0, discarding the original heights.
    Flatten,
    /// Show the loaded geometry again.
    #[default]
    Restore,
}

/// Positions of `mesh` with z replaced by `values * scale`.
pub fn displace(mesh: &Mesh, values: &[f32], scale: f32) -> Vec<Vec3> {
    mesh.points
        .iter()
        .zip(values)
        .map(|(p, &v)| Vec3::new(p.x, p.y, v * scale))
        .collect()
}

pub fn flatten(mesh: &Mesh) -> Vec<Vec3> {
    mesh.points.iter().map(|p| Vec3::new(p.x, p.y, 0.0)).collect()
}

fn displaced_for(mesh: &Mesh, field: &str, scale: f32) -> Result<Vec<Vec3>> {
    let values = mesh
        .point_values(field)
        .ok_or_else(|| Error::FieldNotFound(field.to_string()))?;
    Ok(displace(mesh, &values, scale))
}

/// Derived geometry cache, one slot per frame.
#[derive(Clone, Debug, Default)]
pub struct HeightMap {
    derived: Vec<Option<Vec<Vec3>>>,
    field: Option<String>,
}

impl HeightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field the cache was last built from, `None` when reverted.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn is_derived(&self, frame_index: usize) -> bool {
        matches!(self.derived.get(frame_index), Some(Some(_)))
    }

    pub fn clear(&mut self) {
        self.derived.clear();
        self.field = None;
    }

    fn slot(&mut self, frame_index: usize) -> &mut Option<Vec<Vec3>> {
        if self.derived.len() <= frame_index {
            self.derived.resize(frame_index + 1, None);
        }
        &mut self.derived[frame_index]
    }

    /// Displace one frame. Computed from the base points, so repeated calls
    /// give the same result.
    pub fn apply(&mut self, frame_index: usize, mesh: &Mesh, field: &str, scale: f32) -> Result<()> {
        let positions = displaced_for(mesh, field, scale)?;
        *self.slot(frame_index) = Some(positions);
        self.field = Some(field.to_string());
        Ok(())
    }

    pub fn revert(&mut self, frame_index: usize, mesh: &Mesh, mode: RevertMode) {
        *self.slot(frame_index) = match mode {
            RevertMode::Flatten => Some(flatten(mesh)),
            RevertMode::Restore => None,
        };
    }

    /// Displace every frame of `store`.
    ///
    /// Frames are processed in parallel batches; `progress` is called once per
    /// frame in order. If any frame lacks `field` the cache is left as it was.
    pub fn apply_all(
        &mut self,
        store: &FrameStore,
        field: &str,
        scale: f32,
        progress: impl FnMut(&Progress),
    ) -> Result<()> {
        let derived = compute_all(store, progress, |mesh| displaced_for(mesh, field, scale))?;
        debug!("height map built from '{}' over {} frames", field, derived.len());
        self.derived = derived.into_iter().map(Some).collect();
        self.field = Some(field.to_string());
        Ok(())
    }

    pub fn revert_all(
        &mut self,
        store: &FrameStore,
        mode: RevertMode,
        mut progress: impl FnMut(&Progress),
    ) {
        match mode {
            RevertMode::Restore => {
                self.derived.clear();
                for (idx, frame) in store.iter().enumerate() {
                    progress(&Progress {
                        done: idx + 1,
                        total: store.len(),
                        label: frame.label.clone(),
                    });
                }
            }
            RevertMode::Flatten => {
                // flatten cannot fail
                if let Ok(flat) = compute_all(store, progress, |mesh| Ok(flatten(mesh))) {
                    self.derived = flat.into_iter().map(Some).collect();
                }
            }
        }
        self.field = None;
    }

    /// Geometry to draw for a frame: the derived positions when present,
    /// otherwise `base`.
    pub fn positions<'a>(&'a self, frame_index: usize, base: &'a [Vec3]) -> &'a [Vec3] {
        match self.derived.get(frame_index) {
            Some(Some(derived)) => derived,
            _ => base,
        }
    }
}

fn compute_all<F>(
    store: &FrameStore,
    mut progress: impl FnMut(&Progress),
    f: F,
) -> Result<Vec<Vec<Vec3>>>
where
    F: Fn(&Mesh) -> Result<Vec<Vec3>> + Sync,
{
    let frames: Vec<_> = store.iter().collect();
    let total = frames.len();
    let batch = rayon::current_num_threads().max(1);
    let mut out = Vec::with_capacity(total);
    for chunk in frames.chunks(batch) {
        let computed: Vec<Vec<Vec3>> = chunk
            .par_iter()
            .map(|frame| f(frame.mesh.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        for (frame, positions) in chunk.iter().zip(computed) {
            out.push(positions);
            progress(&Progress {
                done: out.len(),
                total,
                label: frame.label.clone(),
            });
        }
    }
    Ok(out)
}
