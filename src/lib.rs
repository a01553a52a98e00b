//! # simview
//!
//! Viewer for time series of simulation result meshes: load a directory of
//! snapshots, color them by a scalar field, lift them into a height map, play
//! them back and record the playback.
//!
//! ## Modules
//!
//! - [`mesh`] - Mesh model and the VTK / Gmsh readers
//! - [`frames`] - Ordered frame store loaded from a directory
//! - [`loader`] - Background directory loading
//! - [`field`] - Field selection
//! - [`heightmap`] - Field to z displacement
//! - [`playback`] - Playback parameters and timer
//! - [`state`] - Viewer state transitions
//! - [`render`] - Scene building, recording rasterizer, render sink
//! - [`record`] - GIF / PNG sequence output
//! - [`controller`] - Ties the above together for the UI
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Instant;
//! use simview::{Controller, Event, FieldSelection};
//!
//! let mut ctl = Controller::default();
//! ctl.load_blocking("results/".as_ref(), Instant::now())?;
//! ctl.dispatch(Event::Select(FieldSelection::select("pressure")), Instant::now());
//! ctl.start_recording("run.gif".into())?;
//! ctl.dispatch(Event::Play { from: Some(0) }, Instant::now());
//! ```

pub mod util;
pub mod mesh;
pub mod frames;
pub mod loader;
pub mod field;
pub mod heightmap;
pub mod playback;
pub mod state;
pub mod render;
pub mod record;
pub mod settings;
pub mod controller;

// Desktop UI (optional, enabled with "viewer" feature)
#[cfg(feature = "viewer")]
pub mod viewer;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use controller::Controller;
pub use field::{FieldSelection, MissingFieldPolicy};
pub use frames::{Frame, FrameStore, Progress};
pub use heightmap::{HeightMap, RevertMode};
pub use mesh::{read_mesh, Mesh, MeshError};
pub use settings::Settings;
pub use state::{Event, ViewerState};
pub use util::{Error, Result};
