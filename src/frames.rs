//! Ordered sequence of mesh snapshots loaded from a directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};

use crate::mesh::{self, Mesh};
use crate::util::{natural_cmp, Error, Result};

/// One loaded snapshot.
#[derive(Clone, Debug)]
pub struct Frame {
    /// File name, shown in the UI.
    pub label: String,
    pub path: PathBuf,
    pub mesh: Arc<Mesh>,
}

impl Frame {
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>, mesh: Mesh) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            mesh: Arc::new(mesh),
        }
    }
}

/// Load progress, reported after each file.
#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub label: String,
}

impl Progress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f32 / self.total as f32
        }
    }
}

/// The active dataset.
#[derive(Clone, Debug, Default)]
pub struct FrameStore {
    frames: Vec<Frame>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Mesh files in `dir`, in natural file name order.
    ///
    /// Subdirectories, hidden files and files without a supported extension
    /// are skipped.
    pub fn list_directory(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<(String, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !path.is_file() {
                debug!("skipping {}", path.display());
                continue;
            }
            if !mesh::is_supported(&path) {
                debug!("skipping unsupported file {}", path.display());
                continue;
            }
            files.push((name, path));
        }
        files.sort_by(|a, b| natural_cmp(&a.0, &b.0));
        Ok(files.into_iter().map(|(_, p)| p).collect())
    }

    /// Load every mesh in `dir`.
    ///
    /// Either the whole directory loads or an error is returned; a caller's
    /// existing store is never partially replaced.
    pub fn load(dir: &Path, progress: impl FnMut(&Progress)) -> Result<Self> {
        Self::load_cancellable(dir, &AtomicBool::new(false), progress)
    }

    /// [`load`][Self::load] that gives up with [`Error::Cancelled`] once
    /// `cancel` is set. The flag is checked before each file.
    pub fn load_cancellable(
        dir: &Path,
        cancel: &AtomicBool,
        mut progress: impl FnMut(&Progress),
    ) -> Result<Self> {
        let files = Self::list_directory(dir)?;
        if files.is_empty() {
            return Err(Error::EmptyDirectory(dir.to_path_buf()));
        }

        info!("Loading {} meshes from {}", files.len(), dir.display());
        let total = files.len();
        let mut frames = Vec::with_capacity(total);
        for (idx, path) in files.into_iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                info!("Load of {} cancelled", dir.display());
                return Err(Error::Cancelled);
            }
            let label = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mesh = mesh::read_mesh(&path).map_err(|source| Error::Mesh {
                path: path.clone(),
                source,
            })?;
            debug!(
                "{}: {} points, {} cells, fields {:?}",
                label,
                mesh.points.len(),
                mesh.cells.len(),
                mesh.field_names()
            );
            progress(&Progress {
                done: idx + 1,
                total,
                label: label.clone(),
            });
            frames.push(Frame {
                label,
                path,
                mesh: Arc::new(mesh),
            });
        }
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`. Check [`is_empty`][Self::is_empty] before calling.
    pub fn frame(&self, index: usize) -> Result<&Frame> {
        self.frames.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.frames.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.label.as_str()).collect()
    }

    /// Field names of the first frame. All frames are assumed to share them.
    pub fn field_names(&self) -> Vec<String> {
        self.frames
            .first()
            .map(|f| f.mesh.field_names())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{two_triangles, write_vtk_frame};

    #[test]
    fn test_empty_store_index_error() {
        let store = FrameStore::new();
        assert!(store.is_empty());
        assert!(matches!(
            store.frame(0),
            Err(Error::IndexOutOfRange { index: 0, len: 0 })
        ));
        assert!(store.field_names().is_empty());
    }

    #[test]
    fn test_frame_out_of_range() {
        let store = FrameStore::from_frames(vec![Frame::new("a", "a.vtk", two_triangles())]);
        assert!(store.frame(0).is_ok());
        assert!(matches!(store.frame(1), Err(Error::IndexOutOfRange { index: 1, len: 1 })));
    }

    #[test]
    fn test_list_directory_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["10.vtk", "2.vtk", "1.vtk"] {
            write_vtk_frame(&dir.path().join(name), 0.0);
        }
        std::fs::write(dir.path().join("README.txt"), "notes").unwrap();
        std::fs::write(dir.path().join(".hidden.vtk"), "junk").unwrap();
        std::fs::create_dir(dir.path().join("sub.vtk")).unwrap();

        let files = FrameStore::list_directory(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["1.vtk", "2.vtk", "10.vtk"]);
    }

    #[test]
    fn test_progress_reported_per_file() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.vtk", "b.vtk", "c.vtk"] {
            write_vtk_frame(&dir.path().join(name), 1.0);
        }
        let mut seen = Vec::new();
        let store = FrameStore::load(dir.path(), |p| seen.push((p.done, p.total))).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_cancelled_load() {
        let dir = tempfile::tempdir().unwrap();
        write_vtk_frame(&dir.path().join("1.vtk"), 0.0);
        let cancel = AtomicBool::new(true);
        let err = FrameStore::load_cancellable(dir.path(), &cancel, |_| {}).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = FrameStore::load(dir.path(), |_| {}).unwrap_err();
        assert!(matches!(err, Error::EmptyDirectory(_)));
        assert!(err.is_io());
    }

    #[test]
    fn test_progress_fraction() {
        let p = Progress { done: 1, total: 4, label: String::new() };
        assert_eq!(p.fraction(), 0.25);
    }
}
