//! Error types for the viewer library.

use std::path::PathBuf;
use thiserror::Error;

use crate::mesh::MeshError;

/// Main error type for simview operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Directory or file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A mesh file could not be parsed
    #[error("Failed to read {}: {source}", path.display())]
    Mesh {
        path: PathBuf,
        #[source]
        source: MeshError,
    },

    /// Directory contains no files with a supported mesh extension
    #[error("No mesh files found in {}", .0.display())]
    EmptyDirectory(PathBuf),

    /// Load was superseded by a newer request
    #[error("Load cancelled")]
    Cancelled,

    /// Selected field does not exist on the mesh being drawn
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// An operation needs a field but none is selected
    #[error("No field selected")]
    NoFieldSelected,

    /// Frame index outside the loaded sequence
    #[error("Frame index {index} out of range (count: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Output animation could not be opened or written
    #[error("Recording failed: {0}")]
    Recording(String),

    /// Image encoding error while recording
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Settings file could not be read or written
    #[error("Settings error: {0}")]
    Settings(String),
}

impl Error {
    /// Create a recording error from a string.
    pub fn recording(msg: impl Into<String>) -> Self {
        Self::Recording(msg.into())
    }

    /// Errors that abort a directory load.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Mesh { .. } | Self::EmptyDirectory(_) | Self::Cancelled
        )
    }

    /// Errors caused by the selected field not being usable.
    pub fn is_field(&self) -> bool {
        matches!(self, Self::FieldNotFound(_) | Self::NoFieldSelected)
    }

    /// Errors raised by the output animation.
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording(_) | Self::Image(_))
    }
}

/// Result type alias for simview operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::IndexOutOfRange { index: 5, len: 3 };
        assert!(e.to_string().contains('5'));
        assert!(e.to_string().contains('3'));

        let e = Error::FieldNotFound("pressure".into());
        assert!(e.to_string().contains("pressure"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_io());
        assert!(!err.is_field());
    }

    #[test]
    fn test_error_classes() {
        assert!(Error::Cancelled.is_io());
        assert!(Error::NoFieldSelected.is_field());
        assert!(Error::recording("disk full").is_recording());
        assert!(!Error::recording("disk full").is_io());
    }
}
