//! Which scalar field is chosen for coloring and height mapping.

use serde::{Deserialize, Serialize};

use crate::mesh::Mesh;
use crate::util::{Error, Result};

/// Label shown for [`FieldSelection::None`].
pub const NONE_LABEL: &str = "Select field...";

/// Current field choice. Names are not validated on selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FieldSelection {
    /// Nothing chosen: draw the plain surface.
    #[default]
    None,
    Named(String),
}

impl FieldSelection {
    pub fn select(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Named(n) => Some(n),
        }
    }

    pub fn label(&self) -> &str {
        self.name().unwrap_or(NONE_LABEL)
    }

    /// Per-point values of the selected field on `mesh`.
    ///
    /// `Ok(None)` when nothing is selected, [`Error::FieldNotFound`] when the
    /// mesh lacks the named field.
    pub fn resolve(&self, mesh: &Mesh) -> Result<Option<Vec<f32>>> {
        match self {
            Self::None => Ok(None),
            Self::Named(name) => mesh
                .point_values(name)
                .map(Some)
                .ok_or_else(|| Error::FieldNotFound(name.clone())),
        }
    }
}

/// What to draw when the selected field is missing from a mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingFieldPolicy {
    /// Draw the mesh without field colors and report the error.
    #[default]
    Unshaded,
    /// Keep the previous image and report the error.
    Fail,
}
