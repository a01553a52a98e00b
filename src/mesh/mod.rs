//! Mesh data model and file readers.
//!
//! A [`Mesh`] is a bag of points, cells over those points and named scalar
//! fields attached either to cells or to points. Readers are selected by file
//! extension through [`read_mesh`].

pub mod gmsh;
pub mod vtk;

use std::path::Path;

use glam::Vec3;
use smallvec::SmallVec;
use thiserror::Error;

use crate::util::Bounds;

/// File extensions accepted by [`read_mesh`] (lowercase, without the dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["vtk", "vtu", "vtp", "msh"];

/// Error while reading a mesh file.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// VTK parser error or inconsistent VTK data
    #[error("Parsing the VTK data failed: {0}")]
    Vtk(String),

    /// Valid file using a feature this reader does not handle
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// No reader for this file extension
    #[error("Unsupported mesh format: {0:?}")]
    UnsupportedExtension(String),

    /// Gmsh parser error, converted to a string because the parser error
    /// borrows the input bytes
    #[error("Parsing the .msh data failed: {0}")]
    Gmsh(String),

    #[error("Invalid mesh data: no nodes")]
    MissingNodes,

    #[error("Invalid mesh data: no elements of a supported type")]
    MissingElements,

    /// A cell references a point that does not exist
    #[error("Cell {cell} references point {node} (point count: {points})")]
    InvalidIndex { cell: usize, node: u32, points: usize },

    /// Field length does not match the number of cells or points
    #[error("Field {name:?} has {actual} values, expected {expected}")]
    FieldLength {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Cell shapes, numbered like VTK cell types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Vertex,
    PolyVertex,
    Line,
    PolyLine,
    Triangle,
    TriangleStrip,
    Polygon,
    Pixel,
    Quad,
    Tetra,
    Voxel,
    Hexahedron,
    Wedge,
    Pyramid,
}

impl CellKind {
    /// Map a VTK cell type id. Unknown ids return `None`.
    pub fn from_vtk(id: u32) -> Option<Self> {
        Some(match id {
            1 => Self::Vertex,
            2 => Self::PolyVertex,
            3 => Self::Line,
            4 => Self::PolyLine,
            5 => Self::Triangle,
            6 => Self::TriangleStrip,
            7 => Self::Polygon,
            8 => Self::Pixel,
            9 => Self::Quad,
            10 => Self::Tetra,
            11 => Self::Voxel,
            12 => Self::Hexahedron,
            13 => Self::Wedge,
            14 => Self::Pyramid,
            _ => return None,
        })
    }
}

/// A single cell: shape plus point indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    pub nodes: SmallVec<[u32; 8]>,
}

const TETRA_FACES: &[&[usize]] = &[&[0, 1, 3], &[1, 2, 3], &[2, 0, 3], &[0, 2, 1]];
const HEXA_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];
// voxel corners are in lexicographic order, these are hexahedron faces remapped
const VOXEL_FACES: &[&[usize]] = &[
    &[0, 2, 3, 1],
    &[4, 5, 7, 6],
    &[0, 1, 5, 4],
    &[1, 3, 7, 5],
    &[3, 2, 6, 7],
    &[2, 0, 4, 6],
];
const WEDGE_FACES: &[&[usize]] = &[&[0, 1, 2], &[3, 5, 4], &[0, 3, 4, 1], &[1, 4, 5, 2], &[2, 5, 3, 0]];
const PYRAMID_FACES: &[&[usize]] = &[&[0, 3, 2, 1], &[0, 1, 4], &[1, 2, 4], &[2, 3, 4], &[3, 0, 4]];

impl Cell {
    pub fn new(kind: CellKind, nodes: impl IntoIterator<Item = u32>) -> Self {
        Self {
            kind,
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Visit every drawable polygon of this cell as a list of point indices.
    ///
    /// Points and lines have no faces. Volume cells yield their boundary faces.
    pub fn for_each_face(&self, mut f: impl FnMut(&[u32])) {
        let n = &self.nodes;
        let by_table = |table: &[&[usize]], need: usize, f: &mut dyn FnMut(&[u32])| {
            if n.len() < need {
                return;
            }
            for face in table {
                let idx: SmallVec<[u32; 4]> = face.iter().map(|&i| n[i]).collect();
                f(&idx[..]);
            }
        };
        match self.kind {
            CellKind::Vertex | CellKind::PolyVertex | CellKind::Line | CellKind::PolyLine => {}
            CellKind::Triangle | CellKind::Quad | CellKind::Polygon => {
                if n.len() >= 3 {
                    f(&n[..]);
                }
            }
            CellKind::Pixel => {
                if n.len() >= 4 {
                    f(&[n[0], n[1], n[3], n[2]][..]);
                }
            }
            CellKind::TriangleStrip => {
                for i in 2..n.len() {
                    if i % 2 == 0 {
                        f(&[n[i - 2], n[i - 1], n[i]][..]);
                    } else {
                        f(&[n[i - 1], n[i - 2], n[i]][..]);
                    }
                }
            }
            CellKind::Tetra => by_table(TETRA_FACES, 4, &mut f),
            CellKind::Hexahedron => by_table(HEXA_FACES, 8, &mut f),
            CellKind::Voxel => by_table(VOXEL_FACES, 8, &mut f),
            CellKind::Wedge => by_table(WEDGE_FACES, 6, &mut f),
            CellKind::Pyramid => by_table(PYRAMID_FACES, 5, &mut f),
        }
    }
}

/// Where the values of a field live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Association {
    Cell,
    Point,
}

/// A named scalar attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub association: Association,
    pub values: Vec<f32>,
}

impl Field {
    pub fn cell(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            association: Association::Cell,
            values,
        }
    }

    pub fn point(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            association: Association::Point,
            values,
        }
    }
}

/// A triangle produced by [`Mesh::triangles`], remembering its source cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle {
    pub nodes: [u32; 3],
    pub cell: usize,
}

/// Points, cells and fields of one simulation snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub points: Vec<Vec3>,
    pub cells: Vec<Cell>,
    pub fields: Vec<Field>,
}

impl Mesh {
    pub fn new(points: Vec<Vec3>, cells: Vec<Cell>) -> Self {
        Self {
            points,
            cells,
            fields: Vec::new(),
        }
    }

    /// Builder-style [`add_field`][Self::add_field] for constructing meshes in code.
    pub fn with_field(mut self, field: Field) -> Result<Self, MeshError> {
        self.add_field(field)?;
        Ok(self)
    }

    /// Attach a field, checking its length against the cells or points.
    pub fn add_field(&mut self, field: Field) -> Result<(), MeshError> {
        let expected = match field.association {
            Association::Cell => self.cells.len(),
            Association::Point => self.points.len(),
        };
        if field.values.len() != expected {
            return Err(MeshError::FieldLength {
                name: field.name,
                expected,
                actual: field.values.len(),
            });
        }
        self.fields.push(field);
        Ok(())
    }

    /// Check that every cell references existing points and fields have the right length.
    pub fn validate(&self) -> Result<(), MeshError> {
        let points = self.points.len();
        for (cell_idx, cell) in self.cells.iter().enumerate() {
            if let Some(&node) = cell.nodes.iter().find(|&&n| n as usize >= points) {
                return Err(MeshError::InvalidIndex {
                    cell: cell_idx,
                    node,
                    points,
                });
            }
        }
        for field in &self.fields {
            let expected = match field.association {
                Association::Cell => self.cells.len(),
                Association::Point => points,
            };
            if field.values.len() != expected {
                return Err(MeshError::FieldLength {
                    name: field.name.clone(),
                    expected,
                    actual: field.values.len(),
                });
            }
        }
        Ok(())
    }

    /// Distinct field names in the order the file declares them.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if !names.contains(&field.name) {
                names.push(field.name.clone());
            }
        }
        names
    }

    /// First field with this name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Per-point values of a field.
    ///
    /// Point fields are returned as-is. Cell fields are averaged over the cells
    /// incident to each point; points that no cell references get 0.
    pub fn point_values(&self, name: &str) -> Option<Vec<f32>> {
        let field = self.field(name)?;
        match field.association {
            Association::Point => Some(field.values.clone()),
            Association::Cell => Some(self.cell_to_point(&field.values)),
        }
    }

    fn cell_to_point(&self, cell_values: &[f32]) -> Vec<f32> {
        let mut sums = vec![0.0f64; self.points.len()];
        let mut counts = vec![0u32; self.points.len()];
        for (cell, &value) in self.cells.iter().zip(cell_values) {
            let mut seen: SmallVec<[u32; 8]> = SmallVec::new();
            for &node in &cell.nodes {
                if seen.contains(&node) {
                    continue;
                }
                seen.push(node);
                if let Some(sum) = sums.get_mut(node as usize) {
                    *sum += value as f64;
                    counts[node as usize] += 1;
                }
            }
        }
        sums.iter()
            .zip(&counts)
            .map(|(&s, &c)| if c > 0 { (s / c as f64) as f32 } else { 0.0 })
            .collect()
    }

    /// Fan-triangulate all cell faces.
    pub fn triangles(&self) -> Vec<Triangle> {
        let mut tris = Vec::with_capacity(self.cells.len() * 2);
        for (cell_idx, cell) in self.cells.iter().enumerate() {
            cell.for_each_face(|face| {
                for i in 1..face.len().saturating_sub(1) {
                    tris.push(Triangle {
                        nodes: [face[0], face[i], face[i + 1]],
                        cell: cell_idx,
                    });
                }
            });
        }
        tris
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(&self.points)
    }
}

/// Whether a path has an extension one of the readers handles.
pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

/// Auto-detect format and read a mesh.
pub fn read_mesh(path: &Path) -> Result<Mesh, MeshError> {
    let ext = extension(path).unwrap_or_default();
    let mesh = match ext.as_str() {
        "vtk" | "vtu" | "vtp" => vtk::read_vtk_file(path)?,
        "msh" => gmsh::read_msh(&std::fs::read(path)?)?,
        _ => return Err(MeshError::UnsupportedExtension(ext)),
    };
    mesh.validate()?;
    Ok(mesh)
}
