//! Fixtures shared by unit tests.

use std::path::Path;

use glam::Vec3;

use crate::mesh::{Cell, CellKind, Mesh};

/// Two triangles sharing an edge: points 1 and 2 touch both cells.
pub fn two_triangles() -> Mesh {
    Mesh::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ],
        vec![
            Cell::new(CellKind::Triangle, [0, 1, 2]),
            Cell::new(CellKind::Triangle, [1, 3, 2]),
        ],
    )
}

/// Write a unit square as two triangles with a cell field `pressure`
/// (`1 + offset`, `2 + offset`) and a point field `temperature`.
/// Point z coordinates are `0.5` so flattening is observable.
pub fn write_vtk_frame(path: &Path, offset: f32) {
    let text = format!(
        "# vtk DataFile Version 3.0
frame
ASCII
DATASET POLYDATA
POINTS 4 float
0 0 0.5 1 0 0.5 0 1 0.5 1 1 0.5
POLYGONS 2 8
3 0 1 2
3 1 3 2
CELL_DATA 2
SCALARS pressure float 1
LOOKUP_TABLE default
{} {}
POINT_DATA 4
SCALARS temperature float 1
LOOKUP_TABLE default
{} {} {} {}
",
        1.0 + offset,
        2.0 + offset,
        offset,
        offset + 0.25,
        offset + 0.5,
        offset + 0.75,
    );
    std::fs::write(path, text).expect("write fixture");
}
