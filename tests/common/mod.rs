//! Helpers for writing small result sequences to disk.

#![allow(dead_code)]

use std::path::Path;

use tempfile::TempDir;

/// Unit square as two triangles at z = 0.5 with a cell field `pressure`
/// and a point field `temperature`, both shifted by `offset`.
pub fn write_frame(path: &Path, offset: f32) {
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
    std::fs::write(path, text).expect("write frame");
}

/// Same square without any fields.
pub fn write_bare_frame(path: &Path) {
    let text = "# vtk DataFile Version 3.0
bare
ASCII
DATASET POLYDATA
POINTS 4 float
0 0 0.5 1 0 0.5 0 1 0.5 1 1 0.5
POLYGONS 2 8
3 0 1 2
3 1 3 2
";
    std::fs::write(path, text).expect("write frame");
}

/// Gmsh 4.1 unit square as two triangles, shifted by `offset` along x.
pub fn write_msh_frame(path: &Path, offset: f32) {
    let text = format!(
        "$MeshFormat
4.1 0 8
$EndMeshFormat
$Nodes
1 4 1 4
2 1 0 4
1
2
3
4
{a} 0 0
{b} 0 0
{b} 1 0
{a} 1 0
$EndNodes
$Elements
1 2 1 2
2 1 2 2
1 1 2 3
2 1 3 4
$EndElements
",
        a = offset,
        b = offset + 1.0,
    );
    std::fs::write(path, text).expect("write frame");
}

/// Directory with `names`, frame `i` offset by `i`.
pub fn sequence_named(names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for (i, name) in names.iter().enumerate() {
        write_frame(&dir.path().join(name), i as f32);
    }
    dir
}

/// `0.vtk` .. `{n-1}.vtk`
pub fn sequence(n: usize) -> TempDir {
    let names: Vec<String> = (0..n).map(|i| format!("{}.vtk", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    sequence_named(&refs)
}
