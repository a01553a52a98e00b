//! Loading VTK files through [`vtkio`].
//!
//! Legacy `.vtk` files (ASCII or binary) and the XML `.vtu`/`.vtp` formats
//! are accepted, for `POLYDATA` and `UNSTRUCTURED_GRID` datasets. Attribute
//! arrays with several components are reduced to their Euclidean magnitude
//! so every field is a scalar. Cell fields are listed before point fields.

use std::path::Path;

use glam::Vec3;
use log::debug;
use vtkio::model::{
    Attribute, CellType, DataSet, ElementType, IOBuffer, Piece, PolyDataPiece,
    UnstructuredGridPiece, VertexNumbers,
};
use vtkio::Vtk;

use super::{Cell, CellKind, Field, Mesh, MeshError};

/// Read a VTK file, picking legacy or XML parsing from the extension.
pub fn read_vtk_file(path: &Path) -> Result<Mesh, MeshError> {
    let vtk = Vtk::import(path).map_err(|e| MeshError::Vtk(e.to_string()))?;
    from_vtk(vtk)
}

/// Parse legacy VTK data held in memory.
pub fn read_vtk(bytes: &[u8]) -> Result<Mesh, MeshError> {
    let vtk = Vtk::parse_legacy_be(bytes).map_err(|e| MeshError::Vtk(e.to_string()))?;
    from_vtk(vtk)
}

/// Convert a parsed VTK model.
pub fn from_vtk(vtk: Vtk) -> Result<Mesh, MeshError> {
    let mut builder = Builder::default();
    builder.add_dataset(vtk.data)?;
    builder.finish()
}

/// Drawable kind and number of corner nodes for a VTK cell type. Quadratic
/// cells keep only their corners.
fn cell_shape(cell_type: CellType) -> Option<(CellKind, Option<usize>)> {
    let id = cell_type as u32;
    if let Some(kind) = CellKind::from_vtk(id) {
        return Some((kind, None));
    }
    Some(match id {
        21 => (CellKind::Line, Some(2)),
        22 => (CellKind::Triangle, Some(3)),
        23 => (CellKind::Quad, Some(4)),
        24 => (CellKind::Tetra, Some(4)),
        25 => (CellKind::Hexahedron, Some(8)),
        26 => (CellKind::Wedge, Some(6)),
        27 => (CellKind::Pyramid, Some(5)),
        _ => return None,
    })
}

/// Split a cell list into per-cell node lists.
///
/// Counts and offsets come straight from the file, so every one is checked
/// against the data actually present.
fn node_lists(numbers: VertexNumbers) -> Result<Vec<Vec<u32>>, MeshError> {
    match numbers {
        VertexNumbers::Legacy {
            num_cells,
            vertices,
        } => {
            let mut cells = Vec::with_capacity((num_cells as usize).min(vertices.len()));
            let mut rest = vertices.as_slice();
            while let Some((&n, tail)) = rest.split_first() {
                let n = n as usize;
                if n > tail.len() {
                    return Err(MeshError::Vtk(format!(
                        "cell {} lists {} points but only {} values remain",
                        cells.len(),
                        n,
                        tail.len()
                    )));
                }
                cells.push(tail[..n].to_vec());
                rest = &tail[n..];
            }
            if cells.len() != num_cells as usize {
                return Err(MeshError::Vtk(format!(
                    "expected {} cells, found {}",
                    num_cells,
                    cells.len()
                )));
            }
            Ok(cells)
        }
        VertexNumbers::XML {
            connectivity,
            offsets,
        } => {
            let mut cells = Vec::with_capacity(offsets.len());
            let mut start = 0usize;
            for &end in &offsets {
                let end = usize::try_from(end)
                    .ok()
                    .filter(|&e| e >= start && e <= connectivity.len())
                    .ok_or_else(|| {
                        MeshError::Vtk(format!(
                            "cell offset {} outside connectivity of {}",
                            end,
                            connectivity.len()
                        ))
                    })?;
                let nodes = connectivity[start..end]
                    .iter()
                    .map(|&n| {
                        u32::try_from(n)
                            .map_err(|_| MeshError::Vtk(format!("point index {} too large", n)))
                    })
                    .collect::<Result<Vec<u32>, _>>()?;
                cells.push(nodes);
                start = end;
            }
            Ok(cells)
        }
    }
}

fn to_points(buffer: &IOBuffer) -> Result<Vec<Vec3>, MeshError> {
    let coords = buffer
        .clone()
        .cast_into::<f32>()
        .ok_or_else(|| MeshError::Unsupported("non-numeric point coordinates".into()))?;
    if coords.len() % 3 != 0 {
        return Err(MeshError::Vtk(format!(
            "{} point coordinates is not a multiple of 3",
            coords.len()
        )));
    }
    Ok(coords
        .chunks_exact(3)
        .map(|c| Vec3::new(c[0], c[1], c[2]))
        .collect())
}

/// Scalar values of an attribute array over `count` tuples.
fn scalar_values(name: &str, buffer: &IOBuffer, count: usize) -> Option<Vec<f32>> {
    let values = buffer.clone().cast_into::<f32>()?;
    if count == 0 || values.is_empty() || values.len() % count != 0 {
        debug!(
            "skipping array {:?}: {} values for {} tuples",
            name,
            values.len(),
            count
        );
        return None;
    }
    let components = values.len() / count;
    if components == 1 {
        return Some(values);
    }
    Some(
        values
            .chunks_exact(components)
            .map(|tuple| tuple.iter().map(|v| v * v).sum::<f32>().sqrt())
            .collect(),
    )
}

/// Arrays by name, concatenated across pieces.
#[derive(Default)]
struct Arrays(Vec<(String, Vec<f32>)>);

impl Arrays {
    fn push(&mut self, name: String, values: Vec<f32>) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => existing.extend(values),
            None => self.0.push((name, values)),
        }
    }

    fn add(&mut self, attributes: Vec<Attribute>, count: usize) {
        for attribute in attributes {
            match attribute {
                Attribute::DataArray(array) => {
                    if matches!(array.elem, ElementType::LookupTable) {
                        continue;
                    }
                    if let Some(values) = scalar_values(&array.name, &array.data, count) {
                        self.push(array.name, values);
                    }
                }
                Attribute::Field { data_array, .. } => {
                    for array in data_array {
                        if let Some(values) = scalar_values(&array.name, &array.data, count) {
                            self.push(array.name, values);
                        }
                    }
                }
            }
        }
    }
}

#[derive(Default)]
struct Builder {
    points: Vec<Vec3>,
    cells: Vec<Cell>,
    point_arrays: Arrays,
    cell_arrays: Arrays,
}

impl Builder {
    fn add_dataset(&mut self, data: DataSet) -> Result<(), MeshError> {
        match data {
            DataSet::PolyData { pieces, .. } => {
                for piece in pieces {
                    match piece {
                        Piece::Inline(piece) => self.add_poly(*piece)?,
                        other => self.add_loaded(other)?,
                    }
                }
                Ok(())
            }
            DataSet::UnstructuredGrid { pieces, .. } => {
                for piece in pieces {
                    match piece {
                        Piece::Inline(piece) => self.add_grid(*piece)?,
                        other => self.add_loaded(other)?,
                    }
                }
                Ok(())
            }
            _ => Err(MeshError::Unsupported(
                "only POLYDATA and UNSTRUCTURED_GRID datasets".into(),
            )),
        }
    }

    fn add_loaded<P>(&mut self, piece: Piece<P>) -> Result<(), MeshError> {
        match piece {
            Piece::Loaded(data) => self.add_dataset(*data),
            Piece::Source(source, _) => Err(MeshError::Unsupported(format!(
                "piece stored in another file ({})",
                source
            ))),
            Piece::Inline(_) => Ok(()),
        }
    }

    /// Point index offset for the next piece.
    fn base(&self) -> Result<u32, MeshError> {
        u32::try_from(self.points.len())
            .map_err(|_| MeshError::Vtk("too many points".into()))
    }

    fn push_cell(&mut self, kind: CellKind, nodes: Vec<u32>, base: u32) -> Result<(), MeshError> {
        let nodes = nodes
            .into_iter()
            .map(|n| {
                n.checked_add(base)
                    .ok_or_else(|| MeshError::Vtk("point index overflow".into()))
            })
            .collect::<Result<Vec<u32>, _>>()?;
        self.cells.push(Cell::new(kind, nodes));
        Ok(())
    }

    fn add_poly(&mut self, piece: PolyDataPiece) -> Result<(), MeshError> {
        let base = self.base()?;
        let points = to_points(&piece.points)?;
        let first_cell = self.cells.len();

        // cell data follows this order
        let sections = [
            (piece.verts, CellKind::PolyVertex),
            (piece.lines, CellKind::PolyLine),
            (piece.polys, CellKind::Polygon),
            (piece.strips, CellKind::TriangleStrip),
        ];
        for (numbers, kind) in sections {
            let Some(numbers) = numbers else { continue };
            for nodes in node_lists(numbers)? {
                self.push_cell(kind, nodes, base)?;
            }
        }

        let cell_count = self.cells.len() - first_cell;
        self.point_arrays.add(piece.data.point, points.len());
        self.cell_arrays.add(piece.data.cell, cell_count);
        self.points.extend(points);
        Ok(())
    }

    fn add_grid(&mut self, piece: UnstructuredGridPiece) -> Result<(), MeshError> {
        let base = self.base()?;
        let points = to_points(&piece.points)?;
        let lists = node_lists(piece.cells.cell_verts)?;
        if lists.len() != piece.cells.types.len() {
            return Err(MeshError::Vtk(format!(
                "{} cells but {} cell types",
                lists.len(),
                piece.cells.types.len()
            )));
        }

        let cell_count = lists.len();
        for (mut nodes, cell_type) in lists.into_iter().zip(piece.cells.types) {
            let kind = match cell_shape(cell_type) {
                Some((kind, corners)) => {
                    if let Some(corners) = corners {
                        nodes.truncate(corners);
                    }
                    kind
                }
                None => {
                    // kept undrawn so cell data stays aligned
                    debug!("cell type {:?} not drawn", cell_type);
                    CellKind::PolyVertex
                }
            };
            self.push_cell(kind, nodes, base)?;
        }

        self.point_arrays.add(piece.data.point, points.len());
        self.cell_arrays.add(piece.data.cell, cell_count);
        self.points.extend(points);
        Ok(())
    }

    fn finish(self) -> Result<Mesh, MeshError> {
        if self.points.is_empty() {
            return Err(MeshError::MissingNodes);
        }
        let mut mesh = Mesh::new(self.points, self.cells);
        let fields = self
            .cell_arrays
            .0
            .into_iter()
            .map(|(name, values)| Field::cell(name, values))
            .chain(
                self.point_arrays
                    .0
                    .into_iter()
                    .map(|(name, values)| Field::point(name, values)),
            );
        for field in fields {
            // arrays missing from some pieces
            if let Err(err) = mesh.add_field(field) {
                debug!("dropping field: {}", err);
            }
        }
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Association;
    use approx::assert_relative_eq;

    const POLY: &str = "# vtk DataFile Version 3.0
surface at t=0.1
ASCII
DATASET POLYDATA
POINTS 4 float
0 0 0  1 0 0  0 1 0
1 1 0
POLYGONS 2 8
3 0 1 2
3 1 3 2
CELL_DATA 2
SCALARS pressure float 1
LOOKUP_TABLE default
1.5 2.5
VECTORS U float
3 4 0  0 0 2
POINT_DATA 4
FIELD FieldData 1
height 1 4 double
0.1 0.2 0.3 0.4
";

    #[test]
    fn test_polydata_with_fields() {
        let mesh = read_vtk(POLY.as_bytes()).unwrap();
        assert_eq!(mesh.points.len(), 4);
        assert_eq!(mesh.cells.len(), 2);
        assert_eq!(mesh.cells[1].nodes.as_slice(), &[1, 3, 2]);
        assert_eq!(mesh.field_names(), vec!["pressure", "U", "height"]);

        let u = mesh.field("U").unwrap();
        assert_eq!(u.association, Association::Cell);
        assert_relative_eq!(u.values[0], 5.0);
        assert_relative_eq!(u.values[1], 2.0);

        let h = mesh.field("height").unwrap();
        assert_eq!(h.association, Association::Point);
        assert_relative_eq!(h.values[3], 0.4);
    }

    #[test]
    fn test_unstructured_grid() {
        let text = "# vtk DataFile Version 2.0
grid
ASCII
DATASET UNSTRUCTURED_GRID
POINTS 5 double
0 0 0 1 0 0 1 1 0 0 1 0 0.5 0.5 1
CELLS 2 11
4 0 1 2 3
5 0 1 2 3 4
CELL_TYPES 2
9
14
CELL_DATA 2
SCALARS alpha.water double 1
LOOKUP_TABLE default
0 1
";
        let mesh = read_vtk(text.as_bytes()).unwrap();
        assert_eq!(mesh.cells[0].kind, CellKind::Quad);
        assert_eq!(mesh.cells[1].kind, CellKind::Pyramid);
        assert_eq!(mesh.field_names(), vec!["alpha.water"]);
        // quad -> 2 triangles, pyramid -> quad base (2) + 4 sides
        assert_eq!(mesh.triangles().len(), 8);
    }

    #[test]
    fn test_binary_legacy() {
        let mut bytes = b"# vtk DataFile Version 3.0\nbinary\nBINARY\nDATASET POLYDATA\nPOINTS 3 float\n".to_vec();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(b"\nPOLYGONS 1 4\n");
        for v in [3i32, 0, 1, 2] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(b"\nCELL_DATA 1\nSCALARS p float 1\nLOOKUP_TABLE default\n");
        bytes.extend_from_slice(&7.0f32.to_be_bytes());
        bytes.extend_from_slice(b"\n");

        let mesh = read_vtk(&bytes).unwrap();
        assert_eq!(mesh.points[1], Vec3::X);
        assert_eq!(mesh.cells[0].nodes.as_slice(), &[0, 1, 2]);
        assert_eq!(mesh.field("p").unwrap().values, vec![7.0]);
    }

    #[test]
    fn test_xml_unstructured_grid() {
        let text = r#"<?xml version="1.0"?>
<VTKFile type="UnstructuredGrid" version="0.1" byte_order="LittleEndian">
  <UnstructuredGrid>
    <Piece NumberOfPoints="3" NumberOfCells="1">
      <Points>
        <DataArray type="Float32" NumberOfComponents="3" format="ascii">0 0 0 1 0 0 0 1 0</DataArray>
      </Points>
      <Cells>
        <DataArray type="Int32" Name="connectivity" format="ascii">0 1 2</DataArray>
        <DataArray type="Int32" Name="offsets" format="ascii">3</DataArray>
        <DataArray type="UInt8" Name="types" format="ascii">5</DataArray>
      </Cells>
      <CellData>
        <DataArray type="Float32" Name="p" format="ascii">7</DataArray>
      </CellData>
    </Piece>
  </UnstructuredGrid>
</VTKFile>
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.vtu");
        std::fs::write(&path, text).unwrap();

        let mesh = read_vtk_file(&path).unwrap();
        assert_eq!(mesh.points.len(), 3);
        assert_eq!(mesh.cells[0].kind, CellKind::Triangle);
        assert_eq!(mesh.field_names(), vec!["p"]);
    }

    #[test]
    fn test_truncated_cell_list() {
        let numbers = VertexNumbers::Legacy {
            num_cells: 2,
            vertices: vec![3, 0, 1, 2, 4, 0],
        };
        assert!(matches!(node_lists(numbers), Err(MeshError::Vtk(_))));
    }

    #[test]
    fn test_offsets_checked() {
        let numbers = VertexNumbers::XML {
            connectivity: vec![0, 1, 2],
            offsets: vec![3, u64::MAX],
        };
        assert!(node_lists(numbers).is_err());

        let numbers = VertexNumbers::XML {
            connectivity: vec![0, 1, 2, 1, 3, 2],
            offsets: vec![3, 6],
        };
        assert_eq!(node_lists(numbers).unwrap(), vec![vec![0, 1, 2], vec![1, 3, 2]]);
    }

    #[test]
    fn test_vectors_reduced_to_magnitude() {
        let values = scalar_values("v", &IOBuffer::F32(vec![3.0, 4.0, 0.0, 0.0, 0.0, 2.0]), 2);
        assert_eq!(values, Some(vec![5.0, 2.0]));
        assert_eq!(scalar_values("v", &IOBuffer::F32(vec![1.0, 2.0, 3.0]), 2), None);
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(read_vtk(b"hello"), Err(MeshError::Vtk(_))));
    }
}
