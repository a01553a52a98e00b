//! Loading meshes generated with [`gmsh`](https://www.gmsh.info/).
//!
//! Only version 4.1 of the MSH format is supported, as per the [`mshio`]
//! library. Post-processing views are not read, so these meshes carry no
//! fields.

use glam::Vec3;

use super::{Cell, CellKind, Mesh, MeshError};

/// Map the first-order element types we can draw.
fn cell_kind(element_type: &mshio::ElementType) -> Option<CellKind> {
    use mshio::ElementType as E;
    Some(match element_type {
        E::Tri3 => CellKind::Triangle,
        E::Qua4 => CellKind::Quad,
        E::Tet4 => CellKind::Tetra,
        E::Hex8 => CellKind::Hexahedron,
        E::Pri6 => CellKind::Wedge,
        E::Pyr5 => CellKind::Pyramid,
        _ => return None,
    })
}

/// Parse the bytes of a `.msh` file.
///
/// Node tags are assumed to be sequential starting at 1, which is what gmsh
/// writes unless tags were renumbered by hand; out-of-range tags are caught by
/// [`Mesh::validate`].
pub fn read_msh(bytes: &[u8]) -> Result<Mesh, MeshError> {
    let msh = mshio::parse_msh_bytes(bytes).map_err(|e| MeshError::Gmsh(format!("{}", e)))?;
    let nodes = msh.data.nodes.ok_or(MeshError::MissingNodes)?;
    let elements = msh.data.elements.ok_or(MeshError::MissingElements)?;

    let points: Vec<Vec3> = nodes
        .node_blocks
        .iter()
        .flat_map(|block| block.nodes.iter())
        .map(|node| Vec3::new(node.x as f32, node.y as f32, node.z as f32))
        .collect();
    if points.is_empty() {
        return Err(MeshError::MissingNodes);
    }

    let cells: Vec<Cell> = elements
        .element_blocks
        .iter()
        .filter_map(|block| cell_kind(&block.element_type).map(|kind| (kind, block)))
        .flat_map(|(kind, block)| {
            block.elements.iter().map(move |el| {
                // gmsh tags start at 1, out-of-range tags fail validation
                Cell::new(
                    kind,
                    el.nodes.iter().map(|&tag| {
                        u32::try_from(tag)
                            .ok()
                            .and_then(|t| t.checked_sub(1))
                            .unwrap_or(u32::MAX)
                    }),
                )
            })
        })
        .collect();
    if cells.is_empty() {
        return Err(MeshError::MissingElements);
    }

    Ok(Mesh::new(points, cells))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "$MeshFormat
4.1 0 8
$EndMeshFormat
$Nodes
1 4 1 4
2 1 0 4
1
2
3
4
0 0 0
1 0 0
1 1 0
0 1 0
$EndNodes
$Elements
1 2 1 2
2 1 2 2
1 1 2 3
2 1 3 4
$EndElements
";

    #[test]
    fn test_read_triangles() {
        let mesh = read_msh(SQUARE.as_bytes()).unwrap();
        assert_eq!(mesh.points.len(), 4);
        assert_eq!(mesh.cells.len(), 2);
        assert_eq!(mesh.cells[1].nodes.as_slice(), &[0, 2, 3]);
        assert!(mesh.fields.is_empty());
        mesh.validate().unwrap();
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(read_msh(b"not a mesh").is_err());
    }
}
