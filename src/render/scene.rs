//! Triangulated, colored and lit geometry ready to rasterize.

use std::ops::Range;

use glam::Vec3;

use super::colormap::{builtin, value_range, Color, ColorMap};
use crate::field::FieldSelection;
use crate::mesh::Mesh;
use crate::util::{Bounds, Result};

/// Light and color settings shared by the preview and the recorder.
#[derive(Clone, Debug)]
pub struct ShadingParams {
    pub color_map: ColorMap,
    /// Fixed field range; `None` uses the min..max of each frame.
    pub range: Option<Range<f32>>,
    /// Color of the mesh when no field is drawn.
    pub surface: Color,
    pub background: Color,
    /// Direction the light travels, world space.
    pub light_dir: Vec3,
    pub ambient: f32,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            color_map: builtin::viridis(),
            range: None,
            surface: [200, 200, 200, 255],
            background: [38, 38, 46, 255],
            light_dir: Vec3::new(-0.4, -0.3, -1.0).normalize(),
            ambient: 0.25,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    /// Lit color, linear `0..1` per channel.
    pub color: Vec3,
}

/// Unindexed triangle list; every three vertices form one triangle.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub vertices: Vec<Vertex>,
    pub bounds: Bounds,
    /// Range the field was mapped over, `None` for an unshaded scene.
    pub range: Option<Range<f32>>,
}

fn to_vec3(c: Color) -> Vec3 {
    Vec3::new(c[0] as f32, c[1] as f32, c[2] as f32) / 255.0
}

impl Scene {
    /// Build the scene for `mesh` drawn at `geometry`, which must have one
    /// position per mesh point.
    ///
    /// Fails with [`FieldNotFound`][crate::Error::FieldNotFound] when the
    /// selected field is not on the mesh.
    pub fn build(
        geometry: &[Vec3],
        mesh: &Mesh,
        field: &FieldSelection,
        params: &ShadingParams,
    ) -> Result<Self> {
        let values = field.resolve(mesh)?;
        let range = values
            .as_ref()
            .map(|v| params.range.clone().unwrap_or_else(|| value_range(v)));

        let point_color = |idx: usize| -> Vec3 {
            match (&values, &range) {
                (Some(values), Some(range)) => {
                    to_vec3(params.color_map.map(values[idx], range))
                }
                _ => to_vec3(params.surface),
            }
        };

        let light = -params.light_dir.normalize_or_zero();
        let triangles = mesh.triangles();
        let mut vertices = Vec::with_capacity(triangles.len() * 3);
        for tri in &triangles {
            let idx = tri.nodes.map(|n| n as usize);
            if idx.iter().any(|&i| i >= geometry.len()) {
                continue;
            }
            let [a, b, c] = idx.map(|i| geometry[i]);
            let normal = (b - a).cross(c - a).normalize_or_zero();
            // two-sided
            let lambert = normal.dot(light).abs();
            let intensity = params.ambient + (1.0 - params.ambient) * lambert;
            for i in idx {
                vertices.push(Vertex {
                    position: geometry[i],
                    color: point_color(i) * intensity,
                });
            }
        }

        Ok(Self {
            vertices,
            bounds: Bounds::from_points(geometry),
            range,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_shaded(&self) -> bool {
        self.range.is_some()
    }
}
