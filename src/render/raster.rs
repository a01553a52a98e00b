//! Software rasterizer producing the recorded images.
//!
//! Rows are split into bands rasterized in parallel; each band walks the
//! triangles in scene order, so output does not depend on thread count.

use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use super::camera::OrbitCamera;
use super::scene::{Scene, ShadingParams};

/// Rows per parallel work item
const BAND_ROWS: usize = 16;

#[derive(Clone, Copy)]
struct Projected {
    xy: Vec2,
    z: f32,
    color: Vec3,
}

/// A triangle in pixel space, clipped to the image bounds.
struct ScreenTriangle {
    corners: [Projected; 3],
    area: f32,
    min: Vec2,
    max: Vec2,
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn to_rgba(color: Vec3) -> [u8; 4] {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, 255]
}

/// Draw `scene` as seen by `camera` into a `width` x `height` image.
///
/// Z-buffered, with colors interpolated across each triangle. Triangles
/// behind the camera, degenerate on screen or entirely outside the image
/// are skipped.
pub fn rasterize(
    scene: &Scene,
    camera: &OrbitCamera,
    width: u32,
    height: u32,
    params: &ShadingParams,
) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, Rgba(params.background));
    if width == 0 || height == 0 {
        return img;
    }
    let (w, h) = (width as f32, height as f32);
    let view_proj = camera.view_proj(w / h);

    let project = |position: Vec3, color: Vec3| -> Option<Projected> {
        let clip = view_proj * position.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Projected {
            xy: Vec2::new((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h),
            z: ndc.z,
            color,
        })
    };

    let triangles: Vec<ScreenTriangle> = scene
        .vertices
        .par_chunks_exact(3)
        .filter_map(|tri| {
            let corners = [
                project(tri[0].position, tri[0].color)?,
                project(tri[1].position, tri[1].color)?,
                project(tri[2].position, tri[2].color)?,
            ];
            let [a, b, c] = corners.map(|p| p.xy);
            let area = edge(a, b, c);
            if area.abs() < 1e-8 {
                return None;
            }
            let min = a.min(b).min(c).floor().max(Vec2::ZERO);
            let max = a.max(b).max(c).ceil().min(Vec2::new(w - 1.0, h - 1.0));
            if min.x > max.x || min.y > max.y {
                return None;
            }
            Some(ScreenTriangle {
                corners,
                area,
                min,
                max,
            })
        })
        .collect();

    let row_len = width as usize;
    let mut depth = vec![f32::INFINITY; row_len * height as usize];
    let pixels: &mut [u8] = &mut img;
    pixels
        .par_chunks_mut(row_len * 4 * BAND_ROWS)
        .zip(depth.par_chunks_mut(row_len * BAND_ROWS))
        .enumerate()
        .for_each(|(band, (pixels, depth))| {
            let top = band * BAND_ROWS;
            let bottom = top + depth.len() / row_len;
            for tri in &triangles {
                let [a, b, c] = &tri.corners;
                let y0 = (tri.min.y as usize).max(top);
                let y1 = (tri.max.y as usize + 1).min(bottom);
                for y in y0..y1 {
                    for x in tri.min.x as usize..=tri.max.x as usize {
                        let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                        let w0 = edge(b.xy, c.xy, p) / tri.area;
                        let w1 = edge(c.xy, a.xy, p) / tri.area;
                        let w2 = edge(a.xy, b.xy, p) / tri.area;
                        if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                            continue;
                        }
                        let z = w0 * a.z + w1 * b.z + w2 * c.z;
                        let slot = (y - top) * row_len + x;
                        if !(0.0..=1.0).contains(&z) || z >= depth[slot] {
                            continue;
                        }
                        depth[slot] = z;
                        let color = a.color * w0 + b.color * w1 + c.color * w2;
                        pixels[slot * 4..slot * 4 + 4].copy_from_slice(&to_rgba(color));
                    }
                }
            }
        });
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSelection;
    use crate::testing::two_triangles;

    fn square_scene() -> (Scene, OrbitCamera) {
        let mesh = two_triangles();
        let scene = Scene::build(
            &mesh.points,
            &mesh,
            &FieldSelection::None,
            &ShadingParams::default(),
        )
        .unwrap();
        let mut camera = OrbitCamera::default();
        camera.fit(&scene.bounds);
        (scene, camera)
    }

    #[test]
    fn test_empty_scene_is_background() {
        let params = ShadingParams::default();
        let img = rasterize(&Scene::default(), &OrbitCamera::default(), 8, 6, &params);
        assert_eq!(img.dimensions(), (8, 6));
        assert!(img.pixels().all(|p| p.0 == params.background));
    }

    #[test]
    fn test_mesh_covers_center() {
        let (scene, camera) = square_scene();
        let params = ShadingParams::default();
        let img = rasterize(&scene, &camera, 64, 48, &params);
        assert_ne!(img.get_pixel(32, 24).0, params.background);
        // corners stay clear
        assert_eq!(img.get_pixel(0, 0).0, params.background);
    }

    #[test]
    fn test_deterministic() {
        let (scene, camera) = square_scene();
        let params = ShadingParams::default();
        let a = rasterize(&scene, &camera, 32, 32, &params);
        let b = rasterize(&scene, &camera, 32, 32, &params);
        assert_eq!(a, b);
    }

    #[test]
    fn test_tall_image_spans_bands() {
        let (scene, camera) = square_scene();
        let params = ShadingParams::default();
        // the band edge falls on the center row
        let img = rasterize(&scene, &camera, 40, 2 * BAND_ROWS as u32, &params);
        let edge_row = BAND_ROWS as u32;
        assert_ne!(img.get_pixel(20, edge_row).0, params.background);
        assert_ne!(img.get_pixel(20, edge_row - 1).0, params.background);
    }

    #[test]
    fn test_zero_size() {
        let (scene, camera) = square_scene();
        let img = rasterize(&scene, &camera, 0, 0, &ShadingParams::default());
        assert_eq!(img.dimensions(), (0, 0));
    }
}
