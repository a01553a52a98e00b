//! GPU preview: draws the preview scene into an offscreen texture that the
//! viewport shows as an egui image.
//!
//! The vertex buffer is rebuilt only when the render sink produces a new
//! scene; camera moves just rewrite the uniform buffer. Scenes larger than
//! the device's `max_buffer_size` are not uploaded.

use egui_wgpu::RenderState;
use log::warn;
use wgpu::util::DeviceExt;

use crate::render::colormap::Color;
use crate::render::{OrbitCamera, Scene};

const SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    // x > 0.5 when the target encodes sRGB on write
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> uniforms: Uniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

fn srgb_to_linear(c: vec3<f32>) -> vec3<f32> {
    let lo = c / 12.92;
    let hi = pow((c + vec3<f32>(0.055)) / 1.055, vec3<f32>(2.4));
    return select(hi, lo, c <= vec3<f32>(0.04045));
}

@fragment
fn fs_main(v: VertexOutput) -> @location(0) vec4<f32> {
    let c = clamp(v.color, vec3<f32>(0.0), vec3<f32>(1.0));
    if (uniforms.params.x > 0.5) {
        return vec4<f32>(srgb_to_linear(c), 1.0);
    }
    return vec4<f32>(c, 1.0);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuVertex {
    position: [f32; 3],
    color: [f32; 3],
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: 12,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x3,
    },
];

fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn clear_color(background: Color, srgb: bool) -> wgpu::Color {
    let channel = |c: u8| if srgb { srgb_to_linear(c) } else { c as f64 / 255.0 };
    wgpu::Color {
        r: channel(background[0]),
        g: channel(background[1]),
        b: channel(background[2]),
        a: 1.0,
    }
}

struct RenderTarget {
    #[allow(dead_code)]
    color: wgpu::Texture,
    view: wgpu::TextureView,
    #[allow(dead_code)]
    depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
    size: (u32, u32),
    texture_id: egui::TextureId,
}

pub struct PreviewRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    srgb: bool,
    vertices: Option<(wgpu::Buffer, u32)>,
    /// Sink generation the vertex buffer was built from
    generation: Option<u64>,
    target: Option<RenderTarget>,
}

impl PreviewRenderer {
    pub fn new(render_state: &RenderState) -> Self {
        let device = &render_state.device;
        let format = render_state.target_format;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("preview_shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("preview_uniforms"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
                params: [0.0; 4],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("preview_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("preview_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("preview_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("preview_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // lighting is two-sided
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
            srgb: format.is_srgb(),
            vertices: None,
            generation: None,
            target: None,
        }
    }

    fn upload(&mut self, device: &wgpu::Device, scene: Option<&Scene>) {
        self.vertices = None;
        let Some(scene) = scene.filter(|s| !s.vertices.is_empty()) else {
            return;
        };
        let data: Vec<GpuVertex> = scene
            .vertices
            .iter()
            .map(|v| GpuVertex {
                position: v.position.to_array(),
                color: v.color.to_array(),
            })
            .collect();
        let bytes: &[u8] = bytemuck::cast_slice(&data);
        let (Ok(count), true) = (
            u32::try_from(data.len()),
            (bytes.len() as u64) <= device.limits().max_buffer_size,
        ) else {
            warn!(
                "preview scene of {} triangles is too large for the GPU",
                scene.triangle_count()
            );
            return;
        };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("preview_vertices"),
            contents: bytes,
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.vertices = Some((buffer, count));
    }

    fn ensure_target(&mut self, render_state: &RenderState, width: u32, height: u32) {
        if self.target.as_ref().is_some_and(|t| t.size == (width, height)) {
            return;
        }
        let device = &render_state.device;
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("preview_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: render_state.target_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = color.create_view(&wgpu::TextureViewDescriptor::default());

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("preview_depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        // Register with egui, then drop the old registration
        let texture_id = render_state.renderer.write().register_native_texture(
            device,
            &view,
            wgpu::FilterMode::Linear,
        );
        if let Some(old) = self.target.take() {
            render_state.renderer.write().free_texture(&old.texture_id);
        }

        self.target = Some(RenderTarget {
            color,
            view,
            depth,
            depth_view,
            size: (width, height),
            texture_id,
        });
    }

    /// Draw `scene` at `width` x `height` and return the texture to show.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        render_state: &RenderState,
        scene: Option<&Scene>,
        generation: u64,
        camera: &OrbitCamera,
        background: Color,
        width: u32,
        height: u32,
    ) -> Option<egui::TextureId> {
        let device = &render_state.device;
        let queue = &render_state.queue;
        let max_side = device.limits().max_texture_dimension_2d;
        let (width, height) = (width.clamp(1, max_side), height.clamp(1, max_side));

        if self.generation != Some(generation) {
            self.upload(device, scene);
            self.generation = Some(generation);
        }

        let uniforms = Uniforms {
            view_proj: camera
                .view_proj(width as f32 / height as f32)
                .to_cols_array_2d(),
            params: [if self.srgb { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        self.ensure_target(render_state, width, height);
        let target = self.target.as_ref()?;

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("preview_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("preview_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(background, self.srgb)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some((buffer, count)) = &self.vertices {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.set_vertex_buffer(0, buffer.slice(..));
                pass.draw(0..*count, 0..1);
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
        Some(target.texture_id)
    }
}
