use anyhow::{Context, Result};
use glam::Mat4;
use wgpu::util::DeviceExt;

use super::DEPTH_FORMAT;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

/// Per-volume instance payload. `color` carries the alpha used for the
/// translucent fill; hovered volumes are pushed to full opacity upstream.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BoxInstance {
    pub center: [f32; 3],
    pub _pad0: f32,
    pub half_extent: [f32; 3],
    pub _pad1: f32,
    pub color: [f32; 4],
}

impl BoxInstance {
    pub fn new(center: [f32; 3], half_extent: [f32; 3], color: [f32; 4]) -> Self {
        Self { center, _pad0: 0.0, half_extent, _pad1: 0.0, color }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BoxVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

const fn v(position: [f32; 3], normal: [f32; 3]) -> BoxVertex {
    BoxVertex { position, normal }
}

// Unit cube spanning [-0.5, 0.5], four vertices per face so normals stay flat.
const CUBE_VERTICES: [BoxVertex; 24] = [
    // +x
    v([0.5, -0.5, -0.5], [1.0, 0.0, 0.0]),
    v([0.5, 0.5, -0.5], [1.0, 0.0, 0.0]),
    v([0.5, 0.5, 0.5], [1.0, 0.0, 0.0]),
    v([0.5, -0.5, 0.5], [1.0, 0.0, 0.0]),
    // -x
    v([-0.5, -0.5, 0.5], [-1.0, 0.0, 0.0]),
    v([-0.5, 0.5, 0.5], [-1.0, 0.0, 0.0]),
    v([-0.5, 0.5, -0.5], [-1.0, 0.0, 0.0]),
    v([-0.5, -0.5, -0.5], [-1.0, 0.0, 0.0]),
    // +y
    v([-0.5, 0.5, -0.5], [0.0, 1.0, 0.0]),
    v([-0.5, 0.5, 0.5], [0.0, 1.0, 0.0]),
    v([0.5, 0.5, 0.5], [0.0, 1.0, 0.0]),
    v([0.5, 0.5, -0.5], [0.0, 1.0, 0.0]),
    // -y
    v([-0.5, -0.5, 0.5], [0.0, -1.0, 0.0]),
    v([-0.5, -0.5, -0.5], [0.0, -1.0, 0.0]),
    v([0.5, -0.5, -0.5], [0.0, -1.0, 0.0]),
    v([0.5, -0.5, 0.5], [0.0, -1.0, 0.0]),
    // +z
    v([-0.5, -0.5, 0.5], [0.0, 0.0, 1.0]),
    v([0.5, -0.5, 0.5], [0.0, 0.0, 1.0]),
    v([0.5, 0.5, 0.5], [0.0, 0.0, 1.0]),
    v([-0.5, 0.5, 0.5], [0.0, 0.0, 1.0]),
    // -z
    v([0.5, -0.5, -0.5], [0.0, 0.0, -1.0]),
    v([-0.5, -0.5, -0.5], [0.0, 0.0, -1.0]),
    v([-0.5, 0.5, -0.5], [0.0, 0.0, -1.0]),
    v([0.5, 0.5, -0.5], [0.0, 0.0, -1.0]),
];

#[rustfmt::skip]
const CUBE_INDICES: [u16; 36] = [
    0, 1, 2, 0, 2, 3,
    4, 5, 6, 4, 6, 7,
    8, 9, 10, 8, 10, 11,
    12, 13, 14, 12, 14, 15,
    16, 17, 18, 16, 18, 19,
    20, 21, 22, 20, 22, 23,
];

// Cube corners for the wireframe outline drawn over the hovered volume.
const CORNER_VERTICES: [[f32; 3]; 8] = [
    [-0.5, -0.5, -0.5],
    [0.5, -0.5, -0.5],
    [0.5, 0.5, -0.5],
    [-0.5, 0.5, -0.5],
    [-0.5, -0.5, 0.5],
    [0.5, -0.5, 0.5],
    [0.5, 0.5, 0.5],
    [-0.5, 0.5, 0.5],
];

#[rustfmt::skip]
const EDGE_INDICES: [u16; 24] = [
    0, 1, 1, 2, 2, 3, 3, 0,
    4, 5, 5, 6, 6, 7, 7, 4,
    0, 4, 1, 5, 2, 6, 3, 7,
];

/// Instanced translucent boxes plus a line-list outline pass.
#[derive(Default)]
pub struct BoxPass {
    fill_pipeline: Option<wgpu::RenderPipeline>,
    outline_pipeline: Option<wgpu::RenderPipeline>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    corner_buffer: Option<wgpu::Buffer>,
    edge_buffer: Option<wgpu::Buffer>,
    globals_buf: Option<wgpu::Buffer>,
    globals_bg: Option<wgpu::BindGroup>,
    instance_buffer: Option<wgpu::Buffer>,
    instance_capacity: usize,
    outline_buffer: Option<wgpu::Buffer>,
}

impl BoxPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.fill_pipeline.is_some()
    }

    pub fn init_pipelines(
        &mut self,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Result<()> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Box Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../assets/shaders/boxes.wgsl").into(),
            ),
        });

        let globals_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Box Globals BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Box Globals Buffer"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Box Globals BG"),
            layout: &globals_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Box VB"),
            contents: bytemuck::cast_slice(&CUBE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Box IB"),
            contents: bytemuck::cast_slice(&CUBE_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let corner_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Outline VB"),
            contents: bytemuck::cast_slice(&CORNER_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let edge_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Outline IB"),
            contents: bytemuck::cast_slice(&EDGE_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let outline_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Outline Instance Buffer"),
            size: std::mem::size_of::<BoxInstance>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let instance_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BoxInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                },
                wgpu::VertexAttribute {
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 16,
                },
                wgpu::VertexAttribute {
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 32,
                },
            ],
        };

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Box Pipeline Layout"),
            bind_group_layouts: &[&globals_bgl],
            push_constant_ranges: &[],
        });

        let fill_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Box Fill Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_box"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<BoxVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[
                            wgpu::VertexAttribute {
                                shader_location: 0,
                                format: wgpu::VertexFormat::Float32x3,
                                offset: 0,
                            },
                            wgpu::VertexAttribute {
                                shader_location: 1,
                                format: wgpu::VertexFormat::Float32x3,
                                offset: 12,
                            },
                        ],
                    },
                    instance_layout.clone(),
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_box"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let outline_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Box Outline Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_outline"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                        }],
                    },
                    instance_layout,
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_outline"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        self.fill_pipeline = Some(fill_pipeline);
        self.outline_pipeline = Some(outline_pipeline);
        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
        self.corner_buffer = Some(corner_buffer);
        self.edge_buffer = Some(edge_buffer);
        self.outline_buffer = Some(outline_buffer);
        self.globals_buf = Some(globals_buf);
        self.globals_bg = Some(globals_bg);
        Ok(())
    }

    pub fn write_globals(&self, queue: &wgpu::Queue, view_proj: Mat4) -> Result<()> {
        let globals = self.globals_buf.as_ref().context("Box globals buffer missing")?;
        let light_dir = [0.35, 0.8, 0.5, 0.0];
        queue.write_buffer(
            globals,
            0,
            bytemuck::bytes_of(&Globals { view_proj: view_proj.to_cols_array_2d(), light_dir }),
        );
        Ok(())
    }

    pub fn upload_instances(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        instances: &[BoxInstance],
    ) -> Result<()> {
        self.ensure_instance_capacity(device, instances.len())?;
        if !instances.is_empty() {
            let instance_buffer =
                self.instance_buffer.as_ref().context("Box instance buffer missing")?;
            queue.write_buffer(instance_buffer, 0, bytemuck::cast_slice(instances));
        }
        Ok(())
    }

    pub fn upload_outline(&self, queue: &wgpu::Queue, outline: &BoxInstance) -> Result<()> {
        let buffer = self.outline_buffer.as_ref().context("Outline buffer missing")?;
        queue.write_buffer(buffer, 0, bytemuck::bytes_of(outline));
        Ok(())
    }

    pub fn encode_pass(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        instance_count: usize,
        outline: bool,
    ) -> Result<()> {
        if instance_count > 0 {
            pass.set_pipeline(self.fill_pipeline.as_ref().context("Box pipeline missing")?);
            pass.set_bind_group(
                0,
                self.globals_bg.as_ref().context("Box globals bind group missing")?,
                &[],
            );
            pass.set_vertex_buffer(
                0,
                self.vertex_buffer.as_ref().context("Box vertex buffer missing")?.slice(..),
            );
            pass.set_vertex_buffer(
                1,
                self.instance_buffer.as_ref().context("Box instance buffer missing")?.slice(..),
            );
            pass.set_index_buffer(
                self.index_buffer.as_ref().context("Box index buffer missing")?.slice(..),
                wgpu::IndexFormat::Uint16,
            );
            pass.draw_indexed(0..CUBE_INDICES.len() as u32, 0, 0..instance_count as u32);
        }

        if outline {
            pass.set_pipeline(self.outline_pipeline.as_ref().context("Outline pipeline missing")?);
            pass.set_bind_group(
                0,
                self.globals_bg.as_ref().context("Box globals bind group missing")?,
                &[],
            );
            pass.set_vertex_buffer(
                0,
                self.corner_buffer.as_ref().context("Outline vertex buffer missing")?.slice(..),
            );
            pass.set_vertex_buffer(
                1,
                self.outline_buffer.as_ref().context("Outline buffer missing")?.slice(..),
            );
            pass.set_index_buffer(
                self.edge_buffer.as_ref().context("Outline index buffer missing")?.slice(..),
                wgpu::IndexFormat::Uint16,
            );
            pass.draw_indexed(0..EDGE_INDICES.len() as u32, 0, 0..1);
        }
        Ok(())
    }

    fn ensure_instance_capacity(&mut self, device: &wgpu::Device, count: usize) -> Result<()> {
        let required = count.max(1);
        if self.instance_capacity >= required && self.instance_buffer.is_some() {
            return Ok(());
        }
        let mut new_cap = self.instance_capacity.max(256);
        while new_cap < required {
            new_cap *= 2;
        }
        let buf_size = (new_cap * std::mem::size_of::<BoxInstance>()) as u64;
        let new_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Box Instance Buffer"),
            size: buf_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.instance_buffer = Some(new_buf);
        self.instance_capacity = new_cap;
        Ok(())
    }
}
