use anyhow::Result;
use egui_wgpu::{Renderer as EguiRenderer, ScreenDescriptor};
use glam::Mat4;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

mod box_pass;
mod egui_pass;
mod window_surface;

pub use box_pass::{BoxInstance, BoxPass};
pub use window_surface::{SurfaceFrame, WindowSurface};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color { r: 0.06, g: 0.06, b: 0.09, a: 1.0 };

/// Window surface plus the box pass, tied together behind one frame API.
pub struct Renderer {
    surface: WindowSurface,
    boxes: BoxPass,
}

impl Renderer {
    pub fn new(window_cfg: &crate::config::WindowConfig) -> Self {
        Self { surface: WindowSurface::new(window_cfg), boxes: BoxPass::new() }
    }

    pub fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        self.surface.ensure_window(event_loop)?;
        if !self.boxes.is_initialized() {
            let format = self.surface.surface_format()?;
            let device = self.surface.device()?;
            self.boxes.init_pipelines(device, format)?;
        }
        Ok(())
    }

    pub fn device(&self) -> Result<&wgpu::Device> {
        self.surface.device()
    }

    pub fn queue(&self) -> Result<&wgpu::Queue> {
        self.surface.queue()
    }

    pub fn surface_format(&self) -> Result<wgpu::TextureFormat> {
        self.surface.surface_format()
    }

    pub fn window(&self) -> Option<&Window> {
        self.surface.window()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.surface.size()
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.surface.pixels_per_point()
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.surface.resize(new_size);
    }

    /// Renders the volume stack and returns the frame for the egui overlay.
    /// `outline` carries the highlight wireframe for the hovered volume.
    pub fn render_frame(
        &mut self,
        instances: &[BoxInstance],
        outline: Option<&BoxInstance>,
        view_proj: Mat4,
    ) -> Result<SurfaceFrame> {
        let frame = self.surface.acquire_surface_frame()?;
        let (device, queue) = self.surface.device_and_queue()?;

        self.boxes.write_globals(queue, view_proj)?;
        self.boxes.upload_instances(device, queue, instances)?;
        if let Some(outline) = outline {
            self.boxes.upload_outline(queue, outline)?;
        }

        let mut encoder = device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Encoder") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Box Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame.view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.surface.depth_view()?,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.boxes.encode_pass(&mut pass, instances.len(), outline.is_some())?;
        }
        queue.submit(std::iter::once(encoder.finish()));
        Ok(frame)
    }

    pub fn render_egui(
        &mut self,
        painter: &mut EguiRenderer,
        paint_jobs: &[egui::ClippedPrimitive],
        screen: &ScreenDescriptor,
        frame: SurfaceFrame,
    ) -> Result<()> {
        let (device, queue) = self.surface.device_and_queue()?;
        egui_pass::render(device, queue, painter, paint_jobs, screen, frame)
    }
}
