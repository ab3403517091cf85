/// Graphics rendering system using wgpu
/// Owns the surface, the orbit camera and the GPU side of the trail
pub mod camera;
pub mod trail_buffers;
pub mod trail_shader;

use std::path::Path;
use std::sync::Arc;

use wgpu::{util::DeviceExt, BindGroup, BindGroupLayout, Buffer, Device, Queue, Surface};
use winit::{dpi::PhysicalSize, window::Window};

use crate::assets::{self, TextureAsset};
use crate::trail::{Scene, ShadingKind, TrailEngine};
use crate::{TrailError, TrailResult};

pub use camera::{Camera, CameraUniform};
pub use trail_buffers::TrailMeshBuffers;
pub use trail_shader::{DEPTH_FORMAT, TrailShader};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.04,
    a: 1.0,
};

pub struct Renderer {
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    surface_config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,

    pub camera: Camera,
    camera_buffer: Buffer,
    camera_layout: BindGroupLayout,
    camera_bind_group: BindGroup,

    base_shader: TrailShader,
    textured_shader: Option<TrailShader>,
    texture: Option<TextureAsset>,
    sampler: wgpu::Sampler,
    trail_mesh: Option<TrailMeshBuffers>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> TrailResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(|e| TrailError::Graphics(format!("Failed to create surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| TrailError::Graphics(format!("No suitable GPU adapter found: {}", e)))?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Trail Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| TrailError::Graphics(format!("Failed to create device: {}", e)))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| TrailError::Graphics("Surface reports no formats".to_string()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = Self::create_depth_view(&device, surface_config.width, surface_config.height);

        let camera = Camera::new(surface_config.width as f32 / surface_config.height as f32);
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera.get_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let base_shader = TrailShader::new(&device, format, &camera_layout, ShadingKind::Base);
        let sampler = trail_shader::create_repeat_sampler(&device);

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            depth_view,
            camera,
            camera_buffer,
            camera_layout,
            camera_bind_group,
            base_shader,
            textured_shader: None,
            texture: None,
            sampler,
            trail_mesh: None,
        })
    }

    fn create_depth_view(device: &Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Load the trail texture; textured shading becomes available on success
    pub async fn load_trail_texture(&mut self, path: &Path) -> TrailResult<()> {
        let texture = assets::load_texture(&self.device, &self.queue, path).await?;
        if self.textured_shader.is_none() {
            self.textured_shader = Some(TrailShader::new(
                &self.device,
                self.surface_config.format,
                &self.camera_layout,
                ShadingKind::Textured,
            ));
        }
        self.texture = Some(texture);
        // Rebind on the next sync
        self.trail_mesh = None;
        Ok(())
    }

    pub fn supports(&self, kind: ShadingKind) -> bool {
        match kind {
            ShadingKind::Base => true,
            ShadingKind::Textured => self.textured_shader.is_some() && self.texture.is_some(),
        }
    }

    fn shader_for(&self, kind: ShadingKind) -> &TrailShader {
        match kind {
            ShadingKind::Textured => self.textured_shader.as_ref().unwrap_or(&self.base_shader),
            ShadingKind::Base => &self.base_shader,
        }
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = Self::create_depth_view(&self.device, new_size.width, new_size.height);
        self.camera
            .set_aspect_ratio(new_size.width as f32 / new_size.height as f32);
    }

    /// Push the engine's pending mesh changes to the GPU, rebuilding buffers
    /// whenever the trail was re-initialized
    pub fn sync_trail(&mut self, engine: &mut TrailEngine) {
        let Some(mesh_id) = engine.mesh_id() else {
            self.trail_mesh = None;
            return;
        };
        let Some(kind) = engine.material().map(|m| m.kind()) else {
            return;
        };

        let stale = self
            .trail_mesh
            .as_ref()
            .is_none_or(|mesh| mesh.mesh_id() != mesh_id || mesh.kind() != kind);

        if stale {
            if !self.supports(kind) {
                log::warn!("{:?} shading unavailable, trail not uploaded", kind);
                self.trail_mesh = None;
                return;
            }
            let texture = self.texture.as_ref().map(|t| (&t.view, &self.sampler));
            let shader = self.shader_for(kind);
            let (Some(material), Some(geometry)) = (engine.material().cloned(), engine.geometry_mut())
            else {
                return;
            };
            let mesh = TrailMeshBuffers::new(&self.device, shader, texture, geometry, &material);
            self.trail_mesh = Some(mesh);
        }

        if let Some(mesh) = &self.trail_mesh {
            let material = engine.material().cloned();
            if let (Some(material), Some(geometry)) = (material, engine.geometry_mut()) {
                mesh.sync(&self.queue, geometry, &material);
            }
        }
    }

    /// Draw the trail (when it is in the scene) followed by an overlay pass
    pub fn render<F>(&mut self, engine: &TrailEngine, scene: &Scene, overlay: F) -> TrailResult<()>
    where
        F: FnOnce(&Device, &Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView) -> TrailResult<()>,
    {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(TrailError::Graphics(format!("Failed to acquire frame: {}", e))),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.get_uniform()]),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Trail Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Trail Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let visible = engine.mesh_id().is_some_and(|id| scene.contains(id));
            if let (true, Some(mesh), Some(material), Some(geometry)) = (
                visible,
                &self.trail_mesh,
                engine.material(),
                engine.geometry(),
            ) {
                if mesh.mesh_id() == geometry.mesh_id() {
                    let shader = self.shader_for(mesh.kind());
                    render_pass.set_pipeline(shader.pipeline(material.depth_write()));
                    render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                    mesh.draw(&mut render_pass, geometry.draw_index_count());
                }
            }
        }

        overlay(&self.device, &self.queue, &mut encoder, &view)?;

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
