/// Trail pipelines: one per depth-write setting for a shading kind
/// Blended, double sided, depth tested against the scene depth buffer
use wgpu::{BindGroup, BindGroupLayout, Buffer, Device, RenderPipeline, Sampler, TextureView};

use crate::trail::{ShadingKind, TrailMaterial, TrailVertex};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct TrailShader {
    kind: ShadingKind,
    material_layout: BindGroupLayout,
    // Indexed by depth write: [off, on]
    pipelines: [RenderPipeline; 2],
}

impl TrailShader {
    pub fn new(
        device: &Device,
        surface_format: wgpu::TextureFormat,
        camera_layout: &BindGroupLayout,
        kind: ShadingKind,
    ) -> Self {
        let material = TrailMaterial::new(kind);
        let label = match kind {
            ShadingKind::Base => "Trail Base",
            ShadingKind::Textured => "Trail Textured",
        };

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(material.shader_source().into()),
        });

        let material_layout = Self::create_material_layout(device, kind);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Trail Pipeline Layout"),
            bind_group_layouts: &[camera_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let pipelines = [false, true].map(|depth_write| {
            Self::create_pipeline(device, &pipeline_layout, &shader, surface_format, depth_write)
        });

        log::info!("Created {} pipelines", label);

        Self {
            kind,
            material_layout,
            pipelines,
        }
    }

    fn create_material_layout(device: &Device, kind: ShadingKind) -> BindGroupLayout {
        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];

        if kind == ShadingKind::Textured {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Trail Material Bind Group Layout"),
            entries: &entries,
        })
    }

    fn create_pipeline(
        device: &Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        depth_write: bool,
    ) -> RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(if depth_write {
                "Trail Pipeline (depth write)"
            } else {
                "Trail Pipeline"
            }),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[TrailVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(TrailMaterial::blend_state()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: depth_write,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    pub fn kind(&self) -> ShadingKind {
        self.kind
    }

    pub fn pipeline(&self, depth_write: bool) -> &RenderPipeline {
        &self.pipelines[depth_write as usize]
    }

    /// Bind the material uniforms, plus texture and sampler for textured shading
    pub fn create_bind_group(
        &self,
        device: &Device,
        uniform_buffer: &Buffer,
        texture: Option<(&TextureView, &Sampler)>,
    ) -> BindGroup {
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }];

        if self.kind == ShadingKind::Textured {
            if let Some((view, sampler)) = texture {
                entries.push(wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                });
                entries.push(wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                });
            }
        }

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Trail Material Bind Group"),
            layout: &self.material_layout,
            entries: &entries,
        })
    }
}

/// Repeat-wrapped linear sampler for tiled trail textures
pub fn create_repeat_sampler(device: &Device) -> Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Trail Texture Sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}
