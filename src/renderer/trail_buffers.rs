/// GPU copies of one trail mesh, kept in sync through dirty ranges
use wgpu::{BindGroup, Buffer, Device, Queue, util::DeviceExt};

use crate::renderer::trail_shader::TrailShader;
use crate::trail::{MeshId, ShadingKind, TrailGeometry, TrailMaterial, TrailVertex};

pub struct TrailMeshBuffers {
    mesh_id: MeshId,
    kind: ShadingKind,
    // None for a zero-capacity or faceless trail
    vertex_buffer: Option<Buffer>,
    index_buffer: Option<Buffer>,
    uniform_buffer: Buffer,
    bind_group: BindGroup,
}

impl TrailMeshBuffers {
    /// Upload the whole mesh and clear its dirty ranges
    pub fn new(
        device: &Device,
        shader: &TrailShader,
        texture: Option<(&wgpu::TextureView, &wgpu::Sampler)>,
        geometry: &mut TrailGeometry,
        material: &TrailMaterial,
    ) -> Self {
        let vertex_buffer = (!geometry.vertices().is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Trail Vertex Buffer"),
                contents: bytemuck::cast_slice(geometry.vertices()),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            })
        });
        let index_buffer = (!geometry.indices().is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Trail Index Buffer"),
                contents: bytemuck::cast_slice(geometry.indices()),
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            })
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Trail Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*material.uniforms()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = shader.create_bind_group(device, &uniform_buffer, texture);

        // Everything pending is already in the initial upload
        geometry.take_dirty_vertices(|_, _| {});
        geometry.take_dirty_indices(|_, _| {});

        log::debug!(
            "Uploaded trail mesh {:?}: {} vertices, {} indices",
            geometry.mesh_id(),
            geometry.vertices().len(),
            geometry.indices().len()
        );

        Self {
            mesh_id: geometry.mesh_id(),
            kind: shader.kind(),
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn mesh_id(&self) -> MeshId {
        self.mesh_id
    }

    pub fn kind(&self) -> ShadingKind {
        self.kind
    }

    /// Write the changed vertex/index ranges and the current uniforms
    pub fn sync(&self, queue: &Queue, geometry: &mut TrailGeometry, material: &TrailMaterial) {
        const VERTEX_SIZE: u64 = std::mem::size_of::<TrailVertex>() as u64;
        const INDEX_SIZE: u64 = std::mem::size_of::<u32>() as u64;

        match &self.vertex_buffer {
            Some(buffer) => geometry.take_dirty_vertices(|start, vertices| {
                queue.write_buffer(
                    buffer,
                    start as u64 * VERTEX_SIZE,
                    bytemuck::cast_slice(vertices),
                );
            }),
            None => geometry.take_dirty_vertices(|_, _| {}),
        }

        match &self.index_buffer {
            Some(buffer) => geometry.take_dirty_indices(|start, indices| {
                queue.write_buffer(
                    buffer,
                    start as u64 * INDEX_SIZE,
                    bytemuck::cast_slice(indices),
                );
            }),
            None => geometry.take_dirty_indices(|_, _| {}),
        }

        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[*material.uniforms()]),
        );
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, index_count: usize) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&self.vertex_buffer, &self.index_buffer)
        else {
            return;
        };
        if index_count == 0 {
            return;
        }

        render_pass.set_bind_group(1, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..index_count as u32, 0, 0..1);
    }
}
