/// Trail mesh buffers and connectivity
/// Vertex and index data live in fixed-size arrays that are patched in place
use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::trail::scene::MeshId;

/// Three indices per triangle
pub const INDICES_PER_FACE: usize = 3;
/// Two triangles per quad
pub const FACES_PER_QUAD: usize = 2;

/// Per-vertex data consumed by the trail shaders
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TrailVertex {
    pub position: [f32; 3],    // 12 bytes
    pub node_center: [f32; 3], // 12 bytes
    pub node_id: u32,          // 4 bytes
    pub node_vertex_id: u32,   // 4 bytes
} // Total: 32 bytes

impl TrailVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Uint32,
            3 => Uint32
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TrailVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Element ranges written since the last drain, coalesced when they touch
#[derive(Debug, Default)]
pub struct DirtyRanges {
    ranges: Vec<Range<usize>>,
}

impl DirtyRanges {
    pub fn mark(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        if let Some(last) = self.ranges.last_mut() {
            if range.start <= last.end && range.end >= last.start {
                last.start = last.start.min(range.start);
                last.end = last.end.max(range.end);
                return;
            }
        }
        self.ranges.push(range);
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Keeps the allocation so steady-state frames do not allocate
    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}

/// CPU side of the trail mesh: `node_count` slots of `vertices_per_node`
/// vertices each, plus the quad indices linking every slot to its successor.
#[derive(Debug)]
pub struct TrailGeometry {
    mesh_id: MeshId,
    node_count: usize,
    vertices_per_node: usize,
    faces_per_node: usize,
    vertices: Vec<TrailVertex>,
    indices: Vec<u32>,
    draw_count: usize,
    dirty_vertices: DirtyRanges,
    dirty_indices: DirtyRanges,
}

impl TrailGeometry {
    pub fn new(node_count: usize, vertices_per_node: usize) -> Self {
        let faces_per_node = vertices_per_node.saturating_sub(1) * FACES_PER_QUAD;
        let vertex_count = node_count * vertices_per_node;
        let index_count = node_count * faces_per_node * INDICES_PER_FACE;

        let mut vertices = vec![TrailVertex::zeroed(); vertex_count];
        for (i, vertex) in vertices.iter_mut().enumerate() {
            vertex.node_vertex_id = (i % vertices_per_node.max(1)) as u32;
        }

        let geometry = Self {
            mesh_id: MeshId::next(),
            node_count,
            vertices_per_node,
            faces_per_node,
            vertices,
            indices: vec![0; index_count],
            draw_count: 0,
            dirty_vertices: DirtyRanges::default(),
            dirty_indices: DirtyRanges::default(),
        };

        log::debug!(
            "Allocated trail geometry {:?}: {} nodes, {} vertices, {} indices",
            geometry.mesh_id,
            node_count,
            vertex_count,
            index_count
        );

        geometry
    }

    pub fn mesh_id(&self) -> MeshId {
        self.mesh_id
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn vertices_per_node(&self) -> usize {
        self.vertices_per_node
    }

    pub fn faces_per_node(&self) -> usize {
        self.faces_per_node
    }

    pub fn face_indices_per_node(&self) -> usize {
        self.faces_per_node * INDICES_PER_FACE
    }

    pub fn vertices(&self) -> &[TrailVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertices belonging to one node slot
    pub fn node_vertices(&self, node: usize) -> &[TrailVertex] {
        &self.vertices[self.node_vertex_range(node)]
    }

    /// Index entries of the quad strip whose source is `node`
    pub fn quad_indices(&self, node: usize) -> &[u32] {
        &self.indices[self.node_index_range(node)]
    }

    /// Number of leading index entries submitted for drawing
    pub fn draw_index_count(&self) -> usize {
        self.draw_count
    }

    pub fn set_draw_range(&mut self, count: usize) {
        self.draw_count = count.min(self.indices.len());
    }

    fn node_vertex_range(&self, node: usize) -> Range<usize> {
        let start = node * self.vertices_per_node;
        start..start + self.vertices_per_node
    }

    fn node_index_range(&self, node: usize) -> Range<usize> {
        let start = node * self.face_indices_per_node();
        start..start + self.face_indices_per_node()
    }

    /// Write two triangles per adjacent profile pair between `src` and `dest`
    pub fn connect(&mut self, src: usize, dest: usize) {
        let vpn = self.vertices_per_node;
        for i in 0..vpn.saturating_sub(1) {
            let src_vertex = (vpn * src + i) as u32;
            let dest_vertex = (vpn * dest + i) as u32;
            let face_index = (src * self.faces_per_node + i * FACES_PER_QUAD) * INDICES_PER_FACE;

            self.indices[face_index..face_index + 6].copy_from_slice(&[
                src_vertex,
                dest_vertex,
                src_vertex + 1,
                dest_vertex,
                dest_vertex + 1,
                src_vertex + 1,
            ]);
        }
        let range = self.node_index_range(src);
        self.dirty_indices.mark(range);
    }

    /// Zero the quad strip whose source is `node`, leaving degenerate triangles
    pub fn disconnect(&mut self, node: usize) {
        let range = self.node_index_range(node);
        self.indices[range.clone()].fill(0);
        self.dirty_indices.mark(range);
    }

    /// A quad strip is live when any of its indices is non-zero
    pub fn is_connected(&self, node: usize) -> bool {
        !self.quad_indices(node).is_empty() && self.quad_indices(node).iter().any(|&i| i != 0)
    }

    pub fn connected_quad_count(&self) -> usize {
        (0..self.node_count).filter(|&n| self.is_connected(n)).count()
    }

    /// Connected strips inside the current draw range
    pub fn visible_quad_count(&self) -> usize {
        let per_node = self.face_indices_per_node();
        if per_node == 0 {
            return 0;
        }
        (0..self.draw_count / per_node)
            .filter(|&n| self.is_connected(n))
            .count()
    }

    pub fn zero_indices(&mut self) {
        self.indices.fill(0);
        self.dirty_indices.mark(0..self.indices.len());
    }

    /// Pre-link every slot to its successor; the wrap-around strip stays empty
    pub fn form_initial_faces(&mut self) {
        self.zero_indices();
        for i in 0..self.node_count.saturating_sub(1) {
            self.connect(i, i + 1);
        }
    }

    /// Clear positions, centers and ids; per-node vertex indices are kept
    pub fn zero_vertices(&mut self) {
        for vertex in &mut self.vertices {
            vertex.position = [0.0; 3];
            vertex.node_center = [0.0; 3];
            vertex.node_id = 0;
        }
        self.dirty_vertices.mark(0..self.vertices.len());
    }

    /// Store world-space profile points and the node center for one slot
    pub fn write_node(&mut self, node: usize, center: Vec3, points: &[Vec3]) {
        let range = self.node_vertex_range(node);
        let center = center.to_array();
        for (vertex, point) in self.vertices[range.clone()].iter_mut().zip(points) {
            vertex.position = point.to_array();
            vertex.node_center = center;
        }
        self.dirty_vertices.mark(range);
    }

    pub fn write_node_id(&mut self, node: usize, id: u32) {
        let range = self.node_vertex_range(node);
        for (i, vertex) in self.vertices[range.clone()].iter_mut().enumerate() {
            vertex.node_id = id;
            vertex.node_vertex_id = i as u32;
        }
        self.dirty_vertices.mark(range);
    }

    pub fn dirty_vertices(&self) -> &DirtyRanges {
        &self.dirty_vertices
    }

    pub fn dirty_indices(&self) -> &DirtyRanges {
        &self.dirty_indices
    }

    /// Hand the pending vertex ranges to `upload` and clear them
    pub fn take_dirty_vertices(&mut self, mut upload: impl FnMut(usize, &[TrailVertex])) {
        for range in self.dirty_vertices.ranges() {
            upload(range.start, &self.vertices[range.clone()]);
        }
        self.dirty_vertices.clear();
    }

    /// Hand the pending index ranges to `upload` and clear them
    pub fn take_dirty_indices(&mut self, mut upload: impl FnMut(usize, &[u32])) {
        for range in self.dirty_indices.ranges() {
            upload(range.start, &self.indices[range.clone()]);
        }
        self.dirty_indices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<TrailVertex>(), 32);
    }

    #[test]
    fn test_connect_writes_quad_strip() {
        let mut geometry = TrailGeometry::new(4, 3);
        assert_eq!(geometry.faces_per_node(), 4);
        assert_eq!(geometry.indices().len(), 4 * 4 * 3);

        geometry.connect(1, 2);
        assert_eq!(
            geometry.quad_indices(1),
            &[3, 6, 4, 6, 7, 4, 4, 7, 5, 7, 8, 5]
        );
        assert!(geometry.is_connected(1));
        assert!(!geometry.is_connected(0));
    }

    #[test]
    fn test_disconnect_zeroes_only_that_node() {
        let mut geometry = TrailGeometry::new(4, 2);
        geometry.form_initial_faces();
        assert_eq!(geometry.connected_quad_count(), 3);

        geometry.disconnect(1);
        assert!(geometry.quad_indices(1).iter().all(|&i| i == 0));
        assert!(geometry.is_connected(0));
        assert!(geometry.is_connected(2));
        assert_eq!(geometry.connected_quad_count(), 2);
    }

    #[test]
    fn test_initial_faces_leave_wraparound_empty() {
        let mut geometry = TrailGeometry::new(5, 2);
        geometry.form_initial_faces();
        assert!(!geometry.is_connected(4));
        assert_eq!(geometry.quad_indices(3), &[6, 8, 7, 8, 9, 7]);
    }

    #[test]
    fn test_write_node_and_ids() {
        let mut geometry = TrailGeometry::new(3, 2);
        geometry.write_node(
            2,
            Vec3::new(1.0, 2.0, 3.0),
            &[Vec3::new(0.0, 2.0, 3.0), Vec3::new(2.0, 2.0, 3.0)],
        );
        geometry.write_node_id(2, 41);

        let node = geometry.node_vertices(2);
        assert_eq!(node[0].position, [0.0, 2.0, 3.0]);
        assert_eq!(node[1].position, [2.0, 2.0, 3.0]);
        assert!(node.iter().all(|v| v.node_center == [1.0, 2.0, 3.0]));
        assert!(node.iter().all(|v| v.node_id == 41));
        assert_eq!(node[1].node_vertex_id, 1);
    }

    #[test]
    fn test_dirty_ranges_coalesce_and_drain() {
        let mut geometry = TrailGeometry::new(4, 2);
        geometry.write_node(1, Vec3::ZERO, &[Vec3::ZERO, Vec3::ZERO]);
        geometry.write_node_id(1, 0);
        geometry.write_node(2, Vec3::ZERO, &[Vec3::ZERO, Vec3::ZERO]);
        assert_eq!(geometry.dirty_vertices().ranges(), &[2..6]);

        let mut uploads = Vec::new();
        geometry.take_dirty_vertices(|offset, data| uploads.push((offset, data.len())));
        assert_eq!(uploads, vec![(2, 4)]);
        assert!(geometry.dirty_vertices().is_empty());
    }

    #[test]
    fn test_single_point_profile_has_no_indices() {
        let mut geometry = TrailGeometry::new(4, 1);
        geometry.form_initial_faces();
        geometry.set_draw_range(100);
        assert!(geometry.indices().is_empty());
        assert_eq!(geometry.draw_index_count(), 0);
        assert_eq!(geometry.connected_quad_count(), 0);
    }
}
