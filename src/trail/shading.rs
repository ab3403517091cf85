/// Trail shading: head-to-tail gradient with optional tiled texture
///
/// The WGSL programs are plain constant data owned by this module. The CPU
/// helpers below evaluate the same formulas as the vertex shaders, which keeps
/// the fade and texture-coordinate policy testable without a GPU.
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};

pub const BASE_SHADER_SOURCE: &str = include_str!("../shaders/trail_base.wgsl");
pub const TEXTURED_SHADER_SOURCE: &str = include_str!("../shaders/trail_textured.wgsl");

/// Selects which of the two trail programs a material uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum ShadingKind {
    /// Color gradient only
    Base,
    /// Gradient modulated by a repeat-wrapped texture
    #[default]
    Textured,
}

/// Uniform block shared by both trail shaders (group 1, binding 0)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TrailUniforms {
    pub head_color: [f32; 4],          // 16 bytes
    pub tail_color: [f32; 4],          // 16 bytes
    pub texture_tile_factor: [f32; 2], // 8 bytes
    pub min_id: u32,                   // 4 bytes
    pub max_id: u32,                   // 4 bytes
    pub trail_length: f32,             // 4 bytes
    pub max_trail_length: f32,         // 4 bytes
    pub vertices_per_node: f32,        // 4 bytes
    pub drag_texture: u32,             // 4 bytes
    pub alpha_test: f32,               // 4 bytes
    pub _padding: [f32; 3],            // 12 bytes
} // Total: 80 bytes

impl Default for TrailUniforms {
    fn default() -> Self {
        Self {
            head_color: [1.0, 1.0, 1.0, 1.0],
            tail_color: [1.0, 1.0, 1.0, 0.0],
            texture_tile_factor: [1.0, 1.0],
            min_id: 0,
            max_id: 0,
            trail_length: 0.0,
            max_trail_length: 0.0,
            vertices_per_node: 2.0,
            drag_texture: 0,
            alpha_test: 0.0,
            _padding: [0.0; 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrailMaterial {
    kind: ShadingKind,
    uniforms: TrailUniforms,
    depth_write: bool,
}

impl TrailMaterial {
    pub fn new(kind: ShadingKind) -> Self {
        Self {
            kind,
            uniforms: TrailUniforms::default(),
            depth_write: false,
        }
    }

    pub fn base() -> Self {
        Self::new(ShadingKind::Base)
    }

    pub fn textured() -> Self {
        Self::new(ShadingKind::Textured)
    }

    pub fn kind(&self) -> ShadingKind {
        self.kind
    }

    pub fn uniforms(&self) -> &TrailUniforms {
        &self.uniforms
    }

    pub fn shader_source(&self) -> &'static str {
        match self.kind {
            ShadingKind::Base => BASE_SHADER_SOURCE,
            ShadingKind::Textured => TEXTURED_SHADER_SOURCE,
        }
    }

    /// Source-alpha / one-minus-source-alpha, additive equation
    pub fn blend_state() -> wgpu::BlendState {
        let component = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        };
        wgpu::BlendState {
            color: component,
            alpha: component,
        }
    }

    pub fn depth_write(&self) -> bool {
        self.depth_write
    }

    pub fn set_depth_write(&mut self, depth_write: bool) {
        self.depth_write = depth_write;
    }

    pub fn head_color(&self) -> Vec4 {
        Vec4::from_array(self.uniforms.head_color)
    }

    pub fn set_head_color(&mut self, color: Vec4) {
        self.uniforms.head_color = color.to_array();
    }

    pub fn tail_color(&self) -> Vec4 {
        Vec4::from_array(self.uniforms.tail_color)
    }

    pub fn set_tail_color(&mut self, color: Vec4) {
        self.uniforms.tail_color = color.to_array();
    }

    pub fn texture_tile_factor(&self) -> Vec2 {
        Vec2::from_array(self.uniforms.texture_tile_factor)
    }

    pub fn set_texture_tile_factor(&mut self, factor: Vec2) {
        self.uniforms.texture_tile_factor = factor.to_array();
    }

    pub fn drag_texture(&self) -> bool {
        self.uniforms.drag_texture != 0
    }

    /// Fragments with alpha below this are discarded; 0 disables the test
    pub fn set_alpha_test(&mut self, threshold: f32) {
        self.uniforms.alpha_test = threshold.clamp(0.0, 1.0);
    }

    pub fn alpha_test(&self) -> f32 {
        self.uniforms.alpha_test
    }

    /// Per-allocation uniforms, applied when a trail is (re)initialized
    pub(crate) fn configure_for_trail(
        &mut self,
        max_trail_length: usize,
        vertices_per_node: usize,
        drag_texture: bool,
    ) {
        self.uniforms.trail_length = 0.0;
        self.uniforms.min_id = 0;
        self.uniforms.max_id = 0;
        self.uniforms.drag_texture = drag_texture as u32;
        self.uniforms.max_trail_length = max_trail_length as f32;
        self.uniforms.vertices_per_node = vertices_per_node as f32;
        self.uniforms.texture_tile_factor = [1.0, 1.0];
    }

    /// Live id window and length, refreshed after every advance
    pub(crate) fn set_node_window(&mut self, min_id: u32, max_id: u32, trail_length: usize) {
        self.uniforms.min_id = min_id;
        self.uniforms.max_id = max_id;
        self.uniforms.trail_length = trail_length as f32;
    }

    /// Normalized age of a node: 0 at `max_id`, 1 at `min_id`
    pub fn fade_fraction(&self, node_id: u32) -> f32 {
        let span = self.uniforms.max_id.saturating_sub(self.uniforms.min_id);
        if span == 0 {
            return 0.0;
        }
        let age = self.uniforms.max_id.saturating_sub(node_id);
        (age as f32 / span as f32).clamp(0.0, 1.0)
    }

    pub fn color_at(&self, node_id: u32) -> Vec4 {
        self.head_color()
            .lerp(self.tail_color(), self.fade_fraction(node_id))
    }

    /// Rendered vertex position: the ribbon narrows onto the node centers with age
    pub fn render_position(&self, position: Vec3, node_center: Vec3, node_id: u32) -> Vec3 {
        position.lerp(node_center, self.fade_fraction(node_id))
    }

    /// Texture coordinates as evaluated by the textured vertex shader
    pub fn texture_coords(&self, node_id: u32, node_vertex_id: u32) -> Vec2 {
        let tile = self.texture_tile_factor();
        let s = if self.drag_texture() {
            self.fade_fraction(node_id) * tile.x
        } else if self.uniforms.max_trail_length > 0.0 {
            node_id as f32 / self.uniforms.max_trail_length * tile.x
        } else {
            0.0
        };
        let t = if self.uniforms.vertices_per_node > 0.0 {
            node_vertex_id as f32 / self.uniforms.vertices_per_node * tile.y
        } else {
            0.0
        };
        Vec2::new(s, t)
    }
}

impl Default for TrailMaterial {
    fn default() -> Self {
        Self::base()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material_with_window(min_id: u32, max_id: u32) -> TrailMaterial {
        let mut material = TrailMaterial::base();
        material.set_head_color(Vec4::new(1.0, 0.0, 0.0, 0.75));
        material.set_tail_color(Vec4::new(0.0, 1.0, 1.0, 0.35));
        material.set_node_window(min_id, max_id, (max_id - min_id) as usize);
        material
    }

    #[test]
    fn test_uniform_size() {
        assert_eq!(std::mem::size_of::<TrailUniforms>(), 80);
    }

    #[test]
    fn test_fade_endpoints() {
        let material = material_with_window(20, 120);
        assert_eq!(material.fade_fraction(120), 0.0);
        assert_eq!(material.fade_fraction(20), 1.0);
        assert!((material.fade_fraction(70) - 0.5).abs() < 1e-6);

        assert_eq!(material.color_at(120), material.head_color());
        assert_eq!(material.color_at(20), material.tail_color());
    }

    #[test]
    fn test_fade_with_empty_window() {
        let material = material_with_window(0, 0);
        assert_eq!(material.fade_fraction(0), 0.0);
        assert_eq!(material.color_at(0), material.head_color());
    }

    #[test]
    fn test_tail_collapses_to_center() {
        let material = material_with_window(0, 10);
        let position = Vec3::new(4.0, 0.0, 0.0);
        let center = Vec3::ZERO;
        assert_eq!(material.render_position(position, center, 10), position);
        assert_eq!(material.render_position(position, center, 0), center);
    }

    #[test]
    fn test_texture_coords_scroll_mode() {
        let mut material = TrailMaterial::textured();
        material.configure_for_trail(301, 3, false);
        material.set_texture_tile_factor(Vec2::new(10.0, 0.8));
        material.set_node_window(0, 1, 1);

        let uv = material.texture_coords(0, 0);
        assert_eq!(uv, Vec2::ZERO);

        let uv = material.texture_coords(301, 3);
        assert!((uv.x - 10.0).abs() < 1e-5);
        assert!((uv.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_texture_coords_drag_mode() {
        let mut material = TrailMaterial::textured();
        material.configure_for_trail(11, 2, true);
        material.set_texture_tile_factor(Vec2::new(2.0, 1.0));
        material.set_node_window(0, 10, 10);

        assert!(material.drag_texture());
        assert_eq!(material.texture_coords(10, 0).x, 0.0);
        assert!((material.texture_coords(0, 1).x - 2.0).abs() < 1e-6);
        assert!((material.texture_coords(5, 1).y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_configure_resets_tile_factor() {
        let mut material = TrailMaterial::textured();
        material.set_texture_tile_factor(Vec2::new(5.0, 5.0));
        material.configure_for_trail(4, 2, false);
        assert_eq!(material.texture_tile_factor(), Vec2::ONE);
        assert_eq!(material.uniforms().max_trail_length, 4.0);
    }

    #[test]
    fn test_shader_sources_match_kind() {
        assert!(TrailMaterial::base().shader_source().contains("fn vs_main"));
        assert!(
            TrailMaterial::textured()
                .shader_source()
                .contains("trail_texture")
        );
        assert!(!BASE_SHADER_SOURCE.contains("trail_texture"));
    }
}
