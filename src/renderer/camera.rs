/// Orbit camera for viewing the trail
/// Rotates around a fixed target; drag to orbit, scroll to zoom
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Camera data uploaded to group 0 of every trail pipeline
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_projection: [[f32; 4]; 4], // 64 bytes
}

const MIN_DISTANCE: f32 = 20.0;
const MAX_DISTANCE: f32 = 1500.0;
const PITCH_LIMIT: f32 = 89.0;

pub struct Camera {
    target: Vec3,
    distance: f32,
    yaw: f32,   // degrees around +Y
    pitch: f32, // degrees above the XZ plane

    fov: f32,
    aspect_ratio: f32,
    near_plane: f32,
    far_plane: f32,

    sensitivity: f32,
    zoom_factor: f32,
}

impl Camera {
    pub fn new(aspect_ratio: f32) -> Self {
        let mut camera = Self {
            target: Vec3::ZERO,
            distance: 1.0,
            yaw: 0.0,
            pitch: 0.0,
            fov: 45.0,
            aspect_ratio,
            near_plane: 2.0,
            far_plane: 2000.0,
            sensitivity: 0.3,
            zoom_factor: 1.1,
        };
        camera.set_position(Vec3::new(0.0, 200.0, 400.0));
        camera
    }

    /// Place the camera at `position`, still looking at the target
    pub fn set_position(&mut self, position: Vec3) {
        let offset = position - self.target;
        self.distance = offset.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.yaw = offset.x.atan2(offset.z).to_degrees();
        self.pitch = (offset.y / offset.length().max(f32::EPSILON))
            .asin()
            .to_degrees()
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn position(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let offset = Vec3::new(
            pitch.cos() * yaw.sin(),
            pitch.sin(),
            pitch.cos() * yaw.cos(),
        ) * self.distance;
        self.target + offset
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.near_plane,
            self.far_plane,
        )
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn get_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_projection: self.view_projection_matrix().to_cols_array_2d(),
        }
    }

    /// Process mouse drag for orbiting
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32) {
        self.yaw -= x_offset * self.sensitivity;
        self.pitch = (self.pitch + y_offset * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Process scroll wheel for zoom
    pub fn process_scroll(&mut self, y_offset: f32) {
        self.distance =
            (self.distance * self.zoom_factor.powf(-y_offset)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Set aspect ratio (called on window resize)
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            self.aspect_ratio = aspect_ratio;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}
