/// Demo trail options, loaded from a RON file
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::trail::{HeadProfile, ShadingKind, TrailMaterial};
use crate::{TrailError, TrailResult};

/// Cross-section presets offered by the demo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeadShape {
    Line,
    #[default]
    Plane,
    Star,
    Circle,
    /// Uses `TrailOptions::custom_points`
    Custom,
}

impl HeadShape {
    pub const ALL: [HeadShape; 5] = [
        HeadShape::Line,
        HeadShape::Plane,
        HeadShape::Star,
        HeadShape::Circle,
        HeadShape::Custom,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HeadShape::Line => "Line",
            HeadShape::Plane => "Plane",
            HeadShape::Star => "Star",
            HeadShape::Circle => "Circle",
            HeadShape::Custom => "Custom",
        }
    }
}

/// Longest trail the options accept
pub const MAX_TRAIL_LENGTH: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailOptions {
    pub head_color: [f32; 4],
    pub tail_color: [f32; 4],
    pub trail_length: usize,
    pub shading: ShadingKind,
    pub shape: HeadShape,
    pub line_width: f32,
    /// Component lists, `[x, y]` or `[x, y, z]`
    pub custom_points: Vec<Vec<f32>>,
    pub texture_tile_factor: [f32; 2],
    pub drag_texture: bool,
    pub depth_write: bool,
    pub paused: bool,
    pub advance_frequency: f64,
    pub orient_to_movement: bool,
    pub texture_path: PathBuf,
}

impl Default for TrailOptions {
    fn default() -> Self {
        Self {
            head_color: [1.0, 0.0, 0.0, 0.75],
            tail_color: [0.0, 1.0, 1.0, 0.35],
            trail_length: 300,
            shading: ShadingKind::Textured,
            shape: HeadShape::Plane,
            line_width: 28.0,
            custom_points: Vec::new(),
            texture_tile_factor: [10.0, 0.8],
            drag_texture: false,
            depth_write: false,
            paused: false,
            advance_frequency: crate::trail::DEFAULT_ADVANCE_FREQUENCY,
            orient_to_movement: false,
            texture_path: PathBuf::from("assets/textures/sparkle.png"),
        }
    }
}

impl TrailOptions {
    pub fn from_ron(source: &str) -> TrailResult<Self> {
        let mut options: Self =
            ron::from_str(source).map_err(|e| TrailError::Config(e.to_string()))?;
        if options.trail_length > MAX_TRAIL_LENGTH {
            log::warn!(
                "Trail length {} too long, clamping to {}",
                options.trail_length,
                MAX_TRAIL_LENGTH
            );
            options.trail_length = MAX_TRAIL_LENGTH;
        }
        Ok(options)
    }

    /// Read options from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> TrailResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(source) => {
                let options = Self::from_ron(&source)?;
                log::info!("Loaded trail options from {}", path.display());
                Ok(options)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "Options file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn head_profile(&self) -> HeadProfile {
        match self.shape {
            HeadShape::Line => HeadProfile::line(self.line_width),
            HeadShape::Plane => HeadProfile::plane(),
            HeadShape::Star => HeadProfile::star(),
            HeadShape::Circle => HeadProfile::circle(),
            HeadShape::Custom => HeadProfile::from_components(&self.custom_points),
        }
    }

    /// Settings that can change without rebuilding the trail
    pub fn apply_to_material(&self, material: &mut TrailMaterial) {
        material.set_head_color(Vec4::from_array(self.head_color));
        material.set_tail_color(Vec4::from_array(self.tail_color));
        material.set_texture_tile_factor(Vec2::from_array(self.texture_tile_factor));
        material.set_depth_write(self.depth_write);
    }

    /// True when switching from `self` to `other` needs a fresh allocation
    pub fn requires_reinitialize(&self, other: &TrailOptions) -> bool {
        self.trail_length != other.trail_length
            || self.shape != other.shape
            || self.shading != other.shading
            || self.drag_texture != other.drag_texture
            || (self.shape == HeadShape::Line && self.line_width != other.line_width)
            || (self.shape == HeadShape::Custom && self.custom_points != other.custom_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let options = TrailOptions::from_ron("(trail_length: 50, shape: Star, drag_texture: true)")
            .unwrap();
        assert_eq!(options.trail_length, 50);
        assert_eq!(options.shape, HeadShape::Star);
        assert!(options.drag_texture);
        assert_eq!(options.head_color, [1.0, 0.0, 0.0, 0.75]);
        assert_eq!(options.shading, ShadingKind::Textured);
    }

    #[test]
    fn test_shipped_options_match_defaults() {
        let options = TrailOptions::from_ron(include_str!("../trail_options.ron")).unwrap();
        assert_eq!(options, TrailOptions::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let result = TrailOptions::from_ron("(trail_length: \"long\")");
        assert!(matches!(result, Err(TrailError::Config(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let options = TrailOptions::load(Path::new("does/not/exist.ron")).unwrap();
        assert_eq!(options, TrailOptions::default());
    }

    #[test]
    fn test_trail_length_is_clamped() {
        let options = TrailOptions::from_ron("(trail_length: 4000000000)").unwrap();
        assert_eq!(options.trail_length, MAX_TRAIL_LENGTH);
    }

    #[test]
    fn test_custom_points() {
        let options = TrailOptions::from_ron(
            "(shape: Custom, custom_points: [[0.0, 1.0], [2.0, 3.0, 4.0], [9.0]])",
        )
        .unwrap();
        assert_eq!(options.head_profile().len(), 2);
    }

    #[test]
    fn test_reinitialize_policy() {
        let base = TrailOptions::default();

        let mut recolored = base.clone();
        recolored.head_color = [0.0, 0.0, 1.0, 1.0];
        recolored.texture_tile_factor = [1.0, 1.0];
        recolored.depth_write = true;
        assert!(!base.requires_reinitialize(&recolored));

        let mut longer = base.clone();
        longer.trail_length = 10;
        assert!(base.requires_reinitialize(&longer));

        let mut dragged = base.clone();
        dragged.drag_texture = true;
        assert!(base.requires_reinitialize(&dragged));
    }

    #[test]
    fn test_apply_to_material() {
        let options = TrailOptions::default();
        let mut material = TrailMaterial::textured();
        options.apply_to_material(&mut material);
        assert_eq!(material.texture_tile_factor(), Vec2::new(10.0, 0.8));
        assert_eq!(material.tail_color(), Vec4::new(0.0, 1.0, 1.0, 0.35));
        assert!(!material.depth_write());
    }
}
