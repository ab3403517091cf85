/// Trail mesh core: ring-buffer engine, geometry, head profiles and shading
pub mod engine;
pub mod geometry;
pub mod head;
pub mod scene;
pub mod shading;
pub mod target;

pub use engine::{DEFAULT_ADVANCE_FREQUENCY, TrailEngine};
pub use geometry::{DirtyRanges, TrailGeometry, TrailVertex};
pub use head::{HeadProfile, MAX_HEAD_VERTICES};
pub use scene::{MeshId, Scene, SceneHandle};
pub use shading::{ShadingKind, TrailMaterial, TrailUniforms};
pub use target::TransformSource;
