#[cfg(feature = "native")]
pub mod app;
pub mod assets;
pub mod config;
pub mod demo_target;
pub mod input;
pub mod renderer;
pub mod trail;
pub mod ui;

#[cfg(feature = "native")]
pub use app::TrailApp;
pub use config::TrailOptions;
pub use trail::{HeadProfile, Scene, ShadingKind, TrailEngine, TrailMaterial, TransformSource};

#[derive(thiserror::Error, Debug)]
pub enum TrailError {
    #[error("Graphics error: {0}")]
    Graphics(String),
    #[error("Asset loading error: {0}")]
    AssetLoading(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TrailResult<T> = Result<T, TrailError>;
