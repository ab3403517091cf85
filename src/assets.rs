use image::{DynamicImage, GenericImageView};
/// Texture loading for the trail's textured shading
use std::path::Path;
use wgpu::{Device, Queue, Texture, TextureView};

use crate::{TrailError, TrailResult};

pub struct TextureAsset {
    pub texture: Texture,
    pub view: TextureView,
    pub width: u32,
    pub height: u32,
}

/// Decode an image file into memory
pub fn decode_image(path: &Path) -> TrailResult<DynamicImage> {
    image::open(path).map_err(|e| {
        TrailError::AssetLoading(format!("Failed to load image {}: {}", path.display(), e))
    })
}

/// Load an image file and upload it as an sRGB texture
pub async fn load_texture(device: &Device, queue: &Queue, path: &Path) -> TrailResult<TextureAsset> {
    let img = decode_image(path)?;
    let label = path.to_string_lossy();
    let asset = create_texture_from_image(device, queue, &img, Some(label.as_ref()))?;

    log::info!(
        "Loaded texture {} ({}x{})",
        path.display(),
        asset.width,
        asset.height
    );
    Ok(asset)
}

pub fn create_texture_from_image(
    device: &Device,
    queue: &Queue,
    img: &DynamicImage,
    label: Option<&str>,
) -> TrailResult<TextureAsset> {
    let rgba = img.to_rgba8();
    let dimensions = img.dimensions();
    if dimensions.0 == 0 || dimensions.1 == 0 {
        return Err(TrailError::AssetLoading(format!(
            "Image {} has no pixels",
            label.unwrap_or("<unnamed>")
        )));
    }

    let texture_size = wgpu::Extent3d {
        width: dimensions.0,
        height: dimensions.1,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label,
        size: texture_size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        &rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * dimensions.0),
            rows_per_image: Some(dimensions.1),
        },
        texture_size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    Ok(TextureAsset {
        texture,
        view,
        width: dimensions.0,
        height: dimensions.1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_image_is_asset_error() {
        let result = decode_image(Path::new("no/such/texture.png"));
        match result {
            Err(TrailError::AssetLoading(message)) => assert!(message.contains("texture.png")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
