use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, ViewerError};

/// Colour used when a texture file cannot be read.
pub const FALLBACK_COLOR: [u8; 4] = [200, 200, 200, 255];

/// Tangent-space "straight up" normal, used when a normal map is missing.
pub const FLAT_NORMAL: [u8; 4] = [128, 128, 255, 255];

/// How texel values are interpreted once sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// Colour data, decoded from sRGB.
    Color,
    /// Tangent-space normals, sampled as stored.
    NormalMap,
}

impl TextureKind {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            TextureKind::Color => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureKind::NormalMap => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// Decoded RGBA8 pixels ready for upload.
#[derive(Debug, Clone)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureImage {
    pub fn load(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .map_err(|source| ViewerError::Image { path: path.to_path_buf(), source })?
            .into_rgba8();
        let (width, height) = img.dimensions();
        debug!(path = %path.display(), width, height, "Loaded texture");
        Ok(Self { width, height, rgba: img.into_raw() })
    }

    /// A single-pixel texture of one colour.
    pub fn solid(color: [u8; 4]) -> Self {
        Self { width: 1, height: 1, rgba: color.to_vec() }
    }

    pub fn load_or_fallback(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|err| {
            warn!("{err}. Using a solid colour.");
            Self::solid(FALLBACK_COLOR)
        })
    }

    /// Load a normal map, or a flat one when there is none or it fails to load.
    pub fn normal_map_or_flat(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::solid(FLAT_NORMAL);
        };
        Self::load(path).unwrap_or_else(|err| {
            warn!("{err}. Using a flat normal map.");
            Self::solid(FLAT_NORMAL)
        })
    }
}

/// Sampled texture on the GPU. Destroyed when dropped.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GpuTexture {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &TextureImage,
        kind: TextureKind,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: kind.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self { texture, view, sampler }
    }
}

impl Drop for GpuTexture {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}
