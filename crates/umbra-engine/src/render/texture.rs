use std::path::Path;

use crate::scene::{SamplerId, TextureId};

use super::{PostSlot, RenderError};

/// Texture a shader slot can be bound to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureRef {
    Asset(TextureId),
    ShadowMap,
    SkyCube,
    PostTarget(PostSlot),
}

/// Sampler a shader slot can be bound to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SamplerRef {
    Asset(SamplerId),
    /// Depth comparison sampler used for shadow lookups.
    ShadowComparison,
    LinearClamp,
}

/// CPU RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    pub fn new(label: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RenderError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(RenderError::InvalidTextureData {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            label: label.into(),
            width,
            height,
            pixels,
        })
    }

    /// 1x1 texture of one color.
    pub fn solid(label: impl Into<String>, rgba: [u8; 4]) -> Self {
        Self {
            label: label.into(),
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    /// Two-color checkerboard of `cells` x `cells` squares.
    pub fn checker(label: impl Into<String>, size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let size = size.max(1);
        let cell = (size / cells.max(1)).max(1);
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let c = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
                pixels.extend_from_slice(&c);
            }
        }
        Self {
            label: label.into(),
            width: size,
            height: size,
            pixels,
        }
    }

    /// Decodes an image file (PNG, JPEG, BMP) into RGBA8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| RenderError::ImageDecode(format!("{}: {e}", path.display())))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Self::new(path.display().to_string(), width, height, img.into_raw())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Six validated square faces in +X, -X, +Y, -Y, +Z, -Z order: a cube
/// texture supplied ready-made rather than assembled from separate assets.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeData {
    pub label: String,
    faces: [TextureData; 6],
}

impl CubeData {
    pub fn new(label: impl Into<String>, faces: [TextureData; 6]) -> Result<Self, RenderError> {
        validate_cube_faces(&faces.each_ref())?;
        Ok(Self {
            label: label.into(),
            faces,
        })
    }

    pub fn faces(&self) -> &[TextureData; 6] {
        &self.faces
    }

    pub fn edge(&self) -> u32 {
        self.faces[0].width
    }
}

/// Sampler description, turned into a `wgpu::Sampler` on first use.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SamplerDesc {
    pub address_mode: wgpu::AddressMode,
    pub filter: wgpu::FilterMode,
    /// 1 disables anisotropic filtering.
    pub anisotropy: u16,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            address_mode: wgpu::AddressMode::Repeat,
            filter: wgpu::FilterMode::Linear,
            anisotropy: 16,
        }
    }
}

impl SamplerDesc {
    pub fn clamp() -> Self {
        Self {
            address_mode: wgpu::AddressMode::ClampToEdge,
            anisotropy: 1,
            ..Self::default()
        }
    }

    pub(crate) fn create(&self, device: &wgpu::Device, label: &str) -> wgpu::Sampler {
        // Anisotropy requires linear filtering on every axis.
        let anisotropy = if self.filter == wgpu::FilterMode::Linear {
            self.anisotropy.clamp(1, 16)
        } else {
            1
        };
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: self.address_mode,
            address_mode_v: self.address_mode,
            address_mode_w: self.address_mode,
            mag_filter: self.filter,
            min_filter: self.filter,
            anisotropy_clamp: anisotropy,
            ..Default::default()
        })
    }
}

/// Uploaded texture plus its default view.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    /// Uploads one RGBA8 sRGB 2D texture.
    pub fn from_data(device: &wgpu::Device, queue: &wgpu::Queue, data: &TextureData) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&data.label),
            size: wgpu::Extent3d {
                width: data.width,
                height: data.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_layer(queue, &texture, data, 0);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Builds a cube texture from six faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub fn cube_from_faces(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        faces: [&TextureData; 6],
    ) -> Result<Self, RenderError> {
        let size = validate_cube_faces(&faces)?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in faces.iter().enumerate() {
            write_layer(queue, &texture, face, layer as u32);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        Ok(Self { texture, view })
    }
}

/// Checks that all six faces are square and equally sized; returns the edge.
pub(crate) fn validate_cube_faces(faces: &[&TextureData; 6]) -> Result<u32, RenderError> {
    let expected = faces[0].size();
    for (i, face) in faces.iter().enumerate() {
        if face.size() != expected || expected.0 != expected.1 {
            return Err(RenderError::CubemapFaceMismatch {
                face: i,
                size: face.size(),
                expected: (expected.0, expected.0),
            });
        }
    }
    Ok(expected.0)
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, data: &TextureData, layer: u32) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        &data.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * data.width),
            rows_per_image: Some(data.height),
        },
        wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_byte_count() {
        assert!(TextureData::new("ok", 2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            TextureData::new("bad", 2, 2, vec![0; 15]),
            Err(RenderError::InvalidTextureData { width: 2, height: 2, len: 15 })
        );
        assert!(TextureData::new("empty", 0, 4, vec![]).is_err());
    }

    #[test]
    fn checker_alternates() {
        let t = TextureData::checker("c", 4, 2, [255; 4], [0, 0, 0, 255]);
        assert_eq!(t.pixels.len(), 64);
        assert_eq!(&t.pixels[0..4], &[255; 4]);
        // Pixel (2, 0) is in the second cell.
        assert_eq!(&t.pixels[8..12], &[0, 0, 0, 255]);
    }

    #[test]
    fn cube_faces_must_match() {
        let a = TextureData::solid("a", [1, 2, 3, 4]);
        let b = TextureData::checker("b", 2, 1, [0; 4], [0; 4]);
        assert_eq!(validate_cube_faces(&[&a, &a, &a, &a, &a, &a]), Ok(1));
        assert!(matches!(
            validate_cube_faces(&[&a, &a, &a, &b, &a, &a]),
            Err(RenderError::CubemapFaceMismatch { face: 3, .. })
        ));
    }

    #[test]
    fn cube_data_rejects_uneven_faces() {
        let a = TextureData::solid("a", [9; 4]);
        let b = TextureData::checker("b", 2, 1, [0; 4], [0; 4]);
        let cube = CubeData::new("ok", std::array::from_fn(|_| a.clone())).expect("valid cube");
        assert_eq!(cube.edge(), 1);

        let mut faces: [TextureData; 6] = std::array::from_fn(|_| a.clone());
        faces[5] = b;
        assert!(matches!(
            CubeData::new("bad", faces),
            Err(RenderError::CubemapFaceMismatch { face: 5, .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = TextureData::load("does/not/exist.png");
        assert!(matches!(err, Err(RenderError::ImageDecode(_))));
    }
}
