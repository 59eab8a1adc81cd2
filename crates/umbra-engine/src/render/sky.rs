//! GPU side of the sky: the cube texture built once from the scene's faces.

use std::borrow::Cow;

use crate::scene::{Assets, CubeSource, SkyDesc, TextureId};

use super::{GpuTexture, RenderError, TextureData};

pub(crate) struct Sky {
    cube: GpuTexture,
    source: CubeSource,
}

impl Sky {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        desc: &SkyDesc,
        assets: &Assets,
    ) -> Result<Self, RenderError> {
        let faces = cube_faces(desc.source, assets)?;
        let cube = GpuTexture::cube_from_faces(
            device,
            queue,
            "umbra sky cube",
            faces.each_ref().map(|f| &**f),
        )?;

        log::info!("sky cube created from {:?} ({}px faces)", desc.source, faces[0].width);

        Ok(Self {
            cube,
            source: desc.source,
        })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.cube.view
    }

    /// The cube is rebuilt only when the scene points at different images.
    pub fn matches(&self, desc: &SkyDesc) -> bool {
        self.source == desc.source
    }
}

/// The six faces a sky source resolves to, borrowed where the assets already
/// hold them.
pub(crate) fn cube_faces(
    source: CubeSource,
    assets: &Assets,
) -> Result<[Cow<'_, TextureData>; 6], RenderError> {
    match source {
        CubeSource::Faces([px, nx, py, ny, pz, nz]) => Ok([
            Cow::Borrowed(texture(assets, px)?),
            Cow::Borrowed(texture(assets, nx)?),
            Cow::Borrowed(texture(assets, py)?),
            Cow::Borrowed(texture(assets, ny)?),
            Cow::Borrowed(texture(assets, pz)?),
            Cow::Borrowed(texture(assets, nz)?),
        ]),
        CubeSource::Strip(id) => Ok(split_strip(texture(assets, id)?)?.map(Cow::Owned)),
        CubeSource::Cube(id) => {
            let cube = assets.cube(id).ok_or(RenderError::UnknownCube(id.index()))?;
            Ok(cube.faces().each_ref().map(Cow::Borrowed))
        }
    }
}

fn texture(assets: &Assets, id: TextureId) -> Result<&TextureData, RenderError> {
    assets.texture(id).ok_or(RenderError::UnknownTexture(id.index()))
}

/// Cuts a vertical strip (`height == 6 * width`) into six square faces.
pub fn split_strip(strip: &TextureData) -> Result<[TextureData; 6], RenderError> {
    let edge = strip.width;
    if edge == 0 || strip.height != edge * 6 {
        return Err(RenderError::CubemapFaceMismatch {
            face: 0,
            size: strip.size(),
            expected: (edge, edge * 6),
        });
    }

    let face_bytes = (edge * edge * 4) as usize;
    let face = |i: usize| TextureData {
        label: format!("{} face {i}", strip.label),
        width: edge,
        height: edge,
        pixels: strip.pixels[i * face_bytes..(i + 1) * face_bytes].to_vec(),
    };

    Ok([face(0), face(1), face(2), face(3), face(4), face(5)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CubeData;
    use crate::scene::CubeId;

    fn face(shade: u8) -> TextureData {
        TextureData::solid(format!("face {shade}"), [shade, shade, shade, 255])
    }

    // ── sources ───────────────────────────────────────────────────────────

    #[test]
    fn ready_made_cube_is_used_as_is() {
        let mut assets = Assets::default();
        let cube = CubeData::new("sky", std::array::from_fn(|i| face(i as u8 * 10))).expect("cube");
        let id = assets.add_cube(cube);

        let faces = cube_faces(CubeSource::Cube(id), &assets).expect("faces");
        assert!(faces.iter().all(|f| matches!(f, Cow::Borrowed(_))));
        for (i, f) in faces.iter().enumerate() {
            assert_eq!(f.pixels[0], i as u8 * 10);
        }
    }

    #[test]
    fn separate_faces_keep_their_order() {
        let mut assets = Assets::default();
        let ids = std::array::from_fn(|i| assets.add_texture(face(i as u8)));
        let faces = cube_faces(CubeSource::Faces(ids), &assets).expect("faces");
        assert_eq!(faces.each_ref().map(|f| f.pixels[0]), [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn strip_source_is_split() {
        let mut assets = Assets::default();
        let strip = TextureData::new("strip", 1, 6, (0..6u8).flat_map(|i| [i, 0, 0, 255]).collect())
            .expect("valid strip");
        let id = assets.add_texture(strip);
        let faces = cube_faces(CubeSource::Strip(id), &assets).expect("faces");
        assert_eq!(faces[4].pixels, vec![4, 0, 0, 255]);
    }

    #[test]
    fn missing_cube_is_an_error() {
        let assets = Assets::default();
        assert_eq!(
            cube_faces(CubeSource::Cube(CubeId::from_index(2)), &assets).err(),
            Some(RenderError::UnknownCube(2))
        );
    }

    // ── strips ────────────────────────────────────────────────────────────

    #[test]
    fn strip_splits_in_order() {
        let mut pixels = Vec::new();
        for i in 0..6u8 {
            pixels.extend(std::iter::repeat_n([i, 0, 0, 255], 4).flatten());
        }
        let strip = TextureData::new("strip", 2, 12, pixels).expect("valid strip");
        let faces = split_strip(&strip).expect("split");
        for (i, f) in faces.iter().enumerate() {
            assert_eq!(f.size(), (2, 2));
            assert!(f.pixels.chunks(4).all(|p| p[0] == i as u8));
        }
    }

    #[test]
    fn strip_with_wrong_ratio_is_rejected() {
        let strip = TextureData::new("bad", 2, 6, vec![0; 2 * 6 * 4]).expect("valid data");
        assert!(matches!(
            split_strip(&strip),
            Err(RenderError::CubemapFaceMismatch { .. })
        ));
    }
}
