use std::sync::Arc;

use crate::render::shader::ShaderProgram;

use super::{CubeId, MeshId, SamplerId, TextureId};

/// Where the sky's cube faces come from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CubeSource {
    /// Six square images in +X, -X, +Y, -Y, +Z, -Z order.
    Faces([TextureId; 6]),
    /// One image holding the six faces stacked vertically, same order.
    Strip(TextureId),
    /// A ready-made cube.
    Cube(CubeId),
}

/// CPU description of the sky; the renderer builds the cube texture once.
#[derive(Debug, Clone)]
pub struct SkyDesc {
    pub source: CubeSource,
    /// Usually a cube; drawn from the inside.
    pub mesh: MeshId,
    pub sampler: SamplerId,
    pub vertex_shader: Arc<ShaderProgram>,
    pub pixel_shader: Arc<ShaderProgram>,
}
