use std::fmt;

/// Renderer failure.
///
/// Construction failures are reported instead of leaving null resources
/// behind; per-frame binding misses are not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Mesh created from an empty vertex or index list.
    EmptyMesh { label: String },
    /// Texture bytes do not match `width * height * 4`.
    InvalidTextureData {
        width: u32,
        height: u32,
        len: usize,
    },
    /// Cubemap faces must be square and share one size.
    CubemapFaceMismatch { face: usize, size: (u32, u32), expected: (u32, u32) },
    ZeroSizedTarget,
    /// Shadow map sampled before it was rendered this frame.
    ShadowMapNotRendered { frame: u64 },
    /// Frame size differs from the size-dependent targets.
    StaleTargets {
        frame: (u32, u32),
        targets: (u32, u32),
    },
    UnknownMesh(usize),
    UnknownTexture(usize),
    UnknownSampler(usize),
    UnknownCube(usize),
    UnknownMaterial(usize),
    /// Frame plan violates step ordering.
    PlanOrder(String),
    ImageDecode(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::EmptyMesh { label } => write!(f, "mesh `{label}` has no vertices or indices"),
            RenderError::InvalidTextureData { width, height, len } => write!(
                f,
                "texture {width}x{height} needs {} RGBA8 bytes, got {len}",
                *width as usize * *height as usize * 4
            ),
            RenderError::CubemapFaceMismatch { face, size, expected } => write!(
                f,
                "cubemap face {face} is {}x{}, expected {}x{}",
                size.0, size.1, expected.0, expected.1
            ),
            RenderError::ZeroSizedTarget => write!(f, "render target has zero size"),
            RenderError::ShadowMapNotRendered { frame } => {
                write!(f, "shadow map sampled before being rendered in frame {frame}")
            }
            RenderError::StaleTargets { frame, targets } => write!(
                f,
                "frame is {}x{} but targets are {}x{}",
                frame.0, frame.1, targets.0, targets.1
            ),
            RenderError::UnknownMesh(i) => write!(f, "unknown mesh id {i}"),
            RenderError::UnknownTexture(i) => write!(f, "unknown texture id {i}"),
            RenderError::UnknownSampler(i) => write!(f, "unknown sampler id {i}"),
            RenderError::UnknownCube(i) => write!(f, "unknown cube id {i}"),
            RenderError::UnknownMaterial(i) => write!(f, "unknown material id {i}"),
            RenderError::PlanOrder(msg) => write!(f, "invalid frame plan: {msg}"),
            RenderError::ImageDecode(msg) => write!(f, "image decode failed: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}
