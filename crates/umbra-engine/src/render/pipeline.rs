//! Fixed-function state per draw and the key render pipelines are cached under.

use super::post::MAIN_DEPTH_FORMAT;
use super::shader::ProgramId;
use super::shadow::SHADOW_FORMAT;

/// Rasterizer and depth state a draw needs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RenderState {
    /// Back-face culled, depth tested `Less`, depth written.
    Opaque,
    /// Drawn from inside the cube: front faces culled, `LessEqual`, no depth write.
    Sky,
    /// Depth-only with a rasterizer bias.
    ShadowDepth { constant: i32, slope_bits: u32 },
    /// Full-screen triangle without depth.
    Fullscreen,
}

impl RenderState {
    pub fn shadow_depth(constant: i32, slope: f32) -> Self {
        RenderState::ShadowDepth {
            constant,
            slope_bits: slope.to_bits(),
        }
    }

    pub fn cull_mode(self) -> Option<wgpu::Face> {
        match self {
            RenderState::Opaque | RenderState::ShadowDepth { .. } => Some(wgpu::Face::Back),
            RenderState::Sky => Some(wgpu::Face::Front),
            RenderState::Fullscreen => None,
        }
    }

    /// Whether the draw consumes mesh vertex buffers.
    pub fn uses_mesh(self) -> bool {
        !matches!(self, RenderState::Fullscreen)
    }

    pub fn depth_stencil(self) -> Option<wgpu::DepthStencilState> {
        let (format, compare, write, bias) = match self {
            RenderState::Opaque => (
                MAIN_DEPTH_FORMAT,
                wgpu::CompareFunction::Less,
                true,
                wgpu::DepthBiasState::default(),
            ),
            RenderState::Sky => (
                MAIN_DEPTH_FORMAT,
                wgpu::CompareFunction::LessEqual,
                false,
                wgpu::DepthBiasState::default(),
            ),
            RenderState::ShadowDepth { constant, slope_bits } => (
                SHADOW_FORMAT,
                wgpu::CompareFunction::Less,
                true,
                wgpu::DepthBiasState {
                    constant,
                    slope_scale: f32::from_bits(slope_bits),
                    clamp: 0.0,
                },
            ),
            RenderState::Fullscreen => return None,
        };

        Some(wgpu::DepthStencilState {
            format,
            depth_write_enabled: write,
            depth_compare: compare,
            stencil: wgpu::StencilState::default(),
            bias,
        })
    }

    pub(crate) fn primitive(self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Cw,
            cull_mode: self.cull_mode(),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        }
    }
}

/// Everything that distinguishes one render pipeline from another.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PipelineKey {
    pub vs: ProgramId,
    /// `None` for depth-only passes.
    pub ps: Option<ProgramId>,
    pub state: RenderState,
    pub color: Option<wgpu::TextureFormat>,
}
