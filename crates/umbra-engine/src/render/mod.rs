//! GPU rendering subsystem.
//!
//! The scene is turned into a `FramePlan` on the CPU (passes, draws and
//! committed shader parameters in order) and the `Renderer` encodes that plan
//! with wgpu. GPU resources are cached by asset or program id and uploaded on
//! first use.
//!
//! Convention:
//! - Left-handed world, clip depth 0..1, clockwise front faces.
//! - Vertex-stage parameters live in bind group 0, pixel-stage in group 1.

mod ctx;
mod error;
mod mesh;
mod pipeline;
mod plan;
mod post;
mod renderer;
mod shadow;
mod sky;
mod slots;
mod texture;

pub mod primitives;
pub mod shader;

pub use ctx::RenderCtx;
pub use error::RenderError;
pub use mesh::{Mesh, MeshData, Vertex};
pub use pipeline::{PipelineKey, RenderState};
pub use plan::{
    ColorTarget, DrawPacket, FramePlan, FrameStep, FullscreenPass, Geometry, ScenePass,
    ShadowPass, StageParams, SCENE_TARGET,
};
pub use post::{resize_action, PostChain, PostEffect, PostPass, PostSlot, PostTargets, ResizeAction};
pub use renderer::{Overlay, Renderer};
pub use shadow::{shadow_light_index, LightSpace, ShadowMap, ShadowState};
pub use sky::split_strip;
pub use texture::{CubeData, GpuTexture, SamplerDesc, SamplerRef, TextureData, TextureRef};
